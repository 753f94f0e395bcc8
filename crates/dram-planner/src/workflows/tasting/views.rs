use super::domain::{CompletionStatus, ItemId, Schedule, ScheduleItem};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCountEntry {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleSummary {
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<NaiveDate>,
    pub new_tastings: usize,
    pub repeat_tastings: usize,
    pub completed: usize,
    pub categories: Vec<CategoryCountEntry>,
}

impl ScheduleSummary {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
        let mut repeat_tastings = 0;
        let mut completed = 0;
        for entry in schedule.items() {
            *categories.entry(entry.category.as_str()).or_default() += 1;
            if entry.is_repeat {
                repeat_tastings += 1;
            }
            if entry.status == CompletionStatus::Done {
                completed += 1;
            }
        }

        let mut categories: Vec<CategoryCountEntry> = categories
            .into_iter()
            .map(|(category, count)| CategoryCountEntry {
                category: category.to_string(),
                count,
            })
            .collect();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));

        Self {
            total: schedule.len(),
            first_date: schedule.first_date(),
            last_date: schedule.last_date(),
            new_tastings: schedule.len() - repeat_tastings,
            repeat_tastings,
            completed,
            categories,
        }
    }
}

/// Presentation row for one schedule entry.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleItemView {
    pub week: u32,
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub category: String,
    pub is_repeat: bool,
    pub status: CompletionStatus,
    pub status_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

impl From<&ScheduleItem> for ScheduleItemView {
    fn from(entry: &ScheduleItem) -> Self {
        Self {
            week: entry.position,
            date: entry.date,
            item_id: entry.item_id,
            category: entry.category.clone(),
            is_repeat: entry.is_repeat,
            status: entry.status,
            status_label: entry.status.label(),
            completed_on: entry.completed_on,
        }
    }
}
