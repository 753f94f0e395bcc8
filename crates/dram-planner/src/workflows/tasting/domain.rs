use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Category assigned to items that arrive without one.
pub const FALLBACK_CATEGORY: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A bottle in the collection, as handed over by the collection collaborator.
///
/// The scheduler never mutates items; `evaluated` flips when the user records a tasting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    /// Alcohol by volume, in percent. Only feeds seasonal weighting.
    #[serde(default)]
    pub strength: Option<f64>,
    #[serde(default)]
    pub evaluated: bool,
    #[serde(default)]
    pub last_evaluated: Option<DateTime<Utc>>,
}

impl Item {
    pub fn new(id: u64, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: ItemId(id),
            name: name.into(),
            category: category.into(),
            strength: None,
            evaluated: false,
            last_evaluated: None,
        }
    }

    pub fn with_strength(mut self, abv: f64) -> Self {
        self.strength = Some(abv);
        self
    }

    pub fn tasted_at(mut self, at: DateTime<Utc>) -> Self {
        self.evaluated = true;
        self.last_evaluated = Some(at);
        self
    }

    /// Normalized category used for weighting and spacing lookups.
    pub fn category_key(&self) -> String {
        normalize_category(&self.category)
    }
}

pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_CATEGORY.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Pending,
    Done,
}

impl CompletionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Done => "Done",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub position: u32,
    pub date: NaiveDate,
    pub item_id: ItemId,
    pub category: String,
    pub is_repeat: bool,
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_on: Option<NaiveDate>,
}

/// Ordered, date-stamped tasting assignments produced by one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    items: Vec<ScheduleItem>,
}

impl Schedule {
    pub fn from_items(items: Vec<ScheduleItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ScheduleItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.items.first().map(|item| item.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.items.last().map(|item| item.date)
    }

    pub fn last_position(&self) -> u32 {
        self.items.last().map(|item| item.position).unwrap_or(0)
    }

    /// Most recent assignment date per normalized category.
    pub fn latest_by_category(&self) -> HashMap<String, NaiveDate> {
        let mut latest: HashMap<String, NaiveDate> = HashMap::new();
        for entry in &self.items {
            let key = normalize_category(&entry.category);
            latest
                .entry(key)
                .and_modify(|date| {
                    if entry.date > *date {
                        *date = entry.date;
                    }
                })
                .or_insert(entry.date);
        }
        latest
    }

    /// Pending assignments dated from `today` up to (excluding) `today + weeks`.
    pub fn upcoming(&self, today: NaiveDate, weeks: u32) -> Vec<&ScheduleItem> {
        let horizon = today + Duration::weeks(i64::from(weeks));
        self.items
            .iter()
            .filter(|entry| entry.status == CompletionStatus::Pending)
            .filter(|entry| entry.date >= today && entry.date < horizon)
            .collect()
    }

    pub fn mark_completed(
        &mut self,
        position: u32,
        completed_on: NaiveDate,
    ) -> Result<&ScheduleItem, ScheduleEntryError> {
        let entry = self
            .items
            .iter_mut()
            .find(|entry| entry.position == position)
            .ok_or(ScheduleEntryError::PositionNotFound(position))?;

        entry.status = CompletionStatus::Done;
        entry.completed_on = Some(completed_on);
        Ok(entry)
    }

    pub(crate) fn append(&mut self, other: Schedule) {
        self.items.extend(other.items);
    }
}

/// A documented loosening of a soft constraint during selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relaxation {
    /// Every remaining candidate was inside the category spacing window.
    Spacing {
        date: NaiveDate,
        categories: Vec<String>,
    },
    /// Every item had been scheduled, so repeats were admitted again.
    Uniqueness { date: NaiveDate },
}

impl Relaxation {
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Spacing { date, .. } | Self::Uniqueness { date } => *date,
        }
    }
}

impl fmt::Display for Relaxation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relaxation::Spacing { date, categories } => write!(
                f,
                "spacing constraint relaxed for {} ({})",
                date,
                categories.join(", ")
            ),
            Relaxation::Uniqueness { date } => write!(
                f,
                "repeat selections admitted for {} after every item was scheduled",
                date
            ),
        }
    }
}

#[derive(Debug)]
pub enum ScheduleEntryError {
    PositionNotFound(u32),
}

impl fmt::Display for ScheduleEntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleEntryError::PositionNotFound(position) => {
                write!(f, "schedule has no item at position {}", position)
            }
        }
    }
}

impl std::error::Error for ScheduleEntryError {}
