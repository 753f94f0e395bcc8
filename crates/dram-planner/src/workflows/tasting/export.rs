use std::collections::HashMap;
use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{CompletionStatus, Item, ItemId, Schedule, ScheduleItem};

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "failed to write schedule export: {}", err),
            ExportError::Csv(err) => write!(f, "failed to encode schedule as CSV: {}", err),
            ExportError::Json(err) => write!(f, "failed to encode schedule as JSON: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
            ExportError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// One schedule entry joined with the item it references.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRow {
    pub week: u32,
    pub date: NaiveDate,
    pub bottle_id: ItemId,
    pub bottle_name: String,
    pub category: String,
    pub abv: Option<f64>,
    pub is_repeat: bool,
    pub status: &'static str,
}

/// Saved schedule document: generation date, entry count and the joined rows.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDocument {
    pub generated_date: NaiveDate,
    pub total_weeks: usize,
    pub schedule: Vec<JsonEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonEntry {
    #[serde(flatten)]
    pub row: ExportRow,
    pub completed: bool,
    pub completed_at: Option<NaiveDate>,
}

/// Joins entries with item names; items missing from the collection export with a blank name.
pub fn export_rows(schedule: &Schedule, items: &[Item]) -> Vec<ExportRow> {
    let by_id: HashMap<ItemId, &Item> = items.iter().map(|item| (item.id, item)).collect();
    schedule
        .items()
        .iter()
        .map(|entry| row(entry, by_id.get(&entry.item_id).copied()))
        .collect()
}

fn row(entry: &ScheduleItem, item: Option<&Item>) -> ExportRow {
    ExportRow {
        week: entry.position,
        date: entry.date,
        bottle_id: entry.item_id,
        bottle_name: item.map(|item| item.name.clone()).unwrap_or_default(),
        category: entry.category.clone(),
        abv: item.and_then(|item| item.strength),
        is_repeat: entry.is_repeat,
        status: entry.status.label(),
    }
}

pub fn write_csv<W: Write>(
    schedule: &Schedule,
    items: &[Item],
    writer: W,
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in export_rows(schedule, items) {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_document(schedule: &Schedule, items: &[Item], generated_date: NaiveDate) -> ScheduleDocument {
    let entries = export_rows(schedule, items)
        .into_iter()
        .zip(schedule.items())
        .map(|(row, entry)| JsonEntry {
            row,
            completed: entry.status == CompletionStatus::Done,
            completed_at: entry.completed_on,
        })
        .collect::<Vec<_>>();
    ScheduleDocument {
        generated_date,
        total_weeks: entries.len(),
        schedule: entries,
    }
}

pub fn to_json(
    schedule: &Schedule,
    items: &[Item],
    generated_date: NaiveDate,
) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(&to_document(
        schedule,
        items,
        generated_date,
    ))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Schedule {
        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).expect("valid date");
        let mut schedule = Schedule::from_items(vec![
            ScheduleItem {
                position: 1,
                date: day(10),
                item_id: ItemId(3),
                category: "bourbon".to_string(),
                is_repeat: false,
                status: CompletionStatus::Pending,
                completed_on: None,
            },
            ScheduleItem {
                position: 2,
                date: day(17),
                item_id: ItemId(9),
                category: "scotch".to_string(),
                is_repeat: true,
                status: CompletionStatus::Pending,
                completed_on: None,
            },
        ]);
        schedule.mark_completed(1, day(11)).expect("position exists");
        schedule
    }

    fn items() -> Vec<Item> {
        vec![Item::new(3, "Weller 12", "bourbon").with_strength(45.0)]
    }

    #[test]
    fn csv_export_joins_item_names() {
        let mut buffer = Vec::new();
        write_csv(&schedule(), &items(), &mut buffer).expect("csv written");
        let text = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "week,date,bottle_id,bottle_name,category,abv,is_repeat,status"
        );
        assert_eq!(lines[1], "1,2025-01-10,3,Weller 12,bourbon,45.0,false,Done");
        assert_eq!(lines[2], "2,2025-01-17,9,,scotch,,true,Pending");
    }

    #[test]
    fn json_document_carries_completion() {
        let generated = NaiveDate::from_ymd_opt(2025, 1, 5).expect("valid date");
        let raw = to_json(&schedule(), &items(), generated).expect("json written");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");

        assert_eq!(value["generated_date"], "2025-01-05");
        assert_eq!(value["total_weeks"], 2);
        assert_eq!(value["schedule"][0]["bottle_name"], "Weller 12");
        assert_eq!(value["schedule"][0]["completed"], true);
        assert_eq!(value["schedule"][0]["completed_at"], "2025-01-11");
        assert_eq!(value["schedule"][1]["completed_at"], serde_json::Value::Null);
    }
}
