use chrono::NaiveDate;

use super::domain::{CompletionStatus, Schedule, ScheduleItem};
use super::selection::Selection;

/// Zips dates and selections into position-ordered schedule records.
///
/// Stateless: the caller decides whether the result replaces or extends a stored schedule and
/// passes the first position accordingly.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleAssembler {
    first_position: u32,
}

impl Default for ScheduleAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleAssembler {
    pub const fn new() -> Self {
        Self { first_position: 1 }
    }

    /// Assembler continuing after an existing schedule whose last position is `last_position`.
    pub const fn after(last_position: u32) -> Self {
        Self {
            first_position: last_position + 1,
        }
    }

    pub const fn first_position(&self) -> u32 {
        self.first_position
    }

    pub fn assemble<D, S>(&self, dates: D, selections: S) -> Schedule
    where
        D: IntoIterator<Item = NaiveDate>,
        S: IntoIterator<Item = Selection>,
    {
        let items = dates
            .into_iter()
            .zip(selections)
            .zip(self.first_position..)
            .map(|((date, selection), position)| ScheduleItem {
                position,
                date,
                item_id: selection.item_id,
                category: selection.category,
                is_repeat: selection.is_repeat,
                status: CompletionStatus::Pending,
                completed_on: None,
            })
            .collect();
        Schedule::from_items(items)
    }
}
