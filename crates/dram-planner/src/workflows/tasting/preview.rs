use serde::Serialize;

use super::domain::{Item, Relaxation, Schedule, ScheduleItem};
use super::error::ScheduleError;
use super::generator::{GenerationOutcome, GenerationRequest, ScheduleGenerator};
use super::views::ScheduleSummary;

/// Dry-run result handed to presentation without being persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulePreview {
    pub schedule: Schedule,
    pub relaxations: Vec<Relaxation>,
    pub seed: u64,
    pub summary: ScheduleSummary,
}

impl SchedulePreview {
    pub fn warnings(&self) -> Vec<String> {
        self.relaxations.iter().map(ToString::to_string).collect()
    }

    /// First `count` entries, for short forecasts.
    pub fn head(&self, count: usize) -> &[ScheduleItem] {
        let items = self.schedule.items();
        &items[..count.min(items.len())]
    }
}

impl From<GenerationOutcome> for SchedulePreview {
    fn from(outcome: GenerationOutcome) -> Self {
        let summary = ScheduleSummary::from_schedule(&outcome.schedule);
        Self {
            schedule: outcome.schedule,
            relaxations: outcome.relaxations,
            seed: outcome.seed,
            summary,
        }
    }
}

impl ScheduleGenerator<'_> {
    /// Runs the full pipeline in memory. Nothing is stored.
    pub fn preview(
        &self,
        items: &[Item],
        request: &GenerationRequest,
    ) -> Result<SchedulePreview, ScheduleError> {
        self.generate(items, request).map(SchedulePreview::from)
    }

    pub fn preview_extension(
        &self,
        items: &[Item],
        request: &GenerationRequest,
        history: &Schedule,
    ) -> Result<SchedulePreview, ScheduleError> {
        self.extend(items, request, history).map(SchedulePreview::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tasting::preferences::{Preferences, ScheduleLength};
    use chrono::NaiveDate;

    #[test]
    fn preview_matches_generation_and_reports_warnings() {
        let preferences = Preferences::builder()
            .min_days_between_category(30)
            .build()
            .expect("valid preferences");
        let items = vec![
            Item::new(1, "Eagle Rare", "bourbon"),
            Item::new(2, "Blanton's", "bourbon"),
        ];
        let request = GenerationRequest::starting(
            NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"),
        )
        .with_length(ScheduleLength::Count(2))
        .with_seed(17);
        let generator = ScheduleGenerator::new(&preferences);

        let preview = generator.preview(&items, &request).expect("preview");
        let generated = generator.generate(&items, &request).expect("generated");

        assert_eq!(preview.schedule, generated.schedule);
        assert_eq!(preview.summary.total, 2);
        assert_eq!(
            preview.warnings(),
            vec!["spacing constraint relaxed for 2025-03-10 (bourbon)".to_string()]
        );
        assert_eq!(preview.head(1).len(), 1);
        assert_eq!(preview.head(10).len(), 2);
    }
}
