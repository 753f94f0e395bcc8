//! Tasting schedule generation: preferences, date sequencing, weighted selection and the
//! service and HTTP surface that persist the result.

pub mod assembler;
pub mod domain;
pub mod error;
pub mod export;
pub mod generator;
pub mod preferences;
pub mod preview;
pub mod repository;
pub mod router;
pub mod selection;
pub mod sequencer;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use assembler::ScheduleAssembler;
pub use domain::{
    normalize_category, CompletionStatus, Item, ItemId, Relaxation, Schedule, ScheduleEntryError,
    ScheduleItem, FALLBACK_CATEGORY,
};
pub use error::{ConfigurationError, ExhaustedPoolError, ScheduleError, UnsatisfiableScheduleError};
pub use export::{ExportError, ScheduleDocument};
pub use generator::{GenerationOutcome, GenerationRequest, RegenerationMode, ScheduleGenerator};
pub use preferences::{
    CategoryWeights, DefaultSeasonalCurve, FlatSeasonalCurve, Frequency, Preferences,
    PreferencesBuilder, ScheduleLength, SeasonalCurve, WeekdaySet, DEFAULT_SCHEDULE_WEEKS,
};
pub use preview::SchedulePreview;
pub use repository::{RepositoryError, TastingRepository, UserId};
pub use router::schedule_router;
pub use selection::{Selection, SelectionEngine};
pub use sequencer::{DateSequencer, LOOK_AHEAD_DAYS};
pub use service::{GenerationReceipt, ServiceError, TastingScheduleService, DEFAULT_GENERATION_TIMEOUT};
pub use views::{CategoryCountEntry, ScheduleItemView, ScheduleSummary};
