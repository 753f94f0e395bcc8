use super::domain::Relaxation;
use chrono::NaiveDate;

/// Invalid or contradictory preference value, named by its key path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid preference `{field}`: {reason}")]
pub struct ConfigurationError {
    pub field: String,
    pub reason: String,
}

impl ConfigurationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Date sequencing could not place a tasting inside its bounds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnsatisfiableScheduleError {
    #[error(
        "no allowed tasting date within {window_days} days after {step_date}; add preferred days or remove blackout dates"
    )]
    LookAheadExceeded {
        step_date: NaiveDate,
        window_days: i64,
    },
    #[error(
        "no allowed tasting date between {start} and {end}; add preferred days or remove blackout dates"
    )]
    EmptyWindow { start: NaiveDate, end: NaiveDate },
    #[error("calendar arithmetic overflowed after {last}")]
    OutOfRange { last: NaiveDate },
    #[error("schedule generation exceeded {limit_ms} ms after {dates_resolved} dates")]
    TimedOut { limit_ms: u64, dates_resolved: usize },
}

/// No item satisfied the selection constraints, even after relaxation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no eligible item for {date} (position {position}); add items or allow repeats")]
pub struct ExhaustedPoolError {
    pub date: NaiveDate,
    pub position: u32,
    pub relaxations: Vec<Relaxation>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Unsatisfiable(#[from] UnsatisfiableScheduleError),
    #[error(transparent)]
    ExhaustedPool(#[from] ExhaustedPoolError),
}

impl ScheduleError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Unsatisfiable(_) => "unsatisfiable_schedule",
            Self::ExhaustedPool(_) => "exhausted_pool",
        }
    }
}
