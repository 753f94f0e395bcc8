use std::time::{Duration, Instant};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::assembler::ScheduleAssembler;
use super::domain::{Item, Relaxation, Schedule};
use super::error::{ConfigurationError, ScheduleError, UnsatisfiableScheduleError};
use super::preferences::{DefaultSeasonalCurve, Preferences, ScheduleLength, SeasonalCurve};
use super::selection::SelectionEngine;
use super::sequencer::DateSequencer;

/// Whether a generation run replaces the stored schedule or continues after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationMode {
    #[default]
    Replace,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub start_date: NaiveDate,
    /// Overrides the configured schedule length when set.
    pub length: Option<ScheduleLength>,
    pub seed: Option<u64>,
    pub mode: RegenerationMode,
}

impl GenerationRequest {
    pub fn starting(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            length: None,
            seed: None,
            mode: RegenerationMode::Replace,
        }
    }

    pub fn with_length(mut self, length: ScheduleLength) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: RegenerationMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Result of one successful run. `seed` reproduces the run when fed back in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationOutcome {
    pub schedule: Schedule,
    pub relaxations: Vec<Relaxation>,
    pub seed: u64,
}

/// Drives the sequencer, the selection engine and the assembler over one collection snapshot.
pub struct ScheduleGenerator<'a> {
    preferences: &'a Preferences,
    curve: &'a dyn SeasonalCurve,
    timeout: Option<Duration>,
}

static DEFAULT_CURVE: DefaultSeasonalCurve = DefaultSeasonalCurve;

impl<'a> ScheduleGenerator<'a> {
    pub fn new(preferences: &'a Preferences) -> Self {
        Self {
            preferences,
            curve: &DEFAULT_CURVE,
            timeout: None,
        }
    }

    pub fn with_curve(mut self, curve: &'a dyn SeasonalCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Wall-clock limit for one run, checked between dates.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds a fresh schedule starting at position 1.
    pub fn generate(
        &self,
        items: &[Item],
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, ScheduleError> {
        self.run(items, request, request.start_date, None, ScheduleAssembler::new(), None)
    }

    /// Builds the entries that continue `history`: dates one cadence step after its last date
    /// (or from the request's start date when that is later), positions after its last position,
    /// and its items treated as already selected.
    pub fn extend(
        &self,
        items: &[Item],
        request: &GenerationRequest,
        history: &Schedule,
    ) -> Result<GenerationOutcome, ScheduleError> {
        let resume_after = history
            .last_date()
            .filter(|last| *last >= request.start_date);
        let start = match resume_after {
            Some(last) => last.succ_opt().ok_or(UnsatisfiableScheduleError::OutOfRange { last })?,
            None => request.start_date,
        };
        let assembler = ScheduleAssembler::after(history.last_position());
        self.run(items, request, start, resume_after, assembler, Some(history))
    }

    fn run(
        &self,
        items: &[Item],
        request: &GenerationRequest,
        start: NaiveDate,
        resume_after: Option<NaiveDate>,
        assembler: ScheduleAssembler,
        history: Option<&Schedule>,
    ) -> Result<GenerationOutcome, ScheduleError> {
        let length = request.length.unwrap_or_else(|| self.preferences.length());
        match length {
            ScheduleLength::Count(0) => {
                return Err(ConfigurationError::new("weeks", "must be at least 1").into());
            }
            ScheduleLength::Until(end) if end < start => {
                return Err(ConfigurationError::new(
                    "end_date",
                    format!("{end} precedes the start date {start}"),
                )
                .into());
            }
            _ => {}
        }

        let seed = request.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let deadline = self.timeout.map(|limit| (Instant::now() + limit, limit));

        info!(
            seed,
            %start,
            ?length,
            items = items.len(),
            frequency = self.preferences.frequency().label(),
            "generating tasting schedule"
        );

        let mut engine = SelectionEngine::new(items, self.preferences, self.curve);
        if let Some(history) = history {
            engine = engine.with_history(history);
        }

        let mut dates = Vec::new();
        let mut selections = Vec::new();
        let mut position = assembler.first_position();
        let sequencer = match resume_after {
            Some(last) => DateSequencer::continuing(last, self.preferences, length),
            None => DateSequencer::new(start, self.preferences, length),
        };
        for date in sequencer {
            if let Some((deadline, limit)) = deadline {
                if Instant::now() >= deadline {
                    return Err(UnsatisfiableScheduleError::TimedOut {
                        limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                        dates_resolved: dates.len(),
                    }
                    .into());
                }
            }
            let date = date?;
            selections.push(engine.select(date, position, &mut rng)?);
            dates.push(date);
            position += 1;
        }

        let schedule = assembler.assemble(dates, selections);
        let relaxations = engine.into_relaxations();
        info!(
            seed,
            entries = schedule.len(),
            relaxations = relaxations.len(),
            "tasting schedule generated"
        );

        Ok(GenerationOutcome {
            schedule,
            relaxations,
            seed,
        })
    }
}
