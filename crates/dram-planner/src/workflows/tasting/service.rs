use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Item, Relaxation, Schedule, ScheduleEntryError, ScheduleItem};
use super::error::ScheduleError;
use super::generator::{GenerationRequest, RegenerationMode, ScheduleGenerator};
use super::preferences::{DefaultSeasonalCurve, Preferences, SeasonalCurve};
use super::preview::SchedulePreview;
use super::repository::{RepositoryError, TastingRepository, UserId};

/// Generation timeout applied when the caller configures none.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Service composing the repository, the generator and the per-user generation lock.
pub struct TastingScheduleService<R> {
    repository: Arc<R>,
    locks: GenerationLocks,
    curve: Arc<dyn SeasonalCurve>,
    timeout: Duration,
}

/// What a committed generation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReceipt {
    pub mode: RegenerationMode,
    /// Entries created by this run; earlier entries kept by an append are not counted.
    pub added: usize,
    pub seed: u64,
    pub relaxations: Vec<Relaxation>,
    pub schedule: Schedule,
}

impl<R> TastingScheduleService<R>
where
    R: TastingRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            locks: GenerationLocks::default(),
            curve: Arc::new(DefaultSeasonalCurve),
            timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_curve(mut self, curve: Arc<dyn SeasonalCurve>) -> Self {
        self.curve = curve;
        self
    }

    /// Dry run against the user's current data. Nothing is stored.
    pub fn preview(
        &self,
        user: &UserId,
        request: &GenerationRequest,
    ) -> Result<SchedulePreview, ServiceError> {
        let _guard = self.locks.acquire(user)?;
        let (items, preferences) = self.snapshot(user)?;
        let generator = self.generator(&preferences);

        let preview = match request.mode {
            RegenerationMode::Replace => generator.preview(&items, request)?,
            RegenerationMode::Append => {
                let history = self.repository.schedule(user)?.unwrap_or_default();
                generator.preview_extension(&items, request, &history)?
            }
        };
        Ok(preview)
    }

    /// Generate and persist, replacing or extending the stored schedule per `request.mode`.
    pub fn generate(
        &self,
        user: &UserId,
        request: &GenerationRequest,
    ) -> Result<GenerationReceipt, ServiceError> {
        let _guard = self.locks.acquire(user)?;
        let (items, preferences) = self.snapshot(user)?;
        let generator = self.generator(&preferences);

        let (schedule, outcome) = match request.mode {
            RegenerationMode::Replace => {
                let outcome = generator.generate(&items, request)?;
                (outcome.schedule.clone(), outcome)
            }
            RegenerationMode::Append => {
                let mut stored = self.repository.schedule(user)?.unwrap_or_default();
                let outcome = generator.extend(&items, request, &stored)?;
                stored.append(outcome.schedule.clone());
                (stored, outcome)
            }
        };

        self.repository.save_schedule(user, schedule.clone())?;
        info!(
            user = %user,
            mode = ?request.mode,
            added = outcome.schedule.len(),
            total = schedule.len(),
            "tasting schedule saved"
        );

        Ok(GenerationReceipt {
            mode: request.mode,
            added: outcome.schedule.len(),
            seed: outcome.seed,
            relaxations: outcome.relaxations,
            schedule,
        })
    }

    pub fn schedule(&self, user: &UserId) -> Result<Schedule, ServiceError> {
        self.repository
            .schedule(user)?
            .ok_or_else(|| ServiceError::ScheduleNotFound(user.clone()))
    }

    /// Record that the tasting at `position` happened on `completed_on`.
    pub fn complete(
        &self,
        user: &UserId,
        position: u32,
        completed_on: NaiveDate,
    ) -> Result<ScheduleItem, ServiceError> {
        let _guard = self.locks.acquire(user)?;
        let mut schedule = self.schedule(user)?;
        let entry = schedule.mark_completed(position, completed_on)?.clone();
        self.repository.save_schedule(user, schedule)?;
        info!(user = %user, position, %completed_on, "tasting marked complete");
        Ok(entry)
    }

    /// Pending entries dated within `weeks` weeks of `today`.
    pub fn upcoming(
        &self,
        user: &UserId,
        today: NaiveDate,
        weeks: u32,
    ) -> Result<Vec<ScheduleItem>, ServiceError> {
        let schedule = self.schedule(user)?;
        Ok(schedule
            .upcoming(today, weeks)
            .into_iter()
            .cloned()
            .collect())
    }

    fn snapshot(&self, user: &UserId) -> Result<(Vec<Item>, Preferences), ServiceError> {
        let items = self.repository.collection(user)?;
        let preferences = self.repository.preferences(user)?.unwrap_or_default();
        Ok((items, preferences))
    }

    fn generator<'a>(&'a self, preferences: &'a Preferences) -> ScheduleGenerator<'a> {
        ScheduleGenerator::new(preferences)
            .with_curve(self.curve.as_ref())
            .with_timeout(self.timeout)
    }
}

/// Users with a generation in flight. Holding a [`GenerationGuard`] is holding the user's lock.
#[derive(Debug, Default)]
struct GenerationLocks {
    in_flight: Mutex<HashSet<UserId>>,
}

impl GenerationLocks {
    fn acquire(&self, user: &UserId) -> Result<GenerationGuard<'_>, ServiceError> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if !in_flight.insert(user.clone()) {
            warn!(user = %user, "generation already in progress");
            return Err(ServiceError::GenerationInProgress(user.clone()));
        }
        Ok(GenerationGuard {
            locks: self,
            user: user.clone(),
        })
    }
}

pub(crate) struct GenerationGuard<'a> {
    locks: &'a GenerationLocks,
    user: UserId,
}

impl Drop for GenerationGuard<'_> {
    fn drop(&mut self) {
        self.locks
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.user);
    }
}

/// Error raised by the tasting schedule service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("a schedule generation is already running for user `{0}`")]
    GenerationInProgress(UserId),
    #[error("no stored schedule for user `{0}`")]
    ScheduleNotFound(UserId),
    #[error(transparent)]
    Entry(#[from] ScheduleEntryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ScheduleNotFound(_)
                | Self::Entry(ScheduleEntryError::PositionNotFound(_))
                | Self::Repository(RepositoryError::UnknownUser(_))
        )
    }
}

#[cfg(test)]
impl<R> TastingScheduleService<R>
where
    R: TastingRepository + 'static,
{
    /// Holds the user's generation lock until the returned guard is dropped.
    pub(crate) fn hold_lock(&self, user: &UserId) -> GenerationGuard<'_> {
        match self.locks.acquire(user) {
            Ok(guard) => guard,
            Err(error) => panic!("lock already held: {error}"),
        }
    }
}
