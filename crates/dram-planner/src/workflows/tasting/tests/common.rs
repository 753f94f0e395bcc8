use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{NaiveDate, TimeZone, Utc, Weekday};
use serde_json::Value;

use crate::workflows::tasting::domain::{Item, Schedule};
use crate::workflows::tasting::preferences::Preferences;
use crate::workflows::tasting::repository::{RepositoryError, TastingRepository, UserId};
use crate::workflows::tasting::{schedule_router, TastingScheduleService};

pub(super) fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).expect("valid date")
}

pub(super) fn user() -> UserId {
    UserId::new("casey")
}

pub(super) fn collection() -> Vec<Item> {
    let tasted = Utc
        .with_ymd_and_hms(2024, 11, 2, 20, 0, 0)
        .single()
        .expect("valid timestamp");
    vec![
        Item::new(1, "Buffalo Trace", "Bourbon").with_strength(45.0),
        Item::new(2, "Four Roses Single Barrel", "bourbon").with_strength(50.0),
        Item::new(3, "Wild Turkey 101", "bourbon").with_strength(50.5),
        Item::new(4, "Lagavulin 16", "Scotch").with_strength(43.0),
        Item::new(5, "Glenfarclas 105", "scotch")
            .with_strength(60.0)
            .tasted_at(tasted),
        Item::new(6, "Redbreast 12", "irish").with_strength(40.0),
    ]
}

pub(super) fn friday_preferences() -> Preferences {
    Preferences::builder()
        .preferred_day(Weekday::Fri)
        .min_days_between_category(10)
        .build()
        .expect("valid preferences")
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) collections: Arc<Mutex<HashMap<UserId, Vec<Item>>>>,
    pub(super) preferences: Arc<Mutex<HashMap<UserId, Preferences>>>,
    pub(super) schedules: Arc<Mutex<HashMap<UserId, Schedule>>>,
}

impl MemoryRepository {
    pub(super) fn seeded(items: Vec<Item>, preferences: Preferences) -> Self {
        let repository = Self::default();
        repository
            .collections
            .lock()
            .expect("repository mutex poisoned")
            .insert(user(), items);
        repository
            .preferences
            .lock()
            .expect("repository mutex poisoned")
            .insert(user(), preferences);
        repository
    }

    pub(super) fn stored(&self, user: &UserId) -> Option<Schedule> {
        self.schedules
            .lock()
            .expect("repository mutex poisoned")
            .get(user)
            .cloned()
    }
}

impl TastingRepository for MemoryRepository {
    fn collection(&self, user: &UserId) -> Result<Vec<Item>, RepositoryError> {
        self.collections
            .lock()
            .expect("repository mutex poisoned")
            .get(user)
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownUser(user.clone()))
    }

    fn preferences(&self, user: &UserId) -> Result<Option<Preferences>, RepositoryError> {
        Ok(self
            .preferences
            .lock()
            .expect("repository mutex poisoned")
            .get(user)
            .cloned())
    }

    fn schedule(&self, user: &UserId) -> Result<Option<Schedule>, RepositoryError> {
        Ok(self
            .schedules
            .lock()
            .expect("repository mutex poisoned")
            .get(user)
            .cloned())
    }

    fn save_schedule(&self, user: &UserId, schedule: Schedule) -> Result<(), RepositoryError> {
        self.schedules
            .lock()
            .expect("repository mutex poisoned")
            .insert(user.clone(), schedule);
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl TastingRepository for UnavailableRepository {
    fn collection(&self, _user: &UserId) -> Result<Vec<Item>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn preferences(&self, _user: &UserId) -> Result<Option<Preferences>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn schedule(&self, _user: &UserId) -> Result<Option<Schedule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_schedule(&self, _user: &UserId, _schedule: Schedule) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service() -> (TastingScheduleService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::seeded(collection(), friday_preferences()));
    let service = TastingScheduleService::new(repository.clone());
    (service, repository)
}

pub(super) fn router_with_service(
    service: TastingScheduleService<MemoryRepository>,
) -> axum::Router {
    schedule_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
