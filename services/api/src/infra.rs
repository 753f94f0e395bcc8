use chrono::{DateTime, NaiveDate, Utc};
use dram_planner::error::AppError;
use dram_planner::workflows::tasting::{
    Item, Preferences, RepositoryError, Schedule, TastingRepository, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local stand-in for the collection and schedule stores.
#[derive(Default, Clone)]
pub(crate) struct InMemoryTastingRepository {
    collections: Arc<Mutex<HashMap<UserId, Vec<Item>>>>,
    preferences: Arc<Mutex<HashMap<UserId, Preferences>>>,
    schedules: Arc<Mutex<HashMap<UserId, Schedule>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
}

impl InMemoryTastingRepository {
    pub(crate) fn seed(
        &self,
        user: UserId,
        items: Vec<Item>,
        preferences: Preferences,
    ) -> Result<(), RepositoryError> {
        lock(&self.collections)?.insert(user.clone(), items);
        lock(&self.preferences)?.insert(user, preferences);
        Ok(())
    }
}

impl TastingRepository for InMemoryTastingRepository {
    fn collection(&self, user: &UserId) -> Result<Vec<Item>, RepositoryError> {
        lock(&self.collections)?
            .get(user)
            .cloned()
            .ok_or_else(|| RepositoryError::UnknownUser(user.clone()))
    }

    fn preferences(&self, user: &UserId) -> Result<Option<Preferences>, RepositoryError> {
        Ok(lock(&self.preferences)?.get(user).cloned())
    }

    fn schedule(&self, user: &UserId) -> Result<Option<Schedule>, RepositoryError> {
        Ok(lock(&self.schedules)?.get(user).cloned())
    }

    fn save_schedule(&self, user: &UserId, schedule: Schedule) -> Result<(), RepositoryError> {
        lock(&self.schedules)?.insert(user.clone(), schedule);
        Ok(())
    }
}

/// `collection.json` as written by the collection manager.
#[derive(Debug, Deserialize)]
struct CollectionFile {
    #[serde(default)]
    bottles: Vec<BottleRecord>,
}

#[derive(Debug, Deserialize)]
struct BottleRecord {
    id: u64,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    abv: Option<f64>,
    #[serde(default)]
    tasted: bool,
    #[serde(default)]
    tasting_date: Option<String>,
}

impl BottleRecord {
    fn into_item(self) -> Item {
        let mut item = Item::new(self.id, self.name, self.category.unwrap_or_default());
        // the collection manager stores 0.0 when the strength is unknown
        item.strength = self.abv.filter(|abv| abv.is_finite() && *abv > 0.0);
        item.evaluated = self.tasted;
        item.last_evaluated = self.tasting_date.as_deref().and_then(parse_timestamp);
        item
    }
}

pub(crate) fn parse_collection(raw: &str) -> Result<Vec<Item>, AppError> {
    let file: CollectionFile = serde_json::from_str(raw)?;
    Ok(file.bottles.into_iter().map(BottleRecord::into_item).collect())
}

pub(crate) fn load_collection(path: &Path) -> Result<Vec<Item>, AppError> {
    let raw = std::fs::read_to_string(path)?;
    parse_collection(&raw)
}

pub(crate) fn load_preferences(path: Option<&Path>) -> Result<Preferences, AppError> {
    match path {
        Some(path) => Ok(Preferences::from_path(path)?),
        None => Ok(Preferences::default()),
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
