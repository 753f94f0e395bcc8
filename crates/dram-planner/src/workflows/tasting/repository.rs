use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::{Item, Schedule};
use super::preferences::Preferences;

/// Owner of a collection, its preferences and its stored schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage abstraction so the service can be exercised against in-memory collaborators.
///
/// `collection` must return a stable snapshot; the service never writes items back.
pub trait TastingRepository: Send + Sync {
    fn collection(&self, user: &UserId) -> Result<Vec<Item>, RepositoryError>;
    /// `None` means the user never saved preferences and defaults apply.
    fn preferences(&self, user: &UserId) -> Result<Option<Preferences>, RepositoryError>;
    fn schedule(&self, user: &UserId) -> Result<Option<Schedule>, RepositoryError>;
    fn save_schedule(&self, user: &UserId, schedule: Schedule) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("unknown user `{0}`")]
    UnknownUser(UserId),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
