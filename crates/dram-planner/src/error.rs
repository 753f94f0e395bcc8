use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::tasting::router::{error_response, schedule_error_payload};
use crate::workflows::tasting::{ConfigurationError, ExportError, ScheduleError, ServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Json(serde_json::Error),
    Export(ExportError),
    Preferences(ConfigurationError),
    Schedule(ScheduleError),
    Service(ServiceError),
    /// Bad command-line or request input that is not a preference value.
    Input(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Json(err) => write!(f, "invalid json: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Preferences(err) => write!(f, "{}", err),
            AppError::Schedule(err) => write!(f, "schedule error: {}", err),
            AppError::Service(err) => write!(f, "{}", err),
            AppError::Input(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Preferences(err) => Some(err),
            AppError::Schedule(err) => Some(err),
            AppError::Service(err) => Some(err),
            AppError::Input(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Service(err) => error_response(err),
            AppError::Schedule(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(schedule_error_payload(&err)),
            )
                .into_response(),
            AppError::Preferences(err) => {
                let err = ScheduleError::from(err);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(schedule_error_payload(&err)),
                )
                    .into_response()
            }
            AppError::Json(_) | AppError::Input(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Export(_) => {
                let body = Json(json!({ "error": self.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(value: ConfigurationError) -> Self {
        Self::Preferences(value)
    }
}

impl From<ScheduleError> for AppError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

impl From<ServiceError> for AppError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::tasting::{UnsatisfiableScheduleError, UserId};
    use chrono::NaiveDate;

    #[test]
    fn schedule_errors_are_unprocessable() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date");
        let error = AppError::from(ScheduleError::from(UnsatisfiableScheduleError::EmptyWindow {
            start: date,
            end: date,
        }));
        assert_eq!(error.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);

        let error = AppError::from(ConfigurationError::new("user_preferences.tasting_frequency", "unknown"));
        assert_eq!(error.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn lock_contention_is_a_conflict() {
        let error = AppError::from(ServiceError::GenerationInProgress(UserId::new("casey")));
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn infrastructure_failures_are_internal() {
        let error = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Input("weeks must be positive".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }
}
