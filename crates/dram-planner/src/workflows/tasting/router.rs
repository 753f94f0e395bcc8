use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::error::ScheduleError;
use super::generator::{GenerationRequest, RegenerationMode};
use super::preferences::ScheduleLength;
use super::repository::{TastingRepository, UserId};
use super::service::{ServiceError, TastingScheduleService};
use super::views::{ScheduleItemView, ScheduleSummary};

/// Router builder exposing the schedule endpoints for one user's data set.
pub fn schedule_router<R>(service: Arc<TastingScheduleService<R>>) -> Router
where
    R: TastingRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/users/:user_id/schedule",
            get(schedule_handler::<R>).post(generate_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/schedule/preview",
            post(preview_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/schedule/upcoming",
            get(upcoming_handler::<R>),
        )
        .route(
            "/api/v1/users/:user_id/schedule/items/:position/complete",
            post(complete_handler::<R>),
        )
        .with_state(service)
}

/// Body accepted by the generate and preview endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub weeks: Option<usize>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub mode: RegenerationMode,
}

impl GenerateBody {
    fn into_request(self, today: NaiveDate) -> GenerationRequest {
        let length = match (self.end_date, self.weeks) {
            (Some(end), _) => Some(ScheduleLength::Until(end)),
            (None, Some(weeks)) => Some(ScheduleLength::Count(weeks)),
            (None, None) => None,
        };
        GenerationRequest {
            start_date: self.start_date.unwrap_or(today),
            length,
            seed: self.seed,
            mode: self.mode,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpcomingQuery {
    pub weeks: Option<u32>,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteBody {
    #[serde(default)]
    pub completed_on: Option<NaiveDate>,
}

const DEFAULT_UPCOMING_WEEKS: u32 = 4;

pub(crate) async fn schedule_handler<R>(
    State(service): State<Arc<TastingScheduleService<R>>>,
    Path(user_id): Path<String>,
) -> Response
where
    R: TastingRepository + 'static,
{
    let user = UserId(user_id);
    match service.schedule(&user) {
        Ok(schedule) => {
            let items: Vec<ScheduleItemView> =
                schedule.items().iter().map(ScheduleItemView::from).collect();
            let payload = json!({
                "user_id": user,
                "summary": ScheduleSummary::from_schedule(&schedule),
                "schedule": items,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn generate_handler<R>(
    State(service): State<Arc<TastingScheduleService<R>>>,
    Path(user_id): Path<String>,
    axum::Json(body): axum::Json<GenerateBody>,
) -> Response
where
    R: TastingRepository + 'static,
{
    let user = UserId(user_id);
    let request = body.into_request(Utc::now().date_naive());
    match service.generate(&user, &request) {
        Ok(receipt) => {
            let warnings: Vec<String> =
                receipt.relaxations.iter().map(ToString::to_string).collect();
            let items: Vec<ScheduleItemView> = receipt
                .schedule
                .items()
                .iter()
                .map(ScheduleItemView::from)
                .collect();
            let payload = json!({
                "user_id": user,
                "mode": receipt.mode,
                "added": receipt.added,
                "seed": receipt.seed,
                "warnings": warnings,
                "relaxations": receipt.relaxations,
                "summary": ScheduleSummary::from_schedule(&receipt.schedule),
                "schedule": items,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_handler<R>(
    State(service): State<Arc<TastingScheduleService<R>>>,
    Path(user_id): Path<String>,
    axum::Json(body): axum::Json<GenerateBody>,
) -> Response
where
    R: TastingRepository + 'static,
{
    let user = UserId(user_id);
    let request = body.into_request(Utc::now().date_naive());
    match service.preview(&user, &request) {
        Ok(preview) => {
            let items: Vec<ScheduleItemView> = preview
                .schedule
                .items()
                .iter()
                .map(ScheduleItemView::from)
                .collect();
            let payload = json!({
                "user_id": user,
                "seed": preview.seed,
                "warnings": preview.warnings(),
                "relaxations": preview.relaxations,
                "summary": preview.summary,
                "schedule": items,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn upcoming_handler<R>(
    State(service): State<Arc<TastingScheduleService<R>>>,
    Path(user_id): Path<String>,
    Query(query): Query<UpcomingQuery>,
) -> Response
where
    R: TastingRepository + 'static,
{
    let user = UserId(user_id);
    let today = query.today.unwrap_or_else(|| Utc::now().date_naive());
    let weeks = query.weeks.unwrap_or(DEFAULT_UPCOMING_WEEKS);
    match service.upcoming(&user, today, weeks) {
        Ok(entries) => {
            let items: Vec<ScheduleItemView> = entries.iter().map(ScheduleItemView::from).collect();
            let payload = json!({
                "user_id": user,
                "today": today,
                "weeks": weeks,
                "upcoming": items,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn complete_handler<R>(
    State(service): State<Arc<TastingScheduleService<R>>>,
    Path((user_id, position)): Path<(String, u32)>,
    axum::Json(body): axum::Json<CompleteBody>,
) -> Response
where
    R: TastingRepository + 'static,
{
    let user = UserId(user_id);
    let completed_on = body
        .completed_on
        .unwrap_or_else(|| Utc::now().date_naive());
    match service.complete(&user, position, completed_on) {
        Ok(entry) => {
            let view = ScheduleItemView::from(&entry);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// Maps service failures onto HTTP statuses with an actionable payload.
pub fn error_response(error: ServiceError) -> Response {
    let (status, payload) = match &error {
        ServiceError::Schedule(schedule_error) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            schedule_error_payload(schedule_error),
        ),
        ServiceError::GenerationInProgress(_) => (
            StatusCode::CONFLICT,
            json!({ "error": error.to_string(), "kind": "generation_in_progress" }),
        ),
        other if other.is_not_found() => (
            StatusCode::NOT_FOUND,
            json!({ "error": other.to_string(), "kind": "not_found" }),
        ),
        other => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": other.to_string() }),
        ),
    };
    (status, axum::Json(payload)).into_response()
}

pub(crate) fn schedule_error_payload(error: &ScheduleError) -> serde_json::Value {
    let mut payload = json!({
        "error": error.to_string(),
        "kind": error.kind(),
    });
    match error {
        ScheduleError::Configuration(config) => {
            payload["field"] = json!(config.field);
        }
        ScheduleError::ExhaustedPool(exhausted) => {
            payload["date"] = json!(exhausted.date);
            payload["position"] = json!(exhausted.position);
            payload["relaxations"] = json!(exhausted.relaxations);
        }
        ScheduleError::Unsatisfiable(_) => {}
    }
    payload
}
