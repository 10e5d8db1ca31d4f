use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::timer::{CreateTimerRequest, TimerSnapshot},
    error::AppError,
    routes::identity::CurrentUser,
    services::timer_service::{self, TimerControl},
    state::SharedState,
};

/// Countdown timers and their controls.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/timers", get(list_timers).post(create_timer))
        .route("/timers/{id}", get(get_timer).delete(delete_timer))
        .route("/timers/{id}/start", post(start_timer))
        .route("/timers/{id}/pause", post(pause_timer))
        .route("/timers/{id}/resume", post(resume_timer))
        .route("/timers/{id}/toggle", post(toggle_timer))
        .route("/timers/{id}/reset", post(reset_timer))
}

/// Timers owned by the caller.
#[utoipa::path(
    get,
    path = "/timers",
    tag = "timer",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    responses((status = 200, description = "Timers", body = [TimerSnapshot]))
)]
pub async fn list_timers(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
) -> Json<Vec<TimerSnapshot>> {
    Json(timer_service::list_timers(&state, &uid).await)
}

/// Create an idle timer using the caller's settings for the helper.
#[utoipa::path(
    post,
    path = "/timers",
    tag = "timer",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    request_body = CreateTimerRequest,
    responses(
        (status = 200, description = "Timer created", body = TimerSnapshot),
        (status = 400, description = "The helper has no countdown")
    )
)]
pub async fn create_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<CreateTimerRequest>,
) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(
        timer_service::create_timer(&state, &uid, payload.kind).await?,
    ))
}

/// Current state of a timer.
#[utoipa::path(
    get,
    path = "/timers/{id}",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses((status = 200, description = "Timer", body = TimerSnapshot))
)]
pub async fn get_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(timer_service::get_timer(&state, &uid, id).await?))
}

/// Stop and drop a timer.
#[utoipa::path(
    delete,
    path = "/timers/{id}",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses((status = 204, description = "Timer deleted"))
)]
pub async fn delete_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    timer_service::delete_timer(&state, &uid, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start a full countdown.
#[utoipa::path(
    post,
    path = "/timers/{id}/start",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses((status = 200, description = "Timer running", body = TimerSnapshot))
)]
pub async fn start_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    control(&state, &uid, id, TimerControl::Start).await
}

/// Freeze a running countdown.
#[utoipa::path(
    post,
    path = "/timers/{id}/pause",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses(
        (status = 200, description = "Timer paused", body = TimerSnapshot),
        (status = 409, description = "The timer is not running")
    )
)]
pub async fn pause_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    control(&state, &uid, id, TimerControl::Pause).await
}

/// Continue a paused countdown.
#[utoipa::path(
    post,
    path = "/timers/{id}/resume",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses(
        (status = 200, description = "Timer running", body = TimerSnapshot),
        (status = 409, description = "The timer is not paused")
    )
)]
pub async fn resume_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    control(&state, &uid, id, TimerControl::Resume).await
}

/// Play/pause button.
#[utoipa::path(
    post,
    path = "/timers/{id}/toggle",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses((status = 200, description = "Timer toggled", body = TimerSnapshot))
)]
pub async fn toggle_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    control(&state, &uid, id, TimerControl::Toggle).await
}

/// Start over with the full duration.
#[utoipa::path(
    post,
    path = "/timers/{id}/reset",
    tag = "timer",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the timer")
    ),
    responses((status = 200, description = "Timer restarted", body = TimerSnapshot))
)]
pub async fn reset_timer(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    control(&state, &uid, id, TimerControl::Reset).await
}

async fn control(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    control: TimerControl,
) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(
        timer_service::control_timer(state, uid, id, control).await?,
    ))
}
