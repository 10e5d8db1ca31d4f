use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::settings::SettingsDto,
    error::AppError,
    routes::identity::CurrentUser,
    services::settings_service,
    state::{SharedState, settings::GameKind},
};

/// Per-user settings of each helper.
pub fn router() -> Router<SharedState> {
    Router::new().route("/settings/{kind}", get(get_settings).put(save_settings))
}

/// Settings of the caller for a helper, defaults filled in.
#[utoipa::path(
    get,
    path = "/settings/{kind}",
    tag = "settings",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("kind" = GameKind, Path, description = "Helper the settings belong to")
    ),
    responses((status = 200, description = "Current settings", body = SettingsDto))
)]
pub async fn get_settings(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(kind): Path<GameKind>,
) -> Result<Json<SettingsDto>, AppError> {
    Ok(Json(
        settings_service::get_settings(&state, &uid, kind).await?,
    ))
}

/// Store the settings of the caller for a helper.
#[utoipa::path(
    put,
    path = "/settings/{kind}",
    tag = "settings",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("kind" = GameKind, Path, description = "Helper the settings belong to")
    ),
    request_body = SettingsDto,
    responses(
        (status = 200, description = "Settings saved", body = SettingsDto),
        (status = 400, description = "Invalid settings")
    )
)]
pub async fn save_settings(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(kind): Path<GameKind>,
    Json(payload): Json<SettingsDto>,
) -> Result<Json<SettingsDto>, AppError> {
    Ok(Json(
        settings_service::save_settings(&state, &uid, kind, payload).await?,
    ))
}
