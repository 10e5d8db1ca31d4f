use tracing::info;
use validator::Validate;

use crate::{
    dto::settings::SettingsDto,
    error::ServiceError,
    services::{sse_events, timer_service},
    state::{
        SharedState,
        settings::{GameKind, Settings},
    },
};

/// Settings of `uid` for `kind`, stored values merged over the configured defaults.
pub async fn get_settings(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
) -> Result<SettingsDto, ServiceError> {
    Ok(load_settings(state, uid, kind).await?.into())
}

/// Validate and store the settings of `uid` for `kind`. Timers of that user and kind
/// pick the new countdown settings up immediately.
pub async fn save_settings(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
    payload: SettingsDto,
) -> Result<SettingsDto, ServiceError> {
    payload.validate()?;
    let settings = Settings::from(payload);
    if settings.countdown().is_some() != kind.has_countdown() {
        return Err(ServiceError::InvalidInput(format!(
            "settings payload does not match helper `{kind}`"
        )));
    }

    state
        .settings()
        .save_settings(uid.to_string(), kind, settings.to_record())
        .await?;
    info!(uid, %kind, "settings saved");

    if let Some(countdown) = settings.countdown() {
        timer_service::apply_settings(state, uid, kind, countdown).await;
    }
    sse_events::broadcast_settings_changed(state, uid, kind, settings.into());

    Ok(settings.into())
}

pub(crate) async fn load_settings(
    state: &SharedState,
    uid: &str,
    kind: GameKind,
) -> Result<Settings, ServiceError> {
    let record = state
        .settings()
        .find_settings(uid.to_string(), kind)
        .await?;
    Ok(state.config().defaults().merge(kind, record.as_ref()))
}
