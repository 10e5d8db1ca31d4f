use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document of the party games backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::stream,
        crate::routes::settings::get_settings,
        crate::routes::settings::save_settings,
        crate::routes::molkky::list_players,
        crate::routes::molkky::add_player,
        crate::routes::molkky::update_player,
        crate::routes::molkky::list_games,
        crate::routes::molkky::create_game,
        crate::routes::molkky::get_game,
        crate::routes::molkky::add_score,
        crate::routes::molkky::update_scores,
        crate::routes::molkky::update_last_score,
        crate::routes::molkky::join_shared,
        crate::routes::timer::list_timers,
        crate::routes::timer::create_timer,
        crate::routes::timer::get_timer,
        crate::routes::timer::delete_timer,
        crate::routes::timer::start_timer,
        crate::routes::timer::pause_timer,
        crate::routes::timer::resume_timer,
        crate::routes::timer::toggle_timer,
        crate::routes::timer::reset_timer,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::TimerFrameEvent,
            crate::dto::sse::TimerDeletedEvent,
            crate::dto::sse::SettingsChangedEvent,
            crate::speech::Utterance,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events stream"),
        (name = "settings", description = "Per-user helper settings"),
        (name = "molkky", description = "Mölkky players, games and scores"),
        (name = "timer", description = "Countdown timers with spoken cues"),
    )
)]
pub struct ApiDoc;
