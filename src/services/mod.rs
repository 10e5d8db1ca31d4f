/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Mölkky players, games and scores.
pub mod molkky_service;
/// Per-user settings persistence.
pub mod settings_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Countdown timers and their ticking tasks.
pub mod timer_service;
