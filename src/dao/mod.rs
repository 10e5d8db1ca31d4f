/// Game, player and settings storage backends.
pub mod game_store;
/// Persisted record definitions.
pub mod models;
/// Storage abstraction layer errors.
pub mod storage;
