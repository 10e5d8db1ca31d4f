pub mod memory;

use crate::dao::models::{GameEntity, PlayerEntity};
use crate::dao::storage::StorageResult;
use crate::state::settings::GameKind;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Persistence of Mölkky games and reusable player records.
///
/// Listing operations are scoped to a user: only records whose `uids` contain the
/// given identifier are returned.
pub trait GameStore: Send + Sync {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    fn list_games(&self, uid: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>>;
    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    fn list_players(&self, uid: String) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Persistence of the flat per-user settings records.
pub trait SettingsStore: Send + Sync {
    fn find_settings(
        &self,
        uid: String,
        kind: GameKind,
    ) -> BoxFuture<'static, StorageResult<Option<serde_json::Value>>>;
    fn save_settings(
        &self,
        uid: String,
        kind: GameKind,
        record: serde_json::Value,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
