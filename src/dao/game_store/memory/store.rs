use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        game_store::{GameStore, SettingsStore},
        models::{GameEntity, PlayerEntity, SettingsEntity},
        storage::StorageResult,
    },
    state::settings::GameKind,
};

use super::error::{SnapshotError, SnapshotResult};

/// Store keeping every record in memory, optionally mirrored to a JSON file that is
/// rewritten after each change.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    games: DashMap<Uuid, GameEntity>,
    players: DashMap<Uuid, PlayerEntity>,
    settings: DashMap<(String, GameKind), serde_json::Value>,
    snapshot: Option<SnapshotFile>,
}

struct SnapshotFile {
    path: PathBuf,
    write_gate: Mutex<()>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    games: Vec<GameEntity>,
    #[serde(default)]
    players: Vec<PlayerEntity>,
    #[serde(default)]
    settings: Vec<SettingsEntity>,
}

impl MemoryStore {
    /// Create an empty store that lives only as long as the process.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store mirrored to `path`, loading the snapshot when the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let path = path.into();
        let snapshot = read_snapshot(&path).await?;

        let inner = Inner {
            games: DashMap::new(),
            players: DashMap::new(),
            settings: DashMap::new(),
            snapshot: Some(SnapshotFile {
                path,
                write_gate: Mutex::new(()),
            }),
        };
        for game in snapshot.games {
            inner.games.insert(game.id, game);
        }
        for player in snapshot.players {
            inner.players.insert(player.id, player);
        }
        for entry in snapshot.settings {
            inner.settings.insert((entry.uid, entry.kind), entry.record);
        }

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    async fn save_game(&self, game: GameEntity) -> SnapshotResult<()> {
        self.commit(
            |snapshot| {
                snapshot.games.retain(|stored| stored.id != game.id);
                snapshot.games.push(game.clone());
            },
            |inner| {
                inner.games.insert(game.id, game.clone());
            },
        )
        .await
    }

    async fn save_player(&self, player: PlayerEntity) -> SnapshotResult<()> {
        self.commit(
            |snapshot| {
                snapshot.players.retain(|stored| stored.id != player.id);
                snapshot.players.push(player.clone());
            },
            |inner| {
                inner.players.insert(player.id, player.clone());
            },
        )
        .await
    }

    async fn save_settings(
        &self,
        uid: String,
        kind: GameKind,
        record: serde_json::Value,
    ) -> SnapshotResult<()> {
        self.commit(
            |snapshot| {
                snapshot
                    .settings
                    .retain(|stored| stored.uid != uid || stored.kind != kind);
                snapshot.settings.push(SettingsEntity {
                    uid: uid.clone(),
                    kind,
                    record: record.clone(),
                });
            },
            |inner| {
                inner.settings.insert((uid.clone(), kind), record.clone());
            },
        )
        .await
    }

    fn find_game(&self, id: Uuid) -> Option<GameEntity> {
        self.inner.games.get(&id).map(|entry| entry.value().clone())
    }

    fn find_player(&self, id: Uuid) -> Option<PlayerEntity> {
        self.inner.players.get(&id).map(|entry| entry.value().clone())
    }

    fn find_settings(&self, uid: String, kind: GameKind) -> Option<serde_json::Value> {
        self.inner
            .settings
            .get(&(uid, kind))
            .map(|entry| entry.value().clone())
    }

    /// Games visible to `uid`, newest first.
    fn list_games(&self, uid: &str) -> Vec<GameEntity> {
        let mut games: Vec<GameEntity> = self
            .inner
            .games
            .iter()
            .filter(|entry| entry.is_visible_to(uid))
            .map(|entry| entry.value().clone())
            .collect();
        games.sort_by(|a, b| b.date.cmp(&a.date));
        games
    }

    /// Player records visible to `uid`, sorted by name.
    fn list_players(&self, uid: &str) -> Vec<PlayerEntity> {
        let mut players: Vec<PlayerEntity> = self
            .inner
            .players
            .iter()
            .filter(|entry| entry.is_visible_to(uid))
            .map(|entry| entry.value().clone())
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name));
        players
    }

    fn collect(&self) -> Snapshot {
        Snapshot {
            games: self
                .inner
                .games
                .iter()
                .map(|entry| entry.value().clone())
                .collect(),
            players: self
                .inner
                .players
                .iter()
                .map(|entry| entry.value().clone())
                .collect(),
            settings: self
                .inner
                .settings
                .iter()
                .map(|entry| {
                    let (uid, kind) = entry.key().clone();
                    SettingsEntity {
                        uid,
                        kind,
                        record: entry.value().clone(),
                    }
                })
                .collect(),
        }
    }

    /// Apply a change, mirroring it to the snapshot file first when there is one. The
    /// maps are only touched once the file holds the new content, so a failed write
    /// leaves the store as it was. Commits are serialized by the write gate.
    async fn commit<S, A>(&self, stage: S, apply: A) -> SnapshotResult<()>
    where
        S: FnOnce(&mut Snapshot),
        A: FnOnce(&Inner),
    {
        let _gate = match self.inner.snapshot.as_ref() {
            Some(file) => {
                let gate = file.write_gate.lock().await;
                let mut snapshot = self.collect();
                stage(&mut snapshot);
                write_snapshot(&file.path, &snapshot).await?;
                Some(gate)
            }
            None => None,
        };

        apply(&self.inner);
        Ok(())
    }
}

/// Write `snapshot` to a staging file next to `path`, then move it into place.
async fn write_snapshot(path: &Path, snapshot: &Snapshot) -> SnapshotResult<()> {
    let bytes =
        serde_json::to_vec_pretty(snapshot).map_err(|source| SnapshotError::Encode { source })?;

    let staging = path.with_extension("json.tmp");
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .await
            .map_err(|source| SnapshotError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
    }
    fs::write(&staging, &bytes)
        .await
        .map_err(|source| SnapshotError::Write {
            path: staging.clone(),
            source,
        })?;
    fs::rename(&staging, path)
        .await
        .map_err(|source| SnapshotError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

async fn read_snapshot(path: &Path) -> SnapshotResult<Snapshot> {
    match fs::read(path).await {
        Ok(bytes) => {
            let snapshot: Snapshot =
                serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
            info!(
                path = %path.display(),
                games = snapshot.games.len(),
                players = snapshot.players.len(),
                settings = snapshot.settings.len(),
                "loaded snapshot"
            );
            Ok(snapshot)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "snapshot not found; starting empty");
            Ok(Snapshot::default())
        }
        Err(source) => Err(SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

impl GameStore for MemoryStore {
    fn save_game(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_game(game).await.map_err(Into::into) })
    }

    fn find_game(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_game(id)) })
    }

    fn list_games(&self, uid: String) -> BoxFuture<'static, StorageResult<Vec<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_games(&uid)) })
    }

    fn save_player(&self, player: PlayerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_player(player).await.map_err(Into::into) })
    }

    fn find_player(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_player(id)) })
    }

    fn list_players(&self, uid: String) -> BoxFuture<'static, StorageResult<Vec<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.list_players(&uid)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async move { Ok(()) })
    }
}

impl SettingsStore for MemoryStore {
    fn find_settings(
        &self,
        uid: String,
        kind: GameKind,
    ) -> BoxFuture<'static, StorageResult<Option<serde_json::Value>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_settings(uid, kind)) })
    }

    fn save_settings(
        &self,
        uid: String,
        kind: GameKind,
        record: serde_json::Value,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_settings(uid, kind, record)
                .await
                .map_err(Into::into)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use serde_json::json;

    use super::*;
    use crate::dao::storage::StorageError;

    fn game(uids: &[&str], date: SystemTime) -> GameEntity {
        GameEntity {
            id: Uuid::new_v4(),
            date,
            target: 50,
            reset: Some(25),
            max_misses: Some(3),
            players: Vec::new(),
            current_player: 0,
            winner: None,
            uids: uids.iter().map(|uid| uid.to_string()).collect(),
        }
    }

    fn player(name: &str, uid: &str) -> PlayerEntity {
        PlayerEntity {
            id: Uuid::new_v4(),
            name: name.into(),
            target: None,
            reset: None,
            max_misses: None,
            avatar: None,
            uids: vec![uid.into()],
        }
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir().join(format!("party-games-{}.json", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_user() {
        let store = MemoryStore::new();
        let now = SystemTime::now();
        let older = game(&["uid-1"], now - Duration::from_secs(60));
        let newer = game(&["uid-1", "uid-2"], now);
        GameStore::save_game(&store, older.clone()).await.unwrap();
        GameStore::save_game(&store, newer.clone()).await.unwrap();

        let mine = GameStore::list_games(&store, "uid-1".into()).await.unwrap();
        assert_eq!(mine, vec![newer.clone(), older]);
        let theirs = GameStore::list_games(&store, "uid-2".into()).await.unwrap();
        assert_eq!(theirs, vec![newer]);
        assert!(
            GameStore::list_games(&store, "uid-3".into())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn players_are_listed_by_name() {
        let store = MemoryStore::new();
        GameStore::save_player(&store, player("Zoé", "uid-1"))
            .await
            .unwrap();
        GameStore::save_player(&store, player("Ana", "uid-1"))
            .await
            .unwrap();
        GameStore::save_player(&store, player("Bob", "uid-2"))
            .await
            .unwrap();

        let names: Vec<String> = GameStore::list_players(&store, "uid-1".into())
            .await
            .unwrap()
            .into_iter()
            .map(|player| player.name)
            .collect();
        assert_eq!(names, vec!["Ana", "Zoé"]);
    }

    #[tokio::test]
    async fn snapshot_survives_reopening() {
        let path = scratch_path();
        let saved = game(&["uid-1"], SystemTime::now());
        {
            let store = MemoryStore::open(&path).await.unwrap();
            GameStore::save_game(&store, saved.clone()).await.unwrap();
            SettingsStore::save_settings(
                &store,
                "uid-1".into(),
                GameKind::Timer,
                json!({ "countdown": 90 }),
            )
            .await
            .unwrap();
        }

        let reopened = MemoryStore::open(&path).await.unwrap();
        assert_eq!(
            GameStore::find_game(&reopened, saved.id).await.unwrap(),
            Some(saved)
        );
        assert_eq!(
            SettingsStore::find_settings(&reopened, "uid-1".into(), GameKind::Timer)
                .await
                .unwrap(),
            Some(json!({ "countdown": 90 }))
        );
        assert_eq!(
            SettingsStore::find_settings(&reopened, "uid-1".into(), GameKind::Rummikub)
                .await
                .unwrap(),
            None
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_records_untouched() {
        let path = scratch_path();
        let store = MemoryStore::open(&path).await.unwrap();
        let kept = game(&["uid-1"], SystemTime::now());
        GameStore::save_game(&store, kept.clone()).await.unwrap();

        // a directory squatting the staging file makes every write fail
        let staging = path.with_extension("json.tmp");
        std::fs::create_dir(&staging).unwrap();

        let mut edited = kept.clone();
        edited.current_player = 1;
        let rejected = game(&["uid-1"], SystemTime::now());
        assert!(GameStore::save_game(&store, edited).await.is_err());
        assert!(GameStore::save_game(&store, rejected.clone()).await.is_err());
        assert!(
            SettingsStore::save_settings(
                &store,
                "uid-1".into(),
                GameKind::Timer,
                json!({ "countdown": 5 }),
            )
            .await
            .is_err()
        );

        assert_eq!(
            GameStore::find_game(&store, kept.id).await.unwrap(),
            Some(kept)
        );
        assert_eq!(GameStore::find_game(&store, rejected.id).await.unwrap(), None);
        assert_eq!(
            SettingsStore::find_settings(&store, "uid-1".into(), GameKind::Timer)
                .await
                .unwrap(),
            None
        );

        let _ = std::fs::remove_dir(&staging);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_snapshot_starts_empty() {
        let store = MemoryStore::open(scratch_path()).await.unwrap();
        assert!(
            GameStore::list_games(&store, "uid-1".into())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn corrupted_snapshot_is_reported() {
        let path = scratch_path();
        std::fs::write(&path, b"{ not json").unwrap();

        let err = match MemoryStore::open(&path).await {
            Ok(_) => panic!("corrupted snapshot must not load"),
            Err(err) => err,
        };
        assert!(matches!(
            StorageError::from(err),
            StorageError::Corrupted { .. }
        ));

        let _ = std::fs::remove_file(&path);
    }
}
