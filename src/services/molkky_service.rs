use std::collections::HashSet;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GameEntity, PlayerEntity},
    dto::molkky::{
        AddScoreRequest, CreateGameRequest, GamePlayerInput, GameSummary, PlayerInput,
        PlayerRecord, ShareKind, ShareObject, UpdateLastScoreRequest, UpdateScoresRequest,
    },
    error::ServiceError,
    services::{settings_service, sse_events},
    state::{
        SharedState,
        molkky::{GameError, GamePlayer, MolkkyGame},
        rules::ScoreRules,
        settings::{GameKind, MolkkySettings},
    },
};

/// Player records visible to `uid`.
pub async fn list_players(state: &SharedState, uid: &str) -> Result<Vec<PlayerRecord>, ServiceError> {
    let players = state.games().list_players(uid.to_string()).await?;
    Ok(players.iter().map(Into::into).collect())
}

/// Create a player record owned by `uid`.
pub async fn add_player(
    state: &SharedState,
    uid: &str,
    input: PlayerInput,
) -> Result<PlayerRecord, ServiceError> {
    input.validate()?;

    let record = PlayerEntity {
        id: Uuid::new_v4(),
        name: input.name.trim().to_string(),
        target: input.target,
        reset: input.reset,
        max_misses: input.max_misses,
        avatar: input.avatar,
        uids: vec![uid.to_string()],
    };
    state.games().save_player(record.clone()).await?;
    info!(id = %record.id, uid, "player added");

    Ok((&record).into())
}

/// Replace the editable fields of a player record visible to `uid`.
pub async fn update_player(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    input: PlayerInput,
) -> Result<PlayerRecord, ServiceError> {
    input.validate()?;

    let _guard = state.lock_record(id).await;
    let mut record = find_player(state, uid, id).await?;
    record.name = input.name.trim().to_string();
    record.target = input.target;
    record.reset = input.reset;
    record.max_misses = input.max_misses;
    record.avatar = input.avatar;

    state.games().save_player(record.clone()).await?;
    Ok((&record).into())
}

/// Games visible to `uid`, newest first.
pub async fn list_games(state: &SharedState, uid: &str) -> Result<Vec<GameSummary>, ServiceError> {
    let games = state.games().list_games(uid.to_string()).await?;
    Ok(games
        .into_iter()
        .map(|entity| GameSummary::from(&MolkkyGame::from(entity)))
        .collect())
}

/// Start a game for `uid`. Without explicit rules the caller's Mölkky settings apply.
pub async fn create_game(
    state: &SharedState,
    uid: &str,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;

    let rules = match request.rules {
        Some(rules) => ScoreRules::from(MolkkySettings::from(rules)),
        None => settings_service::load_settings(state, uid, GameKind::Molkky)
            .await?
            .molkky()
            .map(ScoreRules::from)
            .unwrap_or_else(|| state.config().defaults().molkky.into()),
    };

    let mut seen = HashSet::new();
    let mut players = Vec::with_capacity(request.players.len());
    for input in request.players {
        let player = build_player(state, uid, input).await?;
        if !seen.insert(player.id) {
            return Err(ServiceError::InvalidInput(format!(
                "player `{}` appears twice",
                player.id
            )));
        }
        let effective = player.rules(&rules);
        if let Some(reset) = effective.reset
            && reset >= effective.target
        {
            return Err(ServiceError::InvalidInput(format!(
                "player `{}` would fall back to {reset}, which is not below their target {}",
                player.name, effective.target
            )));
        }
        players.push(player);
    }

    let game = MolkkyGame::new(rules, players, vec![uid.to_string()]);
    state.games().save_game(GameEntity::from(&game)).await?;
    info!(id = %game.id, uid, players = game.players().len(), "game created");

    let summary = GameSummary::from(&game);
    sse_events::broadcast_game_updated(state, &game.uids, summary.clone());
    Ok(summary)
}

/// Current state of a game visible to `uid`.
pub async fn get_game(state: &SharedState, uid: &str, id: Uuid) -> Result<GameSummary, ServiceError> {
    let game = find_game(state, uid, id).await?;
    Ok(GameSummary::from(&game))
}

/// Record a throw for the current player.
pub async fn add_score(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    request: AddScoreRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    update_game(state, uid, id, |game| game.add_score(request.score)).await
}

/// Replace the whole throw history of a player.
pub async fn update_scores(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    player_id: Uuid,
    request: UpdateScoresRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    update_game(state, uid, id, |game| {
        game.update_scores(player_id, request.scores)
    })
    .await
}

/// Replace the most recent throw of a player.
pub async fn update_last_score(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    player_id: Uuid,
    request: UpdateLastScoreRequest,
) -> Result<GameSummary, ServiceError> {
    request.validate()?;
    update_game(state, uid, id, |game| {
        game.update_last_score(player_id, request.score)
    })
    .await
}

/// Grant `uid` access to a shared game or player record.
pub async fn join_shared(
    state: &SharedState,
    uid: &str,
    share: ShareObject,
) -> Result<(), ServiceError> {
    let _guard = state.lock_record(share.id).await;

    match share.kind {
        ShareKind::Game => {
            let mut entity = state
                .games()
                .find_game(share.id)
                .await?
                .ok_or_else(|| game_not_found(share.id))?;
            if !entity.is_visible_to(uid) {
                entity.uids.push(uid.to_string());
                state.games().save_game(entity).await?;
            }
        }
        ShareKind::Player => {
            let mut entity = state
                .games()
                .find_player(share.id)
                .await?
                .ok_or_else(|| player_not_found(share.id))?;
            if !entity.is_visible_to(uid) {
                entity.uids.push(uid.to_string());
                state.games().save_player(entity).await?;
            }
        }
    }

    info!(id = %share.id, kind = ?share.kind, uid, "shared object joined");
    Ok(())
}

/// Load, mutate and store a game under its lock. A failing mutation leaves the
/// stored game untouched.
async fn update_game<F>(
    state: &SharedState,
    uid: &str,
    id: Uuid,
    mutate: F,
) -> Result<GameSummary, ServiceError>
where
    F: FnOnce(&mut MolkkyGame) -> Result<(), GameError>,
{
    let _guard = state.lock_record(id).await;

    let mut game = find_game(state, uid, id).await?;
    mutate(&mut game)?;
    state.games().save_game(GameEntity::from(&game)).await?;

    let summary = GameSummary::from(&game);
    sse_events::broadcast_game_updated(state, &game.uids, summary.clone());
    Ok(summary)
}

async fn build_player(
    state: &SharedState,
    uid: &str,
    input: GamePlayerInput,
) -> Result<GamePlayer, ServiceError> {
    let name = input.name.map(|name| name.trim().to_string());
    match (input.id, name) {
        (Some(id), name) => {
            let record = find_player(state, uid, id).await?;
            let mut player = GamePlayer::from(&record);
            if let Some(name) = name {
                player.name = name;
            }
            Ok(player)
        }
        (None, Some(name)) => Ok(GamePlayer::new(Uuid::new_v4(), name)),
        (None, None) => Err(ServiceError::InvalidInput(
            "a game player needs a record id or a name".into(),
        )),
    }
}

async fn find_game(state: &SharedState, uid: &str, id: Uuid) -> Result<MolkkyGame, ServiceError> {
    match state.games().find_game(id).await? {
        Some(entity) if entity.is_visible_to(uid) => Ok(entity.into()),
        _ => Err(game_not_found(id)),
    }
}

async fn find_player(
    state: &SharedState,
    uid: &str,
    id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    match state.games().find_player(id).await? {
        Some(entity) if entity.is_visible_to(uid) => Ok(entity),
        _ => Err(player_not_found(id)),
    }
}

fn game_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("game `{id}` not found"))
}

fn player_not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("player `{id}` not found"))
}
