use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::molkky::{
        AddScoreRequest, CreateGameRequest, GameSummary, PlayerInput, PlayerRecord,
        ShareObject, UpdateLastScoreRequest, UpdateScoresRequest,
    },
    error::AppError,
    routes::identity::CurrentUser,
    services::molkky_service,
    state::SharedState,
};

/// Mölkky player records, games and scores.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/molkky/players", get(list_players).post(add_player))
        .route("/molkky/players/{id}", put(update_player))
        .route("/molkky/games", get(list_games).post(create_game))
        .route("/molkky/games/{id}", get(get_game))
        .route("/molkky/games/{id}/scores", post(add_score))
        .route(
            "/molkky/games/{id}/players/{player_id}/scores",
            put(update_scores),
        )
        .route(
            "/molkky/games/{id}/players/{player_id}/scores/last",
            put(update_last_score),
        )
        .route("/molkky/share", post(join_shared))
}

/// Player records visible to the caller.
#[utoipa::path(
    get,
    path = "/molkky/players",
    tag = "molkky",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    responses((status = 200, description = "Player records", body = [PlayerRecord]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Vec<PlayerRecord>>, AppError> {
    Ok(Json(molkky_service::list_players(&state, &uid).await?))
}

/// Create a reusable player record.
#[utoipa::path(
    post,
    path = "/molkky/players",
    tag = "molkky",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    request_body = PlayerInput,
    responses((status = 200, description = "Player created", body = PlayerRecord))
)]
pub async fn add_player(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<PlayerInput>,
) -> Result<Json<PlayerRecord>, AppError> {
    Ok(Json(molkky_service::add_player(&state, &uid, payload).await?))
}

/// Update a player record.
#[utoipa::path(
    put,
    path = "/molkky/players/{id}",
    tag = "molkky",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the player record")
    ),
    request_body = PlayerInput,
    responses((status = 200, description = "Player updated", body = PlayerRecord))
)]
pub async fn update_player(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<PlayerInput>,
) -> Result<Json<PlayerRecord>, AppError> {
    Ok(Json(
        molkky_service::update_player(&state, &uid, id, payload).await?,
    ))
}

/// Games visible to the caller, newest first.
#[utoipa::path(
    get,
    path = "/molkky/games",
    tag = "molkky",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    responses((status = 200, description = "Games", body = [GameSummary]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
) -> Result<Json<Vec<GameSummary>>, AppError> {
    Ok(Json(molkky_service::list_games(&state, &uid).await?))
}

/// Start a new game.
#[utoipa::path(
    post,
    path = "/molkky/games",
    tag = "molkky",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    request_body = CreateGameRequest,
    responses((status = 200, description = "Game created", body = GameSummary))
)]
pub async fn create_game(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<CreateGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(molkky_service::create_game(&state, &uid, payload).await?))
}

/// Retrieve a game by its ID.
#[utoipa::path(
    get,
    path = "/molkky/games/{id}",
    tag = "molkky",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the game")
    ),
    responses((status = 200, description = "Game", body = GameSummary))
)]
pub async fn get_game(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(molkky_service::get_game(&state, &uid, id).await?))
}

/// Record a throw for the player whose turn it is.
#[utoipa::path(
    post,
    path = "/molkky/games/{id}/scores",
    tag = "molkky",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the game")
    ),
    request_body = AddScoreRequest,
    responses(
        (status = 200, description = "Throw recorded", body = GameSummary),
        (status = 409, description = "The game is over")
    )
)]
pub async fn add_score(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddScoreRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        molkky_service::add_score(&state, &uid, id, payload).await?,
    ))
}

/// Replace the whole throw history of a player.
#[utoipa::path(
    put,
    path = "/molkky/games/{id}/players/{player_id}/scores",
    tag = "molkky",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the game"),
        ("player_id" = String, Path, description = "Identifier of the player")
    ),
    request_body = UpdateScoresRequest,
    responses((status = 200, description = "Scores replaced", body = GameSummary))
)]
pub async fn update_scores(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateScoresRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        molkky_service::update_scores(&state, &uid, id, player_id, payload).await?,
    ))
}

/// Replace the most recent throw of a player.
#[utoipa::path(
    put,
    path = "/molkky/games/{id}/players/{player_id}/scores/last",
    tag = "molkky",
    params(
        ("X-User-Id" = String, Header, description = "Opaque identifier of the caller"),
        ("id" = String, Path, description = "Identifier of the game"),
        ("player_id" = String, Path, description = "Identifier of the player")
    ),
    request_body = UpdateLastScoreRequest,
    responses(
        (status = 200, description = "Last score replaced", body = GameSummary),
        (status = 409, description = "The player has not thrown yet")
    )
)]
pub async fn update_last_score(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Path((id, player_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateLastScoreRequest>,
) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(
        molkky_service::update_last_score(&state, &uid, id, player_id, payload).await?,
    ))
}

/// Join a game or player record shared by another user.
#[utoipa::path(
    post,
    path = "/molkky/share",
    tag = "molkky",
    params(("X-User-Id" = String, Header, description = "Opaque identifier of the caller")),
    request_body = ShareObject,
    responses((status = 204, description = "Access granted"))
)]
pub async fn join_shared(
    State(state): State<SharedState>,
    CurrentUser(uid): CurrentUser,
    Json(payload): Json<ShareObject>,
) -> Result<StatusCode, AppError> {
    molkky_service::join_shared(&state, &uid, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
