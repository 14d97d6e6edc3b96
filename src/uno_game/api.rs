use super::card::Color;
use super::room::{ErrorKind, GameError, Room};
use super::rules::Rules;
use super::service::RoomService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

#[derive(Clone)]
pub struct AppState {
    service: RoomService,
}

impl AppState {
    pub fn new(service: RoomService) -> Self {
        Self { service }
    }
}

#[derive(Serialize, Deserialize)]
pub struct CreateRoomRequest {
    name: String,
    #[serde(default)]
    rules: Option<Rules>,
}

#[derive(Serialize, Deserialize)]
pub struct CreateRoomResponse {
    code: String,
    player_id: String,
    room: Room,
}

#[derive(Serialize, Deserialize)]
pub struct JoinRoomRequest {
    name: String,
}

#[derive(Serialize, Deserialize)]
pub struct JoinRoomResponse {
    player_id: String,
    room: Room,
}

#[derive(Serialize, Deserialize)]
pub struct PlayCardRequest {
    player_id: String,
    #[serde(default)]
    card_index: Option<usize>,
    #[serde(default)]
    chosen_color: Option<String>,
    #[serde(default)]
    say_uno: bool,
}

#[derive(Serialize, Deserialize)]
pub struct DrawRequest {
    player_id: String,
}

#[derive(Deserialize)]
pub struct PlayerQuery {
    player_id: String,
}

fn error_response(err: GameError) -> Response {
    let status = match err.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("{}", err);
    }
    (status, Json(json!({ "detail": err.to_string() }))).into_response()
}

pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "UNO backend ready" }))
}

pub async fn create_room(
    State(state): State<AppState>,
    Json(req): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    info!("Creating room for host {}", req.name);
    match state.service.create_room(req.name, req.rules).await {
        Ok((player_id, room)) => {
            let response = CreateRoomResponse {
                code: room.code.clone(),
                player_id,
                room,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to create room: {}", e);
            error_response(e)
        }
    }
}

pub async fn join_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<JoinRoomRequest>,
) -> impl IntoResponse {
    info!("{} joining room {}", req.name, code);
    match state.service.join_room(&code, req.name).await {
        Ok((player_id, room)) => Json(JoinRoomResponse { player_id, room }).into_response(),
        Err(e) => {
            info!("Failed to join room {}: {}", code, e);
            error_response(e)
        }
    }
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    match state.service.get_room(&code).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => {
            info!("Room not available: {} - {}", code, e);
            error_response(e)
        }
    }
}

pub async fn start_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PlayerQuery>,
) -> impl IntoResponse {
    info!("Starting room {} on behalf of {}", code, query.player_id);
    match state.service.start_room(&code, &query.player_id).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => {
            info!("Failed to start room {}: {}", code, e);
            error_response(e)
        }
    }
}

pub async fn play_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<PlayCardRequest>,
) -> impl IntoResponse {
    info!(
        "Player {} playing {:?} in room {}",
        req.player_id, req.card_index, code
    );
    // An unknown color counts as no choice; only a wild card needs one
    let chosen_color = req
        .chosen_color
        .as_deref()
        .and_then(|c| c.parse::<Color>().ok());
    if req.say_uno {
        info!("Player {} calls UNO in room {}", req.player_id, code);
    }

    match state
        .service
        .play_card(&code, &req.player_id, req.card_index, chosen_color)
        .await
    {
        Ok(room) => Json(room).into_response(),
        Err(e) => {
            info!("Failed to play card in room {}: {}", code, e);
            error_response(e)
        }
    }
}

pub async fn draw_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(req): Json<DrawRequest>,
) -> impl IntoResponse {
    info!("Player {} drawing in room {}", req.player_id, code);
    match state.service.draw_card(&code, &req.player_id).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => {
            info!("Failed to draw card in room {}: {}", code, e);
            error_response(e)
        }
    }
}

pub async fn set_rules(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<PlayerQuery>,
    Json(rules): Json<Rules>,
) -> impl IntoResponse {
    info!("Updating rules for room {}", code);
    match state.service.set_rules(&code, &query.player_id, rules).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => {
            info!("Failed to update rules in room {}: {}", code, e);
            error_response(e)
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    // Create a trace layer for logging
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().include_headers(true))
        .on_response(DefaultOnResponse::new().include_headers(true));

    Router::new()
        .route("/", get(root))
        .route("/api/rooms/create", post(create_room))
        .route("/api/rooms/{code}", get(get_room))
        .route("/api/rooms/{code}/join", post(join_room))
        .route("/api/rooms/{code}/start", post(start_room))
        .route("/api/rooms/{code}/play", post(play_card))
        .route("/api/rooms/{code}/draw", post(draw_card))
        .route("/api/rooms/{code}/rules", post(set_rules))
        .layer(cors)
        .layer(trace_layer)
        .with_state(state)
}

pub async fn start_api_server(
    bind: SocketAddr,
    service: RoomService,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting UNO room server...");
    let app = router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("API server running on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}
