//! HTTP handlers and wire types
//!
//! Thin translation layer: extract, authenticate, delegate to the
//! scheduler, map [`GameError`] to a status code. No game logic here.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::actions::ActionRequest;
use crate::core::config::GameConfig;
use crate::core::error::GameError;
use crate::core::types::{AgentId, CountryId, GameId, Turn};
use crate::events::{EventPayload, GameEvent};
use crate::model::game::{GameStatus, TurnPhase, WinReason};
use crate::model::submission::{Declaration, NegotiationMessage, Recipient, SubmissionPayload, Visibility};
use crate::scheduler;

use super::AppState;

/// [`GameError`] carried through axum's response machinery
pub struct ApiError(GameError);

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GameError::GameNotFound(_) => StatusCode::NOT_FOUND,
            GameError::Unauthorized => StatusCode::UNAUTHORIZED,
            GameError::NotParticipant => StatusCode::FORBIDDEN,
            GameError::Consistency { .. }
            | GameError::Io(_)
            | GameError::Serde(_)
            | GameError::ConfigParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

fn require_admin(state: &AppState, headers: &HeaderMap) -> std::result::Result<(), ApiError> {
    match super::auth::bearer_token(headers) {
        Some(token) if token == state.admin_token.as_str() => Ok(()),
        _ => Err(GameError::Unauthorized.into()),
    }
}

// === Auth ===

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Doubles as the bearer token
    pub agent_id: AgentId,
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult<RegisterResponse> {
    let agent_id = state.agents.register(body.display_name).await;
    Ok(Json(RegisterResponse { agent_id }))
}

// === Admin ===

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub game_id: GameId,
}

pub async fn create_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<GameConfig>>,
) -> ApiResult<CreateGameResponse> {
    require_admin(&state, &headers)?;
    let config = body.map(|Json(c)| c).unwrap_or_else(|| (*state.default_config).clone());
    let game_id = state.games.create(&state.map, config).await?;
    Ok(Json(CreateGameResponse { game_id }))
}

#[derive(Debug, Serialize)]
pub struct GameSummary {
    pub game_id: GameId,
    pub status: GameStatus,
    pub turn: Turn,
}

pub async fn list_games(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Vec<GameSummary>> {
    require_admin(&state, &headers)?;
    let mut rows = Vec::new();
    for id in state.games.list().await {
        // A game archived between list and get just drops out.
        let Ok(shared) = state.games.get(&id).await else { continue };
        let ctx = shared.lock().await;
        rows.push(GameSummary { game_id: id, status: ctx.game.status, turn: ctx.game.turn });
    }
    Ok(Json(rows))
}

pub async fn start_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
) -> ApiResult<serde_json::Value> {
    require_admin(&state, &headers)?;
    let shared = state.games.get(&id).await?;
    scheduler::start(&shared).await?;
    Ok(Json(json!({ "status": "started" })))
}

pub async fn end_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
) -> ApiResult<serde_json::Value> {
    require_admin(&state, &headers)?;
    let shared = state.games.get(&id).await?;
    scheduler::end(&shared).await?;
    Ok(Json(json!({ "status": "ended" })))
}

// === Player ===

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub country: CountryId,
}

pub async fn join_game(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
    Json(body): Json<JoinRequest>,
) -> ApiResult<serde_json::Value> {
    let agent = state.agents.authenticate(&headers).await?;
    let shared = state.games.get(&id).await?;
    scheduler::join(&shared, agent, body.country.clone()).await?;
    Ok(Json(json!({ "country": body.country })))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SubmitRequest {
    Negotiation {
        messages: Vec<NegotiationMessage>,
    },
    Declaration {
        #[serde(flatten)]
        action: ActionRequest,
        #[serde(default)]
        justification: String,
    },
}

pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
    Json(body): Json<SubmitRequest>,
) -> ApiResult<serde_json::Value> {
    let agent = state.agents.authenticate(&headers).await?;
    let shared = state.games.get(&id).await?;
    let payload = match body {
        SubmitRequest::Negotiation { messages } => SubmissionPayload::Negotiation { messages },
        SubmitRequest::Declaration { action, justification } => {
            SubmissionPayload::Declaration(Declaration {
                action: action.build()?,
                justification,
            })
        }
    };
    scheduler::submit(&shared, agent, payload).await?;
    Ok(Json(json!({ "status": "accepted" })))
}

// === Read surface ===

#[derive(Debug, Serialize)]
pub struct CountryView {
    pub id: CountryId,
    pub name: String,
    pub territory: usize,
    pub is_eliminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annexed_by: Option<CountryId>,
    /// Own-country fields, omitted from everyone else's view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub military: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spy_tokens: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct TurnView {
    pub game_id: GameId,
    pub status: GameStatus,
    pub turn: Turn,
    pub phase: TurnPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_unix_ms: Option<u64>,
    pub world_tension: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<CountryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_reason: Option<WinReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub you: Option<CountryId>,
    pub countries: Vec<CountryView>,
}

pub async fn turn_snapshot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
) -> ApiResult<TurnView> {
    let viewer = state.agents.authenticate_optional(&headers).await?;
    let shared = state.games.get(&id).await?;
    let ctx = shared.lock().await;

    let own = viewer.and_then(|agent| {
        ctx.world
            .countries_ordered()
            .find(|c| c.owner == Some(agent))
            .map(|c| c.id.clone())
    });
    let countries = ctx
        .world
        .countries_ordered()
        .map(|c| {
            let mine = Some(&c.id) == own.as_ref();
            CountryView {
                id: c.id.clone(),
                name: c.name.clone(),
                territory: ctx.world.territory(&c.id),
                is_eliminated: c.is_eliminated,
                annexed_by: c.annexed_by.clone(),
                military: mine.then_some(c.military),
                fleet: mine.then_some(c.fleet),
                money: mine.then_some(c.money),
                tech: mine.then_some(c.tech),
                stability: mine.then_some(c.stability),
                spy_tokens: mine.then_some(c.spy_tokens),
            }
        })
        .collect();

    Ok(Json(TurnView {
        game_id: ctx.game.id,
        status: ctx.game.status,
        turn: ctx.game.turn,
        phase: ctx.game.phase,
        deadline_unix_ms: ctx.game.deadline_unix_ms,
        world_tension: ctx.game.world_tension,
        winner: ctx.game.winner.clone(),
        win_reason: ctx.game.win_reason.clone(),
        you: own,
        countries,
    }))
}

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub turn: Option<Turn>,
    pub since: Option<u64>,
}

pub async fn events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<GameId>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Vec<GameEvent>> {
    let viewer = state.agents.authenticate_optional(&headers).await?;
    let shared = state.games.get(&id).await?;
    let ctx = shared.lock().await;

    let own = viewer.and_then(|agent| {
        ctx.world
            .countries_ordered()
            .find(|c| c.owner == Some(agent))
            .map(|c| c.id.clone())
    });
    let events = ctx
        .log
        .events_since(query.since.unwrap_or(0))
        .iter()
        .filter(|e| query.turn.map(|t| e.turn == t).unwrap_or(true))
        .filter(|e| visible_to(&e.payload, own.as_ref()))
        .cloned()
        .collect();
    Ok(Json(events))
}

/// Private messages are only shown to their parties; intel reports only
/// to the spy who bought them. Everything else is the public feed.
fn visible_to(payload: &EventPayload, viewer: Option<&CountryId>) -> bool {
    match payload {
        EventPayload::MessageSent { from, to, visibility: Visibility::Private, .. } => {
            match (viewer, to) {
                (Some(me), Recipient::Country { id }) => me == from || me == id,
                (Some(me), Recipient::Broadcast) => me == from,
                (None, _) => false,
            }
        }
        EventPayload::SpyIntel { spy, .. } => viewer == Some(spy),
        _ => true,
    }
}

#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub country: CountryId,
    pub name: String,
    pub territory: usize,
    pub military: i64,
    pub gdp: i64,
    pub is_eliminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annexed_by: Option<CountryId>,
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Path(id): Path<GameId>,
) -> ApiResult<Vec<LeaderboardRow>> {
    let shared = state.games.get(&id).await?;
    let ctx = shared.lock().await;
    let mut rows: Vec<LeaderboardRow> = ctx
        .world
        .countries_ordered()
        .map(|c| LeaderboardRow {
            country: c.id.clone(),
            name: c.name.clone(),
            territory: ctx.world.territory(&c.id),
            military: c.military,
            gdp: ctx.world.provinces_of(&c.id).iter().map(|p| p.gdp_value).sum(),
            is_eliminated: c.is_eliminated,
            annexed_by: c.annexed_by.clone(),
        })
        .collect();
    rows.sort_by(|a, b| {
        (b.territory, b.military, &a.country).cmp(&(a.territory, a.military, &b.country))
    });
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionKind;

    #[test]
    fn test_submit_request_declaration_wire_shape() {
        let raw = r#"{"phase":"declaration","kind":"attack","target":"bryce","justification":"border dispute"}"#;
        let parsed: SubmitRequest = serde_json::from_str(raw).unwrap();
        match parsed {
            SubmitRequest::Declaration { action, justification } => {
                assert_eq!(action.kind, ActionKind::Attack);
                assert_eq!(action.target, Some(CountryId::new("bryce")));
                assert_eq!(justification, "border dispute");
            }
            other => panic!("parsed as {other:?}"),
        }
    }

    #[test]
    fn test_submit_request_negotiation_wire_shape() {
        let raw = r#"{"phase":"negotiation","messages":[{"to":{"kind":"country","id":"bryce"},"content":"truce?","visibility":"private"}]}"#;
        let parsed: SubmitRequest = serde_json::from_str(raw).unwrap();
        assert!(matches!(parsed, SubmitRequest::Negotiation { ref messages } if messages.len() == 1));
    }

    #[tokio::test]
    async fn test_admin_game_list_requires_token() {
        let state = AppState::new(
            "hq-token".into(),
            crate::model::map::default_map(),
            GameConfig::default(),
        );
        let a = state.games.create(&state.map, GameConfig::default()).await.unwrap();
        let b = state.games.create(&state.map, GameConfig::default()).await.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer hq-token".parse().unwrap());
        let rows = match list_games(State(state.clone()), headers).await {
            Ok(Json(rows)) => rows,
            Err(_) => panic!("admin list rejected"),
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.status == GameStatus::Lobby && r.turn == 0));
        assert!(rows.iter().any(|r| r.game_id == a));
        assert!(rows.iter().any(|r| r.game_id == b));

        // No bearer token, no listing.
        assert!(list_games(State(state), HeaderMap::new()).await.is_err());
    }

    #[test]
    fn test_private_message_visibility() {
        let payload = EventPayload::MessageSent {
            from: CountryId::new("arlen"),
            to: Recipient::Country { id: CountryId::new("bryce") },
            visibility: Visibility::Private,
            content: "secret".into(),
        };
        assert!(visible_to(&payload, Some(&CountryId::new("arlen"))));
        assert!(visible_to(&payload, Some(&CountryId::new("bryce"))));
        assert!(!visible_to(&payload, Some(&CountryId::new("cresta"))));
        assert!(!visible_to(&payload, None));
    }

    #[test]
    fn test_intel_report_visibility() {
        let payload = EventPayload::SpyIntel {
            spy: CountryId::new("arlen"),
            target: CountryId::new("bryce"),
            tokens_spent: 1,
            report: crate::events::IntelReport {
                military: 10,
                fleet: 2,
                money: 100,
                tech: 1,
                stability: 5,
                spy_tokens: 2,
            },
        };
        assert!(visible_to(&payload, Some(&CountryId::new("arlen"))));
        assert!(!visible_to(&payload, Some(&CountryId::new("bryce"))));
    }
}
