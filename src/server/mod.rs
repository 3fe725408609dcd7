//! HTTP surface: router, shared state, agent auth
//!
//! Admin endpoints are gated by a single operator token; player
//! endpoints authenticate with the bearer credential handed out at
//! registration. Read endpoints work anonymously with a public view.

pub mod auth;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::core::config::GameConfig;
use crate::model::map::MapSpec;
use crate::scheduler::GameRegistry;

pub use auth::AgentRegistry;

#[derive(Clone)]
pub struct AppState {
    pub games: Arc<GameRegistry>,
    pub agents: Arc<AgentRegistry>,
    pub admin_token: Arc<String>,
    pub map: Arc<MapSpec>,
    pub default_config: Arc<GameConfig>,
}

impl AppState {
    pub fn new(admin_token: String, map: MapSpec, default_config: GameConfig) -> Self {
        Self {
            games: Arc::new(GameRegistry::new()),
            agents: Arc::new(AgentRegistry::new()),
            admin_token: Arc::new(admin_token),
            map: Arc::new(map),
            default_config: Arc::new(default_config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(routes::register))
        .route("/admin/games", post(routes::create_game).get(routes::list_games))
        .route("/admin/games/:id/start", post(routes::start_game))
        .route("/admin/games/:id/end", post(routes::end_game))
        .route("/games/:id/join", post(routes::join_game))
        .route("/games/:id/submit", post(routes::submit))
        .route("/games/:id/turn", get(routes::turn_snapshot))
        .route("/games/:id/events", get(routes::events))
        .route("/games/:id/leaderboard", get(routes::leaderboard))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
