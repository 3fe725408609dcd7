//! Agent registry: bearer-token identity for untrusted agents
//!
//! Registration hands out an opaque uuid credential; the same value is
//! the agent id everywhere else. No passwords, no expiry: agents are
//! game-scoped automation, not people.

use std::time::{SystemTime, UNIX_EPOCH};

use ahash::AHashMap;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{GameError, Result};
use crate::core::types::AgentId;

#[derive(Debug, Clone)]
pub struct AgentProfile {
    pub id: AgentId,
    pub display_name: String,
    pub registered_at_ms: u64,
}

#[derive(Default)]
pub struct AgentRegistry {
    agents: RwLock<AHashMap<Uuid, AgentProfile>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new agent; the returned id doubles as the bearer token.
    pub async fn register(&self, display_name: String) -> AgentId {
        let id = AgentId::new();
        let profile = AgentProfile {
            id,
            display_name,
            registered_at_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        };
        debug!(agent = %id, name = %profile.display_name, "agent registered");
        self.agents.write().await.insert(id.0, profile);
        id
    }

    /// Resolve a bearer token to a registered agent.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<AgentId> {
        let token = bearer_token(headers).ok_or(GameError::Unauthorized)?;
        let uuid = Uuid::parse_str(token).map_err(|_| GameError::Unauthorized)?;
        self.agents
            .read()
            .await
            .get(&uuid)
            .map(|p| p.id)
            .ok_or(GameError::Unauthorized)
    }

    /// Like [`authenticate`], but anonymous callers are allowed.
    pub async fn authenticate_optional(&self, headers: &HeaderMap) -> Result<Option<AgentId>> {
        if bearer_token(headers).is_none() {
            return Ok(None);
        }
        self.authenticate(headers).await.map(Some)
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}
