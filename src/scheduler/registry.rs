//! Registry of running games
//!
//! A read-mostly map from game id to the game's shared context. The
//! outer `RwLock` only guards the map itself; all per-game work goes
//! through the inner `tokio::sync::Mutex`.

use std::sync::Arc;

use ahash::AHashMap;
use rand::Rng;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use super::{GameContext, SharedGame};
use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::GameId;
use crate::model::game::Game;
use crate::model::map::MapSpec;
use crate::model::world::WorldModel;

#[derive(Default)]
pub struct GameRegistry {
    games: RwLock<AHashMap<GameId, SharedGame>>,
}

impl GameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a lobby game from a map and config. The seed is drawn
    /// here and never changes afterwards.
    pub async fn create(&self, map: &MapSpec, config: GameConfig) -> Result<GameId> {
        config.validate()?;
        let world = WorldModel::from_map(map)?;
        let id = GameId::new();
        let seed: u64 = rand::thread_rng().gen();
        let game = Game::new(id, seed);
        let ctx = Arc::new(Mutex::new(GameContext::new(game, world, config)));
        self.games.write().await.insert(id, ctx);
        info!(game = %id, "game created");
        Ok(id)
    }

    pub async fn get(&self, id: &GameId) -> Result<SharedGame> {
        self.games
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(GameError::GameNotFound(*id))
    }

    pub async fn list(&self) -> Vec<GameId> {
        self.games.read().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::default_map;

    #[tokio::test]
    async fn test_create_and_fetch() {
        let registry = GameRegistry::new();
        let id = registry.create(&default_map(), GameConfig::default()).await.unwrap();
        let shared = registry.get(&id).await.unwrap();
        let ctx = shared.lock().await;
        assert_eq!(ctx.game.id, id);
        assert!(ctx.log.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_game_not_found() {
        let registry = GameRegistry::new();
        let err = registry.get(&GameId::new()).await.unwrap_err();
        assert!(matches!(err, GameError::GameNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let registry = GameRegistry::new();
        let config = GameConfig { min_players: 1, ..GameConfig::default() };
        assert!(registry.create(&default_map(), config).await.is_err());
    }
}
