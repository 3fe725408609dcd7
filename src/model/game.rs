//! Per-game bookkeeping: status, phase, turn counter, tension

use serde::{Deserialize, Serialize};

use crate::core::types::{CountryId, GameId, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    Active,
    Ended,
}

/// Phases a turn cycles through while the game is active.
///
/// Resolution is never waited on by agents: the engine runs it to
/// completion under the game lock and the phase moves straight on to
/// the next negotiation (or the game ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Negotiation,
    Declaration,
    Resolution,
}

/// How a finished game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    /// Every other country was eliminated
    LastStanding,
    /// One country owns at least the configured share of all provinces
    Domination,
    /// Turn cap reached; ranked by territory, then treasury
    TurnLimit,
    /// An operator halted the game
    AdminHalt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub status: GameStatus,
    /// 0 while in the lobby, 1-based once started
    pub turn: Turn,
    pub phase: TurnPhase,
    /// Wall-clock deadline for the current phase, unix milliseconds.
    /// None during the lobby, resolution, and after the game ends.
    pub deadline_unix_ms: Option<u64>,
    /// Seed all per-turn RNGs derive from; fixed at creation
    pub seed: u64,
    /// Derived gauge of global aggression, clamped 0..=100
    pub world_tension: i32,
    pub winner: Option<CountryId>,
    pub win_reason: Option<WinReason>,
    /// Set when a consistency check fails; scheduling stops for this game
    pub faulted: bool,
}

impl Game {
    pub fn new(id: GameId, seed: u64) -> Self {
        Self {
            id,
            status: GameStatus::Lobby,
            turn: 0,
            phase: TurnPhase::Negotiation,
            deadline_unix_ms: None,
            seed,
            world_tension: 20,
            winner: None,
            win_reason: None,
            faulted: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == GameStatus::Active && !self.faulted
    }

    pub fn adjust_tension(&mut self, delta: i32) {
        self.world_tension = (self.world_tension + delta).clamp(0, 100);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_game_starts_in_lobby() {
        let game = Game::new(GameId::new(), 7);
        assert_eq!(game.status, GameStatus::Lobby);
        assert_eq!(game.turn, 0);
        assert!(!game.is_active());
    }

    #[test]
    fn test_tension_clamped() {
        let mut game = Game::new(GameId::new(), 7);
        game.adjust_tension(500);
        assert_eq!(game.world_tension, 100);
        game.adjust_tension(-500);
        assert_eq!(game.world_tension, 0);
    }
}
