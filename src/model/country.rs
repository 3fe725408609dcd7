//! Country records: the actor unit of the game

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, CountryId, ProvinceId, Turn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    /// Agent controlling this country; None until someone joins
    pub owner: Option<AgentId>,
    pub capital: ProvinceId,
    /// Total troops in K; garrisons are deployments of this figure
    pub military: i64,
    /// Naval units; gates blockade and naval attack orders
    pub fleet: i64,
    pub money: i64,
    /// Technology level, 0..=10
    pub tech: u8,
    /// Internal order, 0..=10; zero collapses the country
    pub stability: i32,
    /// Budget for espionage orders; regenerates each turn up to the cap
    pub spy_tokens: u8,
    pub is_eliminated: bool,
    /// Set exactly once, at conquest elimination; stays None for collapse
    pub annexed_by: Option<CountryId>,
    /// Turn on which this country's declaration is overridden to neutral
    /// (set by the unrest rule); cleared by passing that turn
    pub forced_neutral_turn: Option<Turn>,
}

impl Country {
    pub fn clamp_stability(&mut self) {
        self.stability = self.stability.clamp(0, 10);
    }

    pub fn is_alive(&self) -> bool {
        !self.is_eliminated
    }
}
