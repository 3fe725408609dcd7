//! Game tuning configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose
//! and how they interact with each other.

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};

/// Action substituted for a country that never submitted a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Hold position with the defensive combat bonus.
    Defend,
    /// Sit the turn out (small stability bonus, no combat bonus).
    Neutral,
}

/// Tuning constants for one game
///
/// These values have been tuned against the reference scenario set.
/// Changing them shifts pacing: shorter deadlines and higher revolt
/// chances make games end earlier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    // === LOBBY / PACING ===
    /// Minimum joined countries before an admin may start the game
    pub min_players: usize,

    /// Maximum joined countries (also bounds the roster offered in the lobby)
    pub max_players: usize,

    /// Hard turn cap; reaching it triggers the ranking win condition
    pub max_turns: u32,

    /// Wall-clock seconds agents get for the negotiation phase
    pub negotiation_deadline_secs: u64,

    /// Wall-clock seconds agents get for the declaration phase
    pub declaration_deadline_secs: u64,

    /// Extra seconds granted after the last submission arrives, so a
    /// resubmission racing the deadline is not cut off mid-flight
    pub grace_delay_secs: u64,

    /// Action used for countries that never declared this turn
    pub fallback_action: FallbackKind,

    // === COMBAT ===
    /// Half-width of the multiplicative combat variance band.
    ///
    /// Effective strength is scaled by a roll in [1 - x, 1 + x]. At 0.2 a
    /// 20% underdog can still win; at 0.0 combat is fully deterministic.
    pub combat_variance: f64,

    /// Strength multiplier per tech level (attacker and defender alike)
    pub tech_combat_bonus: f64,

    /// Defender strength multiplier when the target declared `defend`
    pub defend_posture_bonus: f64,

    /// Intrinsic defender strength multiplier (holding ground is easier)
    pub defender_home_bonus: f64,

    /// Defender strength multiplier when the garrison province is unsupplied
    pub unsupplied_penalty: f64,

    /// Defender strength multiplier while under naval blockade
    pub blockade_defense_penalty: f64,

    /// Share of a country's total military committed to each attack order
    pub attack_commitment: f64,

    /// Minimum fleet size required to sustain a blockade
    pub blockade_min_fleet: i64,

    // === ESPIONAGE ===
    /// Spy tokens each country starts with
    pub starting_spy_tokens: u8,

    /// Tokens regained per turn, up to the cap
    pub spy_token_regen: u8,

    /// Spy token cap
    pub max_spy_tokens: u8,

    /// Base success chance for sabotage/propaganda before tech scaling
    pub spy_success_base: f64,

    /// Success chance added per point of (spy tech - target tech)
    pub spy_success_per_tech: f64,

    // === ECONOMY ===
    /// Income multiplier per tech level
    pub tech_income_bonus: f64,

    /// Income share lost while blockaded
    pub blockade_income_penalty: f64,

    /// Income share produced by an unsupplied province
    pub unsupplied_income_share: f64,

    /// Maintenance cost per 1K troops per turn
    pub troop_maintenance: i64,

    /// Maintenance cost per tech level per turn
    pub tech_maintenance: i64,

    /// Base cost to recruit 1K troops
    pub recruit_cost: i64,

    /// Recruit cost discount per tech level
    pub tech_recruit_discount: f64,

    /// Troops (in K) recruited by one `invest_military` order
    pub recruit_batch: i64,

    /// Money cost of one `invest_stability` order
    pub stability_invest_cost: i64,

    /// Fraction of troops deserting on a turn the treasury runs dry
    pub desertion_rate: f64,

    // === POLITICAL ===
    /// Stability value quiet countries drift toward
    pub stability_baseline: i32,

    /// Stability at or below which a country is forced neutral next turn
    pub unrest_threshold: i32,

    /// Chance per turn that an unsupplied province revolts to its
    /// original owner
    pub supply_revolt_chance: f64,

    // === ULTIMATUMS ===
    /// Turns between issuing an ultimatum and its auto-resolution
    pub ultimatum_expiry_turns: u32,

    /// The target concedes iff its military is below the issuer's
    /// military times this ratio; otherwise the demand becomes a war
    pub ultimatum_concession_ratio: f64,

    // === UNIONS ===
    /// Minimum stability for union eligibility
    pub union_stability_threshold: i32,

    /// Minimum tech for union eligibility
    pub union_tech_threshold: u8,

    /// Fraction of the gap to the pool average closed each turn.
    ///
    /// At 0.25 a union converges on shared money/military levels within
    /// a handful of turns without instantly flattening its members.
    pub union_pool_share: f64,

    // === WIN CONDITIONS ===
    /// Share of all provinces a single country must own to win by domination
    pub domination_share: f64,

    // === WORLD EVENTS ===
    /// Minimum scripted world events drawn per turn
    pub world_events_min: u32,

    /// Maximum scripted world events drawn per turn
    pub world_events_max: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 12,
            max_turns: 20,
            negotiation_deadline_secs: 120,
            declaration_deadline_secs: 120,
            grace_delay_secs: 3,
            fallback_action: FallbackKind::Defend,

            combat_variance: 0.2,
            tech_combat_bonus: 0.05,
            defend_posture_bonus: 1.3,
            defender_home_bonus: 1.2,
            unsupplied_penalty: 0.5,
            blockade_defense_penalty: 0.9,
            attack_commitment: 0.5,
            blockade_min_fleet: 2,

            starting_spy_tokens: 2,
            spy_token_regen: 1,
            max_spy_tokens: 3,
            spy_success_base: 0.5,
            spy_success_per_tech: 0.05,

            tech_income_bonus: 0.05,
            blockade_income_penalty: 0.3,
            unsupplied_income_share: 0.5,
            troop_maintenance: 2,
            tech_maintenance: 10,
            recruit_cost: 10,
            tech_recruit_discount: 0.05,
            recruit_batch: 5,
            stability_invest_cost: 30,
            desertion_rate: 0.1,

            stability_baseline: 5,
            unrest_threshold: 2,
            supply_revolt_chance: 0.3,

            ultimatum_expiry_turns: 2,
            ultimatum_concession_ratio: 1.5,

            union_stability_threshold: 7,
            union_tech_threshold: 3,
            union_pool_share: 0.25,

            domination_share: 0.30,

            world_events_min: 1,
            world_events_max: 2,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.min_players < 2 {
            return Err(GameError::InvalidConfig(
                "min_players must be at least 2".into(),
            ));
        }
        if self.max_players < self.min_players {
            return Err(GameError::InvalidConfig(format!(
                "max_players ({}) must be >= min_players ({})",
                self.max_players, self.min_players
            )));
        }
        if self.max_turns == 0 {
            return Err(GameError::InvalidConfig("max_turns must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.combat_variance) {
            return Err(GameError::InvalidConfig(format!(
                "combat_variance ({}) must be in [0, 1)",
                self.combat_variance
            )));
        }
        for (name, chance) in [
            ("spy_success_base", self.spy_success_base),
            ("supply_revolt_chance", self.supply_revolt_chance),
            ("desertion_rate", self.desertion_rate),
            ("domination_share", self.domination_share),
            ("union_pool_share", self.union_pool_share),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(GameError::InvalidConfig(format!(
                    "{name} ({chance}) must be in [0, 1]"
                )));
            }
        }
        if self.world_events_min > self.world_events_max {
            return Err(GameError::InvalidConfig(format!(
                "world_events_min ({}) must be <= world_events_max ({})",
                self.world_events_min, self.world_events_max
            )));
        }
        if self.ultimatum_concession_ratio <= 0.0 {
            return Err(GameError::InvalidConfig(
                "ultimatum_concession_ratio must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load overrides from a TOML file on top of the defaults
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }
}
