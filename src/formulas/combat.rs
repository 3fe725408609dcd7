//! Pure combat math
//!
//! Every function is deterministic given its inputs and the RNG handle
//! passed in; callers record the computed outcome into events, so these
//! functions are never re-run during replay.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GameConfig;
use crate::model::province::Terrain;

#[derive(Debug, Clone)]
pub struct BattleInput {
    /// Troops committed to the assault (K)
    pub attacker_troops: i64,
    pub attacker_tech: u8,
    /// Garrison holding the province (K)
    pub defender_troops: i64,
    pub defender_tech: u8,
    pub terrain: Terrain,
    /// Target declared `defend` this turn
    pub defender_posture: bool,
    /// Supply step output from last turn
    pub province_supplied: bool,
    /// Target under an active naval blockade
    pub defender_blockaded: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct BattleOutcome {
    pub attacker_wins: bool,
    pub attacker_losses: i64,
    pub defender_losses: i64,
}

/// Defensive terrain multiplier
pub fn terrain_bonus(terrain: Terrain) -> f64 {
    match terrain {
        Terrain::Plains => 1.0,
        Terrain::Coast => 1.05,
        Terrain::Forest => 1.15,
        Terrain::Urban => 1.25,
        Terrain::Mountains => 1.3,
    }
}

fn tech_multiplier(config: &GameConfig, tech: u8) -> f64 {
    1.0 + tech as f64 * config.tech_combat_bonus
}

fn variance_roll(config: &GameConfig, rng: &mut ChaCha8Rng) -> f64 {
    let v = config.combat_variance;
    1.0 - v + rng.gen::<f64>() * 2.0 * v
}

/// Resolve one assault on one province. Ties favor the defender:
/// the attacker needs strictly greater effective strength.
pub fn resolve_battle(
    config: &GameConfig,
    input: &BattleInput,
    rng: &mut ChaCha8Rng,
) -> BattleOutcome {
    let attacker_strength = input.attacker_troops as f64
        * tech_multiplier(config, input.attacker_tech)
        * variance_roll(config, rng);

    let mut defender_strength = input.defender_troops.max(1) as f64
        * tech_multiplier(config, input.defender_tech)
        * terrain_bonus(input.terrain)
        * config.defender_home_bonus
        * variance_roll(config, rng);
    if input.defender_posture {
        defender_strength *= config.defend_posture_bonus;
    }
    if !input.province_supplied {
        defender_strength *= config.unsupplied_penalty;
    }
    if input.defender_blockaded {
        defender_strength *= config.blockade_defense_penalty;
    }

    let attacker_wins = attacker_strength > defender_strength;
    let (winner_str, loser_str) = if attacker_wins {
        (attacker_strength, defender_strength)
    } else {
        (defender_strength, attacker_strength)
    };
    // How close the fight was, in (0, 1]; closer fights bleed the winner more
    let closeness = if winner_str > 0.0 { loser_str / winner_str } else { 0.0 };

    let (attacker_losses, defender_losses) = if attacker_wins {
        let a = (input.attacker_troops as f64 * 0.25 * closeness).round() as i64;
        let d = (input.defender_troops as f64 * (0.5 + 0.4 * closeness)).ceil() as i64;
        (a, d)
    } else {
        let a = (input.attacker_troops as f64 * (0.5 + 0.4 * closeness)).ceil() as i64;
        let d = (input.defender_troops as f64 * 0.25 * closeness).round() as i64;
        (a, d)
    };

    BattleOutcome {
        attacker_wins,
        attacker_losses: attacker_losses.clamp(0, input.attacker_troops),
        defender_losses: defender_losses.clamp(0, input.defender_troops),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NavalOutcome {
    pub attacker_won: bool,
    pub attacker_fleet_losses: i64,
    pub defender_fleet_losses: i64,
}

/// Fleet engagement; same variance band, defender keeps the home bonus.
pub fn resolve_naval(
    config: &GameConfig,
    attacker_fleet: i64,
    attacker_tech: u8,
    defender_fleet: i64,
    defender_tech: u8,
    rng: &mut ChaCha8Rng,
) -> NavalOutcome {
    let attacker_strength = attacker_fleet as f64
        * tech_multiplier(config, attacker_tech)
        * variance_roll(config, rng);
    let defender_strength = defender_fleet.max(1) as f64
        * tech_multiplier(config, defender_tech)
        * config.defender_home_bonus
        * variance_roll(config, rng);

    let attacker_won = attacker_strength > defender_strength;
    if attacker_won {
        NavalOutcome {
            attacker_won,
            attacker_fleet_losses: 1.min(attacker_fleet),
            defender_fleet_losses: 2.min(defender_fleet),
        }
    } else {
        NavalOutcome {
            attacker_won,
            attacker_fleet_losses: 2.min(attacker_fleet),
            defender_fleet_losses: 1.min(defender_fleet),
        }
    }
}
