//! Espionage step: intel, sabotage, propaganda
//!
//! Spy tokens are spent whether or not the operation succeeds, and every
//! operation emits an event carrying the recorded roll outcome.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{EventLog, EventPayload, IntelReport, TokenGrant};
use crate::model::game::TurnPhase;
use crate::model::world::WorldModel;

const SABOTAGE_MONEY_DAMAGE: i64 = 20;
const SABOTAGE_MILITARY_DAMAGE: i64 = 2;
const PROPAGANDA_STABILITY_HIT: i32 = -2;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    regenerate_tokens(world, log, turn, config)?;

    for (country, action) in decls {
        if !world.is_alive(country) {
            continue;
        }
        enum SpyOp {
            Intel,
            Sabotage,
            Propaganda,
        }
        let (target, op) = match action {
            Action::SpyIntel { target } => (target, SpyOp::Intel),
            Action::SpySabotage { target } => (target, SpyOp::Sabotage),
            Action::SpyPropaganda { target } => (target, SpyOp::Propaganda),
            _ => continue,
        };
        if !world.is_alive(target) || target == country {
            continue;
        }
        if world.country(country)?.spy_tokens == 0 {
            continue;
        }

        match op {
            SpyOp::Intel => {
                let t = world.country(target)?;
                let report = IntelReport {
                    military: t.military,
                    fleet: t.fleet,
                    money: t.money,
                    tech: t.tech,
                    stability: t.stability,
                    spy_tokens: t.spy_tokens,
                };
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::SpyIntel {
                        spy: country.clone(),
                        target: target.clone(),
                        tokens_spent: 1,
                        report,
                    },
                )?;
            }
            SpyOp::Sabotage => {
                let success = roll(world, config, country, target, rng)?;
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::SpySabotage {
                        spy: country.clone(),
                        target: target.clone(),
                        tokens_spent: 1,
                        success,
                        money_damage: if success { SABOTAGE_MONEY_DAMAGE } else { 0 },
                        military_damage: if success { SABOTAGE_MILITARY_DAMAGE } else { 0 },
                    },
                )?;
            }
            SpyOp::Propaganda => {
                let success = roll(world, config, country, target, rng)?;
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::SpyPropaganda {
                        spy: country.clone(),
                        target: target.clone(),
                        tokens_spent: 1,
                        success,
                        stability_delta: if success { PROPAGANDA_STABILITY_HIT } else { 0 },
                    },
                )?;
            }
        }
    }
    Ok(())
}

fn regenerate_tokens(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
) -> Result<()> {
    let mut grants = Vec::new();
    for id in world.alive_countries() {
        let current = world.country(&id)?.spy_tokens;
        let replenished = (current + config.spy_token_regen).min(config.max_spy_tokens);
        if replenished != current {
            grants.push(TokenGrant { country: id, tokens: replenished });
        }
    }
    if !grants.is_empty() {
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::SpyTokensRegenerated { grants },
        )?;
    }
    Ok(())
}

/// Success chance scales with the tech gap, clamped away from certainty
fn roll(
    world: &WorldModel,
    config: &GameConfig,
    spy: &CountryId,
    target: &CountryId,
    rng: &mut ChaCha8Rng,
) -> Result<bool> {
    let spy_tech = world.country(spy)?.tech as f64;
    let target_tech = world.country(target)?.tech as f64;
    let chance = (config.spy_success_base
        + (spy_tech - target_tech) * config.spy_success_per_tech)
        .clamp(0.05, 0.95);
    Ok(rng.gen::<f64>() < chance)
}
