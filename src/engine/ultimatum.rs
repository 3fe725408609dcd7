//! Ultimatum step: issuing demands and auto-resolving expired ones

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{EventLog, EventPayload};
use crate::model::game::TurnPhase;
use crate::model::war::{Ultimatum, UltimatumDemand, WarCause};
use crate::model::world::WorldModel;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
) -> Result<()> {
    issue_new(world, log, turn, decls, config)?;
    resolve_due(world, log, turn, config)?;
    Ok(())
}

fn issue_new(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
) -> Result<()> {
    for (country, action) in decls {
        let Action::SendUltimatum { target, demand } = action else {
            continue;
        };
        if !world.is_alive(country) || !world.is_alive(target) || target == country {
            continue;
        }
        // A demanded province must actually be the target's to cede.
        if let UltimatumDemand::CedeProvince { province } = demand {
            let owned = world
                .province(province)
                .map(|p| &p.owner == target)
                .unwrap_or(false);
            if !owned {
                continue;
            }
        }
        // One open demand per (issuer, target) pair at a time.
        if world
            .ultimatums
            .iter()
            .any(|u| !u.resolved && &u.from == country && &u.to == target)
        {
            continue;
        }
        let id = world.next_ultimatum_id();
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::UltimatumIssued {
                id,
                from: country.clone(),
                to: target.clone(),
                demand: demand.clone(),
                issued_turn: turn,
                expiry_turn: turn + config.ultimatum_expiry_turns,
            },
        )?;
    }
    Ok(())
}

fn resolve_due(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
) -> Result<()> {
    let due: Vec<Ultimatum> = world
        .ultimatums
        .iter()
        .filter(|u| !u.resolved && u.expiry_turn <= turn)
        .cloned()
        .collect();
    for ultimatum in due {
        if !world.is_alive(&ultimatum.from) || !world.is_alive(&ultimatum.to) {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::UltimatumVoided { id: ultimatum.id },
            )?;
            continue;
        }
        let issuer_military = world.country(&ultimatum.from)?.military;
        let target_military = world.country(&ultimatum.to)?.military;
        let outmatched =
            (target_military as f64) < issuer_military as f64 * config.ultimatum_concession_ratio;
        if outmatched {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::UltimatumConceded {
                    id: ultimatum.id,
                    from: ultimatum.from.clone(),
                    to: ultimatum.to.clone(),
                    demand: ultimatum.demand.clone(),
                },
            )?;
        } else {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::UltimatumRejected {
                    id: ultimatum.id,
                    from: ultimatum.from.clone(),
                    to: ultimatum.to.clone(),
                },
            )?;
            if !world.has_active_war(&ultimatum.from, &ultimatum.to) {
                let war = world.next_war_id();
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::WarDeclared {
                        war,
                        attacker: ultimatum.from.clone(),
                        defender: ultimatum.to.clone(),
                        cause: WarCause::UltimatumRejected,
                        turn,
                    },
                )?;
            }
        }
    }
    Ok(())
}
