//! Military step: blockades, naval battles, land attacks, annexation
//!
//! Attacks resolve sequentially in submission order; each one sees the
//! target's state as left by the previous attacker. Capturing a capital
//! (or the last province) annexes the whole country.

use rand_chacha::ChaCha8Rng;

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, ProvinceId, Turn};
use crate::engine::dissolve_pacts_of;
use crate::events::{EventLog, EventPayload};
use crate::formulas::combat::{resolve_battle, resolve_naval, BattleInput};
use crate::model::game::TurnPhase;
use crate::model::war::WarCause;
use crate::model::world::WorldModel;

const NAVAL_RAID_MONEY_DAMAGE: i64 = 20;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    // Blockades come into force before any shooting starts, so they
    // modify this turn's battles and income.
    for (country, action) in decls {
        if let Action::NavalBlockade { target } = action {
            if !world.is_alive(country) || !world.is_alive(target) || target == country {
                continue;
            }
            if world.country(country)?.fleet < config.blockade_min_fleet {
                continue;
            }
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::BlockadeImposed {
                    blockader: country.clone(),
                    target: target.clone(),
                    turn,
                },
            )?;
        }
    }

    for (country, action) in decls {
        if let Action::NavalAttack { target } = action {
            if !world.is_alive(country) || !world.is_alive(target) || target == country {
                continue;
            }
            let (attacker_fleet, attacker_tech) = {
                let c = world.country(country)?;
                (c.fleet, c.tech)
            };
            if attacker_fleet == 0 {
                continue;
            }
            declare_war(world, log, turn, country, target, WarCause::Attack)?;
            let (defender_fleet, defender_tech) = {
                let t = world.country(target)?;
                (t.fleet, t.tech)
            };
            let outcome = resolve_naval(
                config,
                attacker_fleet,
                attacker_tech,
                defender_fleet,
                defender_tech,
                rng,
            );
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::NavalBattle {
                    attacker: country.clone(),
                    defender: target.clone(),
                    attacker_won: outcome.attacker_won,
                    attacker_fleet_losses: outcome.attacker_fleet_losses,
                    defender_fleet_losses: outcome.defender_fleet_losses,
                    money_damage: if outcome.attacker_won { NAVAL_RAID_MONEY_DAMAGE } else { 0 },
                },
            )?;
        }
    }

    for (country, action) in decls {
        if let Action::Attack { target } = action {
            resolve_land_attack(world, log, turn, decls, config, rng, country, target)?;
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn resolve_land_attack(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
    rng: &mut ChaCha8Rng,
    attacker: &CountryId,
    defender: &CountryId,
) -> Result<()> {
    // Re-checked per attack: an earlier attacker may have eliminated
    // either party this very step.
    if !world.is_alive(attacker) || !world.is_alive(defender) || attacker == defender {
        return Ok(());
    }
    let attacker_military = world.country(attacker)?.military;
    if attacker_military < 1 {
        return Ok(());
    }

    declare_war(world, log, turn, attacker, defender, WarCause::Attack)?;

    let Some(objective) = pick_objective(world, attacker, defender) else {
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::AttackUnreachable {
                attacker: attacker.clone(),
                defender: defender.clone(),
            },
        )?;
        return Ok(());
    };

    let committed = ((attacker_military as f64 * config.attack_commitment) as i64).max(1);
    let defender_posture = decls
        .iter()
        .any(|(c, a)| c == defender && matches!(a, Action::Defend));
    let blockaded = world.blockades_against(defender, turn) > 0;
    let input = {
        let province = world.province(&objective)?;
        BattleInput {
            attacker_troops: committed,
            attacker_tech: world.country(attacker)?.tech,
            defender_troops: province.troops_stationed,
            defender_tech: world.country(defender)?.tech,
            terrain: province.terrain,
            defender_posture,
            province_supplied: province.supplied,
            defender_blockaded: blockaded,
        }
    };
    let outcome = resolve_battle(config, &input, rng);

    if outcome.attacker_wins {
        let occupying = (committed - outcome.attacker_losses).max(1);
        let was_capital = world.province(&objective)?.is_capital;
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::ProvinceCaptured {
                province: objective.clone(),
                from: defender.clone(),
                to: attacker.clone(),
                attacker_losses: outcome.attacker_losses,
                defender_losses: outcome.defender_losses,
                occupying_troops: occupying,
            },
        )?;
        if was_capital || world.territory(defender) == 0 {
            annex(world, log, turn, attacker, defender)?;
        }
    } else {
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::AttackRepelled {
                attacker: attacker.clone(),
                defender: defender.clone(),
                province: objective,
                attacker_losses: outcome.attacker_losses,
                defender_losses: outcome.defender_losses,
            },
        )?;
    }
    Ok(())
}

/// Richest frontline province; map order breaks GDP ties.
fn pick_objective(
    world: &WorldModel,
    attacker: &CountryId,
    defender: &CountryId,
) -> Option<ProvinceId> {
    let mut best: Option<(ProvinceId, i64)> = None;
    for id in world.frontline_provinces(attacker, defender) {
        let gdp = world.province(&id).map(|p| p.gdp_value).unwrap_or(0);
        match &best {
            Some((_, best_gdp)) if *best_gdp >= gdp => {}
            _ => best = Some((id, gdp)),
        }
    }
    best.map(|(id, _)| id)
}

fn declare_war(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    attacker: &CountryId,
    defender: &CountryId,
    cause: WarCause,
) -> Result<()> {
    if world.has_active_war(attacker, defender) {
        return Ok(());
    }
    let war = world.next_war_id();
    log.record(
        world,
        turn,
        TurnPhase::Resolution,
        EventPayload::WarDeclared {
            war,
            attacker: attacker.clone(),
            defender: defender.clone(),
            cause,
            turn,
        },
    )?;
    Ok(())
}

/// Conquest elimination: the conqueror takes every remaining province
/// and absorbs half the victim's residual forces and treasury.
fn annex(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    conqueror: &CountryId,
    annexed: &CountryId,
) -> Result<()> {
    let (troops, money) = {
        let victim = world.country(annexed)?;
        (victim.military / 2, victim.money / 2)
    };
    let provinces = world.territory(annexed);
    log.record(
        world,
        turn,
        TurnPhase::Resolution,
        EventPayload::Annexation {
            conqueror: conqueror.clone(),
            annexed: annexed.clone(),
            provinces_transferred: provinces,
            troops_absorbed: troops,
            money_absorbed: money,
        },
    )?;
    dissolve_pacts_of(world, log, turn, annexed)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::default_map;
    use rand::SeedableRng;

    fn setup() -> (WorldModel, EventLog, ChaCha8Rng) {
        (
            WorldModel::from_map(&default_map()).unwrap(),
            EventLog::new(),
            ChaCha8Rng::seed_from_u64(5),
        )
    }

    fn ids() -> (CountryId, CountryId) {
        (CountryId::new("arlen"), CountryId::new("bryce"))
    }

    fn deterministic() -> GameConfig {
        GameConfig { combat_variance: 0.0, ..GameConfig::default() }
    }

    #[test]
    fn test_attack_declares_war_and_hits_frontline() {
        let (mut world, mut log, mut rng) = setup();
        let (arlen, bryce) = ids();
        world.country_mut(&arlen).unwrap().military = 100;
        let decls = vec![(arlen.clone(), Action::Attack { target: bryce.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();

        assert!(world.has_active_war(&arlen, &bryce));
        let captured = log.events().iter().find_map(|e| match &e.payload {
            EventPayload::ProvinceCaptured { province, .. } => Some(province.clone()),
            _ => None,
        });
        // Only the march borders Arlen; the capital is out of reach.
        assert_eq!(captured, Some(ProvinceId::new("bryce-march")));
    }

    #[test]
    fn test_attack_without_adjacency_is_unreachable() {
        let (mut world, mut log, mut rng) = setup();
        let arlen = CountryId::new("arlen");
        let doran = CountryId::new("doran"); // across the ring
        let decls = vec![(arlen.clone(), Action::Attack { target: doran.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();
        assert!(log.events().iter().any(|e| matches!(
            &e.payload,
            EventPayload::AttackUnreachable { attacker, defender }
                if attacker == &arlen && defender == &doran
        )));
    }

    #[test]
    fn test_sequential_attackers_see_updated_state() {
        let (mut world, mut log, mut rng) = setup();
        let bryce = CountryId::new("bryce");
        let arlen = CountryId::new("arlen");
        let cresta = CountryId::new("cresta");
        world.country_mut(&arlen).unwrap().military = 200;
        world.country_mut(&cresta).unwrap().military = 200;
        // Submission order: Arlen first, then Cresta.
        let decls = vec![
            (arlen.clone(), Action::Attack { target: bryce.clone() }),
            (cresta.clone(), Action::Attack { target: bryce.clone() }),
        ];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();

        let captures: Vec<(CountryId, ProvinceId)> = log
            .events()
            .iter()
            .filter_map(|e| match &e.payload {
                EventPayload::ProvinceCaptured { to, province, .. } => {
                    Some((to.clone(), province.clone()))
                }
                _ => None,
            })
            .collect();
        // Arlen took the shared frontline province first; by the time
        // Cresta's order resolves, Bryce no longer borders Cresta.
        assert_eq!(captures, vec![(arlen, ProvinceId::new("bryce-march"))]);
        assert!(log.events().iter().any(|e| matches!(
            &e.payload,
            EventPayload::AttackUnreachable { attacker, .. } if attacker == &cresta
        )));
    }

    #[test]
    fn test_capital_capture_annexes() {
        let (mut world, mut log, mut rng) = setup();
        let (arlen, bryce) = ids();
        world.country_mut(&arlen).unwrap().military = 500;
        // Put Arlen on the capital's doorstep.
        world.province_mut(&ProvinceId::new("bryce-core")).unwrap().owner = arlen.clone();
        world.province_mut(&ProvinceId::new("bryce-march")).unwrap().owner = arlen.clone();
        let decls = vec![(arlen.clone(), Action::Attack { target: bryce.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();

        let b = world.country(&bryce).unwrap();
        assert!(b.is_eliminated);
        assert_eq!(b.annexed_by, Some(arlen.clone()));
        assert_eq!(world.territory(&bryce), 0);
    }

    #[test]
    fn test_attacker_against_eliminated_target_skips() {
        let (mut world, mut log, mut rng) = setup();
        let (arlen, bryce) = ids();
        let cresta = CountryId::new("cresta");
        world.country_mut(&arlen).unwrap().military = 500;
        world.province_mut(&ProvinceId::new("bryce-core")).unwrap().owner = arlen.clone();
        world.province_mut(&ProvinceId::new("bryce-march")).unwrap().owner = arlen.clone();
        let decls = vec![
            (arlen.clone(), Action::Attack { target: bryce.clone() }),
            (cresta.clone(), Action::Attack { target: bryce.clone() }),
        ];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();

        // Cresta's attack found nobody to fight: no event names it.
        assert!(world.country(&bryce).unwrap().is_eliminated);
        assert!(!log.events().iter().any(|e| matches!(
            &e.payload,
            EventPayload::WarDeclared { attacker, .. } if attacker == &cresta
        )));
    }

    #[test]
    fn test_blockade_requires_fleet() {
        let (mut world, mut log, mut rng) = setup();
        let (arlen, bryce) = ids();
        world.country_mut(&arlen).unwrap().fleet = 1; // below the minimum
        let decls = vec![(arlen.clone(), Action::NavalBlockade { target: bryce.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();
        assert_eq!(world.blockades_against(&bryce, 1), 0);
    }

    #[test]
    fn test_naval_attack_opens_war() {
        let (mut world, mut log, mut rng) = setup();
        let (arlen, bryce) = ids();
        let decls = vec![(arlen.clone(), Action::NavalAttack { target: bryce.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &deterministic(), &mut rng).unwrap();
        assert!(world.has_active_war(&arlen, &bryce));
        assert!(log
            .events()
            .iter()
            .any(|e| matches!(&e.payload, EventPayload::NavalBattle { .. })));
    }
}
