//! Union step: eligibility and per-turn resource pooling
//!
//! Allied countries that are stable and advanced enough merge into a
//! Union pact. Members keep sovereignty; each turn their money and
//! military drift a configured share toward the union average.

use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{DissolveReason, EventLog, EventPayload, PoolAdjustment};
use crate::model::game::TurnPhase;
use crate::model::pact::{palette_color, PactKind};
use crate::model::world::WorldModel;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
) -> Result<()> {
    form_unions(world, log, turn, config)?;
    pool_resources(world, log, turn, config)?;
    Ok(())
}

fn form_unions(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
) -> Result<()> {
    // Snapshot candidate alliances first; formation mutates the pact list.
    let alliances: Vec<(String, Vec<CountryId>)> = world
        .pacts
        .iter()
        .filter(|p| p.kind == PactKind::Alliance && p.is_active())
        .map(|p| (p.name.clone(), p.members.clone()))
        .collect();

    for (name, members) in alliances {
        let eligible: Vec<CountryId> = members
            .into_iter()
            .filter(|m| {
                world
                    .country(m)
                    .map(|c| {
                        c.is_alive()
                            && c.stability >= config.union_stability_threshold
                            && c.tech >= config.union_tech_threshold
                            && world.union_of(m).is_none()
                    })
                    .unwrap_or(false)
            })
            .collect();
        if eligible.len() < 2 {
            continue;
        }
        let pact = world.next_pact_id();
        let abbreviation: String = eligible
            .iter()
            .filter_map(|c| c.as_str().chars().next())
            .collect::<String>()
            .to_uppercase();
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::UnionFormed {
                pact,
                name: format!("{name} Union"),
                abbreviation,
                color: palette_color(pact).into(),
                members: eligible,
                turn,
            },
        )?;
    }
    Ok(())
}

fn pool_resources(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
) -> Result<()> {
    let unions: Vec<(crate::core::types::PactId, Vec<CountryId>)> = world
        .pacts
        .iter()
        .filter(|p| p.kind == PactKind::Union && p.is_active())
        .map(|p| (p.id, p.members.clone()))
        .collect();

    for (pact, members) in unions {
        let living: Vec<CountryId> =
            members.into_iter().filter(|m| world.is_alive(m)).collect();
        if living.len() < 2 {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::PactDissolved {
                    pact,
                    turn,
                    reason: DissolveReason::MemberEliminated,
                },
            )?;
            continue;
        }

        let n = living.len() as i64;
        let (total_money, total_military) = living.iter().try_fold((0, 0), |(m, t), id| {
            let c = world.country(id)?;
            Ok::<(i64, i64), crate::core::error::GameError>((m + c.money, t + c.military))
        })?;
        let avg_money = total_money / n;
        let avg_military = total_military / n;

        let mut adjustments = Vec::new();
        let mut money_balance = 0;
        let mut military_balance = 0;
        for id in &living {
            let c = world.country(id)?;
            let money_delta =
                ((avg_money - c.money) as f64 * config.union_pool_share) as i64;
            let military_delta =
                ((avg_military - c.military) as f64 * config.union_pool_share) as i64;
            money_balance += money_delta;
            military_balance += military_delta;
            adjustments.push(PoolAdjustment {
                country: id.clone(),
                money_delta,
                military_delta,
            });
        }
        // Rounding must not mint or destroy resources; the first member
        // absorbs the residue.
        if let Some(first) = adjustments.first_mut() {
            first.money_delta -= money_balance;
            first.military_delta -= military_balance;
        }
        if adjustments
            .iter()
            .any(|a| a.money_delta != 0 || a.military_delta != 0)
        {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::UnionPooled { pact, adjustments },
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::default_map;

    fn setup() -> (WorldModel, EventLog) {
        (WorldModel::from_map(&default_map()).unwrap(), EventLog::new())
    }

    fn ally(world: &mut WorldModel, log: &mut EventLog, a: &str, b: &str) {
        let pact = world.next_pact_id();
        log.record(
            world,
            1,
            TurnPhase::Resolution,
            EventPayload::AllianceFormed {
                pact,
                name: "Test Accord".into(),
                abbreviation: "TA".into(),
                color: palette_color(pact).into(),
                members: vec![CountryId::new(a), CountryId::new(b)],
                turn: 1,
            },
        )
        .unwrap();
    }

    fn qualify(world: &mut WorldModel, id: &str) {
        let c = world.country_mut(&CountryId::new(id)).unwrap();
        c.stability = 8;
        c.tech = 4;
    }

    #[test]
    fn test_qualified_allies_form_union() {
        let (mut world, mut log) = setup();
        ally(&mut world, &mut log, "arlen", "bryce");
        qualify(&mut world, "arlen");
        qualify(&mut world, "bryce");
        resolve(&mut world, &mut log, 2, &GameConfig::default()).unwrap();
        assert!(world.union_of(&CountryId::new("arlen")).is_some());
        assert!(world.union_of(&CountryId::new("bryce")).is_some());
    }

    #[test]
    fn test_unqualified_allies_stay_separate() {
        let (mut world, mut log) = setup();
        ally(&mut world, &mut log, "arlen", "bryce");
        qualify(&mut world, "arlen"); // bryce stays at default stability/tech
        resolve(&mut world, &mut log, 2, &GameConfig::default()).unwrap();
        assert!(world.union_of(&CountryId::new("arlen")).is_none());
    }

    #[test]
    fn test_union_membership_exclusive() {
        let (mut world, mut log) = setup();
        ally(&mut world, &mut log, "arlen", "bryce");
        ally(&mut world, &mut log, "arlen", "cresta");
        for id in ["arlen", "bryce", "cresta"] {
            qualify(&mut world, id);
        }
        resolve(&mut world, &mut log, 2, &GameConfig::default()).unwrap();
        // Arlen joined the first alliance's union; the second alliance
        // was left with one eligible member and formed nothing.
        let unions = world
            .pacts
            .iter()
            .filter(|p| p.kind == PactKind::Union && p.is_active())
            .count();
        assert_eq!(unions, 1);
    }

    #[test]
    fn test_pooling_conserves_totals() {
        let (mut world, mut log) = setup();
        ally(&mut world, &mut log, "arlen", "bryce");
        qualify(&mut world, "arlen");
        qualify(&mut world, "bryce");
        world.country_mut(&CountryId::new("arlen")).unwrap().money = 300;
        world.country_mut(&CountryId::new("bryce")).unwrap().money = 100;
        let before: i64 = ["arlen", "bryce"]
            .iter()
            .map(|id| world.country(&CountryId::new(*id)).unwrap().money)
            .sum();
        resolve(&mut world, &mut log, 2, &GameConfig::default()).unwrap();
        let arlen_money = world.country(&CountryId::new("arlen")).unwrap().money;
        let bryce_money = world.country(&CountryId::new("bryce")).unwrap().money;
        assert_eq!(arlen_money + bryce_money, before);
        // Gap narrowed by a quarter of the distance to the mean.
        assert_eq!(arlen_money, 275);
        assert_eq!(bryce_money, 125);
    }

    #[test]
    fn test_union_dissolves_when_member_dies() {
        let (mut world, mut log) = setup();
        ally(&mut world, &mut log, "arlen", "bryce");
        qualify(&mut world, "arlen");
        qualify(&mut world, "bryce");
        resolve(&mut world, &mut log, 2, &GameConfig::default()).unwrap();
        world.country_mut(&CountryId::new("bryce")).unwrap().is_eliminated = true;
        resolve(&mut world, &mut log, 3, &GameConfig::default()).unwrap();
        assert!(world.union_of(&CountryId::new("arlen")).is_none());
    }
}
