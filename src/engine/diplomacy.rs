//! Diplomacy step: alliances, betrayals, neutral posture

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{DissolveReason, EventLog, EventPayload, StabilityCause};
use crate::model::game::TurnPhase;
use crate::model::pact::palette_color;
use crate::model::war::WarCause;
use crate::model::world::WorldModel;

/// Military damage a betrayal inflicts, as a share of the betrayer's army
const BETRAYAL_DAMAGE_SHARE: f64 = 0.3;
const BETRAYAL_STABILITY_PENALTY: i32 = 2;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    _config: &GameConfig,
) -> Result<()> {
    for (country, action) in decls {
        if !world.is_alive(country) {
            continue;
        }
        match action {
            Action::Ally { target } => {
                if !world.is_alive(target) || target == country {
                    continue;
                }
                if !world.active_pacts_between(country, target).is_empty() {
                    continue;
                }
                let reciprocated = decls.iter().any(|(c, a)| {
                    c == target && matches!(a, Action::Ally { target: t } if t == country)
                });
                if reciprocated {
                    // Each pair forms once; the lexicographically first
                    // member carries the formation.
                    if country < target {
                        let pact = world.next_pact_id();
                        let (name, abbreviation) = pact_identity(world, country, target)?;
                        log.record(
                            world,
                            turn,
                            TurnPhase::Resolution,
                            EventPayload::AllianceFormed {
                                pact,
                                name,
                                abbreviation,
                                color: palette_color(pact).into(),
                                members: vec![country.clone(), target.clone()],
                                turn,
                            },
                        )?;
                    }
                } else {
                    log.record(
                        world,
                        turn,
                        TurnPhase::Resolution,
                        EventPayload::AllyRejected { from: country.clone(), to: target.clone() },
                    )?;
                }
            }
            Action::Betray { target } => {
                if !world.is_alive(target) || target == country {
                    continue;
                }
                let pacts = world.active_pacts_between(country, target);
                if pacts.is_empty() {
                    // Nothing to betray; open aggression belongs to `attack`.
                    continue;
                }
                for pact in pacts {
                    log.record(
                        world,
                        turn,
                        TurnPhase::Resolution,
                        EventPayload::PactDissolved {
                            pact,
                            turn,
                            reason: DissolveReason::Betrayal,
                        },
                    )?;
                }
                let damage = ((world.country(country)?.military as f64
                    * BETRAYAL_DAMAGE_SHARE)
                    .ceil()) as i64;
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::Betrayal {
                        betrayer: country.clone(),
                        victim: target.clone(),
                        victim_military_loss: damage,
                        betrayer_stability_penalty: BETRAYAL_STABILITY_PENALTY,
                    },
                )?;
                if !world.has_active_war(country, target) {
                    let war = world.next_war_id();
                    log.record(
                        world,
                        turn,
                        TurnPhase::Resolution,
                        EventPayload::WarDeclared {
                            war,
                            attacker: country.clone(),
                            defender: target.clone(),
                            cause: WarCause::Betrayal,
                            turn,
                        },
                    )?;
                }
            }
            Action::Neutral => {
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::StabilityChanged {
                        country: country.clone(),
                        delta: 1,
                        cause: StabilityCause::NeutralPosture,
                    },
                )?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn pact_identity(
    world: &WorldModel,
    a: &CountryId,
    b: &CountryId,
) -> Result<(String, String)> {
    let a_name = world.country(a)?.name.clone();
    let b_name = world.country(b)?.name.clone();
    let abbreviation = format!(
        "{}{}",
        a_name.chars().next().unwrap_or('?'),
        b_name.chars().next().unwrap_or('?')
    )
    .to_uppercase();
    Ok((format!("Accord of {a_name} and {b_name}"), abbreviation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::map::default_map;
    use crate::model::pact::PactKind;

    fn setup() -> (WorldModel, EventLog) {
        (WorldModel::from_map(&default_map()).unwrap(), EventLog::new())
    }

    fn ids() -> (CountryId, CountryId) {
        (CountryId::new("arlen"), CountryId::new("bryce"))
    }

    #[test]
    fn test_mutual_ally_forms_one_pact() {
        let (mut world, mut log) = setup();
        let (arlen, bryce) = ids();
        let decls = vec![
            (arlen.clone(), Action::Ally { target: bryce.clone() }),
            (bryce.clone(), Action::Ally { target: arlen.clone() }),
        ];
        resolve(&mut world, &mut log, 1, &decls, &GameConfig::default()).unwrap();
        assert_eq!(world.pacts.len(), 1);
        assert_eq!(world.pacts[0].kind, PactKind::Alliance);
        assert!(world.pacts[0].binds(&arlen, &bryce));
    }

    #[test]
    fn test_unreciprocated_ally_rejected() {
        let (mut world, mut log) = setup();
        let (arlen, bryce) = ids();
        let decls = vec![
            (arlen.clone(), Action::Ally { target: bryce.clone() }),
            (bryce.clone(), Action::Defend),
        ];
        resolve(&mut world, &mut log, 1, &decls, &GameConfig::default()).unwrap();
        assert!(world.pacts.is_empty());
        assert!(log
            .events()
            .iter()
            .any(|e| matches!(&e.payload, EventPayload::AllyRejected { from, to }
                if from == &arlen && to == &bryce)));
    }

    #[test]
    fn test_betrayal_dissolves_pact_and_opens_war() {
        let (mut world, mut log) = setup();
        let (arlen, bryce) = ids();
        let ally = vec![
            (arlen.clone(), Action::Ally { target: bryce.clone() }),
            (bryce.clone(), Action::Ally { target: arlen.clone() }),
        ];
        resolve(&mut world, &mut log, 1, &ally, &GameConfig::default()).unwrap();

        let betray = vec![(arlen.clone(), Action::Betray { target: bryce.clone() })];
        resolve(&mut world, &mut log, 2, &betray, &GameConfig::default()).unwrap();

        assert!(world.active_pacts_between(&arlen, &bryce).is_empty());
        assert!(world.has_active_war(&arlen, &bryce));
        // Victim took military damage; betrayer paid in stability.
        assert!(world.country(&bryce).unwrap().military < 10);
        assert_eq!(world.country(&arlen).unwrap().stability, 3);
    }

    #[test]
    fn test_betray_without_pact_is_noop() {
        let (mut world, mut log) = setup();
        let (arlen, bryce) = ids();
        let decls = vec![(arlen.clone(), Action::Betray { target: bryce.clone() })];
        resolve(&mut world, &mut log, 1, &decls, &GameConfig::default()).unwrap();
        assert!(log.is_empty());
        assert!(!world.has_active_war(&arlen, &bryce));
    }

    #[test]
    fn test_neutral_gains_stability() {
        let (mut world, mut log) = setup();
        let (arlen, _) = ids();
        let decls = vec![(arlen.clone(), Action::Neutral)];
        resolve(&mut world, &mut log, 1, &decls, &GameConfig::default()).unwrap();
        assert_eq!(world.country(&arlen).unwrap().stability, 6);
    }
}
