//! Economy step: investments, passive income, upkeep, desertions

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{EventLog, EventPayload};
use crate::formulas::economy::{desertions, income, maintenance, recruit_cost};
use crate::model::game::TurnPhase;
use crate::model::world::WorldModel;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
    config: &GameConfig,
) -> Result<()> {
    // Investments land before income so a recruitment order drains the
    // treasury the same turn it is paid for.
    for (country, action) in decls {
        if !world.is_alive(country) {
            continue;
        }
        match action {
            Action::InvestMilitary => {
                let (money, tech) = {
                    let c = world.country(country)?;
                    (c.money, c.tech)
                };
                let cost = recruit_cost(config, config.recruit_batch, tech);
                if money >= cost {
                    log.record(
                        world,
                        turn,
                        TurnPhase::Resolution,
                        EventPayload::TroopsRecruited {
                            country: country.clone(),
                            troops: config.recruit_batch,
                            cost,
                        },
                    )?;
                }
            }
            Action::InvestStability => {
                if world.country(country)?.money >= config.stability_invest_cost {
                    log.record(
                        world,
                        turn,
                        TurnPhase::Resolution,
                        EventPayload::StabilityInvested {
                            country: country.clone(),
                            cost: config.stability_invest_cost,
                            stability_delta: 1,
                        },
                    )?;
                }
            }
            _ => {}
        }
    }

    for country in world.alive_countries() {
        let (supplied_gdp, unsupplied_gdp) = world
            .provinces_of(&country)
            .iter()
            .fold((0, 0), |(s, u), p| {
                if p.supplied {
                    (s + p.gdp_value, u)
                } else {
                    (s, u + p.gdp_value)
                }
            });
        let (military, tech, treasury) = {
            let c = world.country(&country)?;
            (c.military, c.tech, c.money)
        };
        let blockades = world.blockades_against(&country, turn);
        let revenue = income(config, supplied_gdp, unsupplied_gdp, tech, blockades);
        let upkeep = maintenance(config, military, tech);
        let net = revenue - upkeep;
        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::IncomeCollected {
                country: country.clone(),
                income: revenue,
                maintenance: upkeep,
                net,
            },
        )?;
        // Treasury could not cover upkeep: part of the army walks.
        if treasury + net < 0 && military > 0 {
            log.record(
                world,
                turn,
                TurnPhase::Resolution,
                EventPayload::Desertion {
                    country: country.clone(),
                    troops_lost: desertions(config, military),
                },
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

    #[test]
    fn test_income_collected_for_everyone() {
        let (mut world, mut log) = setup();
        resolve(&mut world, &mut log, 1, &[], &GameConfig::default()).unwrap();
        let incomes = log
            .events()
            .iter()
            .filter(|e| matches!(&e.payload, EventPayload::IncomeCollected { .. }))
            .count();
        assert_eq!(incomes, 6);
    }

    #[test]
    fn test_recruitment_needs_funds() {
        let (mut world, mut log) = setup();
        let arlen = CountryId::new("arlen");
        world.country_mut(&arlen).unwrap().money = 0;
        let decls = vec![(arlen.clone(), Action::InvestMilitary)];
        resolve(&mut world, &mut log, 1, &decls, &GameConfig::default()).unwrap();
        assert!(!log
            .events()
            .iter()
            .any(|e| matches!(&e.payload, EventPayload::TroopsRecruited { .. })));
        assert_eq!(world.country(&arlen).unwrap().military, 10);
    }

    #[test]
    fn test_recruitment_adds_troops_and_charges() {
        let (mut world, mut log) = setup();
        let config = GameConfig::default();
        let arlen = CountryId::new("arlen");
        let before = world.country(&arlen).unwrap().money;
        let decls = vec![(arlen.clone(), Action::InvestMilitary)];
        resolve(&mut world, &mut log, 1, &decls, &config).unwrap();
        let after = world.country(&arlen).unwrap().clone();
        assert_eq!(after.military, 10 + config.recruit_batch);
        // Treasury took the recruit cost, then this turn's net income.
        let cost = recruit_cost(&config, config.recruit_batch, after.tech);
        let net = log
            .events()
            .iter()
            .find_map(|e| match &e.payload {
                EventPayload::IncomeCollected { country, net, .. } if country == &arlen => {
                    Some(*net)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(after.money, ((before - cost).max(0) + net).max(0));
    }

    #[test]
    fn test_broke_army_deserts() {
        let (mut world, mut log) = setup();
        let arlen = CountryId::new("arlen");
        {
            let c = world.country_mut(&arlen).unwrap();
            c.money = 0;
            c.military = 100; // upkeep far beyond income
        }
        resolve(&mut world, &mut log, 1, &[], &GameConfig::default()).unwrap();
        assert!(world.country(&arlen).unwrap().military < 100);
        assert!(log
            .events()
            .iter()
            .any(|e| matches!(&e.payload, EventPayload::Desertion { country, .. }
                if country == &arlen)));
    }
}
