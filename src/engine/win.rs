//! Win-conditions step: last standing, domination, turn-limit ranking

use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::CountryId;
use crate::events::{EventLog, EventPayload};
use crate::model::game::{Game, GameStatus, TurnPhase, WinReason};
use crate::model::world::WorldModel;

/// Returns true when the game ended this turn.
pub fn resolve(
    game: &mut Game,
    world: &mut WorldModel,
    log: &mut EventLog,
    config: &GameConfig,
) -> Result<bool> {
    let turn = game.turn;
    let alive = world.alive_countries();

    let decided: Option<(Option<CountryId>, WinReason)> = if alive.len() <= 1 {
        Some((alive.first().cloned(), WinReason::LastStanding))
    } else if let Some(dominator) = find_dominator(world, config, &alive) {
        Some((Some(dominator), WinReason::Domination))
    } else if turn >= config.max_turns {
        Some((rank_leader(world, &alive), WinReason::TurnLimit))
    } else {
        None
    };

    let Some((winner, reason)) = decided else {
        return Ok(false);
    };

    game.status = GameStatus::Ended;
    game.deadline_unix_ms = None;
    game.winner = winner.clone();
    game.win_reason = Some(reason.clone());
    log.record(
        world,
        turn,
        TurnPhase::Resolution,
        EventPayload::GameEnded { winner, reason },
    )?;
    Ok(true)
}

/// First country (roster order) owning at least the domination share
fn find_dominator(
    world: &WorldModel,
    config: &GameConfig,
    alive: &[CountryId],
) -> Option<CountryId> {
    let total = world.total_provinces();
    if total == 0 {
        return None;
    }
    alive
        .iter()
        .find(|c| world.territory(c) as f64 / total as f64 >= config.domination_share)
        .cloned()
}

/// Turn-limit ranking: territory, then treasury, then roster order
fn rank_leader(world: &WorldModel, alive: &[CountryId]) -> Option<CountryId> {
    let mut best: Option<(CountryId, (usize, i64))> = None;
    for country in alive {
        let key = (
            world.territory(country),
            world.country(country).map(|c| c.money).unwrap_or(0),
        );
        // Strictly greater keeps the earliest roster entry on ties.
        if best.as_ref().map(|(_, k)| key > *k).unwrap_or(true) {
            best = Some((country.clone(), key));
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GameId;
    use crate::model::map::default_map;

    fn setup(turn: u32) -> (Game, WorldModel, EventLog) {
        let mut game = Game::new(GameId::new(), 3);
        game.status = GameStatus::Active;
        game.turn = turn;
        (game, WorldModel::from_map(&default_map()).unwrap(), EventLog::new())
    }

    fn eliminate(world: &mut WorldModel, id: &str, conqueror: &str) {
        let victim = CountryId::new(id);
        let heir = CountryId::new(conqueror);
        let owned: Vec<_> = world.provinces_of(&victim).iter().map(|p| p.id.clone()).collect();
        for p in owned {
            world.province_mut(&p).unwrap().owner = heir.clone();
        }
        let c = world.country_mut(&victim).unwrap();
        c.is_eliminated = true;
        c.annexed_by = Some(heir);
    }

    #[test]
    fn test_no_winner_midgame() {
        let (mut game, mut world, mut log) = setup(3);
        let ended = resolve(&mut game, &mut world, &mut log, &GameConfig::default()).unwrap();
        assert!(!ended);
        assert_eq!(game.status, GameStatus::Active);
    }

    #[test]
    fn test_last_standing() {
        let (mut game, mut world, mut log) = setup(5);
        for id in ["bryce", "cresta", "doran", "elysia", "ferros"] {
            eliminate(&mut world, id, "arlen");
        }
        let ended = resolve(&mut game, &mut world, &mut log, &GameConfig::default()).unwrap();
        assert!(ended);
        assert_eq!(game.winner, Some(CountryId::new("arlen")));
        assert_eq!(game.win_reason, Some(WinReason::LastStanding));
    }

    #[test]
    fn test_domination_share() {
        let (mut game, mut world, mut log) = setup(5);
        // 6 of 18 provinces = 33% >= 30%.
        eliminate(&mut world, "bryce", "arlen");
        let ended = resolve(&mut game, &mut world, &mut log, &GameConfig::default()).unwrap();
        assert!(ended);
        assert_eq!(game.winner, Some(CountryId::new("arlen")));
        assert_eq!(game.win_reason, Some(WinReason::Domination));
    }

    #[test]
    fn test_turn_limit_ranks_by_territory_then_money() {
        let config = GameConfig::default();
        let (mut game, mut world, mut log) = setup(config.max_turns);
        world.country_mut(&CountryId::new("doran")).unwrap().money = 999;
        let ended = resolve(&mut game, &mut world, &mut log, &config).unwrap();
        assert!(ended);
        // Equal territory everywhere; treasury breaks the tie.
        assert_eq!(game.winner, Some(CountryId::new("doran")));
        assert_eq!(game.win_reason, Some(WinReason::TurnLimit));
    }
}
