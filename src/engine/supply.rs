//! Supply step: capital connectivity, unsupplied marking, revolts

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::types::{ProvinceId, Turn};
use crate::events::{EventLog, EventPayload, RevoltCause};
use crate::model::game::TurnPhase;
use crate::model::world::WorldModel;

pub fn resolve(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    config: &GameConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    for country in world.alive_countries() {
        let connected = world.supplied_provinces(&country);
        let owned: Vec<ProvinceId> =
            world.provinces_of(&country).iter().map(|p| p.id.clone()).collect();
        let unsupplied: Vec<ProvinceId> = owned
            .iter()
            .filter(|id| !connected.contains(*id))
            .cloned()
            .collect();

        // Skip the event when nothing changed: everything connected and
        // already marked supplied.
        let all_marked_supplied = owned
            .iter()
            .all(|id| world.province(id).map(|p| p.supplied).unwrap_or(false));
        if unsupplied.is_empty() && all_marked_supplied {
            continue;
        }

        log.record(
            world,
            turn,
            TurnPhase::Resolution,
            EventPayload::SupplyStatus { country: country.clone(), unsupplied: unsupplied.clone() },
        )?;

        for province in unsupplied {
            let original_owner = world.province(&province)?.original_owner.clone();
            if original_owner == country || !world.is_alive(&original_owner) {
                continue;
            }
            if rng.gen::<f64>() < config.supply_revolt_chance {
                log.record(
                    world,
                    turn,
                    TurnPhase::Resolution,
                    EventPayload::ProvinceRevolted {
                        province,
                        from: country.clone(),
                        to: original_owner,
                        cause: RevoltCause::SupplyCut,
                        stability_penalty: 1,
                    },
                )?;
            }
        }
    }
    Ok(())
}
