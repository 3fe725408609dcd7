//! Event-log replay: fold the log over a fresh world
//!
//! Events carry concrete outcomes, so replay needs no RNG and no engine;
//! applying the payloads in sequence reproduces the final country,
//! province, and diplomatic state exactly.

use crate::core::error::Result;
use crate::events::{apply_event, GameEvent};
use crate::model::map::MapSpec;
use crate::model::world::WorldModel;

pub fn replay(map: &MapSpec, events: &[GameEvent]) -> Result<WorldModel> {
    let mut world = WorldModel::from_map(map)?;
    for event in events {
        apply_event(&mut world, &event.payload)?;
    }
    Ok(world)
}
