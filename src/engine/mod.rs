//! Resolution Engine: the fixed-order turn pass
//!
//! Invoked exactly once per turn with the accepted declarations in
//! submission order. Countries without a declaration get the configured
//! fallback; a country eliminated mid-pass is excluded from every later
//! step because each resolver re-checks liveness against current state.

pub mod combat;
pub mod diplomacy;
pub mod economy;
pub mod espionage;
pub mod political;
pub mod supply;
pub mod ultimatum;
pub mod union;
pub mod win;
pub mod world_events;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, info};

use crate::actions::Action;
use crate::core::config::{FallbackKind, GameConfig};
use crate::core::error::Result;
use crate::core::types::{CountryId, Turn};
use crate::events::{DissolveReason, EventLog, EventPayload};
use crate::model::game::{Game, TurnPhase};
use crate::model::world::WorldModel;

/// Derive the per-turn RNG seed from the game seed. Recorded in the
/// `ResolutionStarted` event so any turn can be re-rolled offline.
pub fn turn_seed(game_seed: u64, turn: Turn) -> u64 {
    game_seed.wrapping_add((turn as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Run one complete resolution pass over the world.
///
/// `declarations` arrive in submission order and drive the sequential
/// parts of the pass (multi-attacker combat in particular).
pub fn resolve_turn(
    game: &mut Game,
    world: &mut WorldModel,
    log: &mut EventLog,
    declarations: Vec<(CountryId, Action)>,
    config: &GameConfig,
) -> Result<()> {
    let turn = game.turn;
    let seed = turn_seed(game.seed, turn);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    info!(game = %game.id, turn, seed, "resolution pass starting");

    log.record(
        world,
        turn,
        TurnPhase::Resolution,
        EventPayload::ResolutionStarted { turn, seed },
    )?;

    // A country that somehow starts the pass with no territory is dead
    // on arrival: eliminated before any step can act for it.
    for country in world.alive_countries() {
        if world.territory(&country) == 0 {
            debug!(%country, "zero territory at pass start, collapsing");
            political::collapse(world, log, turn, &country)?;
        }
    }

    let decls = effective_declarations(world, declarations, config, turn)?;

    diplomacy::resolve(world, log, turn, &decls, config)?;
    espionage::resolve(world, log, turn, &decls, config, &mut rng)?;
    combat::resolve(world, log, turn, &decls, config, &mut rng)?;
    supply::resolve(world, log, turn, config, &mut rng)?;
    economy::resolve(world, log, turn, &decls, config)?;
    political::resolve(world, log, turn, config)?;
    ultimatum::resolve(world, log, turn, &decls, config)?;
    union::resolve(world, log, turn, config)?;

    let ended = win::resolve(game, world, log, config)?;
    if !ended {
        world_events::resolve(world, log, turn, config, &mut rng)?;
    }

    update_tension(game, world, log, turn, &decls)?;

    if let Err(violation) = world.check_invariants(game.id) {
        error!(game = %game.id, turn, %violation, "consistency check failed, pausing game");
        game.faulted = true;
        return Err(violation);
    }

    info!(game = %game.id, turn, events = log.len(), ended, "resolution pass complete");
    Ok(())
}

/// One declaration per living country: submitted ones first (submission
/// order preserved), fallbacks appended in roster order, forced-neutral
/// overrides applied last.
fn effective_declarations(
    world: &WorldModel,
    submitted: Vec<(CountryId, Action)>,
    config: &GameConfig,
    turn: Turn,
) -> Result<Vec<(CountryId, Action)>> {
    let mut decls: Vec<(CountryId, Action)> = Vec::new();
    for (country, action) in submitted {
        if world.is_alive(&country) && !decls.iter().any(|(c, _)| c == &country) {
            decls.push((country, action));
        }
    }
    let fallback = match config.fallback_action {
        FallbackKind::Defend => Action::Defend,
        FallbackKind::Neutral => Action::Neutral,
    };
    for country in world.alive_countries() {
        if !decls.iter().any(|(c, _)| c == &country) {
            decls.push((country, fallback.clone()));
        }
    }
    for (country, action) in &mut decls {
        if world.country(country)?.forced_neutral_turn == Some(turn) {
            *action = Action::Neutral;
        }
    }
    Ok(decls)
}

/// Dissolve every active pact an eliminated country belonged to.
pub(crate) fn dissolve_pacts_of(
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    country: &CountryId,
) -> Result<()> {
    let affected: Vec<crate::core::types::PactId> = world
        .pacts
        .iter()
        .filter(|p| p.is_active() && p.has_member(country))
        .map(|p| p.id)
        .collect();
    for pact in affected {
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
    }
    Ok(())
}

/// World tension moves with the turn's aggression and cooperation.
fn update_tension(
    game: &mut Game,
    world: &mut WorldModel,
    log: &mut EventLog,
    turn: Turn,
    decls: &[(CountryId, Action)],
) -> Result<()> {
    let mut delta = 0;
    for (_, action) in decls {
        delta += match action {
            Action::Attack { .. } => 5,
            Action::Betray { .. } => 8,
            Action::NavalAttack { .. } => 4,
            Action::SendUltimatum { .. } => 4,
            Action::NavalBlockade { .. } => 3,
            Action::Neutral => -1,
            _ => 0,
        };
    }
    for event in log.events_for_turn(turn) {
        delta += match &event.payload {
            EventPayload::AllianceFormed { .. } => -3,
            EventPayload::UnionFormed { .. } => -5,
            _ => 0,
        };
    }
    if delta == 0 {
        return Ok(());
    }
    game.adjust_tension(delta);
    log.record(
        world,
        turn,
        TurnPhase::Resolution,
        EventPayload::TensionChanged { delta, value: game.world_tension },
    )?;
    Ok(())
}
