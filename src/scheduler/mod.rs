//! Turn Scheduler: phase state machine and the serialized decision point
//!
//! Each game's context lives behind one `tokio::sync::Mutex`. Submissions
//! are accepted concurrently, but the completion check and the phase
//! advance happen under the lock. Every scheduled wakeup (deadline or
//! grace delay) carries the phase epoch it was armed for; a bumped epoch
//! turns a stale timer into a no-op, so a turn can never resolve twice.

pub mod registry;

pub use registry::GameRegistry;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ahash::AHashMap;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::actions::Action;
use crate::core::config::GameConfig;
use crate::core::error::{GameError, Result};
use crate::core::types::{AgentId, CountryId};
use crate::engine;
use crate::events::{EventLog, EventPayload, GameEvent};
use crate::model::game::{Game, GameStatus, TurnPhase, WinReason};
use crate::model::submission::{Recipient, Submission, SubmissionPayload};
use crate::model::world::WorldModel;

/// Push channel depth; lagging spectators drop old events, never block
const PUSH_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct GameContext {
    pub game: Game,
    pub world: WorldModel,
    pub log: EventLog,
    pub config: GameConfig,
    submissions: AHashMap<CountryId, Submission>,
    /// First-submission order; replacements keep their slot position
    submission_order: Vec<CountryId>,
    /// Bumped on every phase change; stale wakeups compare and bail
    phase_epoch: u64,
    /// Set once all expected submissions are in and a grace wakeup is armed
    grace_armed: bool,
    push: broadcast::Sender<GameEvent>,
}

pub type SharedGame = Arc<Mutex<GameContext>>;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl GameContext {
    pub fn new(game: Game, world: WorldModel, config: GameConfig) -> Self {
        let (push, _) = broadcast::channel(PUSH_CAPACITY);
        Self {
            game,
            world,
            log: EventLog::new(),
            config,
            submissions: AHashMap::new(),
            submission_order: Vec::new(),
            phase_epoch: 0,
            grace_armed: false,
            push,
        }
    }

    /// Subscribe to the per-game push feed
    pub fn subscribe(&self) -> broadcast::Receiver<GameEvent> {
        self.push.subscribe()
    }

    /// Record one scheduler-level event and push it
    fn record(&mut self, payload: EventPayload) -> Result<()> {
        let event = self
            .log
            .record(&mut self.world, self.game.turn, self.game.phase, payload)?
            .clone();
        let _ = self.push.send(event);
        Ok(())
    }

    /// Push everything the engine appended during a pass
    fn push_since(&self, seq: u64) {
        for event in self.log.events_since(seq) {
            let _ = self.push.send(event.clone());
        }
    }

    /// Living countries whose submissions gate the phase advance
    fn expected_submitters(&self) -> Vec<CountryId> {
        self.world
            .countries_ordered()
            .filter(|c| c.is_alive() && c.owner.is_some())
            .map(|c| c.id.clone())
            .collect()
    }

    fn all_submitted(&self) -> bool {
        self.expected_submitters()
            .iter()
            .all(|c| self.submissions.contains_key(c))
    }

    fn joined_count(&self) -> usize {
        self.world
            .countries_ordered()
            .filter(|c| c.owner.is_some())
            .count()
    }

    fn phase_deadline_secs(&self) -> u64 {
        match self.game.phase {
            TurnPhase::Negotiation => self.config.negotiation_deadline_secs,
            TurnPhase::Declaration => self.config.declaration_deadline_secs,
            TurnPhase::Resolution => 0,
        }
    }
}

/// Join a lobby game, claiming an unowned country.
pub async fn join(ctx: &SharedGame, agent: AgentId, country: CountryId) -> Result<()> {
    let mut ctx = ctx.lock().await;
    if ctx.game.status != GameStatus::Lobby {
        return Err(GameError::NotInLobby(ctx.game.status));
    }
    if ctx.joined_count() >= ctx.config.max_players {
        return Err(GameError::GameFull);
    }
    {
        let claimed = ctx.world.country(&country)?;
        if claimed.owner.is_some() {
            return Err(GameError::CountryTaken(country));
        }
    }
    if ctx
        .world
        .countries_ordered()
        .any(|c| c.owner == Some(agent))
    {
        return Err(GameError::CountryTaken(country));
    }
    ctx.record(EventPayload::PlayerJoined { country: country.clone(), agent })?;
    info!(game = %ctx.game.id, %country, %agent, "player joined");
    Ok(())
}

/// Start a lobby game: lobby -> turn 1 negotiation.
pub async fn start(shared: &SharedGame) -> Result<()> {
    let mut ctx = shared.lock().await;
    if ctx.game.status != GameStatus::Lobby {
        return Err(GameError::NotInLobby(ctx.game.status));
    }
    let joined = ctx.joined_count();
    if joined < ctx.config.min_players {
        return Err(GameError::NotEnoughPlayers { have: joined, need: ctx.config.min_players });
    }
    ctx.game.status = GameStatus::Active;
    ctx.game.turn = 1;
    ctx.game.phase = TurnPhase::Negotiation;
    let tokens = ctx.config.starting_spy_tokens;
    ctx.record(EventPayload::GameStarted { starting_spy_tokens: tokens })?;
    open_phase_window(shared, &mut ctx, true)?;
    info!(game = %ctx.game.id, players = joined, "game started");
    Ok(())
}

/// Halt a game between phases. Never interrupts a resolution pass:
/// the pass runs under the same lock this function takes.
pub async fn end(ctx: &SharedGame) -> Result<()> {
    let mut ctx = ctx.lock().await;
    if ctx.game.status == GameStatus::Ended {
        return Ok(());
    }
    ctx.game.status = GameStatus::Ended;
    ctx.game.deadline_unix_ms = None;
    ctx.game.win_reason = Some(WinReason::AdminHalt);
    ctx.phase_epoch += 1;
    ctx.record(EventPayload::GameEnded { winner: None, reason: WinReason::AdminHalt })?;
    warn!(game = %ctx.game.id, "game halted by operator");
    Ok(())
}

/// Accept one submission for the agent's country.
///
/// Resubmission before the phase advances replaces the slot in place;
/// no duplicate events are ever emitted for it.
pub async fn submit(shared: &SharedGame, agent: AgentId, payload: SubmissionPayload) -> Result<()> {
    let mut ctx = shared.lock().await;
    if !ctx.game.is_active() {
        return Err(GameError::GameNotActive(ctx.game.status));
    }
    let country = ctx
        .world
        .countries_ordered()
        .find(|c| c.owner == Some(agent))
        .map(|c| c.id.clone())
        .ok_or(GameError::NotParticipant)?;
    if !ctx.world.is_alive(&country) {
        return Err(GameError::CountryEliminated(country));
    }
    if payload.phase() != ctx.game.phase {
        return Err(GameError::WrongPhase {
            submitted: payload.phase(),
            actual: ctx.game.phase,
        });
    }
    // Targets and recipients must at least exist; liveness is the
    // engine's concern.
    match &payload {
        SubmissionPayload::Declaration(declaration) => {
            if let Some(target) = declaration.action.target() {
                ctx.world.country(target)?;
                if target == &country {
                    return Err(GameError::MalformedAction(
                        "action cannot target its own country".into(),
                    ));
                }
            }
        }
        SubmissionPayload::Negotiation { messages } => {
            for message in messages {
                if let Recipient::Country { id } = &message.to {
                    ctx.world.country(id)?;
                }
            }
        }
    }

    let turn = ctx.game.turn;
    let is_new = !ctx.submissions.contains_key(&country);
    ctx.submissions.insert(
        country.clone(),
        Submission { country: country.clone(), turn, payload, submitted_at_ms: now_ms() },
    );
    if is_new {
        ctx.submission_order.push(country.clone());
    }
    debug!(game = %ctx.game.id, %country, turn, replaced = !is_new, "submission accepted");

    if ctx.all_submitted() && !ctx.grace_armed {
        if ctx.config.grace_delay_secs == 0 {
            advance_locked(shared, &mut ctx)?;
        } else {
            ctx.grace_armed = true;
            schedule_wakeup(
                shared.clone(),
                ctx.phase_epoch,
                Duration::from_secs(ctx.config.grace_delay_secs),
            );
        }
    }
    Ok(())
}

/// Arm an epoch-guarded wakeup that tries to advance the phase.
fn schedule_wakeup(shared: SharedGame, epoch: u64, after: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let mut ctx = shared.lock().await;
        if ctx.phase_epoch != epoch || !ctx.game.is_active() {
            return; // stale timer: the phase already moved on
        }
        if let Err(e) = advance_locked(&shared, &mut ctx) {
            error!(game = %ctx.game.id, error = %e, "phase advance failed");
        }
    });
}

/// Advance the phase. Caller holds the lock.
fn advance_locked(shared: &SharedGame, ctx: &mut GameContext) -> Result<()> {
    ctx.phase_epoch += 1;
    ctx.grace_armed = false;
    match ctx.game.phase {
        TurnPhase::Negotiation => {
            deliver_messages(ctx)?;
            ctx.submissions.clear();
            ctx.submission_order.clear();
            ctx.game.phase = TurnPhase::Declaration;
            open_phase_window(shared, ctx, false)?;
        }
        TurnPhase::Declaration => {
            let declarations = take_declarations(ctx);
            ctx.game.phase = TurnPhase::Resolution;
            ctx.game.deadline_unix_ms = None;
            ctx.record(EventPayload::PhaseChanged {
                turn: ctx.game.turn,
                phase: TurnPhase::Resolution,
                deadline_unix_ms: None,
            })?;

            let seq_before = ctx.log.len() as u64;
            let result = engine::resolve_turn(
                &mut ctx.game,
                &mut ctx.world,
                &mut ctx.log,
                declarations,
                &ctx.config,
            );
            ctx.push_since(seq_before);
            result?;

            if ctx.game.status == GameStatus::Ended || ctx.game.faulted {
                return Ok(());
            }
            ctx.game.turn += 1;
            ctx.game.phase = TurnPhase::Negotiation;
            open_phase_window(shared, ctx, true)?;
        }
        TurnPhase::Resolution => {
            // Resolution is synchronous; nothing schedules a wakeup for it.
        }
    }
    Ok(())
}

/// Set the deadline for the current phase, emit the boundary event, and
/// arm the deadline wakeup.
fn open_phase_window(shared: &SharedGame, ctx: &mut GameContext, turn_started: bool) -> Result<()> {
    let secs = ctx.phase_deadline_secs();
    let deadline = now_ms() + secs * 1000;
    ctx.game.deadline_unix_ms = Some(deadline);
    if turn_started {
        ctx.record(EventPayload::TurnStarted { turn: ctx.game.turn, deadline_unix_ms: deadline })?;
    } else {
        ctx.record(EventPayload::PhaseChanged {
            turn: ctx.game.turn,
            phase: ctx.game.phase,
            deadline_unix_ms: Some(deadline),
        })?;
    }
    schedule_wakeup(shared.clone(), ctx.phase_epoch, Duration::from_secs(secs));
    Ok(())
}

/// Emit the final negotiation slots as message events, submission order.
fn deliver_messages(ctx: &mut GameContext) -> Result<()> {
    let order = ctx.submission_order.clone();
    for country in order {
        let messages = match ctx.submissions.get(&country).map(|s| &s.payload) {
            Some(SubmissionPayload::Negotiation { messages }) => messages.clone(),
            _ => continue,
        };
        for message in messages {
            ctx.record(EventPayload::MessageSent {
                from: country.clone(),
                to: message.to,
                visibility: message.visibility,
                content: message.content,
            })?;
        }
    }
    Ok(())
}

/// Drain declaration slots in submission order.
fn take_declarations(ctx: &mut GameContext) -> Vec<(CountryId, Action)> {
    let mut declarations = Vec::new();
    for country in ctx.submission_order.clone() {
        if let Some(submission) = ctx.submissions.remove(&country) {
            if let SubmissionPayload::Declaration(declaration) = submission.payload {
                declarations.push((country, declaration.action));
            }
        }
    }
    ctx.submissions.clear();
    ctx.submission_order.clear();
    declarations
}
