//! Scheduler integration tests: concurrent submissions, phase advances

use std::sync::Arc;

use statecraft::actions::Action;
use statecraft::core::config::GameConfig;
use statecraft::core::error::GameError;
use statecraft::core::types::{AgentId, CountryId};
use statecraft::events::EventPayload;
use statecraft::model::game::TurnPhase;
use statecraft::model::map::default_map;
use statecraft::model::submission::{
    Declaration, NegotiationMessage, Recipient, SubmissionPayload, Visibility,
};
use statecraft::scheduler::{self, GameRegistry, SharedGame};

const ROSTER: [&str; 6] = ["arlen", "bryce", "cresta", "doran", "elysia", "ferros"];

fn fast_config() -> GameConfig {
    GameConfig {
        min_players: 2,
        grace_delay_secs: 0,
        negotiation_deadline_secs: 600,
        declaration_deadline_secs: 600,
        ..GameConfig::default()
    }
}

async fn started_game(players: usize) -> (SharedGame, Vec<AgentId>) {
    let registry = GameRegistry::new();
    let id = registry.create(&default_map(), fast_config()).await.unwrap();
    let shared = registry.get(&id).await.unwrap();
    let mut agents = Vec::new();
    for slug in ROSTER.iter().take(players) {
        let agent = AgentId::new();
        scheduler::join(&shared, agent, CountryId::new(*slug)).await.unwrap();
        agents.push(agent);
    }
    scheduler::start(&shared).await.unwrap();
    (shared, agents)
}

fn negotiation(messages: Vec<NegotiationMessage>) -> SubmissionPayload {
    SubmissionPayload::Negotiation { messages }
}

fn declaration(action: Action) -> SubmissionPayload {
    SubmissionPayload::Declaration(Declaration { action, justification: String::new() })
}

/// All six agents fire their submissions from separate tasks at once,
/// for several full turns. However the races land, each turn must
/// resolve exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_simultaneous_submissions_resolve_each_turn_once() {
    let (shared, agents) = started_game(6).await;
    let turns = 3;

    for _ in 0..turns {
        for payload in [negotiation(vec![]), declaration(Action::Defend)] {
            let mut handles = Vec::new();
            for agent in &agents {
                let shared = Arc::clone(&shared);
                let agent = *agent;
                let payload = payload.clone();
                handles.push(tokio::spawn(async move {
                    scheduler::submit(&shared, agent, payload).await
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }
        }
    }

    let ctx = shared.lock().await;
    assert_eq!(ctx.game.turn, turns + 1);
    assert_eq!(ctx.game.phase, TurnPhase::Negotiation);
    let resolutions = ctx
        .log
        .events()
        .iter()
        .filter(|e| matches!(&e.payload, EventPayload::ResolutionStarted { .. }))
        .count();
    assert_eq!(resolutions, turns as usize);
}

/// Resubmitting before the phase advances replaces the stored slot;
/// only the final slot's messages are ever delivered.
#[tokio::test]
async fn test_resubmission_delivers_only_the_replacement() {
    let (shared, agents) = started_game(2).await;

    let to_bryce = |content: &str| NegotiationMessage {
        to: Recipient::Country { id: CountryId::new("bryce") },
        content: content.into(),
        visibility: Visibility::Private,
    };
    scheduler::submit(&shared, agents[0], negotiation(vec![to_bryce("first draft")]))
        .await
        .unwrap();
    scheduler::submit(&shared, agents[0], negotiation(vec![to_bryce("final offer")]))
        .await
        .unwrap();
    scheduler::submit(&shared, agents[1], negotiation(vec![])).await.unwrap();

    let ctx = shared.lock().await;
    assert_eq!(ctx.game.phase, TurnPhase::Declaration);
    let messages: Vec<&str> = ctx
        .log
        .events()
        .iter()
        .filter_map(|e| match &e.payload {
            EventPayload::MessageSent { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(messages, vec!["final offer"]);
}

#[tokio::test]
async fn test_join_after_start_rejected() {
    let (shared, _) = started_game(2).await;
    let err = scheduler::join(&shared, AgentId::new(), CountryId::new("cresta"))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NotInLobby(_)));
}

#[tokio::test]
async fn test_non_participant_cannot_submit() {
    let (shared, _) = started_game(2).await;
    let err = scheduler::submit(&shared, AgentId::new(), negotiation(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::NotParticipant));
}

/// Declarations resolve whatever the interleaving: run the same
/// aggressive turn many times and check the log is internally ordered
/// (scheduler events never interleave into the resolution pass).
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_resolution_pass_is_contiguous_in_the_log() {
    let (shared, agents) = started_game(6).await;

    for agent in &agents {
        scheduler::submit(&shared, *agent, negotiation(vec![])).await.unwrap();
    }
    let mut handles = Vec::new();
    for (i, agent) in agents.iter().enumerate() {
        let shared = Arc::clone(&shared);
        let agent = *agent;
        let action = if i == 0 {
            Action::Attack { target: CountryId::new(ROSTER[1]) }
        } else {
            Action::Defend
        };
        handles.push(tokio::spawn(async move {
            scheduler::submit(&shared, agent, declaration(action)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let ctx = shared.lock().await;
    let start = ctx
        .log
        .events()
        .iter()
        .position(|e| matches!(&e.payload, EventPayload::ResolutionStarted { .. }))
        .unwrap();
    let end = ctx
        .log
        .events()
        .iter()
        .position(|e| matches!(&e.payload, EventPayload::TurnStarted { turn, .. } if *turn == 2))
        .unwrap();
    assert!(start < end);
    // Every event between the pass start and the next turn belongs to turn 1.
    for event in &ctx.log.events()[start..end] {
        assert_eq!(event.turn, 1);
        assert_eq!(event.phase, TurnPhase::Resolution);
    }
}
