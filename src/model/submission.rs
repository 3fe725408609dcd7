//! Agent submissions: negotiation messages and turn declarations

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::core::types::{CountryId, Turn};
use crate::model::game::TurnPhase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recipient {
    Country { id: CountryId },
    Broadcast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Delivered to the recipient only
    Private,
    /// Visible to all participants and spectators
    Public,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationMessage {
    pub to: Recipient,
    pub content: String,
    pub visibility: Visibility,
}

/// One declared action plus the free-text justification shown in the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    pub action: Action,
    #[serde(default)]
    pub justification: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SubmissionPayload {
    Negotiation { messages: Vec<NegotiationMessage> },
    Declaration(Declaration),
}

impl SubmissionPayload {
    pub fn phase(&self) -> TurnPhase {
        match self {
            SubmissionPayload::Negotiation { .. } => TurnPhase::Negotiation,
            SubmissionPayload::Declaration(_) => TurnPhase::Declaration,
        }
    }
}

/// One slot per (country, turn, phase); resubmission replaces it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub country: CountryId,
    pub turn: Turn,
    pub payload: SubmissionPayload,
    pub submitted_at_ms: u64,
}
