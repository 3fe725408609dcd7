//! The closed set of declarable actions and its wire-form validation

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::CountryId;
use crate::model::war::UltimatumDemand;

/// Everything a country can declare in one turn.
///
/// The set is closed: the wire layer parses into [`ActionRequest`] and
/// rejects unknown kinds, missing targets, and targets supplied to
/// targetless kinds before an `Action` is ever constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Attack { target: CountryId },
    Betray { target: CountryId },
    SpyIntel { target: CountryId },
    SpySabotage { target: CountryId },
    SpyPropaganda { target: CountryId },
    NavalBlockade { target: CountryId },
    NavalAttack { target: CountryId },
    Ally { target: CountryId },
    SendUltimatum { target: CountryId, demand: UltimatumDemand },
    Defend,
    InvestMilitary,
    InvestStability,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Attack,
    Betray,
    SpyIntel,
    SpySabotage,
    SpyPropaganda,
    NavalBlockade,
    NavalAttack,
    Ally,
    SendUltimatum,
    Defend,
    InvestMilitary,
    InvestStability,
    Neutral,
}

impl ActionKind {
    pub fn requires_target(self) -> bool {
        !matches!(
            self,
            ActionKind::Defend
                | ActionKind::InvestMilitary
                | ActionKind::InvestStability
                | ActionKind::Neutral
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Betray => "betray",
            ActionKind::SpyIntel => "spy_intel",
            ActionKind::SpySabotage => "spy_sabotage",
            ActionKind::SpyPropaganda => "spy_propaganda",
            ActionKind::NavalBlockade => "naval_blockade",
            ActionKind::NavalAttack => "naval_attack",
            ActionKind::Ally => "ally",
            ActionKind::SendUltimatum => "send_ultimatum",
            ActionKind::Defend => "defend",
            ActionKind::InvestMilitary => "invest_military",
            ActionKind::InvestStability => "invest_stability",
            ActionKind::Neutral => "neutral",
        }
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Attack { .. } => ActionKind::Attack,
            Action::Betray { .. } => ActionKind::Betray,
            Action::SpyIntel { .. } => ActionKind::SpyIntel,
            Action::SpySabotage { .. } => ActionKind::SpySabotage,
            Action::SpyPropaganda { .. } => ActionKind::SpyPropaganda,
            Action::NavalBlockade { .. } => ActionKind::NavalBlockade,
            Action::NavalAttack { .. } => ActionKind::NavalAttack,
            Action::Ally { .. } => ActionKind::Ally,
            Action::SendUltimatum { .. } => ActionKind::SendUltimatum,
            Action::Defend => ActionKind::Defend,
            Action::InvestMilitary => ActionKind::InvestMilitary,
            Action::InvestStability => ActionKind::InvestStability,
            Action::Neutral => ActionKind::Neutral,
        }
    }

    pub fn target(&self) -> Option<&CountryId> {
        match self {
            Action::Attack { target }
            | Action::Betray { target }
            | Action::SpyIntel { target }
            | Action::SpySabotage { target }
            | Action::SpyPropaganda { target }
            | Action::NavalBlockade { target }
            | Action::NavalAttack { target }
            | Action::Ally { target }
            | Action::SendUltimatum { target, .. } => Some(target),
            Action::Defend | Action::InvestMilitary | Action::InvestStability | Action::Neutral => {
                None
            }
        }
    }
}

/// Raw wire form of a declaration before validation.
///
/// Internally tagged serde enums silently ignore extra fields, so a flat
/// request struct is parsed first and checked field by field.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub kind: ActionKind,
    #[serde(default)]
    pub target: Option<CountryId>,
    /// Only meaningful for `send_ultimatum`
    #[serde(default)]
    pub demand: Option<UltimatumDemand>,
}

impl ActionRequest {
    /// Validate the raw request into a well-formed [`Action`].
    pub fn build(self) -> Result<Action> {
        let kind = self.kind;
        if kind.requires_target() && self.target.is_none() {
            return Err(GameError::MalformedAction(format!(
                "{} requires a target",
                kind.as_str()
            )));
        }
        if !kind.requires_target() && self.target.is_some() {
            return Err(GameError::MalformedAction(format!(
                "{} does not take a target",
                kind.as_str()
            )));
        }
        if kind != ActionKind::SendUltimatum && self.demand.is_some() {
            return Err(GameError::MalformedAction(format!(
                "{} does not take a demand",
                kind.as_str()
            )));
        }

        let target = self.target;
        Ok(match kind {
            ActionKind::Attack => Action::Attack { target: target.unwrap() },
            ActionKind::Betray => Action::Betray { target: target.unwrap() },
            ActionKind::SpyIntel => Action::SpyIntel { target: target.unwrap() },
            ActionKind::SpySabotage => Action::SpySabotage { target: target.unwrap() },
            ActionKind::SpyPropaganda => Action::SpyPropaganda { target: target.unwrap() },
            ActionKind::NavalBlockade => Action::NavalBlockade { target: target.unwrap() },
            ActionKind::NavalAttack => Action::NavalAttack { target: target.unwrap() },
            ActionKind::Ally => Action::Ally { target: target.unwrap() },
            ActionKind::SendUltimatum => {
                let demand = self.demand.ok_or_else(|| {
                    GameError::MalformedAction("send_ultimatum requires a demand".into())
                })?;
                Action::SendUltimatum { target: target.unwrap(), demand }
            }
            ActionKind::Defend => Action::Defend,
            ActionKind::InvestMilitary => Action::InvestMilitary,
            ActionKind::InvestStability => Action::InvestStability,
            ActionKind::Neutral => Action::Neutral,
        })
    }
}
