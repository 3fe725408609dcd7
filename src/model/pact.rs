//! Pacts: alliances and unions between countries

use serde::{Deserialize, Serialize};

use crate::core::types::{CountryId, PactId, Turn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PactKind {
    /// Mutual-defense agreement; a country may hold several
    Alliance,
    /// Pooled economy/military; at most one per country
    Union,
}

/// Display colors cycled by pact id
const PALETTE: [&str; 8] = [
    "#c0392b", "#2980b9", "#27ae60", "#8e44ad", "#d35400", "#16a085", "#f39c12", "#2c3e50",
];

pub fn palette_color(id: PactId) -> &'static str {
    PALETTE[id.0 as usize % PALETTE.len()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pact {
    pub id: PactId,
    pub kind: PactKind,
    pub name: String,
    pub abbreviation: String,
    /// Display color for feeds and map overlays
    pub color: String,
    /// At least two members, no duplicates
    pub members: Vec<CountryId>,
    pub formed_turn: Turn,
    pub dissolved_turn: Option<Turn>,
}

impl Pact {
    pub fn is_active(&self) -> bool {
        self.dissolved_turn.is_none()
    }

    pub fn has_member(&self, country: &CountryId) -> bool {
        self.members.iter().any(|m| m == country)
    }

    pub fn binds(&self, a: &CountryId, b: &CountryId) -> bool {
        self.is_active() && self.has_member(a) && self.has_member(b)
    }
}
