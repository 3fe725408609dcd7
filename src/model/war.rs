//! Wars and pending ultimatums

use serde::{Deserialize, Serialize};

use crate::core::types::{CountryId, ProvinceId, Turn, UltimatumId, WarId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarCause {
    Attack,
    Betrayal,
    UltimatumRejected,
}

/// At most one active war per unordered country pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct War {
    pub id: WarId,
    pub attacker: CountryId,
    pub defender: CountryId,
    pub cause: WarCause,
    pub start_turn: Turn,
    pub active: bool,
}

impl War {
    /// Order-insensitive membership test
    pub fn involves(&self, a: &CountryId, b: &CountryId) -> bool {
        (&self.attacker == a && &self.defender == b)
            || (&self.attacker == b && &self.defender == a)
    }
}

/// What an ultimatum demands of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UltimatumDemand {
    CedeProvince { province: ProvinceId },
    PayTribute { amount: i64 },
}

/// A pending demand; auto-resolves at its expiry turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ultimatum {
    pub id: UltimatumId,
    pub from: CountryId,
    pub to: CountryId,
    pub demand: UltimatumDemand,
    pub issued_turn: Turn,
    pub expiry_turn: Turn,
    pub resolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_war_involves_is_unordered() {
        let war = War {
            id: WarId(1),
            attacker: CountryId::new("arlen"),
            defender: CountryId::new("bryce"),
            cause: WarCause::Attack,
            start_turn: 2,
            active: true,
        };
        let a = CountryId::new("arlen");
        let b = CountryId::new("bryce");
        let c = CountryId::new("cresta");
        assert!(war.involves(&a, &b));
        assert!(war.involves(&b, &a));
        assert!(!war.involves(&a, &c));
    }
}
