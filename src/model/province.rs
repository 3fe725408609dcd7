//! Province records: the territorial unit of the map

use serde::{Deserialize, Serialize};

use crate::core::types::{CountryId, ProvinceId};

/// Terrain category, feeding the defensive combat modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plains,
    Forest,
    Mountains,
    Urban,
    Coast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Province {
    pub id: ProvinceId,
    pub name: String,
    pub owner: CountryId,
    /// Owner at game start; revolts restore provinces to this country
    pub original_owner: CountryId,
    pub terrain: Terrain,
    /// Per-turn income contribution before modifiers
    pub gdp_value: i64,
    pub population: i64,
    /// Garrison allocated here (in K); a deployment of the owner's total
    pub troops_stationed: i64,
    pub is_capital: bool,
    /// Output of the supply step: connected to the owner's capital.
    /// Read by the *next* turn's combat and economy.
    pub supplied: bool,
}
