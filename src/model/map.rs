//! Map definitions consumed at game creation
//!
//! Geographic data preparation happens offline; the engine only ever sees
//! a [`MapSpec`]: countries with starting stats, provinces with terrain and
//! GDP, and the province adjacency graph. A small built-in map is provided
//! for tests and local play.

use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::{CountryId, ProvinceId};
use crate::model::province::Terrain;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountrySpec {
    pub id: CountryId,
    pub name: String,
    pub capital: ProvinceId,
    pub military: i64,
    pub fleet: i64,
    pub money: i64,
    pub tech: u8,
    pub stability: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvinceSpec {
    pub id: ProvinceId,
    pub name: String,
    pub owner: CountryId,
    pub terrain: Terrain,
    pub gdp_value: i64,
    pub population: i64,
    pub troops_stationed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSpec {
    pub countries: Vec<CountrySpec>,
    pub provinces: Vec<ProvinceSpec>,
    /// Undirected edges; each pair is stored once
    pub adjacency: Vec<(ProvinceId, ProvinceId)>,
}

impl MapSpec {
    pub fn from_json_file(path: &std::path::Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let map: Self = serde_json::from_str(&raw)?;
        map.validate()?;
        Ok(map)
    }

    pub fn validate(&self) -> Result<()> {
        let province_ids: ahash::AHashSet<&ProvinceId> =
            self.provinces.iter().map(|p| &p.id).collect();
        if province_ids.len() != self.provinces.len() {
            return Err(GameError::InvalidConfig("duplicate province ids".into()));
        }
        let country_ids: ahash::AHashSet<&CountryId> =
            self.countries.iter().map(|c| &c.id).collect();
        if country_ids.len() != self.countries.len() {
            return Err(GameError::InvalidConfig("duplicate country ids".into()));
        }
        for country in &self.countries {
            let capital = self
                .provinces
                .iter()
                .find(|p| p.id == country.capital)
                .ok_or_else(|| {
                    GameError::InvalidConfig(format!(
                        "capital {} of {} is not on the map",
                        country.capital, country.id
                    ))
                })?;
            if capital.owner != country.id {
                return Err(GameError::InvalidConfig(format!(
                    "capital {} is not owned by {}",
                    country.capital, country.id
                )));
            }
        }
        for province in &self.provinces {
            if !country_ids.contains(&province.owner) {
                return Err(GameError::InvalidConfig(format!(
                    "province {} owned by unknown country {}",
                    province.id, province.owner
                )));
            }
        }
        for (a, b) in &self.adjacency {
            if !province_ids.contains(a) || !province_ids.contains(b) {
                return Err(GameError::InvalidConfig(format!(
                    "adjacency edge ({a}, {b}) references an unknown province"
                )));
            }
            if a == b {
                return Err(GameError::InvalidConfig(format!("self-edge on {a}")));
            }
        }
        Ok(())
    }
}

/// Built-in six-country ring map.
///
/// Each country holds a capital, a core province and a border march; the
/// marches form a ring, so every country has exactly two land neighbors.
pub fn default_map() -> MapSpec {
    let roster: [(&str, &str); 6] = [
        ("arlen", "Arlen"),
        ("bryce", "Bryce"),
        ("cresta", "Cresta"),
        ("doran", "Doran"),
        ("elysia", "Elysia"),
        ("ferros", "Ferros"),
    ];
    let march_terrain = [
        Terrain::Plains,
        Terrain::Forest,
        Terrain::Mountains,
        Terrain::Coast,
        Terrain::Plains,
        Terrain::Forest,
    ];

    let mut countries = Vec::new();
    let mut provinces = Vec::new();
    let mut adjacency = Vec::new();

    for (i, (slug, name)) in roster.iter().enumerate() {
        let country = CountryId::new(*slug);
        let cap = ProvinceId::new(format!("{slug}-cap"));
        let core = ProvinceId::new(format!("{slug}-core"));
        let march = ProvinceId::new(format!("{slug}-march"));

        countries.push(CountrySpec {
            id: country.clone(),
            name: (*name).into(),
            capital: cap.clone(),
            military: 10,
            fleet: 2,
            money: 100,
            tech: 1 + (i as u8 % 2),
            stability: 5,
        });

        provinces.push(ProvinceSpec {
            id: cap.clone(),
            name: format!("{name} City"),
            owner: country.clone(),
            terrain: Terrain::Urban,
            gdp_value: 12,
            population: 1200,
            troops_stationed: 4,
        });
        provinces.push(ProvinceSpec {
            id: core.clone(),
            name: format!("{name} Heartland"),
            owner: country.clone(),
            terrain: Terrain::Plains,
            gdp_value: 8,
            population: 800,
            troops_stationed: 3,
        });
        provinces.push(ProvinceSpec {
            id: march.clone(),
            name: format!("{name} March"),
            owner: country.clone(),
            terrain: march_terrain[i],
            gdp_value: 5,
            population: 500,
            troops_stationed: 3,
        });

        adjacency.push((cap, core.clone()));
        adjacency.push((core, march));
    }

    // Close the ring between neighboring marches
    for i in 0..roster.len() {
        let next = (i + 1) % roster.len();
        adjacency.push((
            ProvinceId::new(format!("{}-march", roster[i].0)),
            ProvinceId::new(format!("{}-march", roster[next].0)),
        ));
    }

    MapSpec { countries, provinces, adjacency }
}
