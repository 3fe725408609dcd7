//! WorldModel - authoritative per-game state container
//!
//! Holds countries, provinces, the adjacency graph, pacts, wars and
//! pending ultimatums. Mutation during a game flows exclusively through
//! `events::apply_event`; this module only provides the storage, lookup
//! helpers, and the cross-entity consistency checker.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::error::{GameError, Result};
use crate::core::types::{CountryId, GameId, PactId, ProvinceId, Turn, UltimatumId, WarId};
use crate::model::country::Country;
use crate::model::map::MapSpec;
use crate::model::pact::{Pact, PactKind};
use crate::model::province::Province;
use crate::model::war::{Ultimatum, War};

/// A naval blockade in force for a single turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blockade {
    pub blockader: CountryId,
    pub target: CountryId,
    pub turn: Turn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldModel {
    countries: AHashMap<CountryId, Country>,
    provinces: AHashMap<ProvinceId, Province>,
    adjacency: AHashMap<ProvinceId, Vec<ProvinceId>>,
    /// Stable iteration orders; resolver loops must be deterministic
    country_order: Vec<CountryId>,
    province_order: Vec<ProvinceId>,
    pub pacts: Vec<Pact>,
    pub wars: Vec<War>,
    pub ultimatums: Vec<Ultimatum>,
    pub blockades: Vec<Blockade>,
    next_pact_id: u32,
    next_war_id: u32,
    next_ultimatum_id: u32,
}

impl WorldModel {
    pub fn from_map(map: &MapSpec) -> Result<Self> {
        map.validate()?;

        let mut countries = AHashMap::new();
        let mut country_order = Vec::new();
        for spec in &map.countries {
            country_order.push(spec.id.clone());
            countries.insert(
                spec.id.clone(),
                Country {
                    id: spec.id.clone(),
                    name: spec.name.clone(),
                    owner: None,
                    capital: spec.capital.clone(),
                    military: spec.military,
                    fleet: spec.fleet,
                    money: spec.money,
                    tech: spec.tech,
                    stability: spec.stability,
                    spy_tokens: 0,
                    is_eliminated: false,
                    annexed_by: None,
                    forced_neutral_turn: None,
                },
            );
        }

        let mut provinces = AHashMap::new();
        let mut province_order = Vec::new();
        for spec in &map.provinces {
            province_order.push(spec.id.clone());
            provinces.insert(
                spec.id.clone(),
                Province {
                    id: spec.id.clone(),
                    name: spec.name.clone(),
                    owner: spec.owner.clone(),
                    original_owner: spec.owner.clone(),
                    terrain: spec.terrain,
                    gdp_value: spec.gdp_value,
                    population: spec.population,
                    troops_stationed: spec.troops_stationed,
                    is_capital: map.countries.iter().any(|c| c.capital == spec.id),
                    supplied: true,
                },
            );
        }

        let mut adjacency: AHashMap<ProvinceId, Vec<ProvinceId>> = AHashMap::new();
        for (a, b) in &map.adjacency {
            adjacency.entry(a.clone()).or_default().push(b.clone());
            adjacency.entry(b.clone()).or_default().push(a.clone());
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort();
            neighbors.dedup();
        }

        Ok(Self {
            countries,
            provinces,
            adjacency,
            country_order,
            province_order,
            pacts: Vec::new(),
            wars: Vec::new(),
            ultimatums: Vec::new(),
            blockades: Vec::new(),
            next_pact_id: 1,
            next_war_id: 1,
            next_ultimatum_id: 1,
        })
    }

    // === Lookups ===

    pub fn country(&self, id: &CountryId) -> Result<&Country> {
        self.countries
            .get(id)
            .ok_or_else(|| GameError::UnknownCountry(id.clone()))
    }

    pub fn country_mut(&mut self, id: &CountryId) -> Result<&mut Country> {
        self.countries
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownCountry(id.clone()))
    }

    pub fn province(&self, id: &ProvinceId) -> Result<&Province> {
        self.provinces
            .get(id)
            .ok_or_else(|| GameError::UnknownProvince(id.clone()))
    }

    pub fn province_mut(&mut self, id: &ProvinceId) -> Result<&mut Province> {
        self.provinces
            .get_mut(id)
            .ok_or_else(|| GameError::UnknownProvince(id.clone()))
    }

    /// Countries in roster order (deterministic)
    pub fn countries_ordered(&self) -> impl Iterator<Item = &Country> {
        self.country_order.iter().filter_map(|id| self.countries.get(id))
    }

    /// Non-eliminated country ids, roster order
    pub fn alive_countries(&self) -> Vec<CountryId> {
        self.countries_ordered()
            .filter(|c| c.is_alive())
            .map(|c| c.id.clone())
            .collect()
    }

    pub fn is_alive(&self, id: &CountryId) -> bool {
        self.countries.get(id).map(|c| c.is_alive()).unwrap_or(false)
    }

    /// Provinces in map order (deterministic)
    pub fn provinces_ordered(&self) -> impl Iterator<Item = &Province> {
        self.province_order.iter().filter_map(|id| self.provinces.get(id))
    }

    pub fn provinces_of(&self, owner: &CountryId) -> Vec<&Province> {
        self.provinces_ordered().filter(|p| &p.owner == owner).collect()
    }

    /// Territory is derived: the count of owned provinces
    pub fn territory(&self, owner: &CountryId) -> usize {
        self.provinces_ordered().filter(|p| &p.owner == owner).count()
    }

    pub fn total_provinces(&self) -> usize {
        self.province_order.len()
    }

    pub fn neighbors(&self, id: &ProvinceId) -> &[ProvinceId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Defender provinces reachable from attacker-held territory
    /// (the frontline rule), map order.
    pub fn frontline_provinces(&self, attacker: &CountryId, defender: &CountryId) -> Vec<ProvinceId> {
        self.provinces_ordered()
            .filter(|p| &p.owner == defender)
            .filter(|p| {
                self.neighbors(&p.id).iter().any(|n| {
                    self.provinces
                        .get(n)
                        .map(|np| &np.owner == attacker)
                        .unwrap_or(false)
                })
            })
            .map(|p| p.id.clone())
            .collect()
    }

    /// Provinces connected to the owner's capital through owned territory
    pub fn supplied_provinces(&self, owner: &CountryId) -> AHashSet<ProvinceId> {
        let mut reached = AHashSet::new();
        let Ok(country) = self.country(owner) else {
            return reached;
        };
        let capital = &country.capital;
        if self
            .provinces
            .get(capital)
            .map(|p| &p.owner != owner)
            .unwrap_or(true)
        {
            return reached;
        }
        let mut queue = vec![capital.clone()];
        reached.insert(capital.clone());
        while let Some(current) = queue.pop() {
            for neighbor in self.neighbors(&current) {
                if reached.contains(neighbor) {
                    continue;
                }
                if self
                    .provinces
                    .get(neighbor)
                    .map(|p| &p.owner == owner)
                    .unwrap_or(false)
                {
                    reached.insert(neighbor.clone());
                    queue.push(neighbor.clone());
                }
            }
        }
        reached
    }

    // === Diplomacy lookups ===

    pub fn has_active_war(&self, a: &CountryId, b: &CountryId) -> bool {
        self.wars.iter().any(|w| w.active && w.involves(a, b))
    }

    pub fn active_pacts_between(&self, a: &CountryId, b: &CountryId) -> Vec<PactId> {
        self.pacts
            .iter()
            .filter(|p| p.binds(a, b))
            .map(|p| p.id)
            .collect()
    }

    pub fn union_of(&self, country: &CountryId) -> Option<&Pact> {
        self.pacts
            .iter()
            .find(|p| p.kind == PactKind::Union && p.is_active() && p.has_member(country))
    }

    pub fn pact_mut(&mut self, id: PactId) -> Option<&mut Pact> {
        self.pacts.iter_mut().find(|p| p.id == id)
    }

    pub fn ultimatum_mut(&mut self, id: UltimatumId) -> Option<&mut Ultimatum> {
        self.ultimatums.iter_mut().find(|u| u.id == id)
    }

    pub fn blockades_against(&self, target: &CountryId, turn: Turn) -> usize {
        self.blockades
            .iter()
            .filter(|b| &b.target == target && b.turn == turn)
            .count()
    }

    // === Id generation ===

    pub fn next_pact_id(&mut self) -> PactId {
        let id = PactId(self.next_pact_id);
        self.next_pact_id += 1;
        id
    }

    pub fn next_war_id(&mut self) -> WarId {
        let id = WarId(self.next_war_id);
        self.next_war_id += 1;
        id
    }

    pub fn next_ultimatum_id(&mut self) -> UltimatumId {
        let id = UltimatumId(self.next_ultimatum_id);
        self.next_ultimatum_id += 1;
        id
    }

    // === Consistency ===

    /// Cross-entity invariants, checked after every resolution pass.
    ///
    /// A failure here is a bug, not a game outcome; the caller flags the
    /// game as faulted and stops scheduling it.
    pub fn check_invariants(&self, game: GameId) -> Result<()> {
        let fail = |detail: String| Err(GameError::Consistency { game, detail });

        for province in self.provinces_ordered() {
            let Some(owner) = self.countries.get(&province.owner) else {
                return fail(format!(
                    "province {} owned by unknown country {}",
                    province.id, province.owner
                ));
            };
            if owner.is_eliminated {
                return fail(format!(
                    "province {} owned by eliminated country {}",
                    province.id, province.owner
                ));
            }
        }

        for country in self.countries_ordered() {
            if country.is_eliminated && self.territory(&country.id) != 0 {
                return fail(format!("eliminated country {} still owns provinces", country.id));
            }
            if !country.is_eliminated && country.annexed_by.is_some() {
                return fail(format!("living country {} has annexed_by set", country.id));
            }
            if country.military < 0 || country.fleet < 0 {
                return fail(format!("country {} has negative forces", country.id));
            }
            if !(0..=10).contains(&country.stability) {
                return fail(format!(
                    "country {} stability {} out of range",
                    country.id, country.stability
                ));
            }
        }

        for pact in &self.pacts {
            let mut seen = AHashSet::new();
            for member in &pact.members {
                if !seen.insert(member) {
                    return fail(format!("pact {:?} has duplicate member {}", pact.id, member));
                }
            }
            if pact.members.len() < 2 {
                return fail(format!("pact {:?} has fewer than two members", pact.id));
            }
        }

        for (i, war) in self.wars.iter().enumerate() {
            if !war.active {
                continue;
            }
            for other in &self.wars[i + 1..] {
                if other.active && other.involves(&war.attacker, &war.defender) {
                    return fail(format!(
                        "duplicate active war between {} and {}",
                        war.attacker, war.defender
                    ));
                }
            }
        }

        Ok(())
    }
}
