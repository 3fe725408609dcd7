//! Deterministic game math, isolated from world state

pub mod combat;
pub mod economy;
