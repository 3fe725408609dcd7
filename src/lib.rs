//! Statecraft - Multi-Agent Geopolitical Strategy Game Server

pub mod actions;
pub mod core;
pub mod engine;
pub mod events;
pub mod formulas;
pub mod model;
pub mod replay;
pub mod scheduler;
pub mod server;
