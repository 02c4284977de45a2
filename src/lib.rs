//! Gridspire - turn-based tactical grid combat with personality-driven AI

pub mod ai;
pub mod combat;
pub mod core;
pub mod dice;
