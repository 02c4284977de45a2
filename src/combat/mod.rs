//! Turn-based grid combat - entities, weapons, events, and the engine
//!
//! Distances are Chebyshev (diagonals cost one square); one square is
//! five feet. The engine is immutable: transitions return new values.

pub mod action;
pub mod engine;
pub mod entity;
pub mod event;
pub mod state;
pub mod weapons;

pub use action::{CombatAction, TurnAction};
pub use engine::{ActionKind, CombatEngine};
pub use entity::{ActionBudget, CombatEntity, EntityKind, FEET_PER_SQUARE};
pub use event::CombatEvent;
pub use state::{CombatPhase, CombatState};
pub use weapons::{DamageRoll, Weapon, WeaponCatalog, WeaponCategory, WeaponResolver};
