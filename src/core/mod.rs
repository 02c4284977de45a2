pub mod error;
pub mod types;

pub use error::{GridspireError, Result};
pub use types::{Ability, AbilityScores, EntityId, GridPos};
