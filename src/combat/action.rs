//! Actions submitted to the engine
//!
//! [`CombatAction`] is the legacy single-step command; [`TurnAction`]
//! bundles a full turn (move + attack + ability + stance) resolved as
//! one transition. Players and the AI submit the same types.

use crate::core::types::{EntityId, GridPos};
use serde::{Deserialize, Serialize};

/// A single atomic command (legacy API, still used by simple drivers)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CombatAction {
    Attack {
        attacker: EntityId,
        target: EntityId,
    },
    Move {
        entity: EntityId,
        to: GridPos,
    },
}

impl CombatAction {
    pub fn actor(&self) -> EntityId {
        match self {
            CombatAction::Attack { attacker, .. } => *attacker,
            CombatAction::Move { entity, .. } => *entity,
        }
    }
}

/// One complete turn for one entity
///
/// Phases resolve in fixed order: movement, attack, ability, defend.
/// Every field is optional; an all-empty turn is a legal "pass".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnAction {
    pub entity: EntityId,
    pub movement: Option<GridPos>,
    pub attack_target: Option<EntityId>,
    pub ability: Option<String>,
    pub defend: bool,
}

impl TurnAction {
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            movement: None,
            attack_target: None,
            ability: None,
            defend: false,
        }
    }

    /// A turn that does nothing (the AI's safe fallback)
    pub fn no_op(entity: EntityId) -> Self {
        Self::new(entity)
    }

    pub fn with_movement(mut self, to: GridPos) -> Self {
        self.movement = Some(to);
        self
    }

    pub fn with_attack(mut self, target: EntityId) -> Self {
        self.attack_target = Some(target);
        self
    }

    pub fn with_defend(mut self) -> Self {
        self.defend = true;
        self
    }

    pub fn is_no_op(&self) -> bool {
        self.movement.is_none()
            && self.attack_target.is_none()
            && self.ability.is_none()
            && !self.defend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_op_detection() {
        let id = EntityId::new();
        assert!(TurnAction::no_op(id).is_no_op());
        assert!(!TurnAction::new(id).with_defend().is_no_op());
        assert!(!TurnAction::new(id).with_movement(GridPos::new(1, 1)).is_no_op());
    }

    #[test]
    fn test_builder_chain() {
        let id = EntityId::new();
        let target = EntityId::new();
        let turn = TurnAction::new(id)
            .with_movement(GridPos::new(2, 3))
            .with_attack(target);
        assert_eq!(turn.movement, Some(GridPos::new(2, 3)));
        assert_eq!(turn.attack_target, Some(target));
        assert!(!turn.defend);
    }
}
