//! Structured combat event log
//!
//! Events carry ids, names, and numbers only. Presentation layers
//! render text from these fields; the core never formats display
//! strings.

use crate::combat::state::CombatPhase;
use crate::core::types::{EntityId, GridPos};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    CombatStarted {
        combatants: usize,
    },
    InitiativeRolled {
        entity: EntityId,
        name: String,
        roll: i32,
        total: i32,
    },
    RoundStarted {
        round: u32,
    },
    TurnStarted {
        entity: EntityId,
        name: String,
        round: u32,
    },
    Moved {
        entity: EntityId,
        name: String,
        from: GridPos,
        to: GridPos,
        cost_feet: i32,
    },
    AttackHit {
        attacker: EntityId,
        attacker_name: String,
        target: EntityId,
        target_name: String,
        weapon: String,
        distance: i32,
        attack_roll: i32,
        attack_total: i32,
        damage: i32,
        target_hp_after: i32,
    },
    AttackMissed {
        attacker: EntityId,
        attacker_name: String,
        target: EntityId,
        target_name: String,
        weapon: String,
        distance: i32,
        attack_roll: i32,
        attack_total: i32,
        target_ac: i32,
    },
    Defeated {
        entity: EntityId,
        name: String,
    },
    DefendStance {
        entity: EntityId,
        name: String,
    },
    CombatEnded {
        phase: CombatPhase,
        rounds: u32,
    },
}

impl CombatEvent {
    /// Whether this event feeds the AI's recent-history window
    pub fn is_combat_relevant(&self) -> bool {
        matches!(
            self,
            CombatEvent::AttackHit { .. }
                | CombatEvent::AttackMissed { .. }
                | CombatEvent::Defeated { .. }
        )
    }
}
