//! Immutable combat state snapshot
//!
//! The entity vec doubles as the initiative order once initiative has
//! been rolled. Transitions clone the whole state; entity counts are
//! small enough that a full copy per transition is the simple, correct
//! choice, and old snapshots stay valid for logging and replay.

use crate::combat::entity::{CombatEntity, EntityKind, FEET_PER_SQUARE};
use crate::combat::event::CombatEvent;
use crate::core::types::{EntityId, GridPos};
use serde::{Deserialize, Serialize};

/// Lifecycle of an encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CombatPhase {
    #[default]
    Setup,
    Active,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CombatState {
    /// Initiative order once rolled; insertion order during setup
    pub entities: Vec<CombatEntity>,
    pub current_turn_index: usize,
    pub round: u32,
    pub phase: CombatPhase,
    /// Append-only structured narrative log
    pub events: Vec<CombatEvent>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub(crate) fn entity_mut(&mut self, id: EntityId) -> Option<&mut CombatEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn current_entity(&self) -> Option<&CombatEntity> {
        if self.phase != CombatPhase::Active {
            return None;
        }
        self.entities.get(self.current_turn_index)
    }

    /// Living entities hostile to the given one
    pub fn enemies_of(&self, id: EntityId) -> Vec<&CombatEntity> {
        let Some(entity) = self.entity(id) else {
            return Vec::new();
        };
        self.entities
            .iter()
            .filter(|e| e.id != id && e.is_alive() && e.kind.is_hostile_to(entity.kind))
            .collect()
    }

    /// Living entities on the same side, excluding the entity itself
    pub fn allies_of(&self, id: EntityId) -> Vec<&CombatEntity> {
        let Some(entity) = self.entity(id) else {
            return Vec::new();
        };
        self.entities
            .iter()
            .filter(|e| e.id != id && e.is_alive() && e.kind.is_allied_with(entity.kind))
            .collect()
    }

    pub fn living_of_kind(&self, kind: EntityKind) -> usize {
        self.entities
            .iter()
            .filter(|e| e.kind == kind && e.is_alive())
            .count()
    }

    /// Is a cell occupied by a living entity (other than `ignoring`)?
    pub fn is_occupied(&self, cell: GridPos, ignoring: Option<EntityId>) -> bool {
        self.entities.iter().any(|e| {
            e.is_alive() && e.position == cell && Some(e.id) != ignoring
        })
    }

    /// Cells the entity can move to with its remaining movement
    ///
    /// Radius is remaining movement in squares; cells occupied by
    /// living entities are excluded, as is the entity's own cell.
    pub fn reachable_cells(&self, id: EntityId) -> Vec<GridPos> {
        let Some(entity) = self.entity(id) else {
            return Vec::new();
        };
        let radius = entity.budget.movement_feet / FEET_PER_SQUARE;
        if radius <= 0 {
            return Vec::new();
        }
        entity
            .position
            .cells_in_range(radius)
            .into_iter()
            .filter(|cell| !self.is_occupied(*cell, None))
            .collect()
    }

    pub fn is_ended(&self) -> bool {
        matches!(self.phase, CombatPhase::Victory | CombatPhase::Defeat)
    }

    pub(crate) fn push_event(&mut self, event: CombatEvent) {
        self.events.push(event);
    }
}
