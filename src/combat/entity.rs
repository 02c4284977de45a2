//! Combat entities and their per-turn action budget

use crate::ai::profile::AiProfile;
use crate::core::error::{GridspireError, Result};
use crate::core::types::{AbilityScores, EntityId, GridPos};
use serde::{Deserialize, Serialize};

/// Feet of movement per grid square
pub const FEET_PER_SQUARE: i32 = 5;

/// Allegiance class of a combatant
///
/// Enemies are hostile to players and allies; players and allies are
/// hostile to enemies. There are no three-way fights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Enemy,
    Ally,
}

impl EntityKind {
    /// Whether two kinds fight on the same side
    pub fn is_allied_with(&self, other: EntityKind) -> bool {
        match self {
            EntityKind::Enemy => other == EntityKind::Enemy,
            EntityKind::Player | EntityKind::Ally => other != EntityKind::Enemy,
        }
    }

    pub fn is_hostile_to(&self, other: EntityKind) -> bool {
        !self.is_allied_with(other)
    }
}

/// Resources available to an entity within the current round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionBudget {
    pub action: bool,
    pub bonus_action: bool,
    pub reaction: bool,
    /// Remaining movement in feet
    pub movement_feet: i32,
    pub movement_used: bool,
}

impl ActionBudget {
    /// Fresh budget for an entity with the given speed (squares/round)
    pub fn fresh(speed: i32) -> Self {
        Self {
            action: true,
            bonus_action: true,
            reaction: true,
            movement_feet: speed * FEET_PER_SQUARE,
            movement_used: false,
        }
    }
}

/// A single combatant on the grid
///
/// Owned exclusively by the combat state; all mutation goes through
/// engine transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEntity {
    pub id: EntityId,
    pub name: String,
    pub kind: EntityKind,
    pub level: u32,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub armor_class: i32,
    /// Movement speed in squares per round
    pub speed: i32,
    pub initiative: i32,
    pub abilities: AbilityScores,
    pub position: GridPos,
    pub is_active: bool,
    pub is_dead: bool,
    pub budget: ActionBudget,
    /// Equipped weapon ids, first entry is the default draw
    #[serde(default)]
    pub equipment: Vec<String>,
    /// Personality driving AI decisions; None for player-driven entities
    #[serde(default)]
    pub profile: Option<AiProfile>,
}

impl CombatEntity {
    pub fn new(
        name: impl Into<String>,
        kind: EntityKind,
        level: u32,
        max_hit_points: i32,
        armor_class: i32,
        speed: i32,
        abilities: AbilityScores,
        position: GridPos,
    ) -> Self {
        Self {
            id: EntityId::new(),
            name: name.into(),
            kind,
            level,
            hit_points: max_hit_points,
            max_hit_points,
            armor_class,
            speed,
            initiative: 0,
            abilities,
            position,
            is_active: true,
            is_dead: false,
            budget: ActionBudget::fresh(speed),
            equipment: Vec::new(),
            profile: None,
        }
    }

    pub fn with_equipment(mut self, weapon_ids: Vec<String>) -> Self {
        self.equipment = weapon_ids;
        self
    }

    pub fn with_profile(mut self, profile: AiProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Validate content-sourced fields
    pub fn validate(&self) -> Result<()> {
        self.abilities.validate()?;
        if self.max_hit_points <= 0 {
            return Err(GridspireError::InvalidEntity(format!(
                "{}: max hit points must be positive, got {}",
                self.name, self.max_hit_points
            )));
        }
        if self.speed < 0 {
            return Err(GridspireError::InvalidEntity(format!(
                "{}: negative speed {}",
                self.name, self.speed
            )));
        }
        Ok(())
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Current health as a percentage of maximum
    pub fn health_percent(&self) -> f64 {
        if self.max_hit_points <= 0 {
            return 0.0;
        }
        self.hit_points as f64 / self.max_hit_points as f64 * 100.0
    }

    pub fn is_injured(&self) -> bool {
        self.health_percent() < 50.0
    }

    pub fn is_critical(&self) -> bool {
        self.health_percent() < 25.0
    }

    /// Remaining movement in whole squares
    pub fn movement_squares(&self) -> i32 {
        self.budget.movement_feet / FEET_PER_SQUARE
    }

    /// Reset the per-round budget (round wrap)
    pub fn reset_budget(&mut self) {
        self.budget = ActionBudget::fresh(self.speed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entity(kind: EntityKind) -> CombatEntity {
        CombatEntity::new(
            "Test",
            kind,
            2,
            20,
            13,
            6,
            AbilityScores::default(),
            GridPos::new(0, 0),
        )
    }

    #[test]
    fn test_hostility_partition() {
        assert!(EntityKind::Enemy.is_allied_with(EntityKind::Enemy));
        assert!(EntityKind::Player.is_allied_with(EntityKind::Ally));
        assert!(EntityKind::Ally.is_allied_with(EntityKind::Player));
        assert!(EntityKind::Enemy.is_hostile_to(EntityKind::Player));
        assert!(EntityKind::Enemy.is_hostile_to(EntityKind::Ally));
        assert!(EntityKind::Ally.is_hostile_to(EntityKind::Enemy));
    }

    #[test]
    fn test_fresh_budget_from_speed() {
        let budget = ActionBudget::fresh(6);
        assert!(budget.action && budget.bonus_action && budget.reaction);
        assert_eq!(budget.movement_feet, 30);
        assert!(!budget.movement_used);
    }

    #[test]
    fn test_health_buckets() {
        let mut entity = sample_entity(EntityKind::Player);
        assert!(!entity.is_injured());

        entity.hit_points = 9;
        assert!(entity.is_injured());
        assert!(!entity.is_critical());

        entity.hit_points = 4;
        assert!(entity.is_critical());
    }

    #[test]
    fn test_validate_rejects_bad_content() {
        let mut entity = sample_entity(EntityKind::Enemy);
        assert!(entity.validate().is_ok());

        entity.max_hit_points = 0;
        assert!(entity.validate().is_err());

        entity.max_hit_points = 20;
        entity.abilities.strength = 0;
        assert!(entity.validate().is_err());
    }

    #[test]
    fn test_reset_budget_after_spending() {
        let mut entity = sample_entity(EntityKind::Player);
        entity.budget.action = false;
        entity.budget.movement_feet = 5;
        entity.budget.movement_used = true;

        entity.reset_budget();
        assert!(entity.budget.action);
        assert_eq!(entity.budget.movement_feet, 30);
        assert!(!entity.budget.movement_used);
    }
}
