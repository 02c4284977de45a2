//! Core type definitions used throughout the codebase

use crate::core::error::{GridspireError, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for combat entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

/// A cell on the combat grid
///
/// Distances use the Chebyshev metric: a diagonal step costs the same
/// as an orthogonal one, so distance is max(|dx|, |dy|).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance in grid squares
    pub fn distance(&self, other: &Self) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Chebyshev distance to a fractional point (e.g. a group centroid)
    pub fn distance_to_point(&self, x: f64, y: f64) -> f64 {
        (self.x as f64 - x).abs().max((self.y as f64 - y).abs())
    }

    /// All 8 neighboring cells
    pub fn neighbors(&self) -> [GridPos; 8] {
        [
            GridPos::new(self.x + 1, self.y),
            GridPos::new(self.x + 1, self.y + 1),
            GridPos::new(self.x, self.y + 1),
            GridPos::new(self.x - 1, self.y + 1),
            GridPos::new(self.x - 1, self.y),
            GridPos::new(self.x - 1, self.y - 1),
            GridPos::new(self.x, self.y - 1),
            GridPos::new(self.x + 1, self.y - 1),
        ]
    }

    /// All cells within Chebyshev range (inclusive), excluding self
    pub fn cells_in_range(&self, range: i32) -> Vec<GridPos> {
        let mut results = Vec::new();
        for dx in -range..=range {
            for dy in -range..=range {
                if dx == 0 && dy == 0 {
                    continue;
                }
                results.push(GridPos::new(self.x + dx, self.y + dy));
            }
        }
        results
    }

    /// The cell mirrored through `pivot` (used for flank detection)
    pub fn opposite_across(&self, pivot: &GridPos) -> GridPos {
        GridPos::new(2 * pivot.x - self.x, 2 * pivot.y - self.y)
    }
}

/// The six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

/// Full ability score block for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

impl AbilityScores {
    pub fn score(&self, ability: Ability) -> u8 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    /// Standard modifier: (score - 10) / 2, floored
    pub fn modifier(&self, ability: Ability) -> i32 {
        (self.score(ability) as i32 - 10).div_euclid(2)
    }

    /// Validate all scores are in the legal 1..=30 domain
    ///
    /// Scores outside the domain indicate broken content, not a
    /// reachable game state, so this is a hard error.
    pub fn validate(&self) -> Result<()> {
        for score in [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ] {
            if !(1..=30).contains(&score) {
                return Err(GridspireError::BadAbilityScore(score));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chebyshev_distance() {
        let a = GridPos::new(0, 0);
        assert_eq!(a.distance(&GridPos::new(3, 0)), 3);
        assert_eq!(a.distance(&GridPos::new(3, 3)), 3); // Diagonal = 1 per step
        assert_eq!(a.distance(&GridPos::new(-2, 5)), 5);
        assert_eq!(a.distance(&a), 0);
    }

    #[test]
    fn test_neighbors_count() {
        let pos = GridPos::new(5, 5);
        let neighbors = pos.neighbors();
        assert_eq!(neighbors.len(), 8);
        assert!(neighbors.iter().all(|n| pos.distance(n) == 1));
    }

    #[test]
    fn test_cells_in_range() {
        let pos = GridPos::new(0, 0);
        // 3x3 block minus center
        assert_eq!(pos.cells_in_range(1).len(), 8);
        // 5x5 block minus center
        assert_eq!(pos.cells_in_range(2).len(), 24);
    }

    #[test]
    fn test_opposite_across() {
        let ally = GridPos::new(0, 0);
        let enemy = GridPos::new(1, 0);
        assert_eq!(ally.opposite_across(&enemy), GridPos::new(2, 0));

        let diag = GridPos::new(3, 3);
        assert_eq!(GridPos::new(2, 2).opposite_across(&diag), GridPos::new(4, 4));
    }

    #[test]
    fn test_ability_modifiers() {
        let scores = AbilityScores {
            strength: 16,
            dexterity: 14,
            constitution: 12,
            intelligence: 10,
            wisdom: 9,
            charisma: 7,
        };
        assert_eq!(scores.modifier(Ability::Strength), 3);
        assert_eq!(scores.modifier(Ability::Dexterity), 2);
        assert_eq!(scores.modifier(Ability::Constitution), 1);
        assert_eq!(scores.modifier(Ability::Intelligence), 0);
        assert_eq!(scores.modifier(Ability::Wisdom), -1);
        assert_eq!(scores.modifier(Ability::Charisma), -2);
    }

    #[test]
    fn test_ability_score_domain() {
        let mut scores = AbilityScores::default();
        assert!(scores.validate().is_ok());

        scores.dexterity = 0;
        assert!(scores.validate().is_err());

        scores.dexterity = 31;
        assert!(scores.validate().is_err());

        scores.dexterity = 30;
        assert!(scores.validate().is_ok());
    }
}
