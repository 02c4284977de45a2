//! Weapon catalog and tactical weapon selection
//!
//! Weapons are content: loaded externally, injected as a read-only
//! catalog. The resolver picks the best equipped weapon for a given
//! attacker/target distance.

use crate::core::types::Ability;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Melee weapons threaten adjacent-ish squares; ranged reach further
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponCategory {
    Melee,
    Ranged,
}

/// Damage dice for a weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    pub dice_count: u32,
    pub dice_faces: u32,
    pub bonus: i32,
}

impl DamageRoll {
    pub fn new(dice_count: u32, dice_faces: u32, bonus: i32) -> Self {
        Self {
            dice_count,
            dice_faces,
            bonus,
        }
    }

    /// Mean roll plus bonus, used for tactical weapon comparison
    pub fn expected(&self) -> f64 {
        self.dice_count as f64 * (self.dice_faces as f64 + 1.0) / 2.0 + self.bonus as f64
    }
}

/// A weapon template from the content catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub damage: DamageRoll,
    /// Ability whose modifier drives attack and damage
    pub governing: Ability,
    /// Maximum range in grid squares
    pub range: i32,
    pub category: WeaponCategory,
    #[serde(default)]
    pub properties: Vec<String>,
}

impl Weapon {
    /// Fallback for entities with nothing equipped
    pub fn unarmed() -> Self {
        Self {
            id: "unarmed".to_string(),
            name: "Unarmed Strike".to_string(),
            damage: DamageRoll::new(1, 4, 0),
            governing: Ability::Strength,
            range: 1,
            category: WeaponCategory::Melee,
            properties: Vec::new(),
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.category == WeaponCategory::Ranged
    }
}

/// Read-only weapon lookup injected into the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeaponCatalog {
    weapons: HashMap<String, Weapon>,
}

impl WeaponCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weapon(mut self, weapon: Weapon) -> Self {
        self.weapons.insert(weapon.id.clone(), weapon);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Weapon> {
        self.weapons.get(id)
    }

    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }
}

/// Distance beyond which melee weapons stop being the natural choice
const MELEE_ENGAGEMENT_SQUARES: i32 = 2;

/// Tactical weapon selection over an entity's equipment
#[derive(Debug, Clone)]
pub struct WeaponResolver {
    catalog: Arc<WeaponCatalog>,
}

impl WeaponResolver {
    pub fn new(catalog: Arc<WeaponCatalog>) -> Self {
        Self { catalog }
    }

    /// Direct catalog lookup
    pub fn get(&self, id: &str) -> Option<&Weapon> {
        self.catalog.get(id)
    }

    /// The entity's default weapon: first equipped, None means unarmed
    pub fn resolve_for_entity<'a>(&'a self, equipment: &[String]) -> Option<&'a Weapon> {
        equipment.iter().find_map(|id| self.catalog.get(id))
    }

    /// Best equipped weapon for attacking at `distance` squares
    ///
    /// At engagement range prefer the hardest-hitting melee weapon and
    /// only fall back to ranged (or anything at all) when no melee
    /// weapon is equipped. Past engagement range prefer the
    /// hardest-hitting ranged weapon that reaches; if none reach, the
    /// longest-range one; with no ranged weapon at all, melee it is.
    pub fn resolve_best_for_distance<'a>(
        &'a self,
        equipment: &[String],
        distance: i32,
    ) -> Option<&'a Weapon> {
        let equipped: Vec<&Weapon> = equipment
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect();
        if equipped.is_empty() {
            return None;
        }

        let best_by_damage = |weapons: &[&'a Weapon]| -> Option<&'a Weapon> {
            weapons
                .iter()
                .copied()
                .max_by(|a, b| {
                    a.damage
                        .expected()
                        .partial_cmp(&b.damage.expected())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        };

        if distance <= MELEE_ENGAGEMENT_SQUARES {
            let melee: Vec<&Weapon> = equipped
                .iter()
                .copied()
                .filter(|w| !w.is_ranged())
                .collect();
            if let Some(weapon) = best_by_damage(&melee) {
                return Some(weapon);
            }
            // No melee option: a ranged weapon up close beats bare fists
            let ranged: Vec<&Weapon> =
                equipped.iter().copied().filter(|w| w.is_ranged()).collect();
            best_by_damage(&ranged).or_else(|| equipped.first().copied())
        } else {
            let in_reach: Vec<&Weapon> = equipped
                .iter()
                .copied()
                .filter(|w| w.is_ranged() && w.range >= distance)
                .collect();
            if let Some(weapon) = best_by_damage(&in_reach) {
                return Some(weapon);
            }
            if let Some(longest) = equipped
                .iter()
                .copied()
                .filter(|w| w.is_ranged())
                .max_by_key(|w| w.range)
            {
                return Some(longest);
            }
            best_by_damage(&equipped)
        }
    }

    /// Longest range the entity can threaten with, unarmed included
    pub fn max_threat_range(&self, equipment: &[String]) -> i32 {
        equipment
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .map(|w| w.range)
            .max()
            .unwrap_or(Weapon::unarmed().range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shortsword() -> Weapon {
        Weapon {
            id: "shortsword".to_string(),
            name: "Shortsword".to_string(),
            damage: DamageRoll::new(1, 6, 0),
            governing: Ability::Strength,
            range: 1,
            category: WeaponCategory::Melee,
            properties: vec![],
        }
    }

    fn greataxe() -> Weapon {
        Weapon {
            id: "greataxe".to_string(),
            name: "Greataxe".to_string(),
            damage: DamageRoll::new(1, 12, 0),
            governing: Ability::Strength,
            range: 1,
            category: WeaponCategory::Melee,
            properties: vec!["two_handed".to_string()],
        }
    }

    fn shortbow() -> Weapon {
        Weapon {
            id: "shortbow".to_string(),
            name: "Shortbow".to_string(),
            damage: DamageRoll::new(1, 6, 0),
            governing: Ability::Dexterity,
            range: 16,
            category: WeaponCategory::Ranged,
            properties: vec![],
        }
    }

    fn longbow() -> Weapon {
        Weapon {
            id: "longbow".to_string(),
            name: "Longbow".to_string(),
            damage: DamageRoll::new(1, 8, 0),
            governing: Ability::Dexterity,
            range: 30,
            category: WeaponCategory::Ranged,
            properties: vec![],
        }
    }

    fn resolver() -> WeaponResolver {
        let catalog = WeaponCatalog::new()
            .with_weapon(shortsword())
            .with_weapon(greataxe())
            .with_weapon(shortbow())
            .with_weapon(longbow());
        WeaponResolver::new(Arc::new(catalog))
    }

    #[test]
    fn test_expected_damage() {
        assert_eq!(DamageRoll::new(1, 6, 0).expected(), 3.5);
        assert_eq!(DamageRoll::new(2, 6, 1).expected(), 8.0);
    }

    #[test]
    fn test_resolve_for_entity_first_equipped() {
        let resolver = resolver();
        let equipment = vec!["shortbow".to_string(), "shortsword".to_string()];
        let weapon = resolver
            .resolve_for_entity(&equipment)
            .expect("Should resolve");
        assert_eq!(weapon.id, "shortbow");

        assert!(resolver.resolve_for_entity(&[]).is_none());
    }

    #[test]
    fn test_melee_range_prefers_best_melee() {
        let resolver = resolver();
        let equipment = vec![
            "shortsword".to_string(),
            "greataxe".to_string(),
            "longbow".to_string(),
        ];
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 1)
            .expect("Should resolve");
        assert_eq!(weapon.id, "greataxe");
    }

    #[test]
    fn test_melee_range_falls_back_to_ranged() {
        let resolver = resolver();
        let equipment = vec!["longbow".to_string()];
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 1)
            .expect("Should resolve");
        assert_eq!(weapon.id, "longbow");
    }

    #[test]
    fn test_long_range_prefers_reaching_ranged() {
        let resolver = resolver();
        let equipment = vec![
            "shortsword".to_string(),
            "shortbow".to_string(),
            "longbow".to_string(),
        ];
        // Both bows reach at 10; longbow hits harder
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 10)
            .expect("Should resolve");
        assert_eq!(weapon.id, "longbow");
    }

    #[test]
    fn test_long_range_out_of_reach_picks_longest() {
        let resolver = resolver();
        let equipment = vec!["shortbow".to_string(), "longbow".to_string()];
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 50)
            .expect("Should resolve");
        assert_eq!(weapon.id, "longbow");
    }

    #[test]
    fn test_long_range_melee_only_fallback() {
        let resolver = resolver();
        let equipment = vec!["shortsword".to_string()];
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 8)
            .expect("Should resolve");
        assert_eq!(weapon.id, "shortsword");
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let resolver = resolver();
        let equipment = vec!["vorpal_blade".to_string(), "shortsword".to_string()];
        let weapon = resolver
            .resolve_best_for_distance(&equipment, 1)
            .expect("Should resolve");
        assert_eq!(weapon.id, "shortsword");
    }

    #[test]
    fn test_max_threat_range() {
        let resolver = resolver();
        assert_eq!(
            resolver.max_threat_range(&["shortsword".to_string(), "longbow".to_string()]),
            30
        );
        // Unarmed threat
        assert_eq!(resolver.max_threat_range(&[]), 1);
    }
}
