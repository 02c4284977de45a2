//! AI profile configuration loaded from TOML
//!
//! Profiles define personality traits, combat style, behavior
//! thresholds, and optional situational overrides. They are attached
//! to enemy templates at load time and never mutated during combat.

use crate::core::error::{GridspireError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Personality traits (0 to 100)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityTraits {
    /// Willingness to press the attack
    pub aggression: u8,
    /// Quality of target/position evaluation
    pub intelligence: u8,
    /// Tolerance for personal risk
    pub courage: u8,
    /// Consistency and stance-keeping
    pub discipline: u8,
    /// Coordination with allies
    pub teamwork: u8,
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            aggression: 50,
            intelligence: 50,
            courage: 50,
            discipline: 50,
            teamwork: 50,
        }
    }
}

/// Engagement distance the entity tries to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PreferredRange {
    Contact,
    #[default]
    Close,
    Medium,
    Far,
}

impl PreferredRange {
    /// Ideal distance to the nearest enemy, in squares
    pub fn squares(&self) -> i32 {
        match self {
            PreferredRange::Contact => 1,
            PreferredRange::Close => 2,
            PreferredRange::Medium => 4,
            PreferredRange::Far => 8,
        }
    }
}

/// How much the entity likes to reposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MobilityPreference {
    Static,
    #[default]
    Mobile,
    Flanking,
}

/// Which enemy the entity likes to go after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    #[default]
    Weakest,
    Strongest,
    Closest,
    Dangerous,
    Isolated,
}

/// Combat style preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CombatStyle {
    #[serde(default)]
    pub preferred_range: PreferredRange,
    #[serde(default)]
    pub mobility: MobilityPreference,
    #[serde(default)]
    pub target_priority: TargetPriority,
}

/// Health/casualty thresholds that trigger behavior overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorThresholds {
    /// Health percent at or below which a coward tries to flee
    pub flee_health_percent: u8,
    /// Health percent at or below which a berserker rages
    pub rage_health_percent: u8,
    /// Dead-ally count that can trigger panic
    pub panic_allies_down: u32,
}

impl Default for BehaviorThresholds {
    fn default() -> Self {
        Self {
            flee_health_percent: 20,
            rage_health_percent: 30,
            panic_allies_down: 2,
        }
    }
}

/// Response a situational modifier selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierResponse {
    Retreat,
    Attack,
    Defend,
}

/// Optional situational overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContextModifiers {
    #[serde(default)]
    pub when_outnumbered: Option<ModifierResponse>,
    #[serde(default)]
    pub when_winning: Option<ModifierResponse>,
    #[serde(default)]
    pub on_ally_down: Option<ModifierResponse>,
}

/// Complete AI profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiProfile {
    /// Name of this profile (set from filename when loaded)
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub traits: PersonalityTraits,
    #[serde(default)]
    pub style: CombatStyle,
    #[serde(default)]
    pub thresholds: BehaviorThresholds,
    #[serde(default)]
    pub modifiers: ContextModifiers,
}

impl Default for AiProfile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            traits: PersonalityTraits::default(),
            style: CombatStyle::default(),
            thresholds: BehaviorThresholds::default(),
            modifiers: ContextModifiers::default(),
        }
    }
}

impl AiProfile {
    /// Clamp all traits into the 0..=100 domain
    pub fn clamped(mut self) -> Self {
        self.traits.aggression = self.traits.aggression.min(100);
        self.traits.intelligence = self.traits.intelligence.min(100);
        self.traits.courage = self.traits.courage.min(100);
        self.traits.discipline = self.traits.discipline.min(100);
        self.traits.teamwork = self.traits.teamwork.min(100);
        self.thresholds.flee_health_percent = self.thresholds.flee_health_percent.min(100);
        self.thresholds.rage_health_percent = self.thresholds.rage_health_percent.min(100);
        self
    }
}

/// Load a profile from TOML
///
/// Loads from `data/ai_profiles/{name}.toml`
pub fn load_profile(name: &str) -> Result<AiProfile> {
    let path = profile_path(name);

    let contents = fs::read_to_string(&path).map_err(|e| {
        GridspireError::ProfileError(format!("Failed to read profile file {:?}: {}", path, e))
    })?;

    let mut profile: AiProfile = toml::from_str(&contents).map_err(|e| {
        GridspireError::ProfileError(format!("Failed to parse profile TOML: {}", e))
    })?;

    profile.name = name.to_string();
    Ok(profile.clamped())
}

fn profile_path(name: &str) -> PathBuf {
    PathBuf::from("data/ai_profiles").join(format!("{}.toml", name))
}
