//! Tactical AI - personality-driven turn decisions
//!
//! The pipeline runs in three stages: [`context::analyze`] builds a
//! tactical snapshot for one entity, [`scoring::score_turn`] rates
//! candidate turns against an [`AiProfile`], and [`Tactician`] wires
//! the stages together and picks the turn to execute.

pub mod context;
pub mod profile;
pub mod scoring;
pub mod tactician;

// Re-exports for convenient access
pub use context::{analyze, BattleIntensity, CombatContext, TacticalSummary};
pub use profile::{
    load_profile, AiProfile, BehaviorThresholds, CombatStyle, ContextModifiers,
    MobilityPreference, ModifierResponse, PersonalityTraits, PreferredRange, TargetPriority,
};
pub use scoring::{score_turn, BenefitTag, RiskTag, ScoreBreakdown, ScoredTurn};
pub use tactician::Tactician;
