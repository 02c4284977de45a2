//! Multi-criteria turn scoring
//!
//! Scores one candidate turn against a [`CombatContext`] and an
//! [`AiProfile`]. Five sub-scores (position, target, survival,
//! teamwork, style), each clamped to [0, 100], blended with
//! trait-shifted weights. The numbers are tuning knobs, not physics;
//! they only need to rank candidates sensibly for a given personality.

use crate::ai::context::CombatContext;
use crate::ai::profile::{AiProfile, MobilityPreference, TargetPriority};
use crate::combat::action::TurnAction;
use crate::combat::entity::CombatEntity;
use crate::combat::state::CombatState;
use crate::combat::weapons::{Weapon, WeaponResolver};
use crate::core::types::{EntityId, GridPos};
use crate::dice::DiceRoller;
use serde::{Deserialize, Serialize};

/// Why a candidate is dangerous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTag {
    Exposed,
    RangedInMelee,
    CriticalAndThreatened,
}

/// Why a candidate is attractive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BenefitTag {
    Flanking,
    SafeGround,
    ChokePoint,
    FinishingBlow,
    FocusFire,
    ReducesThreat,
}

/// Per-criterion breakdown, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreBreakdown {
    pub position: f64,
    pub target: f64,
    pub survival: f64,
    pub teamwork: f64,
    pub style: f64,
}

/// A fully scored candidate turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTurn {
    pub turn: TurnAction,
    pub total: f64,
    pub breakdown: ScoreBreakdown,
    pub risks: Vec<RiskTag>,
    pub benefits: Vec<BenefitTag>,
}

fn clamp(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

/// Score a candidate turn for the given entity and personality
pub fn score_turn(
    turn: &TurnAction,
    entity: &CombatEntity,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
    resolver: &WeaponResolver,
    dice: &mut dyn DiceRoller,
) -> ScoredTurn {
    let mut risks = Vec::new();
    let mut benefits = Vec::new();

    let destination = turn.movement.unwrap_or(entity.position);

    let breakdown = ScoreBreakdown {
        position: position_score(turn, entity, destination, state, profile, ctx, &mut benefits),
        target: target_score(
            turn,
            entity,
            destination,
            state,
            profile,
            ctx,
            resolver,
            &mut risks,
            &mut benefits,
        ),
        survival: survival_score(
            turn,
            entity,
            destination,
            state,
            profile,
            ctx,
            resolver,
            &mut risks,
            &mut benefits,
        ),
        teamwork: teamwork_score(turn, destination, state, profile, ctx, &mut benefits),
        style: style_score(turn, entity, state, profile, ctx),
    };

    let traits = &profile.traits;
    let aggression = traits.aggression as f64 / 100.0;
    let courage = traits.courage as f64 / 100.0;
    let teamwork_trait = traits.teamwork as f64 / 100.0;
    let discipline = traits.discipline as f64 / 100.0;
    let intelligence = traits.intelligence as f64 / 100.0;

    // Trait-shifted blend: aggressive minds chase targets, cowards
    // weigh survival, team players weigh the squad.
    let w_position = 0.20;
    let w_target = 0.15 + 0.20 * aggression;
    let w_survival = 0.15 + 0.20 * (1.0 - courage);
    let w_teamwork = 0.08 + 0.14 * teamwork_trait;
    let w_style = 0.08 + 0.08 * discipline;
    let weight_sum = w_position + w_target + w_survival + w_teamwork + w_style;

    let weighted = (breakdown.position * w_position
        + breakdown.target * w_target
        + breakdown.survival * w_survival
        + breakdown.teamwork * w_teamwork
        + breakdown.style * w_style)
        / weight_sum;

    // Smart entities squeeze a little more out of any plan; sloppy
    // ones wobble. Jitter comes from the injected dice source so runs
    // are reproducible under a fixed seed.
    let insight_bonus = intelligence * 3.0;
    let jitter = (dice.uniform() - 0.5) * (1.0 - discipline) * 10.0;

    let total = (weighted + insight_bonus + jitter).max(0.0);

    ScoredTurn {
        turn: turn.clone(),
        total,
        breakdown,
        risks,
        benefits,
    }
}

fn position_score(
    turn: &TurnAction,
    entity: &CombatEntity,
    destination: GridPos,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
    benefits: &mut Vec<BenefitTag>,
) -> f64 {
    let mut score = 50.0;
    let traits = &profile.traits;

    // Deviation from the preferred engagement distance
    if let Some(nearest) = nearest_enemy_distance_from(destination, entity.id, state) {
        let preferred = profile.style.preferred_range.squares();
        score -= (nearest - preferred).abs() as f64 * 8.0;
    }

    if ctx.spatial.flanking.contains(&destination) {
        score += 10.0 + traits.intelligence as f64 * 0.15;
        benefits.push(BenefitTag::Flanking);
    }
    if ctx.spatial.safe.contains(&destination) {
        // Cover matters most to the fearful
        score += 5.0 + (100 - traits.courage) as f64 * 0.15;
        benefits.push(BenefitTag::SafeGround);
    }
    if ctx.spatial.choke_points.contains(&destination) {
        score += traits.discipline as f64 * 0.10;
        benefits.push(BenefitTag::ChokePoint);
    }

    // Team players should not drift away from their nearest ally
    if traits.teamwork >= 60 {
        if let Some(nearest_ally) = ctx.allies.nearest {
            if let Some(after) = distance_to(destination, nearest_ally.id, state) {
                if after > nearest_ally.distance {
                    score -= traits.teamwork as f64 * 0.20;
                }
            }
        }
    }

    // Mobility alignment
    let moved = turn.movement.is_some();
    match profile.style.mobility {
        MobilityPreference::Static => score += if moved { -10.0 } else { 5.0 },
        MobilityPreference::Mobile => {
            if moved {
                score += 10.0;
            }
        }
        MobilityPreference::Flanking => {
            if moved && ctx.spatial.flanking.contains(&destination) {
                score += 15.0;
            } else if moved {
                score += 5.0;
            }
        }
    }

    clamp(score)
}

#[allow(clippy::too_many_arguments)]
fn target_score(
    turn: &TurnAction,
    entity: &CombatEntity,
    destination: GridPos,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
    resolver: &WeaponResolver,
    risks: &mut Vec<RiskTag>,
    benefits: &mut Vec<BenefitTag>,
) -> f64 {
    let Some(target_id) = turn.attack_target else {
        return 0.0;
    };
    let Some(target) = state.entity(target_id) else {
        return 0.0;
    };
    if target.is_dead {
        return 0.0;
    }

    let distance = destination.distance(&target.position);
    let weapon: Weapon = resolver
        .resolve_best_for_distance(&entity.equipment, distance)
        .cloned()
        .unwrap_or_else(Weapon::unarmed);

    // Hard guard: a target the weapon cannot reach is worth nothing
    if distance > weapon.range {
        return 0.0;
    }

    let mut score = 40.0;
    let traits = &profile.traits;

    let priority_match = match profile.style.target_priority {
        TargetPriority::Weakest => ctx.assessment.weakest == Some(target_id),
        TargetPriority::Strongest => ctx.assessment.strongest == Some(target_id),
        TargetPriority::Closest => ctx.enemies.nearest.map(|n| n.id) == Some(target_id),
        TargetPriority::Dangerous => ctx.assessment.most_dangerous == Some(target_id),
        TargetPriority::Isolated => ctx.assessment.isolated.contains(&target_id),
    };
    if priority_match {
        score += 20.0;
    }

    // Finishing blows end threats outright
    if target.is_critical() {
        score += 15.0;
        benefits.push(BenefitTag::FinishingBlow);
    }

    score += traits.aggression as f64 * 0.20;

    if weapon.is_ranged() && distance <= 1 {
        score -= 20.0;
        risks.push(RiskTag::RangedInMelee);
    }

    // Momentum: riding a run of hits
    if ctx.history.hit_streak > 0 {
        score += (ctx.history.hit_streak as f64 * 5.0).min(15.0);
    }

    clamp(score)
}

#[allow(clippy::too_many_arguments)]
fn survival_score(
    turn: &TurnAction,
    entity: &CombatEntity,
    destination: GridPos,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
    resolver: &WeaponResolver,
    risks: &mut Vec<RiskTag>,
    benefits: &mut Vec<BenefitTag>,
) -> f64 {
    let mut score = 70.0;
    let traits = &profile.traits;

    let threats_after = threat_count_at(destination, entity.id, state, resolver);
    let threats_now = threat_count_at(entity.position, entity.id, state, resolver);

    score -= threats_after as f64 * 12.0;
    // Courage shifts how much exposure bothers the entity
    score += (traits.courage as f64 - 50.0) * 0.30;

    if threats_after >= 2 {
        risks.push(RiskTag::Exposed);
    }

    if ctx.self_status.injured && threats_after < threats_now {
        score += 15.0;
        benefits.push(BenefitTag::ReducesThreat);
    }

    if turn.defend && traits.discipline >= 60 {
        score += 10.0;
    }

    if ctx.self_status.critical && threats_after >= 2 {
        score -= 30.0;
        risks.push(RiskTag::CriticalAndThreatened);
    }

    clamp(score)
}

fn teamwork_score(
    turn: &TurnAction,
    destination: GridPos,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
    benefits: &mut Vec<BenefitTag>,
) -> f64 {
    let traits = &profile.traits;
    // Lone wolves simply do not think about the squad
    if traits.teamwork < 30 {
        return 50.0;
    }

    let mut score = 50.0;

    if let Some(nearest_ally) = ctx.allies.nearest {
        if let Some(after) = distance_to(destination, nearest_ally.id, state) {
            if after <= 2 {
                score += traits.teamwork as f64 * 0.20;
            }
        }
    }

    // Standing next to a hurt ally shields them
    let guarding_injured = ctx.allies.injured.iter().any(|id| {
        distance_to(destination, *id, state).is_some_and(|d| d <= 1)
    });
    if guarding_injured {
        score += 10.0;
    }

    // Focus fire: hit what the squad is already on
    if let Some(target_id) = turn.attack_target {
        if let Some(target) = state.entity(target_id) {
            let allies_on_target = ctx.allies.alive.iter().any(|id| {
                state
                    .entity(*id)
                    .is_some_and(|a| a.position.distance(&target.position) <= 2)
            });
            if allies_on_target {
                score += 15.0;
                benefits.push(BenefitTag::FocusFire);
            }
        }
    }

    // Do not park in an ally's lane to its nearest enemy
    for ally_id in &ctx.allies.alive {
        let Some(ally) = state.entity(*ally_id) else {
            continue;
        };
        let Some(nearest_enemy) = state
            .enemies_of(*ally_id)
            .into_iter()
            .min_by_key(|e| ally.position.distance(&e.position))
        else {
            continue;
        };
        let direct = ally.position.distance(&nearest_enemy.position);
        let through = ally.position.distance(&destination)
            + destination.distance(&nearest_enemy.position);
        if ally.position.distance(&destination) == 1 && through == direct {
            score -= 10.0;
        }
    }

    clamp(score)
}

fn style_score(
    turn: &TurnAction,
    entity: &CombatEntity,
    state: &CombatState,
    profile: &AiProfile,
    ctx: &CombatContext,
) -> f64 {
    let mut score = 50.0;
    let traits = &profile.traits;
    let moved = turn.movement.is_some();

    match profile.style.mobility {
        MobilityPreference::Static => score += if moved { -10.0 } else { 15.0 },
        MobilityPreference::Mobile => {
            if moved {
                score += 15.0;
            }
        }
        MobilityPreference::Flanking => {
            if let Some(dest) = turn.movement {
                score += if ctx.spatial.flanking.contains(&dest) {
                    20.0
                } else {
                    5.0
                };
            }
        }
    }

    if let Some(dest) = turn.movement {
        if let Some(nearest) = nearest_enemy_distance_from(dest, entity.id, state) {
            let preferred = profile.style.preferred_range.squares();
            score -= (nearest - preferred).abs() as f64 * 5.0;
        }
    }

    if turn.defend {
        score += traits.discipline as f64 * 0.15;
    }

    // Composite turns take more planning; smart entities favor them
    if turn.movement.is_some() && turn.attack_target.is_some() {
        score += traits.intelligence as f64 * 0.15;
    }

    clamp(score)
}

/// Distance from a cell to the nearest living enemy of `entity_id`
fn nearest_enemy_distance_from(
    cell: GridPos,
    entity_id: EntityId,
    state: &CombatState,
) -> Option<i32> {
    state
        .enemies_of(entity_id)
        .iter()
        .map(|e| cell.distance(&e.position))
        .min()
}

/// Distance from a cell to a living entity, None if dead or missing
fn distance_to(cell: GridPos, id: EntityId, state: &CombatState) -> Option<i32> {
    state
        .entity(id)
        .filter(|e| e.is_alive())
        .map(|e| cell.distance(&e.position))
}

/// Living enemies whose weapons reach the given cell
fn threat_count_at(
    cell: GridPos,
    entity_id: EntityId,
    state: &CombatState,
    resolver: &WeaponResolver,
) -> usize {
    state
        .enemies_of(entity_id)
        .iter()
        .filter(|e| e.position.distance(&cell) <= resolver.max_threat_range(&e.equipment))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::context::analyze;
    use crate::combat::entity::EntityKind;
    use crate::combat::weapons::{DamageRoll, WeaponCatalog, WeaponCategory};
    use crate::core::types::{Ability, AbilityScores};
    use crate::dice::ScriptedDice;
    use std::sync::Arc;

    fn sword() -> Weapon {
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

    fn bow() -> Weapon {
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

    fn test_resolver() -> WeaponResolver {
        WeaponResolver::new(Arc::new(
            WeaponCatalog::new().with_weapon(sword()).with_weapon(bow()),
        ))
    }

    fn entity_at(name: &str, kind: EntityKind, x: i32, y: i32) -> CombatEntity {
        CombatEntity::new(
            name,
            kind,
            1,
            20,
            12,
            6,
            AbilityScores::default(),
            GridPos::new(x, y),
        )
    }

    fn simple_state() -> (CombatState, EntityId, EntityId) {
        let mut state = CombatState::new();
        let attacker = entity_at("A", EntityKind::Enemy, 0, 0)
            .with_equipment(vec!["shortsword".to_string()]);
        let target = entity_at("T", EntityKind::Player, 1, 0);
        let attacker_id = attacker.id;
        let target_id = target.id;
        state.entities.push(attacker);
        state.entities.push(target);
        (state, attacker_id, target_id)
    }

    #[test]
    fn test_out_of_range_target_scores_zero() {
        let mut state = CombatState::new();
        let attacker = entity_at("A", EntityKind::Enemy, 0, 0)
            .with_equipment(vec!["shortsword".to_string()]);
        let target = entity_at("T", EntityKind::Player, 10, 0);
        let attacker_id = attacker.id;
        let target_id = target.id;
        state.entities.push(attacker);
        state.entities.push(target);

        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let profile = AiProfile::default();
        let mut dice = ScriptedDice::default();

        // Sword range 1; target at 10
        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let scored = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        assert_eq!(scored.breakdown.target, 0.0);
    }

    #[test]
    fn test_in_range_target_scores_positive() {
        let (state, attacker_id, target_id) = simple_state();
        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let profile = AiProfile::default();
        let mut dice = ScriptedDice::default();

        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let scored = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        assert!(scored.breakdown.target > 0.0);
    }

    #[test]
    fn test_finishing_blow_tagged() {
        let (mut state, attacker_id, target_id) = simple_state();
        state.entity_mut(target_id).expect("target").hit_points = 3;

        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let profile = AiProfile::default();
        let mut dice = ScriptedDice::default();

        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let scored = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        assert!(scored.benefits.contains(&BenefitTag::FinishingBlow));
    }

    #[test]
    fn test_ranged_in_melee_penalized() {
        let (mut state, attacker_id, target_id) = simple_state();
        {
            let attacker = state.entity_mut(attacker_id).expect("attacker");
            attacker.equipment = vec!["shortbow".to_string()];
        }

        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let profile = AiProfile::default();
        let mut dice = ScriptedDice::default();

        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let scored = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        assert!(scored.risks.contains(&RiskTag::RangedInMelee));
    }

    #[test]
    fn test_aggression_raises_target_weight() {
        let (state, attacker_id, target_id) = simple_state();
        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();

        let mut meek = AiProfile::default();
        meek.traits.aggression = 10;
        meek.traits.discipline = 100; // No jitter
        let mut fierce = AiProfile::default();
        fierce.traits.aggression = 100;
        fierce.traits.discipline = 100;

        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let mut dice = ScriptedDice::default();
        let meek_score = score_turn(&turn, &entity, &state, &meek, &ctx, &resolver, &mut dice);
        let mut dice = ScriptedDice::default();
        let fierce_score =
            score_turn(&turn, &entity, &state, &fierce, &ctx, &resolver, &mut dice);

        assert!(fierce_score.total > meek_score.total);
    }

    #[test]
    fn test_jitter_deterministic_under_seed() {
        let (state, attacker_id, target_id) = simple_state();
        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let mut profile = AiProfile::default();
        profile.traits.discipline = 0; // Maximum jitter

        let turn = TurnAction::new(attacker_id).with_attack(target_id);
        let mut dice_a = crate::dice::SeededDice::new(99);
        let mut dice_b = crate::dice::SeededDice::new(99);
        let a = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice_a);
        let b = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice_b);
        assert_eq!(a.total, b.total);
    }

    #[test]
    fn test_low_teamwork_is_neutral() {
        let (state, attacker_id, _) = simple_state();
        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let mut profile = AiProfile::default();
        profile.traits.teamwork = 10;

        let turn = TurnAction::new(attacker_id);
        let mut dice = ScriptedDice::default();
        let scored = score_turn(&turn, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        assert_eq!(scored.breakdown.teamwork, 50.0);
    }

    #[test]
    fn test_static_style_prefers_standing_still() {
        let (state, attacker_id, _) = simple_state();
        let resolver = test_resolver();
        let ctx = analyze(attacker_id, &state, &resolver).expect("Should analyze");
        let entity = state.entity(attacker_id).expect("entity").clone();
        let mut profile = AiProfile::default();
        profile.style.mobility = MobilityPreference::Static;
        profile.traits.discipline = 100;

        let stay = TurnAction::new(attacker_id);
        let go = TurnAction::new(attacker_id).with_movement(GridPos::new(0, 2));
        let mut dice = ScriptedDice::default();
        let stay_scored =
            score_turn(&stay, &entity, &state, &profile, &ctx, &resolver, &mut dice);
        let mut dice = ScriptedDice::default();
        let go_scored = score_turn(&go, &entity, &state, &profile, &ctx, &resolver, &mut dice);

        assert!(stay_scored.breakdown.style > go_scored.breakdown.style);
    }
}
