//! Turn decision pipeline
//!
//! [`Tactician`] produces a complete [`TurnAction`] for one entity:
//! analyze the battle, check threshold overrides (flee, rage, panic),
//! enumerate candidate turns, score them, and pick one according to
//! the entity's intelligence. All randomness flows through the
//! injected dice source, so a fixed seed replays the same decisions.

use crate::ai::context::{analyze, BattleIntensity, CombatContext};
use crate::ai::profile::{AiProfile, MobilityPreference, ModifierResponse, TargetPriority};
use crate::ai::scoring::{score_turn, ScoredTurn};
use crate::combat::action::TurnAction;
use crate::combat::entity::CombatEntity;
use crate::combat::state::CombatState;
use crate::combat::weapons::{Weapon, WeaponResolver};
use crate::core::types::{EntityId, GridPos};
use crate::dice::DiceRoller;
use tracing::{debug, warn};

/// Hard cap on scored candidates per decision
const MAX_CANDIDATES: usize = 20;

/// Stay-in-place attack candidates
const MAX_STATIONARY_ATTACKS: usize = 3;

/// Repositioning cells considered for move-then-attack
const MAX_ATTACK_CELLS: usize = 10;

/// Targets paired with each repositioning cell
const MAX_TARGETS_PER_CELL: usize = 2;

/// Pure repositioning candidates
const MAX_MOVE_ONLY: usize = 5;

/// Decides turns for AI-controlled entities
pub struct Tactician {
    resolver: WeaponResolver,
}

impl Tactician {
    pub fn new(resolver: WeaponResolver) -> Self {
        Self { resolver }
    }

    /// Produce the best turn for the entity under the given profile
    ///
    /// Unknown or dead entities get a no-op turn.
    pub fn calculate_optimal_turn(
        &self,
        entity_id: EntityId,
        state: &CombatState,
        profile: &AiProfile,
        dice: &mut dyn DiceRoller,
    ) -> TurnAction {
        let Some(ctx) = analyze(entity_id, state, &self.resolver) else {
            warn!("AI decision requested for unknown entity {:?}", entity_id);
            return TurnAction::no_op(entity_id);
        };
        let Some(entity) = state.entity(entity_id).filter(|e| e.is_alive()) else {
            warn!("AI decision requested for dead entity {:?}", entity_id);
            return TurnAction::no_op(entity_id);
        };

        if let Some(turn) = self.threshold_override(entity, state, profile, &ctx) {
            debug!(
                "{} ({}): threshold override fired",
                entity.name, profile.name
            );
            return turn;
        }

        let candidates = self.enumerate_candidates(entity, state, profile, &ctx);
        if candidates.is_empty() {
            debug!("{}: no viable candidates, passing", entity.name);
            return TurnAction::no_op(entity_id);
        }

        let mut scored: Vec<ScoredTurn> = candidates
            .iter()
            .map(|turn| score_turn(turn, entity, state, profile, &ctx, &self.resolver, dice))
            .collect();
        scored.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

        let chosen = select_by_intelligence(&scored, profile, dice);
        debug!(
            "{} ({}): picked turn scoring {:.1} from {} candidates",
            entity.name,
            profile.name,
            chosen.total,
            scored.len()
        );
        chosen.turn.clone()
    }

    /// Flee, rage, and panic checks, in that order
    fn threshold_override(
        &self,
        entity: &CombatEntity,
        state: &CombatState,
        profile: &AiProfile,
        ctx: &CombatContext,
    ) -> Option<TurnAction> {
        let health = ctx.self_status.health_percent;
        let thresholds = &profile.thresholds;

        // Flee: wounded cowards run for the cell farthest from danger
        if thresholds.flee_health_percent > 0
            && health <= thresholds.flee_health_percent as f64
            && profile.traits.courage < 50
        {
            if let Some(route) = best_escape_cell(&ctx.spatial.escape_routes, entity, state) {
                return Some(TurnAction::new(entity.id).with_movement(route));
            }
        }

        // Rage: wounded berserkers close to contact and swing
        if thresholds.rage_health_percent > 0
            && health <= thresholds.rage_health_percent as f64
            && profile.traits.aggression > 70
        {
            if let Some(turn) = self.rage_charge(entity, state, ctx) {
                return Some(turn);
            }
            // No way to reach anyone; fall through to normal scoring
        }

        // Panic: too many allies down for a retreat-minded profile
        if ctx.allies.dead.len() as u32 >= thresholds.panic_allies_down
            && profile.modifiers.on_ally_down == Some(ModifierResponse::Retreat)
        {
            if let Some(route) = best_escape_cell(&ctx.spatial.escape_routes, entity, state) {
                return Some(TurnAction::new(entity.id).with_movement(route));
            }
        }

        None
    }

    /// Close with the nearest enemy and attack it
    fn rage_charge(
        &self,
        entity: &CombatEntity,
        state: &CombatState,
        ctx: &CombatContext,
    ) -> Option<TurnAction> {
        let nearest = ctx.enemies.nearest?;
        let target = state.entity(nearest.id)?;

        if entity.position.distance(&target.position) <= 1 {
            return Some(TurnAction::new(entity.id).with_attack(nearest.id));
        }

        let charge_cell = ctx
            .spatial
            .reachable
            .iter()
            .copied()
            .filter(|cell| cell.distance(&target.position) <= 1)
            .min_by_key(|cell| entity.position.distance(cell))?;

        Some(
            TurnAction::new(entity.id)
                .with_movement(charge_cell)
                .with_attack(nearest.id),
        )
    }

    fn enumerate_candidates(
        &self,
        entity: &CombatEntity,
        state: &CombatState,
        profile: &AiProfile,
        ctx: &CombatContext,
    ) -> Vec<TurnAction> {
        let mut candidates = Vec::new();
        let enemies = prioritized_targets(profile, ctx);

        // Attack without moving
        if ctx.self_status.has_action {
            let in_place: Vec<EntityId> = enemies
                .iter()
                .copied()
                .filter(|id| self.can_attack_from(entity.position, *id, entity, state))
                .take(MAX_STATIONARY_ATTACKS)
                .collect();
            for target in in_place {
                candidates.push(TurnAction::new(entity.id).with_attack(target));
            }
        }

        // Move then attack
        if ctx.self_status.has_action {
            let cells = preferred_cells(profile, state, entity, ctx, MAX_ATTACK_CELLS);
            for cell in cells {
                let mut paired = 0;
                for target in &enemies {
                    if paired >= MAX_TARGETS_PER_CELL {
                        break;
                    }
                    if self.can_attack_from(cell, *target, entity, state) {
                        candidates.push(
                            TurnAction::new(entity.id)
                                .with_movement(cell)
                                .with_attack(*target),
                        );
                        paired += 1;
                    }
                }
                if candidates.len() >= MAX_CANDIDATES {
                    break;
                }
            }
        }

        // Pure repositioning toward optimal or flanking ground
        let move_pool: Vec<GridPos> = match profile.style.mobility {
            MobilityPreference::Flanking if !ctx.spatial.flanking.is_empty() => {
                ctx.spatial.flanking.clone()
            }
            _ if !ctx.spatial.optimal_range.is_empty() => ctx.spatial.optimal_range.clone(),
            _ => ctx.spatial.reachable.clone(),
        };
        for cell in move_pool.into_iter().take(MAX_MOVE_ONLY) {
            candidates.push(TurnAction::new(entity.id).with_movement(cell));
        }

        // Holding ground is only a style, never a reflex
        if ctx.self_status.has_action
            && profile.traits.discipline > 60
            && ctx.summary.intensity == BattleIntensity::High
        {
            candidates.push(TurnAction::new(entity.id).with_defend());
        }

        candidates.truncate(MAX_CANDIDATES);
        candidates
    }

    /// Whether some equipped (or unarmed) weapon reaches the target
    fn can_attack_from(
        &self,
        from: GridPos,
        target_id: EntityId,
        entity: &CombatEntity,
        state: &CombatState,
    ) -> bool {
        let Some(target) = state.entity(target_id).filter(|e| e.is_alive()) else {
            return false;
        };
        let distance = from.distance(&target.position);
        let reach = self
            .resolver
            .resolve_best_for_distance(&entity.equipment, distance)
            .map(|w| w.range)
            .unwrap_or_else(|| Weapon::unarmed().range);
        distance <= reach
    }
}

/// Escape cell maximizing the distance to the closest living enemy
fn best_escape_cell(
    routes: &[GridPos],
    entity: &CombatEntity,
    state: &CombatState,
) -> Option<GridPos> {
    let enemies = state.enemies_of(entity.id);
    if enemies.is_empty() {
        return None;
    }
    routes.iter().copied().max_by_key(|cell| {
        enemies
            .iter()
            .map(|e| cell.distance(&e.position))
            .min()
            .unwrap_or(0)
    })
}

/// Living enemies ordered by the profile's target priority
fn prioritized_targets(profile: &AiProfile, ctx: &CombatContext) -> Vec<EntityId> {
    let mut targets = ctx.enemies.alive.clone();
    let front: Option<EntityId> = match profile.style.target_priority {
        TargetPriority::Weakest => ctx.assessment.weakest,
        TargetPriority::Strongest => ctx.assessment.strongest,
        TargetPriority::Closest => ctx.enemies.nearest.map(|n| n.id),
        TargetPriority::Dangerous => ctx.assessment.most_dangerous,
        TargetPriority::Isolated => ctx.assessment.isolated.first().copied(),
    };
    if let Some(id) = front {
        if let Some(pos) = targets.iter().position(|t| *t == id) {
            targets.swap(0, pos);
        }
    }
    targets
}

/// Reachable cells ranked by fit for the profile
fn preferred_cells(
    profile: &AiProfile,
    state: &CombatState,
    entity: &CombatEntity,
    ctx: &CombatContext,
    limit: usize,
) -> Vec<GridPos> {
    let mut cells = ctx.spatial.reachable.clone();
    let preferred = profile.style.preferred_range.squares();
    let enemies = state.enemies_of(entity.id);

    // Rank by deviation from the preferred engagement distance, with
    // cover and flanking as personality-weighted tiebreak bonuses.
    cells.sort_by_key(|cell| {
        let range_penalty = enemies
            .iter()
            .map(|e| cell.distance(&e.position))
            .min()
            .map(|nearest| (nearest - preferred).abs() * 10)
            .unwrap_or(0);
        let mut bonus = 0;
        if ctx.spatial.safe.contains(cell) {
            bonus += (100 - profile.traits.courage as i32) / 20;
        }
        if ctx.spatial.flanking.contains(cell) {
            bonus += profile.traits.intelligence as i32 / 20;
        }
        range_penalty - bonus
    });
    cells.truncate(limit);
    cells
}

/// Pick from the sorted list according to intelligence banding
fn select_by_intelligence<'a>(
    scored: &'a [ScoredTurn],
    profile: &AiProfile,
    dice: &mut dyn DiceRoller,
) -> &'a ScoredTurn {
    let intelligence = profile.traits.intelligence;
    let pool = if intelligence > 80 {
        1
    } else if intelligence > 40 {
        3
    } else {
        5
    }
    .min(scored.len());

    if pool == 1 {
        return &scored[0];
    }
    let index = ((dice.uniform() * pool as f64) as usize).min(pool - 1);
    &scored[index]
}
