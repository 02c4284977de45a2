//! Tactical context analysis
//!
//! [`analyze`] turns one entity's view of a combat snapshot into a
//! [`CombatContext`]: group aggregates, a tactical summary, spatial
//! option sets, and a short history window. The context is recomputed
//! fresh for every AI decision and never persisted.

use crate::combat::entity::CombatEntity;
use crate::combat::event::CombatEvent;
use crate::combat::state::CombatState;
use crate::combat::weapons::WeaponResolver;
use crate::core::types::{EntityId, GridPos};
use serde::{Deserialize, Serialize};

/// How many recent relevant events feed the history window
const HISTORY_WINDOW: usize = 10;

/// Squares within which a same-side member counts as support
const ISOLATION_RADIUS: i32 = 3;

/// Damage-per-combatant buckets for battle intensity
const INTENSITY_MEDIUM_FLOOR: f64 = 3.0;
const INTENSITY_HIGH_FLOOR: f64 = 8.0;

/// The deciding entity's own condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfStatus {
    pub health_percent: f64,
    pub injured: bool,
    pub critical: bool,
    pub has_action: bool,
    pub movement_feet: i32,
    pub position: GridPos,
}

/// Nearest member of a group, by Chebyshev distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearestMember {
    pub id: EntityId,
    pub distance: i32,
}

/// Aggregate view of one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GroupStatus {
    pub total: usize,
    pub alive: Vec<EntityId>,
    pub dead: Vec<EntityId>,
    pub injured: Vec<EntityId>,
    pub average_health_percent: f64,
    pub nearest: Option<NearestMember>,
}

/// Per-enemy standout picks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnemyAssessment {
    /// Lowest current HP among living enemies
    pub weakest: Option<EntityId>,
    /// Highest current HP among living enemies
    pub strongest: Option<EntityId>,
    /// Highest level*10 + current HP composite
    pub most_dangerous: Option<EntityId>,
    /// Enemies with no living same-side support within 3 squares
    pub isolated: Vec<EntityId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleIntensity {
    Low,
    Medium,
    High,
}

/// Situation-level flags and heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalSummary {
    pub outnumbered: bool,
    /// Living enemies per living friendly (self included)
    pub outnumber_ratio: f64,
    /// Allied HP pool exceeds 1.5x the enemy pool
    pub winning: bool,
    /// Self and every living ally below 25% health
    pub desperate: bool,
    pub ranged_advantage: bool,
    pub melee_advantage: bool,
    pub mean_enemy_distance: f64,
    pub intensity: BattleIntensity,
    /// 100/70/40/10 bucket from average pairwise ally spacing
    pub formation_integrity: u8,
}

/// Movement option sets, all subsets of the reachable cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SpatialOptions {
    pub reachable: Vec<GridPos>,
    /// Cells from which the entity's own weapon threatens >= 1 enemy
    pub optimal_range: Vec<GridPos>,
    /// Cells threatened by zero enemies
    pub safe: Vec<GridPos>,
    /// Cells adjacent to an enemy with an ally directly opposite
    pub flanking: Vec<GridPos>,
    /// Cells with at most 2 free neighbors
    pub choke_points: Vec<GridPos>,
    /// Cells strictly farther from the enemy centroid than here
    pub escape_routes: Vec<GridPos>,
}

/// Rolling combat history extracted from the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecentHistory {
    pub damage_dealt_last_turn: i32,
    pub damage_taken_last_turn: i32,
    /// Positive run of hits, negative run of misses
    pub hit_streak: i32,
    pub allies_lost: u32,
    pub enemies_killed: u32,
}

/// Everything the scorer and tactician need to know about the fight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatContext {
    pub entity: EntityId,
    pub self_status: SelfStatus,
    pub allies: GroupStatus,
    pub enemies: GroupStatus,
    pub assessment: EnemyAssessment,
    pub summary: TacticalSummary,
    pub spatial: SpatialOptions,
    pub history: RecentHistory,
}

/// Build a fresh tactical context for one entity
///
/// Returns None when the entity is not in the roster.
pub fn analyze(
    entity_id: EntityId,
    state: &CombatState,
    resolver: &WeaponResolver,
) -> Option<CombatContext> {
    let entity = state.entity(entity_id)?;

    let allies: Vec<&CombatEntity> = state
        .entities
        .iter()
        .filter(|e| e.id != entity_id && e.kind.is_allied_with(entity.kind))
        .collect();
    let enemies: Vec<&CombatEntity> = state
        .entities
        .iter()
        .filter(|e| e.kind.is_hostile_to(entity.kind))
        .collect();

    let self_status = SelfStatus {
        health_percent: entity.health_percent(),
        injured: entity.is_injured(),
        critical: entity.is_critical(),
        has_action: entity.budget.action,
        movement_feet: entity.budget.movement_feet,
        position: entity.position,
    };

    let ally_group = group_status(entity.position, &allies);
    let enemy_group = group_status(entity.position, &enemies);
    let assessment = assess_enemies(&enemies);
    let summary = tactical_summary(entity, &allies, &enemies, state, resolver);
    let spatial = spatial_options(entity, &allies, &enemies, state, resolver);
    let history = recent_history(entity, state);

    Some(CombatContext {
        entity: entity_id,
        self_status,
        allies: ally_group,
        enemies: enemy_group,
        assessment,
        summary,
        spatial,
        history,
    })
}

fn group_status(from: GridPos, members: &[&CombatEntity]) -> GroupStatus {
    let alive: Vec<EntityId> = members
        .iter()
        .filter(|e| e.is_alive())
        .map(|e| e.id)
        .collect();
    let dead: Vec<EntityId> = members
        .iter()
        .filter(|e| e.is_dead)
        .map(|e| e.id)
        .collect();
    let injured: Vec<EntityId> = members
        .iter()
        .filter(|e| e.is_alive() && e.is_injured())
        .map(|e| e.id)
        .collect();

    let living: Vec<&&CombatEntity> = members.iter().filter(|e| e.is_alive()).collect();
    let average_health_percent = if living.is_empty() {
        0.0
    } else {
        living.iter().map(|e| e.health_percent()).sum::<f64>() / living.len() as f64
    };

    let nearest = living
        .iter()
        .map(|e| NearestMember {
            id: e.id,
            distance: from.distance(&e.position),
        })
        .min_by_key(|n| n.distance);

    GroupStatus {
        total: members.len(),
        alive,
        dead,
        injured,
        average_health_percent,
        nearest,
    }
}

fn assess_enemies(enemies: &[&CombatEntity]) -> EnemyAssessment {
    let living: Vec<&&CombatEntity> = enemies.iter().filter(|e| e.is_alive()).collect();

    let weakest = living.iter().min_by_key(|e| e.hit_points).map(|e| e.id);
    let strongest = living.iter().max_by_key(|e| e.hit_points).map(|e| e.id);
    let most_dangerous = living
        .iter()
        .max_by_key(|e| e.level as i32 * 10 + e.hit_points)
        .map(|e| e.id);

    // An enemy is isolated when none of its own side stands within
    // supporting distance.
    let isolated = living
        .iter()
        .filter(|e| {
            !living
                .iter()
                .any(|o| o.id != e.id && o.position.distance(&e.position) <= ISOLATION_RADIUS)
        })
        .map(|e| e.id)
        .collect();

    EnemyAssessment {
        weakest,
        strongest,
        most_dangerous,
        isolated,
    }
}

fn tactical_summary(
    entity: &CombatEntity,
    allies: &[&CombatEntity],
    enemies: &[&CombatEntity],
    state: &CombatState,
    resolver: &WeaponResolver,
) -> TacticalSummary {
    let living_allies: Vec<&&CombatEntity> = allies.iter().filter(|e| e.is_alive()).collect();
    let living_enemies: Vec<&&CombatEntity> = enemies.iter().filter(|e| e.is_alive()).collect();

    let friendly_count = 1 + living_allies.len();
    let outnumber_ratio = living_enemies.len() as f64 / friendly_count as f64;
    let outnumbered = living_enemies.len() > friendly_count;

    let allied_hp: i32 =
        entity.hit_points + living_allies.iter().map(|e| e.hit_points).sum::<i32>();
    let enemy_hp: i32 = living_enemies.iter().map(|e| e.hit_points).sum();
    let winning = allied_hp as f64 > 1.5 * enemy_hp as f64;

    let desperate = entity.is_critical() && living_allies.iter().all(|e| e.is_critical());

    let own_ranged = ranged_count(entity, &living_allies, resolver);
    let enemy_ranged = living_enemies
        .iter()
        .filter(|e| has_ranged_weapon(e, resolver))
        .count();
    let ranged_advantage = own_ranged > enemy_ranged;

    let own_strength: u32 = std::iter::once(entity)
        .chain(living_allies.iter().copied().copied())
        .map(|e| e.abilities.strength as u32)
        .sum();
    let enemy_strength: u32 = living_enemies
        .iter()
        .map(|e| e.abilities.strength as u32)
        .sum();
    let melee_advantage = own_strength > enemy_strength;

    let mean_enemy_distance = if living_enemies.is_empty() {
        0.0
    } else {
        living_enemies
            .iter()
            .map(|e| entity.position.distance(&e.position) as f64)
            .sum::<f64>()
            / living_enemies.len() as f64
    };

    let intensity = battle_intensity(state);
    let formation_integrity = formation_integrity(entity, &living_allies);

    TacticalSummary {
        outnumbered,
        outnumber_ratio,
        winning,
        desperate,
        ranged_advantage,
        melee_advantage,
        mean_enemy_distance,
        intensity,
        formation_integrity,
    }
}

fn has_ranged_weapon(entity: &CombatEntity, resolver: &WeaponResolver) -> bool {
    entity
        .equipment
        .iter()
        .filter_map(|id| resolver.get(id))
        .any(|w| w.is_ranged())
}

fn ranged_count(
    entity: &CombatEntity,
    allies: &[&&CombatEntity],
    resolver: &WeaponResolver,
) -> usize {
    let own = usize::from(has_ranged_weapon(entity, resolver));
    own + allies
        .iter()
        .filter(|e| has_ranged_weapon(e, resolver))
        .count()
}

/// Average pairwise spacing across self + living allies, bucketed
fn formation_integrity(entity: &CombatEntity, allies: &[&&CombatEntity]) -> u8 {
    let positions: Vec<GridPos> = std::iter::once(entity.position)
        .chain(allies.iter().map(|e| e.position))
        .collect();
    if positions.len() < 2 {
        return 100;
    }

    let mut total = 0i64;
    let mut pairs = 0i64;
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            total += positions[i].distance(&positions[j]) as i64;
            pairs += 1;
        }
    }
    let average = total as f64 / pairs as f64;

    if average <= 3.0 {
        100
    } else if average <= 5.0 {
        70
    } else if average <= 7.0 {
        40
    } else {
        10
    }
}

fn battle_intensity(state: &CombatState) -> BattleIntensity {
    let recent_damage: i32 = state
        .events
        .iter()
        .rev()
        .filter(|e| e.is_combat_relevant())
        .take(HISTORY_WINDOW)
        .map(|e| match e {
            CombatEvent::AttackHit { damage, .. } => *damage,
            _ => 0,
        })
        .sum();

    let living = state.entities.iter().filter(|e| e.is_alive()).count().max(1);
    let per_combatant = recent_damage as f64 / living as f64;

    if per_combatant < INTENSITY_MEDIUM_FLOOR {
        BattleIntensity::Low
    } else if per_combatant < INTENSITY_HIGH_FLOOR {
        BattleIntensity::Medium
    } else {
        BattleIntensity::High
    }
}

fn spatial_options(
    entity: &CombatEntity,
    allies: &[&CombatEntity],
    enemies: &[&CombatEntity],
    state: &CombatState,
    resolver: &WeaponResolver,
) -> SpatialOptions {
    let reachable = state.reachable_cells(entity.id);
    let living_enemies: Vec<&&CombatEntity> = enemies.iter().filter(|e| e.is_alive()).collect();
    let living_allies: Vec<&&CombatEntity> = allies.iter().filter(|e| e.is_alive()).collect();

    let own_range = resolver.max_threat_range(&entity.equipment);

    let optimal_range: Vec<GridPos> = reachable
        .iter()
        .copied()
        .filter(|cell| {
            living_enemies
                .iter()
                .any(|e| cell.distance(&e.position) <= own_range)
        })
        .collect();

    let safe: Vec<GridPos> = reachable
        .iter()
        .copied()
        .filter(|cell| {
            !living_enemies.iter().any(|e| {
                cell.distance(&e.position) <= resolver.max_threat_range(&e.equipment)
            })
        })
        .collect();

    let flanking: Vec<GridPos> = reachable
        .iter()
        .copied()
        .filter(|cell| {
            living_enemies.iter().any(|e| {
                cell.distance(&e.position) == 1
                    && living_allies
                        .iter()
                        .any(|a| a.position == cell.opposite_across(&e.position))
            })
        })
        .collect();

    let choke_points: Vec<GridPos> = reachable
        .iter()
        .copied()
        .filter(|cell| {
            let free = cell
                .neighbors()
                .iter()
                .filter(|n| !state.is_occupied(**n, Some(entity.id)))
                .count();
            free <= 2
        })
        .collect();

    let escape_routes = if living_enemies.is_empty() {
        Vec::new()
    } else {
        let cx = living_enemies
            .iter()
            .map(|e| e.position.x as f64)
            .sum::<f64>()
            / living_enemies.len() as f64;
        let cy = living_enemies
            .iter()
            .map(|e| e.position.y as f64)
            .sum::<f64>()
            / living_enemies.len() as f64;
        let here = entity.position.distance_to_point(cx, cy);
        reachable
            .iter()
            .copied()
            .filter(|cell| cell.distance_to_point(cx, cy) > here)
            .collect()
    };

    SpatialOptions {
        reachable,
        optimal_range,
        safe,
        flanking,
        choke_points,
        escape_routes,
    }
}

fn recent_history(entity: &CombatEntity, state: &CombatState) -> RecentHistory {
    let window: Vec<&CombatEvent> = state
        .events
        .iter()
        .rev()
        .filter(|e| e.is_combat_relevant())
        .take(HISTORY_WINDOW)
        .collect();

    let mut damage_dealt = 0;
    let mut damage_taken = 0;
    for event in &window {
        if let CombatEvent::AttackHit {
            attacker,
            target,
            damage,
            ..
        } = event
        {
            if *attacker == entity.id {
                damage_dealt += damage;
            }
            if *target == entity.id {
                damage_taken += damage;
            }
        }
    }

    // Newest-first run of this entity's hits (+) or misses (-)
    let mut hit_streak = 0;
    for event in &window {
        match event {
            CombatEvent::AttackHit { attacker, .. } if *attacker == entity.id => {
                if hit_streak < 0 {
                    break;
                }
                hit_streak += 1;
            }
            CombatEvent::AttackMissed { attacker, .. } if *attacker == entity.id => {
                if hit_streak > 0 {
                    break;
                }
                hit_streak -= 1;
            }
            _ => {}
        }
    }

    let mut allies_lost = 0;
    let mut enemies_killed = 0;
    for event in &state.events {
        if let CombatEvent::Defeated { entity: fallen, .. } = event {
            if let Some(e) = state.entity(*fallen) {
                if e.id == entity.id {
                    continue;
                }
                if e.kind.is_allied_with(entity.kind) {
                    allies_lost += 1;
                } else {
                    enemies_killed += 1;
                }
            }
        }
    }

    RecentHistory {
        damage_dealt_last_turn: damage_dealt,
        damage_taken_last_turn: damage_taken,
        hit_streak,
        allies_lost,
        enemies_killed,
    }
}
