//! Combat state machine
//!
//! [`CombatEngine`] is an immutable value type: every transition
//! returns a new engine holding a fresh state snapshot. Invalid
//! operations during play (acting out of turn, dead targets, unknown
//! weapons, over-budget moves) are logged and leave the state
//! untouched; only broken content (malformed dice, out-of-domain
//! ability scores) produces an `Err`.

use crate::combat::action::{CombatAction, TurnAction};
use crate::combat::entity::{CombatEntity, EntityKind, FEET_PER_SQUARE};
use crate::combat::event::CombatEvent;
use crate::combat::state::{CombatPhase, CombatState};
use crate::combat::weapons::{Weapon, WeaponResolver};
use crate::core::error::Result;
use crate::core::types::{EntityId, GridPos};
use crate::dice::DiceRoller;

/// Resource-gated action classes an entity can still take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Attack,
    Move,
    Ability,
    Defend,
}

#[derive(Debug, Clone)]
pub struct CombatEngine {
    state: CombatState,
    resolver: WeaponResolver,
}

impl CombatEngine {
    /// Empty engine in the setup phase
    pub fn new(resolver: WeaponResolver) -> Self {
        Self {
            state: CombatState::new(),
            resolver,
        }
    }

    pub fn state(&self) -> &CombatState {
        &self.state
    }

    pub fn resolver(&self) -> &WeaponResolver {
        &self.resolver
    }

    pub fn current_entity(&self) -> Option<&CombatEntity> {
        self.state.current_entity()
    }

    pub fn entity(&self, id: EntityId) -> Option<&CombatEntity> {
        self.state.entity(id)
    }

    pub fn enemies_of(&self, id: EntityId) -> Vec<&CombatEntity> {
        self.state.enemies_of(id)
    }

    pub fn is_ended(&self) -> bool {
        self.state.is_ended()
    }

    pub fn reachable_cells(&self, id: EntityId) -> Vec<GridPos> {
        self.state.reachable_cells(id)
    }

    /// Append an entity to the roster
    ///
    /// Entities are meant to arrive during setup; adding one
    /// mid-combat is tolerated but logged.
    pub fn with_added_entity(&self, entity: CombatEntity) -> Result<Self> {
        entity.validate()?;
        if self.state.phase != CombatPhase::Setup {
            tracing::warn!(
                "Entity {} added outside setup phase ({:?})",
                entity.name,
                self.state.phase
            );
        }
        let mut next = self.clone();
        next.state.entities.push(entity);
        Ok(next)
    }

    /// Roll initiative for every entity and begin combat
    ///
    /// 1d20 + dexterity modifier each, sorted descending, ties broken
    /// by raw dexterity modifier descending.
    pub fn with_rolled_initiative(&self, dice: &mut dyn DiceRoller) -> Result<Self> {
        let mut next = self.clone();

        for entity in &mut next.state.entities {
            let roll = dice.roll_dice(1, 20)?;
            let dex = entity.abilities.modifier(crate::core::types::Ability::Dexterity);
            entity.initiative = roll + dex;
            next.state.events.push(CombatEvent::InitiativeRolled {
                entity: entity.id,
                name: entity.name.clone(),
                roll,
                total: roll + dex,
            });
        }

        next.state.entities.sort_by(|a, b| {
            b.initiative.cmp(&a.initiative).then_with(|| {
                b.abilities
                    .modifier(crate::core::types::Ability::Dexterity)
                    .cmp(&a.abilities.modifier(crate::core::types::Ability::Dexterity))
            })
        });

        next.state.current_turn_index = 0;
        next.state.round = 1;
        next.state.phase = CombatPhase::Active;
        next.state.push_event(CombatEvent::CombatStarted {
            combatants: next.state.entities.len(),
        });
        next.state.push_event(CombatEvent::RoundStarted { round: 1 });
        if let Some(first) = next.state.entities.first() {
            let event = CombatEvent::TurnStarted {
                entity: first.id,
                name: first.name.clone(),
                round: 1,
            };
            next.state.push_event(event);
        }
        Ok(next)
    }

    /// Apply a single legacy action for the current entity
    pub fn with_applied_action(
        &self,
        action: &CombatAction,
        dice: &mut dyn DiceRoller,
    ) -> Result<Self> {
        let mut next = self.clone();
        if !next.is_actors_turn(action.actor()) {
            return Ok(next);
        }
        match action {
            CombatAction::Move { entity, to } => {
                next.apply_move(*entity, *to);
            }
            CombatAction::Attack { attacker, target } => {
                next.apply_attack(*attacker, *target, dice)?;
            }
        }
        Ok(next)
    }

    /// Execute a full turn bundle for the current entity
    ///
    /// Phases resolve in fixed order (movement, attack, ability,
    /// defend), each gated on its own resource. A phase that fails its
    /// gate is skipped with a warning; the rest still resolve.
    pub fn with_executed_turn(
        &self,
        turn: &TurnAction,
        dice: &mut dyn DiceRoller,
    ) -> Result<Self> {
        let mut next = self.clone();
        if !next.is_actors_turn(turn.entity) {
            return Ok(next);
        }

        if let Some(to) = turn.movement {
            next.apply_move(turn.entity, to);
        }

        if let Some(target) = turn.attack_target {
            if !next.state.is_ended() {
                next.apply_attack(turn.entity, target, dice)?;
            }
        }

        if let Some(ability) = &turn.ability {
            // Special abilities are a content hook that has not been
            // wired to a resolution path yet.
            tracing::warn!("Ability '{}' requested but ability resolution is not implemented", ability);
        }

        if turn.defend && !next.state.is_ended() {
            next.apply_defend(turn.entity);
        }

        Ok(next)
    }

    /// Move to the next entity in initiative order
    ///
    /// Wrapping past the end starts a new round and refreshes every
    /// living entity's action budget. The end condition is re-checked
    /// after every advance.
    pub fn with_advanced_turn(&self) -> Self {
        let mut next = self.clone();
        if next.state.phase != CombatPhase::Active {
            tracing::warn!("Turn advance ignored: combat is not active");
            return next;
        }

        next.state.current_turn_index += 1;
        if next.state.current_turn_index >= next.state.entities.len() {
            next.state.current_turn_index = 0;
            next.state.round += 1;
            let round = next.state.round;
            for entity in &mut next.state.entities {
                if entity.is_alive() {
                    entity.reset_budget();
                }
            }
            next.state.push_event(CombatEvent::RoundStarted { round });
        }

        next.check_end_condition();

        if next.state.phase == CombatPhase::Active {
            if let Some(current) = next.state.entities.get(next.state.current_turn_index) {
                let event = CombatEvent::TurnStarted {
                    entity: current.id,
                    name: current.name.clone(),
                    round: next.state.round,
                };
                next.state.push_event(event);
            }
        }
        next
    }

    /// Action classes the current entity can still afford
    pub fn available_actions(&self) -> Vec<ActionKind> {
        let Some(current) = self.state.current_entity() else {
            return Vec::new();
        };
        [
            ActionKind::Move,
            ActionKind::Attack,
            ActionKind::Ability,
            ActionKind::Defend,
        ]
        .into_iter()
        .filter(|kind| self.can_perform(current.id, *kind))
        .collect()
    }

    pub fn can_perform(&self, id: EntityId, kind: ActionKind) -> bool {
        if self.state.phase != CombatPhase::Active {
            return false;
        }
        let Some(entity) = self.state.entity(id) else {
            return false;
        };
        if entity.is_dead {
            return false;
        }
        match kind {
            ActionKind::Attack | ActionKind::Ability | ActionKind::Defend => entity.budget.action,
            ActionKind::Move => entity.budget.movement_feet >= FEET_PER_SQUARE,
        }
    }

    fn is_actors_turn(&self, actor: EntityId) -> bool {
        match self.state.current_entity() {
            Some(current) if current.id == actor => true,
            Some(current) => {
                tracing::warn!(
                    "Rejected action: not {:?}'s turn (current: {})",
                    actor,
                    current.name
                );
                false
            }
            None => {
                tracing::warn!("Rejected action: combat is not active");
                false
            }
        }
    }

    /// Resolve a move; on any violation the state is left untouched
    fn apply_move(&mut self, id: EntityId, to: GridPos) -> bool {
        let Some(entity) = self.state.entity(id) else {
            tracing::warn!("Move rejected: unknown entity {:?}", id);
            return false;
        };
        if entity.is_dead {
            tracing::warn!("Move rejected: {} is dead", entity.name);
            return false;
        }

        let from = entity.position;
        let cost_feet = from.distance(&to) * FEET_PER_SQUARE;
        if cost_feet == 0 {
            tracing::debug!("Move ignored: {} is already at {:?}", entity.name, to);
            return false;
        }
        if cost_feet > entity.budget.movement_feet {
            tracing::warn!(
                "Move rejected: {} needs {} ft but has {} ft",
                entity.name,
                cost_feet,
                entity.budget.movement_feet
            );
            return false;
        }
        if self.state.is_occupied(to, Some(id)) {
            tracing::warn!("Move rejected: {:?} is occupied", to);
            return false;
        }

        let name = entity.name.clone();
        let entity = self
            .state
            .entity_mut(id)
            .expect("entity id resolved above");
        entity.position = to;
        entity.budget.movement_feet -= cost_feet;
        entity.budget.movement_used = true;

        self.state.push_event(CombatEvent::Moved {
            entity: id,
            name,
            from,
            to,
            cost_feet,
        });
        true
    }

    /// Resolve an attack; consumes the attacker's action on hit or miss
    fn apply_attack(
        &mut self,
        attacker_id: EntityId,
        target_id: EntityId,
        dice: &mut dyn DiceRoller,
    ) -> Result<bool> {
        let Some(attacker) = self.state.entity(attacker_id) else {
            tracing::warn!("Attack rejected: unknown attacker {:?}", attacker_id);
            return Ok(false);
        };
        if attacker.is_dead {
            tracing::warn!("Attack rejected: {} is dead", attacker.name);
            return Ok(false);
        }
        if !attacker.budget.action {
            tracing::warn!("Attack rejected: {} has no action left", attacker.name);
            return Ok(false);
        }
        let Some(target) = self.state.entity(target_id) else {
            tracing::warn!("Attack rejected: unknown target {:?}", target_id);
            return Ok(false);
        };
        if target.is_dead {
            tracing::warn!("Attack rejected: target {} is already down", target.name);
            return Ok(false);
        }
        if attacker_id == target_id {
            tracing::warn!("Attack rejected: {} targeting itself", attacker.name);
            return Ok(false);
        }

        // Always recompute the distance from current positions; the
        // weapon choice and the event both depend on it.
        let distance = attacker.position.distance(&target.position);
        let weapon: Weapon = self
            .resolver
            .resolve_best_for_distance(&attacker.equipment, distance)
            .cloned()
            .unwrap_or_else(Weapon::unarmed);

        if distance > weapon.range {
            tracing::warn!(
                "Attack rejected: {} at {} squares exceeds {}'s range {}",
                target.name,
                distance,
                weapon.name,
                weapon.range
            );
            return Ok(false);
        }

        let ability_mod = attacker.abilities.modifier(weapon.governing);
        let attacker_name = attacker.name.clone();
        let target_name = target.name.clone();
        let target_ac = target.armor_class;

        let attack_roll = dice.roll_dice(1, 20)?;
        let attack_total = attack_roll + ability_mod;

        // The action is spent whether or not the blow lands
        if let Some(attacker) = self.state.entity_mut(attacker_id) {
            attacker.budget.action = false;
        }

        if attack_total < target_ac {
            self.state.push_event(CombatEvent::AttackMissed {
                attacker: attacker_id,
                attacker_name,
                target: target_id,
                target_name,
                weapon: weapon.id.clone(),
                distance,
                attack_roll,
                attack_total,
                target_ac,
            });
            return Ok(true);
        }

        let rolled = dice.roll_dice(weapon.damage.dice_count, weapon.damage.dice_faces)?;
        let damage = (rolled + weapon.damage.bonus + ability_mod).max(1);

        let mut target_died = false;
        let mut hp_after = 0;
        if let Some(target) = self.state.entity_mut(target_id) {
            target.hit_points = (target.hit_points - damage).max(0);
            hp_after = target.hit_points;
            if target.hit_points == 0 {
                target.is_dead = true;
                target.is_active = false;
                target_died = true;
            }
        }

        self.state.push_event(CombatEvent::AttackHit {
            attacker: attacker_id,
            attacker_name,
            target: target_id,
            target_name: target_name.clone(),
            weapon: weapon.id.clone(),
            distance,
            attack_roll,
            attack_total,
            damage,
            target_hp_after: hp_after,
        });

        if target_died {
            self.state.push_event(CombatEvent::Defeated {
                entity: target_id,
                name: target_name,
            });
            self.check_end_condition();
        }
        Ok(true)
    }

    /// Take a defensive stance
    ///
    /// Log-only for now: it spends the action and records the event,
    /// but grants no mechanical bonus yet.
    fn apply_defend(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.state.entity(id) else {
            tracing::warn!("Defend rejected: unknown entity {:?}", id);
            return false;
        };
        if entity.is_dead || !entity.budget.action {
            tracing::warn!("Defend rejected: {} has no action left", entity.name);
            return false;
        }
        let name = entity.name.clone();
        if let Some(entity) = self.state.entity_mut(id) {
            entity.budget.action = false;
        }
        self.state.push_event(CombatEvent::DefendStance { entity: id, name });
        true
    }

    /// Victory: no living enemy remains. Defeat: no living player or
    /// ally remains (checked first, so a mutual wipe reads as defeat).
    fn check_end_condition(&mut self) {
        if self.state.phase != CombatPhase::Active {
            return;
        }
        let living_enemies = self.state.living_of_kind(EntityKind::Enemy);
        let living_friendlies = self.state.living_of_kind(EntityKind::Player)
            + self.state.living_of_kind(EntityKind::Ally);

        let new_phase = if living_friendlies == 0 {
            CombatPhase::Defeat
        } else if living_enemies == 0 {
            CombatPhase::Victory
        } else {
            return;
        };

        self.state.phase = new_phase;
        let rounds = self.state.round;
        self.state.push_event(CombatEvent::CombatEnded {
            phase: new_phase,
            rounds,
        });
    }
}
