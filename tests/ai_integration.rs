//! Tactical AI integration tests
//!
//! These drive whole combats where every enemy turn comes from the
//! decision pipeline, using the shipped profile files and seeded dice.

use gridspire::ai::{load_profile, AiProfile, ModifierResponse, Tactician};
use gridspire::combat::{
    CombatEngine, CombatEntity, CombatPhase, DamageRoll, EntityKind, TurnAction, Weapon,
    WeaponCatalog, WeaponCategory, WeaponResolver,
};
use gridspire::core::types::{Ability, AbilityScores, GridPos};
use gridspire::dice::SeededDice;
use std::sync::Arc;

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

fn resolver() -> WeaponResolver {
    WeaponResolver::new(Arc::new(
        WeaponCatalog::new()
            .with_weapon(shortsword())
            .with_weapon(shortbow()),
    ))
}

fn soldier(name: &str, kind: EntityKind, x: i32, y: i32) -> CombatEntity {
    let abilities = AbilityScores {
        strength: 14,
        dexterity: 12,
        ..AbilityScores::default()
    };
    CombatEntity::new(name, kind, 1, 12, 12, 6, abilities, GridPos::new(x, y))
        .with_equipment(vec!["shortsword".to_string()])
}

#[test]
fn test_ai_driven_combat_reaches_an_ending() {
    // Player attacks mechanically; the goblin's turns come entirely
    // from the tactician with the berserker profile.
    let profile = load_profile("berserker").expect("Should load berserker profile");

    let hero = soldier("Hero", EntityKind::Player, 0, 0);
    let goblin = soldier("Goblin", EntityKind::Enemy, 5, 0).with_profile(profile.clone());
    let hero_id = hero.id;
    let goblin_id = goblin.id;

    let tactician = Tactician::new(resolver());
    let mut dice = SeededDice::new(2024);
    let mut engine = CombatEngine::new(resolver())
        .with_added_entity(hero)
        .expect("add")
        .with_added_entity(goblin)
        .expect("add")
        .with_rolled_initiative(&mut dice)
        .expect("start");

    for _ in 0..60 {
        if engine.is_ended() {
            break;
        }
        let current = engine.current_entity().expect("current").id;
        let turn = if current == goblin_id {
            tactician.calculate_optimal_turn(goblin_id, engine.state(), &profile, &mut dice)
        } else {
            // Player closes and swings at whatever is nearest
            let hero = engine.entity(hero_id).expect("hero");
            let goblin = engine.entity(goblin_id).expect("goblin");
            if goblin.is_alive() && hero.position.distance(&goblin.position) <= 1 {
                TurnAction::new(hero_id).with_attack(goblin_id)
            } else if goblin.is_alive() {
                let step = engine
                    .reachable_cells(hero_id)
                    .into_iter()
                    .min_by_key(|c| c.distance(&goblin.position));
                match step {
                    Some(cell) => TurnAction::new(hero_id)
                        .with_movement(cell)
                        .with_attack(goblin_id),
                    None => TurnAction::no_op(hero_id),
                }
            } else {
                TurnAction::no_op(hero_id)
            }
        };
        engine = engine.with_executed_turn(&turn, &mut dice).expect("turn");
        engine = engine.with_advanced_turn();
    }

    assert!(engine.is_ended(), "Combat should resolve within 30 rounds");
    assert!(matches!(
        engine.state().phase,
        CombatPhase::Victory | CombatPhase::Defeat
    ));
}

#[test]
fn test_wounded_coward_never_attacks() {
    // A craven-profile enemy below its flee threshold with an open
    // escape route must produce a retreat, not an attack.
    let profile = load_profile("craven").expect("Should load craven profile");
    assert!(profile.traits.courage < 50);

    let hero = soldier("Hero", EntityKind::Player, 2, 0);
    let mut coward = soldier("Coward", EntityKind::Enemy, 0, 0);
    // 3/12 HP = 25%, under the craven 40% threshold
    coward.hit_points = 3;
    let coward_id = coward.id;

    let mut state_engine = CombatEngine::new(resolver())
        .with_added_entity(hero)
        .expect("add")
        .with_added_entity(coward)
        .expect("add");
    let mut dice = SeededDice::new(7);
    state_engine = state_engine
        .with_rolled_initiative(&mut dice)
        .expect("start");

    let tactician = Tactician::new(resolver());
    for seed in 0..10u64 {
        let mut dice = SeededDice::new(seed);
        let turn = tactician.calculate_optimal_turn(
            coward_id,
            state_engine.state(),
            &profile,
            &mut dice,
        );
        assert!(turn.attack_target.is_none(), "seed {} produced an attack", seed);
        let dest = turn.movement.expect("Should retreat");
        let hero_pos = GridPos::new(2, 0);
        assert!(
            dest.distance(&hero_pos) > 2,
            "seed {} retreated to {:?}, not away from {:?}",
            seed,
            dest,
            hero_pos
        );
    }
}

#[test]
fn test_shipped_profiles_have_distinct_behavior() {
    let berserker = load_profile("berserker").expect("Should load");
    let craven = load_profile("craven").expect("Should load");

    assert!(berserker.traits.aggression > craven.traits.aggression);
    assert!(craven.traits.courage < berserker.traits.courage);
    assert_eq!(craven.modifiers.on_ally_down, Some(ModifierResponse::Retreat));
    assert_eq!(berserker.modifiers.when_outnumbered, Some(ModifierResponse::Attack));
}

#[test]
fn test_default_profile_produces_legal_turns() {
    // Whatever the pipeline picks must execute without being rejected
    // by the engine: the post-turn state must differ unless the turn
    // was an explicit pass.
    let profile = AiProfile::default();
    let hero = soldier("Hero", EntityKind::Player, 0, 0);
    let grunt = soldier("Grunt", EntityKind::Enemy, 4, 0);
    let grunt_id = grunt.id;

    let mut dice = SeededDice::new(11);
    let mut engine = CombatEngine::new(resolver())
        .with_added_entity(hero)
        .expect("add")
        .with_added_entity(grunt)
        .expect("add")
        .with_rolled_initiative(&mut dice)
        .expect("start");

    // Advance until it is the grunt's turn
    while engine.current_entity().expect("current").id != grunt_id {
        engine = engine.with_advanced_turn();
    }

    let tactician = Tactician::new(resolver());
    let turn = tactician.calculate_optimal_turn(grunt_id, engine.state(), &profile, &mut dice);
    let before_events = engine.state().events.len();
    engine = engine.with_executed_turn(&turn, &mut dice).expect("turn");

    if !turn.is_no_op() {
        assert!(
            engine.state().events.len() > before_events,
            "A non-pass turn should leave a trace in the event log"
        );
    }
}
