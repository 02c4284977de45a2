//! Seeded skirmish runner
//!
//! Runs one fully AI-driven combat and prints the event log. Useful
//! for eyeballing profile behavior:
//!   cargo run --bin skirmish [seed] [profile_a] [profile_b]

use std::sync::Arc;

use gridspire::ai::{load_profile, AiProfile, Tactician};
use gridspire::combat::{
    CombatEngine, CombatEntity, CombatEvent, DamageRoll, EntityKind, Weapon, WeaponCatalog,
    WeaponCategory, WeaponResolver,
};
use gridspire::core::types::{Ability, AbilityScores, GridPos};
use gridspire::dice::SeededDice;

const MAX_ROUNDS: u32 = 30;

fn catalog() -> WeaponCatalog {
    WeaponCatalog::new()
        .with_weapon(Weapon {
            id: "shortsword".to_string(),
            name: "Shortsword".to_string(),
            damage: DamageRoll::new(1, 6, 0),
            governing: Ability::Strength,
            range: 1,
            category: WeaponCategory::Melee,
            properties: vec![],
        })
        .with_weapon(Weapon {
            id: "shortbow".to_string(),
            name: "Shortbow".to_string(),
            damage: DamageRoll::new(1, 6, 0),
            governing: Ability::Dexterity,
            range: 16,
            category: WeaponCategory::Ranged,
            properties: vec![],
        })
}

fn load_or_default(name: &str) -> AiProfile {
    load_profile(name).unwrap_or_else(|e| {
        tracing::warn!("Could not load profile '{}' ({}), using default", name, e);
        AiProfile::default()
    })
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(2024);
    let profile_a = load_or_default(&args.next().unwrap_or_else(|| "berserker".to_string()));
    let profile_b = load_or_default(&args.next().unwrap_or_else(|| "craven".to_string()));

    tracing::info!(
        "Skirmish: {} vs {} (seed {})",
        profile_a.name,
        profile_b.name,
        seed
    );

    let resolver = WeaponResolver::new(Arc::new(catalog()));
    let abilities = AbilityScores {
        strength: 14,
        dexterity: 12,
        ..AbilityScores::default()
    };

    let red = CombatEntity::new(
        "Red",
        EntityKind::Player,
        1,
        15,
        12,
        6,
        abilities,
        GridPos::new(0, 0),
    )
    .with_equipment(vec!["shortsword".to_string()])
    .with_profile(profile_a.clone());

    let blue = CombatEntity::new(
        "Blue",
        EntityKind::Enemy,
        1,
        15,
        12,
        6,
        abilities,
        GridPos::new(8, 0),
    )
    .with_equipment(vec!["shortbow".to_string()])
    .with_profile(profile_b.clone());

    let red_id = red.id;

    let tactician = Tactician::new(resolver.clone());
    let mut dice = SeededDice::new(seed);
    let mut engine = CombatEngine::new(resolver)
        .with_added_entity(red)
        .expect("roster should validate")
        .with_added_entity(blue)
        .expect("roster should validate")
        .with_rolled_initiative(&mut dice)
        .expect("initiative should roll");

    while !engine.is_ended() && engine.state().round <= MAX_ROUNDS {
        let Some(current) = engine.current_entity() else {
            break;
        };
        let profile = if current.id == red_id {
            &profile_a
        } else {
            &profile_b
        };
        let turn = tactician.calculate_optimal_turn(current.id, engine.state(), profile, &mut dice);
        engine = engine
            .with_executed_turn(&turn, &mut dice)
            .expect("turn should execute");
        engine = engine.with_advanced_turn();
    }

    for event in &engine.state().events {
        match event {
            CombatEvent::AttackHit {
                attacker_name,
                target_name,
                weapon,
                damage,
                target_hp_after,
                ..
            } => println!(
                "{} hits {} with {} for {} ({} HP left)",
                attacker_name, target_name, weapon, damage, target_hp_after
            ),
            CombatEvent::AttackMissed {
                attacker_name,
                target_name,
                ..
            } => println!("{} misses {}", attacker_name, target_name),
            CombatEvent::Moved { name, from, to, .. } => {
                println!("{} moves {:?} -> {:?}", name, from, to)
            }
            CombatEvent::Defeated { name, .. } => println!("{} falls", name),
            CombatEvent::RoundStarted { round } => println!("--- round {} ---", round),
            CombatEvent::CombatEnded { phase, rounds } => {
                println!("Combat over after {} rounds: {:?}", rounds, phase)
            }
            _ => {}
        }
    }
}
