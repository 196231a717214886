//! Turn-based battle resolution engine for a tower-climb RPG.
//!
//! This crate provides:
//! - Equipment bonus aggregation with set bonuses and dual-wield rules
//! - Use-based weapon, defense, and magic mastery progression
//! - A status effect engine for buffs, debuffs, and over-time effects
//! - Deterministic damage, critical, flee, and spell-scaling formulas
//! - Floor-indexed procedural enemy generation with tiers and cycles
//! - An async battle session wired to external collaborator services
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tower_core::{BattleSession, InMemoryCollaborator, PlayerAction};
//! use tower_core::combatant::create_sample_hero;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(InMemoryCollaborator::new());
//!     client.register("aria", tower_core::content::sample_loadout());
//!
//!     let session =
//!         BattleSession::start(client, "aria", create_sample_hero("Aria"), 1).await;
//!     let result = session.submit_action(PlayerAction::Attack).await.unwrap();
//!     for line in &result.messages {
//!         println!("{line}");
//!     }
//! }
//! ```

pub mod battle;
pub mod collaborators;
pub mod combatant;
pub mod content;
pub mod equipment;
pub mod formulas;
pub mod scaling;
pub mod session;
pub mod skills;
pub mod spells;
pub mod status;

// Primary public API
pub use battle::{
    BattleEngine, BattleError, BattleOutcome, BattleState, BattleTurnResult, PlayerAction,
};
pub use collaborators::{
    CollaboratorClient, CollaboratorError, FloorKind, FloorMetadata, InMemoryCollaborator,
    SkillGrant, XpGrant,
};
pub use combatant::{Attributes, BattleId, CharacterId, CombatStats, Combatant};
pub use equipment::{aggregate, EquipSlot, Equipment, EquipmentSlots, StatBonusBundle};
pub use scaling::{generate_enemy, EnemyStatBlock};
pub use session::BattleSession;
pub use skills::{MasteryBook, MasterySkill, SkillXpGain};
pub use spells::{get_spell, Spell, SpellEffectKind};
pub use status::StatusEffects;
