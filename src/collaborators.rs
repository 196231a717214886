//! Async interfaces to the services a battle talks to: the character
//! sheet, the progression ledger, and the floor directory.
//!
//! The engine only sees the [`CollaboratorClient`] trait. Production
//! callers implement it over their own transport; tests and examples use
//! [`InMemoryCollaborator`].

use crate::equipment::EquipmentSlots;
use crate::skills::SkillXpGain;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("collaborator call failed: {0}")]
    Transport(String),

    #[error("unknown character: {0}")]
    UnknownCharacter(String),
}

/// Result of granting character XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpGrant {
    pub new_xp: u64,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// Result of banking skill XP with the progression ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGrant {
    pub new_level: u32,
    pub leveled_up: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FloorKind {
    Common,
    Elite,
    Boss,
}

/// What the floor directory knows about a floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorMetadata {
    pub kind: FloorKind,
    pub is_checkpoint: bool,
    pub min_level: u32,
}

/// The external services a battle session depends on.
#[async_trait]
pub trait CollaboratorClient: Send + Sync {
    /// The character's currently equipped items, keyed by slot.
    async fn fetch_equipped_slots(&self, character: &str)
        -> Result<EquipmentSlots, CollaboratorError>;

    /// Write surviving HP and mana back to the character sheet.
    async fn persist_hp_mana(
        &self,
        character: &str,
        hp: i32,
        mana: i32,
    ) -> Result<(), CollaboratorError>;

    /// Bank character XP; `source` labels where it came from (battle
    /// victory, quest, etc.) for the ledger's audit trail.
    async fn grant_xp(
        &self,
        character: &str,
        amount: u64,
        source: &str,
    ) -> Result<XpGrant, CollaboratorError>;

    /// Bank gold; returns the new total.
    async fn grant_gold(&self, character: &str, amount: u64) -> Result<u64, CollaboratorError>;

    /// Bank one skill XP award with the progression ledger.
    async fn apply_skill_xp(
        &self,
        character: &str,
        gain: &SkillXpGain,
    ) -> Result<SkillGrant, CollaboratorError>;

    /// Floor directory lookup.
    async fn fetch_floor_metadata(&self, floor: u32) -> Result<FloorMetadata, CollaboratorError>;
}

#[derive(Debug, Default)]
struct CharacterRecord {
    hp: i32,
    mana: i32,
    xp: u64,
    level: u32,
    gold: u64,
    skill_xp: HashMap<String, u64>,
    slots: EquipmentSlots,
}

/// A self-contained collaborator backed by in-process maps. Levels use
/// the same `level * 100` curve the battle-local mastery book uses.
#[derive(Debug, Default)]
pub struct InMemoryCollaborator {
    characters: Mutex<HashMap<String, CharacterRecord>>,
    /// When set, every call fails; exercises degraded paths in tests.
    pub fail_all: bool,
}

impl InMemoryCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            characters: Mutex::new(HashMap::new()),
            fail_all: true,
        }
    }

    pub fn register(&self, character: &str, slots: EquipmentSlots) {
        if let Ok(mut characters) = self.characters.lock() {
            characters.insert(
                character.to_string(),
                CharacterRecord {
                    level: 1,
                    slots,
                    ..Default::default()
                },
            );
        }
    }

    /// Current banked gold, if the character exists.
    pub fn gold(&self, character: &str) -> Option<u64> {
        let characters = self.characters.lock().ok()?;
        characters.get(character).map(|record| record.gold)
    }

    /// Current banked character XP, if the character exists.
    pub fn xp(&self, character: &str) -> Option<u64> {
        let characters = self.characters.lock().ok()?;
        characters.get(character).map(|record| record.xp)
    }

    fn check(&self) -> Result<(), CollaboratorError> {
        if self.fail_all {
            Err(CollaboratorError::Transport("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }

    fn with_record<T>(
        &self,
        character: &str,
        f: impl FnOnce(&mut CharacterRecord) -> T,
    ) -> Result<T, CollaboratorError> {
        self.check()?;
        let mut characters = self
            .characters
            .lock()
            .map_err(|_| CollaboratorError::Transport("poisoned store".to_string()))?;
        let record = characters
            .get_mut(character)
            .ok_or_else(|| CollaboratorError::UnknownCharacter(character.to_string()))?;
        Ok(f(record))
    }
}

fn level_for_xp(xp: u64) -> u32 {
    let mut level = 1u32;
    let mut remaining = xp;
    while remaining >= (level as u64) * 100 {
        remaining -= (level as u64) * 100;
        level += 1;
    }
    level
}

#[async_trait]
impl CollaboratorClient for InMemoryCollaborator {
    async fn fetch_equipped_slots(
        &self,
        character: &str,
    ) -> Result<EquipmentSlots, CollaboratorError> {
        self.with_record(character, |record| record.slots.clone())
    }

    async fn persist_hp_mana(
        &self,
        character: &str,
        hp: i32,
        mana: i32,
    ) -> Result<(), CollaboratorError> {
        self.with_record(character, |record| {
            record.hp = hp;
            record.mana = mana;
        })
    }

    async fn grant_xp(
        &self,
        character: &str,
        amount: u64,
        _source: &str,
    ) -> Result<XpGrant, CollaboratorError> {
        self.with_record(character, |record| {
            let before = record.level;
            record.xp += amount;
            record.level = level_for_xp(record.xp);
            XpGrant {
                new_xp: record.xp,
                new_level: record.level,
                leveled_up: record.level > before,
            }
        })
    }

    async fn grant_gold(&self, character: &str, amount: u64) -> Result<u64, CollaboratorError> {
        self.with_record(character, |record| {
            record.gold += amount;
            record.gold
        })
    }

    async fn apply_skill_xp(
        &self,
        character: &str,
        gain: &SkillXpGain,
    ) -> Result<SkillGrant, CollaboratorError> {
        self.with_record(character, |record| {
            let total = record
                .skill_xp
                .entry(gain.skill.name().to_string())
                .or_insert(0);
            let before = level_for_xp(*total);
            *total += gain.amount as u64;
            let after = level_for_xp(*total);
            SkillGrant {
                new_level: after,
                leveled_up: after > before,
            }
        })
    }

    async fn fetch_floor_metadata(&self, floor: u32) -> Result<FloorMetadata, CollaboratorError> {
        self.check()?;
        let kind = if crate::scaling::is_boss_floor(floor) {
            FloorKind::Boss
        } else if crate::scaling::is_elite_floor(floor) {
            FloorKind::Elite
        } else {
            FloorKind::Common
        };
        Ok(FloorMetadata {
            kind,
            is_checkpoint: floor % 10 == 0,
            min_level: floor / 2,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::MasterySkill;

    #[tokio::test]
    async fn test_grant_xp_levels_on_curve() {
        let client = InMemoryCollaborator::new();
        client.register("aria", EquipmentSlots::default());

        let grant = client.grant_xp("aria", 99, "battle").await.unwrap();
        assert!(!grant.leveled_up);
        assert_eq!(grant.new_level, 1);

        let grant = client.grant_xp("aria", 1, "battle").await.unwrap();
        assert!(grant.leveled_up);
        assert_eq!(grant.new_level, 2);
    }

    #[tokio::test]
    async fn test_gold_accumulates() {
        let client = InMemoryCollaborator::new();
        client.register("aria", EquipmentSlots::default());
        assert_eq!(client.grant_gold("aria", 30).await.unwrap(), 30);
        assert_eq!(client.grant_gold("aria", 12).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_unknown_character_rejected() {
        let client = InMemoryCollaborator::new();
        let err = client.grant_gold("nobody", 1).await.unwrap_err();
        assert!(matches!(err, CollaboratorError::UnknownCharacter(_)));
    }

    #[tokio::test]
    async fn test_skill_xp_banked_per_track() {
        let client = InMemoryCollaborator::new();
        client.register("aria", EquipmentSlots::default());
        let gain = SkillXpGain::new(MasterySkill::Sword, 120, "attack");
        let grant = client.apply_skill_xp("aria", &gain).await.unwrap();
        assert!(grant.leveled_up);
        assert_eq!(grant.new_level, 2);
    }

    #[tokio::test]
    async fn test_floor_metadata_kinds() {
        let client = InMemoryCollaborator::new();
        assert_eq!(
            client.fetch_floor_metadata(5).await.unwrap().kind,
            FloorKind::Boss
        );
        assert_eq!(
            client.fetch_floor_metadata(15).await.unwrap().kind,
            FloorKind::Elite
        );
        assert_eq!(
            client.fetch_floor_metadata(3).await.unwrap().kind,
            FloorKind::Common
        );
        assert!(client.fetch_floor_metadata(20).await.unwrap().is_checkpoint);
    }

    #[tokio::test]
    async fn test_failing_client_errors() {
        let client = InMemoryCollaborator::failing();
        assert!(client.fetch_floor_metadata(1).await.is_err());
    }
}
