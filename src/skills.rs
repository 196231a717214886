//! Per-weapon mastery skills, leveled by use.
//!
//! Combat actions produce [`SkillXpGain`] values; [`MasteryBook`] is the
//! only writer of cumulative skill XP and levels, and reports level-ups
//! distinctly so callers can surface different messages.

use crate::equipment::{EquipmentSlots, WeaponClass};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The five mastery tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MasterySkill {
    Sword,
    Axe,
    Blunt,
    Defense,
    Magic,
}

impl MasterySkill {
    pub fn name(&self) -> &'static str {
        match self {
            MasterySkill::Sword => "sword mastery",
            MasterySkill::Axe => "axe mastery",
            MasterySkill::Blunt => "blunt mastery",
            MasterySkill::Defense => "defense mastery",
            MasterySkill::Magic => "magic mastery",
        }
    }

    pub fn all() -> [MasterySkill; 5] {
        [
            MasterySkill::Sword,
            MasterySkill::Axe,
            MasterySkill::Blunt,
            MasterySkill::Defense,
            MasterySkill::Magic,
        ]
    }

    /// The mastery track a weapon trains. Daggers train sword mastery,
    /// staves train magic mastery, and a bare hand (or an unclassified
    /// weapon) defaults to sword mastery.
    pub fn for_weapon(class: Option<WeaponClass>) -> MasterySkill {
        match class {
            Some(WeaponClass::Sword) | Some(WeaponClass::Dagger) | None => MasterySkill::Sword,
            Some(WeaponClass::Axe) => MasterySkill::Axe,
            Some(WeaponClass::Blunt) => MasterySkill::Blunt,
            Some(WeaponClass::Staff) => MasterySkill::Magic,
        }
    }
}

impl fmt::Display for MasterySkill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ephemeral XP award produced by turn resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillXpGain {
    pub skill: MasterySkill,
    pub amount: u32,
    pub reason: String,
    pub is_off_hand: bool,
}

impl SkillXpGain {
    pub fn new(skill: MasterySkill, amount: u32, reason: impl Into<String>) -> Self {
        Self {
            skill,
            amount,
            reason: reason.into(),
            is_off_hand: false,
        }
    }

    pub fn off_hand(mut self) -> Self {
        self.is_off_hand = true;
        self
    }
}

// ============================================================================
// XP Formulas
// ============================================================================

/// XP gains for a physical attack that dealt `base_damage`.
///
/// The main-hand weapon's track earns `max(1, damage / 10)`. When
/// dual-wielding the main-hand award is boosted 1.25x and the off-hand
/// weapon earns 0.75x of the unboosted value under its own track.
pub fn attack_skill_xp(slots: &EquipmentSlots, base_damage: i32) -> Vec<SkillXpGain> {
    let base = (base_damage / 10).max(1) as u32;
    let main_skill =
        MasterySkill::for_weapon(slots.main_hand.as_ref().and_then(|w| w.weapon_class()));

    if slots.is_dual_wielding() {
        let off_skill =
            MasterySkill::for_weapon(slots.off_hand.as_ref().and_then(|w| w.weapon_class()));
        let boosted = ((base as f64) * 1.25).floor() as u32;
        let off = (((base as f64) * 0.75).floor() as u32).max(1);
        vec![
            SkillXpGain::new(main_skill, boosted.max(1), "attack"),
            SkillXpGain::new(off_skill, off, "off-hand attack").off_hand(),
        ]
    } else {
        vec![SkillXpGain::new(main_skill, base, "attack")]
    }
}

/// XP gains for blocking `damage_blocked` while defending.
///
/// `max(2, blocked / 5)`, minimum 3 when nothing was blocked; a shield in
/// the off-hand multiplies the award 2.5x.
pub fn defense_skill_xp(slots: &EquipmentSlots, damage_blocked: i32) -> Vec<SkillXpGain> {
    let mut xp = if damage_blocked <= 0 {
        3
    } else {
        (damage_blocked / 5).max(2) as u32
    };
    if slots.has_shield() {
        xp = ((xp as f64) * 2.5).floor() as u32;
    }
    vec![SkillXpGain::new(MasterySkill::Defense, xp, "defend")]
}

/// XP gains for casting a spell.
///
/// `max(2, mana_cost / 2 + value / 8)` where `value` is the spell's
/// realized damage or healing; an off-hand staff adds a 20% bonus entry.
pub fn magic_skill_xp(
    slots: &EquipmentSlots,
    mana_cost: i32,
    actual_value: i32,
) -> Vec<SkillXpGain> {
    let xp = (mana_cost.max(0) / 2 + actual_value.max(0) / 8).max(2) as u32;
    let mut gains = vec![SkillXpGain::new(MasterySkill::Magic, xp, "spellcast")];

    let off_hand_staff = slots
        .off_hand
        .as_ref()
        .is_some_and(|item| item.weapon_class() == Some(WeaponClass::Staff));
    if off_hand_staff {
        let bonus = (((xp as f64) * 0.2).floor() as u32).max(1);
        gains.push(SkillXpGain::new(MasterySkill::Magic, bonus, "off-hand focus").off_hand());
    }
    gains
}

// ============================================================================
// Cumulative Progression
// ============================================================================

/// Cumulative progress on one mastery track.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MasteryTrack {
    pub level: u32,
    pub xp: u32,
}

impl Default for MasteryTrack {
    fn default() -> Self {
        Self { level: 1, xp: 0 }
    }
}

impl MasteryTrack {
    /// XP required to advance past the given level.
    pub fn xp_to_next(level: u32) -> u32 {
        level * 100
    }
}

/// The result of applying one XP gain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryProgress {
    pub skill: MasterySkill,
    pub xp_gained: u32,
    pub new_level: u32,
    pub leveled_up: bool,
}

/// All five mastery tracks for one character.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasteryBook {
    tracks: HashMap<MasterySkill, MasteryTrack>,
}

impl MasteryBook {
    pub fn track(&self, skill: MasterySkill) -> MasteryTrack {
        self.tracks.get(&skill).copied().unwrap_or_default()
    }

    pub fn level(&self, skill: MasterySkill) -> u32 {
        self.track(skill).level
    }

    /// Apply a gain, advancing the level across any thresholds crossed.
    pub fn apply(&mut self, gain: &SkillXpGain) -> MasteryProgress {
        let track = self.tracks.entry(gain.skill).or_default();
        let before = track.level;
        track.xp += gain.amount;
        while track.xp >= MasteryTrack::xp_to_next(track.level) {
            track.xp -= MasteryTrack::xp_to_next(track.level);
            track.level += 1;
        }
        MasteryProgress {
            skill: gain.skill,
            xp_gained: gain.amount,
            new_level: track.level,
            leveled_up: track.level > before,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{Equipment, EquipSlot, ItemKind, StatBonuses};

    fn weapon(name: &str, class: WeaponClass) -> Equipment {
        Equipment::new(name, ItemKind::Weapon(class)).with_bonuses(StatBonuses {
            attack: 5,
            ..Default::default()
        })
    }

    #[test]
    fn test_attack_xp_single_weapon() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::MainHand, weapon("Axe", WeaponClass::Axe), 1)
            .unwrap();
        let gains = attack_skill_xp(&slots, 47);
        assert_eq!(gains.len(), 1);
        assert_eq!(gains[0].skill, MasterySkill::Axe);
        assert_eq!(gains[0].amount, 4);
        assert!(!gains[0].is_off_hand);
    }

    #[test]
    fn test_attack_xp_unarmed_defaults_to_sword() {
        let slots = EquipmentSlots::default();
        let gains = attack_skill_xp(&slots, 5);
        assert_eq!(gains[0].skill, MasterySkill::Sword);
        assert_eq!(gains[0].amount, 1);
    }

    #[test]
    fn test_attack_xp_dual_wield_split() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::MainHand, weapon("Sword", WeaponClass::Sword), 1)
            .unwrap();
        slots
            .equip(EquipSlot::OffHand, weapon("Axe", WeaponClass::Axe), 1)
            .unwrap();
        let gains = attack_skill_xp(&slots, 100);
        // base 10: main 12 (boosted), off-hand 7 under its own track
        assert_eq!(gains.len(), 2);
        assert_eq!(gains[0].skill, MasterySkill::Sword);
        assert_eq!(gains[0].amount, 12);
        assert_eq!(gains[1].skill, MasterySkill::Axe);
        assert_eq!(gains[1].amount, 7);
        assert!(gains[1].is_off_hand);
    }

    #[test]
    fn test_defense_xp_minimums() {
        let slots = EquipmentSlots::default();
        assert_eq!(defense_skill_xp(&slots, 0)[0].amount, 3);
        assert_eq!(defense_skill_xp(&slots, 7)[0].amount, 2);
        assert_eq!(defense_skill_xp(&slots, 40)[0].amount, 8);
    }

    #[test]
    fn test_defense_xp_shield_multiplier() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::OffHand, Equipment::new("Shield", ItemKind::Shield), 1)
            .unwrap();
        assert_eq!(defense_skill_xp(&slots, 40)[0].amount, 20);
    }

    #[test]
    fn test_magic_xp_off_hand_staff_bonus() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::OffHand, weapon("Wand", WeaponClass::Staff), 1)
            .unwrap();
        let gains = magic_skill_xp(&slots, 12, 40);
        // 12/2 + 40/8 = 11, bonus floor(11 * 0.2) = 2
        assert_eq!(gains.len(), 2);
        assert_eq!(gains[0].amount, 11);
        assert_eq!(gains[1].amount, 2);
        assert!(gains[1].is_off_hand);
    }

    #[test]
    fn test_mastery_book_levels_up() {
        let mut book = MasteryBook::default();
        let progress = book.apply(&SkillXpGain::new(MasterySkill::Sword, 99, "attack"));
        assert!(!progress.leveled_up);
        assert_eq!(progress.new_level, 1);

        let progress = book.apply(&SkillXpGain::new(MasterySkill::Sword, 1, "attack"));
        assert!(progress.leveled_up);
        assert_eq!(progress.new_level, 2);
        assert_eq!(book.level(MasterySkill::Sword), 2);
    }

    #[test]
    fn test_mastery_book_crosses_multiple_thresholds() {
        let mut book = MasteryBook::default();
        // 100 + 200 = 300 XP clears levels 1 and 2 exactly.
        let progress = book.apply(&SkillXpGain::new(MasterySkill::Magic, 300, "spellcast"));
        assert_eq!(progress.new_level, 3);
        assert!(progress.leveled_up);
    }
}
