//! Status effects: buffs, debuffs, damage/heal-over-time, and timed
//! attribute modifications.
//!
//! Effects live in ordered lists on each combatant. Durations are
//! decremented exactly once per completed turn by [`StatusEffects::tick`],
//! which processes a snapshot of each list so reads during the same tick
//! see a consistent pre-tick state.

use crate::combatant::{CombatStat, ResourcePool};
use serde::{Deserialize, Serialize};

// ============================================================================
// Effect Classification
// ============================================================================

/// Authored-time classification of what a buff/debuff spell modifies.
///
/// Content declares this explicitly; [`classify_spell_name`] exists only to
/// migrate legacy content that encoded the target stat in its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeEffectClass {
    Attack,
    Defense,
    Speed,
    MagicAttack,
    CritChance,
}

impl AttributeEffectClass {
    pub fn stat(&self) -> CombatStat {
        match self {
            AttributeEffectClass::Attack => CombatStat::Attack,
            AttributeEffectClass::Defense => CombatStat::Defense,
            AttributeEffectClass::Speed => CombatStat::Speed,
            AttributeEffectClass::MagicAttack => CombatStat::MagicAttack,
            AttributeEffectClass::CritChance => CombatStat::CritChance,
        }
    }
}

/// One-time migration helper: derive the effect class from a legacy spell
/// display name. Recognizes the original content's Portuguese keywords as
/// well as English ones. Returns `None` for names with no stat keyword,
/// which authored content resolves as a generic buff/debuff.
pub fn classify_spell_name(name: &str) -> Option<AttributeEffectClass> {
    let lower = name.to_lowercase();
    const TABLE: &[(&[&str], AttributeEffectClass)] = &[
        (
            &["força", "forca", "strength", "might", "fury"],
            AttributeEffectClass::Attack,
        ),
        (
            &["defesa", "defense", "barrier", "stone"],
            AttributeEffectClass::Defense,
        ),
        (
            &["velocidade", "speed", "haste", "swift"],
            AttributeEffectClass::Speed,
        ),
        (
            &["magia", "arcane", "mind"],
            AttributeEffectClass::MagicAttack,
        ),
        (
            &["sorte", "luck", "precision", "focus"],
            AttributeEffectClass::CritChance,
        ),
    ];
    for (keywords, class) in TABLE {
        if keywords.iter().any(|k| lower.contains(k)) {
            return Some(*class);
        }
    }
    None
}

// ============================================================================
// Effect Entries
// ============================================================================

/// Whether an attribute effect helps or hinders its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectPolarity {
    Buff,
    Debuff,
}

/// How an attribute modification combines with the base stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    Flat,
    Percentage,
}

/// A timed entry in one of the buff/debuff/DoT/HoT lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEffect {
    pub name: String,
    pub magnitude: i32,
    pub remaining_turns: i32,
    pub source: String,
}

impl TimedEffect {
    pub fn new(
        name: impl Into<String>,
        magnitude: i32,
        remaining_turns: i32,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            magnitude,
            remaining_turns,
            source: source.into(),
        }
    }
}

/// A timed modification to one derived combat stat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeModification {
    pub stat: CombatStat,
    pub magnitude: f64,
    pub kind: ModifierKind,
    pub remaining_turns: i32,
    pub source: String,
    /// Round the modification was applied on.
    pub applied_at: u32,
}

// ============================================================================
// Status Effect Bundle
// ============================================================================

/// All active effects on one combatant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusEffects {
    pub buffs: Vec<TimedEffect>,
    pub debuffs: Vec<TimedEffect>,
    pub damage_over_time: Vec<TimedEffect>,
    pub heal_over_time: Vec<TimedEffect>,
    pub attribute_mods: Vec<AttributeModification>,
}

impl StatusEffects {
    /// Apply a buff or debuff spell.
    ///
    /// A spell with an authored [`AttributeEffectClass`] lands as a flat
    /// modification to that stat; one without lands as a generic
    /// percentage attack swing. Debuffs invert the modifier sign.
    /// Returns the player-facing message.
    pub fn apply_attribute_effect(
        &mut self,
        spell_name: &str,
        class: Option<AttributeEffectClass>,
        polarity: EffectPolarity,
        magnitude: i32,
        duration: i32,
        source: &str,
        round: u32,
    ) -> String {
        let duration = duration.max(1);
        let sign = match polarity {
            EffectPolarity::Buff => 1.0,
            EffectPolarity::Debuff => -1.0,
        };

        let (stat, kind, value) = match class {
            Some(class) => (class.stat(), ModifierKind::Flat, magnitude as f64 * sign),
            // Generic fallback: a percentage swing on attack, scaled down
            // so unclassified spells stay mild.
            None => (
                CombatStat::Attack,
                ModifierKind::Percentage,
                (magnitude as f64 * 0.5).max(1.0) * sign,
            ),
        };

        self.attribute_mods.push(AttributeModification {
            stat,
            magnitude: value,
            kind,
            remaining_turns: duration,
            source: source.to_string(),
            applied_at: round,
        });

        let entry = TimedEffect::new(spell_name, magnitude, duration, source);
        let list = match polarity {
            EffectPolarity::Buff => &mut self.buffs,
            EffectPolarity::Debuff => &mut self.debuffs,
        };
        list.push(entry);

        let verb = match polarity {
            EffectPolarity::Buff => "rises",
            EffectPolarity::Debuff => "falls",
        };
        format!(
            "{} takes hold: {} {} for {} turns.",
            spell_name,
            stat.name(),
            verb,
            duration
        )
    }

    /// Apply a damage-over-time or heal-over-time spell.
    pub fn apply_over_time_effect(
        &mut self,
        spell_name: &str,
        healing: bool,
        magnitude: i32,
        duration: i32,
        source: &str,
    ) -> String {
        let duration = duration.max(1);
        let entry = TimedEffect::new(spell_name, magnitude.max(1), duration, source);
        if healing {
            self.heal_over_time.push(entry);
            format!(
                "{} will restore {} HP per turn for {} turns.",
                spell_name,
                magnitude.max(1),
                duration
            )
        } else {
            self.damage_over_time.push(entry);
            format!(
                "{} will deal {} damage per turn for {} turns.",
                spell_name,
                magnitude.max(1),
                duration
            )
        }
    }

    /// A stat value with all active modifications folded in: flat
    /// modifiers first, then percentage modifiers.
    pub fn modified(&self, stat: CombatStat, base: f64) -> f64 {
        let mut flat = 0.0;
        let mut percent = 0.0;
        for m in &self.attribute_mods {
            if m.stat != stat {
                continue;
            }
            match m.kind {
                ModifierKind::Flat => flat += m.magnitude,
                ModifierKind::Percentage => percent += m.magnitude,
            }
        }
        (base + flat) * (1.0 + percent / 100.0)
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
            && self.debuffs.is_empty()
            && self.damage_over_time.is_empty()
            && self.heal_over_time.is_empty()
            && self.attribute_mods.is_empty()
    }

    /// Advance all effects by one turn.
    ///
    /// DoT/HoT magnitudes hit the HP pool (clamped) before their durations
    /// decrement; entries reaching zero are dropped with an expiry message.
    /// Each list is processed from a snapshot, never mutated mid-iteration.
    pub fn tick(&mut self, hp: &mut ResourcePool, name: &str) -> Vec<String> {
        let mut messages = Vec::new();

        let dots = self.damage_over_time.clone();
        let mut kept = Vec::with_capacity(dots.len());
        for mut effect in dots {
            let dealt = hp.drain(effect.magnitude);
            if dealt > 0 {
                messages.push(format!("{} suffers {} damage from {}.", name, dealt, effect.name));
            }
            effect.remaining_turns -= 1;
            if effect.remaining_turns > 0 {
                kept.push(effect);
            } else {
                messages.push(format!("{} wears off.", effect.name));
            }
        }
        self.damage_over_time = kept;

        let hots = self.heal_over_time.clone();
        let mut kept = Vec::with_capacity(hots.len());
        for mut effect in hots {
            let healed = hp.restore(effect.magnitude);
            if healed > 0 {
                messages.push(format!("{} recovers {} HP from {}.", name, healed, effect.name));
            }
            effect.remaining_turns -= 1;
            if effect.remaining_turns > 0 {
                kept.push(effect);
            } else {
                messages.push(format!("{} wears off.", effect.name));
            }
        }
        self.heal_over_time = kept;

        for list in [&mut self.buffs, &mut self.debuffs] {
            let snapshot = list.clone();
            let mut kept = Vec::with_capacity(snapshot.len());
            for mut effect in snapshot {
                effect.remaining_turns -= 1;
                if effect.remaining_turns > 0 {
                    kept.push(effect);
                } else {
                    messages.push(format!("{} wears off.", effect.name));
                }
            }
            *list = kept;
        }

        let mods = self.attribute_mods.clone();
        let mut kept = Vec::with_capacity(mods.len());
        for mut m in mods {
            m.remaining_turns -= 1;
            if m.remaining_turns > 0 {
                kept.push(m);
            }
        }
        self.attribute_mods = kept;

        messages
    }
}
