//! Spell reference data and effect taxonomy.
//!
//! Spells are immutable authored content looked up by name. What a
//! buff/debuff modifies is fixed at authoring time via
//! [`AttributeEffectClass`]; the keyword classifier only runs here, once,
//! while the static table is built.

use crate::status::{classify_spell_name, AttributeEffectClass};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// What a spell does when it resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffectKind {
    Damage,
    Heal,
    Buff,
    Debuff,
    DamageOverTime,
    HealOverTime,
}

impl SpellEffectKind {
    /// Support spells (buff, heal, debuff) do not pass the turn to the
    /// enemy; damage and over-time spells do.
    pub fn is_support(&self) -> bool {
        matches!(
            self,
            SpellEffectKind::Buff | SpellEffectKind::Heal | SpellEffectKind::Debuff
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpellEffectKind::Damage => "damage",
            SpellEffectKind::Heal => "heal",
            SpellEffectKind::Buff => "buff",
            SpellEffectKind::Debuff => "debuff",
            SpellEffectKind::DamageOverTime => "damage over time",
            SpellEffectKind::HealOverTime => "heal over time",
        }
    }
}

/// Static spell data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub effect: SpellEffectKind,
    /// Which stat a buff/debuff modifies; `None` resolves as a generic
    /// scaled effect.
    pub attribute_class: Option<AttributeEffectClass>,
    pub base_power: i32,
    pub mana_cost: i32,
    /// Turns an over-time or attribute effect persists.
    pub duration: i32,
    /// Turns before the spell can be cast again. Zero means no cooldown.
    pub cooldown: i32,
}

impl Spell {
    pub fn new(name: impl Into<String>, effect: SpellEffectKind, base_power: i32) -> Self {
        Self {
            name: name.into(),
            effect,
            attribute_class: None,
            base_power,
            mana_cost: 5,
            duration: 3,
            cooldown: 0,
        }
    }

    pub fn with_class(mut self, class: AttributeEffectClass) -> Self {
        self.attribute_class = Some(class);
        self
    }

    /// Classify from the display name: the data-migration path for legacy
    /// content whose target stat lives in the name.
    pub fn with_migrated_class(mut self) -> Self {
        self.attribute_class = classify_spell_name(&self.name);
        self
    }

    pub fn with_mana_cost(mut self, cost: i32) -> Self {
        self.mana_cost = cost;
        self
    }

    pub fn with_duration(mut self, turns: i32) -> Self {
        self.duration = turns;
        self
    }

    pub fn with_cooldown(mut self, turns: i32) -> Self {
        self.cooldown = turns;
        self
    }
}

/// The authored spell book.
static SPELLS: LazyLock<Vec<Spell>> = LazyLock::new(|| {
    vec![
        Spell::new("Fire Bolt", SpellEffectKind::Damage, 25).with_mana_cost(8),
        Spell::new("Ember Storm", SpellEffectKind::Damage, 45)
            .with_mana_cost(18)
            .with_cooldown(2),
        Spell::new("Mend Wounds", SpellEffectKind::Heal, 30).with_mana_cost(10),
        Spell::new("Regrowth", SpellEffectKind::HealOverTime, 8)
            .with_mana_cost(12)
            .with_duration(3),
        Spell::new("Venom Cloud", SpellEffectKind::DamageOverTime, 7)
            .with_mana_cost(12)
            .with_duration(3),
        // Legacy names: the target stat is encoded in the display name and
        // migrated into the enum when the table is built.
        Spell::new("Força Interior", SpellEffectKind::Buff, 8)
            .with_mana_cost(9)
            .with_migrated_class(),
        Spell::new("Velocidade do Vento", SpellEffectKind::Buff, 6)
            .with_mana_cost(8)
            .with_migrated_class(),
        Spell::new("Stone Barrier", SpellEffectKind::Buff, 10)
            .with_mana_cost(10)
            .with_migrated_class(),
        Spell::new("Weakening Hex", SpellEffectKind::Debuff, 8)
            .with_mana_cost(9)
            .with_class(AttributeEffectClass::Attack),
        Spell::new("Mystery Chant", SpellEffectKind::Buff, 12).with_mana_cost(7),
    ]
});

/// Look up an authored spell by name (case-insensitive).
pub fn get_spell(name: &str) -> Option<Spell> {
    let lower = name.to_lowercase();
    SPELLS
        .iter()
        .find(|s| s.name.to_lowercase() == lower)
        .cloned()
}
