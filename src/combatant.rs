//! Combatant state types shared by the player and enemies.
//!
//! Contains primary attributes, derived combat stats, clamped HP/mana
//! pools, and the behavior metadata that only enemies carry.

use crate::equipment::StatBonusBundle;
use crate::status::StatusEffects;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for characters (player or enemy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacterId(pub Uuid);

impl CharacterId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CharacterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a running battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Attributes
// ============================================================================

/// The six primary attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Strength,
    Dexterity,
    Intelligence,
    Wisdom,
    Vitality,
    Luck,
}

impl Attribute {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Attribute::Strength => "STR",
            Attribute::Dexterity => "DEX",
            Attribute::Intelligence => "INT",
            Attribute::Wisdom => "WIS",
            Attribute::Vitality => "VIT",
            Attribute::Luck => "LCK",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::Strength => "Strength",
            Attribute::Dexterity => "Dexterity",
            Attribute::Intelligence => "Intelligence",
            Attribute::Wisdom => "Wisdom",
            Attribute::Vitality => "Vitality",
            Attribute::Luck => "Luck",
        }
    }

    pub fn all() -> [Attribute; 6] {
        [
            Attribute::Strength,
            Attribute::Dexterity,
            Attribute::Intelligence,
            Attribute::Wisdom,
            Attribute::Vitality,
            Attribute::Luck,
        ]
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Primary attribute scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub vitality: i32,
    pub luck: i32,
}

impl Attributes {
    pub fn new(str: i32, dex: i32, int: i32, wis: i32, vit: i32, lck: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            intelligence: int,
            wisdom: wis,
            vitality: vit,
            luck: lck,
        }
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intelligence => self.intelligence,
            Attribute::Wisdom => self.wisdom,
            Attribute::Vitality => self.vitality,
            Attribute::Luck => self.luck,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: i32) {
        match attribute {
            Attribute::Strength => self.strength = value,
            Attribute::Dexterity => self.dexterity = value,
            Attribute::Intelligence => self.intelligence = value,
            Attribute::Wisdom => self.wisdom = value,
            Attribute::Vitality => self.vitality = value,
            Attribute::Luck => self.luck = value,
        }
    }
}

impl Default for Attributes {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Derived Combat Stats
// ============================================================================

/// A derived combat stat that timed modifiers can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatStat {
    Attack,
    Defense,
    Speed,
    MagicAttack,
    CritChance,
    CritDamage,
}

impl CombatStat {
    pub fn name(&self) -> &'static str {
        match self {
            CombatStat::Attack => "attack",
            CombatStat::Defense => "defense",
            CombatStat::Speed => "speed",
            CombatStat::MagicAttack => "magic attack",
            CombatStat::CritChance => "critical chance",
            CombatStat::CritDamage => "critical damage",
        }
    }
}

/// Derived combat stats. Percent-like fields (`crit_chance`,
/// `crit_damage`, `double_attack_chance`, `magic_damage_bonus`) are
/// expressed in percent points, e.g. `crit_damage = 150.0` is a 1.5x hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub magic_attack: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub double_attack_chance: f64,
    pub magic_damage_bonus: f64,
}

impl CombatStats {
    /// Derive combat stats from attributes and level, the baseline before
    /// equipment and status modifiers.
    pub fn derive(attributes: &Attributes, level: u32) -> Self {
        let lvl = level as i32;
        Self {
            attack: 8 + attributes.strength * 2 + lvl,
            defense: 4 + attributes.vitality + attributes.dexterity / 2,
            speed: 5 + attributes.dexterity,
            magic_attack: attributes.intelligence * 2 + attributes.wisdom / 2,
            crit_chance: 5.0 + attributes.luck as f64 * 0.5,
            crit_damage: 150.0 + attributes.luck as f64 * 0.25,
            double_attack_chance: 3.0 + attributes.luck as f64 * 0.2,
            magic_damage_bonus: 0.0,
        }
    }

    /// Clamp every field into its sane range. Negative derived stats and
    /// out-of-band critical values never leave the engine.
    pub fn sanitize(&mut self) {
        self.attack = self.attack.max(0);
        self.defense = self.defense.max(0);
        self.speed = self.speed.max(0);
        self.magic_attack = self.magic_attack.max(0);
        self.crit_chance = self.crit_chance.clamp(0.0, 100.0);
        self.crit_damage = self.crit_damage.clamp(100.0, 400.0);
        self.double_attack_chance = self.double_attack_chance.clamp(0.0, 100.0);
        self.magic_damage_bonus = self.magic_damage_bonus.clamp(0.0, 300.0);
    }
}

// ============================================================================
// Resource Pools
// ============================================================================

/// A clamped current/maximum pool (HP or mana).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourcePool {
    current: i32,
    maximum: i32,
}

impl ResourcePool {
    pub fn new(maximum: i32) -> Self {
        let maximum = maximum.max(1);
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn maximum(&self) -> i32 {
        self.maximum
    }

    pub fn is_empty(&self) -> bool {
        self.current <= 0
    }

    /// Set the current value, clamped to `[0, maximum]`.
    pub fn set_current(&mut self, value: i32) {
        self.current = value.clamp(0, self.maximum);
    }

    /// Raise the maximum (equipment bonuses), keeping current in range.
    pub fn raise_maximum(&mut self, delta: i32) {
        self.maximum = (self.maximum + delta).max(1);
        self.current = self.current.clamp(0, self.maximum);
    }

    /// Remove up to `amount`, returning how much was actually removed.
    pub fn drain(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        let before = self.current;
        self.current = (self.current - amount).max(0);
        before - self.current
    }

    /// Restore up to `amount`, returning how much was actually restored.
    pub fn restore(&mut self, amount: i32) -> i32 {
        let amount = amount.max(0);
        let before = self.current;
        self.current = (self.current + amount).min(self.maximum);
        self.current - before
    }
}

// ============================================================================
// Enemy Metadata
// ============================================================================

/// Behavior category steering the enemy's action weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyBehavior {
    Aggressive,
    Defensive,
    Balanced,
}

impl EnemyBehavior {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyBehavior::Aggressive => "aggressive",
            EnemyBehavior::Defensive => "defensive",
            EnemyBehavior::Balanced => "balanced",
        }
    }
}

/// A named special attack with a damage multiplier over the base attack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialAbility {
    pub name: String,
    pub damage_multiplier: f64,
}

impl SpecialAbility {
    pub fn new(name: impl Into<String>, damage_multiplier: f64) -> Self {
        Self {
            name: name.into(),
            damage_multiplier,
        }
    }
}

/// Fields that only exist on enemy combatants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyMeta {
    pub behavior: EnemyBehavior,
    pub special_abilities: Vec<SpecialAbility>,
    pub tier: u32,
    pub cycle_position: u32,
    pub is_boss: bool,
    pub is_elite: bool,
    pub physical_resistance: f64,
    pub magic_resistance: f64,
    pub xp_reward: u64,
    pub gold_reward: u64,
}

// ============================================================================
// Combatant
// ============================================================================

/// Shared combatant shape for the player and enemies.
///
/// HP and mana are always clamped to `[0, max]`; a combatant whose HP
/// reaches 0 is dead and may not act or be targeted further in the same
/// turn resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CharacterId,
    pub name: String,
    pub level: u32,
    pub hp: ResourcePool,
    pub mana: ResourcePool,
    pub attributes: Attributes,
    pub stats: CombatStats,
    pub status: StatusEffects,
    /// `Some` for enemies, `None` for the player.
    pub enemy: Option<EnemyMeta>,
}

impl Combatant {
    /// Create a player combatant with stats derived from attributes.
    pub fn player(name: impl Into<String>, level: u32, attributes: Attributes) -> Self {
        let stats = CombatStats::derive(&attributes, level);
        let max_hp = 50 + attributes.vitality * 10 + level as i32 * 5;
        let max_mana = 20 + attributes.wisdom * 4 + attributes.intelligence * 2;
        Self {
            id: CharacterId::new(),
            name: name.into(),
            level,
            hp: ResourcePool::new(max_hp),
            mana: ResourcePool::new(max_mana),
            attributes,
            stats,
            status: StatusEffects::default(),
            enemy: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.hp.is_empty()
    }

    pub fn is_enemy(&self) -> bool {
        self.enemy.is_some()
    }

    /// Deal damage, returning the amount actually applied after clamping.
    pub fn apply_damage(&mut self, amount: i32) -> i32 {
        self.hp.drain(amount)
    }

    /// Heal, returning the amount actually restored after clamping.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.hp.restore(amount)
    }

    /// Spend mana if available. Returns false (and spends nothing)
    /// when the pool is short.
    pub fn spend_mana(&mut self, amount: i32) -> bool {
        if self.mana.current() < amount {
            return false;
        }
        self.mana.drain(amount);
        true
    }

    /// Combat stats with equipment bonuses and status modifiers folded in.
    ///
    /// Order: flat equipment bonuses, equipment percent bonuses, then
    /// status flat and percent modifiers. The result is sanitized so a
    /// stack of debuffs can never push a stat below zero.
    pub fn effective_stats(&self, bonus: &StatBonusBundle) -> CombatStats {
        let mut s = self.stats.clone();
        s.attack += bonus.attack;
        s.defense += bonus.defense;
        s.speed += bonus.speed;
        s.magic_attack += bonus.magic_attack;
        s.crit_chance += bonus.crit_chance;
        s.crit_damage += bonus.crit_damage;
        s.double_attack_chance += bonus.double_attack_chance;
        s.magic_damage_bonus += bonus.magic_damage_bonus;

        s.attack = apply_percent(s.attack, bonus.attack_pct);
        s.defense = apply_percent(s.defense, bonus.defense_pct);
        s.speed = apply_percent(s.speed, bonus.speed_pct);

        s.attack = self.status.modified(CombatStat::Attack, s.attack as f64) as i32;
        s.defense = self.status.modified(CombatStat::Defense, s.defense as f64) as i32;
        s.speed = self.status.modified(CombatStat::Speed, s.speed as f64) as i32;
        s.magic_attack = self.status.modified(CombatStat::MagicAttack, s.magic_attack as f64) as i32;
        s.crit_chance = self.status.modified(CombatStat::CritChance, s.crit_chance);
        s.crit_damage = self.status.modified(CombatStat::CritDamage, s.crit_damage);

        s.sanitize();
        s
    }
}

fn apply_percent(value: i32, percent: f64) -> i32 {
    (value as f64 * (1.0 + percent / 100.0)).floor() as i32
}

/// Create a sample mid-game hero for tests and examples.
pub fn create_sample_hero(name: &str) -> Combatant {
    Combatant::player(name, 5, Attributes::new(14, 12, 10, 10, 12, 8))
}
