//! Procedural enemy scaling.
//!
//! Every enemy stat block is a deterministic function of the floor
//! number: a 20-floor tier cycle scales base stats geometrically per tier
//! and linearly within the cycle, with boss/elite multipliers on top.
//! This generator is the authoritative fallback whenever no authored
//! monster exists for a floor.

use crate::combatant::{
    Attributes, CharacterId, CombatStats, Combatant, EnemyBehavior, EnemyMeta, ResourcePool,
    SpecialAbility,
};
use crate::status::StatusEffects;
use serde::{Deserialize, Serialize};

/// Floors per tier.
pub const FLOORS_PER_TIER: u32 = 20;

/// A complete generated (or authored) enemy definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStatBlock {
    pub name: String,
    pub level: u32,
    pub attributes: Attributes,
    pub max_hp: i32,
    pub max_mana: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub magic_attack: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub physical_resistance: f64,
    pub magic_resistance: f64,
    pub behavior: EnemyBehavior,
    pub special_abilities: Vec<SpecialAbility>,
    pub tier: u32,
    pub cycle_position: u32,
    pub is_boss: bool,
    pub is_elite: bool,
    pub xp_reward: u64,
    pub gold_reward: u64,
}

pub fn tier_for_floor(floor: u32) -> u32 {
    (floor / FLOORS_PER_TIER + 1).max(1)
}

pub fn cycle_position(floor: u32) -> u32 {
    (floor.saturating_sub(1) % FLOORS_PER_TIER) + 1
}

pub fn is_boss_floor(floor: u32) -> bool {
    floor == 5 || (floor > 0 && floor % 10 == 0)
}

pub fn is_elite_floor(floor: u32) -> bool {
    floor % 5 == 0 && floor > 5 && !is_boss_floor(floor)
}

const CYCLE_NAMES: [&str; 20] = [
    "Slime", "Rat", "Goblin", "Wolf", "Skeleton", "Orc", "Spider", "Wraith", "Golem", "Harpy",
    "Bandit", "Imp", "Basilisk", "Troll", "Gargoyle", "Lich", "Ogre", "Drake", "Revenant",
    "Chimera",
];

const TIER_PREFIXES: [&str; 5] = ["", "Dire ", "Ancient ", "Infernal ", "Abyssal "];

/// Base HP/attack/defense before any multiplier, bucketed by floor range.
fn base_stats(floor: u32, tier: u32) -> (f64, f64, f64) {
    let f = floor as f64;
    if floor <= 5 {
        (40.0 + f * 12.0, 8.0 + f * 2.0, 3.0 + f)
    } else if floor <= 20 {
        (90.0 + f * 10.0, 14.0 + f * 1.8, 6.0 + f * 1.2)
    } else if floor <= 50 {
        (180.0 + f * 9.0, 30.0 + f * 1.5, 18.0 + f)
    } else if floor <= 100 {
        (350.0 + f * 8.0, 60.0 + f * 1.2, 40.0 + f * 0.8)
    } else {
        let t = tier as f64;
        (150.0 * t + f * 6.0, 25.0 * t + f, 18.0 * t + f * 0.5)
    }
}

/// Generate the enemy for a floor.
///
/// When an authored monster exists it wins, but its numeric fields still
/// pass through [`sanitize`] so out-of-band authored values cannot leak
/// into combat.
pub fn generate_enemy(floor: u32, authored: Option<EnemyStatBlock>) -> EnemyStatBlock {
    if let Some(mut block) = authored {
        sanitize(&mut block);
        return block;
    }

    let floor = floor.max(1);
    let tier = tier_for_floor(floor);
    let cycle = cycle_position(floor);
    let is_boss = is_boss_floor(floor);
    let is_elite = is_elite_floor(floor);

    let tier_mult = 1.5f64.powi(tier as i32 - 1);
    let cycle_mult = 1.0 + (cycle - 1) as f64 * 0.03;
    let rank_mult = if is_boss {
        1.4
    } else if is_elite {
        1.3
    } else {
        1.0
    };

    let (base_hp, base_atk, base_def) = base_stats(floor, tier);
    let scale = |base: f64| (base * tier_mult * cycle_mult * rank_mult).floor() as i32;

    let base_name = CYCLE_NAMES[(cycle - 1) as usize % CYCLE_NAMES.len()];
    let prefix = TIER_PREFIXES[((tier - 1) as usize).min(TIER_PREFIXES.len() - 1)];
    let name = if is_boss {
        format!("{}{} Overlord", prefix, base_name)
    } else if is_elite {
        format!("Elite {}{}", prefix, base_name)
    } else {
        format!("{}{}", prefix, base_name)
    };

    let behavior = if is_boss {
        EnemyBehavior::Aggressive
    } else {
        match cycle % 3 {
            0 => EnemyBehavior::Balanced,
            1 => EnemyBehavior::Aggressive,
            _ => EnemyBehavior::Defensive,
        }
    };

    let special_abilities = special_abilities_for(floor, is_boss, is_elite);

    let f = floor as i32;
    let attributes = Attributes::new(
        5 + f / 2,
        5 + f / 3,
        4 + f / 3,
        4 + f / 3,
        5 + f / 2,
        5,
    );

    // Reward multipliers follow the stat scaling shape but with their own
    // tables: flatter tier growth, steeper boss/elite factors.
    let reward_tier_mult = 1.4f64.powi(tier as i32 - 1);
    let reward_cycle_mult = 1.0 + (cycle - 1) as f64 * 0.02;
    let (xp_rank, gold_rank) = if is_boss {
        (2.5, 2.0)
    } else if is_elite {
        (1.8, 1.5)
    } else {
        (1.0, 1.0)
    };
    let reward = |base: f64, rank: f64| {
        (base * reward_tier_mult * reward_cycle_mult * rank).floor() as u64
    };

    let attack = scale(base_atk);
    let mut block = EnemyStatBlock {
        name,
        level: floor,
        attributes,
        max_hp: scale(base_hp),
        max_mana: 20 + f * 2,
        attack,
        defense: scale(base_def),
        speed: 5 + f / 2,
        magic_attack: (attack as f64 * 0.7).floor() as i32,
        crit_chance: 3.0 + tier as f64 * 2.5,
        crit_damage: 150.0 + tier as f64 * 5.0,
        physical_resistance: (tier - 1) as f64 * 0.04,
        magic_resistance: (tier - 1) as f64 * 0.06,
        behavior,
        special_abilities,
        tier,
        cycle_position: cycle,
        is_boss,
        is_elite,
        xp_reward: reward(8.0 + floor as f64 * 6.0, xp_rank),
        gold_reward: reward(4.0 + floor as f64 * 3.0, gold_rank),
    };
    sanitize(&mut block);
    block
}

fn special_abilities_for(floor: u32, is_boss: bool, is_elite: bool) -> Vec<SpecialAbility> {
    if is_boss {
        vec![
            SpecialAbility::new("Crushing Blow", 1.6),
            SpecialAbility::new("Doom Wave", 1.8),
        ]
    } else if is_elite {
        vec![SpecialAbility::new("Savage Rend", 1.4)]
    } else if floor % 4 == 0 {
        vec![SpecialAbility::new("Wild Lunge", 1.3)]
    } else {
        Vec::new()
    }
}

/// Clamp every derived numeric field into its band so high tiers (and
/// hand-authored blocks) cannot run away.
pub fn sanitize(block: &mut EnemyStatBlock) {
    block.max_hp = block.max_hp.max(1);
    block.max_mana = block.max_mana.max(0);
    block.attack = block.attack.max(1);
    block.defense = block.defense.max(0);
    block.speed = block.speed.max(1);
    block.magic_attack = block.magic_attack.max(0);
    block.crit_chance = block.crit_chance.clamp(0.0, 40.0);
    block.crit_damage = block.crit_damage.clamp(100.0, 250.0);
    block.physical_resistance = block.physical_resistance.clamp(0.0, 0.25);
    block.magic_resistance = block.magic_resistance.clamp(0.0, 0.4);
}

impl EnemyStatBlock {
    /// Materialize the block as a live combatant.
    pub fn into_combatant(self) -> Combatant {
        let stats = CombatStats {
            attack: self.attack,
            defense: self.defense,
            speed: self.speed,
            magic_attack: self.magic_attack,
            crit_chance: self.crit_chance,
            crit_damage: self.crit_damage,
            double_attack_chance: 0.0,
            magic_damage_bonus: 0.0,
        };
        Combatant {
            id: CharacterId::new(),
            name: self.name,
            level: self.level,
            hp: ResourcePool::new(self.max_hp),
            mana: ResourcePool::new(self.max_mana.max(1)),
            attributes: self.attributes,
            stats,
            status: StatusEffects::default(),
            enemy: Some(EnemyMeta {
                behavior: self.behavior,
                special_abilities: self.special_abilities,
                tier: self.tier,
                cycle_position: self.cycle_position,
                is_boss: self.is_boss,
                is_elite: self.is_elite,
                physical_resistance: self.physical_resistance,
                magic_resistance: self.magic_resistance,
                xp_reward: self.xp_reward,
                gold_reward: self.gold_reward,
            }),
        }
    }
}
