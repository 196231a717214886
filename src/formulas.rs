//! Pure combat formulas.
//!
//! Every function here is stateless: rolls draw from an injected [`Rng`]
//! so callers (and tests) control the randomness channel, and nothing
//! mutates combatant state. Damage never resolves below 1.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The outcome of one physical attack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalHit {
    pub damage: i32,
    pub is_critical: bool,
    pub is_double_attack: bool,
    pub hit_count: u8,
}

/// Resolve a physical attack.
///
/// Base damage is `max(1, floor(atk - def * 0.5))`. When the attacker's
/// effective attack is zero or less the hit floors at 1 damage and no
/// critical or double-attack roll happens. The two rolls are independent
/// and may both trigger on the same hit.
pub fn compute_physical_damage<R: Rng>(
    rng: &mut R,
    attack: i32,
    defense: i32,
    crit_chance: f64,
    crit_damage_pct: f64,
    double_attack_chance: f64,
    dexterity: i32,
    speed: i32,
) -> PhysicalHit {
    if attack <= 0 {
        return PhysicalHit {
            damage: 1,
            is_critical: false,
            is_double_attack: false,
            hit_count: 1,
        };
    }

    let base = (attack as f64 - defense as f64 * 0.5).floor().max(1.0);
    let mut damage = base;

    let is_critical = rng.gen_range(0.0..100.0) < crit_chance;
    if is_critical {
        damage = (damage * crit_damage_pct / 100.0).floor();
    }

    let effective_double = (double_attack_chance
        + ((dexterity - 10) as f64 * 0.5).floor()
        + ((speed - 10) as f64 * 0.3).floor())
    .clamp(0.0, 35.0);
    let is_double_attack = rng.gen_range(0.0..100.0) < effective_double;
    if is_double_attack {
        damage *= 2.0;
    }

    PhysicalHit {
        damage: (damage as i32).max(1),
        is_critical,
        is_double_attack,
        hit_count: if is_double_attack { 2 } else { 1 },
    }
}

/// Stat-derived initiative with a ±10% jitter, floored at 1.
///
/// The strict player/enemy alternation does not consult this; it exists
/// for free-for-all turn ordering.
pub fn compute_initiative<R: Rng>(rng: &mut R, speed: i32, dexterity: i32) -> i32 {
    let base = (speed + (dexterity as f64 * 0.5).floor() as i32) as f64;
    let jitter = rng.gen_range(0.9..1.1);
    ((base * jitter).floor() as i32).max(1)
}

/// Extra turns earned from a speed advantage, in `[0, 3]`.
///
/// A non-positive defender speed short-circuits to 2 rather than dividing
/// by zero.
pub fn compute_extra_turns<R: Rng>(rng: &mut R, attacker_speed: i32, defender_speed: i32) -> u32 {
    if defender_speed <= 0 {
        return 2;
    }
    let ratio = attacker_speed as f64 / defender_speed as f64;
    let mut turns: u32 = if ratio >= 3.5 {
        3
    } else if ratio >= 2.5 {
        2
    } else if ratio >= 1.8 {
        1
    } else {
        0
    };
    if rng.gen_range(0.0..100.0) < 20.0 {
        turns = (turns + 1).min(3);
    }
    turns
}

/// Flee success chance in percent, clamped to `[15, 95]`.
pub fn compute_flee_chance(player_speed: i32, enemy_speed: i32) -> i32 {
    (70 + (player_speed - enemy_speed) * 2).clamp(15, 95)
}

/// Damage taken when a flee attempt fails.
pub fn flee_failure_damage(enemy_attack: i32) -> i32 {
    (enemy_attack as f64 * 0.3).floor() as i32
}

/// Superlinear caster-stat bonus in percent, with diminishing returns
/// above `threshold` and a hard cap.
fn caster_bonus_percent(raw: f64, threshold: f64, cap: f64) -> f64 {
    let bonus = if raw > threshold {
        threshold + (raw - threshold) * 0.5
    } else {
        raw
    };
    bonus.min(cap)
}

/// Spell damage scaled by caster attributes and magic mastery.
///
/// Intelligence dominates (`int^1.35`), wisdom and mastery contribute
/// less steeply; the total bonus caps at +300%.
pub fn compute_scaled_spell_damage(
    base: i32,
    intelligence: i32,
    wisdom: i32,
    mastery_level: u32,
) -> i32 {
    let raw = (intelligence.max(0) as f64).powf(1.35) * 0.8
        + (wisdom.max(0) as f64).powf(1.2) * 0.3
        + (mastery_level as f64).powf(1.2) * 2.0;
    let bonus = caster_bonus_percent(raw, 150.0, 300.0);
    ((base.max(1) as f64) * (1.0 + bonus / 100.0)).floor() as i32
}

/// Spell healing scaled by caster attributes and magic mastery.
///
/// Wisdom dominates here; the total bonus caps at +220%.
pub fn compute_scaled_spell_healing(
    base: i32,
    intelligence: i32,
    wisdom: i32,
    mastery_level: u32,
) -> i32 {
    let raw = (wisdom.max(0) as f64).powf(1.2) * 0.9
        + (intelligence.max(0) as f64).powf(1.35) * 0.25
        + (mastery_level as f64).powf(1.2) * 1.8;
    let bonus = caster_bonus_percent(raw, 120.0, 220.0);
    ((base.max(1) as f64) * (1.0 + bonus / 100.0)).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// An RNG whose every uniform draw lands at the bottom of the range,
    /// so any roll with a positive chance succeeds.
    fn always_low() -> StepRng {
        StepRng::new(0, 0)
    }

    /// An RNG whose draws land at the top of the range, so chance rolls
    /// below 100% fail.
    fn always_high() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_plain_hit_scenario() {
        // atk 50 vs def 20, no crit or double channels.
        let mut rng = StdRng::seed_from_u64(7);
        let hit = compute_physical_damage(&mut rng, 50, 20, 0.0, 150.0, 0.0, 10, 10);
        assert_eq!(hit.damage, 40);
        assert!(!hit.is_critical);
        assert!(!hit.is_double_attack);
        assert_eq!(hit.hit_count, 1);
    }

    #[test]
    fn test_damage_floors_at_one() {
        let mut rng = StdRng::seed_from_u64(1);
        for (atk, def) in [(1, 100), (10, 20), (0, 0), (-5, 3)] {
            let hit = compute_physical_damage(&mut rng, atk, def, 0.0, 150.0, 0.0, 10, 10);
            assert!(hit.damage >= 1, "atk={} def={}", atk, def);
        }
    }

    #[test]
    fn test_nonpositive_attack_skips_rolls() {
        let mut rng = always_low();
        let hit = compute_physical_damage(&mut rng, 0, 5, 100.0, 200.0, 35.0, 30, 30);
        assert_eq!(hit.damage, 1);
        assert!(!hit.is_critical);
        assert!(!hit.is_double_attack);
    }

    #[test]
    fn test_crit_and_double_are_independent() {
        // Force both channels: damage = floor(base * critMult) * 2.
        let mut rng = always_low();
        let hit = compute_physical_damage(&mut rng, 50, 20, 100.0, 175.0, 35.0, 10, 10);
        // base 40, crit 40*1.75 = 70, doubled 140
        assert!(hit.is_critical);
        assert!(hit.is_double_attack);
        assert_eq!(hit.hit_count, 2);
        assert_eq!(hit.damage, 140);
    }

    #[test]
    fn test_double_attack_chance_caps_at_35() {
        // dex/speed push the effective chance far past the cap; a draw at
        // the top of the range must still fail.
        let mut rng = always_high();
        let hit = compute_physical_damage(&mut rng, 50, 0, 0.0, 150.0, 35.0, 200, 200);
        assert!(!hit.is_double_attack);
    }

    #[test]
    fn test_initiative_floors_at_one() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            assert!(compute_initiative(&mut rng, 0, 0) >= 1);
        }
    }

    #[test]
    fn test_extra_turns_thresholds() {
        let mut rng = always_high(); // suppress the 20% bonus roll
        assert_eq!(compute_extra_turns(&mut rng, 35, 10), 3);
        assert_eq!(compute_extra_turns(&mut rng, 25, 10), 2);
        assert_eq!(compute_extra_turns(&mut rng, 18, 10), 1);
        assert_eq!(compute_extra_turns(&mut rng, 12, 10), 0);
    }

    #[test]
    fn test_extra_turns_zero_defender_speed() {
        let mut rng = always_low();
        assert_eq!(compute_extra_turns(&mut rng, 50, 0), 2);
        assert_eq!(compute_extra_turns(&mut rng, 50, -3), 2);
    }

    #[test]
    fn test_extra_turns_bonus_capped() {
        let mut rng = always_low(); // bonus roll always succeeds
        assert_eq!(compute_extra_turns(&mut rng, 35, 10), 3);
        assert_eq!(compute_extra_turns(&mut rng, 25, 10), 3);
    }

    #[test]
    fn test_flee_chance_clamped() {
        assert_eq!(compute_flee_chance(10, 10), 70);
        assert_eq!(compute_flee_chance(1000, 0), 95);
        assert_eq!(compute_flee_chance(0, 1000), 15);
        assert_eq!(compute_flee_chance(i32::MIN / 4, i32::MAX / 4), 15);
    }

    #[test]
    fn test_spell_damage_caps() {
        // Extreme caster stats cannot push the multiplier past 4x.
        let capped = compute_scaled_spell_damage(100, 999, 999, 99);
        assert_eq!(capped, 400);

        let modest = compute_scaled_spell_damage(100, 10, 10, 1);
        assert!(modest > 100);
        assert!(modest < capped);
    }

    #[test]
    fn test_spell_healing_caps() {
        let capped = compute_scaled_spell_healing(100, 999, 999, 99);
        assert_eq!(capped, 320);
    }

    #[test]
    fn test_healing_favors_wisdom() {
        let wise = compute_scaled_spell_healing(50, 5, 20, 0);
        let smart = compute_scaled_spell_healing(50, 20, 5, 0);
        assert!(wise >= smart);
    }
}
