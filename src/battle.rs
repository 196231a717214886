//! The combat turn controller.
//!
//! One call to [`BattleEngine::resolve_turn`] resolves a full exchange:
//! validate the requested action, apply it, let the enemy respond when
//! the action passes the turn, then tick status effects and cooldowns.
//! Every path, including invalid input, terminates in a valid
//! [`BattleTurnResult`]; the engine never panics and never leaves a
//! combatant half-updated.

use crate::combatant::{BattleId, Combatant, EnemyBehavior};
use crate::content;
use crate::equipment::{aggregate, EquipmentSlots, StatBonusBundle};
use crate::formulas;
use crate::skills::{self, MasteryBook, MasteryProgress, SkillXpGain};
use crate::spells::{self, Spell, SpellEffectKind};
use crate::status::EffectPolarity;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Engine and session errors. Inside `resolve_turn` these are recovered
/// locally and rendered into the skip-turn message; `TurnInProgress` and
/// `CollaboratorUnavailable` surface at the session boundary.
#[derive(Debug, Error)]
pub enum BattleError {
    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("insufficient resource: {0}")]
    InsufficientResource(String),

    #[error("collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("a turn is already resolving for this battle")]
    TurnInProgress,
}

/// What the player asked to do this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    Attack,
    Defend,
    CastSpell { spell: String },
    UseConsumable { item: String },
    Flee,
    Continue,
}

/// Terminal battle outcomes. `PlayerDefeated` is permanent; the engine
/// offers no recovery from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    EnemyDefeated { xp_reward: u64, gold_reward: u64 },
    PlayerDefeated,
    Fled,
}

/// Full state of one battle. Owned by the caller and passed into
/// `resolve_turn`; the engine holds nothing between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub battle_id: BattleId,
    pub floor: u32,
    pub player: Combatant,
    pub enemy: Combatant,
    pub player_slots: EquipmentSlots,
    pub player_masteries: MasteryBook,
    pub round: u32,
    pub player_defending: bool,
    pub defend_cooldown: i32,
    pub spell_cooldowns: HashMap<String, i32>,
    pub concluded: Option<BattleOutcome>,
}

impl BattleState {
    /// Start a battle. Equipment max-HP/mana bonuses are folded into the
    /// player's pools here, once.
    pub fn new(floor: u32, mut player: Combatant, enemy: Combatant, slots: EquipmentSlots) -> Self {
        let bundle = aggregate(&slots);
        player.hp.raise_maximum(bundle.max_hp);
        player
            .hp
            .raise_maximum((player.hp.maximum() as f64 * bundle.hp_pct / 100.0).floor() as i32);
        player.mana.raise_maximum(bundle.max_mana);
        Self {
            battle_id: BattleId::new(),
            floor,
            player,
            enemy,
            player_slots: slots,
            player_masteries: MasteryBook::default(),
            round: 1,
            player_defending: false,
            defend_cooldown: 0,
            spell_cooldowns: HashMap::new(),
            concluded: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.concluded.is_some()
    }

    fn tick_cooldowns(&mut self) {
        self.defend_cooldown = (self.defend_cooldown - 1).max(0);
        for remaining in self.spell_cooldowns.values_mut() {
            *remaining -= 1;
        }
        self.spell_cooldowns.retain(|_, remaining| *remaining > 0);
    }
}

/// The controller's output for one resolved exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleTurnResult {
    pub state: BattleState,
    pub messages: Vec<String>,
    pub skill_xp: Vec<SkillXpGain>,
    pub skill_progress: Vec<MasteryProgress>,
    /// True when the action did not pass the turn to the enemy (support
    /// spells, quick items, rejected input).
    pub keeps_turn: bool,
    pub outcome: Option<BattleOutcome>,
}

/// Stateless turn resolver.
pub struct BattleEngine;

impl Default for BattleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Resolve one full turn against an immutable input state.
    pub fn resolve_turn<R: Rng>(
        &self,
        state: &BattleState,
        action: &PlayerAction,
        rng: &mut R,
    ) -> BattleTurnResult {
        let mut next = state.clone();

        if next.is_over() {
            let err = BattleError::InvalidAction("the battle is already over".to_string());
            return skip_result(next, err.to_string());
        }
        if let Some(err) = self.validate(&next, action) {
            // Rejected input: cooldowns tick, nothing else changes and
            // the turn is not consumed.
            next.tick_cooldowns();
            return skip_result(next, err.to_string());
        }

        next.player_defending = false;
        let bundle = aggregate(&next.player_slots);
        let mut messages = Vec::new();
        let mut skill_xp = Vec::new();
        let mut fled = false;

        let enemy_acts = match action {
            PlayerAction::Attack => {
                self.player_attack(&mut next, &bundle, rng, &mut messages, &mut skill_xp)
            }
            PlayerAction::Defend => {
                next.player_defending = true;
                next.defend_cooldown = 3;
                messages.push(format!("{} raises their guard.", next.player.name));
                true
            }
            PlayerAction::CastSpell { spell } => match spells::get_spell(spell) {
                Some(spell) => {
                    self.player_cast(&mut next, &spell, &bundle, &mut messages, &mut skill_xp)
                }
                None => false,
            },
            PlayerAction::UseConsumable { item } => match content::get_consumable(item) {
                Some(item) => {
                    let healed = next.player.heal(item.restore_hp);
                    let restored = next.player.mana.restore(item.restore_mana);
                    messages.push(format!(
                        "{} uses {} (+{} HP, +{} mana).",
                        next.player.name, item.name, healed, restored
                    ));
                    !item.quick
                }
                None => false,
            },
            PlayerAction::Flee => {
                fled = self.player_flee(&mut next, &bundle, rng, &mut messages);
                false
            }
            PlayerAction::Continue => {
                messages.push(format!("{} braces for the next exchange.", next.player.name));
                true
            }
        };

        let mut skill_progress = Vec::new();
        for gain in &skill_xp {
            let progress = next.player_masteries.apply(gain);
            if progress.leveled_up {
                messages.push(format!(
                    "{} reached {} level {}!",
                    next.player.name,
                    progress.skill.name(),
                    progress.new_level
                ));
            }
            skill_progress.push(progress);
        }

        if fled {
            next.concluded = Some(BattleOutcome::Fled);
            return BattleTurnResult {
                outcome: next.concluded.clone(),
                state: next,
                messages,
                skill_xp,
                skill_progress,
                keeps_turn: false,
            };
        }

        if !next.enemy.is_alive() {
            self.conclude_victory(&mut next, &mut messages);
        } else if enemy_acts {
            self.enemy_turn(&mut next, &bundle, rng, &mut messages, &mut skill_xp, &mut skill_progress);
        }

        if next.player.hp.is_empty() && next.concluded.is_none() {
            next.concluded = Some(BattleOutcome::PlayerDefeated);
            messages.push(format!("{} falls. The tower claims another.", next.player.name));
        }

        // Status effects, cooldowns, and the round counter only advance
        // when the round actually completed. Support spells and quick
        // items keep the player's turn, so a buff cast this way retains
        // its full duration for the multi-spell combo that follows.
        let round_completed = enemy_acts || matches!(action, PlayerAction::Flee);
        if next.concluded.is_none() && round_completed {
            self.end_of_turn(&mut next, &mut messages);
        }

        BattleTurnResult {
            outcome: next.concluded.clone(),
            keeps_turn: !enemy_acts
                && !matches!(action, PlayerAction::Flee)
                && next.concluded.is_none(),
            state: next,
            messages,
            skill_xp,
            skill_progress,
        }
    }

    /// Check the action against the current state. `Some(error)` means
    /// rejection; the error renders into the skip-turn message.
    fn validate(&self, state: &BattleState, action: &PlayerAction) -> Option<BattleError> {
        match action {
            PlayerAction::Defend if state.defend_cooldown > 0 => {
                Some(BattleError::InvalidAction(format!(
                    "You cannot defend again yet ({} turns remaining).",
                    state.defend_cooldown
                )))
            }
            PlayerAction::CastSpell { spell } => {
                let spell = match spells::get_spell(spell) {
                    Some(spell) => spell,
                    None => {
                        return Some(BattleError::InvalidAction(format!(
                            "You don't know the spell '{}'.",
                            spell
                        )))
                    }
                };
                if let Some(remaining) = state.spell_cooldowns.get(&spell.name) {
                    if *remaining > 0 {
                        return Some(BattleError::InsufficientResource(format!(
                            "{} is still on cooldown ({} turns remaining).",
                            spell.name, remaining
                        )));
                    }
                }
                if state.player.mana.current() < spell.mana_cost {
                    return Some(BattleError::InsufficientResource(format!(
                        "Not enough mana for {} ({} needed, {} left).",
                        spell.name,
                        spell.mana_cost,
                        state.player.mana.current()
                    )));
                }
                None
            }
            PlayerAction::UseConsumable { item } if content::get_consumable(item).is_none() => {
                Some(BattleError::InsufficientResource(format!(
                    "You don't have a '{}'.",
                    item
                )))
            }
            _ => None,
        }
    }

    /// Returns true (the turn passes to the enemy).
    fn player_attack<R: Rng>(
        &self,
        next: &mut BattleState,
        bundle: &StatBonusBundle,
        rng: &mut R,
        messages: &mut Vec<String>,
        skill_xp: &mut Vec<SkillXpGain>,
    ) -> bool {
        let pstats = next.player.effective_stats(bundle);
        let estats = next.enemy.effective_stats(&StatBonusBundle::default());
        let hit = formulas::compute_physical_damage(
            rng,
            pstats.attack,
            estats.defense,
            pstats.crit_chance,
            pstats.crit_damage,
            pstats.double_attack_chance,
            next.player.attributes.dexterity,
            pstats.speed,
        );
        let resistance = next
            .enemy
            .enemy
            .as_ref()
            .map(|m| m.physical_resistance)
            .unwrap_or(0.0);
        let dealt = ((hit.damage as f64 * (1.0 - resistance)).floor() as i32).max(1);
        let applied = next.enemy.apply_damage(dealt);

        let mut line = format!(
            "{} strikes {} for {} damage",
            next.player.name, next.enemy.name, applied
        );
        if hit.is_critical {
            line.push_str(" (critical!)");
        }
        if hit.is_double_attack {
            line.push_str(" (double attack!)");
        }
        line.push('.');
        messages.push(line);

        // XP keys off the computed damage, not the HP actually removed,
        // so a killing blow on a nearly dead enemy still pays in full.
        skill_xp.extend(skills::attack_skill_xp(&next.player_slots, dealt));
        true
    }

    fn player_cast(
        &self,
        next: &mut BattleState,
        spell: &Spell,
        bundle: &StatBonusBundle,
        messages: &mut Vec<String>,
        skill_xp: &mut Vec<SkillXpGain>,
    ) -> bool {
        if !next.player.spend_mana(spell.mana_cost) {
            // Validation already checked; degrade to a no-op message.
            messages.push(format!("{} fizzles for lack of mana.", spell.name));
            return false;
        }
        if spell.cooldown > 0 {
            next.spell_cooldowns.insert(spell.name.clone(), spell.cooldown);
        }

        let pstats = next.player.effective_stats(bundle);
        let int = next.player.attributes.intelligence;
        let wis = next.player.attributes.wisdom;
        let mastery = next.player_masteries.level(crate::skills::MasterySkill::Magic);
        let round = next.round;

        let (value, passes_turn) = match spell.effect {
            SpellEffectKind::Damage => {
                let scaled = formulas::compute_scaled_spell_damage(
                    spell.base_power + pstats.magic_attack / 2,
                    int,
                    wis,
                    mastery,
                );
                let boosted =
                    ((scaled as f64) * (1.0 + pstats.magic_damage_bonus / 100.0)).floor() as i32;
                let resistance = next
                    .enemy
                    .enemy
                    .as_ref()
                    .map(|m| m.magic_resistance)
                    .unwrap_or(0.0);
                let dealt = ((boosted as f64 * (1.0 - resistance)).floor() as i32).max(1);
                let applied = next.enemy.apply_damage(dealt);
                messages.push(format!(
                    "{} sears {} for {} damage.",
                    spell.name, next.enemy.name, applied
                ));
                (applied, true)
            }
            SpellEffectKind::Heal => {
                let scaled =
                    formulas::compute_scaled_spell_healing(spell.base_power, int, wis, mastery);
                let healed = next.player.heal(scaled);
                messages.push(format!("{} restores {} HP.", spell.name, healed));
                (healed, false)
            }
            SpellEffectKind::Buff => {
                let message = next.player.status.apply_attribute_effect(
                    &spell.name,
                    spell.attribute_class,
                    EffectPolarity::Buff,
                    spell.base_power,
                    spell.duration,
                    &next.player.name,
                    round,
                );
                messages.push(message);
                (spell.base_power, false)
            }
            SpellEffectKind::Debuff => {
                let message = next.enemy.status.apply_attribute_effect(
                    &spell.name,
                    spell.attribute_class,
                    EffectPolarity::Debuff,
                    spell.base_power,
                    spell.duration,
                    &next.player.name,
                    round,
                );
                messages.push(message);
                (spell.base_power, false)
            }
            SpellEffectKind::DamageOverTime => {
                let message = next.enemy.status.apply_over_time_effect(
                    &spell.name,
                    false,
                    spell.base_power,
                    spell.duration,
                    &next.player.name,
                );
                messages.push(message);
                (spell.base_power, true)
            }
            SpellEffectKind::HealOverTime => {
                let message = next.player.status.apply_over_time_effect(
                    &spell.name,
                    true,
                    spell.base_power,
                    spell.duration,
                    &next.player.name,
                );
                messages.push(message);
                (spell.base_power, true)
            }
        };

        skill_xp.extend(skills::magic_skill_xp(
            &next.player_slots,
            spell.mana_cost,
            value,
        ));
        passes_turn
    }

    /// Returns true on a successful escape.
    fn player_flee<R: Rng>(
        &self,
        next: &mut BattleState,
        bundle: &StatBonusBundle,
        rng: &mut R,
        messages: &mut Vec<String>,
    ) -> bool {
        let pstats = next.player.effective_stats(bundle);
        let estats = next.enemy.effective_stats(&StatBonusBundle::default());
        let chance = formulas::compute_flee_chance(pstats.speed, estats.speed);
        if rng.gen_range(0..100) < chance {
            messages.push(format!("{} slips away from {}.", next.player.name, next.enemy.name));
            return true;
        }
        // The parting blow stands in for the enemy's action this round.
        let damage = formulas::flee_failure_damage(estats.attack).max(0);
        let taken = next.player.apply_damage(damage);
        messages.push(format!(
            "{} fails to escape and takes {} damage!",
            next.player.name, taken
        ));
        false
    }

    fn enemy_turn<R: Rng>(
        &self,
        next: &mut BattleState,
        bundle: &StatBonusBundle,
        rng: &mut R,
        messages: &mut Vec<String>,
        skill_xp: &mut Vec<SkillXpGain>,
        skill_progress: &mut Vec<MasteryProgress>,
    ) {
        let Some(meta) = next.enemy.enemy.clone() else {
            return;
        };
        let estats = next.enemy.effective_stats(&StatBonusBundle::default());
        let pstats = next.player.effective_stats(bundle);

        let (special_weight, spell_weight) = match meta.behavior {
            EnemyBehavior::Aggressive => (25.0, 10.0),
            EnemyBehavior::Defensive => (30.0, 15.0),
            EnemyBehavior::Balanced => {
                if next.enemy.attributes.intelligence > next.enemy.attributes.strength {
                    (20.0, 35.0)
                } else {
                    (20.0, 20.0)
                }
            }
        };

        let roll = rng.gen_range(0.0..100.0);
        let raw_damage = if roll < special_weight && !meta.special_abilities.is_empty() {
            let ability = &meta.special_abilities[rng.gen_range(0..meta.special_abilities.len())];
            let base = ((estats.attack as f64 * ability.damage_multiplier)
                - pstats.defense as f64 * 0.5)
                .floor()
                .max(1.0) as i32;
            messages.push(format!("{} unleashes {}!", next.enemy.name, ability.name));
            base
        } else if roll < special_weight + spell_weight && next.enemy.mana.current() >= 10 {
            next.enemy.spend_mana(10);
            let damage = formulas::compute_scaled_spell_damage(
                estats.magic_attack.max(5),
                next.enemy.attributes.intelligence,
                next.enemy.attributes.wisdom,
                0,
            );
            messages.push(format!("{} weaves a baleful hex!", next.enemy.name));
            damage
        } else {
            let hit = formulas::compute_physical_damage(
                rng,
                estats.attack,
                pstats.defense,
                estats.crit_chance,
                estats.crit_damage,
                estats.double_attack_chance,
                next.enemy.attributes.dexterity,
                estats.speed,
            );
            if hit.is_critical {
                messages.push(format!("{} lands a vicious blow!", next.enemy.name));
            }
            hit.damage
        };

        let final_damage = if next.player_defending {
            let reduced = ((raw_damage as f64 * 0.15).floor() as i32).max(1);
            let blocked = (raw_damage - reduced).max(0);
            for gain in skills::defense_skill_xp(&next.player_slots, blocked) {
                let progress = next.player_masteries.apply(&gain);
                if progress.leveled_up {
                    messages.push(format!(
                        "{} reached {} level {}!",
                        next.player.name,
                        progress.skill.name(),
                        progress.new_level
                    ));
                }
                skill_xp.push(gain);
                skill_progress.push(progress);
            }
            messages.push(format!("{} blocks {} damage.", next.player.name, blocked));
            reduced
        } else {
            raw_damage
        };

        let taken = next.player.apply_damage(final_damage);
        messages.push(format!(
            "{} hits {} for {} damage.",
            next.enemy.name, next.player.name, taken
        ));
    }

    fn conclude_victory(&self, next: &mut BattleState, messages: &mut Vec<String>) {
        let (xp_reward, gold_reward) = next
            .enemy
            .enemy
            .as_ref()
            .map(|m| (m.xp_reward, m.gold_reward))
            .unwrap_or((0, 0));
        next.concluded = Some(BattleOutcome::EnemyDefeated {
            xp_reward,
            gold_reward,
        });
        messages.push(format!(
            "{} is defeated! (+{} XP, +{} gold)",
            next.enemy.name, xp_reward, gold_reward
        ));
    }

    /// Natural turn completion: tick status effects on both combatants,
    /// then cooldowns. Over-time effects can end the battle here.
    fn end_of_turn(&self, next: &mut BattleState, messages: &mut Vec<String>) {
        let player_name = next.player.name.clone();
        messages.extend(next.player.status.tick(&mut next.player.hp, &player_name));
        let enemy_name = next.enemy.name.clone();
        messages.extend(next.enemy.status.tick(&mut next.enemy.hp, &enemy_name));

        if !next.enemy.is_alive() {
            self.conclude_victory(next, messages);
        }
        if next.player.hp.is_empty() && next.concluded.is_none() {
            next.concluded = Some(BattleOutcome::PlayerDefeated);
            messages.push(format!("{} succumbs. The tower claims another.", player_name));
        }

        next.tick_cooldowns();
        next.round += 1;
    }
}

fn skip_result(state: BattleState, message: String) -> BattleTurnResult {
    BattleTurnResult {
        state,
        messages: vec![message],
        skill_xp: Vec::new(),
        skill_progress: Vec::new(),
        keeps_turn: true,
        outcome: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::create_sample_hero;
    use crate::content::sample_loadout;
    use crate::scaling::generate_enemy;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_state(floor: u32) -> BattleState {
        let player = create_sample_hero("Aria");
        let enemy = generate_enemy(floor, None).into_combatant();
        BattleState::new(floor, player, enemy, sample_loadout())
    }

    /// Draws land at the top of every range: chance rolls fail, the enemy
    /// always picks a plain attack. The low 32 bits are the largest u32
    /// that `gen_range(0..100)` accepts (yielding 99) — `u32::MAX` falls
    /// in rand's rejection zone and would loop forever on a constant RNG.
    fn high_rng() -> StepRng {
        StepRng::new(0xFFFF_FFFF_FF70_A3D7, 0)
    }

    fn engine() -> BattleEngine {
        BattleEngine::new()
    }

    #[test]
    fn test_attack_damages_enemy_and_grants_xp() {
        let state = sample_state(1);
        let before = state.enemy.hp.current();
        let result = engine().resolve_turn(&state, &PlayerAction::Attack, &mut high_rng());
        assert!(result.state.enemy.hp.current() < before);
        assert!(!result.skill_xp.is_empty());
        assert!(!result.keeps_turn);
    }

    #[test]
    fn test_unknown_spell_skips_turn_without_mutation() {
        let state = sample_state(1);
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Unwritten Word".to_string(),
            },
            &mut high_rng(),
        );
        assert!(result.keeps_turn);
        assert_eq!(result.state.player.hp.current(), state.player.hp.current());
        assert_eq!(result.state.enemy.hp.current(), state.enemy.hp.current());
        assert_eq!(result.state.round, state.round);
        assert!(result.messages[0].contains("don't know"));
    }

    #[test]
    fn test_defend_blocked_while_on_cooldown() {
        let mut state = sample_state(1);
        state.defend_cooldown = 2;
        let result = engine().resolve_turn(&state, &PlayerAction::Defend, &mut high_rng());
        assert!(result.keeps_turn);
        assert!(!result.state.player_defending);
        // Cooldowns still tick on rejected input.
        assert_eq!(result.state.defend_cooldown, 1);
    }

    #[test]
    fn test_defending_reduces_damage_to_fifteen_percent() {
        let mut state = sample_state(1);
        // Strip the shield so defense XP stays predictable but damage
        // still lands.
        state.player.stats.defense = 0;
        state.player_slots = EquipmentSlots::default();
        let undefended = engine().resolve_turn(&state, &PlayerAction::Continue, &mut high_rng());
        let defended = engine().resolve_turn(&state, &PlayerAction::Defend, &mut high_rng());

        let full = state.player.hp.current() - undefended.state.player.hp.current();
        let reduced = state.player.hp.current() - defended.state.player.hp.current();
        assert!(full > 0);
        assert_eq!(reduced, ((full as f64 * 0.15).floor() as i32).max(1));
        assert!(defended
            .skill_xp
            .iter()
            .any(|g| g.skill == crate::skills::MasterySkill::Defense));
    }

    #[test]
    fn test_heal_spell_keeps_turn() {
        let mut state = sample_state(1);
        state.player.hp.set_current(20);
        let before_enemy_hp = state.enemy.hp.current();
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Mend Wounds".to_string(),
            },
            &mut high_rng(),
        );
        assert!(result.keeps_turn);
        assert!(result.state.player.hp.current() > 20);
        // The enemy never acted.
        assert_eq!(result.state.enemy.hp.current(), before_enemy_hp);
    }

    #[test]
    fn test_damage_spell_passes_turn() {
        let state = sample_state(1);
        let player_hp = state.player.hp.current();
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Fire Bolt".to_string(),
            },
            &mut high_rng(),
        );
        assert!(!result.keeps_turn || result.outcome.is_some());
        if result.outcome.is_none() {
            assert!(result.state.player.hp.current() < player_hp);
        }
    }

    #[test]
    fn test_spell_requires_mana() {
        let mut state = sample_state(1);
        state.player.mana.set_current(0);
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Fire Bolt".to_string(),
            },
            &mut high_rng(),
        );
        assert!(result.keeps_turn);
        assert!(result.messages[0].contains("Not enough mana"));
    }

    #[test]
    fn test_spell_cooldown_enforced() {
        let state = sample_state(1);
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Ember Storm".to_string(),
            },
            &mut high_rng(),
        );
        if result.outcome.is_some() {
            return; // one cast ended the battle; nothing left to check
        }
        assert!(result.state.spell_cooldowns.contains_key("Ember Storm"));
        let again = engine().resolve_turn(
            &result.state,
            &PlayerAction::CastSpell {
                spell: "Ember Storm".to_string(),
            },
            &mut high_rng(),
        );
        assert!(again.keeps_turn);
        assert!(again.messages[0].contains("cooldown"));
    }

    #[test]
    fn test_enemy_defeat_ends_turn_without_enemy_action() {
        let mut state = sample_state(1);
        state.enemy.hp.set_current(1);
        let player_hp = state.player.hp.current();
        let result = engine().resolve_turn(&state, &PlayerAction::Attack, &mut high_rng());
        assert!(matches!(
            result.outcome,
            Some(BattleOutcome::EnemyDefeated { .. })
        ));
        assert_eq!(result.state.player.hp.current(), player_hp);
    }

    #[test]
    fn test_lethal_damage_is_terminal() {
        let mut state = sample_state(1);
        state.player.hp.set_current(1);
        state.player.stats.defense = 0;
        state.player_slots = EquipmentSlots::default();
        let result = engine().resolve_turn(&state, &PlayerAction::Continue, &mut high_rng());
        assert_eq!(result.outcome, Some(BattleOutcome::PlayerDefeated));
        assert_eq!(result.state.player.hp.current(), 0);

        // Terminal: further actions are rejected outright.
        let after = engine().resolve_turn(&result.state, &PlayerAction::Attack, &mut high_rng());
        assert!(after.keeps_turn);
        assert!(after.messages[0].contains("already over"));
    }

    #[test]
    fn test_dot_expires_after_duration() {
        let state = sample_state(1);
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::CastSpell {
                spell: "Venom Cloud".to_string(),
            },
            &mut high_rng(),
        );
        if result.outcome.is_some() {
            return;
        }
        // Venom Cloud runs 3 turns; after the cast turn's tick it has 2 left.
        assert_eq!(result.state.enemy.status.damage_over_time.len(), 1);
        assert_eq!(result.state.enemy.status.damage_over_time[0].remaining_turns, 2);
    }

    #[test]
    fn test_flee_success_concludes_battle() {
        let mut rng = StepRng::new(0, 0); // roll 0 always beats the chance
        let state = sample_state(1);
        let result = engine().resolve_turn(&state, &PlayerAction::Flee, &mut rng);
        assert_eq!(result.outcome, Some(BattleOutcome::Fled));
    }

    #[test]
    fn test_flee_failure_hurts_player() {
        let mut state = sample_state(3);
        state.player_slots = EquipmentSlots::default();
        let before = state.player.hp.current();
        let result = engine().resolve_turn(&state, &PlayerAction::Flee, &mut high_rng());
        assert_eq!(result.outcome, None);
        assert!(result.state.player.hp.current() < before);
    }

    #[test]
    fn test_quick_consumable_keeps_turn() {
        let mut state = sample_state(1);
        state.player.hp.set_current(10);
        let result = engine().resolve_turn(
            &state,
            &PlayerAction::UseConsumable {
                item: "Swift Tonic".to_string(),
            },
            &mut high_rng(),
        );
        assert!(result.keeps_turn);
        assert!(result.state.player.hp.current() > 10);
    }

    #[test]
    fn test_support_combo_preserves_buff_duration() {
        let state = sample_state(1);
        let enemy_hp = state.enemy.hp.current();

        // Buff, then chain two more support casts. The turn never passes,
        // so nothing ticks: the buff keeps its full duration and the
        // round counter stays put.
        let mut state = engine()
            .resolve_turn(
                &state,
                &PlayerAction::CastSpell {
                    spell: "Força Interior".to_string(),
                },
                &mut high_rng(),
            )
            .state;
        for _ in 0..2 {
            let result = engine().resolve_turn(
                &state,
                &PlayerAction::CastSpell {
                    spell: "Mend Wounds".to_string(),
                },
                &mut high_rng(),
            );
            assert!(result.keeps_turn);
            state = result.state;
        }

        assert_eq!(state.player.status.buffs.len(), 1);
        assert_eq!(state.player.status.buffs[0].remaining_turns, 3);
        assert_eq!(state.round, 1);
        assert_eq!(state.enemy.hp.current(), enemy_hp);
    }

    #[test]
    fn test_killing_blow_pays_full_attack_xp() {
        let mut state = sample_state(1);
        state.enemy.hp.set_current(1);
        let result = engine().resolve_turn(&state, &PlayerAction::Attack, &mut high_rng());
        assert!(matches!(
            result.outcome,
            Some(BattleOutcome::EnemyDefeated { .. })
        ));
        // Only 1 HP was removed, but the award follows the computed
        // damage, well past the 1-XP floor.
        assert!(result.skill_xp[0].amount > 1);
    }

    #[test]
    fn test_battle_state_round_trips_through_json() {
        let state = sample_state(5);
        let encoded = serde_json::to_string(&state).unwrap();
        let decoded: BattleState = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.battle_id, state.battle_id);
        assert_eq!(decoded.enemy.name, state.enemy.name);
        assert_eq!(decoded.player.hp.current(), state.player.hp.current());
    }

    #[test]
    fn test_turn_resolution_is_deterministic_per_seed() {
        let state = sample_state(7);
        let a = engine().resolve_turn(&state, &PlayerAction::Attack, &mut StdRng::seed_from_u64(9));
        let b = engine().resolve_turn(&state, &PlayerAction::Attack, &mut StdRng::seed_from_u64(9));
        assert_eq!(a.state.enemy.hp.current(), b.state.enemy.hp.current());
        assert_eq!(a.messages, b.messages);
    }
}
