//! Equipment: slots, item data, and the bonus aggregator.
//!
//! Items are immutable reference data; only slot assignment changes.
//! Slot-type compatibility is enforced at equip time, not at read time.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Slots
// ============================================================================

/// The named equipment slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipSlot {
    MainHand,
    OffHand,
    Body,
    Head,
    Legs,
    Feet,
    RingLeft,
    RingRight,
    Necklace,
    Amulet,
}

impl EquipSlot {
    pub fn name(&self) -> &'static str {
        match self {
            EquipSlot::MainHand => "main hand",
            EquipSlot::OffHand => "off hand",
            EquipSlot::Body => "body",
            EquipSlot::Head => "head",
            EquipSlot::Legs => "legs",
            EquipSlot::Feet => "feet",
            EquipSlot::RingLeft => "left ring",
            EquipSlot::RingRight => "right ring",
            EquipSlot::Necklace => "necklace",
            EquipSlot::Amulet => "amulet",
        }
    }

    pub fn all() -> [EquipSlot; 10] {
        [
            EquipSlot::MainHand,
            EquipSlot::OffHand,
            EquipSlot::Body,
            EquipSlot::Head,
            EquipSlot::Legs,
            EquipSlot::Feet,
            EquipSlot::RingLeft,
            EquipSlot::RingRight,
            EquipSlot::Necklace,
            EquipSlot::Amulet,
        ]
    }
}

impl fmt::Display for EquipSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Item Data
// ============================================================================

/// Weapon subtype, fixed at authoring time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponClass {
    Sword,
    Axe,
    Blunt,
    Staff,
    Dagger,
}

impl WeaponClass {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponClass::Sword => "sword",
            WeaponClass::Axe => "axe",
            WeaponClass::Blunt => "blunt",
            WeaponClass::Staff => "staff",
            WeaponClass::Dagger => "dagger",
        }
    }
}

/// One-time migration helper: derive the weapon class from a legacy item
/// display name. Unmatched names fall back to [`WeaponClass::Sword`],
/// preserved deliberately for compatibility with existing authored
/// content.
pub fn classify_weapon_name(name: &str) -> WeaponClass {
    let lower = name.to_lowercase();
    const TABLE: &[(&[&str], WeaponClass)] = &[
        (&["dagger", "adaga", "knife"], WeaponClass::Dagger),
        (&["axe", "machado", "hatchet"], WeaponClass::Axe),
        (
            &["mace", "hammer", "club", "martelo", "clava", "maul"],
            WeaponClass::Blunt,
        ),
        (&["staff", "wand", "cajado", "varinha"], WeaponClass::Staff),
        (&["sword", "espada", "blade", "lamina"], WeaponClass::Sword),
    ];
    for (keywords, class) in TABLE {
        if keywords.iter().any(|k| lower.contains(k)) {
            return *class;
        }
    }
    WeaponClass::Sword
}

/// Which armor slot an armor piece fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorPiece {
    Body,
    Head,
    Legs,
    Feet,
}

/// Which accessory slot an accessory fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessoryKind {
    Ring,
    Necklace,
    Amulet,
}

/// Item category, determining slot compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Weapon(WeaponClass),
    Shield,
    Armor(ArmorPiece),
    Accessory(AccessoryKind),
}

impl ItemKind {
    /// Whether an item of this kind may occupy `slot`.
    pub fn allowed_in(&self, slot: EquipSlot) -> bool {
        match self {
            ItemKind::Weapon(_) => matches!(slot, EquipSlot::MainHand | EquipSlot::OffHand),
            ItemKind::Shield => slot == EquipSlot::OffHand,
            ItemKind::Armor(piece) => matches!(
                (piece, slot),
                (ArmorPiece::Body, EquipSlot::Body)
                    | (ArmorPiece::Head, EquipSlot::Head)
                    | (ArmorPiece::Legs, EquipSlot::Legs)
                    | (ArmorPiece::Feet, EquipSlot::Feet)
            ),
            ItemKind::Accessory(kind) => matches!(
                (kind, slot),
                (AccessoryKind::Ring, EquipSlot::RingLeft)
                    | (AccessoryKind::Ring, EquipSlot::RingRight)
                    | (AccessoryKind::Necklace, EquipSlot::Necklace)
                    | (AccessoryKind::Amulet, EquipSlot::Amulet)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

/// Flat per-stat bonuses an item grants.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBonuses {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub magic_attack: i32,
    pub max_hp: i32,
    pub max_mana: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub double_attack_chance: f64,
    pub magic_damage_bonus: f64,
}

/// Static item data. Immutable once authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub name: String,
    pub kind: ItemKind,
    pub rarity: Rarity,
    pub bonuses: StatBonuses,
    pub level_requirement: u32,
}

impl Equipment {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rarity: Rarity::Common,
            bonuses: StatBonuses::default(),
            level_requirement: 1,
        }
    }

    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn with_bonuses(mut self, bonuses: StatBonuses) -> Self {
        self.bonuses = bonuses;
        self
    }

    pub fn with_level_requirement(mut self, level: u32) -> Self {
        self.level_requirement = level;
        self
    }

    pub fn is_weapon(&self) -> bool {
        matches!(self.kind, ItemKind::Weapon(_))
    }

    pub fn is_shield(&self) -> bool {
        self.kind == ItemKind::Shield
    }

    pub fn weapon_class(&self) -> Option<WeaponClass> {
        match self.kind {
            ItemKind::Weapon(class) => Some(class),
            _ => None,
        }
    }
}

// ============================================================================
// Slot Set
// ============================================================================

/// Errors from equip attempts.
#[derive(Debug, Error)]
pub enum EquipError {
    #[error("{item} cannot be equipped in the {slot} slot")]
    SlotMismatch { item: String, slot: EquipSlot },

    #[error("{item} requires level {required} (character is level {level})")]
    LevelTooLow {
        item: String,
        required: u32,
        level: u32,
    },
}

/// A character's equipped items, one per slot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentSlots {
    pub main_hand: Option<Equipment>,
    pub off_hand: Option<Equipment>,
    pub body: Option<Equipment>,
    pub head: Option<Equipment>,
    pub legs: Option<Equipment>,
    pub feet: Option<Equipment>,
    pub ring_left: Option<Equipment>,
    pub ring_right: Option<Equipment>,
    pub necklace: Option<Equipment>,
    pub amulet: Option<Equipment>,
}

impl EquipmentSlots {
    pub fn get(&self, slot: EquipSlot) -> Option<&Equipment> {
        self.slot_ref(slot).as_ref()
    }

    fn slot_ref(&self, slot: EquipSlot) -> &Option<Equipment> {
        match slot {
            EquipSlot::MainHand => &self.main_hand,
            EquipSlot::OffHand => &self.off_hand,
            EquipSlot::Body => &self.body,
            EquipSlot::Head => &self.head,
            EquipSlot::Legs => &self.legs,
            EquipSlot::Feet => &self.feet,
            EquipSlot::RingLeft => &self.ring_left,
            EquipSlot::RingRight => &self.ring_right,
            EquipSlot::Necklace => &self.necklace,
            EquipSlot::Amulet => &self.amulet,
        }
    }

    fn slot_mut(&mut self, slot: EquipSlot) -> &mut Option<Equipment> {
        match slot {
            EquipSlot::MainHand => &mut self.main_hand,
            EquipSlot::OffHand => &mut self.off_hand,
            EquipSlot::Body => &mut self.body,
            EquipSlot::Head => &mut self.head,
            EquipSlot::Legs => &mut self.legs,
            EquipSlot::Feet => &mut self.feet,
            EquipSlot::RingLeft => &mut self.ring_left,
            EquipSlot::RingRight => &mut self.ring_right,
            EquipSlot::Necklace => &mut self.necklace,
            EquipSlot::Amulet => &mut self.amulet,
        }
    }

    /// Equip an item, returning whatever previously occupied the slot.
    pub fn equip(
        &mut self,
        slot: EquipSlot,
        item: Equipment,
        wearer_level: u32,
    ) -> Result<Option<Equipment>, EquipError> {
        if !item.kind.allowed_in(slot) {
            return Err(EquipError::SlotMismatch {
                item: item.name,
                slot,
            });
        }
        if item.level_requirement > wearer_level {
            return Err(EquipError::LevelTooLow {
                item: item.name,
                required: item.level_requirement,
                level: wearer_level,
            });
        }
        Ok(self.slot_mut(slot).replace(item))
    }

    pub fn unequip(&mut self, slot: EquipSlot) -> Option<Equipment> {
        self.slot_mut(slot).take()
    }

    /// Occupied slots in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (EquipSlot, &Equipment)> {
        EquipSlot::all()
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|item| (slot, item)))
    }

    /// Both hands hold weapons.
    pub fn is_dual_wielding(&self) -> bool {
        self.main_hand.as_ref().is_some_and(Equipment::is_weapon)
            && self.off_hand.as_ref().is_some_and(Equipment::is_weapon)
    }

    /// A shield sits in the off-hand.
    pub fn has_shield(&self) -> bool {
        self.off_hand.as_ref().is_some_and(Equipment::is_shield)
    }
}

// ============================================================================
// Bonus Aggregation
// ============================================================================

/// The flat and percentage bonuses of a full equipment set, after
/// penalties and set bonuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatBonusBundle {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub magic_attack: i32,
    pub max_hp: i32,
    pub max_mana: i32,
    pub crit_chance: f64,
    pub crit_damage: f64,
    pub double_attack_chance: f64,
    pub magic_damage_bonus: f64,
    pub attack_pct: f64,
    pub defense_pct: f64,
    pub speed_pct: f64,
    pub hp_pct: f64,
}

/// Fold an equipped-item set into one stat-bonus bundle.
///
/// Off-hand weapons contribute at 80% efficiency (shields at 100%). Armor
/// and accessory set bonuses are overriding tiers: only the highest tier
/// met applies, tiers never stack. Dual-wielding multiplies the summed
/// flat attack by 1.15 after all set bonuses.
pub fn aggregate(slots: &EquipmentSlots) -> StatBonusBundle {
    let mut bundle = StatBonusBundle::default();

    for (slot, item) in slots.iter() {
        let scale = if slot == EquipSlot::OffHand && item.is_weapon() {
            0.8
        } else {
            1.0
        };
        add_scaled(&mut bundle, &item.bonuses, scale);
    }

    let armor_pieces = [EquipSlot::Body, EquipSlot::Head, EquipSlot::Legs, EquipSlot::Feet]
        .into_iter()
        .filter(|&slot| {
            slots
                .get(slot)
                .is_some_and(|item| matches!(item.kind, ItemKind::Armor(_)))
        })
        .count();
    match armor_pieces {
        4 => {
            bundle.defense_pct += 20.0;
            bundle.hp_pct += 15.0;
        }
        3 => bundle.defense_pct += 10.0,
        2 => bundle.hp_pct += 5.0,
        _ => {}
    }

    let accessories = [
        EquipSlot::RingLeft,
        EquipSlot::RingRight,
        EquipSlot::Necklace,
        EquipSlot::Amulet,
    ]
    .into_iter()
    .filter(|&slot| {
        slots
            .get(slot)
            .is_some_and(|item| matches!(item.kind, ItemKind::Accessory(_)))
    })
    .count();
    match accessories {
        4 => {
            bundle.attack_pct += 10.0;
            bundle.crit_chance += 15.0;
        }
        3 => {
            bundle.crit_chance += 10.0;
            bundle.speed_pct += 5.0;
        }
        2 => bundle.crit_damage += 5.0,
        _ => {}
    }

    if slots.is_dual_wielding() {
        bundle.attack = (bundle.attack as f64 * 1.15).floor() as i32;
    }

    bundle
}

fn add_scaled(bundle: &mut StatBonusBundle, bonuses: &StatBonuses, scale: f64) {
    bundle.attack += (bonuses.attack as f64 * scale).floor() as i32;
    bundle.defense += (bonuses.defense as f64 * scale).floor() as i32;
    bundle.speed += (bonuses.speed as f64 * scale).floor() as i32;
    bundle.magic_attack += (bonuses.magic_attack as f64 * scale).floor() as i32;
    bundle.max_hp += (bonuses.max_hp as f64 * scale).floor() as i32;
    bundle.max_mana += (bonuses.max_mana as f64 * scale).floor() as i32;
    bundle.crit_chance += bonuses.crit_chance * scale;
    bundle.crit_damage += bonuses.crit_damage * scale;
    bundle.double_attack_chance += bonuses.double_attack_chance * scale;
    bundle.magic_damage_bonus += bonuses.magic_damage_bonus * scale;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weapon(name: &str, class: WeaponClass, attack: i32) -> Equipment {
        Equipment::new(name, ItemKind::Weapon(class)).with_bonuses(StatBonuses {
            attack,
            ..Default::default()
        })
    }

    fn armor(name: &str, piece: ArmorPiece, defense: i32) -> Equipment {
        Equipment::new(name, ItemKind::Armor(piece)).with_bonuses(StatBonuses {
            defense,
            ..Default::default()
        })
    }

    fn ring(name: &str) -> Equipment {
        Equipment::new(name, ItemKind::Accessory(AccessoryKind::Ring))
    }

    #[test]
    fn test_classify_weapon_name() {
        assert_eq!(classify_weapon_name("Espada Longa"), WeaponClass::Sword);
        assert_eq!(classify_weapon_name("War Hammer"), WeaponClass::Blunt);
        assert_eq!(classify_weapon_name("Adaga Sombria"), WeaponClass::Dagger);
        assert_eq!(classify_weapon_name("Oak Staff"), WeaponClass::Staff);
        // Unmatched names fall back to sword.
        assert_eq!(classify_weapon_name("Morning Star"), WeaponClass::Sword);
    }

    #[test]
    fn test_slot_compatibility() {
        let mut slots = EquipmentSlots::default();
        let result = slots.equip(EquipSlot::Head, ring("Iron Ring"), 10);
        assert!(matches!(result, Err(EquipError::SlotMismatch { .. })));

        let result = slots.equip(EquipSlot::RingLeft, ring("Iron Ring"), 10);
        assert!(result.is_ok());
    }

    #[test]
    fn test_level_requirement_enforced() {
        let mut slots = EquipmentSlots::default();
        let item = weapon("Greatsword", WeaponClass::Sword, 30).with_level_requirement(20);
        let result = slots.equip(EquipSlot::MainHand, item, 5);
        assert!(matches!(result, Err(EquipError::LevelTooLow { .. })));
    }

    #[test]
    fn test_off_hand_weapon_penalty() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::OffHand, weapon("Side Dagger", WeaponClass::Dagger, 10), 1)
            .unwrap();
        let bundle = aggregate(&slots);
        assert_eq!(bundle.attack, 8);
    }

    #[test]
    fn test_off_hand_shield_keeps_full_value() {
        let mut slots = EquipmentSlots::default();
        let shield = Equipment::new("Tower Shield", ItemKind::Shield).with_bonuses(StatBonuses {
            defense: 10,
            ..Default::default()
        });
        slots.equip(EquipSlot::OffHand, shield, 1).unwrap();
        let bundle = aggregate(&slots);
        assert_eq!(bundle.defense, 10);
    }

    #[test]
    fn test_dual_wield_attack_multiplier() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::MainHand, weapon("Sword", WeaponClass::Sword, 20), 1)
            .unwrap();
        slots
            .equip(EquipSlot::OffHand, weapon("Dagger", WeaponClass::Dagger, 10), 1)
            .unwrap();
        let bundle = aggregate(&slots);
        // 20 + floor(10 * 0.8) = 28, then floor(28 * 1.15) = 32
        assert_eq!(bundle.attack, 32);
    }

    #[test]
    fn test_armor_set_tiers_are_exclusive() {
        let mut slots = EquipmentSlots::default();
        slots.equip(EquipSlot::Body, armor("Cuirass", ArmorPiece::Body, 5), 1).unwrap();
        slots.equip(EquipSlot::Head, armor("Helm", ArmorPiece::Head, 3), 1).unwrap();
        slots.equip(EquipSlot::Legs, armor("Greaves", ArmorPiece::Legs, 3), 1).unwrap();
        slots.equip(EquipSlot::Feet, armor("Boots", ArmorPiece::Feet, 2), 1).unwrap();

        let bundle = aggregate(&slots);
        // Four pieces: the 4-piece tier only, never 2+3+4 stacked.
        assert_eq!(bundle.defense_pct, 20.0);
        assert_eq!(bundle.hp_pct, 15.0);
    }

    #[test]
    fn test_two_piece_armor_bonus() {
        let mut slots = EquipmentSlots::default();
        slots.equip(EquipSlot::Body, armor("Cuirass", ArmorPiece::Body, 5), 1).unwrap();
        slots.equip(EquipSlot::Head, armor("Helm", ArmorPiece::Head, 3), 1).unwrap();
        let bundle = aggregate(&slots);
        assert_eq!(bundle.hp_pct, 5.0);
        assert_eq!(bundle.defense_pct, 0.0);
    }

    #[test]
    fn test_accessory_set_tiers() {
        let mut slots = EquipmentSlots::default();
        slots.equip(EquipSlot::RingLeft, ring("Ring A"), 1).unwrap();
        slots.equip(EquipSlot::RingRight, ring("Ring B"), 1).unwrap();
        let bundle = aggregate(&slots);
        assert_eq!(bundle.crit_damage, 5.0);

        let mut slots = slots.clone();
        slots
            .equip(
                EquipSlot::Necklace,
                Equipment::new("Chain", ItemKind::Accessory(AccessoryKind::Necklace)),
                1,
            )
            .unwrap();
        let bundle = aggregate(&slots);
        assert_eq!(bundle.crit_chance, 10.0);
        assert_eq!(bundle.speed_pct, 5.0);
        assert_eq!(bundle.crit_damage, 0.0);
    }

    #[test]
    fn test_aggregation_order_independent() {
        let sword = weapon("Sword", WeaponClass::Sword, 12);
        let helm = armor("Helm", ArmorPiece::Head, 4);
        let band = ring("Band");

        let mut first = EquipmentSlots::default();
        first.equip(EquipSlot::MainHand, sword.clone(), 1).unwrap();
        first.equip(EquipSlot::Head, helm.clone(), 1).unwrap();
        first.equip(EquipSlot::RingLeft, band.clone(), 1).unwrap();

        let mut second = EquipmentSlots::default();
        second.equip(EquipSlot::RingLeft, band, 1).unwrap();
        second.equip(EquipSlot::MainHand, sword, 1).unwrap();
        second.equip(EquipSlot::Head, helm, 1).unwrap();

        assert_eq!(aggregate(&first), aggregate(&second));
    }

    #[test]
    fn test_equip_returns_previous_item() {
        let mut slots = EquipmentSlots::default();
        slots
            .equip(EquipSlot::MainHand, weapon("Old Sword", WeaponClass::Sword, 5), 1)
            .unwrap();
        let previous = slots
            .equip(EquipSlot::MainHand, weapon("New Sword", WeaponClass::Sword, 9), 1)
            .unwrap();
        assert_eq!(previous.unwrap().name, "Old Sword");
        assert_eq!(slots.main_hand.as_ref().unwrap().name, "New Sword");
    }
}
