//! Authored content database: equipment, consumables, and hand-tuned
//! monsters, referenced by name.
//!
//! Weapon classes for legacy item names are resolved once here, at table
//! construction, via the keyword migration helper.

use crate::combatant::EnemyBehavior;
use crate::equipment::{
    classify_weapon_name, AccessoryKind, ArmorPiece, EquipSlot, Equipment, EquipmentSlots,
    ItemKind, Rarity, StatBonuses,
};
use crate::scaling::{generate_enemy, EnemyStatBlock};
use serde::{Deserialize, Serialize};

/// A usable battle item restoring HP and/or mana.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consumable {
    pub name: String,
    pub restore_hp: i32,
    pub restore_mana: i32,
    /// Quick items do not pass the turn to the enemy.
    pub quick: bool,
}

impl Consumable {
    pub fn new(name: impl Into<String>, restore_hp: i32, restore_mana: i32) -> Self {
        Self {
            name: name.into(),
            restore_hp,
            restore_mana,
            quick: false,
        }
    }

    pub fn quick(mut self) -> Self {
        self.quick = true;
        self
    }
}

fn weapon(name: &str, attack: i32, rarity: Rarity) -> Equipment {
    // Legacy content keeps the class in the display name; migrate it here.
    Equipment::new(name, ItemKind::Weapon(classify_weapon_name(name)))
        .with_rarity(rarity)
        .with_bonuses(StatBonuses {
            attack,
            ..Default::default()
        })
}

fn armor(name: &str, piece: ArmorPiece, defense: i32, max_hp: i32) -> Equipment {
    Equipment::new(name, ItemKind::Armor(piece)).with_bonuses(StatBonuses {
        defense,
        max_hp,
        ..Default::default()
    })
}

lazy_static::lazy_static! {
    /// Authored equipment.
    pub static ref EQUIPMENT: Vec<Equipment> = vec![
        weapon("Espada Longa", 12, Rarity::Common),
        weapon("Worn Axe", 14, Rarity::Common),
        weapon("War Hammer", 16, Rarity::Uncommon).with_level_requirement(3),
        weapon("Adaga Sombria", 8, Rarity::Uncommon),
        Equipment::new("Oak Staff", ItemKind::Weapon(classify_weapon_name("Oak Staff")))
            .with_bonuses(StatBonuses {
                attack: 5,
                magic_attack: 10,
                magic_damage_bonus: 10.0,
                ..Default::default()
            }),
        Equipment::new("Tower Shield", ItemKind::Shield)
            .with_rarity(Rarity::Uncommon)
            .with_bonuses(StatBonuses {
                defense: 12,
                max_hp: 20,
                ..Default::default()
            }),
        armor("Knight's Cuirass", ArmorPiece::Body, 10, 25),
        armor("Knight's Helm", ArmorPiece::Head, 6, 10),
        armor("Knight's Greaves", ArmorPiece::Legs, 7, 15),
        armor("Knight's Boots", ArmorPiece::Feet, 4, 5),
        Equipment::new("Ring of Embers", ItemKind::Accessory(AccessoryKind::Ring))
            .with_bonuses(StatBonuses {
                crit_chance: 3.0,
                ..Default::default()
            }),
        Equipment::new("Ring of Frost", ItemKind::Accessory(AccessoryKind::Ring))
            .with_bonuses(StatBonuses {
                crit_damage: 10.0,
                ..Default::default()
            }),
        Equipment::new("Hunter's Necklace", ItemKind::Accessory(AccessoryKind::Necklace))
            .with_bonuses(StatBonuses {
                double_attack_chance: 4.0,
                ..Default::default()
            }),
        Equipment::new("Amulet of Vigor", ItemKind::Accessory(AccessoryKind::Amulet))
            .with_bonuses(StatBonuses {
                max_hp: 30,
                max_mana: 15,
                ..Default::default()
            }),
    ];

    /// Authored consumables.
    pub static ref CONSUMABLES: Vec<Consumable> = vec![
        Consumable::new("Lesser Healing Potion", 40, 0),
        Consumable::new("Crimson Vial", 90, 0),
        Consumable::new("Mana Draught", 0, 35),
        Consumable::new("Swift Tonic", 15, 5).quick(),
    ];

    /// Hand-tuned monsters for specific floors. Everything else falls to
    /// the procedural generator.
    pub static ref AUTHORED_MONSTERS: Vec<EnemyStatBlock> = vec![
        {
            let mut block = generate_enemy(1, None);
            block.name = "Tower Mouse".to_string();
            block.max_hp = 35;
            block.attack = 7;
            block.behavior = EnemyBehavior::Defensive;
            block
        },
        {
            let mut block = generate_enemy(5, None);
            block.name = "Gatekeeper Golem".to_string();
            block.max_hp += 40;
            block.defense += 5;
            block
        },
    ];
}

/// Look up authored equipment by name (case-insensitive).
pub fn get_equipment(name: &str) -> Option<Equipment> {
    let lower = name.to_lowercase();
    EQUIPMENT
        .iter()
        .find(|e| e.name.to_lowercase() == lower)
        .cloned()
}

/// Look up an authored consumable by name (case-insensitive).
pub fn get_consumable(name: &str) -> Option<Consumable> {
    let lower = name.to_lowercase();
    CONSUMABLES
        .iter()
        .find(|c| c.name.to_lowercase() == lower)
        .cloned()
}

/// The single authored-monster seam: `Some` when a hand-tuned block
/// exists for the floor.
pub fn authored_enemy(floor: u32) -> Option<EnemyStatBlock> {
    AUTHORED_MONSTERS
        .iter()
        .find(|m| m.level == floor)
        .cloned()
}

/// A starter sword-and-board loadout for tests and examples.
pub fn sample_loadout() -> EquipmentSlots {
    let mut slots = EquipmentSlots::default();
    let pairs = [
        (EquipSlot::MainHand, "Espada Longa"),
        (EquipSlot::OffHand, "Tower Shield"),
        (EquipSlot::Body, "Knight's Cuirass"),
        (EquipSlot::Head, "Knight's Helm"),
    ];
    for (slot, name) in pairs {
        if let Some(item) = get_equipment(name) {
            let _ = slots.equip(slot, item, 10);
        }
    }
    slots
}
