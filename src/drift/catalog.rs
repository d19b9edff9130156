//! Upgrade catalog and the pure purchase rules.
//!
//! Nothing here holds state: every function maps its inputs to an output, so
//! the engine and the tests can call them freely.

use std::collections::BTreeMap;

use super::state::{GameState, Upgrade, UpgradeType};

pub const CLICK_POWER: &str = "click-power";
pub const BUTTON_SPEED: &str = "button-speed";
pub const AUTO_CLICKER: &str = "auto-clicker";
pub const MULTI_BUTTON: &str = "multi-button";
pub const BUTTON_WORKSHOP: &str = "button-workshop";

/// Effective range of `buttonSpeed` when it drives transitions.
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 2.0;
/// Transition seconds at speed 1.0.
pub const BASE_TRANSITION_SECS: f64 = 0.3;

/// Static definition of a catalog entry at level 0.
pub struct UpgradeDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub cost: f64,
    pub max_level: u32,
    pub base_effect: f64,
    pub cost_multiplier: f64,
    pub kind: UpgradeType,
}

impl UpgradeDef {
    fn to_upgrade(&self) -> Upgrade {
        Upgrade {
            id: self.id.to_string(),
            name: self.name.to_string(),
            description: self.description.to_string(),
            cost: self.cost,
            level: 0,
            max_level: self.max_level,
            base_effect: self.base_effect,
            cost_multiplier: self.cost_multiplier,
            kind: self.kind,
            purchased: false,
        }
    }
}

/// Every purchasable upgrade, in shop display order.
pub const CATALOG: &[UpgradeDef] = &[
    UpgradeDef {
        id: CLICK_POWER,
        name: "Click Power",
        description: "Double your CP per click",
        cost: 10.0,
        max_level: 10,
        base_effect: 1.0,
        cost_multiplier: 2.0,
        kind: UpgradeType::ClickMultiplier,
    },
    UpgradeDef {
        id: BUTTON_SPEED,
        name: "Button Speed",
        description: "Make the button move faster",
        cost: 15.0,
        max_level: 5,
        base_effect: 0.5,
        cost_multiplier: 2.5,
        kind: UpgradeType::ButtonSpeed,
    },
    UpgradeDef {
        id: AUTO_CLICKER,
        name: "Auto Clicker",
        description: "A ghost cursor clicks for you",
        cost: 50.0,
        max_level: 10,
        base_effect: 0.5,
        cost_multiplier: 2.0,
        kind: UpgradeType::AutoClicker,
    },
    UpgradeDef {
        id: MULTI_BUTTON,
        name: "Multi Button",
        description: "Add another button to the field",
        cost: 100.0,
        max_level: 4,
        base_effect: 1.0,
        cost_multiplier: 3.0,
        kind: UpgradeType::MultiButton,
    },
    UpgradeDef {
        id: BUTTON_WORKSHOP,
        name: "Button Workshop",
        description: "Pick the modifier of each extra button",
        cost: 250.0,
        max_level: 1,
        base_effect: 1.0,
        cost_multiplier: 1.0,
        kind: UpgradeType::ButtonModifierConfig,
    },
];

/// A fresh id → upgrade map with every catalog entry at level 0.
pub fn initialize_upgrades() -> BTreeMap<String, Upgrade> {
    CATALOG
        .iter()
        .map(|def| (def.id.to_string(), def.to_upgrade()))
        .collect()
}

/// Catalog position of an upgrade id, used for display order.
pub fn display_index(id: &str) -> Option<usize> {
    CATALOG.iter().position(|def| def.id == id)
}

pub fn can_purchase(state: &GameState, id: &str) -> bool {
    match state.upgrades.get(id) {
        Some(u) => state.points >= u.cost && u.level < u.max_level,
        None => false,
    }
}

/// Buy one level of `id`. Returns `state` unchanged when the purchase is not
/// allowed (unknown id, too expensive, or maxed).
pub fn purchase(state: &GameState, id: &str) -> GameState {
    let mut next = state.clone();
    if !can_purchase(state, id) {
        return next;
    }
    let Some(upgrade) = next.upgrades.get_mut(id) else {
        return next;
    };

    let paid = upgrade.cost;
    upgrade.level += 1;
    upgrade.cost = (paid * upgrade.cost_multiplier).floor();
    upgrade.purchased = true;
    let (kind, level, base_effect) = (upgrade.kind, upgrade.level, upgrade.base_effect);

    next.points -= paid;
    match kind {
        UpgradeType::ClickMultiplier => next.click_multiplier = click_multiplier_at(level),
        UpgradeType::ButtonSpeed => next.button_speed = button_speed_at(level, base_effect),
        UpgradeType::AutoClicker => next.auto_clicker_rate = auto_clicker_rate_at(level, base_effect),
        // Button count and slot-panel availability are applied by the engine.
        UpgradeType::MultiButton | UpgradeType::ButtonModifierConfig => {}
    }
    next
}

pub fn click_multiplier_at(level: u32) -> f64 {
    2f64.powi(level as i32)
}

pub fn button_speed_at(level: u32, base_effect: f64) -> f64 {
    1.0 + level as f64 * base_effect
}

pub fn auto_clicker_rate_at(level: u32, base_effect: f64) -> f64 {
    level as f64 * base_effect
}

/// Regular buttons on screen for a multi-button level.
pub fn button_count_at(level: u32, base_effect: f64) -> u32 {
    1 + (level as f64 * base_effect).floor() as u32
}

/// `buttonSpeed` clamped into [`MIN_SPEED`, `MAX_SPEED`].
pub fn effective_speed(button_speed: f64) -> f64 {
    button_speed.clamp(MIN_SPEED, MAX_SPEED)
}

/// Reposition transition time for a given `buttonSpeed`.
pub fn transition_secs(button_speed: f64) -> f64 {
    BASE_TRANSITION_SECS / effective_speed(button_speed)
}

/// "current → next" text for the shop.
pub fn effect_description(upgrade: &Upgrade) -> String {
    let level = upgrade.level;
    match upgrade.kind {
        UpgradeType::ClickMultiplier => format!(
            "{}x → {}x CP per click",
            click_multiplier_at(level),
            click_multiplier_at(level + 1)
        ),
        UpgradeType::ButtonSpeed => format!(
            "{:.0}% → {:.0}% speed",
            button_speed_at(level, upgrade.base_effect) * 100.0,
            button_speed_at(level + 1, upgrade.base_effect) * 100.0
        ),
        UpgradeType::AutoClicker => {
            format!("{} CP/s", auto_clicker_rate_at(level, upgrade.base_effect))
        }
        UpgradeType::MultiButton => format!(
            "{} → {} buttons",
            button_count_at(level, upgrade.base_effect),
            button_count_at(level + 1, upgrade.base_effect)
        ),
        UpgradeType::ButtonModifierConfig => {
            if level > 0 {
                "Slot config unlocked".to_string()
            } else {
                "Slot config locked".to_string()
            }
        }
    }
}
