/// Click Drift game state definitions.
///
/// `GameState` is the persisted snapshot; its serde names match the save
/// record format (`clickMultiplier`, `buttonSpeed`, ...). `ButtonConfig` is the
/// transient per-button data the engine keeps for buttons on screen.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::catalog;

/// Which state field an upgrade drives when purchased.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeType {
    ClickMultiplier,
    ButtonSpeed,
    AutoClicker,
    MultiButton,
    ButtonModifierConfig,
}

/// One purchasable upgrade and its current progression.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Upgrade {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Price of the next level.
    pub cost: f64,
    pub level: u32,
    pub max_level: u32,
    pub base_effect: f64,
    pub cost_multiplier: f64,
    #[serde(rename = "type")]
    pub kind: UpgradeType,
    pub purchased: bool,
}

impl Upgrade {
    pub fn is_maxed(&self) -> bool {
        self.level >= self.max_level
    }
}

/// Payout class of a button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    #[default]
    Normal,
    Golden,
    Frozen,
}

impl ButtonVariant {
    /// Golden and Frozen buttons vanish after a single click.
    pub fn is_rare(self) -> bool {
        !matches!(self, ButtonVariant::Normal)
    }
}

/// Movement/visual behaviour attached to a button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonModifier {
    #[default]
    None,
    Bouncy,
    Hyperactive,
    Shrinking,
    ZigZag,
}

impl ButtonModifier {
    /// All modifiers in the order the slot panel cycles through them.
    pub fn all() -> &'static [ButtonModifier] {
        &[
            ButtonModifier::None,
            ButtonModifier::Bouncy,
            ButtonModifier::Hyperactive,
            ButtonModifier::Shrinking,
            ButtonModifier::ZigZag,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            ButtonModifier::None => "None",
            ButtonModifier::Bouncy => "Bouncy",
            ButtonModifier::Hyperactive => "Hyperactive",
            ButtonModifier::Shrinking => "Shrinking",
            ButtonModifier::ZigZag => "ZigZag",
        }
    }

    /// The modifier after this one in `all()`, wrapping around.
    pub fn next(self) -> ButtonModifier {
        let all = Self::all();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

/// A user-chosen override for one button slot.
///
/// An empty `modifiers` list means "no override": the slot keeps its random
/// draw. `[None]` is an explicit choice of no modifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonSlotConfig {
    #[serde(default)]
    pub variant: ButtonVariant,
    #[serde(default)]
    pub modifiers: Vec<ButtonModifier>,
}

impl ButtonSlotConfig {
    pub fn with_modifier(modifier: ButtonModifier) -> Self {
        Self {
            variant: ButtonVariant::Normal,
            modifiers: vec![modifier],
        }
    }

    /// The overriding modifier, if the user picked one for this slot.
    pub fn override_modifier(&self) -> Option<ButtonModifier> {
        self.modifiers.first().copied()
    }
}

/// Position in surface units (terminal cells in the browser host).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in surface units. The renderer draws a button over
/// exactly this many cells, so the engine's bounds match what is on screen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Scaled by `factor`, rounded down to whole cells.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new((self.width * factor).floor(), (self.height * factor).floor())
    }
}

/// Live configuration of one on-screen button.
#[derive(Clone, Debug, PartialEq)]
pub struct ButtonConfig {
    pub position: Point,
    /// Footprint, top-left anchored at `position`.
    pub size: Size,
    /// Button speed as clamped into the effective range.
    pub speed: f64,
    pub variant: ButtonVariant,
    /// At most one entry other than `None`.
    pub modifiers: Vec<ButtonModifier>,
    /// Slot index for regular buttons; `None` for rare spawns.
    pub slot: Option<usize>,
    /// Seconds the last reposition takes to animate.
    pub transition_secs: f64,
}

impl ButtonConfig {
    /// The button's active modifier, `None` when it has none.
    pub fn modifier(&self) -> ButtonModifier {
        self.modifiers
            .iter()
            .copied()
            .find(|m| *m != ButtonModifier::None)
            .unwrap_or(ButtonModifier::None)
    }

    pub fn has_modifier(&self, modifier: ButtonModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Centre point, where a simulated pointer aims.
    pub fn center(&self) -> Point {
        Point::new(
            self.position.x + self.size.width / 2.0,
            self.position.y + self.size.height / 2.0,
        )
    }
}

/// Full persisted state of a Click Drift game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameState {
    /// Current currency. Floored only for display.
    pub points: f64,
    pub click_multiplier: f64,
    /// Simulated clicks per second; 0 disables the auto-clicker.
    pub auto_clicker_rate: f64,
    pub upgrades: BTreeMap<String, Upgrade>,
    pub button_speed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_button_count: Option<u32>,
    /// Index = slot. Slot 0 is the primary button and never takes overrides.
    pub button_slots: Vec<ButtonSlotConfig>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            points: 0.0,
            click_multiplier: 1.0,
            auto_clicker_rate: 0.0,
            upgrades: catalog::initialize_upgrades(),
            button_speed: 1.0,
            multi_button_count: None,
            button_slots: Vec::new(),
        }
    }

    /// Number of regular buttons that should be on screen.
    pub fn button_count(&self) -> usize {
        self.multi_button_count.unwrap_or(1).max(1) as usize
    }

    pub fn upgrade(&self, id: &str) -> Option<&Upgrade> {
        self.upgrades.get(id)
    }

    /// Whether the per-slot override panel has been bought.
    pub fn slot_config_unlocked(&self) -> bool {
        self.upgrades
            .values()
            .any(|u| u.kind == UpgradeType::ButtonModifierConfig && u.level > 0)
    }

    pub fn slot_override(&self, slot: usize) -> Option<ButtonModifier> {
        if slot == 0 {
            return None;
        }
        self.button_slots.get(slot)?.override_modifier()
    }

    /// Add catalog upgrades missing from this state (e.g. from an older save).
    pub fn backfill_upgrades(&mut self) -> usize {
        let mut added = 0;
        for (id, upgrade) in catalog::initialize_upgrades() {
            if !self.upgrades.contains_key(&id) {
                self.upgrades.insert(id, upgrade);
                added += 1;
            }
        }
        added
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
