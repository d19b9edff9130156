//! Engine tuning: timings, geometry and spawn odds.
use serde::Deserialize;

use super::state::Size;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// localStorage key of the save record.
    pub storage_key: String,
    pub autosave_interval_ms: u64,
    /// Pause between the ghost pointer reaching a button and clicking it.
    pub settle_delay_ms: u64,
    pub popup_lifetime_ms: u64,
    /// One animation frame; ZigZag buttons step once per frame.
    pub frame_ms: u64,
    /// Auto-clicker cycle is `base / rate` ms, single- and multi-button.
    pub autoclick_base_ms: f64,
    pub autoclick_multi_base_ms: f64,
    /// Space kept free along every edge of the viewport.
    pub margin: f64,
    /// Footprint of a regular button: its boxed label, border included.
    pub button_size: Size,
    /// Size factor applied to Shrinking buttons, which draw as a bare label.
    pub shrink_scale: f64,
    /// Transition factor applied to Hyperactive buttons.
    pub hyperactive_factor: f64,
    /// ZigZag distance per frame at speed 1.0.
    pub zigzag_step: f64,
    /// `r < golden` spawns Golden, `golden <= r < frozen` spawns Frozen.
    pub golden_chance: f64,
    pub frozen_chance: f64,
    /// Upper bounds of the modifier draw, in `ButtonModifier::all()` order
    /// after `None`.
    pub modifier_thresholds: [f64; 4],
}

impl EngineConfig {
    pub const STORAGE_KEY: &'static str = "clickDriftSave";
    pub const AUTOSAVE_INTERVAL_MS: u64 = 10_000;
    pub const SETTLE_DELAY_MS: u64 = 500;
    pub const POPUP_LIFETIME_MS: u64 = 1_000;
    pub const FRAME_MS: u64 = 20;
    pub const GOLDEN_PAYOUT_FACTOR: f64 = 5.0;
    pub const FROZEN_PAYOUT_BONUS: f64 = 10.0;

    pub fn new() -> Self {
        Self {
            storage_key: Self::STORAGE_KEY.to_string(),
            autosave_interval_ms: Self::AUTOSAVE_INTERVAL_MS,
            settle_delay_ms: Self::SETTLE_DELAY_MS,
            popup_lifetime_ms: Self::POPUP_LIFETIME_MS,
            frame_ms: Self::FRAME_MS,
            autoclick_base_ms: 1_000.0,
            autoclick_multi_base_ms: 2_000.0,
            margin: 1.0,
            button_size: Size::new(10.0, 3.0),
            shrink_scale: 0.6,
            hyperactive_factor: 0.5,
            zigzag_step: 0.5,
            golden_chance: 0.02,
            frozen_chance: 0.04,
            modifier_thresholds: [0.10, 0.18, 0.22, 0.27],
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
