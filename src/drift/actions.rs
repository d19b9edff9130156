//! Semantic action IDs for Click Drift click targets.

// ── Shop ─────────────────────────────────────────────────────
pub const BUY_UPGRADE_BASE: u32 = 10; // +catalog index 0..4
pub const TOGGLE_SLOTS: u32 = 20;

// ── Slot panel ───────────────────────────────────────────────
pub const CYCLE_SLOT_BASE: u32 = 30; // +slot index 1..4

// ── Reset / delete confirmation ──────────────────────────────
pub const ASK_RESET: u32 = 50;
pub const ASK_DELETE: u32 = 51;
pub const CONFIRM: u32 = 52;
pub const CANCEL: u32 = 53;

// ── Play field ───────────────────────────────────────────────
/// Field buttons: `CLICK_BUTTON_BASE + button id`. Must stay the highest id.
pub const CLICK_BUTTON_BASE: u32 = 1_000;
