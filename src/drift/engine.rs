//! The Click Drift engine: the only code that mutates `GameState`.
//!
//! Every gameplay event (click, purchase, slot change, reset, timer) goes
//! through a method here and either applies completely or not at all. Timers
//! live on an owned [`Scheduler`]; the host advances it with [`Engine::tick`].

use std::collections::BTreeMap;

use crate::console;

use super::catalog;
use super::config::EngineConfig;
use super::error::DriftError;
use super::random::RandomSource;
use super::save::{decode_state, encode_state, SaveStore};
use super::schedule::{Scheduler, TaskHandle};
use super::state::{
    ButtonConfig, ButtonModifier, ButtonSlotConfig, ButtonVariant, GameState, Point, Size,
    UpgradeType,
};
use super::surface::{Mount, Surface, Viewport};

pub type ButtonId = u32;

/// Timer callbacks the engine schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    AutoSave,
    AutoClickerCycle,
    AutoClickerSettle(ButtonId),
    ZigZagFrame(ButtonId),
    ExpirePopup(u32),
}

/// Floating "+N" shown where a button was clicked.
#[derive(Clone, Debug, PartialEq)]
pub struct Popup {
    pub id: u32,
    pub text: String,
    pub position: Point,
    pub variant: ButtonVariant,
}

/// The auto-clicker's simulated pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GhostPointer {
    pub position: Point,
    pub target: ButtonId,
}

struct AutoClicker {
    cycle: TaskHandle,
    period_ms: u64,
    /// Settle delays that have not fired yet.
    pending: Vec<TaskHandle>,
    /// Round-robin position over live buttons.
    cursor: usize,
}

struct ZigZag {
    velocity: Point,
    frame: TaskHandle,
}

/// Read-only snapshot handed to the presentation layer.
pub struct View<'a> {
    pub state: &'a GameState,
    pub buttons: &'a BTreeMap<ButtonId, ButtonConfig>,
    pub popups: &'a [Popup],
    pub pointer: Option<GhostPointer>,
    pub slot_config_available: bool,
    pub auto_clicker_running: bool,
    /// Animation frames elapsed, for purely visual motion (Bouncy).
    pub frame: u64,
}

pub struct Engine {
    config: EngineConfig,
    state: GameState,
    buttons: BTreeMap<ButtonId, ButtonConfig>,
    next_button_id: ButtonId,
    zigzags: BTreeMap<ButtonId, ZigZag>,
    popups: Vec<Popup>,
    next_popup_id: u32,
    pointer: Option<GhostPointer>,
    auto_clicker: Option<AutoClicker>,
    scheduler: Scheduler<Task>,
    viewport: Viewport,
    rng: Box<dyn RandomSource>,
    store: Box<dyn SaveStore>,
    /// Bumped whenever the display should refresh.
    revision: u64,
}

impl Engine {
    /// Build an engine against `surface`, restoring the save from `store`.
    ///
    /// Fails when the surface lacks any required mount point.
    pub fn new(
        surface: &dyn Surface,
        store: Box<dyn SaveStore>,
        rng: Box<dyn RandomSource>,
        config: EngineConfig,
    ) -> Result<Self, DriftError> {
        if let Some(missing) = Mount::all().iter().find(|m| !surface.has_mount(**m)) {
            console::error(&format!("cannot start, {missing} not found"));
            return Err(DriftError::MissingMount(*missing));
        }

        let state = store
            .load(&config.storage_key)
            .and_then(|json| decode_state(&json))
            .unwrap_or_default();

        let mut scheduler = Scheduler::new();
        scheduler.every(config.autosave_interval_ms, Task::AutoSave);

        let mut engine = Self {
            config,
            state,
            buttons: BTreeMap::new(),
            next_button_id: 0,
            zigzags: BTreeMap::new(),
            popups: Vec::new(),
            next_popup_id: 0,
            pointer: None,
            auto_clicker: None,
            scheduler,
            viewport: surface.viewport(),
            rng,
            store,
            revision: 0,
        };
        engine.sync_buttons();
        engine.sync_auto_clicker();
        engine.request_render();
        Ok(engine)
    }

    // ── Accessors ─────────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn buttons(&self) -> &BTreeMap<ButtonId, ButtonConfig> {
        &self.buttons
    }

    pub fn button(&self, id: ButtonId) -> Option<&ButtonConfig> {
        self.buttons.get(&id)
    }

    /// The regular button occupying `slot`.
    pub fn slot_button(&self, slot: usize) -> Option<ButtonId> {
        self.buttons
            .iter()
            .find(|(_, b)| b.slot == Some(slot))
            .map(|(id, _)| *id)
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    pub fn pointer(&self) -> Option<GhostPointer> {
        self.pointer
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn auto_clicker_running(&self) -> bool {
        self.auto_clicker
            .as_ref()
            .is_some_and(|ac| self.scheduler.is_scheduled(ac.cycle))
    }

    pub fn slot_config_available(&self) -> bool {
        self.state.slot_config_unlocked()
    }

    pub fn rare_live(&self) -> bool {
        self.buttons.values().any(|b| b.variant.is_rare())
    }

    /// Virtual milliseconds since the engine started.
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn view(&self) -> View<'_> {
        View {
            state: &self.state,
            buttons: &self.buttons,
            popups: &self.popups,
            pointer: self.pointer,
            slot_config_available: self.slot_config_available(),
            auto_clicker_running: self.auto_clicker_running(),
            frame: self.now_ms() / self.config.frame_ms.max(1),
        }
    }

    // ── Gameplay events ───────────────────────────────────────────

    /// Handle a click on `id`. Returns false if the button is already gone.
    pub fn on_button_click(&mut self, id: ButtonId) -> bool {
        let Some(button) = self.buttons.get(&id) else {
            return false;
        };
        let variant = button.variant;
        let clicked_at = button.position;
        let size = button.size;
        let modifier = button.modifier();

        let earned = self.payout(variant);
        self.state.points += earned;
        self.request_render();

        let position = self.random_position(size);
        let speed = catalog::effective_speed(self.state.button_speed);
        let transition_secs = self.transition_for(modifier);
        if let Some(button) = self.buttons.get_mut(&id) {
            button.position = position;
            button.speed = speed;
            button.transition_secs = transition_secs;
        }

        self.push_popup(clicked_at, earned, variant);
        self.save();

        if variant == ButtonVariant::Normal {
            self.maybe_spawn_rare();
        } else {
            self.remove_button(id);
        }
        true
    }

    /// Buy one level of upgrade `id`. Returns false (and changes nothing)
    /// when the purchase is not allowed.
    pub fn on_purchase_request(&mut self, id: &str) -> bool {
        if !catalog::can_purchase(&self.state, id) {
            return false;
        }
        self.state = catalog::purchase(&self.state, id);

        let Some(upgrade) = self.state.upgrade(id) else {
            return false;
        };
        let (kind, level, base_effect) = (upgrade.kind, upgrade.level, upgrade.base_effect);
        match kind {
            UpgradeType::ButtonSpeed => self.propagate_speed(),
            UpgradeType::MultiButton => {
                self.state.multi_button_count = Some(catalog::button_count_at(level, base_effect));
                self.sync_buttons();
            }
            UpgradeType::ButtonModifierConfig => console::log("slot configuration unlocked"),
            UpgradeType::ClickMultiplier | UpgradeType::AutoClicker => {}
        }

        self.sync_auto_clicker();
        self.request_render();
        self.save();
        true
    }

    /// Override the modifier of `slot` and respawn its button with it.
    ///
    /// Requires the workshop upgrade; slot 0 and slots beyond the current
    /// button count are rejected.
    pub fn set_slot_modifier(&mut self, slot: usize, modifier: ButtonModifier) -> bool {
        if !self.slot_config_available() || slot == 0 || slot >= self.state.button_count() {
            return false;
        }
        if self.state.button_slots.len() <= slot {
            self.state
                .button_slots
                .resize(slot + 1, ButtonSlotConfig::default());
        }
        self.state.button_slots[slot] = ButtonSlotConfig::with_modifier(modifier);

        if let Some(id) = self.slot_button(slot) {
            self.remove_button(id);
        }
        self.spawn_slot(slot);
        self.request_render();
        self.save();
        true
    }

    /// Step the slot's modifier to the next one in the cycle.
    pub fn cycle_slot_modifier(&mut self, slot: usize) -> bool {
        let current = self
            .state
            .slot_override(slot)
            .or_else(|| {
                self.slot_button(slot)
                    .and_then(|id| self.button(id))
                    .map(|b| b.modifier())
            })
            .unwrap_or(ButtonModifier::None);
        self.set_slot_modifier(slot, current.next())
    }

    /// Wipe all progress and start over with one button.
    pub fn reset_game(&mut self) {
        let ids: Vec<ButtonId> = self.buttons.keys().copied().collect();
        for id in ids {
            self.remove_button(id);
        }
        self.popups.clear();
        self.pointer = None;
        self.state = GameState::new();
        self.sync_buttons();
        self.sync_auto_clicker();
        self.request_render();
        self.save();
        console::log("game reset");
    }

    /// Remove the save record, then reset.
    pub fn delete_save(&mut self) {
        if let Err(e) = self.store.remove(&self.config.storage_key) {
            console::warn(&e.to_string());
        }
        console::log("save deleted");
        self.reset_game();
    }

    /// The host's playable area changed size; keep buttons inside it.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        let ids: Vec<ButtonId> = self.buttons.keys().copied().collect();
        for id in ids {
            if let Some(size) = self.buttons.get(&id).map(|b| b.size) {
                let (min, max) = self.bounds(size);
                if let Some(b) = self.buttons.get_mut(&id) {
                    b.position.x = b.position.x.clamp(min.x, max.x);
                    b.position.y = b.position.y.clamp(min.y, max.y);
                }
            }
        }
        self.request_render();
    }

    // ── Time ──────────────────────────────────────────────────────

    /// Advance by `delta_ticks` host ticks of one frame each.
    pub fn tick(&mut self, delta_ticks: u32) {
        self.advance(delta_ticks as u64 * self.config.frame_ms);
    }

    /// Advance the clock by `ms`, running every timer that falls due in order.
    pub fn advance(&mut self, ms: u64) {
        let until = self.scheduler.now() + ms;
        while let Some((handle, task)) = self.scheduler.pop_due(until) {
            self.run_task(handle, task);
        }
        self.scheduler.finish(until);
    }

    fn run_task(&mut self, handle: TaskHandle, task: Task) {
        match task {
            Task::AutoSave => self.save(),
            Task::AutoClickerCycle => self.auto_clicker_cycle(),
            Task::AutoClickerSettle(target) => {
                if let Some(ac) = self.auto_clicker.as_mut() {
                    ac.pending.retain(|h| *h != handle);
                }
                if self.buttons.contains_key(&target) {
                    self.on_button_click(target);
                }
            }
            Task::ZigZagFrame(id) => {
                if !self.buttons.contains_key(&id) {
                    self.scheduler.cancel(handle);
                    self.zigzags.remove(&id);
                    return;
                }
                self.zigzag_step(id);
            }
            Task::ExpirePopup(popup) => {
                self.popups.retain(|p| p.id != popup);
                self.request_render();
            }
        }
    }

    // ── Buttons ───────────────────────────────────────────────────

    fn payout(&self, variant: ButtonVariant) -> f64 {
        let base = self.state.click_multiplier.floor();
        match variant {
            ButtonVariant::Normal => base,
            ButtonVariant::Golden => base * EngineConfig::GOLDEN_PAYOUT_FACTOR,
            ButtonVariant::Frozen => base + EngineConfig::FROZEN_PAYOUT_BONUS,
        }
    }

    /// Top-left corner range for a button of `size`.
    fn bounds(&self, size: Size) -> (Point, Point) {
        let m = self.config.margin;
        let min = Point::new(m, m);
        let max = Point::new(
            (self.viewport.width - m - size.width).max(m),
            (self.viewport.height - m - size.height).max(m),
        );
        (min, max)
    }

    fn random_position(&mut self, size: Size) -> Point {
        let (min, max) = self.bounds(size);
        let x = min.x + self.rng.next_unit() * (max.x - min.x);
        let y = min.y + self.rng.next_unit() * (max.y - min.y);
        Point::new(x, y)
    }

    fn transition_for(&self, modifier: ButtonModifier) -> f64 {
        let secs = catalog::transition_secs(self.state.button_speed);
        if modifier == ButtonModifier::Hyperactive {
            secs * self.config.hyperactive_factor
        } else {
            secs
        }
    }

    fn draw_modifier(&mut self) -> ButtonModifier {
        let r = self.rng.next_unit();
        let [bouncy, hyper, shrink, zigzag] = self.config.modifier_thresholds;
        if r < bouncy {
            ButtonModifier::Bouncy
        } else if r < hyper {
            ButtonModifier::Hyperactive
        } else if r < shrink {
            ButtonModifier::Shrinking
        } else if r < zigzag {
            ButtonModifier::ZigZag
        } else {
            ButtonModifier::None
        }
    }

    fn insert_button(&mut self, button: ButtonConfig) -> ButtonId {
        let id = self.next_button_id;
        self.next_button_id = self.next_button_id.wrapping_add(1);
        let zigzag = button.has_modifier(ButtonModifier::ZigZag);
        self.buttons.insert(id, button);
        if zigzag {
            self.start_zigzag(id);
        }
        self.request_render();
        id
    }

    fn spawn_slot(&mut self, slot: usize) -> ButtonId {
        let modifier = if slot == 0 {
            ButtonModifier::None
        } else {
            match self.state.slot_override(slot) {
                Some(m) => m,
                None => self.draw_modifier(),
            }
        };
        let size = if modifier == ButtonModifier::Shrinking {
            self.config.button_size.scaled(self.config.shrink_scale)
        } else {
            self.config.button_size
        };
        let position = self.random_position(size);
        let button = ButtonConfig {
            position,
            size,
            speed: catalog::effective_speed(self.state.button_speed),
            variant: ButtonVariant::Normal,
            modifiers: vec![modifier],
            slot: Some(slot),
            transition_secs: self.transition_for(modifier),
        };
        self.insert_button(button)
    }

    fn spawn_rare(&mut self, variant: ButtonVariant) -> ButtonId {
        let size = self.config.button_size;
        let position = self.random_position(size);
        let button = ButtonConfig {
            position,
            size,
            speed: catalog::effective_speed(self.state.button_speed),
            variant,
            modifiers: vec![ButtonModifier::None],
            slot: None,
            transition_secs: self.transition_for(ButtonModifier::None),
        };
        self.insert_button(button)
    }

    /// One draw per normal click, and only while no rare button is live.
    fn maybe_spawn_rare(&mut self) {
        if self.rare_live() {
            return;
        }
        let r = self.rng.next_unit();
        if r < self.config.golden_chance {
            self.spawn_rare(ButtonVariant::Golden);
        } else if r < self.config.frozen_chance {
            self.spawn_rare(ButtonVariant::Frozen);
        }
    }

    fn remove_button(&mut self, id: ButtonId) {
        if self.buttons.remove(&id).is_none() {
            return;
        }
        if let Some(motion) = self.zigzags.remove(&id) {
            self.scheduler.cancel(motion.frame);
        }
        if self.pointer.map(|p| p.target) == Some(id) {
            self.pointer = None;
        }
        self.request_render();
    }

    /// Make the on-screen slots match `state.button_count()`.
    fn sync_buttons(&mut self) {
        let count = self.state.button_count();
        let extra: Vec<ButtonId> = self
            .buttons
            .iter()
            .filter(|(_, b)| b.slot.is_some_and(|s| s >= count))
            .map(|(id, _)| *id)
            .collect();
        for id in extra {
            self.remove_button(id);
        }
        for slot in 0..count {
            if self.slot_button(slot).is_none() {
                self.spawn_slot(slot);
            }
        }
    }

    fn propagate_speed(&mut self) {
        let speed = catalog::effective_speed(self.state.button_speed);
        let step = self.config.zigzag_step * speed;
        let ids: Vec<ButtonId> = self.buttons.keys().copied().collect();
        for id in ids {
            let modifier = match self.buttons.get(&id) {
                Some(b) => b.modifier(),
                None => continue,
            };
            let transition_secs = self.transition_for(modifier);
            if let Some(b) = self.buttons.get_mut(&id) {
                b.speed = speed;
                b.transition_secs = transition_secs;
            }
        }
        for motion in self.zigzags.values_mut() {
            motion.velocity = Point::new(
                step.copysign(motion.velocity.x),
                step.copysign(motion.velocity.y),
            );
        }
    }

    // ── ZigZag ────────────────────────────────────────────────────

    fn start_zigzag(&mut self, id: ButtonId) {
        let step = self.config.zigzag_step * catalog::effective_speed(self.state.button_speed);
        let vx = if self.rng.next_unit() < 0.5 { -step } else { step };
        let vy = if self.rng.next_unit() < 0.5 { -step } else { step };
        let frame = self
            .scheduler
            .every(self.config.frame_ms, Task::ZigZagFrame(id));
        self.zigzags.insert(
            id,
            ZigZag {
                velocity: Point::new(vx, vy),
                frame,
            },
        );
    }

    /// Move one frame and bounce off the edges of the playable area.
    fn zigzag_step(&mut self, id: ButtonId) {
        let Some(size) = self.buttons.get(&id).map(|b| b.size) else {
            return;
        };
        let (min, max) = self.bounds(size);
        let (Some(button), Some(motion)) = (self.buttons.get_mut(&id), self.zigzags.get_mut(&id))
        else {
            return;
        };

        let mut pos = Point::new(
            button.position.x + motion.velocity.x,
            button.position.y + motion.velocity.y,
        );
        if pos.x <= min.x {
            pos.x = min.x;
            motion.velocity.x = motion.velocity.x.abs();
        } else if pos.x >= max.x {
            pos.x = max.x;
            motion.velocity.x = -motion.velocity.x.abs();
        }
        if pos.y <= min.y {
            pos.y = min.y;
            motion.velocity.y = motion.velocity.y.abs();
        } else if pos.y >= max.y {
            pos.y = max.y;
            motion.velocity.y = -motion.velocity.y.abs();
        }
        button.position = pos;
        self.request_render();
    }

    // ── Auto-clicker ──────────────────────────────────────────────

    fn auto_clicker_period(&self) -> Option<u64> {
        let rate = self.state.auto_clicker_rate;
        if rate <= 0.0 {
            return None;
        }
        let base = if self.state.button_count() > 1 {
            self.config.autoclick_multi_base_ms
        } else {
            self.config.autoclick_base_ms
        };
        Some((base / rate).round().max(1.0) as u64)
    }

    /// Start, stop or retime the auto-clicker to match the current rate.
    fn sync_auto_clicker(&mut self) {
        match (self.auto_clicker_period(), self.auto_clicker.as_ref()) {
            (None, None) => {}
            (None, Some(_)) => self.stop_auto_clicker(),
            (Some(period), Some(ac)) if ac.period_ms == period => {}
            (Some(period), _) => {
                self.stop_auto_clicker();
                let cycle = self.scheduler.every(period, Task::AutoClickerCycle);
                self.auto_clicker = Some(AutoClicker {
                    cycle,
                    period_ms: period,
                    pending: Vec::new(),
                    cursor: 0,
                });
                console::log(&format!("auto-clicker running every {period} ms"));
            }
        }
    }

    fn stop_auto_clicker(&mut self) {
        let Some(ac) = self.auto_clicker.take() else {
            return;
        };
        self.scheduler.cancel(ac.cycle);
        for handle in ac.pending {
            self.scheduler.cancel(handle);
        }
        self.pointer = None;
        self.request_render();
        console::log("auto-clicker stopped");
    }

    fn auto_clicker_cycle(&mut self) {
        let targets: Vec<ButtonId> = self.buttons.keys().copied().collect();
        let settle = self.config.settle_delay_ms;
        let Some(ac) = self.auto_clicker.as_mut() else {
            return;
        };
        if targets.is_empty() {
            return;
        }
        let target = targets[ac.cursor % targets.len()];
        ac.cursor = ac.cursor.wrapping_add(1);

        let Some(center) = self.buttons.get(&target).map(|b| b.center()) else {
            return;
        };
        let handle = self.scheduler.once(settle, Task::AutoClickerSettle(target));
        if let Some(ac) = self.auto_clicker.as_mut() {
            ac.pending.push(handle);
        }
        self.pointer = Some(GhostPointer {
            position: center,
            target,
        });
        self.request_render();
    }

    // ── Display & persistence ─────────────────────────────────────

    fn request_render(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    fn push_popup(&mut self, position: Point, earned: f64, variant: ButtonVariant) {
        let id = self.next_popup_id;
        self.next_popup_id = self.next_popup_id.wrapping_add(1);
        self.popups.push(Popup {
            id,
            text: format!("+{}", format_points(earned)),
            position,
            variant,
        });
        self.scheduler
            .once(self.config.popup_lifetime_ms, Task::ExpirePopup(id));
    }

    fn save(&mut self) {
        let json = match encode_state(&self.state) {
            Ok(json) => json,
            Err(e) => {
                console::warn(&e.to_string());
                return;
            }
        };
        if let Err(e) = self.store.store(&self.config.storage_key, &json) {
            console::warn(&e.to_string());
        }
    }
}

/// Floored points with thousands separators (e.g. 1234567.8 → "1,234,567").
pub fn format_points(n: f64) -> String {
    let int_part = n.max(0.0).floor() as u64;
    let digits = int_part.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::random::{seeded, Scripted};
    use crate::drift::save::MemoryStore;
    use crate::drift::surface::StaticSurface;

    const KEY: &str = EngineConfig::STORAGE_KEY;

    fn engine_with(store: MemoryStore, rng: Box<dyn RandomSource>) -> Engine {
        let surface = StaticSurface::full(80.0, 24.0);
        Engine::new(&surface, Box::new(store), rng, EngineConfig::new()).unwrap()
    }

    fn fresh_engine() -> (Engine, MemoryStore) {
        let store = MemoryStore::new();
        (engine_with(store.clone(), seeded(1)), store)
    }

    fn primary(engine: &Engine) -> ButtonId {
        engine.slot_button(0).unwrap()
    }

    fn give_points(engine: &mut Engine, points: f64) {
        engine.state.points = points;
    }

    fn saved_state(store: &MemoryStore) -> GameState {
        decode_state(&store.get(KEY).unwrap()).unwrap()
    }

    // ── Construction ──────────────────────────────────────────

    #[test]
    fn missing_mount_fails_fast() {
        let surface = StaticSurface {
            mounts: vec![Mount::ButtonContainer, Mount::PointsDisplay],
            viewport: Viewport::new(80.0, 24.0),
        };
        let result = Engine::new(
            &surface,
            Box::new(MemoryStore::new()),
            seeded(1),
            EngineConfig::new(),
        );
        assert_eq!(result.err(), Some(DriftError::MissingMount(Mount::UpgradesList)));
    }

    #[test]
    fn new_game_has_one_plain_button() {
        let (engine, _) = fresh_engine();
        assert_eq!(engine.buttons().len(), 1);
        let b = engine.button(primary(&engine)).unwrap();
        assert_eq!(b.variant, ButtonVariant::Normal);
        assert_eq!(b.modifier(), ButtonModifier::None);
        assert_eq!(b.slot, Some(0));
        assert!(!engine.auto_clicker_running());
        assert_eq!(engine.state().points, 0.0);
    }

    #[test]
    fn engines_do_not_share_state() {
        let (mut a, _) = fresh_engine();
        let (b, _) = fresh_engine();
        a.on_button_click(primary(&a));
        assert_eq!(a.state().points, 1.0);
        assert_eq!(b.state().points, 0.0);
    }

    #[test]
    fn loads_saved_progress() {
        let mut saved = GameState::new();
        saved.points = 100.0;
        saved = catalog::purchase(&saved, catalog::CLICK_POWER);
        let store = MemoryStore::with_record(KEY, &encode_state(&saved).unwrap());
        let mut engine = engine_with(store, seeded(3));
        assert_eq!(engine.state().points, 90.0);
        engine.on_button_click(primary(&engine));
        assert_eq!(engine.state().points, 92.0);
    }

    #[test]
    fn corrupt_save_starts_fresh() {
        let store = MemoryStore::with_record(KEY, "}}garbage");
        let engine = engine_with(store, seeded(3));
        assert_eq!(engine.state(), &GameState::new());
    }

    #[test]
    fn saved_multi_button_count_spawns_buttons() {
        let mut saved = GameState::new();
        saved.multi_button_count = Some(3);
        let store = MemoryStore::with_record(KEY, &encode_state(&saved).unwrap());
        let engine = engine_with(store, seeded(3));
        assert_eq!(engine.buttons().len(), 3);
        for slot in 0..3 {
            assert!(engine.slot_button(slot).is_some());
        }
    }

    // ── Clicks ────────────────────────────────────────────────

    #[test]
    fn normal_click_pays_moves_and_pops() {
        // spawn: x, y | click: x, y, rare roll
        let rng = Scripted::new(&[0.1, 0.1, 0.9, 0.9, 0.5]);
        let store = MemoryStore::new();
        let mut engine = engine_with(store.clone(), Box::new(rng));
        let id = primary(&engine);
        let before = engine.button(id).unwrap().position;
        let rev = engine.revision();

        assert!(engine.on_button_click(id));

        assert_eq!(engine.state().points, 1.0);
        assert_ne!(engine.button(id).unwrap().position, before);
        assert!(engine.revision() > rev);
        assert_eq!(engine.popups().len(), 1);
        assert_eq!(engine.popups()[0].text, "+1");
        assert_eq!(saved_state(&store).points, 1.0);
        assert!(!engine.rare_live());
    }

    #[test]
    fn click_multiplier_is_floored() {
        let (mut engine, _) = fresh_engine();
        engine.state.click_multiplier = 2.7;
        engine.on_button_click(primary(&engine));
        assert_eq!(engine.state().points, 2.0);
    }

    #[test]
    fn popup_expires_after_lifetime() {
        let (mut engine, _) = fresh_engine();
        engine.on_button_click(primary(&engine));
        engine.advance(999);
        assert_eq!(engine.popups().len(), 1);
        engine.advance(1);
        assert!(engine.popups().is_empty());
    }

    #[test]
    fn click_on_removed_button_is_noop() {
        let (mut engine, store) = fresh_engine();
        let state = engine.state().clone();
        assert!(!engine.on_button_click(9_999));
        assert_eq!(engine.state(), &state);
        assert!(store.get(KEY).is_none());
    }

    #[test]
    fn golden_pays_five_times_and_vanishes() {
        // spawn x,y | click x,y, rare roll 0.01 → Golden x,y | golden click x,y
        let rng = Scripted::new(&[0.5, 0.5, 0.5, 0.5, 0.01, 0.3, 0.3, 0.6]);
        let mut engine = engine_with(MemoryStore::new(), Box::new(rng));
        engine.on_button_click(primary(&engine));
        assert_eq!(engine.state().points, 1.0);

        let golden = *engine
            .buttons()
            .iter()
            .find(|(_, b)| b.variant == ButtonVariant::Golden)
            .unwrap()
            .0;
        assert!(engine.on_button_click(golden));
        assert_eq!(engine.state().points, 6.0);
        assert!(engine.button(golden).is_none());
        assert!(!engine.on_button_click(golden));
        assert_eq!(engine.state().points, 6.0);
        assert_eq!(engine.buttons().len(), 1);
    }

    #[test]
    fn frozen_adds_ten() {
        let rng = Scripted::new(&[0.5, 0.5, 0.5, 0.5, 0.03, 0.5]);
        let mut engine = engine_with(MemoryStore::new(), Box::new(rng));
        engine.on_button_click(primary(&engine));
        let frozen = *engine
            .buttons()
            .iter()
            .find(|(_, b)| b.variant == ButtonVariant::Frozen)
            .unwrap()
            .0;
        engine.on_button_click(frozen);
        assert_eq!(engine.state().points, 1.0 + 11.0);
        assert!(!engine.rare_live());
    }

    #[test]
    fn rare_roll_above_threshold_spawns_nothing() {
        let rng = Scripted::new(&[0.5, 0.5, 0.5, 0.5, 0.04]);
        let mut engine = engine_with(MemoryStore::new(), Box::new(rng));
        engine.on_button_click(primary(&engine));
        assert_eq!(engine.buttons().len(), 1);
    }

    #[test]
    fn at_most_one_rare_even_on_lucky_streak() {
        // Every roll is 0.0: each normal click would spawn Golden.
        let mut engine = engine_with(MemoryStore::new(), Box::new(Scripted::new(&[0.0])));
        for _ in 0..20 {
            engine.on_button_click(primary(&engine));
            let rare = engine.buttons().values().filter(|b| b.variant.is_rare()).count();
            assert!(rare <= 1);
        }
        assert!(engine.rare_live());
    }

    #[test]
    fn positions_stay_inside_margins() {
        let (mut engine, _) = fresh_engine();
        let margin = engine.config.margin;
        for _ in 0..200 {
            let id = primary(&engine);
            engine.on_button_click(id);
            let b = engine.button(id).unwrap();
            assert!(b.position.x >= margin && b.position.x + b.size.width <= 80.0 - margin);
            assert!(b.position.y >= margin && b.position.y + b.size.height <= 24.0 - margin);
        }
    }

    // ── Purchases ─────────────────────────────────────────────

    #[test]
    fn purchase_click_power_scenario() {
        let (mut engine, store) = fresh_engine();
        give_points(&mut engine, 100.0);
        assert!(engine.on_purchase_request(catalog::CLICK_POWER));
        assert_eq!(engine.state().points, 90.0);
        assert_eq!(engine.state().click_multiplier, 2.0);
        assert_eq!(engine.state().upgrades[catalog::CLICK_POWER].cost, 20.0);
        assert!(engine.on_purchase_request(catalog::CLICK_POWER));
        assert_eq!(engine.state().click_multiplier, 4.0);
        assert_eq!(engine.state().points, 70.0);
        assert_eq!(saved_state(&store).points, 70.0);
    }

    #[test]
    fn rejected_purchase_changes_nothing() {
        let (mut engine, store) = fresh_engine();
        give_points(&mut engine, 5.0);
        let before = engine.state().clone();
        assert!(!engine.on_purchase_request(catalog::CLICK_POWER));
        assert!(!engine.on_purchase_request("does-not-exist"));
        assert_eq!(engine.state(), &before);
        assert!(store.get(KEY).is_none());
    }

    #[test]
    fn ten_clicks_buy_click_power_then_clicks_pay_double() {
        let (mut engine, _) = fresh_engine();
        for _ in 0..10 {
            engine.on_button_click(primary(&engine));
        }
        // Rare spawns may add buttons, but only primary clicks count here.
        assert_eq!(engine.state().points, 10.0);
        assert!(engine.on_purchase_request(catalog::CLICK_POWER));
        assert_eq!(engine.state().points, 0.0);
        engine.on_button_click(primary(&engine));
        assert_eq!(engine.state().points, 2.0);
    }

    #[test]
    fn speed_upgrade_reaches_every_button() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 1_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_SPEED);
        assert_eq!(engine.state().button_speed, 1.5);
        for b in engine.buttons().values() {
            assert_eq!(b.speed, 1.5);
            let expected = if b.modifier() == ButtonModifier::Hyperactive { 0.1 } else { 0.2 };
            assert!((b.transition_secs - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn hyperactive_transition_is_halved() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        assert!(engine.set_slot_modifier(1, ButtonModifier::Hyperactive));
        let id = engine.slot_button(1).unwrap();
        assert!((engine.button(id).unwrap().transition_secs - 0.15).abs() < 1e-9);

        engine.on_button_click(id);
        assert!((engine.button(id).unwrap().transition_secs - 0.15).abs() < 1e-9);
        let plain = engine.button(primary(&engine)).unwrap();
        assert!((plain.transition_secs - 0.3).abs() < 1e-9);

        assert!(engine.on_purchase_request(catalog::BUTTON_SPEED));
        let b = engine.button(id).unwrap();
        assert!((b.transition_secs - 0.3 / 1.5 * 0.5).abs() < 1e-9);
        engine.on_button_click(id);
        let b = engine.button(id).unwrap();
        assert!((b.transition_secs - 0.3 / 1.5 * 0.5).abs() < 1e-9);
    }

    #[test]
    fn multi_button_adds_slots() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        assert!(engine.on_purchase_request(catalog::MULTI_BUTTON));
        assert_eq!(engine.state().multi_button_count, Some(2));
        assert!(engine.slot_button(0).is_some());
        assert!(engine.slot_button(1).is_some());
        assert!(engine.on_purchase_request(catalog::MULTI_BUTTON));
        assert!(engine.slot_button(2).is_some());
        let primary = engine.button(primary(&engine)).unwrap();
        assert_eq!(primary.modifier(), ButtonModifier::None);
    }

    #[test]
    fn modifier_draw_thresholds() {
        let draws = [0.05, 0.15, 0.20, 0.25, 0.27, 0.9];
        let mut engine = engine_with(MemoryStore::new(), Box::new(Scripted::new(&[0.5])));
        engine.rng = Box::new(Scripted::new(&draws));
        let got: Vec<ButtonModifier> = draws.iter().map(|_| engine.draw_modifier()).collect();
        assert_eq!(
            got,
            vec![
                ButtonModifier::Bouncy,
                ButtonModifier::Hyperactive,
                ButtonModifier::Shrinking,
                ButtonModifier::ZigZag,
                ButtonModifier::None,
                ButtonModifier::None,
            ]
        );
    }

    #[test]
    fn shrinking_slot_is_smaller() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        assert!(engine.set_slot_modifier(1, ButtonModifier::Shrinking));
        let b = engine.button(engine.slot_button(1).unwrap()).unwrap();
        assert_eq!(b.size, Size::new(6.0, 1.0));
        assert!(b.size.width < engine.config.button_size.width);
        assert_eq!(b.modifier(), ButtonModifier::Shrinking);
    }

    // ── Slot configuration ────────────────────────────────────

    #[test]
    fn slot_override_needs_workshop() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        assert!(!engine.set_slot_modifier(1, ButtonModifier::Bouncy));
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        assert!(engine.slot_config_available());
        assert!(engine.set_slot_modifier(1, ButtonModifier::Bouncy));
        let b = engine.button(engine.slot_button(1).unwrap()).unwrap();
        assert_eq!(b.modifier(), ButtonModifier::Bouncy);
        assert_eq!(engine.state().slot_override(1), Some(ButtonModifier::Bouncy));
    }

    #[test]
    fn slot_zero_and_missing_slots_rejected() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        assert!(!engine.set_slot_modifier(0, ButtonModifier::ZigZag));
        assert!(!engine.set_slot_modifier(2, ButtonModifier::ZigZag));
        assert!(engine.state().button_slots.is_empty());
    }

    #[test]
    fn slot_override_survives_reload() {
        let (mut engine, store) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        engine.set_slot_modifier(1, ButtonModifier::Hyperactive);

        let reloaded = engine_with(store, seeded(42));
        let b = reloaded.button(reloaded.slot_button(1).unwrap()).unwrap();
        assert_eq!(b.modifier(), ButtonModifier::Hyperactive);
    }

    #[test]
    fn cycle_slot_modifier_steps_forward() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        engine.set_slot_modifier(1, ButtonModifier::Shrinking);
        assert!(engine.cycle_slot_modifier(1));
        assert_eq!(engine.state().slot_override(1), Some(ButtonModifier::ZigZag));
        assert!(engine.cycle_slot_modifier(1));
        assert_eq!(engine.state().slot_override(1), Some(ButtonModifier::None));
    }

    // ── ZigZag ────────────────────────────────────────────────

    fn zigzag_engine() -> (Engine, ButtonId) {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::BUTTON_WORKSHOP);
        engine.set_slot_modifier(1, ButtonModifier::ZigZag);
        let id = engine.slot_button(1).unwrap();
        (engine, id)
    }

    #[test]
    fn zigzag_moves_every_frame() {
        let (mut engine, id) = zigzag_engine();
        let start = engine.button(id).unwrap().position;
        engine.tick(1);
        let next = engine.button(id).unwrap().position;
        assert_ne!(start, next);
    }

    #[test]
    fn zigzag_bounces_inside_bounds() {
        let (mut engine, id) = zigzag_engine();
        let margin = engine.config.margin;
        for _ in 0..2_000 {
            engine.tick(1);
            let b = engine.button(id).unwrap();
            assert!(b.position.x >= margin && b.position.x + b.size.width <= 80.0 - margin + 1e-9);
            assert!(b.position.y >= margin && b.position.y + b.size.height <= 24.0 - margin + 1e-9);
        }
    }

    #[test]
    fn zigzag_reflects_off_each_wall() {
        let (mut engine, id) = zigzag_engine();
        let (min, max) = engine.bounds(engine.button(id).unwrap().size);
        let step = engine.config.zigzag_step;

        // Heading right and down, one step short of the far corner.
        engine.buttons.get_mut(&id).unwrap().position = Point::new(max.x - 0.25, max.y - 0.25);
        engine.zigzags.get_mut(&id).unwrap().velocity = Point::new(step, step);
        engine.tick(1);
        let b = engine.button(id).unwrap().position;
        assert_eq!(b, max);
        let v = engine.zigzags[&id].velocity;
        assert!(v.x < 0.0 && v.y < 0.0);
        engine.tick(2);
        let b = engine.button(id).unwrap().position;
        assert_eq!(b, Point::new(max.x - 2.0 * step, max.y - 2.0 * step));

        // Now heading left and up into the near corner.
        engine.buttons.get_mut(&id).unwrap().position = Point::new(min.x + 0.25, min.y + 0.25);
        engine.tick(1);
        let v = engine.zigzags[&id].velocity;
        assert!(v.x > 0.0 && v.y > 0.0);
        assert_eq!(engine.button(id).unwrap().position, min);
        engine.tick(1);
        assert_eq!(
            engine.button(id).unwrap().position,
            Point::new(min.x + step, min.y + step)
        );
    }

    #[test]
    fn removing_zigzag_button_stops_its_frames() {
        let (mut engine, id) = zigzag_engine();
        let tasks_with_zigzag = engine.scheduler.len();
        engine.set_slot_modifier(1, ButtonModifier::None);
        assert!(engine.button(id).is_none());
        assert!(!engine.zigzags.contains_key(&id));
        assert_eq!(engine.scheduler.len(), tasks_with_zigzag - 1);
    }

    #[test]
    fn stale_zigzag_frame_cancels_itself() {
        let (mut engine, id) = zigzag_engine();
        // Drop the button behind the engine's back; the next frame notices.
        engine.buttons.remove(&id);
        let before = engine.scheduler.len();
        engine.tick(1);
        assert_eq!(engine.scheduler.len(), before - 1);
        assert!(!engine.zigzags.contains_key(&id));
    }

    // ── Auto-clicker ──────────────────────────────────────────

    #[test]
    fn auto_clicker_aims_then_clicks() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 50.0);
        assert!(engine.on_purchase_request(catalog::AUTO_CLICKER));
        assert!(engine.auto_clicker_running());
        assert_eq!(engine.state().points, 0.0);

        // rate 0.5 → one cycle every 2000 ms
        engine.advance(1_999);
        assert!(engine.pointer().is_none());
        engine.advance(1);
        let pointer = engine.pointer().unwrap();
        assert_eq!(pointer.target, primary(&engine));
        assert_eq!(engine.state().points, 0.0);

        engine.advance(500);
        assert_eq!(engine.state().points, 1.0);
    }

    #[test]
    fn auto_clicker_round_robins_buttons() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::AUTO_CLICKER);
        engine.on_purchase_request(catalog::AUTO_CLICKER);
        // rate 1.0 with two buttons → 2000 ms cycle
        engine.advance(2_000);
        let first = engine.pointer().unwrap().target;
        engine.advance(2_000);
        let second = engine.pointer().unwrap().target;
        assert_ne!(first, second);
    }

    #[test]
    fn reset_cancels_pending_auto_click() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 50.0);
        engine.on_purchase_request(catalog::AUTO_CLICKER);
        engine.advance(2_000);
        assert!(engine.pointer().is_some());

        engine.reset_game();
        assert!(!engine.auto_clicker_running());
        assert!(engine.pointer().is_none());
        engine.advance(10_000);
        assert_eq!(engine.state().points, 0.0);
    }

    #[test]
    fn settle_on_removed_button_is_ignored() {
        let (mut engine, _) = fresh_engine();
        give_points(&mut engine, 50.0);
        engine.on_purchase_request(catalog::AUTO_CLICKER);
        engine.advance(2_000);
        let target = engine.pointer().unwrap().target;
        engine.remove_button(target);
        engine.advance(500);
        assert_eq!(engine.state().points, 0.0);
    }

    // ── Persistence ───────────────────────────────────────────

    #[test]
    fn autosave_runs_on_interval() {
        let (mut engine, store) = fresh_engine();
        engine.state.points = 12.0;
        engine.advance(9_999);
        assert!(store.get(KEY).is_none());
        engine.advance(1);
        assert_eq!(saved_state(&store).points, 12.0);
    }

    #[test]
    fn reload_and_save_is_byte_stable() {
        let (mut engine, store) = fresh_engine();
        give_points(&mut engine, 500.0);
        engine.on_purchase_request(catalog::BUTTON_SPEED);
        let first = store.get(KEY).unwrap();

        let mut reloaded = engine_with(store.clone(), seeded(9));
        reloaded.advance(10_000);
        assert_eq!(store.get(KEY).unwrap(), first);
    }

    #[test]
    fn reset_restores_defaults_and_saves() {
        let (mut engine, store) = fresh_engine();
        give_points(&mut engine, 10_000.0);
        engine.on_purchase_request(catalog::MULTI_BUTTON);
        engine.on_purchase_request(catalog::CLICK_POWER);
        engine.reset_game();

        assert_eq!(engine.state(), &GameState::new());
        assert_eq!(engine.buttons().len(), 1);
        assert!(engine.popups().is_empty());
        assert_eq!(saved_state(&store), GameState::new());
    }

    #[test]
    fn delete_save_clears_record_then_resets() {
        let (mut engine, store) = fresh_engine();
        engine.on_button_click(primary(&engine));
        engine.delete_save();
        assert_eq!(engine.state().points, 0.0);
        assert_eq!(saved_state(&store), GameState::new());
    }

    #[test]
    fn viewport_shrink_pulls_buttons_in() {
        let (mut engine, _) = fresh_engine();
        engine.set_viewport(Viewport::new(20.0, 8.0));
        let b = engine.button(primary(&engine)).unwrap();
        assert!(b.position.x <= 20.0 - 1.0 - b.size.width);
        assert!(b.position.y <= 8.0 - 1.0 - b.size.height);
    }

    #[test]
    fn format_points_groups_thousands() {
        assert_eq!(format_points(0.0), "0");
        assert_eq!(format_points(999.9), "999");
        assert_eq!(format_points(1_000.0), "1,000");
        assert_eq!(format_points(1_234_567.8), "1,234,567");
        assert_eq!(format_points(-5.0), "0");
    }
}
