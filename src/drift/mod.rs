//! Click Drift: click a button that drifts around the screen, buy upgrades.

pub mod actions;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod random;
pub mod render;
pub mod save;
pub mod schedule;
pub mod state;
pub mod surface;

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;

use crate::input::{ClickState, InputEvent};

use actions::*;
use catalog::CATALOG;
use config::EngineConfig;
use engine::Engine;
use error::DriftError;
use random::RandomSource;
use save::SaveStore;
use surface::Surface;

/// A destructive action waiting for the player to confirm it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    Reset,
    Delete,
}

pub struct DriftGame {
    pub engine: Engine,
    pending: Option<Pending>,
    /// Shop panel shows the slot workshop instead of the upgrade list.
    show_slots: bool,
}

impl DriftGame {
    pub fn new(
        surface: &dyn Surface,
        store: Box<dyn SaveStore>,
        rng: Box<dyn RandomSource>,
        config: EngineConfig,
    ) -> Result<Self, DriftError> {
        Ok(Self {
            engine: Engine::new(surface, store, rng, config)?,
            pending: None,
            show_slots: false,
        })
    }

    pub fn pending(&self) -> Option<Pending> {
        self.pending
    }

    pub fn showing_slots(&self) -> bool {
        self.show_slots
    }

    /// Handle an input event. Returns true if the event was consumed.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(c) => self.handle_key(*c),
            InputEvent::Click(id) => self.handle_click(*id),
        }
    }

    pub fn tick(&mut self, delta_ticks: u32) {
        self.engine.tick(delta_ticks);
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(self, f, area, click_state);
    }

    fn confirm(&mut self) -> bool {
        match self.pending.take() {
            Some(Pending::Reset) => self.engine.reset_game(),
            Some(Pending::Delete) => self.engine.delete_save(),
            None => return false,
        }
        self.show_slots = false;
        true
    }

    fn toggle_slots(&mut self) -> bool {
        if !self.engine.slot_config_available() {
            return false;
        }
        self.show_slots = !self.show_slots;
        true
    }

    fn buy(&mut self, index: usize) -> bool {
        match CATALOG.get(index) {
            Some(def) => self.engine.on_purchase_request(def.id),
            None => false,
        }
    }

    fn handle_click(&mut self, action_id: u32) -> bool {
        // While a confirmation is open only its answers are live.
        if self.pending.is_some() {
            return match action_id {
                CONFIRM => self.confirm(),
                CANCEL => {
                    self.pending = None;
                    true
                }
                _ => false,
            };
        }

        match action_id {
            id if id >= CLICK_BUTTON_BASE => self.engine.on_button_click(id - CLICK_BUTTON_BASE),
            id if (BUY_UPGRADE_BASE..BUY_UPGRADE_BASE + CATALOG.len() as u32).contains(&id) => {
                self.buy((id - BUY_UPGRADE_BASE) as usize)
            }
            TOGGLE_SLOTS => self.toggle_slots(),
            id if (CYCLE_SLOT_BASE..ASK_RESET).contains(&id) && self.show_slots => {
                self.engine.cycle_slot_modifier((id - CYCLE_SLOT_BASE) as usize)
            }
            ASK_RESET => {
                self.pending = Some(Pending::Reset);
                true
            }
            ASK_DELETE => {
                self.pending = Some(Pending::Delete);
                true
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: char) -> bool {
        if self.pending.is_some() {
            if key == 'y' {
                return self.confirm();
            }
            self.pending = None;
            return true;
        }

        match key {
            ' ' => match self.engine.slot_button(0) {
                Some(id) => self.engine.on_button_click(id),
                None => false,
            },
            '1'..='9' if self.show_slots => {
                let slot = (key as u8 - b'0') as usize;
                self.engine.cycle_slot_modifier(slot)
            }
            '1'..='9' => self.buy((key as u8 - b'1') as usize),
            's' => self.toggle_slots(),
            'r' => {
                self.pending = Some(Pending::Reset);
                true
            }
            'd' => {
                self.pending = Some(Pending::Delete);
                true
            }
            _ => false,
        }
    }
}
