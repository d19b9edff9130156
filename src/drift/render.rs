//! Click Drift rendering (read-only from the engine snapshot).

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};
use crate::widgets::ClickableList;

use super::actions::*;
use super::catalog::{self, CATALOG};
use super::engine::{format_points, View};
use super::state::{ButtonConfig, ButtonModifier, ButtonVariant, Point};
use super::surface::{Mount, Surface, Viewport};
use super::{DriftGame, Pending};

/// Smallest play field (inside its border) that still fits a button.
const MIN_FIELD_COLS: u16 = 12;
const MIN_FIELD_ROWS: u16 = 5;

/// Screen regions for one frame. Also the engine's [`Surface`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub hud: Rect,
    pub field: Rect,
    pub shop: Rect,
}

impl Screen {
    pub fn layout(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(MIN_FIELD_ROWS + 2)])
            .split(area);

        let body = if is_narrow_layout(area.width) {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(MIN_FIELD_ROWS + 2), Constraint::Length(14)])
                .split(rows[1])
        } else {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(62), Constraint::Percentage(38)])
                .split(rows[1])
        };

        Self {
            hud: rows[0],
            field: body[0],
            shop: body[1],
        }
    }

    /// The play field without its border.
    pub fn field_inner(&self) -> Rect {
        Block::default().borders(Borders::ALL).inner(self.field)
    }
}

impl Surface for Screen {
    fn has_mount(&self, mount: Mount) -> bool {
        match mount {
            Mount::ButtonContainer => {
                let inner = self.field_inner();
                inner.width >= MIN_FIELD_COLS && inner.height >= MIN_FIELD_ROWS
            }
            Mount::PointsDisplay => self.hud.height >= 3 && self.hud.width > 2,
            Mount::UpgradesList => self.shop.height >= 3 && self.shop.width > 2,
        }
    }

    fn viewport(&self) -> Viewport {
        let inner = self.field_inner();
        Viewport::new(inner.width as f64, inner.height as f64)
    }
}

pub fn render(game: &DriftGame, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
    let screen = Screen::layout(area);
    let view = game.engine.view();

    render_hud(&view, f, screen.hud);
    render_field(&view, f, &screen, click_state);
    if game.showing_slots() && view.slot_config_available {
        render_slots(game, &view, f, screen.shop, click_state);
    } else {
        render_shop(game, &view, f, screen.shop, click_state);
    }
}

// ── HUD ────────────────────────────────────────────────────────────────

fn render_hud(view: &View, f: &mut Frame, area: Rect) {
    let state = view.state;
    let mut detail = vec![
        Span::styled(" ", Style::default()),
        Span::styled(
            format!("{}x per click", state.click_multiplier.floor()),
            Style::default().fg(Color::Gray),
        ),
    ];
    if view.auto_clicker_running {
        detail.push(Span::styled(
            format!("  auto {} CP/s", state.auto_clicker_rate),
            Style::default().fg(Color::Cyan),
        ));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(" Points: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format_points(state.points),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(detail),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Click Drift ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
    f.render_widget(Paragraph::new(lines).block(block), area);
}

// ── Play field ─────────────────────────────────────────────────────────

fn render_field(view: &View, f: &mut Frame, screen: &Screen, click_state: &Rc<RefCell<ClickState>>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    f.render_widget(block, screen.field);
    let inner = screen.field_inner();

    let mut cs = click_state.borrow_mut();
    // Later ids are drawn on top and win hit tests.
    for (id, button) in view.buttons {
        let Some(rect) = button_rect(inner, button, view.frame) else {
            continue;
        };
        f.render_widget(Clear, rect);
        f.render_widget(button_widget(button), rect);
        cs.add_click_target(rect, CLICK_BUTTON_BASE + id);
    }
    drop(cs);

    for popup in view.popups {
        let style = match popup.variant {
            ButtonVariant::Normal => Style::default().fg(Color::Yellow),
            ButtonVariant::Golden => Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
            ButtonVariant::Frozen => Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        };
        let width = Line::from(popup.text.as_str()).width() as u16;
        if let Some(rect) = cell_rect(inner, popup.position, width, 1) {
            f.render_widget(Paragraph::new(Span::styled(popup.text.as_str(), style)), rect);
        }
    }

    if let Some(pointer) = view.pointer {
        let aim = Point::new(pointer.position.x - 1.0, pointer.position.y);
        if let Some(rect) = cell_rect(inner, aim, 1, 1) {
            f.render_widget(
                Paragraph::new(Span::styled(
                    "➤",
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )),
                rect,
            );
        }
    }
}

fn button_label(button: &ButtonConfig) -> &'static str {
    match button.variant {
        ButtonVariant::Normal => "Click!",
        ButtonVariant::Golden => "★ x5 ★",
        ButtonVariant::Frozen => "❄ +10 ❄",
    }
}

fn button_style(button: &ButtonConfig) -> Style {
    let base = match button.variant {
        ButtonVariant::Normal => Style::default().fg(Color::Green),
        ButtonVariant::Golden => Style::default().fg(Color::Yellow),
        ButtonVariant::Frozen => Style::default().fg(Color::LightCyan),
    };
    match button.modifier() {
        ButtonModifier::Hyperactive => base.fg(Color::LightMagenta).add_modifier(Modifier::BOLD),
        ButtonModifier::ZigZag => base.fg(Color::LightBlue),
        _ => base,
    }
}

/// Buttons too short for a border (Shrinking ones) draw as a bare label.
fn is_compact(button: &ButtonConfig) -> bool {
    button.size.height < 3.0
}

fn button_widget(button: &ButtonConfig) -> Paragraph<'static> {
    let style = button_style(button);
    let label = Span::styled(button_label(button), style.add_modifier(Modifier::BOLD));
    if is_compact(button) {
        Paragraph::new(Line::from(label)).style(style.add_modifier(Modifier::REVERSED))
    } else {
        Paragraph::new(Line::from(label)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(style),
        )
    }
}

/// Where `button` lands on screen this frame: its engine footprint, fitted
/// inside the field.
fn button_rect(inner: Rect, button: &ButtonConfig, frame: u64) -> Option<Rect> {
    let w = button.size.width as u16;
    let h = button.size.height as u16;
    let mut pos = button.position;
    if button.has_modifier(ButtonModifier::Bouncy) && (frame / 15) % 2 == 1 {
        pos.y -= 1.0;
    }
    cell_rect(inner, pos, w, h)
}

/// A `w`×`h` cell rectangle at `pos` (field units), shifted to stay in `inner`.
fn cell_rect(inner: Rect, pos: Point, w: u16, h: u16) -> Option<Rect> {
    if w == 0 || h == 0 || w > inner.width || h > inner.height {
        return None;
    }
    let max_x = inner.width - w;
    let max_y = inner.height - h;
    let x = (pos.x.max(0.0).floor() as u16).min(max_x);
    let y = (pos.y.max(0.0).floor() as u16).min(max_y);
    Some(Rect::new(inner.x + x, inner.y + y, w, h))
}

// ── Shop ───────────────────────────────────────────────────────────────

fn hint_line(text: &str, enabled: bool) -> Line<'static> {
    let color = if enabled { Color::Cyan } else { Color::DarkGray };
    Line::from(Span::styled(text.to_string(), Style::default().fg(color)))
}

fn render_shop(
    game: &DriftGame,
    view: &View,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let state = view.state;
    let mut cl = ClickableList::new();

    for (i, def) in CATALOG.iter().enumerate() {
        let Some(upgrade) = state.upgrade(def.id) else {
            continue;
        };
        let affordable = catalog::can_purchase(state, def.id);
        let (price, price_style) = if upgrade.is_maxed() {
            ("MAX".to_string(), Style::default().fg(Color::DarkGray))
        } else if affordable {
            (format_points(upgrade.cost), Style::default().fg(Color::Green))
        } else {
            (format_points(upgrade.cost), Style::default().fg(Color::Red))
        };
        let name_style = if affordable {
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };

        cl.push_clickable(
            Line::from(vec![
                Span::styled(format!(" [{}] ", i + 1), Style::default().fg(Color::Yellow)),
                Span::styled(upgrade.name.clone(), name_style),
                Span::styled(
                    format!(" Lv{}/{} ", upgrade.level, upgrade.max_level),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(price, price_style),
            ]),
            BUY_UPGRADE_BASE + i as u32,
        );
        cl.push(Line::from(Span::styled(
            format!("     {}", catalog::effect_description(upgrade)),
            Style::default().fg(Color::DarkGray),
        )));
    }

    cl.push(Line::from(""));
    match game.pending() {
        Some(pending) => {
            let question = match pending {
                Pending::Reset => " Reset all progress?",
                Pending::Delete => " Delete the save and reset?",
            };
            cl.push(Line::from(Span::styled(
                question,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
            cl.push_clickable(hint_line(" [Y] Yes", true), CONFIRM);
            cl.push_clickable(hint_line(" [N] No", true), CANCEL);
        }
        None => {
            if view.slot_config_available {
                cl.push_clickable(hint_line(" [S] Slot workshop", true), TOGGLE_SLOTS);
            }
            cl.push_clickable(hint_line(" [R] Reset", true), ASK_RESET);
            cl.push_clickable(hint_line(" [D] Delete save", true), ASK_DELETE);
        }
    }

    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1);
    drop(cs);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Upgrades ");
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}

fn render_slots(
    game: &DriftGame,
    view: &View,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let state = view.state;
    let mut cl = ClickableList::new();
    cl.push(Line::from(Span::styled(
        " Tap a slot to change its modifier",
        Style::default().fg(Color::Gray),
    )));

    let count = state.button_count();
    if count <= 1 {
        cl.push(Line::from(Span::styled(
            " Buy Multi Button to add slots",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for slot in 1..count {
        let (modifier, chosen) = match state.slot_override(slot) {
            Some(m) => (m, true),
            None => {
                let live = game
                    .engine
                    .slot_button(slot)
                    .and_then(|id| game.engine.button(id))
                    .map(|b| b.modifier())
                    .unwrap_or(ButtonModifier::None);
                (live, false)
            }
        };
        let suffix = if chosen { "" } else { " (random)" };
        cl.push_clickable(
            Line::from(vec![
                Span::styled(format!(" [{slot}] "), Style::default().fg(Color::Yellow)),
                Span::styled(format!("Slot {slot}: "), Style::default().fg(Color::White)),
                Span::styled(
                    format!("{}{suffix}", modifier.name()),
                    Style::default().fg(Color::LightMagenta),
                ),
            ]),
            CYCLE_SLOT_BASE + slot as u32,
        );
    }

    cl.push(Line::from(""));
    cl.push_clickable(hint_line(" [S] Back to upgrades", true), TOGGLE_SLOTS);

    let mut cs = click_state.borrow_mut();
    cl.register_targets(area, &mut cs, 1, 1);
    drop(cs);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightMagenta))
        .title(" Slot Workshop ");
    f.render_widget(Paragraph::new(cl.into_lines()).block(block), area);
}
