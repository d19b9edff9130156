mod console;
mod drift;
mod input;
mod time;
mod widgets;

use std::{cell::RefCell, io, rc::Rc};

use drift::config::EngineConfig;
use drift::render::Screen;
use drift::save::{MemoryStore, SaveStore};
use drift::surface::Surface;
use drift::DriftGame;
use input::{pixel_x_to_col, pixel_y_to_row, ClickState, InputEvent};
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Terminal;
use ratzilla::{DomBackend, WebRenderer};
use time::GameTime;

/// Query the grid container's bounding rect and convert a pixel position to a cell.
fn dom_pixel_to_cell(mouse_x: u32, mouse_y: u32, cs: &ClickState) -> Option<(u16, u16)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    let col = pixel_x_to_col(mouse_x as f64 - rect.left(), rect.width(), cs.terminal_cols)?;
    let row = pixel_y_to_row(mouse_y as f64 - rect.top(), rect.height(), cs.terminal_rows)?;
    Some((col, row))
}

fn open_store() -> Box<dyn SaveStore> {
    #[cfg(target_arch = "wasm32")]
    if let Some(storage) = drift::save::LocalStorage::open() {
        return Box::new(storage);
    }
    console::warn("localStorage unavailable, progress will not persist");
    Box::new(MemoryStore::new())
}

fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();

    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;
    let size = terminal.size()?;
    let screen = Screen::layout(Rect::new(0, 0, size.width, size.height));

    let config = EngineConfig::new();
    let frame_ms = config.frame_ms;
    let rng = drift::random::seeded(js_sys::Date::now() as u64);
    let game = match DriftGame::new(&screen, open_store(), rng, config) {
        Ok(game) => game,
        Err(e) => {
            console::error(&e.to_string());
            return Err(io::Error::other(e));
        }
    };

    let game = Rc::new(RefCell::new(game));
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let clock = Rc::new(RefCell::new(GameTime::from_frame_ms(frame_ms)));

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let game = game.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let cs = click_state.borrow();
            if cs.terminal_rows == 0 || cs.terminal_cols == 0 {
                return;
            }
            let Some((col, row)) = dom_pixel_to_cell(mouse_event.x, mouse_event.y, &cs) else {
                return;
            };
            let matched = cs.hit_test(col, row);
            drop(cs);

            if let Some(action_id) = matched {
                game.borrow_mut()
                    .handle_input(&InputEvent::Click(action_id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let game = game.clone();
        move |key_event| {
            let key = match key_event.code {
                KeyCode::Char(c) => c.to_ascii_lowercase(),
                KeyCode::Esc => 'n',
                _ => return,
            };
            game.borrow_mut().handle_input(&InputEvent::Key(key));
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let size = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            let ticks = clock.borrow_mut().update(now_ms());
            let mut g = game.borrow_mut();
            if ticks > 0 {
                g.tick(ticks);
            }
            g.engine.set_viewport(Screen::layout(size).viewport());
            g.render(f, size, &click_state);
        }
    });

    Ok(())
}
