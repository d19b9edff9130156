//! Browser console logging.
//!
//! Game code is platform-neutral and unit-tested natively, so it logs through
//! these wrappers instead of calling `web_sys::console` directly. Off wasm the
//! messages are discarded.

#[cfg(target_arch = "wasm32")]
pub fn log(msg: &str) {
    web_sys::console::log_1(&format!("Click Drift: {msg}").into());
}

#[cfg(target_arch = "wasm32")]
pub fn warn(msg: &str) {
    web_sys::console::warn_1(&format!("Click Drift: {msg}").into());
}

#[cfg(target_arch = "wasm32")]
pub fn error(msg: &str) {
    web_sys::console::error_1(&format!("Click Drift: {msg}").into());
}

#[cfg(not(target_arch = "wasm32"))]
pub fn log(_msg: &str) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn warn(_msg: &str) {}

#[cfg(not(target_arch = "wasm32"))]
pub fn error(_msg: &str) {}
