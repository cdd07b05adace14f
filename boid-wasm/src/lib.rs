mod button;
mod canvas;
mod frame_loop;

pub use button::ButtonSimulation;
pub use canvas::CanvasSimulation;
pub use frame_loop::{start_button, start_canvas};

use boid_core::FlockError;
use boid_shared::FlockSettings;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) keeps the existing logger
    let _ = console_log::init_with_level(log::Level::Info);
}

pub(crate) fn flock_error(err: FlockError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Settings from optional (possibly partial) JSON over the variant's preset
pub(crate) fn load_settings(
    json: Option<String>,
    preset: FlockSettings,
) -> Result<FlockSettings, JsValue> {
    match json {
        Some(json) => FlockSettings::from_json_with_base(&json, &preset)
            .map_err(|err| JsValue::from_str(&format!("invalid flock settings: {err}"))),
        None => Ok(preset),
    }
}
