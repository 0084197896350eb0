//! Playback and mode control API for WASM

use wasm_bindgen::prelude::*;

use crate::engine::audio::{PlayOptions, PlayTarget};
use crate::engine::chords::FretPosition;
use crate::platform::config::EngineConfig;
use crate::web::registry;
use crate::web::utils::errors::to_js_error;

/// Replace the page engine with one built from a JSON config
#[wasm_bindgen]
pub fn configure_engine(config_json: &str) -> Result<(), JsValue> {
    let config = EngineConfig::from_json_str(config_json).map_err(to_js_error)?;
    registry::configure(config);
    Ok(())
}

/// Play a list of note names such as `["C4", "E4", "G4"]`
#[wasm_bindgen]
pub async fn play_notes(notes: JsValue, strum: bool) -> bool {
    let notes: Vec<String> = match serde_wasm_bindgen::from_value(notes) {
        Ok(notes) => notes,
        Err(e) => {
            registry::engine().diagnostics().error_with(
                "WASM",
                "play_notes expects an array of note names",
                &serde_json::json!({ "error": e.to_string() }),
            );
            return false;
        }
    };
    let engine = registry::engine();
    engine
        .play(&PlayTarget::Notes(notes), PlayOptions { strum })
        .await
}

/// Play raw frequencies in Hz
#[wasm_bindgen]
pub async fn play_frequencies(frequencies: Vec<f32>, strum: bool) -> bool {
    let engine = registry::engine();
    engine
        .play(&PlayTarget::Frequencies(frequencies), PlayOptions { strum })
        .await
}

/// Play a chord by name ("C", "Am", "F#m7")
#[wasm_bindgen]
pub async fn play_chord(name: String, strum: bool) -> bool {
    let engine = registry::engine();
    engine
        .play(&PlayTarget::Chord(name), PlayOptions { strum })
        .await
}

/// Play a fingering given as `[{ string, fret }, ...]`
#[wasm_bindgen]
pub async fn play_positions(positions: JsValue, strum: bool) -> bool {
    let engine = registry::engine();
    match serde_wasm_bindgen::from_value::<Vec<FretPosition>>(positions) {
        Ok(positions) => engine.play_positions(&positions, PlayOptions { strum }).await,
        Err(e) => {
            engine.diagnostics().error_with(
                "WASM",
                "play_positions expects an array of { string, fret }",
                &serde_json::json!({ "error": e.to_string() }),
            );
            false
        }
    }
}

#[wasm_bindgen]
pub fn preload_chord(name: &str) -> bool {
    registry::engine().preload(name)
}

#[wasm_bindgen]
pub fn preload_common_chords() -> usize {
    registry::engine().preload_common()
}

#[wasm_bindgen]
pub fn stop_all() -> usize {
    registry::engine().stop_all()
}

/// Call from a user gesture handler
#[wasm_bindgen]
pub async fn unlock_audio() -> bool {
    let engine = registry::engine();
    engine.unlock().await
}

/// Pause the live graph when the page is hidden
#[wasm_bindgen]
pub async fn suspend_audio() -> bool {
    let engine = registry::engine();
    engine.suspend().await
}

#[wasm_bindgen]
pub async fn close_audio() -> bool {
    let engine = registry::engine();
    engine.close().await
}

#[wasm_bindgen]
pub fn force_live_mode() -> String {
    registry::engine().force_live_mode().label().to_string()
}

#[wasm_bindgen]
pub fn force_clip_mode() -> String {
    registry::engine().force_clip_mode().label().to_string()
}

#[wasm_bindgen]
pub fn auto_detect_mode() -> String {
    registry::engine().auto_detect_mode().label().to_string()
}
