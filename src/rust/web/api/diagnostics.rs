//! Status and diagnostics API for WASM

use wasm_bindgen::prelude::*;

use crate::web::registry;
use crate::web::utils::errors::to_js;

/// Read-only snapshot for a debug panel
#[wasm_bindgen]
pub fn get_status() -> Result<JsValue, JsValue> {
    to_js(&registry::engine().status())
}

/// Pretty JSON report, ready to offer as a download
#[wasm_bindgen]
pub fn export_diagnostics() -> String {
    registry::engine().export_diagnostics()
}

#[wasm_bindgen]
pub fn clear_diagnostics() {
    registry::engine().clear_diagnostics();
}

/// Raw log entries, oldest first
#[wasm_bindgen]
pub fn get_diagnostics_log() -> Result<JsValue, JsValue> {
    to_js(&registry::engine().diagnostics().entries())
}
