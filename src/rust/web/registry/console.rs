//! Browser console echo for diagnostics events

use std::rc::Rc;

use wasm_bindgen::JsValue;

use crate::shared::diagnostics::{DiagnosticEvent, DiagnosticLevel, DiagnosticsEcho};

pub fn echo() -> DiagnosticsEcho {
    Rc::new(|event: &DiagnosticEvent| {
        let line = JsValue::from_str(&format!(
            "[{}] [{}] {}",
            event.level.label(),
            event.category,
            event.message
        ));
        let data = event
            .data
            .as_ref()
            .and_then(|d| serde_wasm_bindgen::to_value(d).ok())
            .unwrap_or(JsValue::UNDEFINED);

        match event.level {
            DiagnosticLevel::Info => web_sys::console::log_2(&line, &data),
            DiagnosticLevel::Warn => web_sys::console::warn_2(&line, &data),
            DiagnosticLevel::Error => web_sys::console::error_2(&line, &data),
        }
    })
}
