/// Elapsed-time measurement against the host clock
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugTimer {
    label: String,
    started_ms: f64,
}

impl DebugTimer {
    pub fn new(label: impl Into<String>, now_ms: f64) -> Self {
        Self {
            label: label.into(),
            started_ms: now_ms,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed_ms(&self, now_ms: f64) -> f64 {
        (now_ms - self.started_ms).max(0.0)
    }
}

#[cfg(test)]
#[path = "test_shared_debugger.rs"]
mod tests;
