//! Bounded diagnostics log
//!
//! Every engine step lands here as a structured event. The buffer keeps the
//! most recent `capacity` entries and drops the oldest first. An optional echo
//! mirrors events to a console as they are recorded.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const DEFAULT_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Info,
    Warn,
    Error,
}

impl DiagnosticLevel {
    pub fn label(self) -> &'static str {
        match self {
            DiagnosticLevel::Info => "INFO",
            DiagnosticLevel::Warn => "WARN",
            DiagnosticLevel::Error => "ERROR",
        }
    }
}

/// How much is echoed, and whether per-voice detail is recorded at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    pub fn echoes(self, level: DiagnosticLevel) -> bool {
        match self {
            Verbosity::Quiet => level == DiagnosticLevel::Error,
            Verbosity::Normal => level != DiagnosticLevel::Info,
            Verbosity::Verbose => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEvent {
    pub timestamp: String,
    pub level: DiagnosticLevel,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub type Clock = Rc<dyn Fn() -> f64>;
pub type DiagnosticsEcho = Rc<dyn Fn(&DiagnosticEvent)>;

pub struct Diagnostics {
    entries: RefCell<VecDeque<DiagnosticEvent>>,
    capacity: usize,
    verbosity: Cell<Verbosity>,
    clock: Clock,
    echo: RefCell<Option<DiagnosticsEcho>>,
}

impl Diagnostics {
    pub fn new(capacity: usize, verbosity: Verbosity) -> Self {
        Self::with_clock(capacity, verbosity, Rc::new(system_now_ms))
    }

    pub fn with_clock(capacity: usize, verbosity: Verbosity, clock: Clock) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RefCell::new(VecDeque::with_capacity(capacity)),
            capacity,
            verbosity: Cell::new(verbosity),
            clock,
            echo: RefCell::new(None),
        }
    }

    pub fn set_echo(&self, echo: DiagnosticsEcho) {
        *self.echo.borrow_mut() = Some(echo);
    }

    pub fn set_verbosity(&self, verbosity: Verbosity) {
        self.verbosity.set(verbosity);
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity.get()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity.get() == Verbosity::Verbose
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(
        &self,
        level: DiagnosticLevel,
        category: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) {
        let event = DiagnosticEvent {
            timestamp: iso_timestamp((self.clock)()),
            level,
            category: category.to_string(),
            message: message.into(),
            data,
        };

        {
            let mut entries = self.entries.borrow_mut();
            while entries.len() >= self.capacity {
                entries.pop_front();
            }
            entries.push_back(event.clone());
        }

        if self.verbosity.get().echoes(level) {
            let echo = self.echo.borrow().clone();
            if let Some(echo) = echo {
                echo(&event);
            }
        }
    }

    /// `data` is serialized immediately, so later mutation of the caller's
    /// value cannot change the stored entry.
    pub fn record_with<D: Serialize + ?Sized>(
        &self,
        level: DiagnosticLevel,
        category: &str,
        message: impl Into<String>,
        data: &D,
    ) {
        let value = serde_json::to_value(data)
            .unwrap_or_else(|e| Value::String(format!("<unserializable: {e}>")));
        self.record(level, category, message, Some(value));
    }

    pub fn info(&self, category: &str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Info, category, message, None);
    }

    pub fn warn(&self, category: &str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Warn, category, message, None);
    }

    pub fn error(&self, category: &str, message: impl Into<String>) {
        self.record(DiagnosticLevel::Error, category, message, None);
    }

    pub fn info_with<D: Serialize + ?Sized>(&self, category: &str, message: impl Into<String>, data: &D) {
        self.record_with(DiagnosticLevel::Info, category, message, data);
    }

    pub fn warn_with<D: Serialize + ?Sized>(&self, category: &str, message: impl Into<String>, data: &D) {
        self.record_with(DiagnosticLevel::Warn, category, message, data);
    }

    pub fn error_with<D: Serialize + ?Sized>(&self, category: &str, message: impl Into<String>, data: &D) {
        self.record_with(DiagnosticLevel::Error, category, message, data);
    }

    /// Oldest first
    pub fn entries(&self) -> Vec<DiagnosticEvent> {
        self.entries.borrow().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.info("DEBUG", "Debug logs cleared");
    }

    /// Report bundling device info, a status snapshot and the full buffer
    pub fn export<E: Serialize, S: Serialize>(
        &self,
        device_info: &E,
        audio_status: &S,
    ) -> serde_json::Result<String> {
        let report = serde_json::json!({
            "timestamp": iso_timestamp((self.clock)()),
            "deviceInfo": serde_json::to_value(device_info)?,
            "audioStatus": serde_json::to_value(audio_status)?,
            "logs": self.entries(),
        });
        serde_json::to_string_pretty(&report)
    }
}

pub fn iso_timestamp(epoch_ms: f64) -> String {
    let nanos = (epoch_ms * 1_000_000.0) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
        .unwrap_or_else(|| format!("{epoch_ms}"))
}

#[cfg(not(all(target_arch = "wasm32", feature = "wasm")))]
pub fn system_now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
pub fn system_now_ms() -> f64 {
    js_sys::Date::now()
}

#[cfg(test)]
#[path = "test_diagnostics.rs"]
mod tests;
