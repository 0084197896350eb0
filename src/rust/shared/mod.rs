/// Shared utilities and common modules
pub mod debugger;
pub mod diagnostics;

pub use debugger::DebugTimer;
pub use diagnostics::{DiagnosticEvent, DiagnosticLevel, Diagnostics, Verbosity};
