//! wasm-bindgen exports
//!
//! Playback calls resolve to a boolean and never reject; the reason for a
//! `false` is in the diagnostics export.

pub mod diagnostics;
pub mod playback;
