//! # Strumkit WASM Module
//!
//! Browser bindings for the chord engine.
//!
//! - `host`: Web Audio and `<audio>` element implementation of the host traits
//! - `registry`: the per-page engine instance and console echo
//! - `api`: wasm-bindgen exports consumed by the UI
//! - `utils`: JS error conversion

#![cfg(all(target_arch = "wasm32", feature = "wasm"))]

pub mod api;
pub mod host;
pub mod registry;
pub mod utils;

pub use api::diagnostics::*;
pub use api::playback::*;
