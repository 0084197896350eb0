#![allow(dead_code)]
#![allow(clippy::module_inception)]

pub mod engine;
pub mod platform;
pub mod services;
pub mod shared;
pub mod utils;

// Logger everywhere; the CLI itself needs a terminal and an audio device
pub mod tools;

// WebAssembly bindings (only compiled for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod web;
