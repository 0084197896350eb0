#![cfg(feature = "cli")]

pub mod diagnostics;
pub mod play;
pub mod progression;
pub mod render;
pub mod status;
