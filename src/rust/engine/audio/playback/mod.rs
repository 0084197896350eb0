pub mod clip;
pub mod live;

pub use clip::{ClipBackend, ClipPoolStats, ClipSource};
pub use live::LiveBackend;
