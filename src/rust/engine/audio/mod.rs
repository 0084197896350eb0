pub mod context;
pub mod deadline;
pub mod dispatcher;
pub mod encoders;
pub mod engine;
pub mod environment;
pub mod error;
pub mod frequency;
pub mod playback;
pub mod renderer;
pub mod request;
pub mod synth;

pub use dispatcher::BackendMode;
pub use engine::{AudioEngine, EngineStatus, PlayOptions, PlayTarget};
pub use error::{AudioError, AudioResult};
pub use request::ChordRequest;
