//! Page-wide engine instance
//!
//! The browser runs everything on one thread, so the engine lives in a
//! thread-local and every export borrows the same `Rc`.

pub mod console;

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::audio::AudioEngine;
use crate::platform::config::EngineConfig;
use crate::web::host::WebHost;

thread_local! {
    static ENGINE: RefCell<Option<Rc<AudioEngine>>> = const { RefCell::new(None) };
}

/// The engine for this page, created with default settings on first use
pub fn engine() -> Rc<AudioEngine> {
    ENGINE.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Rc::new(build(EngineConfig::default())))
            .clone()
    })
}

/// Replace the engine with one built from a custom config
pub fn configure(config: EngineConfig) -> Rc<AudioEngine> {
    let engine = Rc::new(build(config));
    ENGINE.with(|slot| *slot.borrow_mut() = Some(engine.clone()));
    engine
}

fn build(config: EngineConfig) -> AudioEngine {
    let engine = AudioEngine::new(Rc::new(WebHost::new()), config);
    engine.diagnostics().set_echo(console::echo());
    engine
}
