//! Backend B: pre-rendered clips played through a small player pool
//!
//! Each key gets up to `pool_size` players built from one rendered clip. When
//! every pooled player is busy a one-off transient player is created instead,
//! so the pool itself never grows past its size. The number of keys is capped
//! and the least recently used key is evicted first.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::json;

use crate::engine::audio::environment::EnvironmentProbe;
use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::renderer::{RenderedClip, render_clip, render_single_shot};
use crate::engine::audio::request::ChordRequest;
use crate::engine::chords::ChordName;
use crate::engine::host::{AudioHost, ClipPlayer};
use crate::platform::config::ClipSection;
use crate::shared::diagnostics::Diagnostics;

/// What a clip is rendered from
#[derive(Debug, Clone, PartialEq)]
pub enum ClipSource {
    ChordName(String),
    Request(ChordRequest),
}

impl ClipSource {
    pub fn key(&self) -> String {
        match self {
            ClipSource::ChordName(name) => name.trim().to_string(),
            ClipSource::Request(request) => request.clip_key(),
        }
    }
}

struct ClipPool {
    clip: RenderedClip,
    root_frequency: f32,
    players: Vec<Rc<dyn ClipPlayer>>,
    last_used: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipPoolStats {
    pub pooled_keys: usize,
    pub pooled_players: usize,
    pub transient_players: usize,
    pub max_pooled_keys: usize,
}

pub struct ClipBackend {
    host: Rc<dyn AudioHost>,
    probe: Rc<EnvironmentProbe>,
    diagnostics: Rc<Diagnostics>,
    config: ClipSection,
    pools: RefCell<HashMap<String, ClipPool>>,
    transients: RefCell<Vec<Rc<dyn ClipPlayer>>>,
    tick: Cell<u64>,
}

impl ClipBackend {
    pub fn new(
        host: Rc<dyn AudioHost>,
        probe: Rc<EnvironmentProbe>,
        diagnostics: Rc<Diagnostics>,
        config: ClipSection,
    ) -> Self {
        Self {
            host,
            probe,
            diagnostics,
            config,
            pools: RefCell::new(HashMap::new()),
            transients: RefCell::new(Vec::new()),
            tick: Cell::new(0),
        }
    }

    /// Minimal support check: can the host's media element decode WAV
    pub fn is_supported(&self) -> bool {
        self.host.clip_support().is_playable()
    }

    pub async fn play(&self, source: &ClipSource) -> bool {
        let key = source.key();
        match self.try_play(source).await {
            Ok(()) => {
                self.diagnostics
                    .info_with("CLIP", "Clip playback started", &json!({ "key": key }));
                true
            }
            Err(e) => {
                self.diagnostics.error_with(
                    "CLIP",
                    "Clip playback failed",
                    &json!({ "key": key, "error": e.to_string(), "kind": e.kind() }),
                );
                false
            }
        }
    }

    pub async fn try_play(&self, source: &ClipSource) -> AudioResult<()> {
        if !self.is_supported() {
            return Err(AudioError::NotSupported(
                "media element reports no WAV support".into(),
            ));
        }

        let key = source.key();
        self.ensure_pool(&key, source)?;

        let player = match self.take_idle_player(&key) {
            Some(player) => player,
            None => self.create_transient(&key)?,
        };

        let Err(error) = player.play().await else {
            return Ok(());
        };

        if !self.probe.is_restricted() {
            return Err(error);
        }

        self.diagnostics.warn_with(
            "CLIP",
            "Pooled play rejected, retrying with a single-shot clip",
            &json!({ "key": key, "error": error.to_string() }),
        );
        self.play_single_shot(&key).await
    }

    /// Build the pool for a key without playing it
    pub fn preload(&self, source: &ClipSource) -> AudioResult<()> {
        let key = source.key();
        self.ensure_pool(&key, source)
    }

    /// Pause and rewind every pooled and transient player. Returns how many
    /// players were told to stop.
    pub fn stop_all(&self) -> usize {
        let mut stopped = 0;
        for pool in self.pools.borrow().values() {
            for player in &pool.players {
                player.stop();
                player.rewind();
                stopped += 1;
            }
        }

        let transients: Vec<_> = self.transients.borrow_mut().drain(..).collect();
        for player in transients {
            player.stop();
            stopped += 1;
        }

        self.diagnostics
            .info_with("CLIP", "Stopped all clip players", &json!({ "players": stopped }));
        stopped
    }

    pub fn has_pool(&self, key: &str) -> bool {
        self.pools.borrow().contains_key(key)
    }

    pub fn pooled_players(&self, key: &str) -> usize {
        self.pools
            .borrow()
            .get(key)
            .map(|pool| pool.players.len())
            .unwrap_or(0)
    }

    pub fn stats(&self) -> ClipPoolStats {
        self.prune_transients();
        let pools = self.pools.borrow();
        ClipPoolStats {
            pooled_keys: pools.len(),
            pooled_players: pools.values().map(|p| p.players.len()).sum(),
            transient_players: self.transients.borrow().len(),
            max_pooled_keys: self.config.max_pooled_keys(),
        }
    }

    fn next_tick(&self) -> u64 {
        let tick = self.tick.get() + 1;
        self.tick.set(tick);
        tick
    }

    fn ensure_pool(&self, key: &str, source: &ClipSource) -> AudioResult<()> {
        let tick = self.next_tick();
        if let Some(pool) = self.pools.borrow_mut().get_mut(key) {
            pool.last_used = tick;
            return Ok(());
        }

        let (frequencies, root_frequency) = self.frequencies_for(source)?;
        let clip = render_clip(key, &frequencies, self.config.duration())?;

        let mut players = Vec::with_capacity(self.config.pool_size());
        let mut first_error = None;
        for _ in 0..self.config.pool_size() {
            match self.host.create_clip_player(&clip, self.config.volume) {
                Ok(player) => players.push(player),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        if players.is_empty() {
            return Err(first_error
                .unwrap_or_else(|| AudioError::Host("no clip players could be created".into())));
        }

        self.evict_if_full();
        self.diagnostics.info_with(
            "CLIP",
            "Clip pool created",
            &json!({
                "key": key,
                "players": players.len(),
                "bytes": clip.byte_len(),
                "durationSecs": clip.duration_secs,
            }),
        );

        let pool = ClipPool {
            clip,
            root_frequency,
            players,
            last_used: self.next_tick(),
        };
        self.pools.borrow_mut().insert(key.to_string(), pool);
        Ok(())
    }

    fn frequencies_for(&self, source: &ClipSource) -> AudioResult<(Vec<f32>, f32)> {
        match source {
            ClipSource::ChordName(name) => {
                let chord = ChordName::parse(name)?;
                if chord.assumed_major {
                    self.diagnostics.warn_with(
                        "CLIP",
                        "Unknown chord suffix, rendering the major triad",
                        &chord,
                    );
                }
                let octave = self.config.root_octave;
                Ok((chord.frequencies(octave), chord.root_frequency(octave)))
            }
            ClipSource::Request(request) => {
                let resolved = request.resolve()?;
                let root = resolved.frequencies[0];
                Ok((resolved.frequencies, root))
            }
        }
    }

    fn evict_if_full(&self) {
        let evicted = {
            let mut pools = self.pools.borrow_mut();
            if pools.len() < self.config.max_pooled_keys() {
                return;
            }
            let oldest = pools
                .iter()
                .min_by_key(|(_, pool)| pool.last_used)
                .map(|(key, _)| key.clone());
            oldest.and_then(|key| pools.remove(&key).map(|pool| (key, pool)))
        };

        if let Some((key, pool)) = evicted {
            for player in &pool.players {
                player.stop();
            }
            self.diagnostics
                .info_with("CLIP", "Evicted least recently used pool", &json!({ "key": key }));
        }
    }

    fn take_idle_player(&self, key: &str) -> Option<Rc<dyn ClipPlayer>> {
        let tick = self.next_tick();
        let mut pools = self.pools.borrow_mut();
        let pool = pools.get_mut(key)?;
        pool.last_used = tick;
        let player = pool.players.iter().find(|p| p.is_idle())?.clone();
        player.rewind();
        Some(player)
    }

    fn create_transient(&self, key: &str) -> AudioResult<Rc<dyn ClipPlayer>> {
        let player = {
            let pools = self.pools.borrow();
            let pool = pools
                .get(key)
                .ok_or_else(|| AudioError::Host(format!("no pool for {key}")))?;
            self.host.create_clip_player(&pool.clip, self.config.volume)?
        };

        self.prune_transients();
        self.transients.borrow_mut().push(player.clone());
        self.diagnostics.info_with(
            "CLIP",
            "All pooled players busy, using a transient player",
            &json!({ "key": key }),
        );
        Ok(player)
    }

    fn prune_transients(&self) {
        self.transients.borrow_mut().retain(|p| !p.is_idle());
    }

    async fn play_single_shot(&self, key: &str) -> AudioResult<()> {
        let root_frequency = self
            .pools
            .borrow()
            .get(key)
            .map(|pool| pool.root_frequency)
            .ok_or_else(|| AudioError::Host(format!("no pool for {key}")))?;

        let clip = render_single_shot(key, root_frequency, self.config.duration())?;
        let player = self
            .host
            .create_single_shot_player(&clip, self.config.volume)?;
        player.play().await?;

        self.prune_transients();
        self.transients.borrow_mut().push(player);
        self.diagnostics
            .info_with("CLIP", "Single-shot clip playback succeeded", &json!({ "key": key }));
        Ok(())
    }
}

#[cfg(test)]
#[path = "test_clip.rs"]
mod tests;
