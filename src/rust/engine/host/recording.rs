//! Scripted in-memory host
//!
//! Produces no sound. Every graph, voice, and clip trigger is written to a
//! shared `RecordingLog`, and the script decides how the environment
//! misbehaves (hanging resumes, rejected plays, missing audio API).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};

use super::{
    AudioHost, ClipPlayer, ClipSupport, ContextState, GraphOptions, LatencyInfo, LiveGraph, Voice,
    VoiceEnded,
};
use crate::engine::audio::environment::EnvironmentInfo;
use crate::engine::audio::error::{AudioError, AudioResult};
use crate::engine::audio::renderer::RenderedClip;
use crate::shared::diagnostics::system_now_ms;

pub type Sleeper = Rc<dyn Fn(Duration) -> LocalBoxFuture<'static, ()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumeBehavior {
    #[default]
    Succeeds,
    /// Never settles
    Hangs,
    Fails,
    /// Settles but the state stays where it was
    NoEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceEnd {
    #[default]
    AfterDuration,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClipBehavior {
    #[default]
    Plays,
    /// Pooled players are refused, freshly built single-shot ones play
    RejectPooled,
    RejectAll,
}

#[derive(Debug, Clone)]
pub struct RecordingScript {
    pub environment: EnvironmentInfo,
    /// State of a freshly created graph
    pub initial_state: ContextState,
    pub resume: ResumeBehavior,
    pub voice_end: VoiceEnd,
    pub clip_support: ClipSupport,
    pub clip: ClipBehavior,
    pub schedule_fails: bool,
}

impl Default for RecordingScript {
    fn default() -> Self {
        Self {
            environment: EnvironmentInfo {
                user_agent: "strumkit-recording/1.0 (X11; Linux x86_64)".to_string(),
                platform: "Linux x86_64".to_string(),
                language: "en-US".to_string(),
                hardware_concurrency: 1,
                timezone: "UTC".to_string(),
                has_audio_api: true,
                ..Default::default()
            },
            initial_state: ContextState::Running,
            resume: ResumeBehavior::Succeeds,
            voice_end: VoiceEnd::AfterDuration,
            clip_support: ClipSupport::Probably,
            clip: ClipBehavior::Plays,
            schedule_fails: false,
        }
    }
}

impl RecordingScript {
    /// An iPhone user agent whose graphs start suspended
    pub fn restricted() -> Self {
        let mut script = Self::default();
        script.environment.user_agent = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1".to_string();
        script.environment.platform = "iPhone".to_string();
        script.environment.max_touch_points = 5;
        script.initial_state = ContextState::Suspended;
        script
    }

    pub fn without_audio() -> Self {
        let mut script = Self::default();
        script.environment.has_audio_api = false;
        script
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingLog {
    pub graphs_created: usize,
    pub resume_calls: usize,
    pub suspend_calls: usize,
    pub close_calls: usize,
    pub voices: Vec<Voice>,
    pub clip_players_created: usize,
    pub single_shot_players_created: usize,
    /// Clip keys, one per accepted trigger
    pub clip_plays: Vec<String>,
    pub rejected_plays: usize,
    pub clip_stops: usize,
}

type SharedScript = Rc<RefCell<RecordingScript>>;
type SharedLog = Rc<RefCell<RecordingLog>>;

pub struct RecordingHost {
    script: SharedScript,
    log: SharedLog,
    sleeper: Sleeper,
    graphs: RefCell<Vec<Rc<RecordingGraph>>>,
    players: RefCell<Vec<Weak<RecordingClipPlayer>>>,
}

impl RecordingHost {
    pub fn new(script: RecordingScript, sleeper: Sleeper) -> Self {
        Self {
            script: Rc::new(RefCell::new(script)),
            log: Rc::new(RefCell::new(RecordingLog::default())),
            sleeper,
            graphs: RefCell::new(Vec::new()),
            players: RefCell::new(Vec::new()),
        }
    }

    /// Sleeps on the tokio timer, so paused-time tests advance instantly
    #[cfg(any(test, feature = "cli"))]
    pub fn with_tokio(script: RecordingScript) -> Self {
        Self::new(script, Rc::new(|d| tokio::time::sleep(d).boxed_local()))
    }

    pub fn log(&self) -> RecordingLog {
        self.log.borrow().clone()
    }

    pub fn update_script(&self, change: impl FnOnce(&mut RecordingScript)) {
        change(&mut self.script.borrow_mut());
    }

    pub fn latest_graph(&self) -> Option<Rc<RecordingGraph>> {
        self.graphs.borrow().last().cloned()
    }

    /// Clip players still alive
    pub fn live_players(&self) -> usize {
        self.players
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    pub fn tracked_players(&self) -> usize {
        self.players.borrow().len()
    }

    /// Mark every clip player as finished
    pub fn finish_all(&self) {
        for player in self.players.borrow().iter().filter_map(Weak::upgrade) {
            player.playing.set(false);
        }
    }
}

#[async_trait(?Send)]
impl AudioHost for RecordingHost {
    fn environment(&self) -> EnvironmentInfo {
        self.script.borrow().environment.clone()
    }

    fn now_ms(&self) -> f64 {
        system_now_ms()
    }

    async fn sleep(&self, duration: Duration) {
        (self.sleeper)(duration).await
    }

    fn create_graph(&self, options: &GraphOptions) -> AudioResult<Rc<dyn LiveGraph>> {
        let script = self.script.borrow();
        if !script.environment.has_audio_api {
            return Err(AudioError::NotSupported(
                "no audio API in this environment".into(),
            ));
        }

        let graph = Rc::new(RecordingGraph {
            state: Cell::new(script.initial_state),
            sample_rate: options.sample_rate,
            time: Cell::new(0.0),
            script: self.script.clone(),
            log: self.log.clone(),
            sleeper: self.sleeper.clone(),
        });
        self.log.borrow_mut().graphs_created += 1;
        self.graphs.borrow_mut().push(graph.clone());
        Ok(graph)
    }

    fn clip_support(&self) -> ClipSupport {
        self.script.borrow().clip_support
    }

    fn create_clip_player(
        &self,
        clip: &RenderedClip,
        _volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        self.log.borrow_mut().clip_players_created += 1;
        Ok(self.track_player(clip, false))
    }

    fn create_single_shot_player(
        &self,
        clip: &RenderedClip,
        _volume: f32,
    ) -> AudioResult<Rc<dyn ClipPlayer>> {
        self.log.borrow_mut().single_shot_players_created += 1;
        Ok(self.track_player(clip, true))
    }
}

impl RecordingHost {
    fn track_player(&self, clip: &RenderedClip, single_shot: bool) -> Rc<RecordingClipPlayer> {
        let player = Rc::new(RecordingClipPlayer {
            key: clip.key.clone(),
            single_shot,
            playing: Cell::new(false),
            script: self.script.clone(),
            log: self.log.clone(),
        });
        let mut players = self.players.borrow_mut();
        players.retain(|weak| weak.strong_count() > 0);
        players.push(Rc::downgrade(&player));
        drop(players);
        player
    }
}

pub struct RecordingGraph {
    state: Cell<ContextState>,
    sample_rate: u32,
    time: Cell<f64>,
    script: SharedScript,
    log: SharedLog,
    sleeper: Sleeper,
}

impl RecordingGraph {
    pub fn advance(&self, secs: f64) {
        self.time.set(self.time.get() + secs);
    }

    /// Simulate the environment changing the state behind the engine's back
    pub fn force_state(&self, state: ContextState) {
        self.state.set(state);
    }
}

#[async_trait(?Send)]
impl LiveGraph for RecordingGraph {
    fn state(&self) -> ContextState {
        self.state.get()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn current_time(&self) -> f64 {
        self.time.get()
    }

    fn latency(&self) -> LatencyInfo {
        LatencyInfo {
            base_latency: Some(0.005),
            output_latency: Some(0.02),
        }
    }

    async fn resume(&self) -> AudioResult<()> {
        self.log.borrow_mut().resume_calls += 1;
        if self.state.get() == ContextState::Closed {
            return Err(AudioError::Host("cannot resume a closed graph".into()));
        }

        let behavior = self.script.borrow().resume;
        match behavior {
            ResumeBehavior::Succeeds => {
                self.state.set(ContextState::Running);
                Ok(())
            }
            ResumeBehavior::Hangs => future::pending::<AudioResult<()>>().await,
            ResumeBehavior::Fails => Err(AudioError::Host("resume refused".into())),
            ResumeBehavior::NoEffect => Ok(()),
        }
    }

    async fn suspend(&self) -> AudioResult<()> {
        self.log.borrow_mut().suspend_calls += 1;
        if self.state.get() != ContextState::Closed {
            self.state.set(ContextState::Suspended);
        }
        Ok(())
    }

    async fn close(&self) -> AudioResult<()> {
        self.log.borrow_mut().close_calls += 1;
        self.state.set(ContextState::Closed);
        Ok(())
    }

    fn schedule_voice(&self, voice: Voice) -> AudioResult<VoiceEnded> {
        if self.state.get() == ContextState::Closed {
            return Err(AudioError::Host("graph is closed".into()));
        }
        let (fails, end) = {
            let script = self.script.borrow();
            (script.schedule_fails, script.voice_end)
        };
        if fails {
            return Err(AudioError::Host("oscillator start refused".into()));
        }

        let remaining = (voice.stop_at - self.time.get()).max(0.0);
        self.log.borrow_mut().voices.push(voice);

        Ok(match end {
            VoiceEnd::AfterDuration => (self.sleeper)(Duration::from_secs_f64(remaining)),
            VoiceEnd::Never => future::pending().boxed_local(),
        })
    }
}

pub struct RecordingClipPlayer {
    key: String,
    single_shot: bool,
    playing: Cell<bool>,
    script: SharedScript,
    log: SharedLog,
}

#[async_trait(?Send)]
impl ClipPlayer for RecordingClipPlayer {
    fn is_idle(&self) -> bool {
        !self.playing.get()
    }

    fn rewind(&self) {}

    async fn play(&self) -> AudioResult<()> {
        let behavior = self.script.borrow().clip;
        let rejected = match behavior {
            ClipBehavior::Plays => false,
            ClipBehavior::RejectPooled => !self.single_shot,
            ClipBehavior::RejectAll => true,
        };

        if rejected {
            self.log.borrow_mut().rejected_plays += 1;
            return Err(AudioError::PlaybackRejected(
                "play() refused outside a user gesture".into(),
            ));
        }

        self.playing.set(true);
        self.log.borrow_mut().clip_plays.push(self.key.clone());
        Ok(())
    }

    fn stop(&self) {
        if self.playing.replace(false) {
            self.log.borrow_mut().clip_stops += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::audio::renderer::render_clip;

    #[test]
    fn test_dropped_players_are_not_tracked_forever() {
        let host = RecordingHost::with_tokio(RecordingScript::default());
        let clip = render_clip("C", &[261.63], 1.5).unwrap();

        let kept = host.create_clip_player(&clip, 1.0).unwrap();
        for _ in 0..50 {
            let _transient = host.create_single_shot_player(&clip, 1.0).unwrap();
        }

        assert_eq!(host.live_players(), 1);
        assert!(host.tracked_players() <= 2);
        assert_eq!(host.log().single_shot_players_created, 50);
        drop(kept);
    }
}
