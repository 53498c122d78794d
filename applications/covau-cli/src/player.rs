//! Timer driven player
//!
//! Stands in for an audio backend: a track "plays" for a fixed time and then
//! reports `Finished`, so the queue can be driven end to end from a terminal.

use async_trait::async_trait;
use covau_core::{
    CovauError, MessageHandler, Player, PlayerHandlers, PlayerMessage, Result, SharedItem,
};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

pub struct SimulatedPlayer {
    inner: Arc<Inner>,
}

struct Inner {
    track: Duration,
    handlers: PlayerHandlers,
    /// Bumped on every start, pause and seek; stale timers check it
    generation: AtomicU64,
    paused: AtomicBool,
    finished: AtomicBool,
    muted: AtomicBool,
    volume: Mutex<f64>,
    clock: Mutex<Clock>,
}

#[derive(Default)]
struct Clock {
    /// Position accumulated before the last (re)start
    elapsed: Duration,
    running_since: Option<Instant>,
}

impl Clock {
    fn position(&self) -> Duration {
        self.elapsed + self.running_since.map_or(Duration::ZERO, |at| at.elapsed())
    }

    fn stop(&mut self) {
        self.elapsed = self.position();
        self.running_since = None;
    }

    fn start(&mut self) {
        self.running_since = Some(Instant::now());
    }
}

impl SimulatedPlayer {
    pub fn new(track: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                track,
                handlers: PlayerHandlers::new(),
                generation: AtomicU64::new(0),
                paused: AtomicBool::new(false),
                finished: AtomicBool::new(true),
                muted: AtomicBool::new(false),
                volume: Mutex::new(1.0),
                clock: Mutex::new(Clock::default()),
            }),
        }
    }
}

impl Inner {
    fn clock(&self) -> std::sync::MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, message: PlayerMessage) {
        self.handlers.emit(&message);
    }

    /// Invalidate any pending timer
    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn seek(self: &Arc<Self>, position: Duration) {
        let position = position.min(self.track);
        {
            let mut clock = self.clock();
            clock.elapsed = position;
            clock.running_since = None;
        }
        if self.paused.load(Ordering::Acquire) {
            self.bump();
        } else {
            self.clock().start();
            self.start_timer();
        }
    }

    /// Report `Finished` once the rest of the track has elapsed
    fn start_timer(self: &Arc<Self>) {
        let generation = self.bump();
        let remaining = self.track.saturating_sub(self.clock().position());
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            if inner.generation.load(Ordering::Acquire) != generation
                || inner.paused.load(Ordering::Acquire)
            {
                return;
            }
            inner.clock().stop();
            inner.finished.store(true, Ordering::Release);
            inner.emit(PlayerMessage::Finished);
        });
    }
}

#[async_trait]
impl Player for SimulatedPlayer {
    async fn play_item(&self, item: &SharedItem) -> Result<()> {
        let Some(source) = item.resolve_stream_uri().await? else {
            return Err(CovauError::player(format!(
                "no playable source for \"{}\"",
                item.title()
            )));
        };
        let uri = source.uri();
        debug!("Simulating {}", uri);

        *self.inner.clock() = Clock::default();
        self.inner.clock().start();
        self.inner.paused.store(false, Ordering::Release);
        self.inner.finished.store(false, Ordering::Release);

        self.inner.emit(PlayerMessage::Playing(uri));
        self.inner
            .emit(PlayerMessage::Duration(self.inner.track.as_secs_f64()));
        self.inner.start_timer();
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        if self.inner.paused.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.inner.bump();
        self.inner.clock().stop();
        self.inner.emit(PlayerMessage::Paused);
        Ok(())
    }

    async fn unpause(&self) -> Result<()> {
        if !self.inner.paused.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        self.inner.emit(PlayerMessage::Unpaused);
        if !self.inner.finished.load(Ordering::Acquire) {
            self.inner.clock().start();
            self.inner.start_timer();
        }
        Ok(())
    }

    async fn toggle_pause(&self) -> Result<()> {
        if self.inner.paused.load(Ordering::Acquire) {
            self.unpause().await
        } else {
            self.pause().await
        }
    }

    async fn seek_to_perc(&self, perc: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&perc) {
            return Err(CovauError::invalid_input(format!(
                "seek position {perc} out of range"
            )));
        }
        self.inner.seek(self.inner.track.mul_f64(perc));
        Ok(())
    }

    async fn seek_by(&self, secs: f64) -> Result<()> {
        let position = self.inner.clock().position().as_secs_f64() + secs;
        let position = position.clamp(0.0, self.inner.track.as_secs_f64());
        self.inner.seek(Duration::from_secs_f64(position));
        Ok(())
    }

    async fn set_volume(&self, volume: f64) -> Result<()> {
        let volume = volume.clamp(0.0, 1.0);
        *self
            .inner
            .volume
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = volume;
        self.inner.emit(PlayerMessage::Volume(volume));
        Ok(())
    }

    async fn toggle_mute(&self) -> Result<()> {
        let muted = !self.inner.muted.fetch_xor(true, Ordering::AcqRel);
        self.inner.emit(PlayerMessage::Mute(muted));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        !self.inner.paused.load(Ordering::Acquire) && !self.inner.finished.load(Ordering::Acquire)
    }

    fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    fn get_progress(&self) -> f64 {
        if self.inner.track.is_zero() {
            return 0.0;
        }
        let progress = self.inner.clock().position().as_secs_f64() / self.inner.track.as_secs_f64();
        progress.min(1.0)
    }

    fn on_message(&self, handler: MessageHandler) {
        self.inner.handlers.register(handler);
    }
}
