//! Coordination-thread side of preview rendering.
//!
//! [`TimelineRenderer::request_frame`] answers from the cache when it can
//! and otherwise hands a job to the [`RenderPool`]. Completed work is
//! collected by [`TimelineRenderer::pump`], which caches every successful
//! frame but only shows one if it is still what the user is looking at.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use serde::Serialize;

use reelsync_common::config::RenderConfig;
use reelsync_common::error::ReelsyncResult;
use reelsync_common::observer::{ObserverId, ObserverRegistry, ObserverResult};
use reelsync_timeline_model::TimelineSnapshot;

use crate::cache::{quantize, tick_time, CacheStats, FrameCache, FrameKey};
use crate::compositor::{Compositor, TopMostCompositor};
use crate::decoder::FrameDecoder;
use crate::frame::Frame;
use crate::pool::{LayerError, RenderJob, RenderOutcome, RenderPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request#{}", self.0)
    }
}

/// A displayed frame had one or more layers replaced by error pictures.
#[derive(Debug, Clone, Serialize)]
pub struct RenderErrorEvent {
    pub time: f64,
    pub errors: Vec<LayerError>,
}

pub type FrameReadyCallback = Box<dyn FnMut(&Arc<Frame>) -> ObserverResult>;
pub type RenderErrorCallback = Box<dyn FnMut(&RenderErrorEvent) -> ObserverResult>;

/// Display-side subscriber.
#[derive(Default)]
pub struct FrameObserver {
    frame_ready: Option<FrameReadyCallback>,
    render_error: Option<RenderErrorCallback>,
}

impl FrameObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_frame_ready(
        mut self,
        f: impl FnMut(&Arc<Frame>) -> ObserverResult + 'static,
    ) -> Self {
        self.frame_ready = Some(Box::new(f));
        self
    }

    pub fn on_render_error(
        mut self,
        f: impl FnMut(&RenderErrorEvent) -> ObserverResult + 'static,
    ) -> Self {
        self.render_error = Some(Box::new(f));
        self
    }
}

/// What one call to `pump` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpReport {
    pub completed: usize,
    pub delivered: usize,
    pub stale: usize,
    pub errors: usize,
}

impl PumpReport {
    pub fn absorb(&mut self, other: PumpReport) {
        self.completed += other.completed;
        self.delivered += other.delivered;
        self.stale += other.stale;
        self.errors += other.errors;
    }
}

/// Lifetime counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RenderStats {
    pub requests: u64,
    pub cache_hits: u64,
    pub submitted: u64,
    pub deduplicated: u64,
    pub delivered: u64,
    pub stale: u64,
    pub render_errors: u64,
}

pub struct TimelineRenderer {
    config: RenderConfig,
    snapshot: TimelineSnapshot,
    cache: FrameCache,
    pool: RenderPool,
    completions: Receiver<RenderOutcome>,
    in_flight: HashSet<FrameKey>,
    latest: Option<FrameKey>,
    next_request: u64,
    observers: ObserverRegistry<FrameObserver>,
    displayed: Option<Arc<Frame>>,
    stats: RenderStats,
}

impl TimelineRenderer {
    pub fn new(config: RenderConfig, decoder: Arc<dyn FrameDecoder>) -> ReelsyncResult<Self> {
        Self::with_compositor(config, decoder, Arc::new(TopMostCompositor))
    }

    pub fn with_compositor(
        config: RenderConfig,
        decoder: Arc<dyn FrameDecoder>,
        compositor: Arc<dyn Compositor>,
    ) -> ReelsyncResult<Self> {
        let (tx, completions) = unbounded();
        let pool = RenderPool::start(config.workers, decoder, compositor, tx)?;
        Ok(Self {
            cache: FrameCache::new(config.cache_capacity),
            config,
            snapshot: TimelineSnapshot::default(),
            pool,
            completions,
            in_flight: HashSet::new(),
            latest: None,
            next_request: 1,
            observers: ObserverRegistry::new(),
            displayed: None,
            stats: RenderStats::default(),
        })
    }

    /// Replace the clip list renders are taken from. Cached frames of older
    /// versions become unreachable.
    pub fn set_snapshot(&mut self, snapshot: TimelineSnapshot) {
        tracing::debug!(
            from = self.snapshot.content_version,
            to = snapshot.content_version,
            clips = snapshot.clips.len(),
            "Render snapshot updated"
        );
        self.snapshot = snapshot;
    }

    pub fn content_version(&self) -> u64 {
        self.snapshot.content_version
    }

    pub fn key_for(&self, t: f64) -> FrameKey {
        FrameKey::new(
            quantize(t, self.config.quantum_secs),
            self.snapshot.content_version,
        )
    }

    /// Ask for the frame at `t`. A cached frame is delivered before this
    /// returns; otherwise the frame arrives through a later `pump`.
    pub fn request_frame(&mut self, t: f64) -> RequestId {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.stats.requests += 1;

        let key = self.key_for(t);
        self.latest = Some(key);

        if let Some(frame) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            self.deliver(&frame);
            return id;
        }

        if self.in_flight.contains(&key) {
            self.stats.deduplicated += 1;
            tracing::trace!(%id, tick = key.tick, "Frame already in flight");
            return id;
        }

        let time = tick_time(key.tick, self.config.quantum_secs);
        let job = RenderJob {
            key,
            time,
            clips: self.snapshot.resolve_active_clips(time),
            width: self.config.width,
            height: self.config.height,
        };
        match self.pool.submit(job) {
            Ok(()) => {
                self.in_flight.insert(key);
                self.stats.submitted += 1;
                tracing::trace!(%id, time, version = key.content_version, "Frame submitted");
            }
            Err(err) => {
                tracing::warn!(%id, time, error = %err, "Could not submit render job");
            }
        }
        id
    }

    /// Drain finished renders without blocking.
    pub fn pump(&mut self, current_time: f64) -> PumpReport {
        let mut report = PumpReport::default();
        while let Ok(outcome) = self.completions.try_recv() {
            report.absorb(self.complete(outcome, current_time));
        }
        report
    }

    /// Wait up to `timeout` for every in-flight render, handling each as it
    /// arrives.
    pub fn pump_blocking(&mut self, current_time: f64, timeout: Duration) -> PumpReport {
        let deadline = Instant::now() + timeout;
        let mut report = self.pump(current_time);

        while !self.in_flight.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.completions.recv_timeout(remaining) {
                Ok(outcome) => report.absorb(self.complete(outcome, current_time)),
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(
                        pending = self.in_flight.len(),
                        "Timed out waiting for renders"
                    );
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        report
    }

    pub fn register_observer(
        &mut self,
        name: impl Into<String>,
        observer: FrameObserver,
    ) -> ObserverId {
        self.observers.register(name, observer)
    }

    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        self.observers.unregister(id)
    }

    /// The frame currently on display.
    pub fn displayed_frame(&self) -> Option<&Arc<Frame>> {
        self.displayed.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_cached(&self, t: f64) -> bool {
        self.cache.contains(&self.key_for(t))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cached_frames(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn complete(&mut self, outcome: RenderOutcome, current_time: f64) -> PumpReport {
        let mut report = PumpReport {
            completed: 1,
            ..PumpReport::default()
        };
        self.in_flight.remove(&outcome.key);

        // Frames with substituted layers are retried on the next request.
        if !outcome.is_error() {
            self.cache.put(outcome.key, Arc::clone(&outcome.frame));
        }

        let is_latest = self.latest == Some(outcome.key);
        let near_playhead = (outcome.frame.time - current_time).abs()
            <= self.config.quantum_secs + f64::EPSILON * 16.0;
        if !(is_latest && near_playhead) {
            report.stale = 1;
            self.stats.stale += 1;
            tracing::trace!(
                time = outcome.frame.time,
                current_time,
                is_latest,
                "Dropping stale render result"
            );
            return report;
        }

        if outcome.is_error() {
            report.errors = 1;
            self.stats.render_errors += 1;
            let event = RenderErrorEvent {
                time: outcome.frame.time,
                errors: outcome.errors.clone(),
            };
            self.observers
                .notify("render_error", |o| o.render_error.as_mut().map(|f| f(&event)));
        }

        self.deliver(&outcome.frame);
        report.delivered = 1;
        report
    }

    fn deliver(&mut self, frame: &Arc<Frame>) {
        self.stats.delivered += 1;
        self.displayed = Some(Arc::clone(frame));
        self.observers
            .notify("frame_ready", |o| o.frame_ready.as_mut().map(|f| f(frame)));
    }
}

impl fmt::Debug for TimelineRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineRenderer")
            .field("content_version", &self.snapshot.content_version)
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .field("workers", &self.pool.workers())
            .field("stats", &self.stats)
            .finish()
    }
}
