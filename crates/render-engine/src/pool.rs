//! Render worker pool.
//!
//! Workers pull jobs from a shared channel, decode and composite, and push
//! the outcome onto the completion queue drained by the coordination
//! thread. A job carries owned clip copies; workers never see the timeline.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Serialize;

use reelsync_common::error::{ReelsyncError, ReelsyncResult};
use reelsync_timeline_model::{ClipId, TimelineClip};

use crate::cache::FrameKey;
use crate::compositor::{Compositor, Layer};
use crate::decoder::{DecodeError, FrameDecoder};
use crate::frame::{error_image, Frame, FrameKind};

/// Source times are kept this far inside the end of the media.
pub const SOURCE_TIME_EPSILON: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub key: FrameKey,
    /// Timeline time to render (the quantized time of `key`).
    pub time: f64,
    /// Active clips at `time`, lowest track first.
    pub clips: Vec<TimelineClip>,
    pub width: u32,
    pub height: u32,
}

/// A layer that failed to decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerError {
    pub clip_id: ClipId,
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub key: FrameKey,
    pub frame: Arc<Frame>,
    pub errors: Vec<LayerError>,
}

impl RenderOutcome {
    pub fn is_error(&self) -> bool {
        !self.errors.is_empty()
    }
}

pub struct RenderPool {
    job_tx: Option<Sender<RenderJob>>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl RenderPool {
    /// Spawn `workers` threads (at least one). Outcomes go to `completions`.
    pub fn start(
        workers: usize,
        decoder: Arc<dyn FrameDecoder>,
        compositor: Arc<dyn Compositor>,
        completions: Sender<RenderOutcome>,
    ) -> ReelsyncResult<Self> {
        let (job_tx, job_rx) = unbounded::<RenderJob>();
        let workers = workers.max(1);
        let mut handles = Vec::with_capacity(workers);

        for index in 0..workers {
            let job_rx: Receiver<RenderJob> = job_rx.clone();
            let decoder = Arc::clone(&decoder);
            let compositor = Arc::clone(&compositor);
            let completions = completions.clone();

            let handle = thread::Builder::new()
                .name(format!("reelsync-render-{index}"))
                .spawn(move || {
                    tracing::trace!(worker = index, "Render worker started");
                    for job in job_rx.iter() {
                        let outcome = render_job(&job, decoder.as_ref(), compositor.as_ref());
                        if completions.send(outcome).is_err() {
                            break;
                        }
                    }
                    tracing::trace!(worker = index, "Render worker stopped");
                })?;
            handles.push(handle);
        }

        tracing::debug!(workers, compositor = compositor.name(), "Render pool started");
        Ok(Self {
            job_tx: Some(job_tx),
            handles,
        })
    }

    pub fn submit(&self, job: RenderJob) -> ReelsyncResult<()> {
        let tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| ReelsyncError::render("Render pool is shut down"))?;
        tx.send(job)
            .map_err(|_| ReelsyncError::render("Render workers have exited"))
    }

    pub fn workers(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for RenderPool {
    fn drop(&mut self) {
        // Closing the job channel ends each worker's loop.
        self.job_tx.take();
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Render worker panicked during shutdown");
            }
        }
    }
}

/// Map a timeline time to the source time shown by `clip`, kept inside
/// the clip's source span and the media's decodable range.
pub fn source_time_for(clip: &TimelineClip, t: f64) -> f64 {
    let mut end = clip.out_point;
    if clip.media.duration > 0.0 {
        end = end.min(clip.media.duration);
    }
    let limit = (end - SOURCE_TIME_EPSILON).max(clip.in_point);
    clip.source_time_at(t).min(limit).max(0.0)
}

/// Decode every visual layer of `job` and composite them.
pub fn render_job(
    job: &RenderJob,
    decoder: &dyn FrameDecoder,
    compositor: &dyn Compositor,
) -> RenderOutcome {
    let visual: Vec<&TimelineClip> = job
        .clips
        .iter()
        .filter(|clip| clip.media.kind.is_visual())
        .collect();

    if visual.is_empty() {
        return RenderOutcome {
            key: job.key,
            frame: Arc::new(Frame::black(job.time, job.width, job.height)),
            errors: Vec::new(),
        };
    }

    let mut layers = Vec::with_capacity(visual.len());
    let mut errors = Vec::new();
    for clip in visual {
        let source_time = source_time_for(clip, job.time);
        let decoded = catch_unwind(AssertUnwindSafe(|| decoder.decode(&clip.media, source_time)))
            .unwrap_or_else(|_| {
                Err(DecodeError::Panicked {
                    path: clip.media.path.clone(),
                    reason: "decoder panicked".to_string(),
                })
            });

        let image = match decoded {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(
                    clip = %clip.id,
                    path = %clip.media.path.display(),
                    time = job.time,
                    source_time,
                    error = %err,
                    "Layer decode failed"
                );
                errors.push(LayerError {
                    clip_id: clip.id,
                    path: clip.media.path.clone(),
                    message: err.to_string(),
                });
                Arc::new(error_image(job.width, job.height))
            }
        };
        layers.push(Layer {
            clip_id: clip.id,
            track_index: clip.track_index,
            image,
        });
    }

    let composited = catch_unwind(AssertUnwindSafe(|| {
        compositor.composite(&layers, job.width, job.height)
    }));
    let image = match composited {
        Ok(image) => image,
        Err(_) => {
            tracing::warn!(
                compositor = compositor.name(),
                time = job.time,
                layers = layers.len(),
                "Compositor panicked"
            );
            errors.extend(visual_errors(job, "compositor panicked"));
            error_image(job.width, job.height)
        }
    };
    let kind = if errors.is_empty() {
        FrameKind::Composited
    } else {
        FrameKind::Error
    };
    RenderOutcome {
        key: job.key,
        frame: Arc::new(Frame::new(job.time, kind, image)),
        errors,
    }
}

/// One error per visual layer of `job`, for failures that hit the whole frame.
fn visual_errors(job: &RenderJob, message: &str) -> Vec<LayerError> {
    job.clips
        .iter()
        .filter(|clip| clip.media.kind.is_visual())
        .map(|clip| LayerError {
            clip_id: clip.id,
            path: clip.media.path.clone(),
            message: message.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use reelsync_timeline_model::MediaSource;

    use crate::compositor::TopMostCompositor;

    struct FailingDecoder;

    impl FrameDecoder for FailingDecoder {
        fn decode(&self, source: &MediaSource, _t: f64) -> Result<Arc<RgbaImage>, DecodeError> {
            if source.path.to_string_lossy().contains("panic") {
                panic!("decoder bug");
            }
            Err(DecodeError::Unavailable {
                path: source.path.clone(),
                reason: "gone".to_string(),
            })
        }
    }

    struct GreenDecoder;

    struct PanickingCompositor;

    impl Compositor for PanickingCompositor {
        fn composite(&self, _layers: &[Layer], _width: u32, _height: u32) -> RgbaImage {
            panic!("compositor bug");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    impl FrameDecoder for GreenDecoder {
        fn decode(&self, _source: &MediaSource, _t: f64) -> Result<Arc<RgbaImage>, DecodeError> {
            Ok(Arc::new(RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]))))
        }
    }

    fn clip(path: &str, start: f64, len: f64) -> TimelineClip {
        let media = Arc::new(MediaSource::video(path, len, 30.0, 4, 4));
        TimelineClip::new(ClipId(1), media, 0, start, len)
    }

    fn job(clips: Vec<TimelineClip>) -> RenderJob {
        RenderJob {
            key: FrameKey::new(10, 1),
            time: 1.0,
            clips,
            width: 8,
            height: 8,
        }
    }

    #[test]
    fn test_source_time_clamped_inside_media() {
        let c = clip("/m/a.mp4", 0.0, 10.0);
        assert!((source_time_for(&c, 4.0) - 4.0).abs() < 1e-12);
        assert!((source_time_for(&c, 10.0) - (10.0 - SOURCE_TIME_EPSILON)).abs() < 1e-12);
        assert_eq!(source_time_for(&c, -3.0), 0.0);
    }

    #[test]
    fn test_audio_only_renders_black() {
        let media = Arc::new(MediaSource::audio("/m/vo.wav", 5.0));
        let audio = TimelineClip::new(ClipId(1), media, 0, 0.0, 5.0);
        let outcome = render_job(&job(vec![audio]), &FailingDecoder, &TopMostCompositor);
        assert_eq!(outcome.frame.kind, FrameKind::Black);
        assert!(!outcome.is_error());
    }

    #[test]
    fn test_decode_failure_becomes_error_frame() {
        let job = job(vec![clip("/m/a.mp4", 0.0, 5.0)]);
        let outcome = render_job(&job, &FailingDecoder, &TopMostCompositor);
        assert_eq!(outcome.frame.kind, FrameKind::Error);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].path, PathBuf::from("/m/a.mp4"));
    }

    #[test]
    fn test_decoder_panic_is_contained() {
        let job = job(vec![clip("/m/panic.mp4", 0.0, 5.0)]);
        let outcome = render_job(&job, &FailingDecoder, &TopMostCompositor);
        assert_eq!(outcome.frame.kind, FrameKind::Error);
        assert!(outcome.errors[0].message.contains("panicked"));
    }

    #[test]
    fn test_compositor_panic_is_contained() {
        let job = job(vec![clip("/m/a.mp4", 0.0, 5.0)]);
        let outcome = render_job(&job, &GreenDecoder, &PanickingCompositor);
        assert_eq!(outcome.key, FrameKey::new(10, 1));
        assert_eq!(outcome.frame.kind, FrameKind::Error);
        assert_eq!(outcome.frame.image.dimensions(), (8, 8));
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("compositor"));
    }

    #[test]
    fn test_worker_survives_compositor_panic() {
        let (tx, rx) = unbounded();
        let pool =
            RenderPool::start(1, Arc::new(GreenDecoder), Arc::new(PanickingCompositor), tx)
                .unwrap();

        for _ in 0..2 {
            pool.submit(job(vec![clip("/m/a.mp4", 0.0, 5.0)])).unwrap();
            let outcome = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
            assert_eq!(outcome.frame.kind, FrameKind::Error);
        }
    }

    #[test]
    fn test_pool_round_trip() {
        let (tx, rx) = unbounded();
        let pool =
            RenderPool::start(2, Arc::new(GreenDecoder), Arc::new(TopMostCompositor), tx).unwrap();
        assert_eq!(pool.workers(), 2);

        pool.submit(job(vec![clip("/m/a.mp4", 0.0, 5.0)])).unwrap();
        let outcome = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(outcome.key, FrameKey::new(10, 1));
        assert_eq!(outcome.frame.kind, FrameKind::Composited);
        assert_eq!(*outcome.frame.image.get_pixel(4, 4), Rgba([0, 255, 0, 255]));
        drop(pool);
    }
}
