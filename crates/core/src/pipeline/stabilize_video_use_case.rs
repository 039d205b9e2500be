use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::compositing::domain::frame_compositor::FrameCompositor;
use crate::motion::domain::motion_estimator::MotionEstimator;
use crate::shared::motion_estimate::{CorrectiveTransform, MotionEstimate};
use crate::shared::video_metadata::VideoMetadata;
use crate::trajectory::domain::correction_composer;
use crate::trajectory::domain::trajectory;
use crate::trajectory::domain::trajectory_smoother::{MovingAverageSmoother, TrajectorySmoother};
use crate::video::domain::lazy_video_sink::LazyVideoSink;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::pipeline_state::PipelineState;
use super::progress::ProgressTracker;
use super::stabilization_config::StabilizationConfig;
use super::stabilization_report::StabilizationReport;
use super::stabilize_error::StabilizeError;

/// Output of the estimation pass.
struct MotionPass {
    metadata: VideoMetadata,
    frames_read: usize,
    estimates: Vec<MotionEstimate>,
}

/// Smoothed path and the per-frame corrections derived from it.
struct CorrectionPlan {
    trajectory: Vec<MotionEstimate>,
    smoothed: Vec<MotionEstimate>,
    corrections: Vec<CorrectiveTransform>,
}

/// Two-pass video stabilization.
///
/// Pass one decodes the source, estimating motion between consecutive
/// frames. The cumulative trajectory is then smoothed and turned into
/// per-frame corrections. Pass two rewinds the source, re-renders each frame
/// under its correction and streams the result to the writer, which is only
/// opened once the first frame survives compositing.
///
/// This is a single-use struct: `execute` consumes the reader and writer.
pub struct StabilizeVideoUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    estimator: Box<dyn MotionEstimator>,
    compositor: Box<dyn FrameCompositor>,
    smoother: Box<dyn TrajectorySmoother>,
    config: StabilizationConfig,
    logger: Box<dyn PipelineLogger>,
    on_progress: Option<Box<dyn Fn(u8) + Send>>,
    cancelled: Arc<AtomicBool>,
    progress: ProgressTracker,
    state: PipelineState,
}

impl StabilizeVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        estimator: Box<dyn MotionEstimator>,
        compositor: Box<dyn FrameCompositor>,
        config: StabilizationConfig,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            estimator,
            compositor,
            smoother: Box::new(MovingAverageSmoother),
            config,
            logger: Box::new(NullPipelineLogger),
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            progress: ProgressTracker::new(),
            state: PipelineState::Idle,
        }
    }

    /// Registers a callback receiving the overall percentage whenever it
    /// advances.
    pub fn with_progress(mut self, on_progress: Box<dyn Fn(u8) + Send>) -> Self {
        self.on_progress = Some(on_progress);
        self
    }

    /// Uses `cancelled` as the cooperative cancellation flag, polled between
    /// frames.
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_smoother(mut self, smoother: Box<dyn TrajectorySmoother>) -> Self {
        self.smoother = smoother;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Stabilizes `input` into `output`.
    ///
    /// Panics raised by collaborators are caught and reported as
    /// [`StabilizeError::UnexpectedFault`]. A failed run leaves no output file.
    pub fn execute(
        &mut self,
        input: &Path,
        output: &Path,
    ) -> Result<StabilizationReport, StabilizeError> {
        let outcome = self.run(input, output);

        match &outcome {
            Ok(report) => {
                self.emit_progress(|p| p.finish());
                self.transition(PipelineState::Done);
                self.logger.info(&format!(
                    "Wrote {} frames ({} dropped) to {}",
                    report.frames_written,
                    report.frames_dropped,
                    report.output_path.display()
                ));
                self.logger.summary();
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                self.logger.info(&format!("Stabilization failed: {e}"));
            }
        }
        outcome
    }

    fn run(&mut self, input: &Path, output: &Path) -> Result<StabilizationReport, StabilizeError> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| StabilizeError::fault("pipeline already executed"))?;
        let writer = self
            .writer
            .take()
            .ok_or_else(|| StabilizeError::fault("pipeline already executed"))?;

        let result = guarded(|| {
            let pass = self.estimate_motion(reader.as_mut(), input)?;
            let plan = self.plan_corrections(&pass.estimates);
            self.render(reader.as_mut(), writer, output, &pass, plan)
        });
        reader.close();
        result
    }

    fn estimate_motion(
        &mut self,
        reader: &mut dyn VideoReader,
        input: &Path,
    ) -> Result<MotionPass, StabilizeError> {
        self.transition(PipelineState::ReadingFirstFrame);
        let metadata = reader
            .open(input)
            .map_err(|e| StabilizeError::SourceUnreadable(e.to_string()))?;
        let declared = metadata.total_frames;
        self.emit_progress(|p| p.first_pass(0, declared));

        let mut frames = reader.frames();
        let first = match frames.next() {
            Some(Ok(frame)) => frame,
            Some(Err(e)) => return Err(StabilizeError::SourceUnreadable(e.to_string())),
            None => {
                return Err(StabilizeError::SourceUnreadable(format!(
                    "no decodable frames in {}",
                    input.display()
                )))
            }
        };
        let mut prev_gray = first.to_grayscale();
        let mut frames_read = 1;
        let mut estimates = Vec::with_capacity(declared.saturating_sub(1));

        self.transition(PipelineState::EstimatingMotion);
        self.emit_progress(|p| p.first_pass(frames_read, declared));

        loop {
            self.check_cancelled()?;
            if declared > 0 && frames_read >= declared {
                break;
            }
            let frame = match frames.next() {
                Some(Ok(frame)) => frame,
                Some(Err(e)) => {
                    log::warn!("Decode error after {frames_read} frames, ending motion pass: {e}");
                    break;
                }
                None => break,
            };

            let gray = frame.to_grayscale();
            let started = Instant::now();
            let estimate = self.estimator.estimate(&prev_gray, &gray);
            self.logger.timing("estimate", elapsed_ms(started));

            estimates.push(estimate);
            prev_gray = gray;
            frames_read += 1;

            self.logger.progress(frames_read, declared);
            self.emit_progress(|p| p.first_pass(frames_read, declared));
        }

        if declared > 0 && frames_read < declared {
            log::warn!("Source declared {declared} frames but only {frames_read} decoded");
        }
        log::debug!("Motion pass read {frames_read} frames, {} estimates", estimates.len());

        Ok(MotionPass {
            metadata,
            frames_read,
            estimates,
        })
    }

    fn plan_corrections(&mut self, estimates: &[MotionEstimate]) -> CorrectionPlan {
        self.transition(PipelineState::Smoothing);
        let radius = self.config.smoothing_radius();
        self.logger.info(&format!(
            "Smoothing {} transforms with {} strength (radius {radius})",
            estimates.len(),
            self.config.strength
        ));

        let trajectory = trajectory::build(estimates);
        let smoothed = self.smoother.smooth(&trajectory, radius);
        let corrections = correction_composer::compose(estimates, &trajectory, &smoothed);
        CorrectionPlan {
            trajectory,
            smoothed,
            corrections,
        }
    }

    fn render(
        &mut self,
        reader: &mut dyn VideoReader,
        writer: Box<dyn VideoWriter>,
        output: &Path,
        pass: &MotionPass,
        plan: CorrectionPlan,
    ) -> Result<StabilizationReport, StabilizeError> {
        self.transition(PipelineState::Composing);
        reader.rewind().map_err(StabilizeError::fault)?;

        let mut sink = LazyVideoSink::new(writer, output, &pass.metadata);
        let total = plan.corrections.len();
        let mut dropped = 0;

        let rendered =
            guarded(|| self.render_frames(reader, &mut sink, &plan.corrections, &mut dropped));
        if let Err(e) = rendered {
            if let Err(discard_err) = sink.discard() {
                log::warn!("Could not remove partial output: {discard_err}");
            }
            return Err(e);
        }

        let frames_written = sink.frames_written();
        let output_path = sink
            .finish()
            .map_err(StabilizeError::fault)?
            .ok_or(StabilizeError::NoOutputProduced)?;

        if frames_written + dropped < total {
            log::warn!(
                "Second pass ended early: {} of {total} frames composited",
                frames_written + dropped
            );
        }

        Ok(StabilizationReport {
            output_path,
            frames_read: pass.frames_read,
            frames_written,
            frames_dropped: dropped,
            trajectory: plan.trajectory,
            smoothed: plan.smoothed,
        })
    }

    fn render_frames(
        &mut self,
        reader: &mut dyn VideoReader,
        sink: &mut LazyVideoSink,
        corrections: &[CorrectiveTransform],
        dropped: &mut usize,
    ) -> Result<(), StabilizeError> {
        let total = corrections.len();
        // The last decoded frame has no correction and is never written
        for (i, frame) in reader.frames().take(total).enumerate() {
            self.check_cancelled()?;
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Decode error at frame {i} during rendering: {e}");
                    break;
                }
            };

            let correction = &corrections[i];
            self.logger.metric("correction_px", correction.translation_norm());

            let started = Instant::now();
            let composited = self.compositor.composite(frame, correction);
            self.logger.timing("composite", elapsed_ms(started));

            match composited {
                Some(out) => {
                    let started = Instant::now();
                    sink.write(&out).map_err(StabilizeError::fault)?;
                    self.logger.timing("write", elapsed_ms(started));
                    if sink.frames_written() == 1 {
                        self.transition(PipelineState::WritingOutput);
                    }
                }
                None => {
                    log::debug!("Frame {i} could not be composited, dropping it");
                    *dropped += 1;
                }
            }

            self.logger.progress(i + 1, total);
            self.emit_progress(|p| p.second_pass(i + 1, total));
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), StabilizeError> {
        if self.cancelled.load(Ordering::Relaxed) {
            Err(StabilizeError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn emit_progress(&mut self, step: impl FnOnce(&mut ProgressTracker) -> Option<u8>) {
        if let Some(pct) = step(&mut self.progress) {
            if let Some(ref callback) = self.on_progress {
                callback(pct);
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        log::debug!("Pipeline state: {} -> {}", self.state, next);
        self.state = next;
        self.logger.info(&format!("State: {next}"));
    }
}

/// Runs `step`, turning a panic into [`StabilizeError::UnexpectedFault`].
fn guarded<T>(step: impl FnOnce() -> Result<T, StabilizeError>) -> Result<T, StabilizeError> {
    panic::catch_unwind(AssertUnwindSafe(step))
        .unwrap_or_else(|payload| Err(StabilizeError::UnexpectedFault(panic_message(&*payload))))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
