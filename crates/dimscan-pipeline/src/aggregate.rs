//! Multi-frame analysis: capture, measure, and average.
//!
//! [`analyze`] opens a [`FrameSource`], attempts a fixed number of
//! captures, runs [`analyze_frame`] on every delivered frame, and folds
//! the valid samples into one [`AnalysisResult`].
//!
//! Only the first and last valid frames are kept as artifacts so the
//! output size does not grow with the capture count.
//!
//! Failures inside the run (source unavailable, capture gaps, frames
//! with nothing to measure) never escape as errors; they are reported
//! through the result. Only an invalid configuration is rejected, and
//! that happens before the source is opened.

use crate::source::{FrameSource, SourceGuard};
use crate::types::{
    AnalysisConfig, AnalysisResult, Artifact, ConfigError, Frame, Measurement, Measurements,
    PipelineError,
};
use crate::{FrameMeasurement, analyze_frame};

/// Run a full analysis against `source`.
///
/// The source is opened once and released exactly once before this
/// function returns, whatever happens during the captures.
///
/// # Errors
///
/// Returns a [`ConfigError`] if `config` fails
/// [`AnalysisConfig::validate`]. The source is not touched in that case.
pub fn analyze<S: FrameSource>(
    source: &mut S,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, ConfigError> {
    analyze_with(source, config, |frame| analyze_frame(frame, config))
}

/// [`analyze`] with a pluggable single-frame step.
pub(crate) fn analyze_with<S, F>(
    source: &mut S,
    config: &AnalysisConfig,
    mut measure_frame: F,
) -> Result<AnalysisResult, ConfigError>
where
    S: FrameSource,
    F: FnMut(&Frame) -> Result<FrameMeasurement, PipelineError>,
{
    config.validate()?;

    let mut guard = match SourceGuard::open(source) {
        Ok(guard) => guard,
        Err(e) => {
            tracing::warn!(error = %e, "frame source unavailable");
            return Ok(AnalysisResult {
                success: false,
                message: e.to_string(),
                measurements: None,
                artifacts: Vec::new(),
                num_valid_captures: 0,
                num_frames_captured: 0,
                num_invalid_captures: 0,
            });
        }
    };

    let mut run = Run::default();
    for index in 0..config.num_captures {
        let Some(frame) = guard.read() else {
            tracing::warn!(index, "no frame delivered, skipping capture");
            continue;
        };
        run.captured += 1;

        match measure_frame(&frame) {
            Ok(fm) => run.accept(index, fm),
            Err(e) => {
                run.invalid += 1;
                tracing::debug!(index, error = %e, "frame rejected");
            }
        }
    }
    drop(guard);

    Ok(run.finish(config.num_captures))
}

/// Accumulated state of one run.
#[derive(Default)]
struct Run {
    samples: Vec<Measurement>,
    first: Option<Artifact>,
    last: Option<Artifact>,
    captured: usize,
    invalid: usize,
}

impl Run {
    fn accept(&mut self, index: usize, fm: FrameMeasurement) {
        self.samples.push(fm.measurement);
        let artifact = Artifact {
            capture_index: index,
            width: fm.annotation.image.width(),
            height: fm.annotation.image.height(),
            labels: fm.annotation.labels,
            image: fm.annotation.image,
        };
        if self.first.is_none() {
            self.first = Some(artifact);
        } else {
            self.last = Some(artifact);
        }
    }

    fn finish(self, attempts: usize) -> AnalysisResult {
        let valid = self.samples.len();
        if valid == 0 {
            tracing::info!(
                attempts,
                captured = self.captured,
                "no valid measurement obtained"
            );
            return AnalysisResult {
                success: false,
                message: format!(
                    "no valid measurement obtained ({} of {attempts} captures delivered a frame)",
                    self.captured
                ),
                measurements: None,
                artifacts: Vec::new(),
                num_valid_captures: 0,
                num_frames_captured: self.captured,
                num_invalid_captures: self.invalid,
            };
        }

        let width_cm = round2(mean(self.samples.iter().map(|m| m.width_cm)));
        let length_cm = round2(mean(self.samples.iter().map(|m| m.length_cm)));
        tracing::info!(valid, attempts, width_cm, length_cm, "analysis complete");

        AnalysisResult {
            success: true,
            message: format!("analysis completed with {valid} valid measurements"),
            measurements: Some(Measurements::from_mean(width_cm, length_cm)),
            artifacts: self.first.into_iter().chain(self.last).collect(),
            num_valid_captures: valid,
            num_frames_captured: self.captured,
            num_invalid_captures: self.invalid,
        }
    }
}

/// Arithmetic mean; callers guarantee a non-empty sequence.
#[allow(clippy::cast_precision_loss)]
fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    values.sum::<f64>() / n as f64
}

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
