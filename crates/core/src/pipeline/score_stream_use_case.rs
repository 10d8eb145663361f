use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::pipeline::session_score::SessionScore;
use crate::scoring::domain::facial_score::score_frame;

/// Per-frame observer: `(frame_number, score)`, 1-based. Return `false` to
/// stop the session after the current frame.
pub type FrameObserver = Box<dyn Fn(usize, f64) -> bool + Send>;

/// Scores a stream of frames and aggregates them into a session average.
///
/// Frames are processed strictly sequentially: the detector is a black box
/// that may block on inference and is not assumed safe for concurrent calls.
/// Each frame's contribution is atomic (scored and appended, or not
/// started), so stopping between frames needs no rollback. Frames with no
/// detected face score 0.0 and stay in the average.
pub struct ScoreStreamUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
    frame_limit: Option<usize>,
    on_frame: Option<FrameObserver>,
}

impl ScoreStreamUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkDetector>,
        frame_limit: Option<usize>,
        on_frame: Option<FrameObserver>,
    ) -> Self {
        Self {
            source,
            detector,
            frame_limit,
            on_frame,
        }
    }

    /// Runs detect-then-score over the source until the frame limit is
    /// reached, the observer cancels, or the source is exhausted.
    pub fn execute(&mut self) -> Result<SessionScore, Box<dyn std::error::Error>> {
        let metadata = self.source.open()?;
        log::debug!(
            "scoring session opened: {}x{} at {:.1} fps",
            metadata.width,
            metadata.height,
            metadata.fps
        );

        let mut scores: Vec<f64> = Vec::new();
        let mut frames = self.source.frames();

        while let Some(next) = frames.next() {
            let frame = next?;
            let faces = self.detector.detect(&frame)?;
            let score = score_frame(&faces, frame.width(), frame.height());
            scores.push(score);

            if let Some(ref callback) = self.on_frame {
                if !callback(scores.len(), score) {
                    break;
                }
            }
            if let Some(limit) = self.frame_limit {
                if scores.len() >= limit {
                    break;
                }
            }
        }

        drop(frames);
        self.source.close();

        Ok(SessionScore::from_scores(&scores))
    }
}
