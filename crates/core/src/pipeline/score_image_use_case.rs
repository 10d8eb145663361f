use crate::capture::domain::frame_source::FrameSource;
use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::scoring::domain::facial_score::{score_face, ScoreBreakdown};

/// Result of scoring one image.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoreReport {
    pub score: f64,
    /// Sub-score breakdown; `None` when no face was detected.
    pub breakdown: Option<ScoreBreakdown>,
}

impl ScoreReport {
    pub fn face_found(&self) -> bool {
        self.breakdown.is_some()
    }
}

/// Single-image scoring pipeline: open → decode → detect → score.
pub struct ScoreImageUseCase {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkDetector>,
}

impl ScoreImageUseCase {
    pub fn new(source: Box<dyn FrameSource>, detector: Box<dyn LandmarkDetector>) -> Self {
        Self { source, detector }
    }

    /// Scores the source's single frame. No face is a valid zero score;
    /// an unreadable source or a detector failure is an error.
    pub fn execute(&mut self) -> Result<ScoreReport, Box<dyn std::error::Error>> {
        let _metadata = self.source.open()?;
        let frame = self.source.frames().next().ok_or("No frames in source")??;
        self.source.close();

        let faces = self.detector.detect(&frame)?;
        let report = match faces.first() {
            Some(lm) => {
                let breakdown = score_face(lm, frame.width(), frame.height());
                ScoreReport {
                    score: breakdown.total(),
                    breakdown: Some(breakdown),
                }
            }
            None => ScoreReport {
                score: 0.0,
                breakdown: None,
            },
        };
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT, NOSE_TIP};
    use crate::shared::capture_metadata::CaptureMetadata;
    use crate::shared::frame::Frame;

    // --- Stubs ---

    struct StubSource {
        frame: Option<Frame>,
        fail_open: bool,
    }

    impl StubSource {
        fn new(frame: Frame) -> Self {
            Self {
                frame: Some(frame),
                fail_open: false,
            }
        }

        fn failing() -> Self {
            Self {
                frame: None,
                fail_open: true,
            }
        }

        fn empty() -> Self {
            Self {
                frame: None,
                fail_open: false,
            }
        }
    }

    impl FrameSource for StubSource {
        fn open(&mut self) -> Result<CaptureMetadata, Box<dyn std::error::Error>> {
            if self.fail_open {
                return Err("cannot decode".into());
            }
            Ok(CaptureMetadata {
                width: 100,
                height: 100,
                fps: 0.0,
                frame_count: Some(self.frame.is_some() as usize),
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frame.take().into_iter().map(Ok))
        }

        fn close(&mut self) {
            self.frame = None;
        }
    }

    struct StubDetector {
        faces: Vec<FaceLandmarks>,
        fail: bool,
    }

    impl LandmarkDetector for StubDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<FaceLandmarks>, Box<dyn std::error::Error>> {
            if self.fail {
                return Err("inference failed".into());
            }
            Ok(self.faces.clone())
        }
    }

    // --- Helpers ---

    fn make_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![128; (w * h * 3) as usize], w, h, 3, 0)
    }

    fn centered_face() -> FaceLandmarks {
        let mut points = vec![(0.5, 0.5); LANDMARK_COUNT];
        points[NOSE_TIP] = (0.5, 0.5);
        points[0] = (0.2, 0.2);
        points[1] = (0.8, 0.8);
        FaceLandmarks::new(points)
    }

    // --- Tests ---

    #[test]
    fn test_face_scores_with_breakdown() {
        let mut use_case = ScoreImageUseCase::new(
            Box::new(StubSource::new(make_frame(100, 100))),
            Box::new(StubDetector {
                faces: vec![centered_face()],
                fail: false,
            }),
        );
        let report = use_case.execute().unwrap();
        assert!(report.face_found());
        let breakdown = report.breakdown.unwrap();
        assert_eq!(report.score, breakdown.total());
        assert!((0.0..=100.0).contains(&report.score));
    }

    #[test]
    fn test_no_face_scores_zero() {
        let mut use_case = ScoreImageUseCase::new(
            Box::new(StubSource::new(make_frame(100, 100))),
            Box::new(StubDetector {
                faces: vec![],
                fail: false,
            }),
        );
        let report = use_case.execute().unwrap();
        assert_eq!(report.score, 0.0);
        assert!(!report.face_found());
    }

    #[test]
    fn test_unreadable_source_is_error() {
        let mut use_case = ScoreImageUseCase::new(
            Box::new(StubSource::failing()),
            Box::new(StubDetector {
                faces: vec![],
                fail: false,
            }),
        );
        assert!(use_case.execute().is_err());
    }

    #[test]
    fn test_source_without_frames_is_error() {
        let mut use_case = ScoreImageUseCase::new(
            Box::new(StubSource::empty()),
            Box::new(StubDetector {
                faces: vec![],
                fail: false,
            }),
        );
        assert!(use_case.execute().is_err());
    }

    #[test]
    fn test_detector_failure_propagates() {
        let mut use_case = ScoreImageUseCase::new(
            Box::new(StubSource::new(make_frame(100, 100))),
            Box::new(StubDetector {
                faces: vec![],
                fail: true,
            }),
        );
        assert!(use_case.execute().is_err());
    }
}
