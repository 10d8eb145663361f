/// Face mesh landmark detector using ONNX Runtime via `ort`.
///
/// Runs a 468-point face mesh model over the full frame and returns
/// normalized landmark coordinates for at most one face, gated by the
/// model's face-presence score.
use std::path::Path;

use crate::detection::domain::landmark_detector::LandmarkDetector;
use crate::scoring::domain::face_landmarks::{FaceLandmarks, LANDMARK_COUNT};
use crate::shared::frame::Frame;

/// Face mesh model input resolution.
const INPUT_SIZE: u32 = 192;

/// Default face-presence confidence threshold.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Values per landmark in the coordinate tensor (x, y, z).
const COORDS_PER_LANDMARK: usize = 3;

/// Face mesh detector backed by an ONNX Runtime session.
///
/// The session is the expensive resource: construct once and reuse across
/// frames; callers needing concurrency hold one detector each.
pub struct OnnxFaceMeshDetector {
    session: ort::session::Session,
    confidence: f64,
}

impl OnnxFaceMeshDetector {
    /// Load a face mesh ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;
        Ok(Self {
            session,
            confidence,
        })
    }
}

impl LandmarkDetector for OnnxFaceMeshDetector {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<FaceLandmarks>, Box<dyn std::error::Error>> {
        // 1. Preprocess: resize to 192x192, normalize to [0,1], NCHW
        let input_tensor = preprocess(frame, INPUT_SIZE);

        // 2. Inference
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Face mesh outputs two tensors:
        // - coordinates: [1, 1404] (468 × xyz in input-resolution pixels)
        // - score: [1, 1] (face presence)
        if outputs.len() < 2 {
            return Err(format!(
                "face mesh model expected 2 outputs, got {}",
                outputs.len()
            )
            .into());
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let score = outputs[1].try_extract_array::<f32>()?;
        let coord_data = coords.as_slice().ok_or("Cannot get coordinate slice")?;
        let score_data = score.as_slice().ok_or("Cannot get score slice")?;

        let raw_score = *score_data.first().ok_or("Empty score output")?;
        if (presence_probability(raw_score) as f64) < self.confidence {
            return Ok(Vec::new());
        }

        if coord_data.len() < LANDMARK_COUNT * COORDS_PER_LANDMARK {
            return Err(format!(
                "face mesh model returned {} coordinates, expected {}",
                coord_data.len(),
                LANDMARK_COUNT * COORDS_PER_LANDMARK
            )
            .into());
        }

        Ok(vec![decode_landmarks(coord_data)])
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize frame to `size × size` and normalize to [0,1] NCHW float32.
fn preprocess(frame: &Frame, size: u32) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;
    let s = size as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, s, s));

    for y in 0..s {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / s as f64) as usize).min(src_h - 1);
        for x in 0..s {
            let src_x = (((x as f64 + 0.5) * src_w as f64 / s as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    tensor
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

/// Convert the raw coordinate tensor to normalized landmark points.
///
/// The model emits x/y/z in input-resolution pixels; z is depth relative to
/// the face plane and is discarded; scoring is purely 2D.
fn decode_landmarks(coord_data: &[f32]) -> FaceLandmarks {
    let scale = INPUT_SIZE as f64;
    let points = (0..LANDMARK_COUNT)
        .map(|i| {
            let x = coord_data[i * COORDS_PER_LANDMARK] as f64 / scale;
            let y = coord_data[i * COORDS_PER_LANDMARK + 1] as f64 / scale;
            (x, y)
        })
        .collect();
    FaceLandmarks::new(points)
}

/// Face-presence probability from the raw model score.
///
/// Exported face mesh variants disagree on whether the score head includes
/// the sigmoid; values outside [0,1] are treated as logits.
fn presence_probability(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        sigmoid(raw)
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preprocess_shape() {
        let data = vec![128u8; 200 * 100 * 3];
        let frame = Frame::new(data, 200, 100, 3, 0);
        let tensor = preprocess(&frame, 192);
        assert_eq!(tensor.shape(), &[1, 3, 192, 192]);
    }

    #[test]
    fn test_preprocess_normalized() {
        let data = vec![255u8; 50 * 50 * 3];
        let frame = Frame::new(data, 50, 50, 3, 0);
        let tensor = preprocess(&frame, 192);
        // All source pixels are 255, so resized pixels should be ~1.0
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_decode_landmarks_normalizes_by_input_size() {
        let mut coords = vec![0.0f32; LANDMARK_COUNT * COORDS_PER_LANDMARK];
        // Landmark 4 at input-pixel (96, 48), depth ignored
        coords[4 * COORDS_PER_LANDMARK] = 96.0;
        coords[4 * COORDS_PER_LANDMARK + 1] = 48.0;
        coords[4 * COORDS_PER_LANDMARK + 2] = -7.5;

        let lm = decode_landmarks(&coords);
        let (x, y) = lm.point(4);
        assert!((x - 0.5).abs() < 1e-9);
        assert!((y - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_decode_landmarks_count() {
        let coords = vec![1.0f32; LANDMARK_COUNT * COORDS_PER_LANDMARK];
        let lm = decode_landmarks(&coords);
        assert_eq!(lm.points().len(), LANDMARK_COUNT);
    }

    #[test]
    fn test_presence_probability_passthrough_in_unit_range() {
        assert_eq!(presence_probability(0.7), 0.7);
        assert_eq!(presence_probability(0.0), 0.0);
        assert_eq!(presence_probability(1.0), 1.0);
    }

    #[test]
    fn test_presence_probability_squashes_logits() {
        assert!((presence_probability(10.0) - 1.0).abs() < 0.001);
        assert!(presence_probability(-10.0) < 0.001);
    }

    #[test]
    fn test_sigmoid_zero() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
    }
}
