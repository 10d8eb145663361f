//! 0-100 facial score from face mesh geometry.
//!
//! Three bounded sub-scores sum to the total: left/right balance around the
//! nose tip (up to 50), face size relative to the frame (up to 25), and how
//! centered the face sits in the frame (up to 25).

use crate::scoring::domain::face_landmarks::{FaceLandmarks, SYMMETRY_PAIRS};

const SYMMETRY_WEIGHT: f64 = 50.0;
const SIZE_WEIGHT: f64 = 25.0;
const CENTER_WEIGHT: f64 = 25.0;

/// Pairs whose combined left+right distance falls below this are degenerate
/// and excluded from the symmetry average.
const DISTANCE_EPSILON: f64 = 1e-6;

/// Faces covering at most this share of frame area score zero on size.
const MIN_AREA_RATIO: f64 = 0.02;

/// Size score saturates once the face covers this much more of the frame.
const AREA_RATIO_SPAN: f64 = 0.20;

/// The three weighted sub-scores of a face. Each is non-negative and capped
/// at its weight; the sum (clamped, rounded) is the reported score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoreBreakdown {
    pub symmetry: f64,
    pub size: f64,
    pub center: f64,
}

impl ScoreBreakdown {
    /// Final score: sub-scores summed, clamped to [0, 100], one decimal.
    pub fn total(&self) -> f64 {
        round_to_tenth((self.symmetry + self.size + self.center).clamp(0.0, 100.0))
    }
}

/// Score one frame's detection output.
///
/// No face yields exactly 0.0; otherwise only the first face is scored, per
/// the detector contract.
pub fn score_frame(faces: &[FaceLandmarks], width: u32, height: u32) -> f64 {
    match faces.first() {
        Some(lm) => score_face(lm, width, height).total(),
        None => 0.0,
    }
}

pub fn score_face(lm: &FaceLandmarks, width: u32, height: u32) -> ScoreBreakdown {
    let (cx, cy) = lm.nose_pixel(width, height);
    ScoreBreakdown {
        symmetry: symmetry_score(lm, cx, width),
        size: size_score(lm, width, height),
        center: center_score(cx, cy, width, height),
    }
}

/// Left/right balance of mirrored feature pairs around the nose-tip x.
///
/// Imbalance per pair is `|left - right| / (left + right)` in [0,1]; the
/// mean is doubled before clamping so an average imbalance of 0.5 already
/// zeroes the sub-score. No measurable pair is neutral, not a penalty.
fn symmetry_score(lm: &FaceLandmarks, cx: f64, width: u32) -> f64 {
    let w = width as f64;
    let mut imbalances = Vec::with_capacity(SYMMETRY_PAIRS.len());

    for &(left, right) in &SYMMETRY_PAIRS {
        let lx = lm.point(left).0 * w;
        let rx = lm.point(right).0 * w;
        let left_dist = (cx - lx).abs();
        let right_dist = (rx - cx).abs();
        if left_dist + right_dist > DISTANCE_EPSILON {
            imbalances.push((left_dist - right_dist).abs() / (left_dist + right_dist));
        }
    }

    if imbalances.is_empty() {
        return SYMMETRY_WEIGHT;
    }

    let mean = imbalances.iter().sum::<f64>() / imbalances.len() as f64;
    SYMMETRY_WEIGHT * (1.0 - (mean * 2.0).min(1.0))
}

/// Linear ramp over the landmark bounding box's share of frame area:
/// zero at ≤2%, saturating at ≥22%.
fn size_score(lm: &FaceLandmarks, width: u32, height: u32) -> f64 {
    let frame_area = width as f64 * height as f64;
    if frame_area <= 0.0 {
        return 0.0;
    }
    let (min_x, min_y, max_x, max_y) = lm.bounding_box(width, height);
    let area_ratio = (max_x - min_x) * (max_y - min_y) / frame_area;
    SIZE_WEIGHT * ((area_ratio - MIN_AREA_RATIO) / AREA_RATIO_SPAN).clamp(0.0, 1.0)
}

/// Linear falloff with nose-tip distance from frame center, reaching zero
/// at the corner-to-center distance.
fn center_score(cx: f64, cy: f64, width: u32, height: u32) -> f64 {
    let w = width as f64;
    let h = height as f64;
    let max_dist = w.hypot(h) / 2.0;
    if max_dist <= 0.0 {
        return CENTER_WEIGHT;
    }
    let dist = (cx - w / 2.0).hypot(cy - h / 2.0);
    CENTER_WEIGHT * (1.0 - (dist / max_dist).min(1.0))
}

/// Round to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
