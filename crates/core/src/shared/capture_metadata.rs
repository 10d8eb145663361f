use std::path::PathBuf;

/// Describes a frame source at open time.
///
/// Bounded sources (image files) know their frame count up front; live
/// sources (cameras) report `frame_count: None` and run until stopped.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub frame_count: Option<usize>,
    pub source_path: Option<PathBuf>,
}
