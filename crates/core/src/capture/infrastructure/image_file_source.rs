use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::capture_metadata::CaptureMetadata;
use crate::shared::frame::Frame;

/// Adapts a single image file to the [`FrameSource`] interface.
///
/// The image is decoded to RGB8 at open time and exposed as a one-frame
/// source with `fps = 0`, letting the pipeline treat images and live
/// capture uniformly.
pub struct ImageFileSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl ImageFileSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            frame: None,
        }
    }
}

impl FrameSource for ImageFileSource {
    fn open(&mut self) -> Result<CaptureMetadata, Box<dyn std::error::Error>> {
        let img = image::open(&self.path)?.to_rgb8();
        let (width, height) = img.dimensions();
        self.frame = Some(Frame::new(img.into_raw(), width, height, 3, 0));

        Ok(CaptureMetadata {
            width,
            height,
            fps: 0.0,
            frame_count: Some(1),
            source_path: Some(self.path.clone()),
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("ImageFileSource: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_image(dir: &Path, width: u32, height: u32) -> PathBuf {
        let path = dir.join("test.png");
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_returns_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let mut source = ImageFileSource::new(&path);
        let meta = source.open().unwrap();
        assert_eq!(meta.width, 100);
        assert_eq!(meta.height, 80);
        assert_eq!(meta.fps, 0.0);
        assert_eq!(meta.frame_count, Some(1));
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let mut source = ImageFileSource::new(Path::new("/nonexistent/test.png"));
        assert!(source.open().is_err());
    }

    #[test]
    fn test_frames_yields_single_rgb_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 100, 80);
        let mut source = ImageFileSource::new(&path);
        source.open().unwrap();

        let frames: Vec<_> = source.frames().collect();
        assert_eq!(frames.len(), 1);
        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.data()[0], 50);
        assert_eq!(frame.data()[1], 100);
        assert_eq!(frame.data()[2], 200);
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut source = ImageFileSource::new(Path::new("unused.png"));
        let result = source.frames().next().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), 10, 10);
        let mut source = ImageFileSource::new(&path);
        source.open().unwrap();
        source.close();
        source.close();
    }
}
