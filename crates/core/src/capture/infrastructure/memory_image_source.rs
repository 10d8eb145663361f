use crate::capture::domain::frame_source::FrameSource;
use crate::shared::capture_metadata::CaptureMetadata;
use crate::shared::frame::Frame;

/// Adapts an encoded in-memory image (e.g. an uploaded capture) to the
/// [`FrameSource`] interface.
///
/// An empty or undecodable buffer is an open error, surfaced to the caller
/// as a client input problem rather than a process failure.
pub struct MemoryImageSource {
    bytes: Vec<u8>,
    frame: Option<Frame>,
}

impl MemoryImageSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, frame: None }
    }
}

impl FrameSource for MemoryImageSource {
    fn open(&mut self) -> Result<CaptureMetadata, Box<dyn std::error::Error>> {
        if self.bytes.is_empty() {
            return Err("empty image buffer".into());
        }

        let img = image::load_from_memory(&self.bytes)?.to_rgb8();
        let (width, height) = img.dimensions();
        self.frame = Some(Frame::new(img.into_raw(), width, height, 3, 0));

        Ok(CaptureMetadata {
            width,
            height,
            fps: 0.0,
            frame_count: Some(1),
            source_path: None,
        })
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        if self.frame.is_none() {
            return Box::new(std::iter::once(Err("MemoryImageSource: not opened".into())));
        }
        Box::new(self.frame.take().into_iter().map(Ok))
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
