use crate::shared::capture_metadata::CaptureMetadata;
use crate::shared::frame::Frame;

/// Produces RGB frames for scoring.
///
/// Implementations own the acquisition details (file decoding, camera
/// negotiation); the pipeline sees only `Frame`s in capture order.
pub trait FrameSource: Send {
    /// Prepares the source and returns its metadata.
    fn open(&mut self) -> Result<CaptureMetadata, Box<dyn std::error::Error>>;

    /// Iterator over frames in capture order. Bounded sources end at
    /// exhaustion; live sources yield until the caller stops pulling.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held by the source.
    fn close(&mut self);
}
