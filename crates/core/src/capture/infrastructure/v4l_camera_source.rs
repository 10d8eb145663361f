use std::io;
use std::path::PathBuf;

use thiserror::Error;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, FourCC};

use crate::capture::domain::frame_source::FrameSource;
use crate::shared::capture_metadata::CaptureMetadata;
use crate::shared::frame::Frame;

/// Number of memory-mapped capture buffers.
const BUFFER_COUNT: u32 = 4;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("failed to open camera {index}: {source}")]
    Open {
        index: usize,
        #[source]
        source: io::Error,
    },
    #[error("camera format negotiation failed: {0}")]
    Negotiate(#[source] io::Error),
    #[error("unsupported camera pixel format {0}")]
    UnsupportedFormat(String),
}

/// Live webcam capture through Video4Linux.
///
/// Negotiates raw YUYV (converted to RGB in-process) and falls back to MJPG
/// (decoded per frame). The frame iterator never ends on its own; the caller
/// stops pulling via a frame limit or cancellation.
pub struct V4lCameraSource {
    index: usize,
    opened: Option<Opened>,
}

struct Opened {
    device: Device,
    width: u32,
    height: u32,
    fourcc: FourCC,
}

impl V4lCameraSource {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            opened: None,
        }
    }
}

impl FrameSource for V4lCameraSource {
    fn open(&mut self) -> Result<CaptureMetadata, Box<dyn std::error::Error>> {
        let device = Device::new(self.index).map_err(|e| CameraError::Open {
            index: self.index,
            source: e,
        })?;

        // Prefer raw YUYV; cameras that can't do it usually offer MJPG.
        let mut format = device.format().map_err(CameraError::Negotiate)?;
        format.fourcc = FourCC::new(b"YUYV");
        let format = device.set_format(&format).map_err(CameraError::Negotiate)?;
        if format.fourcc != FourCC::new(b"YUYV") && format.fourcc != FourCC::new(b"MJPG") {
            return Err(CameraError::UnsupportedFormat(format.fourcc.to_string()).into());
        }
        log::debug!(
            "camera {} negotiated {} at {}x{}",
            self.index,
            format.fourcc,
            format.width,
            format.height
        );

        let fps = device
            .params()
            .ok()
            .map(|p| {
                if p.interval.numerator > 0 {
                    p.interval.denominator as f64 / p.interval.numerator as f64
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0);

        let metadata = CaptureMetadata {
            width: format.width,
            height: format.height,
            fps,
            frame_count: None,
            source_path: Some(PathBuf::from(format!("/dev/video{}", self.index))),
        };

        self.opened = Some(Opened {
            device,
            width: format.width,
            height: format.height,
            fourcc: format.fourcc,
        });
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(opened) = self.opened.as_ref() else {
            return Box::new(std::iter::once(Err("V4lCameraSource: not opened".into())));
        };
        let stream = match Stream::with_buffers(&opened.device, Type::VideoCapture, BUFFER_COUNT) {
            Ok(stream) => stream,
            Err(e) => return Box::new(std::iter::once(Err(e.into()))),
        };
        Box::new(CameraFrames {
            stream,
            width: opened.width,
            height: opened.height,
            fourcc: opened.fourcc,
            index: 0,
        })
    }

    fn close(&mut self) {
        self.opened = None;
    }
}

/// Unbounded iterator over captured camera frames.
struct CameraFrames<'a> {
    stream: Stream<'a>,
    width: u32,
    height: u32,
    fourcc: FourCC,
    index: usize,
}

impl Iterator for CameraFrames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (buf, meta) = match CaptureStream::next(&mut self.stream) {
            Ok(captured) => captured,
            Err(e) => return Some(Err(e.into())),
        };
        let used = (meta.bytesused as usize).min(buf.len());
        let rgb = match decode_frame(&buf[..used], self.width, self.height, self.fourcc) {
            Ok(rgb) => rgb,
            Err(e) => return Some(Err(e)),
        };
        let frame = Frame::new(rgb, self.width, self.height, 3, self.index);
        self.index += 1;
        Some(Ok(frame))
    }
}

fn decode_frame(
    data: &[u8],
    width: u32,
    height: u32,
    fourcc: FourCC,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    if fourcc == FourCC::new(b"YUYV") {
        let expected = (width * height * 2) as usize;
        if data.len() < expected {
            return Err(format!("short YUYV buffer: {} of {expected} bytes", data.len()).into());
        }
        Ok(yuyv_to_rgb(data, width as usize, height as usize))
    } else {
        let img = image::load_from_memory(data)?.to_rgb8();
        if img.dimensions() != (width, height) {
            return Err(format!(
                "camera frame is {}x{}, expected {width}x{height}",
                img.width(),
                img.height()
            )
            .into());
        }
        Ok(img.into_raw())
    }
}

/// Convert a packed YUYV 4:2:2 buffer to RGB24 (BT.601).
fn yuyv_to_rgb(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(width * height * 3);
    for chunk in data.chunks_exact(4).take(width * height / 2) {
        let u = chunk[1] as f64 - 128.0;
        let v = chunk[3] as f64 - 128.0;
        push_rgb(&mut rgb, chunk[0] as f64, u, v);
        push_rgb(&mut rgb, chunk[2] as f64, u, v);
    }
    rgb
}

fn push_rgb(out: &mut Vec<u8>, y: f64, u: f64, v: f64) {
    let r = y + 1.402 * v;
    let g = y - 0.344136 * u - 0.714136 * v;
    let b = y + 1.772 * u;
    out.push(r.clamp(0.0, 255.0) as u8);
    out.push(g.clamp(0.0, 255.0) as u8);
    out.push(b.clamp(0.0, 255.0) as u8);
}
