//! Frame sources backed by still images on disk.

use moodlock_core::Frame;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("decode failed for {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("frame source exhausted")]
    Exhausted,
}

/// Supplies frames on demand, one per detection cycle.
pub trait FrameSource: Send {
    fn capture(&mut self) -> Result<Frame, CaptureError>;
}

/// Decode an image file into an RGBA frame.
pub fn load_frame(path: &Path) -> Result<Frame, CaptureError> {
    if !path.exists() {
        return Err(CaptureError::NotFound(path.display().to_string()));
    }
    let decoded = image::open(path).map_err(|e| CaptureError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    Frame::from_rgba(rgba.into_raw(), width, height).map_err(|e| CaptureError::Decode {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Returns the same frame on every capture.
pub struct StillSource {
    frame: Frame,
    sequence: u32,
}

impl StillSource {
    pub fn new(frame: Frame) -> Self {
        Self { frame, sequence: 0 }
    }

    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let frame = load_frame(path)?;
        tracing::info!(
            path = %path.display(),
            width = frame.width,
            height = frame.height,
            "opened still image source"
        );
        Ok(Self::new(frame))
    }
}

impl FrameSource for StillSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        self.sequence = self.sequence.wrapping_add(1);
        let mut frame = self.frame.clone().with_sequence(self.sequence);
        frame.timestamp = std::time::Instant::now();
        Ok(frame)
    }
}

/// Cycles through a list of images, decoding each on capture.
///
/// Decoding lazily keeps only one frame buffer alive per cycle.
pub struct SequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    sequence: u32,
    looping: bool,
}

impl SequenceSource {
    pub fn open(paths: Vec<PathBuf>) -> Result<Self, CaptureError> {
        if let Some(missing) = paths.iter().find(|p| !p.exists()) {
            return Err(CaptureError::NotFound(missing.display().to_string()));
        }
        tracing::info!(frames = paths.len(), "opened image sequence source");
        Ok(Self {
            paths,
            next: 0,
            sequence: 0,
            looping: true,
        })
    }

    /// Stop after the last image instead of starting over.
    pub fn once(mut self) -> Self {
        self.looping = false;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for SequenceSource {
    fn capture(&mut self) -> Result<Frame, CaptureError> {
        if self.paths.is_empty() {
            return Err(CaptureError::Exhausted);
        }
        if self.next >= self.paths.len() {
            if !self.looping {
                return Err(CaptureError::Exhausted);
            }
            self.next = 0;
        }
        let path = &self.paths[self.next];
        self.next += 1;
        self.sequence = self.sequence.wrapping_add(1);

        let frame = load_frame(path)?.with_sequence(self.sequence);
        tracing::debug!(path = %path.display(), seq = self.sequence, "captured frame");
        Ok(frame)
    }
}
