//! Frame type and image plumbing — RGBA validation, downsampling, region
//! extraction and snapshot encoding.

use crate::types::Rect;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ImageEncoder, RgbaImage};

/// Largest frame analysed per cycle; bigger frames are resized first.
pub const MAX_ANALYSIS_WIDTH: u32 = 640;
pub const MAX_ANALYSIS_HEIGHT: u32 = 480;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("invalid RGBA length for {width}x{height}: expected {expected}, got {actual}")]
    InvalidLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("zero-sized frame")]
    ZeroSized,
    #[error("region lies outside the frame")]
    RegionOutOfBounds,
    #[error("encode failed: {0}")]
    Encode(String),
}

/// A captured RGBA video frame.
#[derive(Clone)]
pub struct Frame {
    /// Row-major RGBA pixel data (width * height * 4 bytes).
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub timestamp: std::time::Instant,
    pub sequence: u32,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl Frame {
    /// Wrap an RGBA buffer, checking that its length matches the dimensions.
    pub fn from_rgba(data: Vec<u8>, width: u32, height: u32) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroSized);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(FrameError::InvalidLength {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        })
    }

    /// A frame where every pixel has the same colour. Handy for diagnostics and tests.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self, FrameError> {
        let data = [rgb[0], rgb[1], rgb[2], 255]
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::from_rgba(data, width, height)
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }

    /// Resize to fit inside `max_width` × `max_height`, scaling each axis
    /// independently. Returns `None` when the frame already fits.
    pub fn downsample(&self, max_width: u32, max_height: u32) -> Option<Frame> {
        let target_w = self.width.min(max_width.max(1));
        let target_h = self.height.min(max_height.max(1));
        if target_w == self.width && target_h == self.height {
            return None;
        }
        let image = RgbaImage::from_raw(self.width, self.height, self.data.clone())?;
        let resized = imageops::resize(&image, target_w, target_h, FilterType::Triangle);
        Some(Frame {
            data: resized.into_raw(),
            width: target_w,
            height: target_h,
            timestamp: self.timestamp,
            sequence: self.sequence,
        })
    }

    /// Copy the pixels under `rect` (clipped to the frame) into a new RGBA buffer.
    ///
    /// Returns `(pixels, width, height)`, or `None` when nothing of the
    /// rectangle lies inside the frame.
    pub fn region(&self, rect: &Rect) -> Option<(Vec<u8>, u32, u32)> {
        let (x, y, w, h) = rect.clamp_to(self.width, self.height)?;
        let stride = self.width as usize * 4;
        if self.data.len() < stride * self.height as usize {
            return None;
        }
        let mut out = Vec::with_capacity(w as usize * h as usize * 4);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * 4;
            out.extend_from_slice(&self.data[start..start + w as usize * 4]);
        }
        Some((out, w, h))
    }

    /// Crop `rect` (clipped to the frame) and encode it as JPEG.
    ///
    /// `quality` is the JPEG quality in percent (1–100).
    pub fn encode_jpeg(&self, rect: &Rect, quality: u8) -> Result<Vec<u8>, FrameError> {
        let (pixels, w, h) = self.region(rect).ok_or(FrameError::RegionOutOfBounds)?;

        // JPEG carries no alpha channel.
        let rgb: Vec<u8> = pixels
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100))
            .write_image(&rgb, w, h, image::ExtendedColorType::Rgb8)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

/// Unweighted mean of the three colour channels.
#[inline]
pub fn brightness(r: u8, g: u8, b: u8) -> f32 {
    (r as f32 + g as f32 + b as f32) / 3.0
}
