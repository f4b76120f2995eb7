//! moodlock-capture — Frame sources for the detection engine.
//!
//! Decodes still images (any format the `image` crate reads) into RGBA
//! frames, either one fixed frame or a looping sequence.

pub mod source;

pub use source::{load_frame, CaptureError, FrameSource, SequenceSource, StillSource};
