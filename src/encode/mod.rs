//! Encoding sinks.
//!
//! Sinks consume rendered frames in frame order and are driven by [`crate::RenderSession::render`].

/// `ffmpeg`-based MP4 sink.
pub mod ffmpeg;
/// PNG image-sequence sink.
pub mod png;
/// Frame sink trait and the in-memory sink.
pub mod sink;
