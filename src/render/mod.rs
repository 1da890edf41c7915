//! Raster output: frame buffers, piano-roll layout math and the per-frame rasterizer.

/// RGBA8 frame buffer.
pub mod frame;
/// Note → pixel geometry.
pub mod layout;
/// Visible set → pixels.
pub mod raster;
