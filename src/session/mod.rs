//! Render sessions: drive the sweep, the rasterizer and a frame sink for one timeline and view.

/// Session API and the sweep → raster → sink pipeline.
pub mod render_session;
