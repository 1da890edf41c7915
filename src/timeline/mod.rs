//! Note timelines: interval storage, tick → seconds mapping and the sliding-window sweep.

/// Interval and lane storage.
pub mod model;
/// Tick to wall-clock mapping.
pub mod tempo;
/// Sliding visibility window over a timed timeline.
pub mod window;
