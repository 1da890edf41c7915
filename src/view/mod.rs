//! View configuration: the serde-facing definition and its validated, resolved forms.

/// Validated configuration and per-timeline resolution.
pub mod config;
/// JSON-facing definition types.
pub mod model;
