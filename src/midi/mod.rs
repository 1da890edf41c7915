//! Event input: the raw per-track event model, the Standard MIDI File reader and the note decoder.

/// Note pairing and tempo tracking.
pub mod decoder;
/// Raw event stream model.
pub mod event;
/// Standard MIDI File reader.
pub mod smf;
