/// Result alias used across the crate.
pub type RollResult<T> = Result<T, RollError>;

/// Errors surfaced by decoding, configuration, rendering and encoding.
///
/// Decode-time anomalies (unmatched note-offs, unfinished notes) are not errors; they are
/// reported through [`crate::DecodeDiagnostics`]. Only unreadable input, invalid configuration,
/// render failures and encoder failures end up here.
#[derive(thiserror::Error, Debug)]
pub enum RollError {
    /// Invalid view configuration, detected before any frame is rendered.
    #[error("config error: {0}")]
    Config(String),

    /// Structurally unreadable event input.
    #[error("decode error: {0}")]
    Decode(String),

    /// Failure in the frame sink / external encoder.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failure while sweeping or rasterizing frames.
    #[error("render error: {0}")]
    Render(String),

    /// The render was cancelled between frames.
    #[error("render cancelled")]
    Cancelled,

    /// Anything else, usually an I/O error with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RollError {
    /// Build a [`RollError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`RollError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`RollError::Encoding`].
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`RollError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Return `true` for errors raised by cancellation rather than by a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
