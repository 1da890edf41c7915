use crate::foundation::error::{RollError, RollResult};

/// Tempo assumed when a file carries no tempo event.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// Convert a tick position to seconds: `ticks * (60 / tempo_bpm) / resolution`.
pub fn ticks_to_secs(ticks: u64, resolution: u16, tempo_bpm: f64) -> f64 {
    ticks as f64 * (60.0 / tempo_bpm) / f64::from(resolution)
}

/// Convert an SMF tempo (microseconds per quarter note) to beats per minute.
pub fn micros_per_quarter_to_bpm(micros_per_quarter: u32) -> f64 {
    60_000_000.0 / f64::from(micros_per_quarter)
}

/// File-global timing parameters.
///
/// A single tempo applies to the whole file: the last tempo event observed while decoding wins.
/// Files with real tempo changes are therefore timed inaccurately after the first change; the
/// decoder reports every overwritten tempo as an anomaly instead of correcting it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TempoContext {
    /// Ticks per quarter note, from the file header.
    pub resolution: u16,
    /// Tempo used for the whole file.
    pub tempo_bpm: f64,
    /// Number of tempo events seen while decoding.
    pub tempo_events: u32,
}

impl TempoContext {
    /// Context with the default tempo.
    pub fn new(resolution: u16) -> RollResult<Self> {
        if resolution == 0 {
            return Err(RollError::decode("resolution (ticks per quarter) must be > 0"));
        }
        Ok(Self {
            resolution,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            tempo_events: 0,
        })
    }

    /// Context with an explicit tempo.
    pub fn with_tempo_bpm(resolution: u16, tempo_bpm: f64) -> RollResult<Self> {
        let mut ctx = Self::new(resolution)?;
        if !tempo_bpm.is_finite() || tempo_bpm <= 0.0 {
            return Err(RollError::decode(format!(
                "tempo must be a positive number of BPM, got {tempo_bpm}"
            )));
        }
        ctx.tempo_bpm = tempo_bpm;
        Ok(ctx)
    }

    /// Record a tempo event, overwriting the current tempo.
    pub(crate) fn observe(&mut self, tempo_bpm: f64) {
        self.tempo_bpm = tempo_bpm;
        self.tempo_events += 1;
    }

    /// Seconds per tick under this context.
    pub fn secs_per_tick(&self) -> f64 {
        (60.0 / self.tempo_bpm) / f64::from(self.resolution)
    }

    /// Map a tick position to seconds.
    pub fn ticks_to_secs(&self, ticks: u64) -> f64 {
        ticks_to_secs(ticks, self.resolution, self.tempo_bpm)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/tempo.rs"]
mod tests;
