use std::collections::BTreeMap;

use crate::timeline::tempo::TempoContext;

/// Identifies one per-(track, pitch) interval list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct LaneKey {
    /// Source track index.
    pub track: usize,
    /// MIDI pitch.
    pub pitch: u8,
}

/// One sounding note.
///
/// `start_time` / `end_time` are zero until the file-global tempo mapping is applied by
/// [`TickTimeline::into_timed`].
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct NoteInterval {
    /// Source track index.
    pub track: usize,
    /// MIDI pitch.
    pub pitch: u8,
    /// Note-on velocity.
    pub velocity: u8,
    /// Absolute start tick.
    pub start_ticks: u64,
    /// Absolute end tick (meaningful once `finished`).
    pub end_ticks: u64,
    /// Start in seconds.
    pub start_time: f64,
    /// End in seconds.
    pub end_time: f64,
    /// Whether a matching note-off closed this interval.
    pub finished: bool,
}

impl NoteInterval {
    pub(crate) fn open(track: usize, pitch: u8, velocity: u8, start_ticks: u64) -> Self {
        Self {
            track,
            pitch,
            velocity,
            start_ticks,
            end_ticks: start_ticks,
            start_time: 0.0,
            end_time: 0.0,
            finished: false,
        }
    }

    pub(crate) fn close(&mut self, end_ticks: u64) {
        self.end_ticks = end_ticks;
        self.finished = true;
    }

    /// Lane this interval belongs to.
    pub fn key(&self) -> LaneKey {
        LaneKey {
            track: self.track,
            pitch: self.pitch,
        }
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// A note is active at `t` iff `start_time <= t < end_time`.
    pub fn is_active_at(&self, t: f64) -> bool {
        self.start_time <= t && t < self.end_time
    }
}

/// Ordered intervals of one (track, pitch), ascending by `start_ticks`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Lane {
    key: LaneKey,
    notes: Vec<NoteInterval>,
}

impl Lane {
    /// Lane identity.
    pub fn key(&self) -> LaneKey {
        self.key
    }

    /// Intervals in start order.
    pub fn notes(&self) -> &[NoteInterval] {
        &self.notes
    }
}

fn lanes_from_map(map: BTreeMap<LaneKey, Vec<NoteInterval>>) -> Vec<Lane> {
    map.into_iter()
        .filter(|(_, notes)| !notes.is_empty())
        .map(|(key, notes)| Lane { key, notes })
        .collect()
}

/// Decoded intervals in tick space, before any timing is applied.
///
/// Unfinished intervals are kept here as decoded (`finished == false`).
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct TickTimeline {
    lanes: Vec<Lane>,
}

impl TickTimeline {
    pub(crate) fn from_map(map: BTreeMap<LaneKey, Vec<NoteInterval>>) -> Self {
        Self {
            lanes: lanes_from_map(map),
        }
    }

    /// Lanes sorted by (track, pitch).
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Intervals for one lane, if any.
    pub fn lane(&self, key: LaneKey) -> Option<&[NoteInterval]> {
        find_lane(&self.lanes, key)
    }

    /// Total number of intervals, finished or not.
    pub fn note_count(&self) -> usize {
        self.lanes.iter().map(|l| l.notes.len()).sum()
    }

    /// Number of intervals never closed by a note-off.
    pub fn unfinished_count(&self) -> usize {
        self.lanes
            .iter()
            .flat_map(|l| l.notes.iter())
            .filter(|n| !n.finished)
            .count()
    }

    /// Apply the file-global tempo to every interval.
    ///
    /// Unfinished intervals are dropped here: they take no part in visibility or rasterization.
    /// Lane order and per-lane start order are preserved.
    pub fn into_timed(self, tempo: TempoContext) -> Timeline {
        let lanes = self
            .lanes
            .into_iter()
            .filter_map(|lane| {
                let notes: Vec<NoteInterval> = lane
                    .notes
                    .into_iter()
                    .filter(|n| n.finished)
                    .map(|mut n| {
                        n.start_time = tempo.ticks_to_secs(n.start_ticks);
                        n.end_time = tempo.ticks_to_secs(n.end_ticks);
                        n
                    })
                    .collect();
                (!notes.is_empty()).then_some(Lane {
                    key: lane.key,
                    notes,
                })
            })
            .collect();
        Timeline { lanes, tempo }
    }
}

fn find_lane(lanes: &[Lane], key: LaneKey) -> Option<&[NoteInterval]> {
    lanes
        .binary_search_by(|l| l.key.cmp(&key))
        .ok()
        .map(|i| lanes[i].notes.as_slice())
}

/// Timed, immutable note timeline for one input file.
///
/// Only finished intervals are present. Each lane is ordered by ascending start.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Timeline {
    lanes: Vec<Lane>,
    tempo: TempoContext,
}

impl Timeline {
    /// Lanes sorted by (track, pitch).
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Intervals for one lane, if any.
    pub fn lane(&self, key: LaneKey) -> Option<&[NoteInterval]> {
        find_lane(&self.lanes, key)
    }

    /// Timing parameters the intervals were mapped with.
    pub fn tempo(&self) -> TempoContext {
        self.tempo
    }

    /// Total number of intervals.
    pub fn note_count(&self) -> usize {
        self.lanes.iter().map(|l| l.notes.len()).sum()
    }

    /// Return `true` when there are no notes at all.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// All intervals, lane by lane.
    pub fn notes(&self) -> impl Iterator<Item = &NoteInterval> {
        self.lanes.iter().flat_map(|l| l.notes.iter())
    }

    /// Lowest and highest pitch present.
    pub fn pitch_range(&self) -> Option<(u8, u8)> {
        let min = self.lanes.iter().map(|l| l.key.pitch).min()?;
        let max = self.lanes.iter().map(|l| l.key.pitch).max()?;
        Some((min, max))
    }

    /// Largest `end_time` over all intervals.
    pub fn max_end_time(&self) -> Option<f64> {
        self.notes().map(|n| n.end_time).reduce(f64::max)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/model.rs"]
mod tests;
