//! Duration-to-timestamp conversion.
//!
//! The source side reports "this frame is shown for N ms"; the WebP encoder
//! wants "this frame appears at time T" plus a final end-of-animation time.
//! That off-by-one lives here and nowhere else.

/// Running sum of frame durations. First frame starts at 0.
#[derive(Clone, Copy, Debug, Default)]
pub struct TimestampAccumulator {
    elapsed_ms: u32,
}

impl TimestampAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamp at which a frame with the given duration starts; advances
    /// the clock past it.
    pub fn begin_frame(&mut self, duration_ms: u32) -> u32 {
        let ts = self.elapsed_ms;
        self.elapsed_ms = self.elapsed_ms.saturating_add(duration_ms);
        ts
    }

    /// Total elapsed time; the terminal timestamp that closes out the last
    /// frame's display interval.
    pub fn end_timestamp(&self) -> u32 {
        self.elapsed_ms
    }
}
