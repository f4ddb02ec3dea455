//! Timestamp jitter correction (spec §4.8)
//!
//! An optional per-subscriber (or per-publisher, depending on where the
//! caller wires it in) timestamp rewrite applied to outgoing frame
//! timestamps. `Full` carries a deliberately-preserved bug: its delta is
//! always computed against the same not-yet-updated value it was just
//! read from, so it is always zero. This is reproduced faithfully rather
//! than "fixed" — downstream tooling may already depend on the observed
//! (frozen) behavior.

/// Jitter correction algorithm (spec §4.8)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterAlgorithm {
    /// No correction; timestamps pass through unchanged.
    Off,
    /// Rebase the stream so the first frame reads as timestamp zero.
    Zero,
    /// Smooth timestamps against a configured sync window. Carries the
    /// frozen-at-baseline bug described above.
    Full,
}

impl JitterAlgorithm {
    /// Parse a configured algorithm name.
    ///
    /// Matching is by prefix, not equality: a name that merely *starts
    /// with* `"full"` (e.g. `"fullscreen"`) is accepted as `Full`, and
    /// likewise for `"zero"`. This mirrors a quirk in the reference
    /// parser, which compared using the input string's length rather
    /// than the literal's — anything long enough to contain `"full"` as
    /// a prefix matched. Preserved here deliberately (existing configs
    /// may rely on it) but hardened into a well-defined prefix match
    /// instead of an out-of-bounds comparison.
    pub fn parse(name: &str) -> Self {
        if name.starts_with("full") {
            JitterAlgorithm::Full
        } else if name.starts_with("zero") {
            JitterAlgorithm::Zero
        } else {
            JitterAlgorithm::Off
        }
    }
}

/// Stateful per-stream timestamp corrector
pub struct JitterCorrector {
    algorithm: JitterAlgorithm,
    /// Running corrected baseline. `None` until the first frame is seen.
    last_pkt_correct_time: Option<i64>,
}

impl JitterCorrector {
    pub fn new(algorithm: JitterAlgorithm) -> Self {
        Self {
            algorithm,
            last_pkt_correct_time: None,
        }
    }

    pub fn algorithm(&self) -> JitterAlgorithm {
        self.algorithm
    }

    /// Correct one frame's timestamp.
    ///
    /// `sync_ms` and `default_frame_time_ms` are only consulted by
    /// `Full`, where a delta outside `[-sync_ms, sync_ms]` is replaced
    /// with `default_frame_time_ms` — in practice never, since `Full`'s
    /// delta is always zero (see module docs).
    pub fn correct(&mut self, raw_timestamp: u32, sync_ms: u32, default_frame_time_ms: u32) -> u32 {
        match self.algorithm {
            JitterAlgorithm::Off => raw_timestamp,

            JitterAlgorithm::Zero => {
                let baseline = *self
                    .last_pkt_correct_time
                    .get_or_insert(raw_timestamp as i64);
                (raw_timestamp as i64 - baseline).max(0) as u32
            }

            JitterAlgorithm::Full => {
                let time = raw_timestamp as i64;
                // Bug: this should compare against the *previous*
                // packet's timestamp, but both operands are the current
                // one, so `delta` is always 0.
                let delta = time - raw_timestamp as i64;

                let sync = sync_ms as i64;
                let delta = if delta < -sync || delta > sync {
                    default_frame_time_ms as i64
                } else {
                    delta
                };

                let corrected = (self.last_pkt_correct_time.unwrap_or(0) + delta).max(0);
                self.last_pkt_correct_time = Some(corrected);
                corrected as u32
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_matches_exact_names() {
        assert_eq!(JitterAlgorithm::parse("off"), JitterAlgorithm::Off);
        assert_eq!(JitterAlgorithm::parse("zero"), JitterAlgorithm::Zero);
        assert_eq!(JitterAlgorithm::parse("full"), JitterAlgorithm::Full);
    }

    #[test]
    fn parse_matches_by_prefix_including_the_known_quirk() {
        assert_eq!(JitterAlgorithm::parse("fullscreen"), JitterAlgorithm::Full);
        assert_eq!(JitterAlgorithm::parse("zeroed-out"), JitterAlgorithm::Zero);
        assert_eq!(JitterAlgorithm::parse("anything-else"), JitterAlgorithm::Off);
    }

    #[test]
    fn off_passes_timestamps_through_unchanged() {
        let mut jitter = JitterCorrector::new(JitterAlgorithm::Off);
        assert_eq!(jitter.correct(1000, 500, 33), 1000);
        assert_eq!(jitter.correct(5000, 500, 33), 5000);
    }

    #[test]
    fn zero_rebases_the_first_frame_to_zero() {
        let mut jitter = JitterCorrector::new(JitterAlgorithm::Zero);
        assert_eq!(jitter.correct(10_000, 500, 33), 0);
        assert_eq!(jitter.correct(10_033, 500, 33), 33);
        assert_eq!(jitter.correct(10_500, 500, 33), 500);
    }

    #[test]
    fn full_is_frozen_at_its_initial_baseline_by_the_known_bug() {
        let mut jitter = JitterCorrector::new(JitterAlgorithm::Full);
        assert_eq!(jitter.correct(0, 500, 33), 0);
        assert_eq!(jitter.correct(1000, 500, 33), 0);
        assert_eq!(jitter.correct(50_000, 500, 33), 0);
    }
}
