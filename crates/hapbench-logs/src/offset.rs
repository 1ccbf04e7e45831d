use chrono::{DateTime, FixedOffset};

/// Fixed step used when timestamps are normalized
const NORMALIZED_STEP_MS: i64 = 1000;

/// How output offsets advance between accepted records
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OffsetMode {
    /// Follow the real spacing between log timestamps
    #[default]
    Real,
    /// Space every request exactly one second apart
    Normalized,
}

/// Running millisecond offset across accepted records
#[derive(Clone, Debug, Default)]
pub struct OffsetClock {
    mode: OffsetMode,
    total_ms: i64,
    last: Option<DateTime<FixedOffset>>,
}

impl OffsetClock {
    pub fn new(mode: OffsetMode) -> Self {
        Self {
            mode,
            total_ms: 0,
            last: None,
        }
    }

    /// Account for the next accepted record and return its offset
    pub fn advance(&mut self, time: DateTime<FixedOffset>) -> i64 {
        // The first record seeds the clock, so it lands at zero in real mode
        let last = *self.last.get_or_insert(time);

        self.total_ms += match self.mode {
            OffsetMode::Normalized => NORMALIZED_STEP_MS,
            OffsetMode::Real => (time - last).num_milliseconds(),
        };
        self.last = Some(time);
        self.total_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap()
    }

    #[test]
    fn test_real_offsets_follow_timestamps() {
        let mut clock = OffsetClock::new(OffsetMode::Real);
        assert_eq!(clock.advance(at("2014-12-02T16:41:06.226Z")), 0);
        assert_eq!(clock.advance(at("2014-12-02T16:41:06.500Z")), 274);
        assert_eq!(clock.advance(at("2014-12-02T16:41:08.500Z")), 2274);
        assert_eq!(clock.advance(at("2014-12-02T16:41:08.500Z")), 2274);
    }

    #[test]
    fn test_real_offsets_monotonic_for_sorted_input() {
        let mut clock = OffsetClock::new(OffsetMode::Real);
        let times = [
            "2014-12-02T16:41:00.000Z",
            "2014-12-02T16:41:00.000Z",
            "2014-12-02T16:41:00.010Z",
            "2014-12-02T16:41:03.000Z",
            "2014-12-02T17:00:00.000Z",
        ];
        let mut previous = i64::MIN;
        for t in times {
            let offset = clock.advance(at(t));
            assert!(offset >= previous);
            previous = offset;
        }
    }

    #[test]
    fn test_real_offsets_keep_negative_steps() {
        let mut clock = OffsetClock::new(OffsetMode::Real);
        clock.advance(at("2014-12-02T16:41:10Z"));
        assert_eq!(clock.advance(at("2014-12-02T16:41:09Z")), -1000);
    }

    #[test]
    fn test_real_offsets_across_zones() {
        let mut clock = OffsetClock::new(OffsetMode::Real);
        clock.advance(at("2014-12-02T16:41:00+00:00"));
        assert_eq!(clock.advance(at("2014-12-02T18:41:01+02:00")), 1000);
    }

    #[test]
    fn test_normalized_steps_by_one_second() {
        let mut clock = OffsetClock::new(OffsetMode::Normalized);
        assert_eq!(clock.advance(at("2014-12-02T16:41:06Z")), 1000);
        assert_eq!(clock.advance(at("2014-12-02T16:45:00Z")), 2000);
        assert_eq!(clock.advance(at("2014-12-02T16:40:00Z")), 3000);
    }
}
