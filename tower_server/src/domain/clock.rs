// Countdown for one tower generation.

use serde::Serialize;

/// Start time and duration of the live tower, in epoch seconds.
///
/// Readings are recomputed from these two values on every call, so the clock can be
/// polled from any loop without drifting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    pub start: u64,
    pub duration: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClockReading {
    pub time_remaining: u64,
    pub expired: bool,
}

impl GameClock {
    pub fn new(start: u64, duration: u64) -> Self {
        Self { start, duration }
    }

    pub fn tick(&self, now: u64) -> ClockReading {
        // A clock observed before its start has not elapsed at all.
        let elapsed = now.saturating_sub(self.start);
        let time_remaining = self.duration.saturating_sub(elapsed);
        ClockReading {
            time_remaining,
            expired: time_remaining == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u64 = 1_700_000_000;

    #[test]
    fn when_now_is_past_duration_then_clock_is_expired_with_zero_remaining() {
        let clock = GameClock::new(T, 300);
        assert_eq!(
            clock.tick(T + 305),
            ClockReading {
                time_remaining: 0,
                expired: true
            }
        );
    }

    #[test]
    fn when_now_is_exactly_at_duration_then_clock_is_expired() {
        let clock = GameClock::new(T, 300);
        assert!(clock.tick(T + 300).expired);
    }

    #[test]
    fn when_time_remains_then_reading_counts_down() {
        let clock = GameClock::new(T, 300);
        let reading = clock.tick(T + 120);
        assert_eq!(reading.time_remaining, 180);
        assert!(!reading.expired);
    }

    #[test]
    fn when_now_precedes_start_then_full_duration_remains() {
        let clock = GameClock::new(T, 300);
        assert_eq!(clock.tick(T - 10).time_remaining, 300);
    }

    #[test]
    fn when_ticked_repeatedly_then_reading_is_unchanged() {
        let clock = GameClock::new(T, 300);
        assert_eq!(clock.tick(T + 42), clock.tick(T + 42));
    }
}
