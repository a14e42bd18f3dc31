use std::time::{Duration, SystemTime};

use log::debug;

use super::track_ledger::{Track, ZoneState};

/// Time since `last`, or zero if the clock went backwards (paused/resumed streams).
pub fn elapsed_since(last: SystemTime, now: SystemTime) -> Duration {
    match now.duration_since(last) {
        Ok(elapsed) => elapsed,
        Err(e) => {
            debug!(
                "Clock moved backwards by {:?}; attributing no time to this interval",
                e.duration()
            );
            Duration::ZERO
        }
    }
}

/// Advance a track's bookkeeping to `now`, attributing the whole interval
/// since its last update to the zone it occupies now. Returns the interval.
pub fn advance(track: &mut Track, now: SystemTime, zone: ZoneState) -> Duration {
    let elapsed = elapsed_since(track.last_update, now);
    track.last_update = now;
    match zone {
        ZoneState::Inside => track.zone_time += elapsed,
        ZoneState::Outside => track.outside_time += elapsed,
    }
    track.current_zone = zone;
    elapsed
}

#[cfg(test)]
mod tests {
    use std::time::UNIX_EPOCH;

    use super::*;
    use crate::detections::TrackId;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn trailing_attribution() {
        let mut track = Track::new(TrackId(1), at(0));
        advance(&mut track, at(3), ZoneState::Outside);
        advance(&mut track, at(5), ZoneState::Inside);
        assert_eq!(track.outside_time, Duration::from_secs(3));
        assert_eq!(track.zone_time, Duration::from_secs(2));
        assert_eq!(track.current_zone, ZoneState::Inside);
    }

    #[test]
    fn backwards_clock_clamps_to_zero() {
        let mut track = Track::new(TrackId(1), at(10));
        let elapsed = advance(&mut track, at(4), ZoneState::Inside);
        assert_eq!(elapsed, Duration::ZERO);
        assert_eq!(track.zone_time, Duration::ZERO);
        assert_eq!(track.last_update, at(4));

        advance(&mut track, at(6), ZoneState::Inside);
        assert_eq!(track.zone_time, Duration::from_secs(2));
    }
}
