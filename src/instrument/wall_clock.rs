//! The wall-clock instrument.
//!
//! Measures the elapsed real time of each interval with the monotonic
//! clock. `stop` latches the interval and restarts the clock, so back to
//! back stops measure consecutive intervals.

use instrument::Instrument;
use measurement::{Measurement, MeasurementSet};
use std::time::{Duration, Instant};

/// Elapsed wall-clock time of an interval, in microseconds.
#[derive(Debug, Default)]
pub struct WallClock {
    mark: Option<Instant>,
    elapsed: Duration,
}

impl WallClock {
    /// Create an idle WallClock.
    pub fn new() -> WallClock {
        WallClock::default()
    }
}

fn as_micros(d: Duration) -> f64 {
    d.as_secs() as f64 * 1_000_000.0 + f64::from(d.subsec_nanos()) / 1_000.0
}

impl Instrument for WallClock {
    fn id(&self) -> &str {
        "Wall clock"
    }

    fn start(&mut self) {
        self.elapsed = Duration::default();
        self.mark = Some(Instant::now());
    }

    // Like a hardware counter, the clock restarts from zero on every stop.
    fn stop(&mut self) {
        let now = Instant::now();
        self.elapsed = self.mark.map(|m| now.duration_since(m)).unwrap_or_default();
        self.mark = Some(now);
    }

    fn measurements(&self) -> MeasurementSet {
        let mut set = MeasurementSet::new();
        set.insert("Wall clock", Measurement::new(as_micros(self.elapsed), "us"));
        set
    }
}
