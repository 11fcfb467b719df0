//! A set of instruments driven together over repeated intervals.

use accumulator::StatisticsAccumulator;
use instrument::Instrument;
use measurement::MeasurementSet;

/// Drives several instruments through the same intervals and keeps one
/// `StatisticsAccumulator` per instrument.
///
/// Instruments are started in the order they were added and stopped in the
/// reverse order, so the instruments added first bracket the ones added
/// after them.
#[derive(Default)]
pub struct Profiler {
    instruments: Vec<Box<dyn Instrument>>,
    accumulators: Vec<StatisticsAccumulator>,
    iterations: usize,
}

impl Profiler {
    /// Create a Profiler with no instruments.
    pub fn new() -> Profiler {
        Profiler::default()
    }

    /// Add an instrument. It takes part from the next `start` on.
    pub fn add(&mut self, instrument: Box<dyn Instrument>) {
        debug!("profiler: adding instrument '{}'", instrument.id());
        self.instruments.push(instrument);
        self.accumulators.push(StatisticsAccumulator::new());
    }

    /// Start every instrument.
    pub fn start(&mut self) {
        for instrument in &mut self.instruments {
            instrument.start();
        }
    }

    /// Stop every instrument and fold its measurements into its
    /// accumulator.
    pub fn stop(&mut self) {
        for instrument in self.instruments.iter_mut().rev() {
            instrument.stop();
        }
        for (instrument, acc) in self.instruments.iter().zip(self.accumulators.iter_mut()) {
            acc.observe(&instrument.measurements());
        }
        self.iterations += 1;
        trace!("profiler: completed iteration {}", self.iterations);
    }

    /// The running means per instrument, in the order instruments were
    /// added.
    pub fn report(&self) -> Vec<(String, MeasurementSet)> {
        self.instruments
            .iter()
            .zip(self.accumulators.iter())
            .map(|(instrument, acc)| (instrument.id().to_string(), acc.report()))
            .collect()
    }

    /// The accumulator of the first instrument whose id is `id`.
    pub fn accumulator(&self, id: &str) -> Option<&StatisticsAccumulator> {
        self.instruments
            .iter()
            .position(|i| i.id() == id)
            .map(|pos| &self.accumulators[pos])
    }

    /// Iterate over `(instrument id, accumulator)` in the order instruments
    /// were added.
    pub fn accumulators<'a>(
        &'a self,
    ) -> impl Iterator<Item = (&'a str, &'a StatisticsAccumulator)> + 'a {
        self.instruments
            .iter()
            .map(|i| i.id())
            .zip(self.accumulators.iter())
    }

    /// Number of completed intervals since creation or the last `reset`.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// The instruments, in the order they were added.
    pub fn instruments(&self) -> &[Box<dyn Instrument>] {
        &self.instruments
    }

    /// Reset every accumulator. Instruments are left as they are.
    pub fn reset(&mut self) {
        for acc in &mut self.accumulators {
            acc.reset();
        }
        self.iterations = 0;
    }
}
