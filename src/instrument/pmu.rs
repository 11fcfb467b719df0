//! The processor performance counter instrument.

use backend::{Counter, CounterBackend, ReadError};
use instrument::Instrument;
use measurement::{Measurement, MeasurementSet};

/// Raw counter deltas latched by the last `stop`.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Latched {
    cycles: i64,
    instructions: i64,
    cache_references: i64,
    cache_misses: i64,
    branch_instructions: i64,
    branch_misses: i64,
}

/// Reads cycles, instructions, cache and branch counters from a
/// `CounterBackend`.
///
/// Four measurements are reported: cycle and instruction counts, plus the
/// cache miss and branch miss ratios. The ratios are not guarded against a
/// zero denominator; an interval with no cache references reports a
/// non-finite cache miss ratio.
pub struct PmuCounter<B> {
    backend: B,
    latched: Latched,
}

impl<B> PmuCounter<B>
where
    B: CounterBackend,
{
    /// Create a PmuCounter that owns `backend`.
    pub fn new(backend: B) -> PmuCounter<B> {
        PmuCounter {
            backend: backend,
            latched: Latched::default(),
        }
    }

    /// The backend this instrument reads from.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn latch(&mut self, counter: Counter) -> i64 {
        match read_and_reset(&mut self.backend, counter) {
            Ok(value) => value,
            Err(e) => {
                debug!("{}, latching 0", e);
                0
            }
        }
    }
}

/// Read `counter`, then zero it. A failure of either step fails the reading.
fn read_and_reset<B>(backend: &mut B, counter: Counter) -> Result<i64, ReadError>
where
    B: CounterBackend,
{
    let value = backend.read_value(counter)?;
    backend.reset(counter)?;
    Ok(value)
}

impl<B> Instrument for PmuCounter<B>
where
    B: CounterBackend,
{
    fn id(&self) -> &str {
        "PMU Counter"
    }

    fn start(&mut self) {
        for &counter in Counter::ALL.iter() {
            if let Err(e) = self.backend.reset(counter) {
                debug!("{}, not reset", e);
            }
        }
        self.latched = Latched::default();
    }

    fn stop(&mut self) {
        self.latched = Latched {
            cycles: self.latch(Counter::Cycles),
            instructions: self.latch(Counter::Instructions),
            cache_references: self.latch(Counter::CacheReferences),
            cache_misses: self.latch(Counter::CacheMisses),
            branch_instructions: self.latch(Counter::BranchInstructions),
            branch_misses: self.latch(Counter::BranchMisses),
        };
        trace!("pmu latched {:?}", self.latched);
    }

    fn measurements(&self) -> MeasurementSet {
        let l = self.latched;
        let mut set = MeasurementSet::new();
        set.insert("CPU cycles", Measurement::new(l.cycles, "cycles"));
        set.insert(
            "CPU instructions",
            Measurement::new(l.instructions, "instructions"),
        );
        set.insert(
            "Cache miss ratio",
            Measurement::new(l.cache_misses as f64 / l.cache_references as f64, ""),
        );
        set.insert(
            "Branch miss ratio",
            Measurement::new(l.branch_misses as f64 / l.branch_instructions as f64, ""),
        );
        set
    }
}
