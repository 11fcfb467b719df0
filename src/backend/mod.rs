//! The boundary between instruments and the hardware that counts for them.
//!
//! A `CounterBackend` exposes the six logical processor counters. How the
//! backend maps them onto physical registers, and how it multiplexes those
//! registers, is none of the instrument's business.

use std::error;
use std::fmt;

mod perf_event;

pub use self::perf_event::PerfEventBackend;

/// The logical processor counters an instrument may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    /// Processor cycles.
    Cycles,
    /// Retired instructions.
    Instructions,
    /// Last-level cache references.
    CacheReferences,
    /// Last-level cache misses.
    CacheMisses,
    /// Retired branch instructions.
    BranchInstructions,
    /// Mispredicted branches.
    BranchMisses,
}

impl Counter {
    /// Every counter, in the order instruments read them.
    pub const ALL: [Counter; 6] = [
        Counter::Cycles,
        Counter::Instructions,
        Counter::CacheReferences,
        Counter::CacheMisses,
        Counter::BranchInstructions,
        Counter::BranchMisses,
    ];

    /// Human readable name of the counter.
    pub fn name(&self) -> &'static str {
        match *self {
            Counter::Cycles => "cycles",
            Counter::Instructions => "instructions",
            Counter::CacheReferences => "cache references",
            Counter::CacheMisses => "cache misses",
            Counter::BranchInstructions => "branch instructions",
            Counter::BranchMisses => "branch misses",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single counter could not be read or reset.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadError {
    /// The platform or processor has no such counter.
    Unsupported(Counter),
    /// The counter exists but could not be accessed right now, for instance
    /// because opening it was refused or the read syscall failed.
    Unavailable(Counter, String),
}

impl ReadError {
    /// The counter the failure relates to.
    pub fn counter(&self) -> Counter {
        match *self {
            ReadError::Unsupported(c) | ReadError::Unavailable(c, _) => c,
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ReadError::Unsupported(c) => write!(f, "counter '{}' is not supported", c),
            ReadError::Unavailable(c, ref why) => {
                write!(f, "counter '{}' is unavailable: {}", c, why)
            }
        }
    }
}

impl error::Error for ReadError {}

/// Per-counter access to hardware performance counters.
pub trait CounterBackend {
    /// Zero `counter`. Counting carries on from zero.
    fn reset(&mut self, counter: Counter) -> Result<(), ReadError>;

    /// The value accumulated by `counter` since it was last reset.
    fn read_value(&mut self, counter: Counter) -> Result<i64, ReadError>;
}

impl<'a, B> CounterBackend for &'a mut B
where
    B: CounterBackend + ?Sized,
{
    fn reset(&mut self, counter: Counter) -> Result<(), ReadError> {
        (**self).reset(counter)
    }

    fn read_value(&mut self, counter: Counter) -> Result<i64, ReadError> {
        (**self).read_value(counter)
    }
}

impl<B> CounterBackend for Box<B>
where
    B: CounterBackend + ?Sized,
{
    fn reset(&mut self, counter: Counter) -> Result<(), ReadError> {
        (**self).reset(counter)
    }

    fn read_value(&mut self, counter: Counter) -> Result<i64, ReadError> {
        (**self).read_value(counter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn read_error_names_its_counter() {
        let e = ReadError::Unsupported(Counter::BranchMisses);
        assert_eq!(Counter::BranchMisses, e.counter());
        assert_eq!("counter 'branch misses' is not supported", e.to_string());

        let e = ReadError::Unavailable(Counter::Cycles, "EACCES".to_string());
        assert_eq!(Counter::Cycles, e.counter());
        assert_eq!("counter 'cycles' is unavailable: EACCES", e.to_string());
    }

    #[test]
    fn all_counters_are_distinct() {
        for (i, a) in Counter::ALL.iter().enumerate() {
            for b in &Counter::ALL[i + 1..] {
                assert!(a != b);
                assert!(a.name() != b.name());
            }
        }
    }
}
