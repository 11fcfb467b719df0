//! Counters backed by Linux `perf_event_open(2)`.
//!
//! Each logical counter gets its own perf event, opened once for the calling
//! process on any CPU, user space only. Counters inherit into child
//! processes so the counts of a spawned workload are folded back into ours
//! once it has been reaped.
//!
//! Opening requires `kernel.perf_event_paranoid <= 2`, `CAP_PERFMON` or
//! root. A counter that cannot be opened stays unavailable for the life of
//! the backend; the others are unaffected. On platforms other than Linux
//! every counter is unsupported.

use backend::{Counter, CounterBackend, ReadError};

#[cfg(target_os = "linux")]
mod sys {
    use backend::{Counter, ReadError};
    use libc;
    use perf_event2::events::Hardware;
    use perf_event2::Builder;
    use std::io;

    pub type Event = ::perf_event2::Counter;

    fn hardware_event(counter: Counter) -> Hardware {
        match counter {
            Counter::Cycles => Hardware::CPU_CYCLES,
            Counter::Instructions => Hardware::INSTRUCTIONS,
            Counter::CacheReferences => Hardware::CACHE_REFERENCES,
            Counter::CacheMisses => Hardware::CACHE_MISSES,
            Counter::BranchInstructions => Hardware::BRANCH_INSTRUCTIONS,
            Counter::BranchMisses => Hardware::BRANCH_MISSES,
        }
    }

    /// The kernel answers ENOENT, ENODEV or EOPNOTSUPP for events the
    /// processor does not implement. Anything else, permission refusals
    /// included, leaves the counter merely unavailable.
    pub fn read_error(counter: Counter, e: &io::Error) -> ReadError {
        match e.raw_os_error() {
            Some(libc::ENOENT) | Some(libc::ENODEV) | Some(libc::EOPNOTSUPP) => {
                ReadError::Unsupported(counter)
            }
            _ => ReadError::Unavailable(counter, e.to_string()),
        }
    }

    pub fn open(counter: Counter) -> Result<Event, ReadError> {
        let mut event = Builder::new(hardware_event(counter))
            .inherit(true)
            .exclude_kernel(true)
            .exclude_hv(true)
            .build()
            .map_err(|e| read_error(counter, &e))?;
        event.enable().map_err(|e| read_error(counter, &e))?;
        Ok(event)
    }

    pub fn reset(event: &mut Event, counter: Counter) -> Result<(), ReadError> {
        event.reset().map_err(|e| read_error(counter, &e))
    }

    pub fn read(event: &mut Event, counter: Counter) -> Result<i64, ReadError> {
        event
            .read()
            .map(|v| v as i64)
            .map_err(|e| read_error(counter, &e))
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use backend::{Counter, ReadError};

    pub enum Event {}

    pub fn open(counter: Counter) -> Result<Event, ReadError> {
        Err(ReadError::Unsupported(counter))
    }

    pub fn reset(event: &mut Event, _counter: Counter) -> Result<(), ReadError> {
        match *event {}
    }

    pub fn read(event: &mut Event, _counter: Counter) -> Result<i64, ReadError> {
        match *event {}
    }
}

/// Hardware counters for the current process and its children.
pub struct PerfEventBackend {
    slots: Vec<(Counter, Result<sys::Event, ReadError>)>,
}

impl PerfEventBackend {
    /// Open every counter in `Counter::ALL`.
    ///
    /// Never fails as a whole. Counters that cannot be opened are logged
    /// and report their open error on every later access.
    pub fn new() -> PerfEventBackend {
        let slots = Counter::ALL
            .iter()
            .map(|&counter| {
                let event = sys::open(counter);
                match event {
                    Ok(_) => trace!("opened perf event for {}", counter),
                    Err(ref e) => warn!("{}; it will read as zero", e),
                }
                (counter, event)
            })
            .collect();
        PerfEventBackend { slots: slots }
    }

    /// The counters that opened successfully.
    pub fn available(&self) -> Vec<Counter> {
        self.slots
            .iter()
            .filter(|s| s.1.is_ok())
            .map(|s| s.0)
            .collect()
    }

    fn event(&mut self, counter: Counter) -> Result<&mut sys::Event, ReadError> {
        match self.slots.iter_mut().find(|s| s.0 == counter) {
            Some(&mut (_, Ok(ref mut event))) => Ok(event),
            Some(&mut (_, Err(ref e))) => Err(e.clone()),
            None => Err(ReadError::Unsupported(counter)),
        }
    }
}

impl Default for PerfEventBackend {
    fn default() -> PerfEventBackend {
        PerfEventBackend::new()
    }
}

impl CounterBackend for PerfEventBackend {
    fn reset(&mut self, counter: Counter) -> Result<(), ReadError> {
        let event = self.event(counter)?;
        sys::reset(event, counter)
    }

    fn read_value(&mut self, counter: Counter) -> Result<i64, ReadError> {
        let event = self.event(counter)?;
        sys::read(event, counter)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn missing_events_are_unsupported() {
        use libc;
        use std::io;

        for &errno in &[libc::ENOENT, libc::ENODEV, libc::EOPNOTSUPP] {
            let e = io::Error::from_raw_os_error(errno);
            assert_eq!(
                ReadError::Unsupported(Counter::CacheMisses),
                super::sys::read_error(Counter::CacheMisses, &e)
            );
        }

        let e = io::Error::from_raw_os_error(libc::EACCES);
        match super::sys::read_error(Counter::Cycles, &e) {
            ReadError::Unavailable(Counter::Cycles, why) => assert!(!why.is_empty()),
            other => panic!("expected an unavailable counter, got {:?}", other),
        }
    }

    // Whether counters open depends on the host. Either way the backend must
    // answer for every counter without panicking, and unopened counters
    // must fail consistently.
    #[test]
    fn every_counter_answers() {
        let mut backend = PerfEventBackend::new();
        let available = backend.available();
        for &counter in Counter::ALL.iter() {
            let read = backend.read_value(counter);
            if available.contains(&counter) {
                if let Ok(v) = read {
                    assert!(v >= 0);
                }
            } else {
                assert_eq!(Some(counter), read.err().map(|e| e.counter()));
                assert!(backend.reset(counter).is_err());
            }
        }
    }
}
