//! Instruments measure one interval of a workload at a time.
//!
//! The caller brackets the interval with `start` and `stop` and afterwards
//! asks for `measurements`. Which instruments exist is a closed set,
//! `InstrumentKind`, picked once at configuration time.

use backend::PerfEventBackend;
use measurement::MeasurementSet;
use std::error;
use std::fmt;
use std::str::FromStr;

mod pmu;
mod wall_clock;

pub use self::pmu::PmuCounter;
pub use self::wall_clock::WallClock;

/// The lifecycle every instrument obeys.
///
/// Instruments perform no internal synchronization. One thread drives an
/// instrument at a time.
pub trait Instrument {
    /// A stable label for this kind of instrument.
    fn id(&self) -> &str;

    /// Zero the underlying counters and begin counting. Anything latched by
    /// an earlier `stop` is discarded.
    fn start(&mut self);

    /// Latch what was counted since `start` (or the previous `stop`) and
    /// zero the counters again.
    ///
    /// Never fails. A counter that cannot be read latches zero without
    /// disturbing the others.
    fn stop(&mut self);

    /// The measurements for the last latched interval.
    ///
    /// A pure function of the latched state: repeated calls between a
    /// `stop` and the next `start` return equal sets. Before the first
    /// `stop` the contents are unspecified.
    fn measurements(&self) -> MeasurementSet;
}

impl<I> Instrument for Box<I>
where
    I: Instrument + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    fn start(&mut self) {
        (**self).start()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn measurements(&self) -> MeasurementSet {
        (**self).measurements()
    }
}

/// The instruments perfstat knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentKind {
    /// Elapsed wall-clock time, see `WallClock`.
    WallClock,
    /// Processor performance counters, see `PmuCounter`.
    Pmu,
}

impl InstrumentKind {
    /// The configuration name of this kind.
    pub fn name(&self) -> &'static str {
        match *self {
            InstrumentKind::WallClock => "wall_clock",
            InstrumentKind::Pmu => "pmu",
        }
    }

    /// Construct the instrument, wired to the host's hardware.
    pub fn build(&self) -> Box<dyn Instrument> {
        match *self {
            InstrumentKind::WallClock => Box::new(WallClock::new()),
            InstrumentKind::Pmu => Box::new(PmuCounter::new(PerfEventBackend::new())),
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for InstrumentKind {
    type Err = UnknownInstrument;

    fn from_str(s: &str) -> Result<InstrumentKind, UnknownInstrument> {
        match s.trim().to_lowercase().as_str() {
            "wall_clock" | "wall-clock" | "wallclock" => Ok(InstrumentKind::WallClock),
            "pmu" => Ok(InstrumentKind::Pmu),
            _ => Err(UnknownInstrument(s.to_string())),
        }
    }
}

/// A configured instrument name matched no `InstrumentKind`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownInstrument(pub String);

impl fmt::Display for UnknownInstrument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown instrument '{}', expected one of: wall_clock, pmu",
            self.0
        )
    }
}

impl error::Error for UnknownInstrument {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_from_str() {
        assert_eq!(Ok(InstrumentKind::Pmu), "pmu".parse::<InstrumentKind>());
        assert_eq!(Ok(InstrumentKind::Pmu), " PMU ".parse::<InstrumentKind>());
        assert_eq!(Ok(InstrumentKind::WallClock), "wall_clock".parse::<InstrumentKind>());
        assert_eq!(Ok(InstrumentKind::WallClock), "Wall-Clock".parse::<InstrumentKind>());
        assert_eq!(
            Err(UnknownInstrument("mali".to_string())),
            "mali".parse::<InstrumentKind>()
        );
    }

    #[test]
    fn kind_name_parses_back() {
        for kind in &[InstrumentKind::WallClock, InstrumentKind::Pmu] {
            assert_eq!(Ok(*kind), kind.name().parse::<InstrumentKind>());
        }
    }

    #[test]
    fn built_instruments_carry_their_ids() {
        assert_eq!("Wall clock", InstrumentKind::WallClock.build().id());
        assert_eq!("PMU Counter", InstrumentKind::Pmu.build().id());
    }
}
