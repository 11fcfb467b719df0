//! perfstat collects hardware performance-counter data while a workload runs
//! and folds the repeated raw counter snapshots into running statistics. It
//! is meant for profiling: every aggregate keeps the raw readings it was
//! built from, so a surprising mean can be traced back to the samples that
//! produced it.
//!
//! The moving parts, leaves first:
//!
//!  * `measurement::Value` is an integer-or-floating numeric payload.
//!  * `measurement::Measurement` tags a `Value` with a unit and provenance.
//!  * `instrument::Instrument` is the start / stop / measurements lifecycle
//!    implemented by the processor counter reader and the wall clock.
//!  * `accumulator::StatisticsAccumulator` keeps count, min, max, mean and
//!    variance per metric without replaying history.
//!
//! Sampling cadence belongs to the caller. A single control thread drives
//! `start`, the workload, `stop`, then hands the resulting measurements to
//! an accumulator.
#![allow(unknown_lints)]
#![deny(trivial_numeric_casts, missing_docs, unstable_features, unused_import_braces)]
extern crate clap;
extern crate serde;
#[macro_use]
extern crate serde_json;
extern crate toml;

#[cfg(target_os = "linux")]
extern crate libc;
#[cfg(target_os = "linux")]
extern crate perf_event2;

#[macro_use]
extern crate log;

#[macro_use]
extern crate serde_derive;

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
extern crate tempdir;

pub mod accumulator;
pub mod backend;
pub mod config;
pub mod instrument;
pub mod measurement;
pub mod profiler;
pub mod report;
