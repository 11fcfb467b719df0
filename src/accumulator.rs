//! The accumulator is the primary statistics store.
//!
//! It consumes one `MeasurementSet` per sampling interval and keeps, per
//! metric name, a `RunningStat` holding count, min, max, mean and variance.
//! Nothing is replayed: every observation updates the aggregate in a single
//! pass and only the provenance trail grows with the number of samples.

use measurement::{Measurement, MeasurementSet, Value};
use std::collections::HashMap;

/// The running aggregate of a single metric.
///
/// Updates use the Value's own arithmetic. A metric reported as `Integer`
/// therefore has an integer mean and variance, truncated at every update,
/// which drifts from the exact mean as samples accumulate. Floating metrics
/// are exact up to floating point rounding. Once the squared deviations of
/// an integer metric outgrow `i64` they are carried as `Floating`, so the
/// variance never wraps.
#[derive(Debug, Clone)]
pub struct RunningStat {
    count: usize,
    min: Value,
    max: Value,
    mean: Value,
    // sum of squared deviations from the running mean
    m2: Value,
    unit: String,
    raw_data: Vec<String>,
}

impl RunningStat {
    fn new(m: &Measurement) -> RunningStat {
        let x = m.value();
        RunningStat {
            count: 1,
            min: x,
            max: x,
            mean: x,
            m2: x.zero(),
            unit: m.unit().to_string(),
            raw_data: m.raw_data().to_vec(),
        }
    }

    fn update(&mut self, m: &Measurement) {
        let x = m.value();
        self.count += 1;
        let n = self.count as i64;

        let delta = x - self.mean;
        self.mean = self.mean + delta / n;
        self.m2 = self.m2 + delta * (x - self.mean);

        if x < self.min {
            self.min = x;
        }
        if self.max < x {
            self.max = x;
        }
        self.raw_data.extend(m.raw_data().iter().cloned());
    }

    /// Number of observations.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Smallest observed value.
    pub fn min(&self) -> Value {
        self.min
    }

    /// Largest observed value.
    pub fn max(&self) -> Value {
        self.max
    }

    /// Running mean.
    pub fn mean(&self) -> Value {
        self.mean
    }

    /// Population variance of the observations, zero for a single sample.
    pub fn variance(&self) -> Value {
        self.m2 / self.count as i64
    }

    /// Relative standard deviation as a percentage of the mean.
    ///
    /// Not finite when the mean is zero. Check before presenting.
    pub fn relative_standard_deviation(&self) -> f64 {
        Value::relative_standard_deviation(self.variance(), self.mean)
    }

    /// The unit of the first observation.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Raw data of every observation, concatenated in observation order.
    pub fn raw_data(&self) -> &[String] {
        &self.raw_data
    }

    /// The mean as a Measurement carrying the merged raw data.
    pub fn to_measurement(&self) -> Measurement {
        Measurement::with_raw_data(self.mean, self.unit.clone(), self.raw_data.clone())
    }
}

/// Per-metric running statistics over a sequence of MeasurementSets.
///
/// Metrics are reported in the order they were first observed.
#[derive(Debug, Clone, Default)]
pub struct StatisticsAccumulator {
    index: HashMap<String, usize>,
    stats: Vec<(String, RunningStat)>,
}

impl StatisticsAccumulator {
    /// Create an empty StatisticsAccumulator.
    pub fn new() -> StatisticsAccumulator {
        StatisticsAccumulator::default()
    }

    /// Fold one sampling pass into the running statistics.
    ///
    /// Metrics absent from `set` are left untouched; there is no decay and
    /// no implicit zero.
    pub fn observe(&mut self, set: &MeasurementSet) {
        for (name, measurement) in set {
            match self.index.get(name) {
                Some(&i) => self.stats[i].1.update(measurement),
                None => {
                    trace!("first observation of '{}'", name);
                    self.index.insert(name.to_string(), self.stats.len());
                    self.stats
                        .push((name.to_string(), RunningStat::new(measurement)));
                }
            }
        }
    }

    /// The running mean of every metric, with merged raw data.
    ///
    /// Empty before the first observation and after `reset`.
    pub fn report(&self) -> MeasurementSet {
        self.stats
            .iter()
            .map(|&(ref name, ref stat)| (name.as_str(), stat.to_measurement()))
            .collect()
    }

    /// The running statistics of `name`, if it has been observed.
    pub fn stat(&self, name: &str) -> Option<&RunningStat> {
        self.index.get(name).map(|&i| &self.stats[i].1)
    }

    /// Shorthand for the relative standard deviation of `name`.
    pub fn relative_standard_deviation(&self, name: &str) -> Option<f64> {
        self.stat(name).map(|s| s.relative_standard_deviation())
    }

    /// Iterate over `(name, stat)` in first-observation order.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = (&'a str, &'a RunningStat)> + 'a {
        self.stats.iter().map(|&(ref name, ref stat)| (name.as_str(), stat))
    }

    /// Number of metrics observed.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Has nothing been observed?
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Forget every metric, starting a fresh accumulation window.
    pub fn reset(&mut self) {
        self.index.clear();
        self.stats.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use quickcheck::{QuickCheck, TestResult};

    fn sample(name: &str, m: Measurement) -> MeasurementSet {
        let mut set = MeasurementSet::new();
        set.insert(name, m);
        set
    }

    #[test]
    fn integer_mean_min_max() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("A", Measurement::new(5i64, "cycles")));
        acc.observe(&sample("A", Measurement::new(7i64, "cycles")));

        let stat = acc.stat("A").unwrap();
        assert_eq!(2, stat.count());
        assert_eq!(Value::Integer(6), stat.mean());
        assert_eq!(Value::Integer(5), stat.min());
        assert_eq!(Value::Integer(7), stat.max());
        assert_eq!(Value::Integer(1), stat.variance());
        assert!(!stat.mean().is_floating_point());
    }

    #[test]
    fn integer_mean_truncates() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("A", Measurement::new(1i64, "")));
        acc.observe(&sample("A", Measurement::new(2i64, "")));

        assert_eq!(Value::Integer(1), acc.stat("A").unwrap().mean());
    }

    #[test]
    fn large_counts_keep_a_non_negative_variance() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("CPU cycles", Measurement::new(1_000_000_000i64, "cycles")));
        acc.observe(&sample("CPU cycles", Measurement::new(7_000_000_000i64, "cycles")));

        let stat = acc.stat("CPU cycles").unwrap();
        assert_eq!(Value::Integer(4_000_000_000), stat.mean());
        assert_eq!(9.0e18, stat.variance().as_f64());
        assert!((stat.relative_standard_deviation() - 75.0).abs() < 1e-9);

        acc.observe(&sample("CPU cycles", Measurement::new(4_000_000_000i64, "cycles")));
        let stat = acc.stat("CPU cycles").unwrap();
        assert!(stat.variance().as_f64() >= 0.0);
        assert!(stat.relative_standard_deviation().is_finite());
    }

    #[test]
    fn floating_variance_and_rsd() {
        let mut acc = StatisticsAccumulator::new();
        for x in &[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            acc.observe(&sample("x", Measurement::new(*x, "us")));
        }
        let stat = acc.stat("x").unwrap();

        assert_eq!(8, stat.count());
        assert!((stat.mean().as_f64() - 5.0).abs() < 1e-12);
        assert!((stat.variance().as_f64() - 4.0).abs() < 1e-12);
        assert!((stat.relative_standard_deviation() - 40.0).abs() < 1e-9);
        assert_eq!(Some(stat.relative_standard_deviation()), acc.relative_standard_deviation("x"));
    }

    #[test]
    fn single_sample_has_zero_variance() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("x", Measurement::new(3.5, "")));
        let stat = acc.stat("x").unwrap();

        assert_eq!(Value::Floating(0.0), stat.variance());
        assert_eq!(0.0, stat.relative_standard_deviation());
    }

    #[test]
    fn zero_mean_rsd_is_not_finite() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("x", Measurement::new(0i64, "")));
        acc.observe(&sample("x", Measurement::new(0i64, "")));

        assert!(!acc.relative_standard_deviation("x").unwrap().is_finite());
    }

    #[test]
    fn raw_data_merges_in_observation_order() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("A", Measurement::new(5i64, "cycles")));
        acc.observe(&sample(
            "A",
            Measurement::with_raw_data(7i64, "cycles", vec!["3".to_string(), "4".to_string()]),
        ));

        let expected = vec!["5".to_string(), "3".to_string(), "4".to_string()];
        assert_eq!(expected.as_slice(), acc.stat("A").unwrap().raw_data());

        let report = acc.report();
        assert_eq!(expected.as_slice(), report.get("A").unwrap().raw_data());
        assert_eq!("cycles", report.get("A").unwrap().unit());
    }

    #[test]
    fn absent_metric_is_unchanged() {
        let mut acc = StatisticsAccumulator::new();
        let mut both = MeasurementSet::new();
        both.insert("A", Measurement::new(10i64, ""));
        both.insert("B", Measurement::new(20i64, ""));
        acc.observe(&both);
        acc.observe(&sample("A", Measurement::new(30i64, "")));

        let b = acc.stat("B").unwrap();
        assert_eq!(1, b.count());
        assert_eq!(Value::Integer(20), b.mean());
        assert_eq!(2, acc.stat("A").unwrap().count());
    }

    #[test]
    fn empty_set_is_a_no_op() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&MeasurementSet::new());
        assert!(acc.is_empty());
        assert!(acc.report().is_empty());

        acc.observe(&sample("A", Measurement::new(1i64, "")));
        acc.observe(&MeasurementSet::new());
        assert_eq!(1, acc.stat("A").unwrap().count());
    }

    #[test]
    fn report_keeps_first_observation_order() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("b", Measurement::new(1i64, "")));
        acc.observe(&sample("a", Measurement::new(1i64, "")));
        acc.observe(&sample("b", Measurement::new(3i64, "")));

        let report = acc.report();
        assert_eq!(vec!["b", "a"], report.names());
        assert_eq!(Value::Integer(2), report.get("b").unwrap().value());
        assert_eq!(vec!["b", "a"], acc.iter().map(|(n, _)| n).collect::<Vec<_>>());
    }

    #[test]
    fn reset_starts_a_fresh_window() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("A", Measurement::new(5i64, "")));
        acc.reset();

        assert!(acc.report().get("A").is_none());
        assert!(acc.stat("A").is_none());
        assert_eq!(0, acc.len());

        acc.observe(&sample("A", Measurement::new(9i64, "")));
        let stat = acc.stat("A").unwrap();
        assert_eq!(1, stat.count());
        assert_eq!(Value::Integer(9), stat.min());
        assert_eq!(vec!["9".to_string()].as_slice(), stat.raw_data());
    }

    #[test]
    fn non_finite_ratios_propagate() {
        let mut acc = StatisticsAccumulator::new();
        acc.observe(&sample("r", Measurement::new(0.5, "")));
        acc.observe(&sample("r", Measurement::new(::std::f64::NAN, "")));

        let stat = acc.stat("r").unwrap();
        assert_eq!(2, stat.count());
        assert!(stat.mean().as_f64().is_nan());
        assert_eq!(Value::Floating(0.5), stat.min());
        assert!(stat.max().as_f64().is_nan());
    }

    #[test]
    fn leading_nan_does_not_pin_the_minimum() {
        let mut acc = StatisticsAccumulator::new();
        for x in &[::std::f64::NAN, 0.25, 0.75] {
            acc.observe(&sample("r", Measurement::new(*x, "")));
        }

        let stat = acc.stat("r").unwrap();
        assert_eq!(Value::Floating(0.25), stat.min());
        assert!(stat.max().as_f64().is_nan());
    }

    #[test]
    fn floating_mean_matches_arithmetic_mean() {
        fn inner(xs: Vec<f64>) -> TestResult {
            if xs.is_empty() || xs.iter().any(|x| !x.is_finite()) {
                return TestResult::discard();
            }
            let mut acc = StatisticsAccumulator::new();
            for x in &xs {
                acc.observe(&sample("m", Measurement::new(*x, "")));
            }
            let expected = xs.iter().sum::<f64>() / xs.len() as f64;
            let stat = acc.stat("m").unwrap();

            assert_eq!(xs.len(), stat.count());
            let scale = xs.iter().fold(1.0f64, |acc, x| acc.max(x.abs()));
            assert!(
                (stat.mean().as_f64() - expected).abs() <= 1e-9 * scale,
                "mean {} expected {}",
                stat.mean(),
                expected
            );
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<f64>) -> TestResult);
    }

    #[test]
    fn min_max_match_observed_extremes() {
        fn inner(xs: Vec<i64>) -> TestResult {
            if xs.is_empty() {
                return TestResult::discard();
            }
            let mut acc = StatisticsAccumulator::new();
            for x in &xs {
                acc.observe(&sample("m", Measurement::new(*x, "")));
            }
            let stat = acc.stat("m").unwrap();

            assert_eq!(Value::Integer(*xs.iter().min().unwrap()), stat.min());
            assert_eq!(Value::Integer(*xs.iter().max().unwrap()), stat.max());
            assert_eq!(xs.len(), stat.raw_data().len());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<i64>) -> TestResult);
    }

    #[test]
    fn floating_min_max_with_nan() {
        fn inner(xs: Vec<f64>, nan_at: usize) -> TestResult {
            let mut xs: Vec<f64> = xs.into_iter().filter(|x| !x.is_nan()).collect();
            let at = nan_at % (xs.len() + 1);
            xs.insert(at, ::std::f64::NAN);

            let mut acc = StatisticsAccumulator::new();
            for x in &xs {
                acc.observe(&sample("m", Measurement::new(*x, "")));
            }
            let stat = acc.stat("m").unwrap();

            let numbers: Vec<f64> = xs.iter().cloned().filter(|x| !x.is_nan()).collect();
            if numbers.is_empty() {
                assert!(stat.min().as_f64().is_nan());
            } else {
                let least = numbers.iter().cloned().fold(::std::f64::INFINITY, f64::min);
                assert_eq!(Value::Floating(least), stat.min());
            }
            assert!(stat.max().as_f64().is_nan());
            assert_eq!(xs.len(), stat.count());
            TestResult::passed()
        }
        QuickCheck::new()
            .tests(1000)
            .max_tests(10000)
            .quickcheck(inner as fn(Vec<f64>, usize) -> TestResult);
    }
}
