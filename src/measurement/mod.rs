//! The measurement model: a numeric `Value`, a named and unit-tagged
//! `Measurement` around it, and the `MeasurementSet` one sampling pass emits.

mod value;

pub use self::value::Value;

use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;
use std::slice;
use std::vec;

/// One unit-tagged observation with a provenance trail.
///
/// `raw_data` records the literal source readings this measurement was
/// produced from. When the producer has none to offer it holds the
/// rendering of the value itself.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    value: Value,
    unit: String,
    raw_data: Vec<String>,
}

impl Measurement {
    /// Create a Measurement whose provenance is its own value.
    pub fn new<V, S>(value: V, unit: S) -> Measurement
    where
        V: Into<Value>,
        S: Into<String>,
    {
        Measurement::with_raw_data(value, unit, Vec::new())
    }

    /// Create a Measurement from explicit raw source values.
    ///
    /// An empty `raw_data` behaves as `Measurement::new`.
    pub fn with_raw_data<V, S>(value: V, unit: S, raw_data: Vec<String>) -> Measurement
    where
        V: Into<Value>,
        S: Into<String>,
    {
        let value = value.into();
        let raw_data = if raw_data.is_empty() {
            vec![value.to_string()]
        } else {
            raw_data
        };
        Measurement {
            value: value,
            unit: unit.into(),
            raw_data: raw_data,
        }
    }

    /// The unit of the measurement, possibly empty for ratios.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The raw readings this measurement was built from, in order.
    pub fn raw_data(&self) -> &[String] {
        &self.raw_data
    }

    /// The measured value.
    pub fn value(&self) -> Value {
        self.value
    }
}

// Measurements compare by value alone. Unit and provenance are ignored.
impl PartialEq for Measurement {
    fn eq(&self, other: &Measurement) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for Measurement {
    fn partial_cmp(&self, other: &Measurement) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// The named measurements produced by one sampling pass.
///
/// Names are unique and iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSet {
    entries: Vec<(String, Measurement)>,
}

impl MeasurementSet {
    /// Create an empty MeasurementSet.
    pub fn new() -> MeasurementSet {
        MeasurementSet::default()
    }

    /// Insert a measurement under `name`.
    ///
    /// Re-inserting an existing name replaces its measurement in place and
    /// returns the previous one; the name keeps its original position.
    pub fn insert<S>(&mut self, name: S, measurement: Measurement) -> Option<Measurement>
    where
        S: Into<String>,
    {
        let name = name.into();
        if let Some(slot) = self.entries.iter_mut().find(|e| e.0 == name) {
            return Some(::std::mem::replace(&mut slot.1, measurement));
        }
        self.entries.push((name, measurement));
        None
    }

    /// Look up a measurement by name.
    pub fn get(&self, name: &str) -> Option<&Measurement> {
        self.entries.iter().find(|e| e.0 == name).map(|e| &e.1)
    }

    /// The metric names, in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.0.as_str()).collect()
    }

    /// Iterate over `(name, measurement)` in insertion order.
    pub fn iter(&self) -> Iter {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// The number of metrics in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Does the set hold no metrics?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Borrowing iterator over a `MeasurementSet`.
pub struct Iter<'a> {
    inner: slice::Iter<'a, (String, Measurement)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Measurement);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (e.0.as_str(), &e.1))
    }
}

impl<'a> IntoIterator for &'a MeasurementSet {
    type Item = (&'a str, &'a Measurement);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl IntoIterator for MeasurementSet {
    type Item = (String, Measurement);
    type IntoIter = vec::IntoIter<(String, Measurement)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<S> FromIterator<(S, Measurement)> for MeasurementSet
where
    S: Into<String>,
{
    fn from_iter<I>(iter: I) -> MeasurementSet
    where
        I: IntoIterator<Item = (S, Measurement)>,
    {
        let mut set = MeasurementSet::new();
        for (name, measurement) in iter {
            set.insert(name, measurement);
        }
        set
    }
}
