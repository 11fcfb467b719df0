use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub, SubAssign};

/// The numeric payload of a measurement.
///
/// Raw hardware counts are carried as `Integer`, derived figures such as
/// ratios as `Floating`. The discriminant is fixed at construction. Binary
/// operations are defined for matching discriminants; when the two sides
/// disagree the integer side is promoted and the result is `Floating`.
/// Integer arithmetic whose result does not fit in an `i64` is likewise
/// carried out in floating point.
///
/// Values are totally ordered. NaN compares equal to NaN and above every
/// number, and the two zeros compare equal.
#[derive(Debug, Clone, Copy)]
pub enum Value {
    /// A 64-bit floating point payload.
    Floating(f64),
    /// A 64-bit signed integer payload.
    Integer(i64),
}

impl Value {
    /// Is the payload floating point?
    pub fn is_floating_point(&self) -> bool {
        match *self {
            Value::Floating(_) => true,
            Value::Integer(_) => false,
        }
    }

    /// The payload widened to `f64`.
    ///
    /// Integers beyond 2^53 lose precision.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::Floating(x) => x,
            Value::Integer(x) => x as f64,
        }
    }

    /// Integers are always finite. Floating payloads produced by a zero
    /// denominator are not and must be checked before presentation.
    pub fn is_finite(&self) -> bool {
        match *self {
            Value::Floating(x) => x.is_finite(),
            Value::Integer(_) => true,
        }
    }

    /// A zero with the same discriminant as `self`.
    pub fn zero(&self) -> Value {
        match *self {
            Value::Floating(_) => Value::Floating(0.0),
            Value::Integer(_) => Value::Integer(0),
        }
    }

    /// Relative standard deviation of a distribution, as a percentage.
    ///
    /// Computes `100 * sqrt(variance) / mean`. A zero mean yields a
    /// non-finite result which is returned as-is.
    pub fn relative_standard_deviation(variance: Value, mean: Value) -> f64 {
        match (variance, mean) {
            (Value::Integer(v), Value::Integer(m)) => 100.0 * (v as f64).sqrt() / (m as f64),
            (v, m) => 100.0 * v.as_f64().sqrt() / m.as_f64(),
        }
    }
}

macro_rules! arith {
    ($trait:ident, $method:ident, $int_op:ident, $op:tt) => {
        impl $trait for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                match (self, rhs) {
                    (Value::Integer(x), Value::Integer(y)) => match x.$int_op(y) {
                        Some(z) => Value::Integer(z),
                        None => Value::Floating(x as f64 $op y as f64),
                    },
                    (Value::Floating(x), Value::Floating(y)) => Value::Floating(x $op y),
                    (x, y) => Value::Floating(x.as_f64() $op y.as_f64()),
                }
            }
        }
    };
}

arith!(Add, add, checked_add, +);
arith!(Sub, sub, checked_sub, -);
arith!(Mul, mul, checked_mul, *);

/// Division by an integer. Truncates for `Integer`, exact for `Floating`.
///
/// An integer division that has no integer result (a zero divisor, or
/// `i64::MIN / -1`) is carried out in floating point instead, so a zero
/// divisor produces a non-finite `Floating` rather than a panic.
impl Div<i64> for Value {
    type Output = Value;

    fn div(self, rhs: i64) -> Value {
        match self {
            Value::Integer(x) => match x.checked_div(rhs) {
                Some(q) => Value::Integer(q),
                None => Value::Floating(x as f64 / rhs as f64),
            },
            Value::Floating(x) => Value::Floating(x / rhs as f64),
        }
    }
}

impl SubAssign for Value {
    fn sub_assign(&mut self, rhs: Value) {
        *self = *self - rhs;
    }
}

fn cmp_f64(x: f64, y: f64) -> Ordering {
    match x.partial_cmp(&y) {
        Some(order) => order,
        None => x.is_nan().cmp(&y.is_nan()),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (*self, *other) {
            (Value::Integer(x), Value::Integer(y)) => x == y,
            (x, y) => cmp_f64(x.as_f64(), y.as_f64()) == Ordering::Equal,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Value) -> Option<Ordering> {
        Some(match (*self, *other) {
            (Value::Integer(x), Value::Integer(y)) => x.cmp(&y),
            (x, y) => cmp_f64(x.as_f64(), y.as_f64()),
        })
    }
}

/// Floating payloads render with four fractional digits, integers with
/// every digit and no fractional point.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Value::Floating(x) => write!(f, "{:.4}", x),
            Value::Integer(x) => write!(f, "{}", x),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            Value::Floating(x) => serializer.serialize_f64(x),
            Value::Integer(x) => serializer.serialize_i64(x),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Floating(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Floating(f64::from(v))
    }
}

macro_rules! from_lossless_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::Integer(i64::from(v))
                }
            }
        )*
    };
}

from_lossless_integer!(i8, i16, i32, i64, u8, u16, u32);

// Counter hardware reports u64 but never gets near i64::MAX in one interval.
macro_rules! from_wide_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Value {
                    Value::Integer(v as i64)
                }
            }
        )*
    };
}

from_wide_integer!(u64, usize, isize);
