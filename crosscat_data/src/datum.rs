use serde::{Deserialize, Serialize};
use std::convert::{From, TryFrom};
use std::hash::Hash;
use thiserror::Error;

/// A single cell value
///
/// Categorical values are stored by their integer code. Translating codes to
/// and from raw values is the job of the codebook.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialOrd)]
#[serde(rename_all = "snake_case")]
pub enum Datum {
    Continuous(f64),
    Categorical(u32),
    Missing,
}

/// Describes an error converting from a Datum to another type
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DatumConversionError {
    /// Tried to convert Continuous into a type other than f64
    #[error("tried to convert Continuous into a type other than f64")]
    InvalidTypeRequestedFromContinuous,
    /// Tried to convert Categorical into a type other than u32
    #[error("tried to convert Categorical into a type other than u32")]
    InvalidTypeRequestedFromCategorical,
    /// Cannot convert Missing into a value of any type
    #[error("cannot convert Missing into a value of any type")]
    CannotConvertMissing,
}

fn hash_float<H: std::hash::Hasher>(float: f64, state: &mut H) {
    // Note that IEEE 754 doesn’t define just a single NaN value, and that
    // 0.0 == -0.0
    let x: f64 = if float.is_nan() {
        f64::NAN
    } else if float == 0.0 {
        0.0
    } else {
        float
    };

    x.to_bits().hash(state);
}

impl Hash for Datum {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Self::Continuous(x) => hash_float(*x, state),
            Self::Categorical(x) => x.hash(state),
            Self::Missing => hash_float(f64::NAN, state),
        }
    }
}

// PartialEq and Hash must agree with each other.
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Continuous(x), Self::Continuous(y)) => {
                (x.is_nan() && y.is_nan()) || x == y
            }
            (Self::Categorical(x), Self::Categorical(y)) => x == y,
            (Self::Missing, Self::Missing) => true,
            _ => false,
        }
    }
}

// NaN equals NaN above, so equality is reflexive
impl Eq for Datum {}

macro_rules! impl_try_from_datum {
    ($out: ty, $pat_in: path, $err: expr) => {
        impl TryFrom<Datum> for $out {
            type Error = DatumConversionError;

            fn try_from(datum: Datum) -> Result<$out, Self::Error> {
                match datum {
                    $pat_in(x) => Ok(x),
                    Datum::Missing => {
                        Err(DatumConversionError::CannotConvertMissing)
                    }
                    _ => Err($err),
                }
            }
        }
    };
}

impl_try_from_datum!(
    f64,
    Datum::Continuous,
    DatumConversionError::InvalidTypeRequestedFromContinuous
);

impl_try_from_datum!(
    u32,
    Datum::Categorical,
    DatumConversionError::InvalidTypeRequestedFromCategorical
);

impl From<f64> for Datum {
    fn from(x: f64) -> Self {
        Datum::Continuous(x)
    }
}

impl From<u32> for Datum {
    fn from(x: u32) -> Self {
        Datum::Categorical(x)
    }
}

impl Datum {
    /// Interpret a table cell. `NaN` is missing; categorical cells hold
    /// their code as a real.
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat_data::Datum;
    /// assert_eq!(Datum::from_cell(1.5, false), Datum::Continuous(1.5));
    /// assert_eq!(Datum::from_cell(2.0, true), Datum::Categorical(2));
    /// assert_eq!(Datum::from_cell(f64::NAN, true), Datum::Missing);
    /// ```
    pub fn from_cell(x: f64, categorical: bool) -> Self {
        if x.is_nan() {
            Datum::Missing
        } else if categorical {
            Datum::Categorical(x as u32)
        } else {
            Datum::Continuous(x)
        }
    }

    /// The table-cell encoding of the datum. The inverse of `from_cell`.
    pub fn to_cell(&self) -> f64 {
        match self {
            Datum::Continuous(x) => *x,
            Datum::Categorical(x) => f64::from(*x),
            Datum::Missing => f64::NAN,
        }
    }

    /// Unwraps the datum as an `f64` if possible, coercing categorical
    /// codes.
    ///
    /// # Example
    ///
    /// ```
    /// # use crosscat_data::Datum;
    /// assert_eq!(Datum::Continuous(1.2).to_f64_opt(), Some(1.2));
    /// assert_eq!(Datum::Categorical(8).to_f64_opt(), Some(8.0));
    /// assert_eq!(Datum::Missing.to_f64_opt(), None);
    /// ```
    pub fn to_f64_opt(&self) -> Option<f64> {
        match self {
            Datum::Continuous(x) => Some(*x),
            Datum::Categorical(x) => Some(f64::from(*x)),
            Datum::Missing => None,
        }
    }

    /// Unwraps the datum as a categorical code if it is one
    pub fn to_u32_opt(&self) -> Option<u32> {
        match self {
            Datum::Categorical(x) => Some(*x),
            _ => None,
        }
    }

    /// Returns `true` if the `Datum` is continuous
    pub fn is_continuous(&self) -> bool {
        matches!(self, Datum::Continuous(_))
    }

    /// Returns `true` if the `Datum` is categorical
    pub fn is_categorical(&self) -> bool {
        matches!(self, Datum::Categorical(_))
    }

    /// Returns `true` if the `Datum` is missing
    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing)
    }
}
