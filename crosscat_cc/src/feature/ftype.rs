use crosscat_codebook::ColType;
use crosscat_data::Datum;
use serde::{Deserialize, Serialize};

/// Feature type
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FType {
    Continuous,
    Categorical,
}

impl std::fmt::Display for FType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Continuous => write!(f, "Continuous"),
            Self::Categorical => write!(f, "Categorical"),
        }
    }
}

impl From<&ColType> for FType {
    fn from(coltype: &ColType) -> Self {
        match coltype {
            ColType::Continuous => FType::Continuous,
            ColType::Categorical { .. } => FType::Categorical,
        }
    }
}

impl FType {
    /// Whether `datum` can be stored in a feature of this type. `Missing`
    /// is compatible with every type.
    pub fn datum_compatible(&self, datum: &Datum) -> bool {
        match datum {
            Datum::Missing => true,
            Datum::Continuous(_) => *self == FType::Continuous,
            Datum::Categorical(_) => *self == FType::Categorical,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, FType::Continuous)
    }

    pub fn is_categorical(&self) -> bool {
        matches!(self, FType::Categorical)
    }
}
