//! The fixed set of nomenclature dimensions.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// One of the controlled-vocabulary axes a nomenclature can define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Model,
    Scenario,
    Variable,
    Region,
    Subannual,
}

impl Dimension {
    /// All dimensions in canonical order.
    pub const ALL: [Dimension; 5] = [
        Dimension::Model,
        Dimension::Scenario,
        Dimension::Variable,
        Dimension::Region,
        Dimension::Subannual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Dimension::Model => "model",
            Dimension::Scenario => "scenario",
            Dimension::Variable => "variable",
            Dimension::Region => "region",
            Dimension::Subannual => "subannual",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dimension::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == s)
            .ok_or_else(|| Error::InvalidDimension {
                value: s.to_string(),
            })
    }
}
