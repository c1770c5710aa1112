// SPDX-License-Identifier: Apache-2.0

//! Selects the LP oracle backend from the command line or the config file.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OracleChoice {
    /// In-process exact simplex with branch-and-bound.
    #[default]
    Simplex,

    #[cfg(feature = "has-z3")]
    Z3,
}

impl OracleChoice {
    pub fn all() -> &'static [OracleChoice] {
        &[
            OracleChoice::Simplex,
            #[cfg(feature = "has-z3")]
            OracleChoice::Z3,
        ]
    }
}

impl fmt::Display for OracleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OracleChoice::Simplex => "simplex",
            #[cfg(feature = "has-z3")]
            OracleChoice::Z3 => "z3",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for OracleChoice {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simplex" => Ok(Self::Simplex),
            #[cfg(feature = "has-z3")]
            "z3" => Ok(Self::Z3),
            _ => Err(format!("invalid oracle: {}", s)),
        }
    }
}
