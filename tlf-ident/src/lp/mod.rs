// SPDX-License-Identifier: Apache-2.0

//! Linear-programming oracle interface and backends.
//!
//! A model has a fixed number of columns, all with a lower bound of zero.
//! Rows are added one at a time as dense coefficient vectors, and a single
//! linear objective is minimized. Columns may be marked integer, in which case
//! the backend must return an integral optimum.
//!
//! Backend resources are owned by the oracle value and released when it is
//! dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod simplex;
#[cfg(any(feature = "with-z3-system", feature = "with-z3-built"))]
pub mod z3_backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintSense {
    /// `a . x >= rhs`
    Ge,
    /// `a . x <= rhs`
    Le,
    /// `a . x == rhs`
    Eq,
}

impl fmt::Display for ConstraintSense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintSense::Ge => ">=",
            ConstraintSense::Le => "<=",
            ConstraintSense::Eq => "=",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The backend stopped at a configured limit before proving an outcome.
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LpError {
    /// The backend could not allocate a model.
    Allocation(String),
    /// A column or row was rejected while building the model.
    ModelBuild(String),
    /// The backend failed while solving.
    Internal(String),
    /// Values were requested without a preceding optimal solve.
    NoSolution,
}

impl LpError {
    /// Whether this error means the backend was misconfigured or misused, as
    /// opposed to failing on one particular model.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LpError::Allocation(_) | LpError::ModelBuild(_) | LpError::NoSolution
        )
    }
}

impl fmt::Display for LpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LpError::Allocation(msg) => write!(f, "LP allocation failed: {}", msg),
            LpError::ModelBuild(msg) => write!(f, "LP model build failed: {}", msg),
            LpError::Internal(msg) => write!(f, "LP solver error: {}", msg),
            LpError::NoSolution => write!(f, "LP values requested without an optimal solve"),
        }
    }
}

impl std::error::Error for LpError {}

/// How much a backend reports through the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verbosity {
    Quiet,
    #[default]
    Important,
    Detailed,
}

pub trait LpOracle: Sized {
    type Config: Send + Sync;

    /// Whether independent instances may solve concurrently on different
    /// threads. Callers serialize use of non-reentrant backends.
    const REENTRANT: bool;

    /// Allocates an empty model over `num_cols` non-negative columns.
    fn new(config: &Self::Config, num_cols: usize) -> Result<Self, LpError>;

    fn num_cols(&self) -> usize;

    /// Names a column for diagnostics.
    fn set_col_name(&mut self, col: usize, name: &str) -> Result<(), LpError>;

    fn set_int(&mut self, col: usize, is_int: bool) -> Result<(), LpError>;

    /// Adds `coeffs . x (sense) rhs`; `coeffs` has one entry per column.
    fn add_constraint(
        &mut self,
        coeffs: &[f64],
        sense: ConstraintSense,
        rhs: f64,
    ) -> Result<(), LpError>;

    /// Sets the objective to minimize `coeffs . x`.
    fn set_minimize(&mut self, coeffs: &[f64]) -> Result<(), LpError>;

    fn solve(&mut self) -> Result<SolveStatus, LpError>;

    /// Column values of the last optimal solution.
    fn variables(&self) -> Result<Vec<f64>, LpError>;
}

/// Validates a dense coefficient vector against the model width.
pub(crate) fn check_coeffs(coeffs: &[f64], num_cols: usize, what: &str) -> Result<(), LpError> {
    if coeffs.len() != num_cols {
        return Err(LpError::ModelBuild(format!(
            "{} has {} coefficients for {} columns",
            what,
            coeffs.len(),
            num_cols
        )));
    }
    if let Some(bad) = coeffs.iter().find(|c| !c.is_finite()) {
        return Err(LpError::ModelBuild(format!(
            "{} has non-finite coefficient {}",
            what, bad
        )));
    }
    Ok(())
}

pub(crate) fn check_col(col: usize, num_cols: usize) -> Result<(), LpError> {
    if col >= num_cols {
        return Err(LpError::ModelBuild(format!(
            "column {} out of range for {} columns",
            col, num_cols
        )));
    }
    Ok(())
}
