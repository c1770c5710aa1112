// SPDX-License-Identifier: Apache-2.0

//! Threshold logic function identification.
//!
//! Given a complete truth table, decides whether the function is a threshold
//! function, i.e. whether there are integer weights `w` and a threshold `T`
//! with
//!
//! ```text
//! f(x_0, ..., x_{n-1}) = 1  iff  w_0 x_0 + ... + w_{n-1} x_{n-1} >= T
//! ```
//!
//! and if so produces such a linear form `[w_0, ..., w_{n-1}; T]`.
//!
//! Identification runs in three steps:
//!
//! 1. Normalize: every variable must be unate; negative unate variables are
//!    complemented so the working table is monotone increasing.
//! 2. Solve: an integer program over non-negative `w_j` and `T` asks for every
//!    on-set assignment to reach `T` and every off-set assignment to stay at
//!    or below `T - 1`.
//! 3. Unflip: complemented variables get their weight negated and folded into
//!    the threshold.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::linear_form::LinearForm;
use crate::lp::simplex::{SimplexConfig, SimplexOracle};
use crate::lp::{ConstraintSense, LpError, LpOracle, SolveStatus};
use crate::normalize::{normalize, Normalization};
use crate::truth_table::{CompleteTruthTable, TruthTable, TruthTableError};

/// Serializes oracle use for backends that are not reentrant.
static ORACLE_LOCK: Mutex<()> = Mutex::new(());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifyOptions {
    /// Verify every produced linear form against the input table.
    pub check_linear_form: bool,
}

impl Default for IdentifyOptions {
    fn default() -> Self {
        Self {
            check_linear_form: true,
        }
    }
}

/// Why a function was found not to be a threshold function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The function is binate in `var`.
    Binate { var: usize },
    /// The integer program has no solution.
    Infeasible,
    /// The oracle could not settle the integer program.
    SolverFailure(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Binate { var } => write!(f, "binate in variable {}", var),
            Rejection::Infeasible => write!(f, "no separating linear form"),
            Rejection::SolverFailure(msg) => write!(f, "solver failure: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identification {
    Threshold(LinearForm),
    NotThreshold(Rejection),
}

impl Identification {
    pub fn is_threshold(&self) -> bool {
        matches!(self, Identification::Threshold(_))
    }

    pub fn linear_form(&self) -> Option<&LinearForm> {
        match self {
            Identification::Threshold(form) => Some(form),
            Identification::NotThreshold(_) => None,
        }
    }
}

/// Failures that are not a valid answer to "is this a threshold function".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifyError {
    MalformedTable(TruthTableError),
    /// The oracle could not be allocated or rejected the model.
    Oracle(LpError),
    /// The oracle produced a form that does not compute the input function.
    UnsoundLinearForm { form: LinearForm },
    TimedOut(Duration),
}

impl fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifyError::MalformedTable(e) => write!(f, "malformed truth table: {}", e),
            IdentifyError::Oracle(e) => write!(f, "oracle failure: {}", e),
            IdentifyError::UnsoundLinearForm { form } => write!(
                f,
                "oracle produced linear form {} that does not realize the function",
                form
            ),
            IdentifyError::TimedOut(d) => write!(f, "identification timed out after {:?}", d),
        }
    }
}

impl std::error::Error for IdentifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IdentifyError::MalformedTable(e) => Some(e),
            IdentifyError::Oracle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TruthTableError> for IdentifyError {
    fn from(e: TruthTableError) -> Self {
        IdentifyError::MalformedTable(e)
    }
}

/// Builds the integer program for a table that is monotone increasing in
/// every variable.
///
/// Columns `0..n` are the weights `w_j`, column `n` is the threshold `T`.
pub fn build_model<O: LpOracle>(table: &TruthTable, config: &O::Config) -> Result<O, LpError> {
    let num_vars = table.num_vars();
    let num_cols = num_vars + 1;
    let mut lp = O::new(config, num_cols)?;

    for j in 0..num_vars {
        lp.set_col_name(j, &format!("w_{}", j))?;
    }
    lp.set_col_name(num_vars, "T")?;
    for col in 0..num_cols {
        lp.set_int(col, true)?;
    }

    let mut row = vec![0.0f64; num_cols];
    for col in 0..num_cols {
        row.iter_mut().for_each(|c| *c = 0.0);
        row[col] = 1.0;
        lp.add_constraint(&row, ConstraintSense::Ge, 0.0)?;
    }

    for assignment in 0..table.num_bits() {
        for (j, c) in row[..num_vars].iter_mut().enumerate() {
            *c = if (assignment >> j) & 1 == 1 { 1.0 } else { 0.0 };
        }
        row[num_vars] = -1.0;
        if table.get_bit(assignment) {
            lp.add_constraint(&row, ConstraintSense::Ge, 0.0)?;
        } else {
            lp.add_constraint(&row, ConstraintSense::Le, -1.0)?;
        }
    }

    lp.set_minimize(&vec![1.0; num_cols])?;
    Ok(lp)
}

/// Tolerance for accepting an oracle value as an integer.
const INTEGRALITY_TOLERANCE: f64 = 1e-6;

fn round_solution(values: &[f64]) -> Option<Vec<i64>> {
    values
        .iter()
        .map(|v| {
            let r = v.round();
            let in_range = r.is_finite() && r.abs() < i64::MAX as f64;
            if in_range && (v - r).abs() <= INTEGRALITY_TOLERANCE {
                Some(r as i64)
            } else {
                None
            }
        })
        .collect()
}

/// Finds a linear form for a table that is monotone increasing in every
/// variable.
///
/// Oracle allocation and model-build failures are returned as errors; every
/// other way the oracle can fail to produce a solution is a rejection.
pub fn solve_normalized<O: LpOracle>(
    table: &TruthTable,
    config: &O::Config,
) -> Result<Result<LinearForm, Rejection>, LpError> {
    let _guard = if O::REENTRANT {
        None
    } else {
        Some(ORACLE_LOCK.lock().unwrap_or_else(|e| e.into_inner()))
    };

    let mut lp: O = build_model(table, config)?;
    let status = match lp.solve() {
        Ok(status) => status,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            log::warn!("threshold: oracle error treated as rejection: {}", e);
            return Ok(Err(Rejection::SolverFailure(e.to_string())));
        }
    };
    log::debug!(
        "threshold: {} variables, oracle status {:?}",
        table.num_vars(),
        status
    );
    match status {
        SolveStatus::Optimal => {}
        SolveStatus::Infeasible => return Ok(Err(Rejection::Infeasible)),
        SolveStatus::Unbounded | SolveStatus::Incomplete => {
            return Ok(Err(Rejection::SolverFailure(format!(
                "oracle status {:?}",
                status
            ))))
        }
    }

    let values = match lp.variables() {
        Ok(values) => values,
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => {
            log::warn!("threshold: oracle readback treated as rejection: {}", e);
            return Ok(Err(Rejection::SolverFailure(e.to_string())));
        }
    };
    let form = match round_solution(&values) {
        Some(values) => LinearForm::from_vec(values),
        None => {
            return Ok(Err(Rejection::SolverFailure(format!(
                "non-integral oracle values {:?}",
                values
            ))))
        }
    };
    match form {
        Some(form) => Ok(Ok(form)),
        None => Ok(Err(Rejection::SolverFailure(
            "oracle returned no column values".to_string(),
        ))),
    }
}

/// Identifies `table` with an explicit oracle backend.
pub fn identify<O, T>(
    table: &T,
    config: &O::Config,
    options: &IdentifyOptions,
) -> Result<Identification, IdentifyError>
where
    O: LpOracle,
    T: CompleteTruthTable + ?Sized,
{
    let original = TruthTable::from_view(table)?;

    let (normalized, flips) = match normalize(&original) {
        Normalization::Unate { table, flips } => (table, flips),
        Normalization::Binate { var } => {
            return Ok(Identification::NotThreshold(Rejection::Binate { var }))
        }
    };

    let form = match solve_normalized::<O>(&normalized, config).map_err(IdentifyError::Oracle)? {
        Ok(form) => form.unflip(&flips),
        Err(rejection) => return Ok(Identification::NotThreshold(rejection)),
    };

    if options.check_linear_form && !form.realizes(&original) {
        return Err(IdentifyError::UnsoundLinearForm { form });
    }
    log::debug!("threshold: {} realized by {}", original, form);
    Ok(Identification::Threshold(form))
}

/// Decides whether `table` is a threshold function using `O`.
///
/// On a positive answer, `linear_form` (if given) receives
/// `[w_0, ..., w_{n-1}, T]`; otherwise it is left untouched.
pub fn is_threshold_with<O, T>(
    table: &T,
    config: &O::Config,
    linear_form: Option<&mut Vec<i64>>,
) -> Result<bool, IdentifyError>
where
    O: LpOracle,
    T: CompleteTruthTable + ?Sized,
{
    match identify::<O, T>(table, config, &IdentifyOptions::default())? {
        Identification::Threshold(form) => {
            if let Some(out) = linear_form {
                *out = form.to_vec();
            }
            Ok(true)
        }
        Identification::NotThreshold(_) => Ok(false),
    }
}

/// Decides whether `table` is a threshold function using the in-process
/// simplex oracle with its default configuration.
pub fn is_threshold<T>(table: &T, linear_form: Option<&mut Vec<i64>>) -> Result<bool, IdentifyError>
where
    T: CompleteTruthTable + ?Sized,
{
    is_threshold_with::<SimplexOracle, T>(table, &SimplexConfig::default(), linear_form)
}

/// Runs [`identify`] on a worker thread and abandons it after `timeout`.
///
/// An abandoned worker keeps running until its oracle returns; its result is
/// discarded.
pub fn identify_with_timeout<O>(
    table: TruthTable,
    config: O::Config,
    options: IdentifyOptions,
    timeout: Duration,
) -> Result<Identification, IdentifyError>
where
    O: LpOracle + 'static,
    O::Config: 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("tlf-identify".to_string())
        .spawn(move || {
            let _ = tx.send(identify::<O, _>(&table, &config, &options));
        })
        .map_err(|e| IdentifyError::Oracle(LpError::Allocation(e.to_string())))?;
    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(IdentifyError::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(IdentifyError::Oracle(LpError::Internal(
            "identification worker exited without a result".to_string(),
        ))),
    }
}
