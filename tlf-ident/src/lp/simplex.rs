// SPDX-License-Identifier: Apache-2.0

//! In-process exact simplex backend.
//!
//! The LP relaxation is solved with a dense two-phase tableau simplex over
//! arbitrary-precision rationals. The entering column is the one with the most
//! negative reduced cost until a run of degenerate pivots is seen; from then
//! on both entering and leaving columns follow Bland's rule, which cannot
//! cycle.
//!
//! Integer columns are enforced with best-first branch-and-bound on top of the
//! relaxation: nodes are expanded in order of their relaxation objective, so
//! the first integral node popped is an integral optimum.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use super::{
    check_coeffs, check_col, ConstraintSense, LpError, LpOracle, SolveStatus, Verbosity,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplexConfig {
    pub verbosity: Verbosity,

    /// Branch-and-bound nodes expanded before reporting
    /// `SolveStatus::Incomplete`.
    pub max_branch_nodes: usize,

    /// Pivots allowed for a single LP relaxation.
    pub max_pivots: usize,
}

impl Default for SimplexConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            max_branch_nodes: 10_000,
            max_pivots: 100_000,
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    coeffs: Vec<BigRational>,
    sense: ConstraintSense,
    rhs: BigRational,
}

/// Classification of a row against the implicit `x >= 0` column bounds.
enum RowKind {
    Keep,
    /// Implied by the column bounds.
    Redundant,
    /// Cannot be satisfied by any point.
    Violated,
}

impl Row {
    fn unit(num_cols: usize, col: usize, sense: ConstraintSense, rhs: BigRational) -> Self {
        let mut coeffs = vec![BigRational::zero(); num_cols];
        coeffs[col] = BigRational::one();
        Row { coeffs, sense, rhs }
    }

    fn classify(&self) -> RowKind {
        let mut nonzero = self.coeffs.iter().filter(|c| !c.is_zero());
        let first = nonzero.next();
        let more = nonzero.next().is_some();
        match (first, more) {
            (None, _) => {
                let holds = match self.sense {
                    ConstraintSense::Ge => !self.rhs.is_positive(),
                    ConstraintSense::Le => !self.rhs.is_negative(),
                    ConstraintSense::Eq => self.rhs.is_zero(),
                };
                if holds {
                    RowKind::Redundant
                } else {
                    RowKind::Violated
                }
            }
            // `a x >= b` with a > 0, b <= 0, or `a x <= b` with a < 0, b >= 0.
            (Some(a), false) => {
                let implied = match self.sense {
                    ConstraintSense::Ge => a.is_positive() && !self.rhs.is_positive(),
                    ConstraintSense::Le => a.is_negative() && !self.rhs.is_negative(),
                    ConstraintSense::Eq => false,
                };
                if implied {
                    RowKind::Redundant
                } else {
                    RowKind::Keep
                }
            }
            (Some(_), true) => RowKind::Keep,
        }
    }
}

#[derive(Debug, Clone)]
struct Bound {
    col: usize,
    sense: ConstraintSense,
    value: BigRational,
}

enum Relaxation {
    Optimal {
        values: Vec<BigRational>,
        objective: BigRational,
    },
    Infeasible,
    Unbounded,
    PivotLimit,
}

enum PhaseOutcome {
    Optimal,
    Unbounded,
    PivotLimit,
}

/// Consecutive degenerate pivots tolerated before switching to Bland's rule.
const DEGENERATE_STREAK_LIMIT: usize = 32;

/// Dense tableau; each row holds `width` column entries followed by the
/// right-hand side.
struct Tableau {
    rows: Vec<Vec<BigRational>>,
    basis: Vec<usize>,
    /// Reduced costs, with the negated objective value in the last slot.
    obj: Vec<BigRational>,
    width: usize,
    pivots: usize,
    max_pivots: usize,
    bland: bool,
}

impl Tableau {
    /// Returns the tableau and the index of its first artificial column.
    fn new(num_cols: usize, rows: &[&Row], max_pivots: usize) -> (Tableau, usize) {
        let mut normalized: Vec<(Vec<BigRational>, ConstraintSense, BigRational)> =
            Vec::with_capacity(rows.len());
        for row in rows {
            // Keep every right-hand side non-negative. A zero `>=` row becomes
            // a zero `<=` row so its slack can start in the basis.
            if row.rhs.is_negative() || (row.rhs.is_zero() && row.sense == ConstraintSense::Ge) {
                let sense = match row.sense {
                    ConstraintSense::Ge => ConstraintSense::Le,
                    ConstraintSense::Le => ConstraintSense::Ge,
                    ConstraintSense::Eq => ConstraintSense::Eq,
                };
                normalized.push((row.coeffs.iter().map(|c| -c).collect(), sense, -&row.rhs));
            } else {
                normalized.push((row.coeffs.clone(), row.sense, row.rhs.clone()));
            }
        }

        let num_slack = normalized
            .iter()
            .filter(|(_, sense, _)| *sense != ConstraintSense::Eq)
            .count();
        let num_artificial = normalized
            .iter()
            .filter(|(_, sense, _)| *sense != ConstraintSense::Le)
            .count();
        let first_artificial = num_cols + num_slack;
        let width = first_artificial + num_artificial;

        let mut tableau_rows = Vec::with_capacity(normalized.len());
        let mut basis = Vec::with_capacity(normalized.len());
        let mut next_slack = num_cols;
        let mut next_artificial = first_artificial;
        for (coeffs, sense, rhs) in normalized {
            let mut t = vec![BigRational::zero(); width + 1];
            for (dst, src) in t.iter_mut().zip(coeffs) {
                *dst = src;
            }
            t[width] = rhs;
            match sense {
                ConstraintSense::Le => {
                    t[next_slack] = BigRational::one();
                    basis.push(next_slack);
                    next_slack += 1;
                }
                ConstraintSense::Ge => {
                    t[next_slack] = -BigRational::one();
                    next_slack += 1;
                    t[next_artificial] = BigRational::one();
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                ConstraintSense::Eq => {
                    t[next_artificial] = BigRational::one();
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            tableau_rows.push(t);
        }

        let tableau = Tableau {
            rows: tableau_rows,
            basis,
            obj: vec![BigRational::zero(); width + 1],
            width,
            pivots: 0,
            max_pivots,
            bland: false,
        };
        (tableau, first_artificial)
    }

    /// Prices out the basic columns of `cost` (one entry per column).
    fn set_objective(&mut self, cost: &[BigRational]) {
        self.obj = cost.to_vec();
        self.obj.push(BigRational::zero());
        for (row, &b) in self.rows.iter().zip(self.basis.iter()) {
            let cb = &cost[b];
            if cb.is_zero() {
                continue;
            }
            for (o, v) in self.obj.iter_mut().zip(row.iter()) {
                if !v.is_zero() {
                    *o = &*o - cb * v;
                }
            }
        }
    }

    fn objective_value(&self) -> BigRational {
        -&self.obj[self.width]
    }

    fn pivot(&mut self, r: usize, c: usize) {
        let p = self.rows[r][c].clone();
        let pivot_row: Vec<BigRational> = self.rows[r].iter().map(|v| v / &p).collect();
        for (i, row) in self.rows.iter_mut().enumerate() {
            if i != r {
                eliminate(row, &pivot_row, c);
            }
        }
        eliminate(&mut self.obj, &pivot_row, c);
        self.rows[r] = pivot_row;
        self.basis[r] = c;
    }

    fn entering_column(&self, allowed: usize) -> Option<usize> {
        if self.bland {
            return (0..allowed).find(|&j| self.obj[j].is_negative());
        }
        let mut best: Option<usize> = None;
        for j in 0..allowed {
            if !self.obj[j].is_negative() {
                continue;
            }
            if best.map_or(true, |b| self.obj[j] < self.obj[b]) {
                best = Some(j);
            }
        }
        best
    }

    /// Runs simplex iterations, letting only columns below `allowed` enter.
    fn run(&mut self, allowed: usize) -> PhaseOutcome {
        let mut degenerate_streak = 0usize;
        loop {
            let entering = match self.entering_column(allowed) {
                Some(j) => j,
                None => return PhaseOutcome::Optimal,
            };
            let mut leaving: Option<(usize, BigRational)> = None;
            for (i, row) in self.rows.iter().enumerate() {
                if !row[entering].is_positive() {
                    continue;
                }
                let ratio = &row[self.width] / &row[entering];
                let better = match &leaving {
                    None => true,
                    Some((best, best_ratio)) => {
                        ratio < *best_ratio
                            || (ratio == *best_ratio && self.basis[i] < self.basis[*best])
                    }
                };
                if better {
                    leaving = Some((i, ratio));
                }
            }
            let (r, step) = match leaving {
                Some(l) => l,
                None => return PhaseOutcome::Unbounded,
            };
            if self.pivots >= self.max_pivots {
                return PhaseOutcome::PivotLimit;
            }
            if step.is_zero() {
                degenerate_streak += 1;
                if degenerate_streak > DEGENERATE_STREAK_LIMIT && !self.bland {
                    log::trace!("simplex: switching to Bland's rule");
                    self.bland = true;
                }
            } else {
                degenerate_streak = 0;
            }
            log::trace!("simplex: pivot row {} col {}", r, entering);
            self.pivot(r, entering);
            self.pivots += 1;
        }
    }

    fn column_values(&self, num_cols: usize) -> Vec<BigRational> {
        let mut values = vec![BigRational::zero(); num_cols];
        for (row, &b) in self.rows.iter().zip(self.basis.iter()) {
            if b < num_cols {
                values[b] = row[self.width].clone();
            }
        }
        values
    }
}

fn eliminate(row: &mut [BigRational], pivot_row: &[BigRational], c: usize) {
    let factor = row[c].clone();
    if factor.is_zero() {
        return;
    }
    for (v, p) in row.iter_mut().zip(pivot_row.iter()) {
        if !p.is_zero() {
            *v = &*v - &factor * p;
        }
    }
}

fn to_rational(x: f64, what: &str) -> Result<BigRational, LpError> {
    BigRational::from_float(x)
        .ok_or_else(|| LpError::ModelBuild(format!("{} is not representable: {}", what, x)))
}

fn rational_to_f64(x: &BigRational) -> f64 {
    let numer = x.numer().to_f64().unwrap_or(f64::NAN);
    if x.is_integer() {
        numer
    } else {
        numer / x.denom().to_f64().unwrap_or(f64::NAN)
    }
}

/// Node of the branch-and-bound search: extra column bounds plus the optimum
/// of the relaxation under them.
struct BranchNode {
    bounds: Vec<Bound>,
    values: Vec<BigRational>,
}

pub struct SimplexOracle {
    config: SimplexConfig,
    num_cols: usize,
    col_names: Vec<String>,
    integer: Vec<bool>,
    rows: Vec<Row>,
    objective: Vec<BigRational>,
    solution: Option<Vec<BigRational>>,
}

impl SimplexOracle {
    /// Exact column values of the last optimal solution.
    pub fn exact_variables(&self) -> Option<&[BigRational]> {
        self.solution.as_deref()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    fn col_name(&self, col: usize) -> &str {
        &self.col_names[col]
    }

    fn relax(&self, bounds: &[Bound]) -> Result<Relaxation, LpError> {
        let bound_rows: Vec<Row> = bounds
            .iter()
            .map(|b| Row::unit(self.num_cols, b.col, b.sense, b.value.clone()))
            .collect();
        let mut active: Vec<&Row> = Vec::with_capacity(self.rows.len() + bound_rows.len());
        for row in self.rows.iter().chain(bound_rows.iter()) {
            match row.classify() {
                RowKind::Keep => active.push(row),
                RowKind::Redundant => {}
                RowKind::Violated => return Ok(Relaxation::Infeasible),
            }
        }

        let (mut tableau, first_artificial) =
            Tableau::new(self.num_cols, &active, self.config.max_pivots);

        if first_artificial < tableau.width {
            let mut phase1_cost = vec![BigRational::zero(); tableau.width];
            for c in phase1_cost[first_artificial..].iter_mut() {
                *c = BigRational::one();
            }
            tableau.set_objective(&phase1_cost);
            match tableau.run(tableau.width) {
                PhaseOutcome::Optimal => {}
                PhaseOutcome::PivotLimit => return Ok(Relaxation::PivotLimit),
                PhaseOutcome::Unbounded => {
                    return Err(LpError::Internal(
                        "phase 1 objective reported unbounded".to_string(),
                    ))
                }
            }
            if !tableau.objective_value().is_zero() {
                return Ok(Relaxation::Infeasible);
            }
            // Drive the remaining (zero-valued) artificials out of the basis;
            // rows with no structural or slack entry left are redundant.
            let mut i = 0;
            while i < tableau.rows.len() {
                if tableau.basis[i] < first_artificial {
                    i += 1;
                    continue;
                }
                match (0..first_artificial).find(|&j| !tableau.rows[i][j].is_zero()) {
                    Some(j) => {
                        tableau.pivot(i, j);
                        i += 1;
                    }
                    None => {
                        tableau.rows.remove(i);
                        tableau.basis.remove(i);
                    }
                }
            }
        }

        let mut phase2_cost = vec![BigRational::zero(); tableau.width];
        for (dst, src) in phase2_cost.iter_mut().zip(self.objective.iter()) {
            *dst = src.clone();
        }
        tableau.set_objective(&phase2_cost);
        match tableau.run(first_artificial) {
            PhaseOutcome::Optimal => {}
            PhaseOutcome::PivotLimit => return Ok(Relaxation::PivotLimit),
            PhaseOutcome::Unbounded => return Ok(Relaxation::Unbounded),
        }
        log::trace!(
            "simplex: relaxation optimal after {} pivots over {} rows",
            tableau.pivots,
            tableau.rows.len()
        );
        Ok(Relaxation::Optimal {
            values: tableau.column_values(self.num_cols),
            objective: tableau.objective_value(),
        })
    }

    fn first_fractional(&self, values: &[BigRational]) -> Option<usize> {
        (0..self.num_cols).find(|&col| self.integer[col] && !values[col].is_integer())
    }

    fn branch_and_bound(&mut self) -> Result<SolveStatus, LpError> {
        let mut nodes: Vec<Option<BranchNode>> = Vec::new();
        let mut frontier: BinaryHeap<Reverse<(BigRational, usize)>> = BinaryHeap::new();

        match self.relax(&[])? {
            Relaxation::Optimal { values, objective } => {
                frontier.push(Reverse((objective, nodes.len())));
                nodes.push(Some(BranchNode {
                    bounds: Vec::new(),
                    values,
                }));
            }
            Relaxation::Infeasible => return Ok(SolveStatus::Infeasible),
            Relaxation::Unbounded => return Ok(SolveStatus::Unbounded),
            Relaxation::PivotLimit => return Ok(SolveStatus::Incomplete),
        }

        let mut expanded = 0usize;
        while let Some(Reverse((objective, id))) = frontier.pop() {
            let node = match nodes[id].take() {
                Some(node) => node,
                None => continue,
            };
            let col = match self.first_fractional(&node.values) {
                None => {
                    if self.config.verbosity >= Verbosity::Detailed {
                        log::info!(
                            "simplex: integral optimum {} after {} branch nodes",
                            objective,
                            expanded
                        );
                    }
                    self.solution = Some(node.values);
                    return Ok(SolveStatus::Optimal);
                }
                Some(col) => col,
            };
            expanded += 1;
            if expanded > self.config.max_branch_nodes {
                if self.config.verbosity >= Verbosity::Important {
                    log::warn!(
                        "simplex: giving up after {} branch nodes",
                        self.config.max_branch_nodes
                    );
                }
                return Ok(SolveStatus::Incomplete);
            }
            let floor = node.values[col].floor();
            let ceil = &floor + BigRational::one();
            log::trace!(
                "simplex: branching on {} = {} (objective {})",
                self.col_name(col),
                node.values[col],
                objective
            );
            for (sense, value) in [(ConstraintSense::Le, floor), (ConstraintSense::Ge, ceil)] {
                let mut bounds = node.bounds.clone();
                bounds.push(Bound { col, sense, value });
                match self.relax(&bounds)? {
                    Relaxation::Optimal { values, objective } => {
                        frontier.push(Reverse((objective, nodes.len())));
                        nodes.push(Some(BranchNode { bounds, values }));
                    }
                    // A restriction of a bounded relaxation stays bounded, so
                    // only infeasible children are pruned here.
                    Relaxation::Infeasible | Relaxation::Unbounded => {}
                    Relaxation::PivotLimit => return Ok(SolveStatus::Incomplete),
                }
            }
        }
        Ok(SolveStatus::Infeasible)
    }
}

impl LpOracle for SimplexOracle {
    type Config = SimplexConfig;

    const REENTRANT: bool = true;

    fn new(config: &SimplexConfig, num_cols: usize) -> Result<Self, LpError> {
        let mut col_names = Vec::new();
        col_names
            .try_reserve_exact(num_cols)
            .map_err(|e| LpError::Allocation(e.to_string()))?;
        col_names.extend((0..num_cols).map(|i| format!("C{}", i + 1)));
        Ok(Self {
            config: config.clone(),
            num_cols,
            col_names,
            integer: vec![false; num_cols],
            rows: Vec::new(),
            objective: vec![BigRational::zero(); num_cols],
            solution: None,
        })
    }

    fn num_cols(&self) -> usize {
        self.num_cols
    }

    fn set_col_name(&mut self, col: usize, name: &str) -> Result<(), LpError> {
        check_col(col, self.num_cols)?;
        self.col_names[col] = name.to_string();
        Ok(())
    }

    fn set_int(&mut self, col: usize, is_int: bool) -> Result<(), LpError> {
        check_col(col, self.num_cols)?;
        self.integer[col] = is_int;
        Ok(())
    }

    fn add_constraint(
        &mut self,
        coeffs: &[f64],
        sense: ConstraintSense,
        rhs: f64,
    ) -> Result<(), LpError> {
        let what = format!("row {}", self.rows.len() + 1);
        check_coeffs(coeffs, self.num_cols, &what)?;
        let coeffs = coeffs
            .iter()
            .map(|&c| to_rational(c, &what))
            .collect::<Result<Vec<_>, _>>()?;
        let rhs = to_rational(rhs, &what)?;
        self.rows
            .try_reserve(1)
            .map_err(|e| LpError::Allocation(e.to_string()))?;
        self.rows.push(Row { coeffs, sense, rhs });
        self.solution = None;
        Ok(())
    }

    fn set_minimize(&mut self, coeffs: &[f64]) -> Result<(), LpError> {
        check_coeffs(coeffs, self.num_cols, "objective")?;
        self.objective = coeffs
            .iter()
            .map(|&c| to_rational(c, "objective"))
            .collect::<Result<Vec<_>, _>>()?;
        self.solution = None;
        Ok(())
    }

    fn solve(&mut self) -> Result<SolveStatus, LpError> {
        self.solution = None;
        if self.config.verbosity >= Verbosity::Detailed {
            log::info!(
                "simplex: solving {} rows x {} columns ({} integer)",
                self.rows.len(),
                self.num_cols,
                self.integer.iter().filter(|&&i| i).count()
            );
        }
        let status = self.branch_and_bound()?;
        log::debug!("simplex: status {:?}", status);
        Ok(status)
    }

    fn variables(&self) -> Result<Vec<f64>, LpError> {
        let solution = self.solution.as_ref().ok_or(LpError::NoSolution)?;
        Ok(solution.iter().map(rational_to_f64).collect())
    }
}

/// Convenience for tests and diagnostics: an exact rational from a ratio of
/// integers.
pub fn ratio(numer: i64, denom: i64) -> BigRational {
    BigRational::new(BigInt::from(numer), BigInt::from(denom))
}
