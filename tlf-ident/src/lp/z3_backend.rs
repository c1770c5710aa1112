// SPDX-License-Identifier: Apache-2.0

//! Integer optimization through Z3's `Optimize` engine.
//!
//! Z3 terms borrow their `Context`, so the model is recorded here as plain
//! integer rows and translated into a fresh context on every `solve`. Only
//! integer columns with integral coefficients are supported.

use serde::{Deserialize, Serialize};
use z3::ast::{Ast, Int};
use z3::{Config, Context, Optimize, SatResult};

use super::{check_coeffs, check_col, ConstraintSense, LpError, LpOracle, SolveStatus, Verbosity};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Z3Config {
    pub verbosity: Verbosity,

    /// Per-solve timeout; `None` lets Z3 run to completion.
    pub timeout_ms: Option<u64>,
}

struct IntRow {
    coeffs: Vec<i64>,
    sense: ConstraintSense,
    rhs: i64,
}

pub struct Z3Oracle {
    config: Z3Config,
    col_names: Vec<String>,
    rows: Vec<IntRow>,
    objective: Vec<i64>,
    solution: Option<Vec<i64>>,
}

fn to_int(value: f64, what: &str) -> Result<i64, LpError> {
    if value.fract() != 0.0 || value.abs() >= i64::MAX as f64 {
        return Err(LpError::ModelBuild(format!(
            "{}: z3 backend needs integral coefficients, got {}",
            what, value
        )));
    }
    Ok(value as i64)
}

fn linear_term<'ctx>(ctx: &'ctx Context, cols: &[Int<'ctx>], coeffs: &[i64]) -> Int<'ctx> {
    let terms: Vec<Int<'ctx>> = cols
        .iter()
        .zip(coeffs.iter())
        .filter(|(_, c)| **c != 0)
        .map(|(x, &c)| {
            if c == 1 {
                x.clone()
            } else {
                Int::mul(ctx, &[&Int::from_i64(ctx, c), x])
            }
        })
        .collect();
    if terms.is_empty() {
        return Int::from_i64(ctx, 0);
    }
    let refs: Vec<&Int<'ctx>> = terms.iter().collect();
    Int::add(ctx, &refs)
}

impl LpOracle for Z3Oracle {
    type Config = Z3Config;

    const REENTRANT: bool = true;

    fn new(config: &Z3Config, num_cols: usize) -> Result<Self, LpError> {
        let mut col_names = Vec::new();
        col_names
            .try_reserve_exact(num_cols)
            .map_err(|e| LpError::Allocation(e.to_string()))?;
        col_names.extend((0..num_cols).map(|i| format!("C{}", i + 1)));
        Ok(Self {
            config: config.clone(),
            col_names,
            rows: Vec::new(),
            objective: vec![0; num_cols],
            solution: None,
        })
    }

    fn num_cols(&self) -> usize {
        self.col_names.len()
    }

    fn set_col_name(&mut self, col: usize, name: &str) -> Result<(), LpError> {
        check_col(col, self.num_cols())?;
        self.col_names[col] = name.to_string();
        Ok(())
    }

    fn set_int(&mut self, col: usize, is_int: bool) -> Result<(), LpError> {
        check_col(col, self.num_cols())?;
        if !is_int {
            return Err(LpError::ModelBuild(format!(
                "z3 backend does not support continuous column {}",
                self.col_names[col]
            )));
        }
        Ok(())
    }

    fn add_constraint(
        &mut self,
        coeffs: &[f64],
        sense: ConstraintSense,
        rhs: f64,
    ) -> Result<(), LpError> {
        let what = format!("row {}", self.rows.len() + 1);
        check_coeffs(coeffs, self.num_cols(), &what)?;
        let coeffs = coeffs
            .iter()
            .map(|&c| to_int(c, &what))
            .collect::<Result<Vec<_>, _>>()?;
        let rhs = to_int(rhs, &what)?;
        self.rows.push(IntRow { coeffs, sense, rhs });
        self.solution = None;
        Ok(())
    }

    fn set_minimize(&mut self, coeffs: &[f64]) -> Result<(), LpError> {
        check_coeffs(coeffs, self.num_cols(), "objective")?;
        self.objective = coeffs
            .iter()
            .map(|&c| to_int(c, "objective"))
            .collect::<Result<Vec<_>, _>>()?;
        self.solution = None;
        Ok(())
    }

    fn solve(&mut self) -> Result<SolveStatus, LpError> {
        self.solution = None;
        let mut cfg = Config::new();
        if let Some(ms) = self.config.timeout_ms {
            cfg.set_timeout_msec(ms);
        }
        let ctx = Context::new(&cfg);
        let opt = Optimize::new(&ctx);

        let zero = Int::from_i64(&ctx, 0);
        let cols: Vec<Int> = self
            .col_names
            .iter()
            .enumerate()
            .map(|(i, name)| Int::new_const(&ctx, format!("c{}_{}", i, name)))
            .collect();
        for x in cols.iter() {
            opt.assert(&x.ge(&zero));
        }
        for row in self.rows.iter() {
            let lhs = linear_term(&ctx, &cols, &row.coeffs);
            let rhs = Int::from_i64(&ctx, row.rhs);
            let constraint = match row.sense {
                ConstraintSense::Ge => lhs.ge(&rhs),
                ConstraintSense::Le => lhs.le(&rhs),
                ConstraintSense::Eq => lhs._eq(&rhs),
            };
            opt.assert(&constraint);
        }
        opt.minimize(&linear_term(&ctx, &cols, &self.objective));

        if self.config.verbosity >= Verbosity::Detailed {
            log::info!(
                "z3: optimizing {} rows x {} columns",
                self.rows.len(),
                cols.len()
            );
        }
        let status = match opt.check(&[]) {
            SatResult::Unsat => SolveStatus::Infeasible,
            SatResult::Unknown => {
                if self.config.verbosity >= Verbosity::Important {
                    log::warn!("z3: optimization returned unknown");
                }
                SolveStatus::Incomplete
            }
            SatResult::Sat => {
                let model = opt
                    .get_model()
                    .ok_or_else(|| LpError::Internal("z3 reported sat without a model".into()))?;
                let values = cols
                    .iter()
                    .map(|x| {
                        model
                            .eval(x, true)
                            .and_then(|v| v.as_i64())
                            .ok_or_else(|| {
                                LpError::Internal(format!("z3 model has no value for {}", x))
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.solution = Some(values);
                SolveStatus::Optimal
            }
        };
        log::debug!("z3: status {:?}", status);
        Ok(status)
    }

    fn variables(&self) -> Result<Vec<f64>, LpError> {
        let solution = self.solution.as_ref().ok_or(LpError::NoSolution)?;
        Ok(solution.iter().map(|&v| v as f64).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::{identify, Identification, IdentifyOptions, Rejection};
    use crate::truth_table::TruthTable;
    use pretty_assertions::assert_eq;

    fn oracle(num_cols: usize) -> Z3Oracle {
        Z3Oracle::new(&Z3Config::default(), num_cols).expect("allocate")
    }

    #[test]
    fn test_integer_optimum() {
        // min x + y  s.t.  2x + 2y >= 3.
        let mut lp = oracle(2);
        lp.add_constraint(&[2.0, 2.0], ConstraintSense::Ge, 3.0).unwrap();
        lp.set_minimize(&[1.0, 1.0]).unwrap();
        assert_eq!(lp.solve().unwrap(), SolveStatus::Optimal);
        let values = lp.variables().unwrap();
        assert_eq!(values.iter().sum::<f64>(), 2.0);
    }

    #[test]
    fn test_infeasible() {
        let mut lp = oracle(1);
        lp.add_constraint(&[2.0], ConstraintSense::Eq, 1.0).unwrap();
        assert_eq!(lp.solve().unwrap(), SolveStatus::Infeasible);
        assert_eq!(lp.variables(), Err(LpError::NoSolution));
    }

    #[test]
    fn test_rejects_fractional_coefficients_and_continuous_columns() {
        let mut lp = oracle(2);
        assert!(matches!(
            lp.add_constraint(&[0.5, 1.0], ConstraintSense::Ge, 0.0),
            Err(LpError::ModelBuild(_))
        ));
        assert!(matches!(lp.set_int(0, false), Err(LpError::ModelBuild(_))));
        assert!(lp.set_int(1, true).is_ok());
    }

    #[test]
    fn test_duplicate_column_names_stay_distinct() {
        // min x + y  s.t.  x >= 2, y <= 0.
        let mut lp = oracle(2);
        lp.set_col_name(0, "w").unwrap();
        lp.set_col_name(1, "w").unwrap();
        lp.add_constraint(&[1.0, 0.0], ConstraintSense::Ge, 2.0).unwrap();
        lp.add_constraint(&[0.0, 1.0], ConstraintSense::Le, 0.0).unwrap();
        lp.set_minimize(&[1.0, 1.0]).unwrap();
        assert_eq!(lp.solve().unwrap(), SolveStatus::Optimal);
        assert_eq!(lp.variables().unwrap(), vec![2.0, 0.0]);
    }

    #[test]
    fn test_identifies_majority() {
        let maj = TruthTable::from_hex_str(3, "e8").unwrap();
        let result =
            identify::<Z3Oracle, _>(&maj, &Z3Config::default(), &IdentifyOptions::default())
                .unwrap();
        assert_eq!(result.linear_form().map(|f| f.to_vec()), Some(vec![1, 1, 1, 2]));

        let x = |j| TruthTable::nth_var(4, j);
        let f = (x(0) & x(1)) | (x(2) & x(3));
        let result =
            identify::<Z3Oracle, _>(&f, &Z3Config::default(), &IdentifyOptions::default())
                .unwrap();
        assert_eq!(result, Identification::NotThreshold(Rejection::Infeasible));
    }
}
