// SPDX-License-Identifier: Apache-2.0

//! Unateness analysis and polarity normalization.
//!
//! A threshold function is unate in every variable: flipping a single input
//! from 0 to 1 either never lowers the output (positive unate) or never raises
//! it (negative unate). We check every variable over all of its cofactor pairs
//! and complement the negative unate ones so the resulting table is positive
//! unate (monotone increasing) in every variable.

use crate::truth_table::{TruthTable, VAR_MASKS};

/// Direction in which a function moves when one variable goes from 0 to 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Increasing,
    Decreasing,
    /// The variable never changes the output.
    Independent,
}

/// Records which variables were complemented during normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlipTracker {
    flipped: Vec<bool>,
}

impl FlipTracker {
    pub fn new(num_vars: usize) -> Self {
        Self {
            flipped: vec![false; num_vars],
        }
    }

    pub fn mark(&mut self, var: usize) {
        self.flipped[var] = true;
    }

    pub fn is_flipped(&self, var: usize) -> bool {
        self.flipped[var]
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flipped
    }

    /// Iterates over the indices of complemented variables.
    pub fn flipped_vars(&self) -> impl Iterator<Item = usize> + '_ {
        self.flipped
            .iter()
            .enumerate()
            .filter_map(|(i, &f)| if f { Some(i) } else { None })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalization {
    /// Every variable is unate; `table` is monotone increasing in all of them.
    Unate {
        table: TruthTable,
        flips: FlipTracker,
    },
    /// The function is binate in `var` and cannot be a threshold function.
    Binate { var: usize },
}

/// Enumerates the `(lo, hi)` assignment pairs that differ only in `var`,
/// where `lo` has `var` cleared and `hi = lo | (1 << var)`.
pub fn cofactor_pairs(num_vars: usize, var: usize) -> impl Iterator<Item = (usize, usize)> {
    assert!(var < num_vars, "cofactor_pairs: variable out of range");
    let half = 1usize << var;
    let num_bits = 1usize << num_vars;
    (0..num_bits)
        .step_by(2 * half)
        .flat_map(move |base| (base..base + half).map(move |lo| (lo, lo + half)))
}

/// Returns the polarity of `table` in `var`, or `None` if the function is
/// binate in it.
pub fn variable_polarity(table: &TruthTable, var: usize) -> Option<Polarity> {
    assert!(
        var < table.num_vars(),
        "variable_polarity: variable {} out of range for {} variables",
        var,
        table.num_vars()
    );
    // Bitmasks of cofactor pairs where the output rises / falls across `var`.
    let mut rises = 0u64;
    let mut falls = 0u64;
    let words = table.words();
    if var < 6 {
        let mask = VAR_MASKS[var];
        let shift = 1u32 << var;
        for &w in words {
            let hi = w & mask;
            let lo = (w << shift) & mask;
            rises |= hi & !lo;
            falls |= lo & !hi;
        }
    } else {
        let stride = 1usize << (var - 6);
        for block in words.chunks(2 * stride) {
            let (lo, hi) = block.split_at(stride);
            for (&l, &h) in lo.iter().zip(hi.iter()) {
                rises |= h & !l;
                falls |= l & !h;
            }
        }
    }
    match (rises != 0, falls != 0) {
        (true, true) => None,
        (true, false) => Some(Polarity::Increasing),
        (false, true) => Some(Polarity::Decreasing),
        (false, false) => Some(Polarity::Independent),
    }
}

/// Makes `table` monotone increasing in every variable, or reports the first
/// binate variable.
pub fn normalize(table: &TruthTable) -> Normalization {
    let num_vars = table.num_vars();
    let mut working = table.clone();
    let mut flips = FlipTracker::new(num_vars);
    for var in 0..num_vars {
        match variable_polarity(&working, var) {
            None => {
                log::debug!("normalize: binate in variable {}", var);
                return Normalization::Binate { var };
            }
            Some(Polarity::Decreasing) => {
                log::debug!("normalize: complementing negative unate variable {}", var);
                working.complement_var(var);
                flips.mark(var);
            }
            Some(polarity) => {
                log::trace!("normalize: variable {} is {:?}", var, polarity);
            }
        }
    }
    Normalization::Unate {
        table: working,
        flips,
    }
}

/// Reports whether `table` is monotone increasing in every variable.
pub fn is_positive_unate(table: &TruthTable) -> bool {
    (0..table.num_vars()).all(|var| {
        matches!(
            variable_polarity(table, var),
            Some(Polarity::Increasing) | Some(Polarity::Independent)
        )
    })
}
