// SPDX-License-Identifier: Apache-2.0

//! Linear forms `[w_0, ..., w_{n-1}; T]` witnessing threshold functions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::FlipTracker;
use crate::truth_table::CompleteTruthTable;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinearForm {
    weights: Vec<i64>,
    threshold: i64,
}

impl LinearForm {
    pub fn new(weights: Vec<i64>, threshold: i64) -> Self {
        Self { weights, threshold }
    }

    /// Builds a form from the `[w_0, ..., w_{n-1}, T]` vector layout.
    ///
    /// Returns `None` for an empty vector.
    pub fn from_vec(mut values: Vec<i64>) -> Option<Self> {
        let threshold = values.pop()?;
        Some(Self {
            weights: values,
            threshold,
        })
    }

    pub fn num_vars(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &[i64] {
        &self.weights
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// Returns the `[w_0, ..., w_{n-1}, T]` vector layout.
    pub fn to_vec(&self) -> Vec<i64> {
        let mut v = self.weights.clone();
        v.push(self.threshold);
        v
    }

    /// Weighted sum of the variables set in `assignment`.
    pub fn weighted_sum(&self, assignment: usize) -> i64 {
        self.weights
            .iter()
            .enumerate()
            .filter(|(j, _)| (assignment >> j) & 1 == 1)
            .map(|(_, w)| *w)
            .sum()
    }

    pub fn evaluate(&self, assignment: usize) -> bool {
        self.weighted_sum(assignment) >= self.threshold
    }

    /// Checks that this form computes exactly `table`.
    pub fn realizes<T: CompleteTruthTable + ?Sized>(&self, table: &T) -> bool {
        self.weights.len() == table.num_vars()
            && (0..table.num_bits()).all(|i| self.evaluate(i) == table.get_bit(i))
    }

    /// Maps a form of the normalized function back to the original one.
    ///
    /// Complementing `x_j` substitutes `1 - x_j` for it, which turns
    /// `w_j x_j >= T` into `-w_j x_j >= T - w_j`.
    pub fn unflip(mut self, flips: &FlipTracker) -> Self {
        for var in flips.flipped_vars() {
            self.weights[var] = -self.weights[var];
            self.threshold += self.weights[var];
        }
        self
    }
}

impl fmt::Display for LinearForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, w) in self.weights.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", w)?;
        }
        write!(f, "; {}]", self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truth_table::TruthTable;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_majority_of_three() {
        let form = LinearForm::new(vec![1, 1, 1], 2);
        let maj = TruthTable::from_hex_str(3, "e8").expect("parse");
        assert!(form.realizes(&maj));
        assert!(!form.realizes(&TruthTable::from_hex_str(3, "e9").expect("parse")));
    }

    #[test]
    fn test_vec_layout_round_trip() {
        let form = LinearForm::from_vec(vec![2, -1, 3]).expect("non-empty");
        assert_eq!(form.weights(), &[2, -1]);
        assert_eq!(form.threshold(), 3);
        assert_eq!(form.to_vec(), vec![2, -1, 3]);
        assert_eq!(LinearForm::from_vec(vec![]), None);
    }

    #[test]
    fn test_unflip_negates_then_accumulates() {
        // x0 & x1 realized as [1, 1; 2]. Complementing x1 gives x0 & !x1.
        let mut flips = FlipTracker::new(2);
        flips.mark(1);
        let form = LinearForm::new(vec![1, 1], 2).unflip(&flips);
        assert_eq!(form, LinearForm::new(vec![1, -1], 1));
        let f = TruthTable::nth_var(2, 0) & !TruthTable::nth_var(2, 1);
        assert!(form.realizes(&f));
    }

    #[test]
    fn test_display() {
        assert_eq!(LinearForm::new(vec![3, -1, 0], 2).to_string(), "[3, -1, 0; 2]");
        assert_eq!(LinearForm::new(vec![], 1).to_string(), "[; 1]");
    }

    #[test]
    fn test_serde_json_shape() {
        let form = LinearForm::new(vec![1, 2], 2);
        let json = serde_json::to_string(&form).expect("serialize");
        assert_eq!(json, r#"{"weights":[1,2],"threshold":2}"#);
    }
}
