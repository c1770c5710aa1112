// SPDX-License-Identifier: Apache-2.0

//! Identification of threshold logic functions from complete truth tables.
//!
//! ```
//! use tlf_ident::{is_threshold, TruthTable};
//!
//! let maj = TruthTable::from_hex_str(3, "e8").unwrap();
//! let mut form = Vec::new();
//! assert_eq!(is_threshold(&maj, Some(&mut form)), Ok(true));
//! assert_eq!(form, vec![1, 1, 1, 2]);
//! ```

pub mod linear_form;
pub mod lp;
pub mod normalize;
pub mod threshold;
pub mod truth_table;

pub use linear_form::LinearForm;
pub use threshold::{
    identify, identify_with_timeout, is_threshold, is_threshold_with, Identification,
    IdentifyError, IdentifyOptions, Rejection,
};
pub use truth_table::{CompleteTruthTable, RawTruthTable, TruthTable, TruthTableError, MAX_VARS};
