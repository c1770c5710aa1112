// SPDX-License-Identifier: Apache-2.0

//! Counts the threshold functions among all functions of a few variables.

use anyhow::bail;
use clap::ArgMatches;
use rayon::prelude::*;
use serde::Serialize;
use tlf_ident::{IdentifyError, LinearForm, TruthTable};

use crate::common::identify_table;
use crate::driver_config::DriverConfig;

/// 2^(2^n) functions grow too fast to go past four variables.
pub const MAX_ENUMERATE_VARS: usize = 4;

#[derive(Debug, Serialize)]
struct EnumerateSummary {
    num_vars: usize,
    functions: u64,
    threshold: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    linear_forms: Vec<(String, LinearForm)>,
}

/// Identifies every function over `num_vars` variables and returns the
/// threshold ones with their linear forms, in table order.
pub fn threshold_functions(
    num_vars: usize,
    config: &DriverConfig,
) -> Result<Vec<(TruthTable, LinearForm)>, IdentifyError> {
    let functions = 1u64 << (1u32 << num_vars);
    let found: Vec<Option<(TruthTable, LinearForm)>> = (0..functions)
        .into_par_iter()
        .map(|packed| -> Result<_, IdentifyError> {
            let table = TruthTable::from_words(num_vars, vec![packed])?;
            let identification = identify_table(&table, config)?;
            Ok(identification
                .linear_form()
                .cloned()
                .map(|form| (table, form)))
        })
        .collect::<Result<_, _>>()?;
    Ok(found.into_iter().flatten().collect())
}

pub fn handle_enumerate(matches: &ArgMatches, config: &DriverConfig) -> anyhow::Result<()> {
    let num_vars = *matches
        .get_one::<usize>("num_vars")
        .expect("num_vars is required");
    if num_vars > MAX_ENUMERATE_VARS {
        bail!(
            "enumerate supports at most {} variables, got {}",
            MAX_ENUMERATE_VARS,
            num_vars
        );
    }
    let found = threshold_functions(num_vars, config)?;
    let list = matches.get_flag("list");
    let summary = EnumerateSummary {
        num_vars,
        functions: 1u64 << (1u32 << num_vars),
        threshold: found.len(),
        linear_forms: if list {
            found
                .iter()
                .map(|(table, form)| (table.to_string(), form.clone()))
                .collect()
        } else {
            Vec::new()
        },
    };

    if matches.get_flag("json") {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        for (table, form) in summary.linear_forms.iter() {
            println!("{} {}", table, form);
        }
        println!(
            "{} of {} functions of {} variables are threshold functions",
            summary.threshold, summary.functions, summary.num_vars
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(0, 2; "zero vars")]
    #[test_case(1, 4; "one var")]
    #[test_case(2, 14; "two vars")]
    #[test_case(3, 104; "three vars")]
    fn test_known_counts(num_vars: usize, expected: usize) {
        let found = threshold_functions(num_vars, &DriverConfig::default()).unwrap();
        assert_eq!(found.len(), expected);
        assert!(found.iter().all(|(table, form)| form.realizes(table)));
    }
}
