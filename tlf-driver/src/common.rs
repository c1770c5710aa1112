// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use clap::ArgMatches;
use serde::Serialize;
use tlf_ident::lp::simplex::SimplexOracle;
#[cfg(feature = "has-z3")]
use tlf_ident::lp::z3_backend::Z3Oracle;
use tlf_ident::lp::LpOracle;
use tlf_ident::{
    identify, identify_with_timeout, Identification, IdentifyError, IdentifyOptions, LinearForm,
    TruthTable, TruthTableError,
};

use crate::driver_config::DriverConfig;
use crate::oracle_choice::OracleChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Hex,
    Binary,
}

impl std::str::FromStr for TableFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(Self::Hex),
            "binary" => Ok(Self::Binary),
            _ => Err(format!("invalid table format: {}", s)),
        }
    }
}

/// Table-reading flags shared by the `identify` and `batch` subcommands.
pub struct TableArgs {
    pub num_vars: usize,
    pub format: TableFormat,
}

impl TableArgs {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            num_vars: *matches
                .get_one::<usize>("num_vars")
                .expect("num_vars is required"),
            format: *matches
                .get_one::<TableFormat>("format")
                .expect("format has a default"),
        }
    }

    pub fn parse(&self, text: &str) -> Result<TruthTable, TruthTableError> {
        match self.format {
            TableFormat::Hex => TruthTable::from_hex_str(self.num_vars, text),
            TableFormat::Binary => TruthTable::from_binary_str(self.num_vars, text),
        }
    }
}

fn run_with<O>(
    table: &TruthTable,
    oracle_config: &O::Config,
    options: &IdentifyOptions,
    timeout_ms: Option<u64>,
) -> Result<Identification, IdentifyError>
where
    O: LpOracle + 'static,
    O::Config: Clone + 'static,
{
    match timeout_ms {
        Some(ms) => identify_with_timeout::<O>(
            table.clone(),
            oracle_config.clone(),
            options.clone(),
            Duration::from_millis(ms),
        ),
        None => identify::<O, _>(table, oracle_config, options),
    }
}

/// Identifies `table` with the backend and options selected by `config`.
pub fn identify_table(
    table: &TruthTable,
    config: &DriverConfig,
) -> Result<Identification, IdentifyError> {
    let timeout_ms = config.oracle.timeout_ms;
    match config.oracle.backend {
        OracleChoice::Simplex => run_with::<SimplexOracle>(
            table,
            &config.oracle.simplex,
            &config.identify,
            timeout_ms,
        ),
        #[cfg(feature = "has-z3")]
        OracleChoice::Z3 => {
            run_with::<Z3Oracle>(table, &config.oracle.z3, &config.identify, timeout_ms)
        }
    }
}

/// Outcome for one table, as printed by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifyReport {
    pub table: String,
    pub num_vars: usize,
    pub is_threshold: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linear_form: Option<LinearForm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

impl IdentifyReport {
    pub fn new(table: &TruthTable, identification: Identification) -> Self {
        let (linear_form, rejection) = match identification {
            Identification::Threshold(form) => (Some(form), None),
            Identification::NotThreshold(rejection) => (None, Some(rejection.to_string())),
        };
        Self {
            table: table.to_string(),
            num_vars: table.num_vars(),
            is_threshold: linear_form.is_some(),
            linear_form,
            rejection,
        }
    }
}

impl std::fmt::Display for IdentifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.linear_form, &self.rejection) {
            (Some(form), _) => write!(f, "{}: threshold {}", self.table, form),
            (None, Some(rejection)) => {
                write!(f, "{}: not threshold ({})", self.table, rejection)
            }
            (None, None) => write!(f, "{}: not threshold", self.table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(TableFormat::Hex, "e8"; "hex")]
    #[test_case(TableFormat::Binary, "11101000"; "binary")]
    fn test_parse_majority(format: TableFormat, text: &str) {
        let args = TableArgs {
            num_vars: 3,
            format,
        };
        let table = args.parse(text).unwrap();
        let report = IdentifyReport::new(
            &table,
            identify_table(&table, &DriverConfig::default()).unwrap(),
        );
        assert_eq!(report.to_string(), "0xe8: threshold [1, 1, 1; 2]");
    }

    #[test]
    fn test_report_json_shape() {
        let table = TruthTable::from_hex_str(2, "6").unwrap();
        let report = IdentifyReport::new(
            &table,
            identify_table(&table, &DriverConfig::default()).unwrap(),
        );
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            r#"{"table":"0x6","num_vars":2,"is_threshold":false,"rejection":"binate in variable 0"}"#
        );
    }

    #[test]
    fn test_timeout_path_agrees() {
        let table = TruthTable::from_hex_str(2, "e").unwrap();
        let mut config = DriverConfig::default();
        config.oracle.timeout_ms = Some(60_000);
        let result = identify_table(&table, &config).unwrap();
        assert_eq!(
            result.linear_form().map(|f| f.to_vec()),
            Some(vec![1, 1, 1])
        );
    }
}
