// SPDX-License-Identifier: Apache-2.0

//! Identifies every table in a file, one table per line.
//!
//! Blank lines and lines starting with `#` are skipped. Tables are parsed
//! up front so a malformed line fails the run before any solving starts.

use anyhow::{anyhow, Context};
use clap::ArgMatches;
use rayon::prelude::*;
use serde::Serialize;
use tlf_ident::TruthTable;

use crate::common::{identify_table, IdentifyReport, TableArgs};
use crate::driver_config::DriverConfig;

#[derive(Debug, Serialize)]
struct BatchSummary {
    tables: usize,
    threshold: usize,
    results: Vec<IdentifyReport>,
}

/// Parses the non-comment lines of `text`, keeping their 1-based line numbers.
fn parse_tables(text: &str, table_args: &TableArgs) -> anyhow::Result<Vec<(usize, TruthTable)>> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(lineno, line)| {
            table_args
                .parse(line)
                .map(|table| (lineno, table))
                .with_context(|| format!("line {}: {:?}", lineno, line))
        })
        .collect()
}

pub fn handle_batch(matches: &ArgMatches, config: &DriverConfig) -> anyhow::Result<()> {
    let table_args = TableArgs::from_matches(matches);
    let path = matches.get_one::<String>("file").expect("file is required");
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
    let tables = parse_tables(&text, &table_args)?;
    log::info!("batch: {} tables from {}", tables.len(), path);

    let results: Vec<IdentifyReport> = tables
        .par_iter()
        .map(|(lineno, table)| {
            identify_table(table, config)
                .map(|identification| IdentifyReport::new(table, identification))
                .map_err(|e| anyhow!("line {}: {}", lineno, e))
        })
        .collect::<anyhow::Result<_>>()?;

    let summary = BatchSummary {
        tables: results.len(),
        threshold: results.iter().filter(|r| r.is_threshold).count(),
        results,
    };
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string(&summary)?);
    } else {
        for report in summary.results.iter() {
            println!("{}", report);
        }
        println!(
            "{} of {} tables are threshold functions",
            summary.threshold, summary.tables
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TableFormat;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_tables_skips_comments_and_blanks() {
        let args = TableArgs {
            num_vars: 2,
            format: TableFormat::Hex,
        };
        let tables = parse_tables("# or, xor\ne\n\n  6  \n", &args).unwrap();
        let linenos: Vec<usize> = tables.iter().map(|(l, _)| *l).collect();
        assert_eq!(linenos, vec![2, 4]);
        assert_eq!(tables[1].1.to_string(), "0x6");
    }

    #[test]
    fn test_parse_tables_reports_line_number() {
        let args = TableArgs {
            num_vars: 2,
            format: TableFormat::Hex,
        };
        let err = parse_tables("e\nzz\n", &args).unwrap_err();
        assert!(format!("{:#}", err).starts_with("line 2: \"zz\""), "{:#}", err);
    }
}
