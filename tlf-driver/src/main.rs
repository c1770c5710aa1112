// SPDX-License-Identifier: Apache-2.0

//! Command line driver for threshold logic function identification.
//!
//! Commands are given like:
//!
//! ```text
//! tlf-driver <global-options> <command> <command-args-and-options>
//! ```
//!
//! Commands are:
//!
//! - identify: Decides whether one truth table is a threshold function and
//!   prints a linear form if it is.
//! - batch: Runs `identify` on every table in a file, in parallel.
//! - enumerate: Counts (and optionally lists) the threshold functions over a
//!   few variables.
//!
//! Sample usage:
//!
//! ```shell
//! $ cargo run -- identify e8 --num-vars 3
//! 0xe8: threshold [1, 1, 1; 2]
//! $ cargo run -- --timeout-ms 500 batch tables.txt --num-vars 4 --json
//! $ cargo run -- enumerate --num-vars 3
//! ```

mod batch;
mod common;
mod driver_config;
mod enumerate;
mod identify;
mod oracle_choice;
mod report_cli_error;

use clap::{value_parser, Arg, ArgAction};

use crate::common::TableFormat;
use crate::driver_config::{find_config_path, DriverConfig};
use crate::oracle_choice::OracleChoice;
use crate::report_cli_error::report_cli_error_and_exit;

trait AppExt {
    fn add_num_vars_arg(self) -> Self;
    fn add_format_arg(self) -> Self;
    fn add_bool_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self;
}

impl AppExt for clap::Command {
    fn add_num_vars_arg(self) -> Self {
        self.arg(
            Arg::new("num_vars")
                .long("num-vars")
                .short('n')
                .value_name("N")
                .help("Number of input variables of the truth table")
                .required(true)
                .value_parser(value_parser!(usize))
                .action(ArgAction::Set),
        )
    }

    fn add_format_arg(self) -> Self {
        self.arg(
            Arg::new("format")
                .long("format")
                .value_name("FORMAT")
                .help("Truth table notation (hex or binary), most significant assignment first")
                .default_value("hex")
                .value_parser(|s: &str| s.parse::<TableFormat>())
                .action(ArgAction::Set),
        )
    }

    fn add_bool_arg(self, id: &'static str, long: &'static str, help: &'static str) -> Self {
        self.arg(
            Arg::new(id)
                .long(long)
                .help(help)
                .action(ArgAction::SetTrue),
        )
    }
}

fn main() {
    let _ = env_logger::try_init();

    log::info!("tlf-driver starting; version: {}", env!("CARGO_PKG_VERSION"));

    let matches = clap::Command::new("tlf-driver")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Identifies threshold logic functions from truth tables")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("CONFIG")
                .help("Path to a tlf-driver.toml file")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("oracle")
                .long("oracle")
                .value_name("ORACLE")
                .help(format!(
                    "LP oracle backend ({}); overrides the config file",
                    OracleChoice::all()
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
                .global(true)
                .value_parser(|s: &str| s.parse::<OracleChoice>())
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("timeout_ms")
                .long("timeout-ms")
                .value_name("MILLISECONDS")
                .help("Abandon a single identification after this long")
                .global(true)
                .value_parser(value_parser!(u64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("no_check")
                .long("no-check")
                .help("Skip verifying produced linear forms against the input table")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(clap::Command::new("version").about("Prints the version of the driver"))
        .subcommand(
            clap::Command::new("identify")
                .about("Decides whether a truth table is a threshold function")
                .arg(
                    Arg::new("table")
                        .value_name("TABLE")
                        .help("The truth table, e.g. e8 for majority of three")
                        .required(true)
                        .index(1),
                )
                .add_num_vars_arg()
                .add_format_arg()
                .add_bool_arg("json", "json", "Print the result as JSON"),
        )
        .subcommand(
            clap::Command::new("batch")
                .about("Identifies every truth table in a file, one per line")
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .help("File of truth tables; blank lines and # comments are skipped")
                        .required(true)
                        .index(1),
                )
                .add_num_vars_arg()
                .add_format_arg()
                .add_bool_arg("json", "json", "Print the results as JSON"),
        )
        .subcommand(
            clap::Command::new("enumerate")
                .about("Counts the threshold functions over a few variables")
                .add_num_vars_arg()
                .add_bool_arg("list", "list", "Print every threshold function and its form")
                .add_bool_arg("json", "json", "Print the result as JSON"),
        )
        .get_matches();

    let mut config = match find_config_path(&matches) {
        Some(path) => {
            if !path.exists() {
                report_cli_error_and_exit(
                    "config file does not exist",
                    None,
                    vec![("path", &path.display().to_string())],
                );
            }
            DriverConfig::from_path(&path).unwrap_or_else(|e| {
                report_cli_error_and_exit(&format!("{:#}", e), None, vec![])
            })
        }
        None => DriverConfig::default(),
    };
    config.apply_overrides(&matches);
    log::debug!("tlf-driver: effective config {:?}", config);

    let (subcommand, result) = match matches.subcommand() {
        Some(("identify", sub)) => ("identify", identify::handle_identify(sub, &config)),
        Some(("batch", sub)) => ("batch", batch::handle_batch(sub, &config)),
        Some(("enumerate", sub)) => ("enumerate", enumerate::handle_enumerate(sub, &config)),
        Some(("version", _)) => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => report_cli_error_and_exit("No valid subcommand provided.", None, vec![]),
    };
    if let Err(e) = result {
        report_cli_error_and_exit(&format!("{:#}", e), Some(subcommand), vec![]);
    }
}
