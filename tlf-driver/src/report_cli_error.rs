// SPDX-License-Identifier: Apache-2.0

//! Uniform error reporting for driver subcommands.

use colored::Colorize;

/// Prints `message` (prefixed by the failing subcommand, if any) and each
/// `key: value` detail to stderr, then exits with status 1.
///
/// Usage errors from argument parsing are reported by clap itself and exit
/// with status 2; everything past parsing ends up here.
pub fn report_cli_error_and_exit(
    message: &str,
    subcommand: Option<&str>,
    details: Vec<(&str, &str)>,
) -> ! {
    let subcommand_str = match subcommand {
        Some(subcommand) => format!("{}: ", subcommand),
        None => String::new(),
    };
    eprintln!("tlf-driver: {}{}", subcommand_str, message.red().bold());
    for (key, value) in details {
        eprintln!("  {}: {}", key, value);
    }
    std::process::exit(1);
}
