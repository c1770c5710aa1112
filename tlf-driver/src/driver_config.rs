// SPDX-License-Identifier: Apache-2.0

//! Driver configuration loaded from a TOML file.
//!
//! ```toml
//! [oracle]
//! backend = "simplex"
//! timeout_ms = 5000
//!
//! [oracle.simplex]
//! verbosity = "detailed"
//! max_branch_nodes = 1000
//!
//! [identify]
//! check_linear_form = true
//! ```
//!
//! Every key is optional. Command line flags override values from the file.

use std::path::Path;

use anyhow::Context;
use clap::ArgMatches;
use serde::Deserialize;
use tlf_ident::lp::simplex::SimplexConfig;
#[cfg(feature = "has-z3")]
use tlf_ident::lp::z3_backend::Z3Config;
use tlf_ident::IdentifyOptions;

use crate::oracle_choice::OracleChoice;

/// Name of the config file picked up from the working directory when no
/// `--config` flag is given.
pub const DEFAULT_CONFIG_FILE: &str = "tlf-driver.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OracleConfig {
    pub backend: OracleChoice,

    /// Abandon a single identification after this many milliseconds.
    pub timeout_ms: Option<u64>,

    pub simplex: SimplexConfig,

    #[cfg(feature = "has-z3")]
    pub z3: Z3Config,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub oracle: OracleConfig,
    pub identify: IdentifyOptions,
}

impl DriverConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Applies the global command line overrides.
    pub fn apply_overrides(&mut self, matches: &ArgMatches) {
        if let Some(backend) = matches.get_one::<OracleChoice>("oracle") {
            self.oracle.backend = *backend;
        }
        if let Some(timeout_ms) = matches.get_one::<u64>("timeout_ms") {
            self.oracle.timeout_ms = Some(*timeout_ms);
        }
        if matches.get_flag("no_check") {
            self.identify.check_linear_form = false;
        }
    }
}

/// Resolves the config file to use: the `--config` flag if given, otherwise
/// `tlf-driver.toml` in the working directory if present.
pub fn find_config_path(matches: &ArgMatches) -> Option<std::path::PathBuf> {
    if let Some(path) = matches.get_one::<String>("config") {
        return Some(path.into());
    }
    let cwd_path = std::env::current_dir().ok()?.join(DEFAULT_CONFIG_FILE);
    if cwd_path.exists() {
        log::info!(
            "Using {} in current directory: {}",
            DEFAULT_CONFIG_FILE,
            cwd_path.display()
        );
        Some(cwd_path)
    } else {
        None
    }
}
