// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use clap::ArgMatches;

use crate::common::{identify_table, IdentifyReport, TableArgs};
use crate::driver_config::DriverConfig;

pub fn handle_identify(matches: &ArgMatches, config: &DriverConfig) -> anyhow::Result<()> {
    let table_args = TableArgs::from_matches(matches);
    let text = matches
        .get_one::<String>("table")
        .expect("table is required");
    let table = table_args
        .parse(text)
        .with_context(|| format!("parsing truth table {:?}", text))?;

    log::info!(
        "identify: {} over {} variables with {} oracle",
        table,
        table.num_vars(),
        config.oracle.backend
    );
    let identification = identify_table(&table, config)?;
    let report = IdentifyReport::new(&table, identification);
    if matches.get_flag("json") {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}
