// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::sync::Arc;

use log::debug;
use tokio::runtime;

use fleetrc::cli::{self, LaunchConfig};
use fleetrc::diag::Stderr;
use fleetrc::procs::Fleet;
use fleetrc::Error;

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::command().get_matches();
    let config = LaunchConfig::from_matches(&args)?;

    for directive in &config.directives {
        debug!("environment directive: {}", directive);
    }
    debug!(
        "launching {} x {:?} {}",
        config.count,
        config.executable,
        config.args_line()
    );

    // one worker per instance, starts are never serialized behind each other
    let runtime = runtime::Builder::new_multi_thread()
        .worker_threads(config.count)
        .enable_all()
        .build()?;

    let fleet = Fleet::new(&config);
    let report = runtime.block_on(fleet.run(Arc::new(Stderr)))?;
    report.log_failures();

    Ok(())
}
