// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::process::ExitStatus;
use std::sync::Arc;

use log::{debug, info};
use tokio::task::JoinSet;

use crate::cli::LaunchConfig;
use crate::diag::{Diagnostics, Event};
use crate::env::{ambient_env, derive_env, EnvMap};
use crate::procs::{Exited, Instance};
use crate::Error;

/// Launch and wait on N copies of one program
///
/// Rules:
///   - every instance is built before any is started
///   - all instances start concurrently, one task per index
///   - each task reports its own start and exit, other tasks never wait on it
///   - a failed start is fatal, the remaining instances are killed
#[derive(Debug)]
pub struct Fleet {
    instances: Vec<Instance>,
}

impl Fleet {
    /// Build the fleet against the environment of the current process
    pub fn new(config: &LaunchConfig) -> Self {
        Self::with_ambient(config, &ambient_env())
    }

    pub fn with_ambient(config: &LaunchConfig, ambient: &EnvMap) -> Self {
        let instances = (0..config.count)
            .map(|index| {
                Instance::new(
                    index,
                    config.executable.clone(),
                    config.args.clone(),
                    derive_env(ambient, index, &config.directives),
                )
            })
            .collect();

        Self { instances }
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    /// Start every instance and wait for all of them to exit
    pub async fn run<D: Diagnostics>(self, diagnostics: Arc<D>) -> Result<FleetReport, Error> {
        let count = self.instances.len();
        diagnostics.emit(Event::Starting(count));

        let mut tasks = JoinSet::new();
        for instance in self.instances {
            let diagnostics = Arc::clone(&diagnostics);
            tasks.spawn(async move {
                let index = instance.index();
                let running = instance.start()?;
                diagnostics.emit(Event::Started(index));
                debug!("process {} has pid {:?}", index, running.id());

                let exited = running.wait().await?;
                diagnostics.emit(Event::Exited(index));
                Ok::<Exited, Error>(exited)
            });
        }

        // each slot is only written by the result of its own index
        let mut slots: Vec<Option<ExitStatus>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            // returning drops the set, aborting the other tasks and killing their children
            let exited = joined??;
            slots[exited.index()] = Some(exited.status());
        }

        let statuses = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| Error::from("a process exited without a status"))?;

        diagnostics.emit(Event::AllExited);
        debug!("fleet of {} finished", count);

        Ok(FleetReport { statuses })
    }
}

/// Exit statuses of a finished fleet, by instance index
#[derive(Clone, Debug)]
pub struct FleetReport {
    statuses: Vec<ExitStatus>,
}

impl FleetReport {
    pub fn statuses(&self) -> &[ExitStatus] {
        &self.statuses
    }

    /// Instances that did not exit successfully
    pub fn failures(&self) -> impl Iterator<Item = (usize, ExitStatus)> + '_ {
        self.statuses
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, status)| !status.success())
    }

    pub fn log_failures(&self) {
        for (index, status) in self.failures() {
            info!("process {} {}", index, status);
        }
    }
}
