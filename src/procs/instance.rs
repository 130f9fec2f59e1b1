// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::OsString;
use std::process::{ExitStatus, Stdio};

use log::{debug, warn};
use tokio::process::{Child, Command};

use crate::env::EnvMap;
use crate::error::ErrorKind;
use crate::Error;

/// A process of the fleet that has not been started yet
///
/// Starting consumes the `Instance`, and waiting consumes the [`Running`]
/// handle, so each instance is started once and awaited once.
#[derive(Debug)]
pub struct Instance {
    index: usize,
    program: OsString,
    args: Vec<OsString>,
    env: EnvMap,
}

impl Instance {
    pub fn new(index: usize, program: OsString, args: Vec<OsString>, env: EnvMap) -> Self {
        Self {
            index,
            program,
            args,
            env,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn env(&self) -> &EnvMap {
        &self.env
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env_clear()
            .kill_on_drop(true)
            // no capture, children share our stdio
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        for (key, value) in &self.env {
            if key.is_empty() {
                warn!(
                    "process {}: skipping unnamed environment variable with value {:?}",
                    self.index, value
                );
                continue;
            }
            command.env(key, value);
        }

        command
    }

    /// Spawn the child process
    pub fn start(self) -> Result<Running, Error> {
        let child = self.command().spawn().map_err(|source| {
            Error::from(ErrorKind::Spawn {
                index: self.index,
                program: self.program.to_string_lossy().into_owned(),
                source,
            })
        })?;

        debug!("process {} spawned {:?}", self.index, self.program);

        Ok(Running {
            index: self.index,
            child,
        })
    }
}

/// A started process
#[derive(Debug)]
pub struct Running {
    index: usize,
    child: Child,
}

impl Running {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to terminate, whatever its exit status
    pub async fn wait(mut self) -> Result<Exited, Error> {
        let status = self.child.wait().await.map_err(|source| {
            Error::from(ErrorKind::Wait {
                index: self.index,
                source,
            })
        })?;

        debug!("process {} terminated: {}", self.index, status);

        Ok(Exited {
            index: self.index,
            status,
        })
    }
}

/// A process that has terminated
#[derive(Clone, Copy, Debug)]
pub struct Exited {
    index: usize,
    status: ExitStatus,
}

impl Exited {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }
}
