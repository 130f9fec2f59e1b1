// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::ffi::OsString;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use crate::env::Directive;
use crate::Error;

pub const NUM: &str = "num";
pub const ENV: &str = "env";
/// The executable followed by the arguments passed to every instance
pub const COMMAND: &str = "command";

/// Everything needed to launch a fleet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of instances, at least one
    pub count: usize,
    pub directives: Vec<Directive>,
    pub executable: OsString,
    /// Passed unchanged to every instance
    pub args: Vec<OsString>,
}

impl LaunchConfig {
    pub fn from_matches(args: &ArgMatches) -> Result<Self, Error> {
        let count = *args
            .get_one::<u32>(NUM)
            .ok_or_else(|| Error::from("num not specified"))?;
        let directives = args
            .get_many::<String>(ENV)
            .into_iter()
            .flatten()
            .map(|d| Directive::parse(d))
            .collect();
        let mut command = args.get_many::<OsString>(COMMAND).into_iter().flatten().cloned();
        let executable = command
            .next()
            .ok_or_else(|| Error::from("executable not specified"))?;
        let exe_args = command.collect();

        Ok(Self {
            count: count as usize,
            directives,
            executable,
            args: exe_args,
        })
    }

    /// The arguments joined by single spaces
    pub fn args_line(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .author(env!("CARGO_PKG_AUTHORS"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .arg(
            Arg::new(NUM)
                .short('n')
                .long(NUM)
                .value_name("COUNT")
                .required(true)
                .value_parser(value_parser!(u32).range(1..))
                .help("Number of processes to run in parallel"),
        )
        .arg(
            Arg::new(ENV)
                .short('e')
                .long(ENV)
                .value_name("KEY[=VALUE]")
                .action(ArgAction::Append)
                .help("Environment variable to set, or to remove if no value is given (use {i} to substitute the process number)"),
        )
        // one positional, so nothing after the executable is read as our own option
        .arg(
            Arg::new(COMMAND)
                .value_name("EXECUTABLE [ARGS]")
                .required(true)
                .num_args(1..)
                .trailing_var_arg(true)
                .allow_hyphen_values(true)
                .value_parser(value_parser!(OsString))
                .help("Executable to run, followed by the arguments passed to every process"),
        )
}
