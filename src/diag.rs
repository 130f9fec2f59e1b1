// Copyright 2019-2020 Benjamin Fry <benjaminfry@me.com>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Diagnostic events of a fleet run

use std::fmt;
use std::io::{self, Write};
use std::sync::Mutex;

use log::warn;

/// A lifecycle event, rendered as one diagnostic line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Starting(usize),
    Started(usize),
    Exited(usize),
    AllExited,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting(count) => write!(f, "Starting {} processes...", count),
            Self::Started(index) => write!(f, "Process {} started.", index),
            Self::Exited(index) => write!(f, "Process {} exited.", index),
            Self::AllExited => f.write_str("All processes exited."),
        }
    }
}

/// Sink for diagnostic events
///
/// Called concurrently from every instance task; each `emit` must write its
/// line atomically.
pub trait Diagnostics: Send + Sync + 'static {
    fn emit(&self, event: Event);
}

/// Writes each event as a line to stderr
#[derive(Clone, Copy, Debug, Default)]
pub struct Stderr;

impl Diagnostics for Stderr {
    fn emit(&self, event: Event) {
        let mut stderr = io::stderr().lock();
        if let Err(err) = writeln!(stderr, "{}", event) {
            warn!("failed to write diagnostic '{}': {}", event, err);
        }
    }
}

/// Keeps events in memory, in the order they were emitted
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

impl Diagnostics for Recorder {
    fn emit(&self, event: Event) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_lines() {
        assert_eq!(Event::Starting(3).to_string(), "Starting 3 processes...");
        assert_eq!(Event::Started(0).to_string(), "Process 0 started.");
        assert_eq!(Event::Exited(12).to_string(), "Process 12 exited.");
        assert_eq!(Event::AllExited.to_string(), "All processes exited.");
    }

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = Recorder::new();
        recorder.emit(Event::Starting(1));
        recorder.emit(Event::Started(0));
        recorder.emit(Event::Exited(0));
        recorder.emit(Event::AllExited);

        assert_eq!(
            recorder.lines(),
            vec![
                "Starting 1 processes...",
                "Process 0 started.",
                "Process 0 exited.",
                "All processes exited.",
            ]
        );
    }
}
