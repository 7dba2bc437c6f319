//! Build event reporting.
//!
//! The pipeline announces what it did through a [`Reporter`] handed to it,
//! rather than through process-wide state.

use std::path::PathBuf;
use std::sync::Mutex;

/// Something worth reporting about a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// Node.js compatibility was requested.
    NodeCompatRequested,
    /// A build mode was selected.
    ModeSelected { raw_worker: bool },
    /// A build finished and was packaged (`bundle`) or left as-is.
    Built { bundle: bool, output: PathBuf },
}

/// Receiver of [`BuildEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: BuildEvent);
}

/// Writes events to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: BuildEvent) {
        match event {
            BuildEvent::NodeCompatRequested => log::warn!(
                "Enabling Node.js compatibility mode for builtins and globals. \
                 This is experimental and has serious tradeoffs."
            ),
            BuildEvent::ModeSelected { raw_worker: true } => {
                log::info!("Building raw _worker.js")
            }
            BuildEvent::ModeSelected { raw_worker: false } => {
                log::info!("Building Functions")
            }
            BuildEvent::Built { bundle, output } => log::info!(
                "Compiled {} to {}",
                if bundle { "worker bundle" } else { "worker" },
                output.display()
            ),
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<BuildEvent>>,
}

impl RecordingReporter {
    /// Events reported so far.
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, event: BuildEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
