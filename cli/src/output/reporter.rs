//! Terminal-backed implementation of the `ProgressReporter` port.

use crate::application::ports::ProgressReporter;
use crate::output::OutputContext;

/// Reports service-layer progress through an [`OutputContext`].
pub struct TerminalReporter<'a> {
    output: &'a OutputContext,
}

impl<'a> TerminalReporter<'a> {
    #[must_use]
    pub fn new(output: &'a OutputContext) -> Self {
        Self { output }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, msg: &str) {
        self.output.info(msg);
    }

    fn success(&self, msg: &str) {
        self.output.success(msg);
    }

    fn warn(&self, msg: &str) {
        self.output.warn(msg);
    }
}
