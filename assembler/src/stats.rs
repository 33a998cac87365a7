//! Run statistics reported once a stream completes.

use std::collections::BTreeMap;

use tilegen_core::Command;

/// Counters collected while writing a stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    lines: u64,
    by_token: BTreeMap<&'static str, u64>,
    rules_committed: u64,
    reorders: u64,
    scans: u64,
}

impl StreamStats {
    /// Total lines written.
    #[must_use]
    pub const fn lines(&self) -> u64 {
        self.lines
    }

    /// Lines written with the given leading token.
    #[must_use]
    pub fn lines_with_token(&self, token: &str) -> u64 {
        self.by_token.get(token).copied().unwrap_or(0)
    }

    /// Per-token line counts, ordered by token.
    #[must_use]
    pub fn by_token(&self) -> &BTreeMap<&'static str, u64> {
        &self.by_token
    }

    /// Rule definitions covered by a sort request.
    #[must_use]
    pub const fn rules_committed(&self) -> u64 {
        self.rules_committed
    }

    /// Propagation steps that triggered a reorder pair.
    #[must_use]
    pub const fn reorders(&self) -> u64 {
        self.reorders
    }

    /// Full-grid scans written.
    #[must_use]
    pub const fn scans(&self) -> u64 {
        self.scans
    }

    pub(crate) fn record(&mut self, command: &Command) {
        self.lines += 1;
        *self.by_token.entry(command.token()).or_insert(0) += 1;
    }

    pub(crate) fn record_reorder(&mut self) {
        self.reorders += 1;
    }

    pub(crate) fn record_scan(&mut self) {
        self.scans += 1;
    }

    pub(crate) fn set_rules_committed(&mut self, committed: u64) {
        self.rules_committed = committed;
    }
}
