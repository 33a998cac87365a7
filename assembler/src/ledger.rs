//! Rule-set commit tracking.

use tilegen_core::Command;

/// Whether rule definitions are waiting for a sort request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleSetState {
    /// Every defined rule has been followed by a sort request.
    Committed,
    /// Rules were defined since the last sort request.
    PendingCommit {
        /// Rules defined since the last commit.
        defined: u64,
    },
}

/// State machine deciding when the stream must carry a sort request.
#[derive(Clone, Debug)]
pub struct RuleLedger {
    state: RuleSetState,
    committed: u64,
}

impl Default for RuleLedger {
    fn default() -> Self {
        Self {
            state: RuleSetState::Committed,
            committed: 0,
        }
    }
}

impl RuleLedger {
    /// Current commit state.
    #[must_use]
    pub const fn state(&self) -> RuleSetState {
        self.state
    }

    /// Number of rule definitions covered by a sort request so far.
    #[must_use]
    pub const fn committed(&self) -> u64 {
        self.committed
    }

    /// Records a rule definition written to the stream.
    pub fn record_definition(&mut self) {
        self.state = match self.state {
            RuleSetState::Committed => RuleSetState::PendingCommit { defined: 1 },
            RuleSetState::PendingCommit { defined } => RuleSetState::PendingCommit {
                defined: defined + 1,
            },
        };
    }

    /// Closes a rule burst.
    ///
    /// When `enforce` is set and rules are pending, returns the sort request
    /// that must follow the burst and moves to [`RuleSetState::Committed`].
    /// Otherwise the state is left untouched.
    pub fn close_burst(&mut self, enforce: bool) -> Option<Command> {
        if !enforce {
            return None;
        }
        match self.state {
            RuleSetState::Committed => None,
            RuleSetState::PendingCommit { .. } => {
                self.commit();
                Some(Command::Sort)
            }
        }
    }

    /// Records a sort request written to the stream for any other reason.
    pub fn commit(&mut self) {
        if let RuleSetState::PendingCommit { defined } = self.state {
            self.committed += defined;
        }
        self.state = RuleSetState::Committed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_closes_with_a_single_sort_when_enforced() {
        let mut ledger = RuleLedger::default();
        for _ in 0..3 {
            ledger.record_definition();
        }
        assert_eq!(ledger.state(), RuleSetState::PendingCommit { defined: 3 });

        assert_eq!(ledger.close_burst(true), Some(Command::Sort));
        assert_eq!(ledger.state(), RuleSetState::Committed);
        assert_eq!(ledger.committed(), 3);
        assert_eq!(ledger.close_burst(true), None);
    }

    #[test]
    fn unenforced_burst_stays_pending() {
        let mut ledger = RuleLedger::default();
        ledger.record_definition();
        assert_eq!(ledger.close_burst(false), None);
        assert_eq!(ledger.state(), RuleSetState::PendingCommit { defined: 1 });
    }

    #[test]
    fn reorder_commit_clears_pending_rules() {
        let mut ledger = RuleLedger::default();
        ledger.record_definition();
        ledger.record_definition();
        ledger.commit();
        assert_eq!(ledger.state(), RuleSetState::Committed);
        assert_eq!(ledger.committed(), 2);

        ledger.commit();
        assert_eq!(ledger.committed(), 2);
    }
}
