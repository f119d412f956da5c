use planivo_domain::{ScopeContext, UserId};
use serde::Serialize;

use super::credentials::GeneratedPassword;

/// One failed row, keyed by its original row number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Row number counting the header as row 1.
    pub row: usize,
    /// Email as submitted.
    pub email: String,
    /// Human-readable failure reason.
    pub error: String,
}

/// Aggregated outcome of one import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Rows provisioned successfully.
    pub success: usize,
    /// Rows that failed.
    pub failed: usize,
    /// Failures in input order.
    pub errors: Vec<RowFailure>,
    /// Successful rows that created a new account.
    pub created: usize,
    /// Successful rows that reused an existing identity.
    pub reused: usize,
    /// Whether the call deadline cut the batch short.
    pub timed_out: bool,
    /// Rows absent from this report because of the deadline.
    pub not_attempted: usize,
}

impl BatchReport {
    pub(super) fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Success(identity) => {
                self.success += 1;
                match identity.account {
                    AccountOrigin::Created(_) => self.created += 1,
                    AccountOrigin::Reused => self.reused += 1,
                }
            }
            RowOutcome::Failure(failure) => {
                self.failed += 1;
                self.errors.push(failure.clone());
            }
        }
    }

    pub(super) fn mark_timed_out(&mut self, remaining_rows: usize) {
        self.timed_out = true;
        self.not_attempted = remaining_rows;
    }

    /// Number of rows accounted for in this report.
    #[must_use]
    pub fn reported_rows(&self) -> usize {
        self.success + self.failed
    }
}

/// How the identity behind a successful row was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum AccountOrigin {
    Created(GeneratedPassword),
    Reused,
}

/// Identity materialized for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ProvisionedIdentity {
    pub user_id: UserId,
    pub email: String,
    pub full_name: String,
    pub scope: ScopeContext,
    pub account: AccountOrigin,
    pub leave_balances_created: usize,
    pub leave_balances_present: usize,
}

/// Terminal state of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RowOutcome {
    Success(ProvisionedIdentity),
    Failure(RowFailure),
}
