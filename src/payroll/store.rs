//! Contracts with the collaborators the payroll engine reads from and writes to.
//!
//! MySQL implementations live in `crate::repository`; in-memory ones in
//! [`crate::payroll::memory`] back the tests.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, RosterFilter};
use crate::model::leave_request::{LeaveApprovalTask, LeaveDecision};
use crate::model::ledger::{ChartAccount, JournalLine, JournalPosting};
use crate::model::payment::PaymentIntent;
use crate::model::payroll::PayrollRun;
use crate::model::role::Capability;
use crate::payroll::error::PayrollError;
use crate::payroll::period::Period;

pub type StoreResult<T> = Result<T, PayrollError>;

/// HR master data, read only.
#[async_trait]
pub trait RosterReader: Send + Sync {
    async fn read_roster(&self, filter: &RosterFilter) -> StoreResult<Vec<Employee>>;

    async fn find_by_id(&self, employee_id: u64) -> StoreResult<Option<Employee>>;

    /// Case-insensitive match on the employee email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;
}

#[async_trait]
pub trait AttendanceReader: Send + Sync {
    /// Rows for `employee_ids` dated within `[start, end)`.
    async fn read_attendance(
        &self,
        employee_ids: &[u64],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<Vec<AttendanceRecord>>;
}

/// Black-box general ledger. Lines must already balance.
#[async_trait]
pub trait LedgerPoster: Send + Sync {
    async fn post_journal(&self, reference: &str, lines: &[JournalLine])
    -> StoreResult<JournalPosting>;

    async fn find_posting(&self, reference: &str) -> StoreResult<Option<JournalPosting>>;
}

#[async_trait]
pub trait ChartOfAccounts: Send + Sync {
    async fn list_accounts(&self) -> StoreResult<Vec<ChartAccount>>;
}

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn load_run(&self, period: &Period) -> StoreResult<Option<PayrollRun>>;

    /// `expected_version = None` requires that no run exists yet. Otherwise the
    /// stored version must equal it, or the save fails with `Conflict`.
    async fn save_run(&self, run: &PayrollRun, expected_version: Option<u64>) -> StoreResult<()>;

    /// Every saved version, oldest first.
    async fn run_history(&self, period: &Period) -> StoreResult<Vec<PayrollRun>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Next number in the `PAY-YYYYMM-NNNN` sequence for the period.
    async fn next_payment_number(&self, period: &Period) -> StoreResult<String>;

    async fn create_intent(&self, intent: &PaymentIntent) -> StoreResult<()>;

    async fn open_intent(&self, period: &Period) -> StoreResult<Option<PaymentIntent>>;

    async fn complete_intent(&self, intent_id: &str, completed_at: chrono::DateTime<chrono::Utc>)
    -> StoreResult<()>;

    async fn fail_intent(&self, intent_id: &str, reason: &str) -> StoreResult<()>;

    async fn pending_intents(&self) -> StoreResult<Vec<PaymentIntent>>;
}

#[async_trait]
pub trait CapabilityStore: Send + Sync {
    async fn capabilities_for(&self, employee_id: u64) -> StoreResult<HashSet<Capability>>;

    async fn holders_of(&self, capability: Capability) -> StoreResult<Vec<u64>>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn load_task(&self, leave_id: u64) -> StoreResult<Option<LeaveApprovalTask>>;

    /// Applies the decision if the request is still pending. Returns false when
    /// another writer got there first.
    async fn decide(
        &self,
        leave_id: u64,
        decision: LeaveDecision,
        approver_id: Option<u64>,
    ) -> StoreResult<bool>;
}
