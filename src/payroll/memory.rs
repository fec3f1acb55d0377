//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::model::attendance::AttendanceRecord;
use crate::model::employee::{Employee, EmployeeStatus, RosterFilter};
use crate::model::leave_request::{LeaveApprovalTask, LeaveDecision, LeaveStatus};
use crate::model::ledger::{AccountType, ChartAccount, JournalLine, JournalPosting};
use crate::model::payment::{IntentStatus, PaymentIntent};
use crate::model::payroll::PayrollRun;
use crate::model::role::Capability;
use crate::payroll::error::PayrollError;
use crate::payroll::period::Period;
use crate::payroll::store::*;

pub fn employee(id: u64, department: &str, position: &str, base: Decimal) -> Employee {
    Employee {
        id,
        employee_code: format!("EMP-{id:03}"),
        full_name: format!("Employee {id}"),
        email: Some(format!("emp{id}@company.co.id")),
        department: department.to_string(),
        position: position.to_string(),
        status: EmployeeStatus::Active,
        base_salary: base,
    }
}

#[derive(Default)]
pub struct MemoryRoster {
    pub employees: Mutex<Vec<Employee>>,
}

impl MemoryRoster {
    pub fn with(employees: Vec<Employee>) -> Self {
        Self {
            employees: Mutex::new(employees),
        }
    }

    pub fn set_status(&self, employee_id: u64, status: EmployeeStatus) {
        let mut employees = self.employees.lock().unwrap();
        if let Some(e) = employees.iter_mut().find(|e| e.id == employee_id) {
            e.status = status;
        }
    }
}

#[async_trait]
impl RosterReader for MemoryRoster {
    async fn read_roster(&self, filter: &RosterFilter) -> StoreResult<Vec<Employee>> {
        let mut found: Vec<Employee> = self
            .employees
            .lock()
            .unwrap()
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        found.sort_by_key(|e| e.id);
        Ok(found)
    }

    async fn find_by_id(&self, employee_id: u64) -> StoreResult<Option<Employee>> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == employee_id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .employees
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.email.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(email)))
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryAttendance {
    pub rows: Mutex<Vec<AttendanceRecord>>,
}

#[async_trait]
impl AttendanceReader for MemoryAttendance {
    async fn read_attendance(
        &self,
        employee_ids: &[u64],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| employee_ids.contains(&r.employee_id))
            .filter(|r| r.date >= start.date() && r.date < end.date())
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryLedger {
    pub journals: Mutex<HashMap<String, (JournalPosting, Vec<JournalLine>)>>,
    pub post_calls: AtomicUsize,
    pub reject_posts: AtomicBool,
}

impl MemoryLedger {
    pub fn lines(&self, reference: &str) -> Option<Vec<JournalLine>> {
        self.journals
            .lock()
            .unwrap()
            .get(reference)
            .map(|(_, lines)| lines.clone())
    }

    pub fn posts(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.reject_posts.store(rejecting, Ordering::SeqCst);
    }
}

#[async_trait]
impl LedgerPoster for MemoryLedger {
    async fn post_journal(
        &self,
        reference: &str,
        lines: &[JournalLine],
    ) -> StoreResult<JournalPosting> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_posts.load(Ordering::SeqCst) {
            return Err(PayrollError::DependencyFailure(
                "ledger rejected the journal".into(),
            ));
        }
        let mut journals = self.journals.lock().unwrap();
        if journals.contains_key(reference) {
            return Err(PayrollError::conflict(format!(
                "journal {reference} already posted"
            )));
        }
        let posting = JournalPosting {
            reference: reference.to_string(),
            journal_id: format!("JRN-{}", journals.len() + 1),
            posted_at: Utc::now(),
        };
        journals.insert(reference.to_string(), (posting.clone(), lines.to_vec()));
        Ok(posting)
    }

    async fn find_posting(&self, reference: &str) -> StoreResult<Option<JournalPosting>> {
        Ok(self
            .journals
            .lock()
            .unwrap()
            .get(reference)
            .map(|(p, _)| p.clone()))
    }
}

pub struct MemoryChart {
    pub accounts: Vec<ChartAccount>,
}

impl MemoryChart {
    pub fn standard() -> Self {
        let account = |code: &str, name: &str, account_type| ChartAccount {
            code: code.to_string(),
            name: name.to_string(),
            account_type,
            is_active: true,
        };
        Self {
            accounts: vec![
                account("1-1000", "Kas Besar", AccountType::Asset),
                account("1-1100", "Bank BCA", AccountType::Asset),
                account("2-1100", "Hutang Usaha", AccountType::Liability),
                account("2-1200", "Hutang Gaji", AccountType::Liability),
                account("2-1300", "Hutang PPh 21", AccountType::Liability),
                account("2-1400", "Hutang BPJS", AccountType::Liability),
                account("6-1000", "Beban Sewa", AccountType::Expense),
                account("6-2000", "Beban Gaji Karyawan", AccountType::Expense),
            ],
        }
    }
}

#[async_trait]
impl ChartOfAccounts for MemoryChart {
    async fn list_accounts(&self) -> StoreResult<Vec<ChartAccount>> {
        Ok(self.accounts.clone())
    }
}

#[derive(Default)]
pub struct MemoryRunStore {
    pub current: Mutex<HashMap<Period, PayrollRun>>,
    pub history: Mutex<Vec<PayrollRun>>,
    pub reject_saves: AtomicBool,
}

impl MemoryRunStore {
    pub fn get(&self, period: &Period) -> Option<PayrollRun> {
        self.current.lock().unwrap().get(period).cloned()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn load_run(&self, period: &Period) -> StoreResult<Option<PayrollRun>> {
        Ok(self.get(period))
    }

    async fn save_run(&self, run: &PayrollRun, expected_version: Option<u64>) -> StoreResult<()> {
        if self.reject_saves.load(Ordering::SeqCst) {
            return Err(PayrollError::DependencyFailure("run store unavailable".into()));
        }
        let mut current = self.current.lock().unwrap();
        let stored = current.get(&run.period).map(|r| r.version);
        if stored != expected_version {
            return Err(PayrollError::conflict(format!(
                "payroll {} was modified concurrently",
                run.period
            )));
        }
        current.insert(run.period, run.clone());
        self.history.lock().unwrap().push(run.clone());
        Ok(())
    }

    async fn run_history(&self, period: &Period) -> StoreResult<Vec<PayrollRun>> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|r| &r.period == period)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryPayments {
    pub intents: Mutex<Vec<PaymentIntent>>,
    pub counters: Mutex<HashMap<Period, u32>>,
    pub reject_updates: AtomicBool,
}

impl MemoryPayments {
    pub fn all(&self) -> Vec<PaymentIntent> {
        self.intents.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentStore for MemoryPayments {
    async fn next_payment_number(&self, period: &Period) -> StoreResult<String> {
        let mut counters = self.counters.lock().unwrap();
        let seq = counters.entry(*period).or_insert(0);
        *seq += 1;
        Ok(format!("PAY-{}-{:04}", period.compact(), seq))
    }

    async fn create_intent(&self, intent: &PaymentIntent) -> StoreResult<()> {
        self.intents.lock().unwrap().push(intent.clone());
        Ok(())
    }

    async fn open_intent(&self, period: &Period) -> StoreResult<Option<PaymentIntent>> {
        Ok(self
            .intents
            .lock()
            .unwrap()
            .iter()
            .find(|i| &i.period == period && i.status == IntentStatus::Pending)
            .cloned())
    }

    async fn complete_intent(&self, intent_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        let mut intents = self.intents.lock().unwrap();
        if let Some(intent) = intents.iter_mut().find(|i| i.id == intent_id) {
            intent.status = IntentStatus::Completed;
            intent.completed_at = Some(completed_at);
        }
        Ok(())
    }

    async fn fail_intent(&self, intent_id: &str, reason: &str) -> StoreResult<()> {
        if self.reject_updates.load(Ordering::SeqCst) {
            return Err(PayrollError::DependencyFailure("payment store unavailable".into()));
        }
        let mut intents = self.intents.lock().unwrap();
        if let Some(intent) = intents.iter_mut().find(|i| i.id == intent_id) {
            intent.status = IntentStatus::Failed;
            intent.failure_reason = Some(reason.to_string());
        }
        Ok(())
    }

    async fn pending_intents(&self) -> StoreResult<Vec<PaymentIntent>> {
        Ok(self
            .intents
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == IntentStatus::Pending)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryCapabilities {
    pub grants: Mutex<HashMap<u64, HashSet<Capability>>>,
}

impl MemoryCapabilities {
    pub fn grant(&self, employee_id: u64, capability: Capability) {
        self.grants
            .lock()
            .unwrap()
            .entry(employee_id)
            .or_default()
            .insert(capability);
    }
}

#[async_trait]
impl CapabilityStore for MemoryCapabilities {
    async fn capabilities_for(&self, employee_id: u64) -> StoreResult<HashSet<Capability>> {
        Ok(self
            .grants
            .lock()
            .unwrap()
            .get(&employee_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn holders_of(&self, capability: Capability) -> StoreResult<Vec<u64>> {
        let mut holders: Vec<u64> = self
            .grants
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, caps)| caps.contains(&capability))
            .map(|(id, _)| *id)
            .collect();
        holders.sort_unstable();
        Ok(holders)
    }
}

#[derive(Default)]
pub struct MemoryLeaves {
    pub tasks: Mutex<HashMap<u64, LeaveApprovalTask>>,
}

impl MemoryLeaves {
    pub fn insert(&self, task: LeaveApprovalTask) {
        self.tasks.lock().unwrap().insert(task.leave_id, task);
    }
}

#[async_trait]
impl LeaveStore for MemoryLeaves {
    async fn load_task(&self, leave_id: u64) -> StoreResult<Option<LeaveApprovalTask>> {
        Ok(self.tasks.lock().unwrap().get(&leave_id).cloned())
    }

    async fn decide(
        &self,
        leave_id: u64,
        decision: LeaveDecision,
        approver_id: Option<u64>,
    ) -> StoreResult<bool> {
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&leave_id) {
            Some(task) if task.status == LeaveStatus::Pending => {
                task.status = decision.resulting_status();
                task.assigned_approver_id = approver_id.or(task.assigned_approver_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
