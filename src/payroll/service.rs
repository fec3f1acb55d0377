use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, instrument};

use crate::model::leave_request::{LeaveApprovalTask, LeaveDecision, LeaveStatus};
use crate::model::payment::PaymentMethod;
use crate::model::payroll::{PayrollRun, RunVersionSummary};
use crate::payroll::accounts::AccountResolver;
use crate::payroll::authority::{Actor, AuthorityResolver};
use crate::payroll::builder::DraftBuilder;
use crate::payroll::error::PayrollError;
use crate::payroll::period::Period;
use crate::payroll::state_machine::{PayrollStateMachine, ReconcileReport, TransitionOutcome};
use crate::payroll::store::{
    AttendanceReader, CapabilityStore, ChartOfAccounts, LeaveStore, LedgerPoster, PaymentStore,
    RosterReader, RunStore,
};

/// Everything the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub roster: Arc<dyn RosterReader>,
    pub attendance: Arc<dyn AttendanceReader>,
    pub ledger: Arc<dyn LedgerPoster>,
    pub chart: Arc<dyn ChartOfAccounts>,
    pub runs: Arc<dyn RunStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub capabilities: Arc<dyn CapabilityStore>,
    pub leaves: Arc<dyn LeaveStore>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    pub account_cache_ttl: Duration,
    pub keyword_fallback: bool,
    pub reject_inactive_at_approval: bool,
    /// Minimum age of a pending intent before reconciliation touches it.
    pub reconcile_grace: chrono::Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            account_cache_ttl: Duration::from_secs(300),
            keyword_fallback: true,
            reject_inactive_at_approval: false,
            reconcile_grace: chrono::Duration::minutes(5),
        }
    }
}

/// Entry point used by the HTTP layer and the startup reconciliation task.
pub struct PayrollService {
    authority: AuthorityResolver,
    builder: DraftBuilder,
    machine: PayrollStateMachine,
    runs: Arc<dyn RunStore>,
    leaves: Arc<dyn LeaveStore>,
    reconcile_grace: chrono::Duration,
}

impl PayrollService {
    pub fn new(deps: Collaborators, settings: EngineSettings) -> Self {
        let accounts = Arc::new(AccountResolver::new(
            deps.chart.clone(),
            settings.account_cache_ttl,
        ));
        Self {
            authority: AuthorityResolver::new(
                deps.roster.clone(),
                deps.capabilities.clone(),
                settings.keyword_fallback,
            ),
            builder: DraftBuilder::new(
                deps.roster.clone(),
                deps.attendance.clone(),
                deps.runs.clone(),
            ),
            machine: PayrollStateMachine::new(
                deps.runs.clone(),
                deps.ledger.clone(),
                deps.payments.clone(),
                deps.roster.clone(),
                accounts,
                settings.reject_inactive_at_approval,
            ),
            runs: deps.runs,
            leaves: deps.leaves,
            reconcile_grace: settings.reconcile_grace,
        }
    }

    #[instrument(skip(self, actor), fields(user_id = actor.user_id))]
    pub async fn generate_draft(
        &self,
        period: Period,
        actor: &Actor,
    ) -> Result<PayrollRun, PayrollError> {
        self.authority.authorize_payroll(actor).await?;
        self.builder
            .build(period, actor.user_id, &self.authority, Utc::now())
            .await
    }

    /// Run payloads carry salaries; only payroll approvers may read them.
    pub async fn authorize_read(&self, actor: &Actor) -> Result<(), PayrollError> {
        self.authority.authorize_payroll(actor).await.map(|_| ())
    }

    pub async fn get_run(&self, period: Period) -> Result<PayrollRun, PayrollError> {
        self.runs
            .load_run(&period)
            .await?
            .ok_or_else(|| PayrollError::NotFound(format!("no payroll run exists for {period}")))
    }

    pub async fn run_history(&self, period: Period) -> Result<Vec<RunVersionSummary>, PayrollError> {
        let history = self.runs.run_history(&period).await?;
        if history.is_empty() {
            return Err(PayrollError::NotFound(format!(
                "no payroll run exists for {period}"
            )));
        }
        Ok(history.iter().map(RunVersionSummary::from).collect())
    }

    pub async fn approve(
        &self,
        period: Period,
        actor: &Actor,
    ) -> Result<TransitionOutcome, PayrollError> {
        self.machine
            .approve(period, actor, &self.authority, Utc::now())
            .await
    }

    pub async fn disburse(
        &self,
        period: Period,
        actor: &Actor,
        method: PaymentMethod,
    ) -> Result<TransitionOutcome, PayrollError> {
        self.machine
            .disburse(period, actor, &self.authority, method, Utc::now())
            .await
    }

    /// Any payroll approver may trigger reconciliation by hand.
    pub async fn reconcile_as(&self, actor: &Actor) -> Result<ReconcileReport, PayrollError> {
        self.authority.authorize_payroll(actor).await?;
        self.reconcile_disbursements().await
    }

    pub async fn reconcile_disbursements(&self) -> Result<ReconcileReport, PayrollError> {
        self.machine.reconcile(Utc::now(), self.reconcile_grace).await
    }

    pub async fn approve_leave(
        &self,
        leave_id: u64,
        actor: &Actor,
    ) -> Result<LeaveApprovalTask, PayrollError> {
        self.decide_leave(leave_id, actor, LeaveDecision::Approve).await
    }

    pub async fn reject_leave(
        &self,
        leave_id: u64,
        actor: &Actor,
    ) -> Result<LeaveApprovalTask, PayrollError> {
        self.decide_leave(leave_id, actor, LeaveDecision::Reject).await
    }

    #[instrument(skip(self, actor), fields(user_id = actor.user_id))]
    async fn decide_leave(
        &self,
        leave_id: u64,
        actor: &Actor,
        decision: LeaveDecision,
    ) -> Result<LeaveApprovalTask, PayrollError> {
        let task = self
            .leaves
            .load_task(leave_id)
            .await?
            .ok_or_else(|| PayrollError::NotFound(format!("leave request {leave_id} not found")))?;

        if task.status != LeaveStatus::Pending {
            return Err(PayrollError::conflict(format!(
                "leave request {leave_id} is already {}",
                task.status
            )));
        }

        let clearance = self.authority.authorize_leave(actor, &task).await?;
        let approver = clearance.employee_id();

        if !self.leaves.decide(leave_id, decision, approver).await? {
            return Err(PayrollError::conflict(format!(
                "leave request {leave_id} was decided by someone else"
            )));
        }

        info!(leave_id, ?decision, approver, "Leave request decided");
        Ok(LeaveApprovalTask {
            status: decision.resulting_status(),
            assigned_approver_id: approver.or(task.assigned_approver_id),
            ..task
        })
    }
}
