//! Lifecycle of a payroll run.
//!
//! ```text
//! PENDING_APPROVAL --approve--> POSTED
//! disbursement:  PENDING --disburse--> PAID   (only while POSTED)
//! ```
//!
//! Both moves are one-way. Replaying a finished move returns the existing
//! reference without touching the ledger.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, instrument, warn};

use crate::model::employee::RosterFilter;
use crate::model::ledger::{JournalLine, JournalPosting};
use crate::model::payment::{IntentStatus, PaymentIntent, PaymentMethod};
use crate::model::payroll::{Disbursement, DisbursementStatus, PayrollRun, RunStatus};
use crate::payroll::accounts::AccountResolver;
use crate::payroll::authority::{Actor, AuthorityResolver};
use crate::payroll::error::PayrollError;
use crate::payroll::journal::{accrual_journal, disbursement_journal};
use crate::payroll::period::Period;
use crate::payroll::store::{LedgerPoster, PaymentStore, RosterReader, RunStore};

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub run: PayrollRun,
    pub reference: String,
    /// True when the move had already happened and nothing was written.
    pub replayed: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
}

/// Posted runs may only change their disbursement state.
pub fn ensure_core_unchanged(before: &PayrollRun, after: &PayrollRun) -> Result<(), PayrollError> {
    if before.is_posted() && before.frozen_core()? != after.frozen_core()? {
        return Err(PayrollError::conflict(format!(
            "payroll {} is posted; only disbursement fields may change",
            before.period
        )));
    }
    Ok(())
}

fn as_dependency_failure(what: &str, err: PayrollError) -> PayrollError {
    match err {
        PayrollError::DependencyFailure(_) => err,
        other => PayrollError::DependencyFailure(format!("{what}: {other}")),
    }
}

pub struct PayrollStateMachine {
    runs: Arc<dyn RunStore>,
    ledger: Arc<dyn LedgerPoster>,
    payments: Arc<dyn PaymentStore>,
    roster: Arc<dyn RosterReader>,
    accounts: Arc<AccountResolver>,
    reject_inactive_at_approval: bool,
}

impl PayrollStateMachine {
    pub fn new(
        runs: Arc<dyn RunStore>,
        ledger: Arc<dyn LedgerPoster>,
        payments: Arc<dyn PaymentStore>,
        roster: Arc<dyn RosterReader>,
        accounts: Arc<AccountResolver>,
        reject_inactive_at_approval: bool,
    ) -> Self {
        Self {
            runs,
            ledger,
            payments,
            roster,
            accounts,
            reject_inactive_at_approval,
        }
    }

    async fn load(&self, period: &Period) -> Result<PayrollRun, PayrollError> {
        self.runs
            .load_run(period)
            .await?
            .ok_or_else(|| PayrollError::NotFound(format!("no payroll run exists for {period}")))
    }

    /// Posts the journal under `reference`, or adopts the one a previous
    /// attempt already landed.
    async fn post_once(
        &self,
        reference: &str,
        lines: &[JournalLine],
    ) -> Result<JournalPosting, PayrollError> {
        if let Some(existing) = self
            .ledger
            .find_posting(reference)
            .await
            .map_err(|e| as_dependency_failure("ledger lookup failed", e))?
        {
            warn!(reference, journal_id = %existing.journal_id, "Adopting journal posted by an earlier attempt");
            return Ok(existing);
        }
        match self.ledger.post_journal(reference, lines).await {
            Ok(posting) => Ok(posting),
            Err(e) => {
                // The account map may be stale if the ledger refused an account.
                self.accounts.invalidate().await;
                Err(as_dependency_failure(&format!("ledger rejected journal {reference}"), e))
            }
        }
    }

    /// Employees on the draft who are no longer on the payroll roster.
    async fn roster_drift(&self, run: &PayrollRun) -> Result<Vec<String>, PayrollError> {
        let current: HashSet<u64> = self
            .roster
            .read_roster(&RosterFilter::payroll())
            .await?
            .into_iter()
            .map(|e| e.id)
            .collect();
        Ok(run
            .lines
            .iter()
            .filter(|l| !current.contains(&l.employee_id))
            .map(|l| l.employee_code.clone())
            .collect())
    }

    #[instrument(skip(self, actor, authority), fields(user_id = actor.user_id))]
    pub async fn approve(
        &self,
        period: Period,
        actor: &Actor,
        authority: &AuthorityResolver,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, PayrollError> {
        authority.authorize_payroll(actor).await?;
        let run = self.load(&period).await?;

        if let Some(reference) = run.posted_journal_reference.clone() {
            info!(reference = %reference, "Payroll already posted");
            return Ok(TransitionOutcome {
                run,
                reference,
                replayed: true,
            });
        }

        let drifted = self.roster_drift(&run).await?;
        if !drifted.is_empty() {
            if self.reject_inactive_at_approval {
                return Err(PayrollError::conflict(format!(
                    "employees {} left the roster after the draft was generated; regenerate the draft",
                    drifted.join(", ")
                )));
            }
            warn!(employees = ?drifted, "Posting draft lines for employees no longer on the roster");
        }

        let accounts = self.accounts.resolve().await?;
        let lines = accrual_journal(&run, &accounts)?;
        let reference = period.posting_reference();
        let posting = self.post_once(&reference, &lines).await?;

        let mut posted = run.clone();
        posted.version = run.version + 1;
        posted.status = RunStatus::Posted;
        posted.posted_journal_reference = Some(reference.clone());
        posted.posted_at = Some(now);
        posted.posted_by = Some(actor.user_id);

        if let Err(e) = self.runs.save_run(&posted, Some(run.version)).await {
            error!(error = %e, reference = %reference, "Journal posted but run not marked POSTED; retry will adopt it");
            return Err(e);
        }

        info!(
            reference = %reference,
            journal_id = %posting.journal_id,
            gross = %posted.summary.gross,
            net = %posted.summary.net,
            "Payroll approved and posted"
        );
        Ok(TransitionOutcome {
            run: posted,
            reference,
            replayed: false,
        })
    }

    /// Opens a new payment intent, or resumes the one an interrupted attempt left.
    async fn open_intent(
        &self,
        run: &PayrollRun,
        actor: &Actor,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<PaymentIntent, PayrollError> {
        if let Some(intent) = self.payments.open_intent(&run.period).await? {
            info!(payment_number = %intent.payment_number, "Resuming pending payment intent");
            return Ok(intent);
        }

        let intent = PaymentIntent {
            id: uuid::Uuid::new_v4().to_string(),
            period: run.period,
            payment_number: self.payments.next_payment_number(&run.period).await?,
            amount: run.summary.net,
            method,
            status: IntentStatus::Pending,
            journal_reference: run.period.disbursement_reference(),
            requested_by: actor.user_id,
            created_at: now,
            completed_at: None,
            failure_reason: None,
        };
        self.payments.create_intent(&intent).await?;
        Ok(intent)
    }

    fn paid(run: &PayrollRun, intent: &PaymentIntent, paid_by: u64, now: DateTime<Utc>) -> PayrollRun {
        let mut paid = run.clone();
        paid.version = run.version + 1;
        paid.disbursement = Disbursement {
            status: DisbursementStatus::Paid,
            reference: Some(intent.payment_number.clone()),
            method: Some(intent.method),
            paid_at: Some(now),
            paid_by: Some(paid_by),
            journal_reference: Some(intent.journal_reference.clone()),
        };
        paid
    }

    #[instrument(skip(self, actor, authority), fields(user_id = actor.user_id))]
    pub async fn disburse(
        &self,
        period: Period,
        actor: &Actor,
        authority: &AuthorityResolver,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<TransitionOutcome, PayrollError> {
        let run = self.load(&period).await?;
        authority.authorize_disbursement(actor, &run).await?;

        if run.status != RunStatus::Posted || run.posted_journal_reference.is_none() {
            return Err(PayrollError::conflict(format!(
                "payroll {period} must be approved and posted first"
            )));
        }
        if run.disbursement.is_paid() {
            let reference = run.disbursement.reference.clone().unwrap_or_default();
            info!(payment_number = %reference, "Payroll already disbursed");
            return Ok(TransitionOutcome {
                run,
                reference,
                replayed: true,
            });
        }
        if run.summary.net <= Decimal::ZERO {
            return Err(PayrollError::conflict(format!(
                "payroll {period} has no net amount to disburse"
            )));
        }

        let accounts = self.accounts.resolve().await?;
        let intent = self.open_intent(&run, actor, method, now).await?;
        let lines = disbursement_journal(&run, &accounts, &intent.payment_number)?;

        let posting = match self.post_once(&intent.journal_reference, &lines).await {
            Ok(posting) => posting,
            Err(e) => {
                // Compensation: the intent must not look like a payment.
                match self.payments.fail_intent(&intent.id, &e.to_string()).await {
                    Ok(()) => warn!(
                        payment_number = %intent.payment_number,
                        error = %e,
                        "Disbursement journal failed; intent marked FAILED"
                    ),
                    Err(store) => error!(
                        payment_number = %intent.payment_number,
                        error = %e,
                        store_error = %store,
                        "Disbursement journal failed and the intent could not be marked FAILED; reconciliation will settle it"
                    ),
                }
                return Err(e);
            }
        };

        let paid = Self::paid(&run, &intent, actor.user_id, now);
        ensure_core_unchanged(&run, &paid)?;
        self.runs.save_run(&paid, Some(run.version)).await?;
        self.payments.complete_intent(&intent.id, now).await?;

        info!(
            payment_number = %intent.payment_number,
            journal_id = %posting.journal_id,
            amount = %intent.amount,
            "Payroll disbursed"
        );
        Ok(TransitionOutcome {
            reference: intent.payment_number.clone(),
            run: paid,
            replayed: false,
        })
    }

    /// Resolves intents left PENDING by interrupted disbursements that are at
    /// least `grace` old.
    #[instrument(skip(self))]
    pub async fn reconcile(
        &self,
        now: DateTime<Utc>,
        grace: Duration,
    ) -> Result<ReconcileReport, PayrollError> {
        let mut report = ReconcileReport::default();

        for intent in self.payments.pending_intents().await? {
            if intent.created_at > now - grace {
                continue;
            }

            match self.ledger.find_posting(&intent.journal_reference).await? {
                Some(_) => {
                    if let Some(run) = self.runs.load_run(&intent.period).await? {
                        if run.is_posted() && !run.disbursement.is_paid() {
                            let paid = Self::paid(&run, &intent, intent.requested_by, now);
                            ensure_core_unchanged(&run, &paid)?;
                            self.runs.save_run(&paid, Some(run.version)).await?;
                        }
                    }
                    self.payments.complete_intent(&intent.id, now).await?;
                    info!(payment_number = %intent.payment_number, "Reconciled pending intent as completed");
                    report.completed.push(intent.payment_number);
                }
                None => {
                    self.payments
                        .fail_intent(&intent.id, "no ledger posting found during reconciliation")
                        .await?;
                    warn!(payment_number = %intent.payment_number, "Reconciled pending intent as failed");
                    report.failed.push(intent.payment_number);
                }
            }
        }
        Ok(report)
    }
}
