use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument};

use crate::model::employee::RosterFilter;
use crate::model::payroll::{Disbursement, PayrollLine, PayrollRun, PayrollSummary, RunStatus};
use crate::payroll::authority::AuthorityResolver;
use crate::payroll::calculator::{FORMULA_VERSION, calculate_line};
use crate::payroll::error::PayrollError;
use crate::payroll::money::{round_hours, round_money};
use crate::payroll::period::Period;
use crate::payroll::store::{AttendanceReader, RosterReader, RunStore};

/// Totals re-derivable from the lines alone.
pub fn summarize(lines: &[PayrollLine]) -> PayrollSummary {
    let sum = |f: fn(&PayrollLine) -> Decimal| lines.iter().map(f).sum::<Decimal>();

    PayrollSummary {
        gross: round_money(sum(|l| l.gross_salary)),
        deductions: round_money(sum(|l| l.total_deductions)),
        net: round_money(sum(|l| l.net_salary)),
        bpjs_total: round_money(sum(|l| l.bpjs_total())),
        tax_total: round_money(sum(|l| l.pph21)),
        employee_count: lines.len() as u32,
        overtime_hours: round_hours(sum(|l| l.overtime_hours)),
    }
}

pub struct DraftBuilder {
    roster: Arc<dyn RosterReader>,
    attendance: Arc<dyn AttendanceReader>,
    runs: Arc<dyn RunStore>,
}

impl DraftBuilder {
    pub fn new(
        roster: Arc<dyn RosterReader>,
        attendance: Arc<dyn AttendanceReader>,
        runs: Arc<dyn RunStore>,
    ) -> Self {
        Self {
            roster,
            attendance,
            runs,
        }
    }

    /// Computes and stores a PENDING_APPROVAL run for `period`, replacing any
    /// unposted payload. Authority is checked by the caller.
    #[instrument(skip(self, authority, period), fields(period = %period))]
    pub async fn build(
        &self,
        period: Period,
        requested_by: u64,
        authority: &AuthorityResolver,
        now: DateTime<Utc>,
    ) -> Result<PayrollRun, PayrollError> {
        let existing = self.runs.load_run(&period).await?;
        if let Some(run) = &existing {
            if run.is_posted() {
                return Err(PayrollError::AlreadyPosted(period.to_string()));
            }
        }

        let roster = self.roster.read_roster(&RosterFilter::payroll()).await?;
        let approver = authority
            .select_payroll_approver(&roster)
            .await?
            .ok_or(PayrollError::NoActiveApprover)?;

        let (start, end) = period.window();
        let ids: Vec<u64> = roster.iter().map(|e| e.id).collect();
        let rows: Vec<_> = if ids.is_empty() {
            Vec::new()
        } else {
            self.attendance.read_attendance(&ids, start, end).await?
        }
        .into_iter()
        .filter(|r| period.contains(r.date))
        .collect();
        debug!(employees = roster.len(), rows = rows.len(), "Time ledger loaded");

        let mut employees = roster;
        employees.sort_by_key(|e| e.id);
        let lines: Vec<PayrollLine> = employees.iter().map(|e| calculate_line(e, &rows)).collect();
        let summary = summarize(&lines);

        let expected_version = existing.as_ref().map(|r| r.version);
        let run = PayrollRun {
            period,
            version: expected_version.map_or(1, |v| v + 1),
            formula_version: FORMULA_VERSION.to_string(),
            generated_at: now,
            generated_by: requested_by,
            status: RunStatus::PendingApproval,
            summary,
            lines,
            assigned_approver_id: Some(approver),
            posted_journal_reference: None,
            posted_at: None,
            posted_by: None,
            disbursement: Disbursement::default(),
        };

        self.runs.save_run(&run, expected_version).await?;
        info!(
            version = run.version,
            employees = run.summary.employee_count,
            gross = %run.summary.gross,
            net = %run.summary.net,
            approver,
            "Payroll draft generated"
        );
        Ok(run)
    }
}
