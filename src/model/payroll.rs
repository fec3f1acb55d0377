use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::model::payment::PaymentMethod;
use crate::payroll::period::Period;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    PendingApproval,
    Posted,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DisbursementStatus {
    Pending,
    Paid,
}

/// Computed result for one employee in one run version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollLine {
    pub employee_id: u64,
    pub employee_code: String,
    pub employee_name: String,
    pub department: String,

    pub attendance_days: u32,
    pub leave_days: u32,
    pub late_count: u32,
    #[schema(example = "1.00")]
    pub overtime_hours: Decimal,

    #[schema(example = "5000000")]
    pub basic_salary: Decimal,
    pub transport_allowance: Decimal,
    pub meal_allowance: Decimal,
    pub position_allowance: Decimal,
    pub overtime_pay: Decimal,

    pub bpjs_kesehatan: Decimal,
    pub bpjs_ketenagakerjaan: Decimal,
    pub pph21: Decimal,

    #[schema(example = "6000000")]
    pub gross_salary: Decimal,
    pub total_deductions: Decimal,
    #[schema(example = "5557500")]
    pub net_salary: Decimal,
}

impl PayrollLine {
    pub fn bpjs_total(&self) -> Decimal {
        self.bpjs_kesehatan + self.bpjs_ketenagakerjaan
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollSummary {
    pub gross: Decimal,
    pub deductions: Decimal,
    pub net: Decimal,
    pub bpjs_total: Decimal,
    pub tax_total: Decimal,
    pub employee_count: u32,
    pub overtime_hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Disbursement {
    pub status: DisbursementStatus,
    /// Payment number once paid, e.g. `PAY-202501-0001`.
    pub reference: Option<String>,
    pub method: Option<PaymentMethod>,
    pub paid_at: Option<DateTime<Utc>>,
    pub paid_by: Option<u64>,
    pub journal_reference: Option<String>,
}

impl Default for Disbursement {
    fn default() -> Self {
        Self {
            status: DisbursementStatus::Pending,
            reference: None,
            method: None,
            paid_at: None,
            paid_by: None,
            journal_reference: None,
        }
    }
}

impl Disbursement {
    pub fn is_paid(&self) -> bool {
        self.status == DisbursementStatus::Paid && self.reference.is_some()
    }
}

/// The single authoritative payload for a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayrollRun {
    #[schema(value_type = String, example = "2025-01")]
    pub period: Period,
    /// Starts at 1, bumped by every save.
    pub version: u64,
    pub formula_version: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: u64,
    pub status: RunStatus,
    pub summary: PayrollSummary,
    pub lines: Vec<PayrollLine>,
    /// Employee id chosen at draft time to approve and disburse this run.
    pub assigned_approver_id: Option<u64>,
    pub posted_journal_reference: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub posted_by: Option<u64>,
    pub disbursement: Disbursement,
}

/// Every field that is frozen once the run has been posted.
#[derive(Serialize)]
struct FrozenCore<'a> {
    period: &'a Period,
    formula_version: &'a str,
    generated_at: &'a DateTime<Utc>,
    generated_by: u64,
    status: RunStatus,
    summary: &'a PayrollSummary,
    lines: &'a [PayrollLine],
    assigned_approver_id: Option<u64>,
    posted_journal_reference: Option<&'a str>,
    posted_at: Option<&'a DateTime<Utc>>,
    posted_by: Option<u64>,
}

impl PayrollRun {
    pub fn is_posted(&self) -> bool {
        self.posted_journal_reference.is_some()
    }

    /// Serialized form of everything except the disbursement state and the version counter.
    pub fn frozen_core(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&FrozenCore {
            period: &self.period,
            formula_version: &self.formula_version,
            generated_at: &self.generated_at,
            generated_by: self.generated_by,
            status: self.status,
            summary: &self.summary,
            lines: &self.lines,
            assigned_approver_id: self.assigned_approver_id,
            posted_journal_reference: self.posted_journal_reference.as_deref(),
            posted_at: self.posted_at.as_ref(),
            posted_by: self.posted_by,
        })
    }
}

/// Lightweight row returned by the version history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunVersionSummary {
    pub version: u64,
    pub status: RunStatus,
    pub disbursement_status: DisbursementStatus,
    pub generated_at: DateTime<Utc>,
    pub generated_by: u64,
    pub summary: PayrollSummary,
}

impl From<&PayrollRun> for RunVersionSummary {
    fn from(run: &PayrollRun) -> Self {
        Self {
            version: run.version,
            status: run.status,
            disbursement_status: run.disbursement.status,
            generated_at: run.generated_at,
            generated_by: run.generated_by,
            summary: run.summary.clone(),
        }
    }
}
