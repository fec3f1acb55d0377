use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::model::payment::PaymentMethod;
use crate::model::payroll::{DisbursementStatus, PayrollRun, RunStatus, RunVersionSummary};
use crate::payroll::state_machine::{ReconcileReport, TransitionOutcome};
use crate::payroll::{PayrollService, Period};

#[derive(Deserialize, ToSchema, Default)]
pub struct DisburseRequest {
    #[schema(example = "bank_transfer")]
    #[serde(default)]
    pub method: PaymentMethod,
}

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "period": "2025-01",
    "status": "POSTED",
    "disbursement_status": "PENDING",
    "reference": "PAYROLL-2025-01",
    "replayed": false,
    "version": 2
}))]
pub struct TransitionResponse {
    pub period: String,
    pub status: RunStatus,
    pub disbursement_status: DisbursementStatus,
    /// Journal reference for approval, payment number for disbursement.
    pub reference: String,
    /// True when the run was already in the requested state.
    pub replayed: bool,
    pub version: u64,
}

impl From<TransitionOutcome> for TransitionResponse {
    fn from(outcome: TransitionOutcome) -> Self {
        Self {
            period: outcome.run.period.to_string(),
            status: outcome.run.status,
            disbursement_status: outcome.run.disbursement.status,
            reference: outcome.reference,
            replayed: outcome.replayed,
            version: outcome.run.version,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReconcileResponse {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
}

impl From<ReconcileReport> for ReconcileResponse {
    fn from(report: ReconcileReport) -> Self {
        Self {
            completed: report.completed,
            failed: report.failed,
        }
    }
}

/* =========================
Generate draft
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/payroll/{period}/draft",
    params(
        ("period" = String, Path, description = "Payroll month, YYYY-MM", example = "2025-01")
    ),
    responses(
        (status = 201, description = "Draft generated", body = PayrollRun),
        (status = 400, description = "Malformed period"),
        (status = 403, description = "Caller may not manage payroll"),
        (status = 404, description = "No eligible approver on the roster"),
        (status = 409, description = "Period already posted")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn generate_draft(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let period = Period::parse(&path.into_inner())?;
    let run = service.generate_draft(period, &auth.to_actor()).await?;
    Ok(HttpResponse::Created().json(run))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{period}",
    params(
        ("period" = String, Path, description = "Payroll month, YYYY-MM", example = "2025-01")
    ),
    responses(
        (status = 200, body = PayrollRun),
        (status = 404, description = "No run for the period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_run(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let period = Period::parse(&path.into_inner())?;
    service.authorize_read(&auth.to_actor()).await?;
    Ok(HttpResponse::Ok().json(service.get_run(period).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{period}/history",
    params(
        ("period" = String, Path, description = "Payroll month, YYYY-MM", example = "2025-01")
    ),
    responses(
        (status = 200, body = [RunVersionSummary]),
        (status = 404, description = "No run for the period")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn run_history(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let period = Period::parse(&path.into_inner())?;
    service.authorize_read(&auth.to_actor()).await?;
    Ok(HttpResponse::Ok().json(service.run_history(period).await?))
}

/* =========================
Approve and post
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/payroll/{period}/approve",
    params(
        ("period" = String, Path, description = "Payroll month, YYYY-MM", example = "2025-01")
    ),
    responses(
        (status = 200, description = "Posted, or already posted", body = TransitionResponse),
        (status = 403, description = "Caller may not approve payroll"),
        (status = 404, description = "No run for the period"),
        (status = 409, description = "Concurrent modification or roster drift"),
        (status = 502, description = "Ledger or chart of accounts unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn approve(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let period = Period::parse(&path.into_inner())?;
    let outcome = service.approve(period, &auth.to_actor()).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::from(outcome)))
}

/* =========================
Disburse
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/payroll/{period}/disburse",
    params(
        ("period" = String, Path, description = "Payroll month, YYYY-MM", example = "2025-01")
    ),
    request_body = DisburseRequest,
    responses(
        (status = 200, description = "Paid, or already paid", body = TransitionResponse),
        (status = 403, description = "Caller may not disburse this run"),
        (status = 409, description = "Run is not posted yet"),
        (status = 502, description = "Ledger rejected the cash journal")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn disburse(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<String>,
    body: Option<web::Json<DisburseRequest>>,
) -> actix_web::Result<impl Responder> {
    let period = Period::parse(&path.into_inner())?;
    let method = body.map(|b| b.into_inner().method).unwrap_or_default();
    let outcome = service.disburse(period, &auth.to_actor(), method).await?;
    Ok(HttpResponse::Ok().json(TransitionResponse::from(outcome)))
}

#[utoipa::path(
    post,
    path = "/api/v1/payroll/reconcile",
    responses(
        (status = 200, body = ReconcileResponse),
        (status = 403, description = "Caller may not manage payroll")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn reconcile(
    auth: AuthUser,
    service: web::Data<PayrollService>,
) -> actix_web::Result<impl Responder> {
    let report = service.reconcile_as(&auth.to_actor()).await?;
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "Manual reconciliation finished"
    );
    Ok(HttpResponse::Ok().json(ReconcileResponse::from(report)))
}
