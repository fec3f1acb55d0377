use crate::api::leave_request::LeaveDecisionResponse;
use crate::api::payroll::{DisburseRequest, ReconcileResponse, TransitionResponse};
use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::ledger::JournalLine;
use crate::model::payment::PaymentMethod;
use crate::model::payroll::{
    Disbursement, DisbursementStatus, PayrollLine, PayrollRun, PayrollSummary, RunStatus,
    RunVersionSummary,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payroll Run Engine API",
        version = "1.0.0",
        description = r#"
## Payroll Run Engine

Monthly payroll for the HR module: drafts computed from the roster and the
attendance ledger, approval that posts an accrual journal, and disbursement
that posts the cash journal.

### Lifecycle
- `POST /payroll/{period}/draft` computes or recomputes the run while it is pending
- `POST /payroll/{period}/approve` posts `PAYROLL-YYYY-MM` and freezes the run
- `POST /payroll/{period}/disburse` pays the posted run once (`PAY-YYYYMM-NNNN`)

Replaying approve or disburse returns the existing reference.

### Security
Every endpoint takes a **JWT Bearer** access token. Authority comes from the
login role, explicit capability grants, and the caller's employee profile.

### Errors
`{ "error": "...", "kind": "invalid_input | not_authorized | conflict | dependency_failure | not_found | internal" }`
"#,
    ),
    paths(
        crate::api::payroll::generate_draft,
        crate::api::payroll::get_run,
        crate::api::payroll::run_history,
        crate::api::payroll::approve,
        crate::api::payroll::disburse,
        crate::api::payroll::reconcile,

        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave
    ),
    components(
        schemas(
            PayrollRun,
            PayrollLine,
            PayrollSummary,
            Disbursement,
            RunStatus,
            DisbursementStatus,
            RunVersionSummary,
            PaymentMethod,
            JournalLine,
            Employee,
            EmployeeStatus,
            DisburseRequest,
            TransitionResponse,
            ReconcileResponse,
            LeaveDecisionResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payroll", description = "Payroll run lifecycle APIs"),
        (name = "Leave", description = "Leave approval APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
