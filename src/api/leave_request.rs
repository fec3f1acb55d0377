use crate::auth::auth::AuthUser;
use crate::model::leave_request::LeaveApprovalTask;
use crate::payroll::PayrollService;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "message": "Leave approved",
    "leave_id": 1,
    "status": "approved",
    "approver_id": 12
}))]
pub struct LeaveDecisionResponse {
    pub message: String,
    pub leave_id: u64,
    #[schema(example = "approved")]
    pub status: String,
    /// Employee id recorded as the approver; absent for super-role decisions
    /// on unassigned requests.
    pub approver_id: Option<u64>,
}

impl LeaveDecisionResponse {
    fn new(message: &str, task: LeaveApprovalTask) -> Self {
        Self {
            message: message.to_string(),
            leave_id: task.leave_id,
            status: task.status.to_string(),
            approver_id: task.assigned_approver_id,
        }
    }
}

/* =========================
Approve leave
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = LeaveDecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not decide on this request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let task = service.approve_leave(leave_id, &auth.to_actor()).await?;
    Ok(HttpResponse::Ok().json(LeaveDecisionResponse::new("Leave approved", task)))
}

/* =========================
Reject leave
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = LeaveDecisionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller may not decide on this request"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<PayrollService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();
    let task = service.reject_leave(leave_id, &auth.to_actor()).await?;
    Ok(HttpResponse::Ok().json(LeaveDecisionResponse::new("Leave rejected", task)))
}
