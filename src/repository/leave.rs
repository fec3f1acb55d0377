use async_trait::async_trait;
use sqlx::{FromRow, MySqlPool};

use crate::model::leave_request::{LeaveApprovalTask, LeaveDecision, LeaveStatus};
use crate::payroll::store::{LeaveStore, StoreResult};
use crate::repository::decode_enum;

#[derive(FromRow)]
struct TaskRow {
    id: u64,
    employee_id: u64,
    department: String,
    status: String,
    approver_id: Option<u64>,
}

pub struct MySqlLeaves {
    pool: MySqlPool,
}

impl MySqlLeaves {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaves {
    async fn load_task(&self, leave_id: u64) -> StoreResult<Option<LeaveApprovalTask>> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT lr.id, lr.employee_id, e.department, lr.status, lr.approver_id
            FROM leave_requests lr
            JOIN employees e ON e.id = lr.employee_id
            WHERE lr.id = ?
            "#,
        )
        .bind(leave_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(LeaveApprovalTask {
            leave_id: row.id,
            requester_id: row.employee_id,
            requester_department: row.department,
            status: decode_enum::<LeaveStatus>("status", &row.status)?,
            assigned_approver_id: row.approver_id,
        }))
    }

    async fn decide(
        &self,
        leave_id: u64,
        decision: LeaveDecision,
        approver_id: Option<u64>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, approver_id = COALESCE(?, approver_id), decided_at = NOW()
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(decision.resulting_status().as_ref())
        .bind(approver_id)
        .bind(leave_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
