use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures_util::TryStreamExt;
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::payroll::store::{AttendanceReader, StoreResult};
use crate::repository::decode_enum;

#[derive(FromRow)]
struct AttendanceRow {
    employee_id: u64,
    date: NaiveDate,
    status: String,
    check_in: Option<NaiveDateTime>,
    check_out: Option<NaiveDateTime>,
    is_late: bool,
}

pub struct MySqlAttendance {
    pool: MySqlPool,
}

impl MySqlAttendance {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceReader for MySqlAttendance {
    async fn read_attendance(
        &self,
        employee_ids: &[u64],
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        if employee_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; employee_ids.len()].join(", ");
        let sql = format!(
            r#"
            SELECT employee_id, date, status, check_in, check_out, is_late
            FROM attendance
            WHERE employee_id IN ({placeholders})
              AND date >= ? AND date < ?
            ORDER BY employee_id, date
            "#
        );

        let mut query = sqlx::query_as::<_, AttendanceRow>(&sql);
        for id in employee_ids {
            query = query.bind(id);
        }
        let mut stream = query.bind(start.date()).bind(end.date()).fetch(&self.pool);

        let mut records = Vec::new();
        while let Some(row) = stream.try_next().await? {
            records.push(AttendanceRecord {
                employee_id: row.employee_id,
                date: row.date,
                status: decode_enum::<AttendanceStatus>("status", &row.status)?,
                check_in: row.check_in,
                check_out: row.check_out,
                is_late: row.is_late,
            });
        }
        debug!(rows = records.len(), "Attendance rows streamed");
        Ok(records)
    }
}
