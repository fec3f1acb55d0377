use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use crate::model::payroll::PayrollRun;
use crate::payroll::error::PayrollError;
use crate::payroll::period::Period;
use crate::payroll::store::{RunStore, StoreResult};

const DUPLICATE_KEY: &str = "23000";

/// One row per period holding the current payload as JSON, plus an
/// append-only version table.
pub struct MySqlRunStore {
    pool: MySqlPool,
}

impl MySqlRunStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn concurrent_write(period: &Period) -> PayrollError {
    PayrollError::conflict(format!("payroll {period} was modified concurrently"))
}

#[async_trait]
impl RunStore for MySqlRunStore {
    async fn load_run(&self, period: &Period) -> StoreResult<Option<PayrollRun>> {
        let payload = sqlx::query_scalar::<_, String>(
            "SELECT CAST(payload AS CHAR) FROM payroll_runs WHERE period = ?",
        )
        .bind(period.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(payload
            .map(|json| serde_json::from_str::<PayrollRun>(&json))
            .transpose()?)
    }

    async fn save_run(&self, run: &PayrollRun, expected_version: Option<u64>) -> StoreResult<()> {
        let payload = serde_json::to_string(run)?;
        let period = run.period.to_string();
        let mut tx = self.pool.begin().await?;

        match expected_version {
            None => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO payroll_runs (period, version, status, disbursement_status, payload)
                    VALUES (?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&period)
                .bind(run.version)
                .bind(run.status.as_ref())
                .bind(run.disbursement.status.as_ref())
                .bind(&payload)
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(_) => {}
                    Err(sqlx::Error::Database(db_err))
                        if db_err.code().as_deref() == Some(DUPLICATE_KEY) =>
                    {
                        return Err(concurrent_write(&run.period));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Some(expected) => {
                let updated = sqlx::query(
                    r#"
                    UPDATE payroll_runs
                    SET version = ?, status = ?, disbursement_status = ?, payload = ?
                    WHERE period = ? AND version = ?
                    "#,
                )
                .bind(run.version)
                .bind(run.status.as_ref())
                .bind(run.disbursement.status.as_ref())
                .bind(&payload)
                .bind(&period)
                .bind(expected)
                .execute(&mut *tx)
                .await?;

                if updated.rows_affected() == 0 {
                    return Err(concurrent_write(&run.period));
                }
            }
        }

        sqlx::query(
            r#"
            INSERT INTO payroll_run_versions (period, version, payload)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&period)
        .bind(run.version)
        .bind(&payload)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(period = %run.period, version = run.version, "Payroll run saved");
        Ok(())
    }

    async fn run_history(&self, period: &Period) -> StoreResult<Vec<PayrollRun>> {
        let payloads = sqlx::query_scalar::<_, String>(
            r#"
            SELECT CAST(payload AS CHAR)
            FROM payroll_run_versions
            WHERE period = ?
            ORDER BY version
            "#,
        )
        .bind(period.to_string())
        .fetch_all(&self.pool)
        .await?;

        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(PayrollError::from))
            .collect()
    }
}
