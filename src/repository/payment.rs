use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::model::payment::{IntentStatus, PaymentIntent, PaymentMethod};
use crate::payroll::error::PayrollError;
use crate::payroll::period::Period;
use crate::payroll::store::{PaymentStore, StoreResult};
use crate::repository::decode_enum;

#[derive(FromRow)]
struct IntentRow {
    id: String,
    period: String,
    payment_number: String,
    amount: Decimal,
    method: String,
    status: String,
    journal_reference: String,
    requested_by: u64,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
}

impl TryFrom<IntentRow> for PaymentIntent {
    type Error = PayrollError;

    fn try_from(row: IntentRow) -> Result<Self, Self::Error> {
        Ok(PaymentIntent {
            id: row.id,
            period: Period::parse(&row.period)?,
            payment_number: row.payment_number,
            amount: row.amount,
            method: decode_enum::<PaymentMethod>("method", &row.method)?,
            status: decode_enum::<IntentStatus>("status", &row.status)?,
            journal_reference: row.journal_reference,
            requested_by: row.requested_by,
            created_at: row.created_at,
            completed_at: row.completed_at,
            failure_reason: row.failure_reason,
        })
    }
}

const SELECT_INTENT: &str = r#"
    SELECT id, period, payment_number, amount, method, status, journal_reference,
           requested_by, created_at, completed_at, failure_reason
    FROM payment_intents
"#;

pub struct MySqlPayments {
    pool: MySqlPool,
}

impl MySqlPayments {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for MySqlPayments {
    async fn next_payment_number(&self, period: &Period) -> StoreResult<String> {
        // LAST_INSERT_ID(expr) makes the bumped counter visible on this statement's result.
        let result = sqlx::query(
            r#"
            INSERT INTO payment_sequences (period, last_number)
            VALUES (?, LAST_INSERT_ID(1))
            ON DUPLICATE KEY UPDATE last_number = LAST_INSERT_ID(last_number + 1)
            "#,
        )
        .bind(period.to_string())
        .execute(&self.pool)
        .await?;

        Ok(format!("PAY-{}-{:04}", period.compact(), result.last_insert_id()))
    }

    async fn create_intent(&self, intent: &PaymentIntent) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_intents
            (id, period, payment_number, amount, method, status, journal_reference, requested_by, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&intent.id)
        .bind(intent.period.to_string())
        .bind(&intent.payment_number)
        .bind(intent.amount)
        .bind(intent.method.as_ref())
        .bind(intent.status.as_ref())
        .bind(&intent.journal_reference)
        .bind(intent.requested_by)
        .bind(intent.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn open_intent(&self, period: &Period) -> StoreResult<Option<PaymentIntent>> {
        let row = sqlx::query_as::<_, IntentRow>(&format!(
            "{SELECT_INTENT} WHERE period = ? AND status = ? ORDER BY created_at LIMIT 1"
        ))
        .bind(period.to_string())
        .bind(IntentStatus::Pending.as_ref())
        .fetch_optional(&self.pool)
        .await?;
        row.map(PaymentIntent::try_from).transpose()
    }

    async fn complete_intent(&self, intent_id: &str, completed_at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE payment_intents SET status = ?, completed_at = ? WHERE id = ?")
            .bind(IntentStatus::Completed.as_ref())
            .bind(completed_at)
            .bind(intent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fail_intent(&self, intent_id: &str, reason: &str) -> StoreResult<()> {
        sqlx::query("UPDATE payment_intents SET status = ?, failure_reason = ? WHERE id = ?")
            .bind(IntentStatus::Failed.as_ref())
            .bind(reason)
            .bind(intent_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn pending_intents(&self) -> StoreResult<Vec<PaymentIntent>> {
        let rows = sqlx::query_as::<_, IntentRow>(&format!(
            "{SELECT_INTENT} WHERE status = ? ORDER BY created_at"
        ))
        .bind(IntentStatus::Pending.as_ref())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PaymentIntent::try_from).collect()
    }
}
