use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::{info, warn};

use crate::model::ledger::{AccountType, ChartAccount, JournalLine, JournalPosting};
use crate::payroll::error::PayrollError;
use crate::payroll::journal::ensure_balanced;
use crate::payroll::store::{ChartOfAccounts, LedgerPoster, StoreResult};
use crate::repository::decode_enum;

/// MySQL error code for a duplicate key.
const DUPLICATE_KEY: &str = "23000";

#[derive(FromRow)]
struct PostingRow {
    id: u64,
    reference: String,
    posted_at: DateTime<Utc>,
}

impl From<PostingRow> for JournalPosting {
    fn from(row: PostingRow) -> Self {
        JournalPosting {
            reference: row.reference,
            journal_id: format!("JRN-{:06}", row.id),
            posted_at: row.posted_at,
        }
    }
}

#[derive(FromRow)]
struct AccountRow {
    code: String,
    name: String,
    account_type: String,
    is_active: bool,
}

/// General ledger and chart of accounts, both living in the accounting schema.
pub struct MySqlLedger {
    pool: MySqlPool,
}

impl MySqlLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerPoster for MySqlLedger {
    async fn post_journal(
        &self,
        reference: &str,
        lines: &[JournalLine],
    ) -> StoreResult<JournalPosting> {
        ensure_balanced(lines)?;

        let mut tx = self.pool.begin().await?;
        let posted_at = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO journal_entries (reference, posted_at)
            VALUES (?, ?)
            "#,
        )
        .bind(reference)
        .bind(posted_at)
        .execute(&mut *tx)
        .await;

        let journal_id = match inserted {
            Ok(result) => result.last_insert_id(),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some(DUPLICATE_KEY) => {
                warn!(reference, "Journal reference already exists");
                return Err(PayrollError::conflict(format!(
                    "journal {reference} already posted"
                )));
            }
            Err(e) => return Err(e.into()),
        };

        for line in lines {
            sqlx::query(
                r#"
                INSERT INTO journal_lines (journal_id, account_code, debit, credit, description)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(journal_id)
            .bind(&line.account_code)
            .bind(line.debit)
            .bind(line.credit)
            .bind(&line.description)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(reference, journal_id, legs = lines.len(), "Journal posted");

        Ok(JournalPosting {
            reference: reference.to_string(),
            journal_id: format!("JRN-{journal_id:06}"),
            posted_at,
        })
    }

    async fn find_posting(&self, reference: &str) -> StoreResult<Option<JournalPosting>> {
        let row = sqlx::query_as::<_, PostingRow>(
            "SELECT id, reference, posted_at FROM journal_entries WHERE reference = ?",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(JournalPosting::from))
    }
}

#[async_trait]
impl ChartOfAccounts for MySqlLedger {
    async fn list_accounts(&self) -> StoreResult<Vec<ChartAccount>> {
        let rows = sqlx::query_as::<_, AccountRow>(
            "SELECT code, name, account_type, is_active FROM chart_of_accounts ORDER BY code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PayrollError::DependencyFailure(format!("chart of accounts unavailable: {e}")))?;

        let mut accounts = Vec::with_capacity(rows.len());
        for row in rows {
            accounts.push(ChartAccount {
                code: row.code,
                name: row.name,
                account_type: decode_enum::<AccountType>("account_type", &row.account_type)?,
                is_active: row.is_active,
            });
        }
        Ok(accounts)
    }
}
