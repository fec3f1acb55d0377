use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::warn;

use crate::model::role::Capability;
use crate::payroll::store::{CapabilityStore, StoreResult};

pub struct MySqlCapabilities {
    pool: MySqlPool,
}

impl MySqlCapabilities {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapabilityStore for MySqlCapabilities {
    async fn capabilities_for(&self, employee_id: u64) -> StoreResult<HashSet<Capability>> {
        let codes = sqlx::query_scalar::<_, String>(
            "SELECT capability FROM employee_capabilities WHERE employee_id = ?",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        // Unknown codes are ignored so new grants can be rolled out ahead of the code.
        Ok(codes
            .iter()
            .filter_map(|code| match code.trim().parse::<Capability>() {
                Ok(capability) => Some(capability),
                Err(_) => {
                    warn!(employee_id, capability = %code, "Ignoring unknown capability grant");
                    None
                }
            })
            .collect())
    }

    async fn holders_of(&self, capability: Capability) -> StoreResult<Vec<u64>> {
        Ok(sqlx::query_scalar::<_, u64>(
            r#"
            SELECT employee_id
            FROM employee_capabilities
            WHERE capability = ?
            ORDER BY employee_id
            "#,
        )
        .bind(capability.as_ref())
        .fetch_all(&self.pool)
        .await?)
    }
}
