//! MySQL-backed implementations of the `payroll::store` contracts.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::MySqlPool;

use crate::payroll::service::Collaborators;

pub mod attendance;
pub mod capability;
pub mod employee;
pub mod leave;
pub mod ledger;
pub mod payment;
pub mod payroll_run;

/// Parses a string column into one of the strum-backed enums.
pub(crate) fn decode_enum<T>(column: &str, raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = strum::ParseError>,
{
    T::from_str(raw.trim()).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub fn collaborators(pool: &MySqlPool) -> Collaborators {
    let ledger = Arc::new(ledger::MySqlLedger::new(pool.clone()));
    Collaborators {
        roster: Arc::new(employee::MySqlRoster::new(pool.clone())),
        attendance: Arc::new(attendance::MySqlAttendance::new(pool.clone())),
        ledger: ledger.clone(),
        chart: ledger,
        runs: Arc::new(payroll_run::MySqlRunStore::new(pool.clone())),
        payments: Arc::new(payment::MySqlPayments::new(pool.clone())),
        capabilities: Arc::new(capability::MySqlCapabilities::new(pool.clone())),
        leaves: Arc::new(leave::MySqlLeaves::new(pool.clone())),
    }
}
