use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::model::employee::{Employee, EmployeeStatus, RosterFilter};
use crate::payroll::store::{RosterReader, StoreResult};
use crate::repository::decode_enum;

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    employee_code: String,
    full_name: String,
    email: Option<String>,
    department: String,
    position: String,
    status: String,
    base_salary: Decimal,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = sqlx::Error;

    fn try_from(row: EmployeeRow) -> Result<Self, Self::Error> {
        Ok(Employee {
            id: row.id,
            employee_code: row.employee_code,
            full_name: row.full_name,
            email: row.email,
            department: row.department,
            position: row.position,
            status: decode_enum::<EmployeeStatus>("status", &row.status)?,
            base_salary: row.base_salary,
        })
    }
}

const SELECT_EMPLOYEE: &str = r#"
    SELECT id, employee_code, full_name, email, department, position, status, base_salary
    FROM employees
"#;

pub struct MySqlRoster {
    pool: MySqlPool,
}

impl MySqlRoster {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RosterReader for MySqlRoster {
    async fn read_roster(&self, filter: &RosterFilter) -> StoreResult<Vec<Employee>> {
        let sql = if filter.statuses.is_empty() {
            format!("{SELECT_EMPLOYEE} ORDER BY id")
        } else {
            let placeholders = vec!["?"; filter.statuses.len()].join(", ");
            format!("{SELECT_EMPLOYEE} WHERE status IN ({placeholders}) ORDER BY id")
        };

        let mut query = sqlx::query_as::<_, EmployeeRow>(&sql);
        for status in &filter.statuses {
            query = query.bind(status.as_ref());
        }
        let rows = query.fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(Employee::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn find_by_id(&self, employee_id: u64) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!("{SELECT_EMPLOYEE} WHERE id = ?"))
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Employee::try_from).transpose()?)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!(
            "{SELECT_EMPLOYEE} WHERE LOWER(email) = LOWER(?) ORDER BY id LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Employee::try_from).transpose()?)
    }
}
