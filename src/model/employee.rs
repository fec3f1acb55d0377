use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP-001",
        "full_name": "Siti Rahma",
        "email": "siti.rahma@company.co.id",
        "department": "Human Capital",
        "position": "HR Manager",
        "status": "ACTIVE",
        "base_salary": "5000000"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP-001")]
    pub employee_code: String,

    #[schema(example = "Siti Rahma")]
    pub full_name: String,

    #[schema(example = "siti.rahma@company.co.id", nullable = true)]
    pub email: Option<String>,

    /// Free text, owned by HR master data.
    #[schema(example = "Human Capital")]
    pub department: String,

    /// Free text, owned by HR master data.
    #[schema(example = "HR Manager")]
    pub position: String,

    pub status: EmployeeStatus,

    #[schema(example = "5000000")]
    pub base_salary: Decimal,
}

/// Roster query used by the draft builder and the authority resolver.
#[derive(Debug, Clone, Default)]
pub struct RosterFilter {
    pub statuses: Vec<EmployeeStatus>,
}

impl RosterFilter {
    pub fn payroll() -> Self {
        Self {
            statuses: vec![EmployeeStatus::Active, EmployeeStatus::OnLeave],
        }
    }

    pub fn matches(&self, employee: &Employee) -> bool {
        self.statuses.is_empty() || self.statuses.contains(&employee.status)
    }
}
