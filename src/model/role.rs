use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Role codes that bypass profile checks entirely.
pub const SUPER_ROLES: [&str; 4] = ["ADMIN", "SUPER_ADMIN", "CEO", "DIRECTOR"];

/// Normalizes a role code: trimmed, uppercased, `ROLE_` prefix removed.
pub fn normalize_role(code: &str) -> String {
    let upper = code.trim().to_uppercase();
    match upper.strip_prefix("ROLE_") {
        Some(rest) => rest.to_string(),
        None => upper,
    }
}

pub fn is_super_role(code: &str) -> bool {
    let normalized = normalize_role(code);
    SUPER_ROLES.contains(&normalized.as_str())
}

/// Explicit grants held in the capability table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    ApproveLeave,
    ApprovePayroll,
    DisbursePayroll,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_prefix_and_case_are_ignored() {
        assert!(is_super_role("admin"));
        assert!(is_super_role(" ROLE_Director "));
        assert!(!is_super_role("ROLE_STAFF"));
        assert_eq!(normalize_role("role_ceo"), "CEO");
    }

    #[test]
    fn capability_round_trips_through_column_text() {
        let cap: Capability = "approve_payroll".parse().unwrap();
        assert_eq!(cap, Capability::ApprovePayroll);
        assert_eq!(Capability::DisbursePayroll.as_ref(), "disburse_payroll");
    }
}
