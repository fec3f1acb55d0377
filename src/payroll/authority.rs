//! Decides whether an actor may approve leave, approve payroll, or disburse it.
//!
//! Order of checks:
//! 1. super-role allow-list on the login role code,
//! 2. explicit capability grants on the actor's employee profile,
//! 3. keyword inference on the profile's free-text department and position.
//!
//! Step 3 is a legacy heuristic with no org chart behind it; it can be turned
//! off with `AUTHORITY_KEYWORD_FALLBACK=false` once grants are populated.

use std::collections::HashSet;
use std::sync::Arc;

use derive_more::Display;
use tracing::{debug, warn};

use crate::model::employee::{Employee, EmployeeStatus};
use crate::model::leave_request::LeaveApprovalTask;
use crate::model::payroll::PayrollRun;
use crate::model::role::{Capability, is_super_role};
use crate::payroll::error::PayrollError;
use crate::payroll::store::{CapabilityStore, RosterReader};

const HR_KEYWORDS: [&str; 7] = [
    "hr",
    "hrd",
    "hrga",
    "sdm",
    "human capital",
    "human resources",
    "people",
];

const MANAGER_KEYWORDS: [&str; 8] = [
    "manager",
    "manajer",
    "head",
    "kepala",
    "supervisor",
    "lead",
    "director",
    "ceo",
];

/// Departments whose managers may sign off payroll.
const BROAD_APPROVAL_DEPARTMENTS: [&str; 5] = ["management", "finance", "hr", "hrd", "sdm"];

/// The caller, as read from the access token.
#[derive(Debug, Clone, Display)]
#[display(fmt = "{}#{} ({})", username, user_id, role)]
pub struct Actor {
    pub user_id: u64,
    pub username: String,
    pub role: String,
    pub email: Option<String>,
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ApproveLeave,
    ApprovePayroll,
    DisbursePayroll,
}

impl Action {
    fn capability(&self) -> Capability {
        match self {
            Action::ApproveLeave => Capability::ApproveLeave,
            Action::ApprovePayroll => Capability::ApprovePayroll,
            Action::DisbursePayroll => Capability::DisbursePayroll,
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Action::ApproveLeave => "approve leave",
            Action::ApprovePayroll => "approve payroll",
            Action::DisbursePayroll => "disburse payroll",
        }
    }
}

/// Why an actor was let through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clearance {
    SuperRole,
    Granted { employee_id: u64 },
    HrProfile { employee_id: u64 },
    ManagerProfile { employee_id: u64 },
}

impl Clearance {
    pub fn employee_id(&self) -> Option<u64> {
        match self {
            Clearance::SuperRole => None,
            Clearance::Granted { employee_id }
            | Clearance::HrProfile { employee_id }
            | Clearance::ManagerProfile { employee_id } => Some(*employee_id),
        }
    }
}

/// Case-insensitive containment, so "Team Leader" counts as "lead" and
/// "HRBP" as "hr".
fn has_any(text: &str, keywords: &[&str]) -> bool {
    let text = text.to_lowercase();
    keywords.iter().any(|k| text.contains(k))
}

/// Organizational traits inferred from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileTraits {
    pub hr_like: bool,
    pub manager_like: bool,
    pub broad_department: bool,
}

pub fn classify(employee: &Employee) -> ProfileTraits {
    ProfileTraits {
        hr_like: has_any(&employee.department, &HR_KEYWORDS)
            || has_any(&employee.position, &HR_KEYWORDS),
        manager_like: has_any(&employee.position, &MANAGER_KEYWORDS),
        broad_department: has_any(&employee.department, &BROAD_APPROVAL_DEPARTMENTS),
    }
}

fn same_department(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

pub struct AuthorityResolver {
    roster: Arc<dyn RosterReader>,
    capabilities: Arc<dyn CapabilityStore>,
    keyword_fallback: bool,
}

impl AuthorityResolver {
    pub fn new(
        roster: Arc<dyn RosterReader>,
        capabilities: Arc<dyn CapabilityStore>,
        keyword_fallback: bool,
    ) -> Self {
        Self {
            roster,
            capabilities,
            keyword_fallback,
        }
    }

    /// The actor's ACTIVE employee record, matched by employee id, then email.
    pub async fn resolve_profile(&self, actor: &Actor) -> Result<Employee, PayrollError> {
        let profile = match actor.employee_id {
            Some(id) => self.roster.find_by_id(id).await?,
            None => match actor.email.as_deref().filter(|e| !e.trim().is_empty()) {
                Some(email) => self.roster.find_by_email(email.trim()).await?,
                None => None,
            },
        };

        let profile = profile.ok_or_else(|| {
            PayrollError::not_authorized(format!(
                "user '{}' is not linked to an employee profile",
                actor.username
            ))
        })?;

        if profile.status != EmployeeStatus::Active {
            return Err(PayrollError::not_authorized(format!(
                "employee profile {} is {} and cannot act as an approver",
                profile.employee_code, profile.status
            )));
        }
        Ok(profile)
    }

    async fn grants(&self, employee_id: u64) -> Result<HashSet<Capability>, PayrollError> {
        self.capabilities.capabilities_for(employee_id).await
    }

    fn deny(&self, actor: &Actor, action: Action, reason: &str) -> PayrollError {
        warn!(
            actor = %actor,
            action = action.describe(),
            reason,
            "Authorization denied"
        );
        PayrollError::not_authorized(format!(
            "user '{}' may not {}: {}",
            actor.username,
            action.describe(),
            reason
        ))
    }

    /// Payroll rule on a resolved profile, without the super-role shortcut.
    fn payroll_clearance(
        &self,
        profile: &Employee,
        grants: &HashSet<Capability>,
        action: Action,
    ) -> Option<Clearance> {
        if grants.contains(&action.capability()) {
            return Some(Clearance::Granted {
                employee_id: profile.id,
            });
        }
        if !self.keyword_fallback {
            return None;
        }
        let traits = classify(profile);
        if traits.hr_like {
            Some(Clearance::HrProfile {
                employee_id: profile.id,
            })
        } else if traits.manager_like && traits.broad_department {
            Some(Clearance::ManagerProfile {
                employee_id: profile.id,
            })
        } else {
            None
        }
    }

    pub async fn authorize_payroll(&self, actor: &Actor) -> Result<Clearance, PayrollError> {
        let action = Action::ApprovePayroll;
        if is_super_role(&actor.role) {
            debug!(user_id = actor.user_id, "Super role cleared payroll approval");
            return Ok(Clearance::SuperRole);
        }
        let profile = self.resolve_profile(actor).await?;
        let grants = self.grants(profile.id).await?;
        self.payroll_clearance(&profile, &grants, action).ok_or_else(|| {
            self.deny(
                actor,
                action,
                "requires an HR profile or a manager in management/finance/HR",
            )
        })
    }

    pub async fn authorize_disbursement(
        &self,
        actor: &Actor,
        run: &PayrollRun,
    ) -> Result<Clearance, PayrollError> {
        let action = Action::DisbursePayroll;
        if is_super_role(&actor.role) {
            return Ok(Clearance::SuperRole);
        }
        let profile = self.resolve_profile(actor).await?;
        let grants = self.grants(profile.id).await?;
        let clearance = self
            .payroll_clearance(&profile, &grants, action)
            .or_else(|| self.payroll_clearance(&profile, &grants, Action::ApprovePayroll))
            .ok_or_else(|| {
                self.deny(
                    actor,
                    action,
                    "requires an HR profile or a manager in management/finance/HR",
                )
            })?;

        match run.assigned_approver_id {
            Some(assigned) if assigned != profile.id => match clearance {
                Clearance::HrProfile { .. } => Ok(clearance),
                Clearance::Granted { .. } if grants.contains(&Capability::DisbursePayroll) => {
                    Ok(clearance)
                }
                _ => Err(self.deny(
                    actor,
                    action,
                    &format!("run is assigned to approver employee {assigned}"),
                )),
            },
            _ => Ok(clearance),
        }
    }

    pub async fn authorize_leave(
        &self,
        actor: &Actor,
        task: &LeaveApprovalTask,
    ) -> Result<Clearance, PayrollError> {
        let action = Action::ApproveLeave;
        if is_super_role(&actor.role) {
            return Ok(Clearance::SuperRole);
        }
        let profile = self.resolve_profile(actor).await?;
        let grants = self.grants(profile.id).await?;
        if grants.contains(&Capability::ApproveLeave) {
            return Ok(Clearance::Granted {
                employee_id: profile.id,
            });
        }
        if !self.keyword_fallback {
            return Err(self.deny(actor, action, "no leave approval grant"));
        }

        let traits = classify(&profile);
        if traits.hr_like {
            return Ok(Clearance::HrProfile {
                employee_id: profile.id,
            });
        }
        if !traits.manager_like {
            return Err(self.deny(actor, action, "requires an HR or managerial position"));
        }
        if !same_department(&profile.department, &task.requester_department) {
            return Err(self.deny(
                actor,
                action,
                "managers may only approve requests from their own department",
            ));
        }
        if let Some(assigned) = task.assigned_approver_id {
            if assigned != profile.id {
                return Err(self.deny(
                    actor,
                    action,
                    &format!("request is already assigned to approver employee {assigned}"),
                ));
            }
        }
        Ok(Clearance::ManagerProfile {
            employee_id: profile.id,
        })
    }

    /// Picks the approver recorded on a new draft: ACTIVE employees holding an
    /// explicit grant first, then HR profiles, then broad-department managers;
    /// lowest id within each tier.
    pub async fn select_payroll_approver(
        &self,
        roster: &[Employee],
    ) -> Result<Option<u64>, PayrollError> {
        let mut active: Vec<&Employee> = roster
            .iter()
            .filter(|e| e.status == EmployeeStatus::Active)
            .collect();
        active.sort_by_key(|e| e.id);

        let holders = self.capabilities.holders_of(Capability::ApprovePayroll).await?;
        if let Some(e) = active.iter().find(|e| holders.contains(&e.id)) {
            return Ok(Some(e.id));
        }
        if !self.keyword_fallback {
            return Ok(None);
        }
        let classified: Vec<(&Employee, ProfileTraits)> =
            active.iter().map(|e| (*e, classify(e))).collect();
        if let Some((e, _)) = classified.iter().find(|(_, t)| t.hr_like) {
            return Ok(Some(e.id));
        }
        Ok(classified
            .iter()
            .find(|(_, t)| t.manager_like && t.broad_department)
            .map(|(e, _)| e.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveStatus;
    use crate::payroll::memory::{MemoryCapabilities, MemoryRoster, employee};
    use rust_decimal_macros::dec;

    fn actor(role: &str, employee_id: Option<u64>) -> Actor {
        Actor {
            user_id: 100,
            username: "tester".into(),
            role: role.into(),
            email: None,
            employee_id,
        }
    }

    fn resolver_with(employees: Vec<Employee>) -> (AuthorityResolver, Arc<MemoryCapabilities>) {
        let caps = Arc::new(MemoryCapabilities::default());
        let resolver = AuthorityResolver::new(
            Arc::new(MemoryRoster::with(employees)),
            caps.clone(),
            true,
        );
        (resolver, caps)
    }

    fn task(requester_department: &str, assigned: Option<u64>) -> LeaveApprovalTask {
        LeaveApprovalTask {
            leave_id: 1,
            requester_id: 50,
            requester_department: requester_department.into(),
            status: LeaveStatus::Pending,
            assigned_approver_id: assigned,
        }
    }

    #[test]
    fn keywords_match_anywhere_in_department_or_position() {
        let hr = employee(1, "HR & GA", "Staff", dec!(1));
        assert!(classify(&hr).hr_like);

        let people = employee(2, "PeopleOps", "Officer", dec!(1));
        assert!(classify(&people).hr_like);

        let bp = employee(3, "Finance", "HRBP", dec!(1));
        assert!(classify(&bp).hr_like);

        let capital = employee(4, "Human Capital", "Analyst", dec!(1));
        assert!(classify(&capital).hr_like);

        let leader = employee(5, "Finance", "Finance Team Leader", dec!(1));
        let traits = classify(&leader);
        assert!(traits.manager_like && traits.broad_department && !traits.hr_like);

        let leadership = employee(6, "Management", "Leadership Program", dec!(1));
        assert!(classify(&leadership).manager_like);

        let staff = employee(7, "Warehouse", "Staff", dec!(1));
        assert_eq!(
            classify(&staff),
            ProfileTraits {
                hr_like: false,
                manager_like: false,
                broad_department: false,
            }
        );
    }

    #[actix_web::test]
    async fn finance_team_leader_approves_payroll() {
        let (resolver, _) =
            resolver_with(vec![employee(5, "Finance", "Finance Team Leader", dec!(1))]);
        assert_eq!(
            resolver.authorize_payroll(&actor("ROLE_STAFF", Some(5))).await.unwrap(),
            Clearance::ManagerProfile { employee_id: 5 }
        );
    }

    #[actix_web::test]
    async fn super_roles_skip_profile_lookup() {
        let (resolver, _) = resolver_with(vec![]);
        let clearance = resolver.authorize_payroll(&actor("role_admin", None)).await.unwrap();
        assert_eq!(clearance, Clearance::SuperRole);
        assert!(resolver.authorize_payroll(&actor("Director", None)).await.is_ok());
    }

    #[actix_web::test]
    async fn warehouse_staff_cannot_approve_payroll() {
        let (resolver, _) = resolver_with(vec![employee(3, "Warehouse", "Staff", dec!(1))]);
        let err = resolver
            .authorize_payroll(&actor("ROLE_STAFF", Some(3)))
            .await
            .unwrap_err();
        assert!(matches!(err, PayrollError::NotAuthorized(_)));
    }

    #[actix_web::test]
    async fn hr_department_approves_regardless_of_position() {
        let (resolver, _) = resolver_with(vec![employee(4, "HR", "Junior Clerk", dec!(1))]);
        let clearance = resolver
            .authorize_payroll(&actor("ROLE_STAFF", Some(4)))
            .await
            .unwrap();
        assert_eq!(clearance, Clearance::HrProfile { employee_id: 4 });
    }

    #[actix_web::test]
    async fn managers_need_a_broad_department_for_payroll() {
        let (resolver, _) = resolver_with(vec![
            employee(5, "Warehouse", "Warehouse Manager", dec!(1)),
            employee(6, "Finance", "Finance Manager", dec!(1)),
        ]);
        assert!(resolver.authorize_payroll(&actor("STAFF", Some(5))).await.is_err());
        assert_eq!(
            resolver.authorize_payroll(&actor("STAFF", Some(6))).await.unwrap(),
            Clearance::ManagerProfile { employee_id: 6 }
        );
    }

    #[actix_web::test]
    async fn inactive_or_unlinked_profiles_are_rejected() {
        let mut hr = employee(7, "HR", "Manager", dec!(1));
        hr.status = EmployeeStatus::OnLeave;
        let (resolver, _) = resolver_with(vec![hr]);
        assert!(resolver.authorize_payroll(&actor("STAFF", Some(7))).await.is_err());
        assert!(resolver.authorize_payroll(&actor("STAFF", None)).await.is_err());
    }

    #[actix_web::test]
    async fn profile_resolves_by_email_when_no_employee_claim() {
        let (resolver, _) = resolver_with(vec![employee(8, "SDM", "Staff", dec!(1))]);
        let mut by_mail = actor("STAFF", None);
        by_mail.email = Some("EMP8@Company.co.id".into());
        assert!(resolver.authorize_payroll(&by_mail).await.is_ok());
    }

    #[actix_web::test]
    async fn explicit_grants_work_without_keyword_fallback() {
        let caps = Arc::new(MemoryCapabilities::default());
        caps.grant(9, Capability::ApprovePayroll);
        let resolver = AuthorityResolver::new(
            Arc::new(MemoryRoster::with(vec![
                employee(9, "Warehouse", "Staff", dec!(1)),
                employee(10, "HR", "HR Manager", dec!(1)),
            ])),
            caps,
            false,
        );
        assert_eq!(
            resolver.authorize_payroll(&actor("STAFF", Some(9))).await.unwrap(),
            Clearance::Granted { employee_id: 9 }
        );
        assert!(resolver.authorize_payroll(&actor("STAFF", Some(10))).await.is_err());
    }

    #[actix_web::test]
    async fn leave_approval_by_department_manager() {
        let (resolver, _) = resolver_with(vec![
            employee(11, "Warehouse", "Warehouse Supervisor", dec!(1)),
            employee(12, "Sales", "Sales Manager", dec!(1)),
            employee(13, "HRD", "Staff", dec!(1)),
        ]);
        let pending = task("warehouse", None);

        assert!(resolver.authorize_leave(&actor("STAFF", Some(11)), &pending).await.is_ok());
        assert!(resolver.authorize_leave(&actor("STAFF", Some(12)), &pending).await.is_err());
        assert!(resolver.authorize_leave(&actor("STAFF", Some(13)), &pending).await.is_ok());
    }

    #[actix_web::test]
    async fn leave_task_held_by_another_approver_blocks_managers_only() {
        let (resolver, _) = resolver_with(vec![
            employee(11, "Warehouse", "Warehouse Supervisor", dec!(1)),
            employee(13, "HR", "Staff", dec!(1)),
        ]);
        let taken = task("Warehouse", Some(77));
        assert!(resolver.authorize_leave(&actor("STAFF", Some(11)), &taken).await.is_err());
        assert!(resolver.authorize_leave(&actor("STAFF", Some(13)), &taken).await.is_ok());

        let own = task("Warehouse", Some(11));
        assert!(resolver.authorize_leave(&actor("STAFF", Some(11)), &own).await.is_ok());
    }

    #[actix_web::test]
    async fn hr_profiles_decide_any_leave() {
        let (resolver, _) = resolver_with(vec![employee(50, "HR", "HR Manager", dec!(1))]);
        let clearance = resolver
            .authorize_leave(&actor("STAFF", Some(50)), &task("HR", None))
            .await
            .unwrap();
        assert_eq!(clearance, Clearance::HrProfile { employee_id: 50 });
        assert!(
            resolver
                .authorize_leave(&actor("STAFF", Some(50)), &task("Warehouse", Some(77)))
                .await
                .is_ok()
        );
    }

    #[actix_web::test]
    async fn disbursement_respects_assigned_approver() {
        use crate::model::payroll::{Disbursement, PayrollSummary, RunStatus};
        use crate::payroll::period::Period;

        let (resolver, _) = resolver_with(vec![
            employee(20, "Finance", "Finance Manager", dec!(1)),
            employee(21, "Management", "Head of Operations", dec!(1)),
            employee(22, "Human Resources", "Officer", dec!(1)),
        ]);
        let run = PayrollRun {
            period: Period::parse("2025-01").unwrap(),
            version: 2,
            formula_version: "test".into(),
            generated_at: chrono::Utc::now(),
            generated_by: 1,
            status: RunStatus::Posted,
            summary: PayrollSummary::default(),
            lines: vec![],
            assigned_approver_id: Some(20),
            posted_journal_reference: Some("PAYROLL-2025-01".into()),
            posted_at: None,
            posted_by: None,
            disbursement: Disbursement::default(),
        };

        assert!(resolver.authorize_disbursement(&actor("STAFF", Some(20)), &run).await.is_ok());
        assert!(resolver.authorize_disbursement(&actor("STAFF", Some(21)), &run).await.is_err());
        assert!(resolver.authorize_disbursement(&actor("STAFF", Some(22)), &run).await.is_ok());
    }

    #[actix_web::test]
    async fn approver_selection_prefers_grants_then_hr_then_managers() {
        let roster = vec![
            employee(30, "Finance", "Finance Manager", dec!(1)),
            employee(31, "HR", "Staff", dec!(1)),
            employee(32, "Warehouse", "Staff", dec!(1)),
        ];
        let (resolver, caps) = resolver_with(roster.clone());
        assert_eq!(resolver.select_payroll_approver(&roster).await.unwrap(), Some(31));

        caps.grant(32, Capability::ApprovePayroll);
        assert_eq!(resolver.select_payroll_approver(&roster).await.unwrap(), Some(32));

        let managers_only = vec![roster[0].clone()];
        let (resolver, _) = resolver_with(managers_only.clone());
        assert_eq!(resolver.select_payroll_approver(&managers_only).await.unwrap(), Some(30));

        let nobody = vec![roster[2].clone()];
        let (resolver, _) = resolver_with(nobody.clone());
        assert_eq!(resolver.select_payroll_approver(&nobody).await.unwrap(), None);
    }

    #[test]
    fn actor_display_names_user_and_role() {
        assert_eq!(actor("ROLE_HR", Some(3)).to_string(), "tester#100 (ROLE_HR)");
    }
}
