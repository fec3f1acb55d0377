pub mod attendance;
pub mod employee;
pub mod leave_request;
pub mod ledger;
pub mod payment;
pub mod payroll;
pub mod role;
