pub mod accounts;
pub mod authority;
pub mod builder;
pub mod calculator;
pub mod error;
pub mod journal;
pub mod money;
pub mod period;
pub mod service;
pub mod state_machine;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use error::PayrollError;
pub use period::Period;
pub use service::PayrollService;
