pub mod audit_repo;
pub mod event_repo;
pub mod grant_repo;
pub mod ledger_repo;
pub mod swap_repo;
