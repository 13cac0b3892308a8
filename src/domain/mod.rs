pub mod audit;
pub mod collaborators;
pub mod error;
pub mod event;
pub mod id;
pub mod ledger;
pub mod metadata;
pub mod money;
pub mod swap;
