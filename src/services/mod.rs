pub mod ledger_pipeline;
pub mod retention;
pub mod swap_engine;
