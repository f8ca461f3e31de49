pub mod cli;
pub mod run;
pub mod run_build;
pub mod run_finalize;
pub mod run_rebuild;
pub mod show_ledger_stats;
