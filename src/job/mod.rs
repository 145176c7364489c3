pub mod apply;
pub mod run_log;
