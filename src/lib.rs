pub mod answer;
pub mod browser;
pub mod cli;
pub mod error;
pub mod form;
pub mod job;
pub mod trace;
