pub mod controls;
pub mod engine;
pub mod extractor;
pub mod filler;
pub mod form_config;
pub mod form_model;
