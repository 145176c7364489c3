pub mod cache;
pub mod ledger;
pub mod ollama;
pub mod openai;
pub mod resolver;
pub mod source;
