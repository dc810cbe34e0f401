pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod sheets;
