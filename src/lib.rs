pub mod cli;
pub mod config;
pub mod engine;
pub mod index;
pub mod sections;
pub mod types;
