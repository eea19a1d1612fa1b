// Declare all modules
pub mod api;
pub mod cli;
pub mod config;
pub mod session;
pub mod utils;

// No re-exports here as they're handled in lib.rs
