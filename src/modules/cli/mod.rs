pub mod commands;
pub mod display;
pub mod handlers;

pub use commands::build_cli;
pub use handlers::{run, CliError};
