//! CLI command handlers. Each command is in its own file.

mod config;
mod sign;

pub use config::run_config;
pub use sign::run_sign;
