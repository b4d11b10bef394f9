pub mod cli;
pub mod load_config;
pub mod signal;

pub use cli::{run, Cli, Commands};
