pub mod cli;
pub mod delivery;
pub mod load_config;
pub mod page;

pub use cli::{execute, run, Cli, Commands};
