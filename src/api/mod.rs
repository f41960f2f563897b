//! Command-line surface: argument types, handlers and their error type.

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::{Cli, Command};
pub use commands::execute;
pub use error::KvError;
