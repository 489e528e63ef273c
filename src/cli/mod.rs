//! Command-line interface.

mod commands;
mod display;
mod helpers;

pub use commands::{is_verbose, run};
