//! Command-line front end for `mbusb-core`
//!
//! Parses arguments, sets up logging, runs the provisioning workflow and
//! optionally writes a TOML report of the run.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod report;

pub use cli::Cli;
