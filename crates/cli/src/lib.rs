//! TestDeck CLI
//!
//! Command-line front end over the TestDeck workspace core: HTTP client,
//! configuration, output formatting and subcommands.

pub mod client;
pub mod commands;
pub mod config;
pub mod output;
