//! Command-line interface module.
//!
//! Argument parsing, the one-shot subcommands and the interactive console.

pub mod args;
pub mod commands;
pub mod console;
pub mod info;
