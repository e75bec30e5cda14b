//! Command line loader for the Sparkify star schema.

#![allow(missing_docs, reason = "command modules mirror the CLI surface")]

pub mod cli;
pub mod commands;
pub mod utils;
