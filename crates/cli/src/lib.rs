//! reqforge CLI
//!
//! Command implementations and output formatting for the `reqforge` binary.

pub mod commands;
pub mod output;
