//! # CLI Client
//!
//! One possible client for studybook, not the application itself. This is the only
//! place that knows about terminal I/O, prompts and exit codes.
//!
//! - `setup.rs`: clap argument definitions
//! - `commands.rs`: logging setup, context wiring, dispatch to the API, confirmations
//! - `print.rs`: turns `CmdResult` data into terminal output
//!
//! Notes are addressed by display path (`1.2`), mistakes by their position in the
//! newest-first list. Destructive commands show what they will remove and ask first;
//! `--yes` answers for non-interactive use.

mod commands;
mod print;
mod setup;

pub use commands::run;
