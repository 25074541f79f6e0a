// src/exec/mod.rs

//! Process execution layer.
//!
//! External tools (style compiler, post-processors, reload hook) run as
//! separate OS processes through `tokio::process::Command` and are awaited
//! asynchronously.
//!
//! - [`command`] defines the `CommandRunner` contract and template rendering.
//! - [`runner`] provides the production `ShellCommandRunner`.

pub mod command;
pub mod runner;

pub use command::{
    render_template, shell_quote, CommandInvocation, CommandOutcome, CommandRunner,
};
pub use runner::ShellCommandRunner;
