// src/exec/command.rs

//! Command contract for the external tools.
//!
//! The orchestrator only knows a tool by its command template, the paths it
//! substitutes into it and the exit status it gets back.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::Result;

/// Exit status of an external tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit; `-1` when killed by a signal.
    Failed(i32),
}

/// A fully rendered command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Short label for logs and errors, e.g. `"compile"` or `"minify"`.
    pub label: String,
    pub cmd: String,
    pub cwd: PathBuf,
}

/// Runs external tools. Production uses [`super::ShellCommandRunner`]; tests
/// can substitute a recorder.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + 'a>>;
}

/// Substitute `{input}`, `{output}` and `{root}` in a command template.
///
/// Paths are shell-quoted so spaces and quotes survive `sh -c`.
pub fn render_template(template: &str, input: &Path, output: &Path, root: &Path) -> String {
    template
        .replace("{input}", &shell_quote(input))
        .replace("{output}", &shell_quote(output))
        .replace("{root}", &shell_quote(root))
}

/// POSIX single-quote a path unless it only holds safe characters.
pub fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    let safe = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':' | '@'));
    if safe {
        s.into_owned()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
