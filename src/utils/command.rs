//! Subprocess execution with consistent error handling.

use std::process::{Command, Output};

use crate::error::{Error, Result, ToolFailedDetails};

/// Captured output from a finished process.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub success: bool,
}

impl From<Output> for CapturedOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        }
    }
}

/// Render a program and its arguments for logs and error details.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a program to completion and capture its output.
///
/// Only a failure to start the process is an error here.
pub fn capture(program: &str, args: &[String]) -> Result<CapturedOutput> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| Error::tool_spawn_failed(display_command(program, args), e.to_string()))?;

    Ok(output.into())
}

/// Run a program and return its stdout.
///
/// A non-zero exit or any diagnostic text on stderr is a tool failure.
pub fn run_strict(program: &str, args: &[String]) -> Result<String> {
    let output = capture(program, args)?;
    require_clean(&display_command(program, args), output)
}

/// Accept captured output only when the process succeeded silently on stderr.
pub fn require_clean(command: &str, output: CapturedOutput) -> Result<String> {
    if !output.success || !output.stderr.trim().is_empty() {
        return Err(Error::tool_failed(ToolFailedDetails {
            command: command.to_string(),
            exit_code: output.exit_code,
            stderr: error_text(&output),
        }));
    }

    Ok(output.stdout)
}

/// Extract error text from captured output.
///
/// Prefers stderr, falls back to stdout if stderr is empty.
pub fn error_text(output: &CapturedOutput) -> String {
    if !output.stderr.trim().is_empty() {
        output.stderr.trim().to_string()
    } else {
        output.stdout.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn captured(stdout: &str, stderr: &str, success: bool) -> CapturedOutput {
        CapturedOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(if success { 0 } else { 1 }),
            success,
        }
    }

    #[test]
    fn run_strict_returns_stdout() {
        let result = run_strict("echo", &["hello".to_string()]);
        assert_eq!(result.unwrap().trim(), "hello");
    }

    #[test]
    fn run_strict_reports_missing_program() {
        let err = run_strict("nonexistent_command_xyz", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ToolSpawnFailed);
    }

    #[test]
    fn run_strict_fails_on_nonzero_exit() {
        let err = run_strict("false", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ToolFailed);
    }

    #[test]
    fn require_clean_rejects_stderr_output() {
        let err = require_clean("cloc", captured("{}", "npm WARN something", true)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ToolFailed);
        assert_eq!(err.details["stderr"], "npm WARN something");
    }

    #[test]
    fn require_clean_ignores_blank_stderr() {
        let stdout = require_clean("cloc", captured("{}", "  \n", true)).unwrap();
        assert_eq!(stdout, "{}");
    }

    #[test]
    fn error_text_prefers_stderr() {
        let output = captured("stdout content", "stderr content", false);
        assert_eq!(error_text(&output), "stderr content");
    }

    #[test]
    fn error_text_falls_back_to_stdout() {
        let output = captured("stdout content", "", false);
        assert_eq!(error_text(&output), "stdout content");
    }

    #[test]
    fn display_command_joins_args() {
        let args = vec!["--json".to_string(), "src".to_string()];
        assert_eq!(display_command("cloc", &args), "cloc --json src");
    }
}
