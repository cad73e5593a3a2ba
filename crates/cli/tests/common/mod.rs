//! Helpers for running the `lull` binary in integration tests

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct LullCommand {
    args: Vec<String>,
    env: Vec<(String, String)>,
    stdin_data: Option<Vec<u8>>,
}

impl LullCommand {
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            env: Vec::new(),
            stdin_data: None,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Provide stdin data
    pub fn stdin(&mut self, data: &str) -> &mut Self {
        self.stdin_bytes(data.as_bytes())
    }

    /// Provide raw stdin bytes, not necessarily UTF-8
    pub fn stdin_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.stdin_data = Some(data.to_vec());
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let mut command = self.command();

        let output = match &self.stdin_data {
            Some(data) => {
                let mut child = command
                    .stdin(Stdio::piped())
                    .spawn()
                    .context("Failed to spawn command")?;

                // Dropping stdin after the write closes the pipe (EOF)
                if let Some(mut stdin) = child.stdin.take() {
                    use std::io::Write;
                    stdin.write_all(data)?;
                }

                child.wait_with_output().context("Failed to wait for command")?
            }
            None => command
                .stdin(Stdio::null())
                .output()
                .context("Failed to execute command")?,
        };

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Spawn with piped stdout/stderr and no stdin, for tests that read
    /// output incrementally
    pub fn spawn(&self) -> Result<Child> {
        self.command()
            .stdin(Stdio::null())
            .spawn()
            .context("Failed to spawn command")
    }

    fn command(&self) -> Command {
        let mut command = Command::new(lull_binary());
        command
            .args(&self.args)
            .env_remove("RUST_LOG")
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Parse every stdout line as JSON
    pub fn json_lines(&self) -> Result<Vec<Value>> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).with_context(|| format!("Not JSON: {}", line)))
            .collect()
    }
}

fn lull_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_lull"))
}

/// Build a `LullCommand` from arguments
///
/// ```ignore
/// lull!("trigger", "--virtual").assert_success()?;
/// ```
#[macro_export]
macro_rules! lull {
    ($($arg:expr),*) => {{
        let mut cmd = $crate::common::LullCommand::new();
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
