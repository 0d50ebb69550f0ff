//! youtube-dl command builder and a bounded-time process runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Builder for youtube-dl invocations that print the direct URL only.
#[derive(Debug, Clone)]
pub struct YtdlCommand {
    /// Format selection string (`-f`)
    format: String,
    /// Source page URL
    url: String,
    /// Simulate, never download
    simulate: bool,
    /// Extra arguments appended after the defaults
    extra_args: Vec<String>,
}

impl YtdlCommand {
    pub fn new(format: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            url: url.into(),
            simulate: true,
            extra_args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            self.format.clone(),
            "-g".to_string(),
            self.url.clone(),
        ];

        if self.simulate {
            args.push("-s".to_string());
        }

        args.push("--no-check-certificate".to_string());
        args.push("--no-call-home".to_string());
        args.extend(self.extra_args.iter().cloned());

        args
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a program with a wall-clock limit, killing it on timeout.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(program: impl AsRef<Path>, timeout: Duration) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run to completion; a non-zero exit is returned as output, not as an error.
    pub async fn run(&self, args: &[String]) -> MediaResult<CommandOutput> {
        debug!("Running: {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::internal("stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;

        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stdout.read_to_end(&mut buf).await;
            buf
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    program = %self.program.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Timed out, killing process"
                );
                let _ = child.kill().await;
                return Err(MediaError::Timeout(self.timeout));
            }
        };

        let stdout = stdout_task
            .await
            .map_err(|e| MediaError::internal(e.to_string()))?;
        let stderr = stderr_task
            .await
            .map_err(|e| MediaError::internal(e.to_string()))?;

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Locate the youtube-dl executable, accepting either a path or a name on `PATH`.
pub fn check_ytdl(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|e| MediaError::YtdlNotFound(format!("{}: {}", program, e)))
}
