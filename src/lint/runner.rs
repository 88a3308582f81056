use crate::config::LintConfig;
use crate::error::LintError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Output format requested from the linter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

/// What to lint: a local file or a spec already in the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintTarget {
    File(PathBuf),
    RegistrySpec(String),
}

impl LintTarget {
    /// Argument passed to the linter in place of `{target}`
    pub fn as_arg(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::RegistrySpec(id) => id.clone(),
        }
    }
}

impl std::fmt::Display for LintTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::RegistrySpec(id) => write!(f, "spec {}", id),
        }
    }
}

/// Runs the external linter and returns its raw output
pub trait Linter {
    async fn lint(&self, target: &LintTarget) -> Result<String, LintError>;
}

/// Linter invoked as a subprocess
#[derive(Debug, Clone)]
pub struct CliLinter {
    command: String,
    args: Vec<String>,
    format: OutputFormat,
    timeout_secs: u64,
    workspace_id: Option<String>,
}

impl CliLinter {
    pub fn new(config: &LintConfig, format: OutputFormat, workspace_id: Option<&str>) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            format,
            timeout_secs: config.timeout_secs,
            workspace_id: workspace_id.map(str::to_string),
        }
    }

    /// Substitute `{target}`, `{format}` and `{workspace}`, dropping arguments left empty
    pub fn build_args(&self, target: &LintTarget) -> Vec<String> {
        let target = target.as_arg();
        let workspace = self.workspace_id.as_deref().unwrap_or("");
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{target}", &target)
                    .replace("{format}", self.format.as_str())
                    .replace("{workspace}", workspace)
            })
            .filter(|arg| !arg.is_empty())
            .collect()
    }
}

impl Linter for CliLinter {
    async fn lint(&self, target: &LintTarget) -> Result<String, LintError> {
        let args = self.build_args(target);
        debug!("Running linter: {} {}", self.command, args.join(" "));

        let child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LintError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        // The child is killed when the timed-out future drops it
        let output = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            child.wait_with_output(),
        )
        .await
        .map_err(|_| LintError::Timeout(self.timeout_secs))?
        .map_err(LintError::Wait)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        trace!(
            "Linter exited with {}: {} bytes stdout, {} bytes stderr",
            output.status,
            stdout.len(),
            stderr.len()
        );

        // A failing exit status still carries usable output
        if stdout.trim().is_empty() && stderr.trim().is_empty() && !output.status.success() {
            return Err(LintError::NoOutput {
                status: output.status.to_string(),
            });
        }

        let mut combined = stdout.into_owned();
        if !stderr.trim().is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }
        Ok(combined)
    }
}
