use thiserror::Error;

/// Fatal configuration problems, reported before any network call is made
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing {what}: pass {flag} or set {env_var}")]
    Missing {
        what: &'static str,
        flag: &'static str,
        env_var: &'static str,
    },

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid config override '{0}': expected key.path=value")]
    Override(String),

    #[error("Invalid value: {0}")]
    Invalid(String),
}

/// Errors from the spec registry HTTP API
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Registry request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Registry returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected registry response: {0}")]
    Decode(String),

    #[error("Invalid registry URL: {0}")]
    InvalidUrl(String),

    #[error("Task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error("Task {task_id} did not finish after {attempts} polls")]
    PollTimeout { task_id: String, attempts: u32 },
}

impl RegistryError {
    /// 4xx responses mean the request itself is wrong and retrying cannot help
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status))
    }
}

/// Errors from running the external lint command
#[derive(Error, Debug)]
pub enum LintError {
    #[error("Failed to start linter '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Failed to wait for linter: {0}")]
    Wait(std::io::Error),

    #[error("Linter timed out after {0} seconds")]
    Timeout(u64),

    #[error("Linter exited with {status} and produced no output")]
    NoOutput { status: String },
}

/// Errors from posting to the chat webhook
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook returned {status}: {body}")]
    Status { status: u16, body: String },
}
