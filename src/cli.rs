use crate::lint::OutputFormat;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

// Display order for credential options (placed at top of help text)
const CREDENTIAL_DISPLAY_ORDER: usize = 0;
// Display order for log level option (placed at end of help text)
const LOG_LEVEL_DISPLAY_ORDER: usize = 100;

/// CLI arguments
#[derive(Parser)]
#[command(name = "specwarden", version, about = "Lint, score and publish OpenAPI specs against a spec registry", long_about = None)]
pub struct Cli {
    /// Log level (see https://docs.rs/tracing-subscriber/latest/tracing_subscriber/filter/struct.EnvFilter.html)
    /// [env: SPECWARDEN_LOG=] [default: info]
    #[arg(
        long,
        env = "SPECWARDEN_LOG",
        default_value = "info",
        global = true,
        hide_default_value = true,
        hide_env = true,
        display_order = LOG_LEVEL_DISPLAY_ORDER,
        verbatim_doc_comment
    )]
    pub log_level: String,

    /// Path to config file (initialize with `specwarden init`)
    #[arg(long, default_value = "specwarden.toml", global = true)]
    pub config: String,

    /// Override config values using dot notation (e.g. lint.command=spectral)
    #[arg(long = "config-override", global = true)]
    pub config_overrides: Vec<String>,

    /// Registry API key
    #[arg(long, env = "SPECWARDEN_API_KEY", global = true, hide_env_values = true, display_order = CREDENTIAL_DISPLAY_ORDER)]
    pub api_key: Option<String>,

    /// Registry workspace id
    #[arg(long, env = "SPECWARDEN_WORKSPACE_ID", global = true, display_order = CREDENTIAL_DISPLAY_ORDER)]
    pub workspace_id: Option<String>,

    /// Chat webhook URL for notifications
    #[arg(long, env = "SPECWARDEN_WEBHOOK_URL", global = true, hide_env_values = true, display_order = CREDENTIAL_DISPLAY_ORDER)]
    pub webhook_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a default specwarden.toml config file
    Init(InitArgs),
    /// Lint and score a single spec
    Lint(LintArgs),
    /// Score every spec in a directory or workspace and write the report
    Report(ReportArgs),
    /// Render the HTML dashboard from an existing JSON report
    Dashboard(DashboardArgs),
    /// Post a summary of an existing JSON report to the webhook
    Notify(NotifyArgs),
    /// Upload spec files to the registry
    Upload(UploadArgs),
    /// List specs in the workspace
    List(ListArgs),
    /// Delete specs from the registry
    Delete(DeleteArgs),
    /// Print the definition of a registry spec
    Definition(DefinitionArgs),
    /// Generate collections from registry specs
    Generate(GenerateArgs),
    /// Upload a spec, lint it, and report the verdict
    Govern(GovernArgs),
    /// Print the JSON Schema of the report file
    Schema,
}

/// Arguments for the init command
#[derive(Parser)]
pub struct InitArgs {
    /// Override existing config file
    #[arg(long)]
    pub r#override: bool,
}

/// Threshold and notification flags shared by scoring commands
#[derive(clap::Args, Debug, Clone)]
pub struct VerdictArgs {
    /// Minimum passing score [default: 70 or the config file's threshold]
    #[arg(long, env = "SPECWARDEN_THRESHOLD")]
    pub threshold: Option<u32>,

    /// Post the result to the webhook
    #[arg(long)]
    pub notify: bool,

    /// Fail if the notification cannot be delivered
    #[arg(long, requires = "notify")]
    pub require_notify: bool,
}

/// Arguments for the lint command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["file", "spec_id"])))]
pub struct LintArgs {
    /// Spec file to lint
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Registry spec id to lint
    #[arg(long)]
    pub spec_id: Option<String>,

    /// Output format requested from the linter [default: from config]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Print the score result as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub verdict: VerdictArgs,
}

/// Arguments for the report command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["dir", "workspace"])))]
pub struct ReportArgs {
    /// Directory of spec files to score
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Score every spec in the registry workspace
    #[arg(long)]
    pub workspace: bool,

    /// JSON report path
    #[arg(long, default_value = "governance-report.json")]
    pub output: PathBuf,

    /// HTML dashboard path
    #[arg(long, default_value = "governance-dashboard.html")]
    pub html: PathBuf,

    /// Output format requested from the linter [default: from config]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also print the report as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub verdict: VerdictArgs,
}

/// Arguments for the dashboard command
#[derive(Parser, Debug)]
pub struct DashboardArgs {
    /// JSON report to render
    #[arg(long, default_value = "governance-report.json")]
    pub report: PathBuf,

    /// HTML dashboard path
    #[arg(long, default_value = "governance-dashboard.html")]
    pub html: PathBuf,
}

/// Arguments for the notify command
#[derive(Parser, Debug)]
pub struct NotifyArgs {
    /// JSON report to summarize
    #[arg(long, default_value = "governance-report.json")]
    pub report: PathBuf,

    /// Threshold shown on the card [default: 70 or the config file's threshold]
    #[arg(long, env = "SPECWARDEN_THRESHOLD")]
    pub threshold: Option<u32>,
}

/// Arguments for the upload command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["file", "dir"])))]
pub struct UploadArgs {
    /// Spec file to upload
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Upload every spec file in this directory
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Spec name (single file only) [default: file name without extension]
    #[arg(long, conflicts_with = "dir")]
    pub name: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Registry spec ids to delete
    #[arg(long = "spec-id", required = true, num_args = 1..)]
    pub spec_ids: Vec<String>,
}

/// Arguments for the definition command
#[derive(Parser, Debug)]
pub struct DefinitionArgs {
    /// Registry spec id
    #[arg(long)]
    pub spec_id: String,

    /// Write to a file instead of standard output
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("specs").required(true).args(["spec_ids", "all"])))]
pub struct GenerateArgs {
    /// Registry spec ids to generate collections from
    #[arg(long = "spec-id", num_args = 1..)]
    pub spec_ids: Vec<String>,

    /// Generate a collection for every spec in the workspace
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the govern command
#[derive(Parser, Debug)]
pub struct GovernArgs {
    /// Spec file to upload and lint
    #[arg(long)]
    pub file: PathBuf,

    /// Spec name [default: file name without extension]
    #[arg(long)]
    pub name: Option<String>,

    /// Generate a collection when the spec passes
    #[arg(long)]
    pub generate_collection: bool,

    /// Delete the uploaded spec afterwards
    #[arg(long)]
    pub cleanup: bool,

    /// Output format requested from the linter [default: from config]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Print the verdict as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub verdict: VerdictArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_lint_requires_a_target() {
        assert!(Cli::try_parse_from(["specwarden", "lint"]).is_err());
        let cli = Cli::try_parse_from(["specwarden", "lint", "--file", "pets.yaml", "--threshold", "80"])
            .unwrap();
        match cli.command {
            Commands::Lint(args) => {
                assert_eq!(args.file, Some(PathBuf::from("pets.yaml")));
                assert_eq!(args.verdict.threshold, Some(80));
            }
            _ => panic!("expected lint command"),
        }
    }

    #[test]
    fn test_report_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["specwarden", "report", "--dir", "specs", "--workspace"]).is_err());
        assert!(Cli::try_parse_from(["specwarden", "report", "--workspace"]).is_ok());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "specwarden",
            "list",
            "--workspace-id",
            "ws-1",
            "--config-override",
            "threshold=90",
        ])
        .unwrap();
        assert_eq!(cli.workspace_id.as_deref(), Some("ws-1"));
        assert_eq!(cli.config_overrides, vec!["threshold=90"]);
    }

    #[test]
    fn test_delete_accepts_many_ids() {
        let cli = Cli::try_parse_from(["specwarden", "delete", "--spec-id", "a", "b"]).unwrap();
        match cli.command {
            Commands::Delete(args) => assert_eq!(args.spec_ids, vec!["a", "b"]),
            _ => panic!("expected delete command"),
        }
    }
}
