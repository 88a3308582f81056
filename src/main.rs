mod cli;
mod commands;
mod config;
mod error;
mod lint;
mod notify;
mod registry;
mod report;
mod retry;
#[cfg(test)]
mod testing;
mod types;

use clap::Parser;
use cli::{Cli, Commands, InitArgs};
use config::{Config, Credentials, Settings};
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_FAILURE: i32 = 1;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cli.log_level))
        .with_writer(std::io::stderr)
        .init();

    let ok = match run(&cli).await {
        Ok(ok) => ok,
        Err(e) => {
            error!("{:#}", e);
            false
        }
    };
    if !ok {
        std::process::exit(EXIT_FAILURE);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<bool> {
    match &cli.command {
        Commands::Init(args) => return init(&cli.config, args),
        Commands::Schema => {
            let schema = report::report_schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            return Ok(true);
        }
        Commands::Dashboard(args) => return commands::report::run_dashboard(args),
        _ => {}
    }

    let config = Config::load(&cli.config, &cli.config_overrides)?;
    let settings = Settings::new(
        config,
        Credentials {
            api_key: cli.api_key.clone(),
            workspace_id: cli.workspace_id.clone(),
            webhook_url: cli.webhook_url.clone(),
        },
    );

    match &cli.command {
        Commands::Lint(args) => commands::govern::run_lint(&settings, args).await,
        Commands::Report(args) => commands::report::run_report(&settings, args).await,
        Commands::Notify(args) => commands::report::run_notify(&settings, args).await,
        Commands::Upload(args) => commands::registry::run_upload(&settings, args).await,
        Commands::List(args) => commands::registry::run_list(&settings, args).await,
        Commands::Delete(args) => commands::registry::run_delete(&settings, args).await,
        Commands::Definition(args) => commands::registry::run_definition(&settings, args).await,
        Commands::Generate(args) => commands::registry::run_generate(&settings, args).await,
        Commands::Govern(args) => commands::govern::run_govern(&settings, args).await,
        Commands::Init(_) | Commands::Schema | Commands::Dashboard(_) => Ok(true),
    }
}

/// Write the default config file
fn init(config_path: &str, args: &InitArgs) -> anyhow::Result<bool> {
    if Path::new(config_path).exists() && !args.r#override {
        error!(
            "Config file already exists: {} (use --override to replace it)",
            config_path
        );
        return Ok(false);
    }
    std::fs::write(config_path, Config::default_toml())
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", config_path, e))?;
    info!("Created {}", config_path);
    Ok(true)
}
