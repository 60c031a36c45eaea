mod config;

use clap::{Args, Parser, Subcommand};
use client::relay_client::DEFAULT_RELAY_URL;
use config::{CommonConfig, Config, ConfigError, MetricsConfig};
use metrics_exporter_statsd::StatsdBuilder;
use relay::config::DEFAULT_GITHUB_API_URL;
use shared::protocol::AccessToken;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

#[derive(Parser)]
#[command(name = "repovis", version, about = "Bulk-change the visibility of GitHub repositories")]
struct Cli {
    /// YAML file with `metrics`, `logging` and `relay` sections
    #[arg(long, global = true)]
    config_file_path: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the relay that applies visibility changes upstream
    Relay,
    /// Run the interactive client
    Client(ClientArgs),
}

#[derive(Args)]
struct ClientArgs {
    #[arg(long, env = "GITHUB_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Base URL of the relay
    #[arg(long, env = "RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    relay_url: Url,

    /// Base URL of the upstream API used for listing
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API_URL)]
    github_api_url: Url,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid relay configuration: {0}")]
    RelayConfig(#[from] relay::config::ConfigError),
    #[error("relay error: {0}")]
    Relay(#[from] relay::RelayError),
    #[error("client error: {0}")]
    Client(#[from] client::ClientError),
    #[error("could not set up statsd exporter: {0}")]
    Statsd(#[from] metrics_exporter_statsd::StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderInstalled,
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config_file_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // The client owns stdout, so it only logs warnings unless asked otherwise
    let default_level = match cli.command {
        CliCommand::Relay => "info",
        CliCommand::Client(_) => "warn",
    };
    let _sentry = init_observability(&config.common, default_level)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        CliCommand::Relay => {
            let mut relay_config = config.relay.unwrap_or_default();
            relay_config.apply_env(|var| std::env::var(var).ok())?;
            runtime.block_on(run_relay(relay_config))
        }
        CliCommand::Client(args) => runtime.block_on(run_client(args)),
    }
}

async fn run_relay(config: relay::config::Config) -> Result<(), CliError> {
    tokio::select! {
        result = relay::run(config) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
    }
    Ok(())
}

async fn run_client(args: ClientArgs) -> Result<(), CliError> {
    let config = client::ClientConfig {
        username: args.username.filter(|u| !u.is_empty()),
        token: args.token.filter(|t| !t.is_empty()).map(AccessToken::new),
        relay_url: args.relay_url,
        github_api_url: args.github_api_url,
    };
    client::run(config).await?;
    Ok(())
}

/// Install logging, error reporting and metrics. The returned guard flushes
/// Sentry events when dropped.
fn init_observability(
    common: &CommonConfig,
    default_level: &str,
) -> Result<Option<sentry::ClientInitGuard>, CliError> {
    let sentry_guard = common.logging.as_ref().map(|logging| {
        sentry::init((
            logging.sentry_dsn.as_str(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_guard.as_ref().map(|_| sentry::integrations::tracing::layer()))
        .init();

    if let Some(metrics_config) = &common.metrics {
        init_metrics(metrics_config)?;
    }

    Ok(sentry_guard)
}

fn init_metrics(config: &MetricsConfig) -> Result<(), CliError> {
    let recorder = StatsdBuilder::from(config.statsd_host.clone(), config.statsd_port)
        .build(Some("repovis"))?;
    metrics::set_global_recorder(recorder).map_err(|_| CliError::RecorderInstalled)?;
    shared::metrics_defs::describe_all(relay::metrics_defs::ALL_METRICS);

    tracing::info!(
        host = %config.statsd_host,
        port = config.statsd_port,
        "statsd metrics enabled"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_client_args() {
        let cli = Cli::parse_from([
            "repovis",
            "client",
            "--username",
            "alice",
            "--relay-url",
            "http://relay.internal:3001",
        ]);

        let CliCommand::Client(args) = cli.command else {
            panic!("expected client command");
        };
        assert_eq!(args.username.as_deref(), Some("alice"));
        assert_eq!(args.relay_url.as_str(), "http://relay.internal:3001/");
    }

    #[test]
    fn parse_relay_with_config() {
        let cli = Cli::parse_from(["repovis", "relay", "--config-file-path", "/etc/repovis.yaml"]);
        assert!(matches!(cli.command, CliCommand::Relay));
        assert_eq!(
            cli.config_file_path,
            Some(PathBuf::from("/etc/repovis.yaml"))
        );
    }
}
