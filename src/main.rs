use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hcloud_resolver::cloud::Cloud;
use hcloud_resolver::config::{Config, LoggingConfig};
use hcloud_resolver::metrics;
use hcloud_resolver::resolver::{parse_provider_id, ResolveError};

#[derive(Parser)]
#[command(
    name = "hcloud-resolver",
    version,
    about = "Resolve cluster nodes to Hetzner Cloud and dedicated servers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configured format
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,

    /// Read configuration from a TOML file instead of the environment
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep the inventory refreshed until interrupted
    Run,

    /// Resolve a single server and print it as JSON
    Resolve(ResolveArgs),

    /// Parse a provider ID without contacting any API
    ParseProviderId {
        /// Provider ID, e.g. hcloud://12345
        provider_id: String,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ResolveArgs {
    /// Server name
    #[arg(long)]
    name: Option<String>,

    /// Server ID
    #[arg(long)]
    id: Option<u64>,

    /// Provider ID
    #[arg(long)]
    provider_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_format = cli.log_format.as_deref();

    match cli.command {
        Commands::Run => {
            let config = load_config(cli.config.as_deref())?;
            setup_tracing(&config.logging.with_overrides(log_format, cli.verbose))?;
            tracing::debug!(config = ?config, "Configuration loaded");
            run(config).await?;
        }

        Commands::Resolve(args) => {
            let config = load_config(cli.config.as_deref())?;
            setup_tracing(&config.logging.with_overrides(log_format, cli.verbose))?;
            tracing::debug!(config = ?config, "Configuration loaded");
            resolve(config, args).await?;
        }

        Commands::ParseProviderId { provider_id } => {
            setup_tracing(&LoggingConfig::default().with_overrides(log_format, cli.verbose))?;
            let id = parse_provider_id(&provider_id)?;
            println!("{id}");
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config file: {}", path.display())),
        None => Config::from_env().context("Failed to load config from environment"),
    }
}

fn setup_tracing(logging: &LoggingConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(logging.filter_directive())
        .context("Invalid log level")?;

    match logging.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    Ok(())
}

async fn run(config: Config) -> Result<()> {
    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Metrics initialization failed, continuing without metrics");
    }

    let cloud = Cloud::new(&config).await?;

    let (stop_metrics, metrics_stopped) = tokio::sync::oneshot::channel::<()>();
    let metrics_server = match config.metrics_addr()? {
        Some(addr) => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind metrics endpoint to {addr}"))?;
            Some(tokio::spawn(metrics::serve_metrics(listener, async move {
                let _ = metrics_stopped.await;
            })))
        }
        None => {
            tracing::info!("Metrics endpoint disabled");
            None
        }
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutdown signal received");
    cloud.shutdown().await;

    let _ = stop_metrics.send(());
    if let Some(server) = metrics_server {
        server
            .await
            .context("Metrics endpoint task failed")?
            .context("Metrics endpoint error")?;
    }

    Ok(())
}

async fn resolve(config: Config, args: ResolveArgs) -> Result<()> {
    let cloud = Cloud::new(&config).await?;

    // One-shot lookups should not race the first background poll
    if let Err(e) = cloud.refresh_inventory().await {
        tracing::warn!(error = %e, "Inventory unavailable, resolving from cloud API only");
    }

    let resolver = cloud.resolver();
    let result = match (args.name, args.id, args.provider_id) {
        (Some(name), _, _) => resolver.resolve_by_name(&name).await,
        (_, Some(id), _) => resolver.resolve_by_id(id).await,
        (_, _, Some(provider_id)) => resolver.resolve_by_provider_id(&provider_id).await,
        _ => unreachable!("clap requires exactly one lookup key"),
    };

    let outcome = match result {
        Ok(server) => {
            println!("{}", serde_json::to_string_pretty(&server)?);
            Ok(())
        }
        Err(ResolveError::InstanceNotFound) => Err(anyhow::anyhow!("instance not found")),
        Err(e) => Err(e.into()),
    };

    cloud.shutdown().await;
    outcome
}
