//! cloud-init-sysconfig - render cloud-init network state as sysconfig files

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cloud_init_sysconfig::{
    NetworkState, Renderer, RendererConfig, SysconfigPaths, SysconfigRenderer,
    apply_network_config, load_config, parse_network_state,
};

#[derive(Parser)]
#[command(name = "cloud-init-sysconfig")]
#[command(author, version, about = "Render cloud-init network state as RHEL sysconfig files", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render network state into a target root
    Render {
        /// Network state or v1 network config (YAML or JSON)
        #[arg(long)]
        state: PathBuf,
        /// Root directory the files are written under
        #[arg(long, default_value = "/")]
        target: PathBuf,
        /// Renderer config file
        #[arg(long, env = "CLOUD_INIT_SYSCONFIG_CONFIG")]
        config: Option<PathBuf>,
        /// Print the rendered files instead of writing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Show where the files of one interface are written
    Paths {
        #[arg(long, default_value = "/")]
        target: PathBuf,
        #[arg(long, env = "CLOUD_INIT_SYSCONFIG_CONFIG")]
        config: Option<PathBuf>,
        /// Interface name
        #[arg(long)]
        interface: String,
    },
}

fn init_logging(verbosity: u8) -> anyhow::Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

async fn read_config(path: Option<&Path>) -> anyhow::Result<RendererConfig> {
    match path {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(RendererConfig::default()),
    }
}

async fn read_state(path: &Path) -> anyhow::Result<NetworkState> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    // JSON documents parse as YAML too
    Ok(parse_network_state(&content)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Render {
            state,
            target,
            config,
            dry_run,
        } => {
            let config = read_config(config.as_deref()).await?;
            let network_state = read_state(&state)
                .await
                .with_context(|| format!("invalid network state in {}", state.display()))?;
            let renderer = SysconfigRenderer::new(config);

            if dry_run {
                info!("Dry run, nothing is written");
                for file in renderer.render(&network_state, &target)? {
                    println!("==> {} <==", file.path.display());
                    println!("{}", file.content);
                }
            } else {
                let written = apply_network_config(&renderer, &network_state, &target)
                    .await
                    .with_context(|| format!("failed to render into {}", target.display()))?;
                for path in written {
                    println!("{}", path.display());
                }
            }
        }
        Commands::Paths {
            target,
            config,
            interface,
        } => {
            let config = read_config(config.as_deref()).await?;
            let paths = SysconfigPaths::new(&target, &config);
            println!("{}", paths.ifcfg(&interface).display());
            println!("{}", paths.route(&interface).display());
            println!("{}", paths.route6(&interface).display());
        }
    }

    Ok(())
}
