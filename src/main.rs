use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use galleryd::config::GalleryConfig;
use galleryd::{daemon, logging};

#[derive(Parser)]
#[command(name = "galleryd")]
#[command(about = "Media gallery daemon: listings, thumbnails and live change streams")]
#[command(version)]
struct Cli {
    /// Config file (default: $GALLERYD_HOME/galleryd.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP daemon
    Serve {
        /// Bind address (overrides [server].host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,
        /// Output media root (overrides [gallery].output_dir)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Input media root (overrides [gallery].input_dir)
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Thumbnail cache directory (overrides [thumbnails].dir)
        #[arg(long)]
        thumbs_dir: Option<PathBuf>,
    },
    /// Validate the configuration and print the resolved directories
    CheckConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let mut config = GalleryConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            output_dir,
            input_dir,
            thumbs_dir,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if output_dir.is_some() {
                config.gallery.output_dir = output_dir;
            }
            if input_dir.is_some() {
                config.gallery.input_dir = input_dir;
            }
            if thumbs_dir.is_some() {
                config.thumbnails.dir = thumbs_dir;
            }

            let validation = config.validate()?;
            for warning in &validation.warnings {
                warn!("{warning}");
            }

            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .max_blocking_threads(config.runtime.blocking_threads)
                .thread_name("galleryd")
                .build()
                .context("Failed to build Tokio runtime")?;
            runtime.block_on(daemon::run(config))
        },
        Commands::CheckConfig => {
            let validation = config.validate()?;
            for warning in &validation.warnings {
                println!("warning: {warning}");
            }
            println!("output_dir: {}", config.output_dir()?.display());
            println!("input_dir:  {}", config.input_dir()?.display());
            println!("thumbs_dir: {}", config.thumbs_dir()?.display());
            println!(
                "listen:     {}:{}",
                config.server.host, config.server.port
            );
            info!("Configuration is valid");
            Ok(())
        },
    }
}
