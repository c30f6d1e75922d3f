//! famfin-fn: the Family Financial API function entry.
//!
//! # Usage
//!
//! ```text
//! famfin-fn invoke --event event.json
//! echo '{"path":"/health"}' | famfin-fn invoke
//! famfin-fn serve --port 8000
//! famfin-fn --config famfin.toml config
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use famfin_core::FamfinConfig;
use famfin_core::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "famfin-fn",
    about = "Family Financial API function bridge",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to famfin.toml (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one platform event through the bridge and print the result JSON.
    Invoke {
        /// Event file, or `-` for stdin (default: stdin)
        #[arg(short, long)]
        event: Option<PathBuf>,
    },
    /// Serve the bridge over local HTTP.
    Serve {
        /// Address to bind (overrides [server].host)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the effective configuration.
    Config,
}

// Stays synchronous: resolved settings are exported into the process
// environment before any runtime thread exists.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = FamfinConfig::load(cli.config.as_deref())?;

    init_tracing(&config.logging)?;

    match cli.command {
        Commands::Invoke { event } => {
            let bridge = commands::bootstrap(&config)?;
            commands::invoke::run(&bridge, event.as_deref())
        }
        Commands::Serve { host, port } => {
            let bridge = commands::bootstrap(&config)?;
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            commands::serve::run(bridge, &host, port)
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

/// Logs go to stderr so `invoke` output on stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.filter)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}
