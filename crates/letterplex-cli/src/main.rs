use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use commands::{config, sync};
use std::path::PathBuf;
use watchlist_sync_config::PathManager;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "letterplex")]
#[command(about = "Letterplex - Keep your Plex watchlist in step with Letterboxd")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Write logs to a daily rotated file instead of stderr (defaults to logs/letterplex.log in the config directory)
    #[arg(long, global = true, value_name = "PATH", num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the Letterboxd watchlist into the Plex watchlist
    #[command(long_about = "Remove films you have watched on Letterboxd from your Plex watchlist, then add the films on your Letterboxd watchlist that Plex Discover can identify. Films that cannot be matched are listed at the end.")]
    Sync {
        /// Compute and print the plan without changing the Plex watchlist
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials for Letterplex. Environment variables (PLEX_TOKEN, PLEX_URL, LETTERBOXD_USERNAME) and a .env file take precedence over stored values.")]
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show the Plex token unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure Plex (token-based authentication)
    #[command(long_about = "Configure the Plex token and server URL. You can find your Plex token by inspecting network requests in Plex Web (look for the X-Plex-Token header).")]
    Plex {
        /// Plex API Token (if not provided, will prompt)
        #[arg(long)]
        token: Option<String>,

        /// Plex Server URL, e.g. http://192.168.1.10:32400 (if not provided, will prompt)
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Configure the Letterboxd account to read from
    Letterboxd {
        /// Letterboxd username (if not provided, will prompt)
        #[arg(long)]
        username: Option<String>,
    },

    /// Print the configuration directory
    Path,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // A missing .env is fine; settings may come from the environment or config.toml
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_file = match cli.log_file {
        Some(Some(path)) => Some(path),
        Some(None) => Some(PathManager::new().map_err(|e| eyre!("{}", e))?.default_log_file()),
        None => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file).map_err(|e| eyre!("{}", e))?;

    match dotenv {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => tracing::trace!("No .env file found"),
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { dry_run } => sync::run_sync(dry_run, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output),
    }
}
