use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use commands::{config, inspect, sync};
use std::path::PathBuf;

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "plexsync")]
#[command(about = "plexsync - Keep Plex and Trakt in agreement")]
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

    /// Also write logs to this file (rotated daily)
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SyncScope {
    All,
    Movies,
    Tv,
}

#[derive(Subcommand)]
enum Commands {
    /// Perform sync between Plex and Trakt
    #[command(long_about = "Reconcile collection, ratings and watched status between the Plex library and Trakt, then mirror the Trakt watchlist and liked lists into Plex playlists. Trakt writes are queued and submitted at the end of the run.")]
    Sync {
        /// Only sync the library section with this title
        #[arg(long)]
        library: Option<String>,

        /// Sync a specific show only (implies --sync tv)
        #[arg(long)]
        show: Option<String>,

        /// What to sync
        #[arg(long = "sync", default_value = "all", value_enum, ignore_case = true)]
        scope: SyncScope,

        /// Number of items per Trakt submission request
        #[arg(long, default_value_t = 1)]
        batch_size: usize,
    },
    /// Inspect details of a Plex library item
    #[command(long_about = "Fetch a single Plex item by rating key (or a Plex Web URL containing one) and show its guids, the resolved provider id and the matching Trakt item.")]
    Inspect {
        /// Rating key or Plex Web URL
        input: String,
    },
    /// Configure credentials and settings
    #[command(long_about = "Manage configuration and credentials. Running without a subcommand shows the current configuration.")]
    Config {
        #[command(subcommand)]
        cmd: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (masks sensitive data)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },

    /// Configure the Plex server and token
    #[command(long_about = "Store the Plex server URL and an X-Plex-Token. The token is verified against plex.tv before it is saved.")]
    Plex {
        /// Plex token (prompted when omitted)
        #[arg(long)]
        token: Option<String>,

        /// Plex server URL, e.g. http://localhost:32400
        #[arg(long)]
        server_url: Option<String>,
    },

    /// Configure Trakt (OAuth flow)
    #[command(long_about = "Configure Trakt API credentials and authorize plexsync. Create a Trakt API application at https://trakt.tv/oauth/applications first.")]
    Trakt {
        /// Trakt Client ID (prompted when omitted)
        #[arg(long)]
        client_id: Option<String>,

        /// Trakt Client Secret (prompted when omitted)
        #[arg(long)]
        client_secret: Option<String>,
    },

    /// Choose which fields are synced
    Sync {
        /// Add Plex items to the Trakt collection
        #[arg(long)]
        collection: Option<bool>,

        /// Sync ratings
        #[arg(long)]
        ratings: Option<bool>,

        /// Sync watched status
        #[arg(long)]
        watched_status: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    logging::init_logging_with_file(cli.verbose, cli.quiet, cli.log_file.clone())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match cli.command {
        Commands::Sync { library, show, scope, batch_size } => {
            sync::run_sync(sync::SyncArgs { library, show, scope, batch_size }, &output).await
        }
        Commands::Inspect { input } => inspect::run_inspect(&input, &output).await,
        Commands::Config { cmd } => {
            let cmd = cmd.unwrap_or(ConfigCommands::Show { full: false });
            config::run_config(cmd, &output).await
        }
    }
}
