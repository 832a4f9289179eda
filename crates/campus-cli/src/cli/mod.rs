//! CLI entry and dispatch.

use anyhow::{Context, Result};
use campus_core::config;
use clap::Parser;

use crate::console::Console;

mod commands;

#[derive(Parser)]
#[command(name = "campus")]
#[command(version = "0.1")]
#[command(about = "Smart Campus Operations Hub console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Sign in with a username and password, or through the identity provider
    Login {
        /// Username (prompted for when omitted)
        #[arg(short, long)]
        username: Option<String>,

        /// Password (prompted for when omitted)
        #[arg(short, long, env = "CAMPUS_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        /// Sign in through the identity provider and paste the redirect URL
        #[arg(long, conflicts_with_all = ["username", "password"])]
        oauth: bool,
    },

    /// Sign out and remove the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse and manage campus resources
    Resources {
        #[command(subcommand)]
        command: ResourceCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Interactive console with navigation history
    Shell,
}

#[derive(clap::Subcommand)]
enum ResourceCommands {
    /// Lists all resources
    List,
    /// Shows a single resource
    Get {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Searches resources; unset filters are ignored
    Search {
        /// Resource type, e.g. LAB or LECTURE_HALL
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,
        /// Minimum capacity
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long)]
        location: Option<String>,
    },
    /// Creates a resource from a JSON document (admin only)
    Create {
        /// JSON body, or `-` to read from stdin
        #[arg(value_name = "JSON")]
        json: String,
    },
    /// Replaces a resource from a JSON document (admin only)
    Update {
        #[arg(value_name = "ID")]
        id: i64,
        /// JSON body, or `-` to read from stdin
        #[arg(value_name = "JSON")]
        json: String,
    },
    /// Deletes a resource (admin only)
    Delete {
        #[arg(value_name = "ID")]
        id: i64,
    },
    /// Shows resource counts by status and type
    Analytics,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    // Config commands must work even when the config file is broken.
    if let Commands::Config { command } = &cli.command {
        return match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        };
    }

    let config = config::Config::load().context("load config")?;
    let mut console = Console::boot(config)?;

    match cli.command {
        Commands::Login {
            username,
            password,
            oauth,
        } => {
            if oauth {
                commands::auth::login_oauth(&mut console).await
            } else {
                commands::auth::login(&mut console, username, password).await
            }
        }
        Commands::Logout => commands::auth::logout(&mut console),
        Commands::Whoami => commands::auth::whoami(&console),

        Commands::Resources { command } => match command {
            ResourceCommands::List => commands::resources::list(&mut console).await,
            ResourceCommands::Get { id } => commands::resources::get(&mut console, id).await,
            ResourceCommands::Search {
                kind,
                capacity,
                location,
            } => {
                let filters = campus_core::resources::ResourceFilters {
                    kind,
                    capacity,
                    location,
                };
                commands::resources::search(&mut console, &filters).await
            }
            ResourceCommands::Create { json } => {
                commands::resources::create(&mut console, &json).await
            }
            ResourceCommands::Update { id, json } => {
                commands::resources::update(&mut console, id, &json).await
            }
            ResourceCommands::Delete { id } => commands::resources::delete(&mut console, id).await,
            ResourceCommands::Analytics => commands::resources::analytics(&mut console).await,
        },

        Commands::Shell => commands::shell::run(&mut console).await,

        Commands::Config { .. } => Ok(()),
    }
}
