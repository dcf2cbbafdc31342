use anyhow::Result;
use clap::{CommandFactory, Parser, ValueEnum};
use color_eyre::config::HookBuilder;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod handlers;
mod wizard;

/// wetransfer - send files and manage boards on WeTransfer
#[derive(Parser, Debug)]
#[command(name = "wetransfer")]
#[command(author = "Kev <kev@m7academy.com>")]
#[command(version)]
#[command(about = "Upload files to WeTransfer from your terminal", long_about = None)]
struct Cli {
    /// API key (overrides the configuration file)
    #[arg(long, global = true, env = "WE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Show debug logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Interactive setup
    Init,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Upload files as one transfer and print its link
    Upload {
        /// Files (or directories with --recursive)
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Message attached to the transfer
        #[arg(short, long, default_value = "")]
        message: String,
        /// Upload the contents of directories
        #[arg(short, long)]
        recursive: bool,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },

    /// Manage boards
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },

    /// Shell completion
    Completion {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: String,
    },

    /// Diagnostics
    Doctor {
        #[command(subcommand)]
        action: DoctorAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Edit the configuration in $EDITOR
    Edit,
    /// Validate the configuration and the API key
    Validate,
}

#[derive(clap::Subcommand, Debug)]
enum BoardAction {
    /// Create an empty board
    Create { name: String },
    /// Show a board and its items
    Show { id: String },
    /// Upload files to a board
    AddFiles {
        id: String,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Add a link to a board
    AddLink {
        id: String,
        #[arg(long)]
        url: String,
        /// Defaults to the URL
        #[arg(long)]
        title: Option<String>,
    },
}

#[derive(clap::Subcommand, Debug)]
enum DoctorAction {
    /// Check the installation and configuration
    Check,
    /// Authorize against the API
    TestConnection,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = wetransfer_core::load_config()
                .ok()
                .and_then(|c| c.logging)
                .map(|l| l.level)
                .unwrap_or_else(|| "warn".to_string());
            EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("warn"))
        })
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    if let Err(e) = HookBuilder::default().install() {
        eprintln!("Warning: Failed to install error handler: {}", e);
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let api_key = cli.api_key.as_deref();

    match cli.command {
        Commands::Init => handlers::handle_init().await,
        Commands::Config { action } => {
            let action_str = match action {
                ConfigAction::Show => "show",
                ConfigAction::Edit => "edit",
                ConfigAction::Validate => "validate",
            };
            handlers::handle_config(action_str, api_key).await
        }
        Commands::Upload {
            paths,
            message,
            recursive,
            output,
        } => handlers::handle_upload(api_key, &paths, &message, recursive, output).await,
        Commands::Board { action } => {
            let (action_str, target, paths, link) = match action {
                BoardAction::Create { name } => ("create", name, Vec::new(), None),
                BoardAction::Show { id } => ("show", id, Vec::new(), None),
                BoardAction::AddFiles { id, paths } => ("add-files", id, paths, None),
                BoardAction::AddLink { id, url, title } => {
                    let title = title.unwrap_or_else(|| url.clone());
                    ("add-link", id, Vec::new(), Some(wetransfer_core::Link::new(url, title)))
                }
            };
            handlers::handle_board(api_key, action_str, &target, &paths, link).await
        }
        Commands::Completion { shell } => {
            handlers::handle_completion(&shell, &mut Cli::command()).await
        }
        Commands::Doctor { action } => {
            let action_str = match action {
                DoctorAction::Check => "check",
                DoctorAction::TestConnection => "test-connection",
            };
            handlers::handle_doctor(action_str, api_key).await
        }
    }
}
