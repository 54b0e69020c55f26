use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use recipebox_application::AppContext;
use recipebox_core::RecipeBoxError;
use recipebox_infrastructure::ConfigService;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "recipebox")]
#[command(about = "RecipeBox - share recipes with your community", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding documents, images and accounts
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and sign in to it
    Signup(Credentials),
    /// Sign in to an existing account
    Signin(Credentials),
    /// Sign out
    Signout,
    /// Show who is currently acting
    Whoami,
    /// Add a recipe
    Add(commands::recipe::AddArgs),
    /// List all recipes, newest first
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct Credentials {
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = match err.downcast_ref::<RecipeBoxError>() {
                Some(err) => err.user_message(),
                None => format!("{:#}", err),
            };
            eprintln!("{} {}", "error:".red().bold(), message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path),
        None => ConfigService::new()?,
    };
    let mut config = config_service.load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    logging::init(&config);
    tracing::debug!("Using config file {}", config_service.path().display());

    let context = if cli.ephemeral {
        AppContext::ephemeral(config)?
    } else {
        AppContext::file_backed(config)
            .await
            .context("Failed to open the local stores")?
    };

    match cli.command {
        Commands::Signup(c) => commands::account::sign_up(&context, &c.email, &c.password).await,
        Commands::Signin(c) => commands::account::sign_in(&context, &c.email, &c.password).await,
        Commands::Signout => commands::account::sign_out(&context).await,
        Commands::Whoami => commands::account::whoami(&context).await,
        Commands::Add(args) => commands::recipe::add(&context, args).await,
        Commands::List { json } => commands::recipe::list(&context, json).await,
    }
}
