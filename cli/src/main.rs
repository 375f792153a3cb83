mod client;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::client::{HttpPantryApi, is_unreachable};
use crate::commands::{
    cmd_categories, cmd_cuisines, cmd_logout, cmd_pantry_add, cmd_pantry_delete, cmd_pantry_edit,
    cmd_pantry_list, cmd_recipe, cmd_recipes, cmd_register, cmd_whoami,
};
use crate::config::Config;
use pantry_core::error::{ApiError, FlowError};

const LOG_ENV: &str = "PANTRY_LOG";

#[derive(Parser)]
#[command(
    name = "pantry",
    version,
    about = "Find out what you can cook with what is already in your kitchen",
    long_about = "Find out what you can cook with what is already in your kitchen.\n\n\
        Register once with an email and the ingredients you have, then ask for\n\
        recipes ranked by how few ingredients you are missing."
)]
struct Cli {
    /// Base URL of the recipe API (default: $PANTRY_API_URL, config.json, or http://localhost:8000/api)
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with an email and the ingredients you have
    Register {
        /// Your email address
        email: String,
        /// Ingredients to start with (each is searched and picked)
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Add every ingredient as typed, without searching
        #[arg(long)]
        new: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the account remembered on this machine
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Forget the account remembered on this machine
    Logout {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recommended recipes, best matches first
    Recipes {
        /// Only recipes in this category (name or ID)
        #[arg(long)]
        category: Option<String>,
        /// Only recipes of this cuisine (name or ID)
        #[arg(long)]
        cuisine: Option<String>,
        /// Page of results to show
        #[arg(short, long, default_value = "1")]
        page: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe and what you are missing for it
    Recipe {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search recipe categories
    Categories {
        /// Category name to search for
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cuisines
    Cuisines {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the ingredients you have
    Pantry {
        #[command(subcommand)]
        command: PantryCommands,
    },
}

#[derive(Subcommand)]
enum PantryCommands {
    /// List your ingredients
    List {
        /// Page to show (10 ingredients per page)
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add ingredients
    Add {
        /// Ingredients to add (each is searched and picked)
        #[arg(required = true)]
        ingredients: Vec<String>,
        /// Add every ingredient as typed, without searching
        #[arg(long)]
        new: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the ingredient of a pantry entry
    Edit {
        /// Pantry entry ID (from 'pantry pantry list')
        id: i64,
        /// New ingredient
        ingredient: String,
        /// Use the ingredient as typed, without searching
        #[arg(long)]
        new: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a pantry entry
    Delete {
        /// Pantry entry ID (from 'pantry pantry list')
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        if api_unreachable(&e) {
            eprintln!("Is the recipe API running? Set it with --api-url or {}", config::API_URL_ENV);
        }
        process::exit(1);
    }
}

fn api_unreachable(e: &anyhow::Error) -> bool {
    e.chain().any(|cause| match cause.downcast_ref::<FlowError>() {
        Some(FlowError::Api(api)) => is_unreachable(api),
        _ => cause.downcast_ref::<ApiError>().is_some_and(is_unreachable),
    })
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.api_url)?;
    let session = config.session();
    let api = Arc::new(HttpPantryApi::new(&config.api_url)?);
    tracing::debug!(api_url = %config.api_url, "starting");

    match cli.command {
        Commands::Register {
            email,
            ingredients,
            new,
            json,
        } => cmd_register(api, &session, &email, &ingredients, new, json).await,
        Commands::Whoami { json } => cmd_whoami(api.as_ref(), &session, json).await,
        Commands::Logout { json } => cmd_logout(&session, json),
        Commands::Recipes {
            category,
            cuisine,
            page,
            json,
        } => {
            cmd_recipes(
                api,
                &session,
                category.as_deref(),
                cuisine.as_deref(),
                page,
                json,
            )
            .await
        }
        Commands::Recipe { id, json } => cmd_recipe(api.as_ref(), &session, id, json).await,
        Commands::Categories { query, json } => cmd_categories(api, &query, json).await,
        Commands::Cuisines { json } => cmd_cuisines(api.as_ref(), json).await,
        Commands::Pantry { command } => match command {
            PantryCommands::List { page, json } => {
                cmd_pantry_list(api, &session, page, json).await
            }
            PantryCommands::Add {
                ingredients,
                new,
                json,
            } => cmd_pantry_add(api, &session, &ingredients, new, json).await,
            PantryCommands::Edit {
                id,
                ingredient,
                new,
                json,
            } => cmd_pantry_edit(api, &session, id, &ingredient, new, json).await,
            PantryCommands::Delete { id, json } => {
                cmd_pantry_delete(api, &session, id, json).await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_api_url() {
        let cli = Cli::try_parse_from([
            "pantry",
            "pantry",
            "list",
            "--api-url",
            "http://example.test/api",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://example.test/api"));
        assert!(matches!(
            cli.command,
            Commands::Pantry {
                command: PantryCommands::List { page: 1, json: false }
            }
        ));
    }

    #[test]
    fn test_register_requires_an_ingredient() {
        assert!(Cli::try_parse_from(["pantry", "register", "ada@example.com"]).is_err());
    }
}
