//! CountryFresh CLI - cart quotes, offline cart and server checks.
//!
//! # Usage
//!
//! ```bash
//! # Price a cart: two loaves at 1000 and a pie at 2000
//! cf-cli quote 1000x2 2000
//!
//! # Work with the offline cart
//! cf-cli offline add 12 --quantity 2
//! cf-cli offline list
//!
//! # Ask the storefront for the badge count
//! cf-cli remote count
//! ```
//!
//! # Commands
//!
//! - `quote` - Price line items with the configured delivery rules
//! - `offline` - Inspect or change the offline cart
//! - `remote` - Talk to the storefront server

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use countryfresh_cart::CartConfig;

mod commands;

#[derive(Parser)]
#[command(name = "cf-cli")]
#[command(author, version, about = "CountryFresh cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Price line items given as `PRICE` or `PRICExQUANTITY`
    Quote {
        #[arg(required = true)]
        items: Vec<String>,
    },
    /// Manage the offline cart
    Offline {
        #[command(subcommand)]
        action: OfflineAction,
    },
    /// Talk to the storefront server
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand)]
enum OfflineAction {
    /// Add units of a product
    Add {
        product: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product
    Remove { product: String },
    /// Overwrite a product's quantity (0 removes it)
    Set { product: String, quantity: u32 },
    /// Empty the offline cart
    Clear,
    /// Print the total item count
    Count,
    /// List every entry
    List,
}

#[derive(Subcommand)]
enum RemoteAction {
    /// Print the server's cart count
    Count,
    /// Add a product to the server cart
    QuickAdd {
        product: String,
        #[arg(short, long, default_value = "1")]
        quantity: String,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "countryfresh_cart=info,countryfresh_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CartConfig::from_env()?;

    match cli.command {
        Commands::Quote { items } => commands::quote::run(&config, &items)?,
        Commands::Offline { action } => {
            let store = commands::offline::open(&config);
            match action {
                OfflineAction::Add { product, quantity } => {
                    commands::offline::add(&store, &product, quantity)?;
                }
                OfflineAction::Remove { product } => commands::offline::remove(&store, &product)?,
                OfflineAction::Set { product, quantity } => {
                    commands::offline::set(&store, &product, quantity)?;
                }
                OfflineAction::Clear => commands::offline::clear(&store)?,
                OfflineAction::Count => commands::offline::count(&store)?,
                OfflineAction::List => commands::offline::list(&store)?,
            }
        }
        Commands::Remote { action } => match action {
            RemoteAction::Count => commands::remote::count(&config).await?,
            RemoteAction::QuickAdd { product, quantity } => {
                commands::remote::quick_add(&config, &product, &quantity).await?;
            }
        },
    }
    Ok(())
}
