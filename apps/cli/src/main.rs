//! RocketShoes CLI - the cart from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! rocketshoes show
//!
//! # Add one pair of product 1 (checks stock first)
//! rocketshoes add 1
//!
//! # Set product 1 to three pairs
//! rocketshoes update 1 3
//!
//! # Remove product 1
//! rocketshoes remove 1
//!
//! # Point at another stock service
//! rocketshoes --api-url http://10.0.0.5:3333 add 2
//! ```
//!
//! # Environment Variables
//!
//! - `ROCKETSHOES_API_URL`, `ROCKETSHOES_DB_PATH`, ... - see `CartConfig`
//! - `RUST_LOG` - log filter (default `info,rocketshoes=debug,sqlx=warn`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use rocketshoes_cart::{
    AmountUpdate, CartConfig, CartStore, HttpStockService, LocalStore, MutationOutcome,
    ProductId, StockService, StoreOptions,
};
use rocketshoes_db::{Database, DbConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser)]
#[command(name = "rocketshoes")]
#[command(author, version, about = "RocketShoes shopping cart")]
struct Cli {
    /// Config file (default: platform config dir, cart.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stock service base URL, overrides config and environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    Show,
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// Remove a product from the cart
    Remove { product_id: ProductId },
    /// Set a product's quantity
    Update {
        product_id: ProductId,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Print how many units of a product are in the cart
    Amount { product_id: ProductId },
    /// Print the cart total
    Total,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("Command failed: {e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rocketshoes=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut config = CartConfig::load(cli.config)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
        config.validate()?;
    }

    let db_path = config.storage.resolved_database_path()?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    debug!(path = %db_path.display(), "Opening cart database");

    let db = Database::new(DbConfig::new(db_path)).await?;
    let service = HttpStockService::from_config(&config.api)?;
    let store = CartStore::load(service, db.clone(), StoreOptions::from(&config)).await;

    let code = execute(&store, cli.command).await;

    db.close().await;
    Ok(code)
}

async fn execute<S: StockService, L: LocalStore>(
    store: &CartStore<S, L>,
    command: Commands,
) -> ExitCode {
    let mut notifications = store.notifications();

    let outcome = match command {
        Commands::Show => {
            print!("{}", render::cart(&store.cart()));
            return ExitCode::SUCCESS;
        }
        Commands::Amount { product_id } => {
            println!("{}", store.amount_of_product(product_id));
            return ExitCode::SUCCESS;
        }
        Commands::Total => {
            println!("{}", store.cart().total());
            return ExitCode::SUCCESS;
        }
        Commands::Add { product_id } => store.add_product(product_id).await,
        Commands::Remove { product_id } => store.remove_product(product_id).await,
        Commands::Update { product_id, amount } => {
            store
                .update_product_amount(AmountUpdate { product_id, amount })
                .await
        }
    };

    match outcome {
        MutationOutcome::Applied => {
            print!("{}", render::cart(&store.cart()));
            ExitCode::SUCCESS
        }
        MutationOutcome::Rejected(kind) => {
            let message = notifications
                .try_recv()
                .map(|n| n.message)
                .unwrap_or_else(|_| kind.message().to_string());
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}
