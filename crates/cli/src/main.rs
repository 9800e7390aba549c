//! GoMarket CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! gm-cli list
//! gm-cli add sku-1 --title "Shirt" --image-url https://img.example/shirt.png --price 19.99
//! gm-cli increment sku-1
//! gm-cli decrement sku-1
//! ```
//!
//! # Commands
//!
//! - `list` - Print the cart
//! - `add` - Add one unit of a product
//! - `increment` - Add one unit to an existing line
//! - `decrement` - Remove one unit, dropping the line at zero

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use go_market_core::{Price, Product, ProductId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::cart::CartAction;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(author, version, about = "GoMarket cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    List,
    /// Add one unit of a product to the cart
    Add {
        /// Catalog product id
        id: ProductId,

        /// Display name
        #[arg(short, long)]
        title: String,

        /// Image URL
        #[arg(short, long, default_value = "")]
        image_url: String,

        /// Unit price (e.g. 19.99)
        #[arg(short, long)]
        price: Price,
    },
    /// Add one unit to an existing line
    Increment {
        /// Catalog product id
        id: ProductId,
    },
    /// Remove one unit from a line
    Decrement {
        /// Catalog product id
        id: ProductId,
    },
}

impl From<Commands> for CartAction {
    fn from(command: Commands) -> Self {
        match command {
            Commands::List => Self::List,
            Commands::Add {
                id,
                title,
                image_url,
                price,
            } => Self::Add(Product {
                id,
                title,
                image_url,
                price,
            }),
            Commands::Increment { id } => Self::Increment(id),
            Commands::Decrement { id } => Self::Decrement(id),
        }
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "go_market_cli=info,go_market_cart=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = commands::cart::run(&config, cli.command.into()).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}
