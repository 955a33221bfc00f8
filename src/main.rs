mod auth;
mod config;
mod db;
mod error;
mod models;
mod pricing;
mod quote_image;
mod thumbnail;
mod web;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    auth::SupabaseAuth,
    db::{LeadStore, ProfileStore, memory::MemoryStore},
    pricing::{Quote, format_inr},
    quote_image::{QuoteExporter, QuotePanel},
    thumbnail::HttpThumbnailResolver,
};

#[derive(Parser)]
#[command(name = "creator_folio", about = "Creator portfolios, leads and rate quotes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server
    Serve {
        /// Keep profiles and leads in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// Apply pending database migrations
    Migrate,
    /// Price a single sponsored video from the terminal
    Quote {
        #[arg(long)]
        views: String,
        #[arg(long, default_value = "lifestyle")]
        niche: String,
        #[arg(long, default_value = "social")]
        rights: String,
        /// Instagram handle printed on the card
        #[arg(long, default_value = "creator")]
        handle: String,
        /// Directory to write the quote card PNG into
        #[arg(long)]
        out: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match Cli::parse().command {
        Command::Serve { in_memory } => serve(in_memory).await,
        Command::Migrate => {
            let config = config::init()?;
            let db = db::init(&config).await?;
            db.migrate().await?;
            info!("Migrations applied");
            Ok(())
        }
        Command::Quote {
            views,
            niche,
            rights,
            handle,
            out,
        } => quote(&views, &niche, &rights, &handle, out.as_deref()),
    }
}

async fn serve(in_memory: bool) -> Result<()> {
    let config = config::init()?;

    let (profiles, leads): (Arc<dyn ProfileStore>, Arc<dyn LeadStore>) = if in_memory {
        info!("Using the in-memory store, nothing will be persisted");
        let store = Arc::new(MemoryStore::new());
        let profiles: Arc<dyn ProfileStore> = store.clone();
        let leads: Arc<dyn LeadStore> = store;
        (profiles, leads)
    } else {
        info!("Connecting to database...");
        let db = Arc::new(db::init(&config).await?);
        let profiles: Arc<dyn ProfileStore> = db.clone();
        let leads: Arc<dyn LeadStore> = db;
        (profiles, leads)
    };

    let auth = Arc::new(SupabaseAuth::new(&config));
    let thumbnails = Arc::new(HttpThumbnailResolver::new()?);

    info!("Initializing state...");
    let state = web::State::new(config, profiles, leads, auth, thumbnails)?;

    web::serve(state).await
}

fn quote(views: &str, niche: &str, rights: &str, handle: &str, out: Option<&str>) -> Result<()> {
    let quote = Quote::from_input(views, niche, rights)?;

    println!("Base rate:       {}", format_inr(quote.base_rate));
    println!("Production fee:  {}", format_inr(quote.production_fee));
    println!("Rights:          x{}", quote.multiplier);
    println!("Estimated rate:  {}", format_inr(quote.average));
    println!(
        "Range:           {} - {}",
        format_inr(quote.minimum),
        format_inr(quote.maximum)
    );

    if let Some(dir) = out {
        let exporter = QuoteExporter::new(dir)?;
        let path = exporter.export(&QuotePanel {
            quote: &quote,
            niche,
            rights,
            handle,
        })?;
        println!("Saved quote card to {}", path.display());
    }

    Ok(())
}
