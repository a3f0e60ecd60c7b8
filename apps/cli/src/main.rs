mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::InventoryController;
use shared::domain::InventorySnapshot;
use store::{InventoryStore, MemoryInventoryStore, RemoteInventoryStore};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "inventory", about = "Inventory tracker over a remote document store")]
struct Args {
    /// Base URL of the document store service.
    #[arg(long)]
    store_url: Option<String>,
    /// Collection holding the inventory documents.
    #[arg(long)]
    collection: Option<String>,
    /// Run against a process-local in-memory store instead of a remote one.
    #[arg(long)]
    memory: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current inventory.
    List,
    /// Add one unit of an item, creating it when missing.
    Add { name: String },
    /// Remove one unit of an item, deleting it at quantity one.
    Remove { name: String },
    /// Print items whose name contains the query.
    Search { query: String },
    /// Poll the store and reprint the inventory whenever it changes.
    Watch {
        /// Poll interval in seconds.
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let mut settings = config::load_settings();
    if let Some(store_url) = args.store_url {
        settings.store_url = store_url;
    }
    if let Some(collection) = args.collection {
        settings.collection = collection;
    }

    let store: Arc<dyn InventoryStore> = if args.memory {
        Arc::new(MemoryInventoryStore::new())
    } else {
        let base = config::parse_store_url(&settings.store_url)?;
        Arc::new(RemoteInventoryStore::new(base))
    };
    let controller = InventoryController::with_collection(store, settings.collection);

    match args.command {
        Command::List => {
            let snapshot = controller.refresh().await?;
            print_snapshot(&snapshot);
        }
        Command::Add { name } => {
            controller.increment(&name).await?;
            print_snapshot(&controller.snapshot().await);
        }
        Command::Remove { name } => {
            controller.decrement(&name).await?;
            print_snapshot(&controller.snapshot().await);
        }
        Command::Search { query } => {
            controller.refresh().await?;
            print_snapshot(&controller.search(&query).await);
        }
        Command::Watch { interval_secs } => {
            watch(&controller, Duration::from_secs(interval_secs.max(1))).await?;
        }
    }

    Ok(())
}

async fn watch(controller: &Arc<InventoryController>, interval: Duration) -> Result<()> {
    info!(interval_secs = interval.as_secs(), "watching inventory");
    let mut last: Option<InventorySnapshot> = None;
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let snapshot = controller.refresh().await?;
        if last.as_ref() != Some(&snapshot) {
            print_snapshot(&snapshot);
            last = Some(snapshot);
        }
    }
}

fn print_snapshot(snapshot: &InventorySnapshot) {
    if snapshot.is_empty() {
        println!("(inventory empty)");
        return;
    }
    for item in snapshot.items() {
        println!("{:<24} {}", item.display_name(), item.quantity);
    }
}
