//! Maintenance tool for the announcement store: inspect, search and prune rows.
//! Uses the same config resolution as the monitor itself.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use announce_monitor::{MonitorConfig, Store, StoredRecord};

#[derive(Debug, Parser)]
#[command(name = "monitor-admin", about = "Inspect and prune the announcement store")]
struct Cli {
    /// Database file; defaults to `storage.path` from the monitor config.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Number of stored announcements.
    Count,
    /// Most recently stored announcements.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Every stored announcement, newest first.
    All,
    /// Announcements whose title contains NEEDLE (case-sensitive).
    Search { needle: String },
    /// Whether URL is already stored.
    Exists { url: String },
    /// Delete the announcement stored under URL.
    DeleteUrl { url: String },
    /// Delete the most recently stored announcement published on DATE (prefix match).
    DeleteLatest { date: String },
    /// Delete everything.
    Clear {
        /// Required; clearing is irreversible.
        #[arg(long)]
        yes: bool,
    },
}

fn print_records(rows: &[StoredRecord]) {
    for r in rows {
        println!(
            "#{:<5} {}  {}\n       {}  (stored {})",
            r.id, r.publish_date, r.title, r.url, r.crawl_date
        );
    }
    println!("{} row(s)", rows.len());
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    // Quiet by default; RUST_LOG still wins.
    announce_monitor::init_tracing("warn");

    let db = match cli.db {
        Some(p) => p,
        None => {
            MonitorConfig::load_default()
                .context("loading monitor config")?
                .storage
                .path
        }
    };

    let store = Store::open(&db)
        .await
        .with_context(|| format!("opening store {}", db.display()))?;

    match cli.command {
        Command::Count => println!("{}", store.count().await?),
        Command::Recent { limit } => print_records(&store.recent(limit).await?),
        Command::All => print_records(&store.all().await?),
        Command::Search { needle } => print_records(&store.find_by_title(&needle).await?),
        Command::Exists { url } => println!("{}", store.exists(&url).await?),
        Command::DeleteUrl { url } => {
            if store.delete_by_url(&url).await? {
                println!("deleted {url}");
            } else {
                println!("not found: {url}");
            }
        }
        Command::DeleteLatest { date } => {
            if store.delete_latest_for_date(&date).await? {
                println!("deleted latest announcement published {date}");
            } else {
                println!("no announcement published {date}");
            }
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear the store without --yes");
            }
            store.clear().await?;
            println!("store cleared");
        }
    }

    store.close().await;
    Ok(())
}
