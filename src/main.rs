mod blocks;
mod config;
mod notion;
mod pacer;
mod post;
mod render;
mod store;
mod sync;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};

const DEFAULT_OUT_DIR: &str = "content/blog";
const DEFAULT_INDEX: &str = "public/blog-posts.json";
const DEFAULT_RPS: f64 = 3.0;

#[derive(Parser)]
#[command(
    name = "notion_sync",
    about = "Sync published Notion posts into Markdown files and a JSON index"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch published posts, write changed Markdown files, regenerate the index
    Sync {
        /// Max posts to process (default: all published)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Render and compare but write nothing
        #[arg(long)]
        dry_run: bool,
        /// Directory for per-post Markdown files
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
        /// Path of the regenerated JSON index
        #[arg(long, default_value = DEFAULT_INDEX)]
        index: PathBuf,
        /// Outbound API calls per second
        #[arg(long, default_value_t = DEFAULT_RPS)]
        rps: f64,
    },
    /// Fetch one page and print its rendered Markdown
    Page {
        /// Notion page id
        id: String,
        /// Outbound API calls per second
        #[arg(long, default_value_t = DEFAULT_RPS)]
        rps: f64,
    },
    /// Show counts from the output directory and index
    Stats {
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
        #[arg(long, default_value = DEFAULT_INDEX)]
        index: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            limit,
            dry_run,
            out_dir,
            index,
            rps,
        } => {
            let cfg = config::Config::from_env()?;
            let client = notion::NotionClient::new(&cfg.token);
            let pacer = pacer::Pacer::per_second(rps, 1.0);
            let strategy = config::SyncStrategy::default();
            let opts = sync::SyncOptions {
                out_dir,
                index_path: index,
                limit,
                dry_run,
            };
            let stats = sync::run(&client, &pacer, &strategy, &cfg.database_id, &opts).await?;
            stats.print();
            Ok(())
        }
        Commands::Page { id, rps } => {
            let cfg = config::Config::from_env()?;
            let client = notion::NotionClient::new(&cfg.token);
            let pacer = pacer::Pacer::per_second(rps, 1.0);
            let strategy = config::SyncStrategy::default();
            let forest = notion::fetch_forest(&client, &pacer, &strategy, &id).await?;
            let rendered = render::render_forest(&forest, &strategy);
            print!("{}", rendered.body);
            Ok(())
        }
        Commands::Stats { out_dir, index } => {
            let store = store::Store::open(&out_dir)?;
            println!("Posts on disk: {}", store.load_existing().len());
            println!("Backups:       {}", store.backup_count());
            match std::fs::read_to_string(&index) {
                Ok(json) => {
                    let parsed: serde_json::Value = serde_json::from_str(&json)?;
                    let entries = parsed["posts"].as_array().map(|a| a.len()).unwrap_or(0);
                    println!("Index entries: {}", entries);
                    if let Some(updated) = parsed["lastUpdated"].as_str() {
                        println!("Last updated:  {}", updated);
                    }
                }
                Err(_) => println!("No index at {}", index.display()),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
