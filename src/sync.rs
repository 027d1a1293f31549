use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::blocks::PageObject;
use crate::config::SyncStrategy;
use crate::notion::{fetch_forest, query_all_published, NotionApi};
use crate::pacer::Pacer;
use crate::post::{PostDoc, PostIndex, PostMeta, PostSummary};
use crate::render::render_forest;
use crate::store::{write_index, Store};

pub struct SyncOptions {
    pub out_dir: PathBuf,
    pub index_path: PathBuf,
    pub limit: Option<usize>,
    pub dry_run: bool,
}

#[derive(Debug, Default)]
pub struct SyncStats {
    pub total: usize,
    pub written: usize,
    pub unchanged: usize,
    pub backups: usize,
    pub errors: usize,
}

impl SyncStats {
    pub fn print(&self) {
        println!(
            "Synced {} posts: {} written, {} unchanged, {} backed up, {} errors.",
            self.total, self.written, self.unchanged, self.backups, self.errors
        );
    }
}

/// One full sync: query published posts, render each into Markdown,
/// write changed files (backing up what they replace), regenerate the
/// index. Per-post failures are logged and skipped; only the initial
/// query and the final index write abort the run.
pub async fn run<A: NotionApi + Sync>(
    api: &A,
    pacer: &Pacer,
    strategy: &SyncStrategy,
    database_id: &str,
    opts: &SyncOptions,
) -> Result<SyncStats> {
    let run_stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    let store = Store::open(&opts.out_dir)?;
    let existing = store.load_existing();

    let pages = query_all_published(api, pacer, database_id, opts.limit)
        .await
        .context("Failed to query published posts")?;
    info!("Query returned {} published posts", pages.len());

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    let mut stats = SyncStats {
        total: pages.len(),
        ..SyncStats::default()
    };
    let mut summaries = Vec::with_capacity(pages.len());

    for page in &pages {
        pb.set_message(page.id.clone());
        match sync_one(api, pacer, strategy, page, &run_stamp, &existing, &store, opts).await {
            Ok((summary, outcome)) => {
                // Index order always matches query order.
                summaries.push(summary);
                match outcome {
                    Outcome::Written { backed_up } => {
                        stats.written += 1;
                        if backed_up {
                            stats.backups += 1;
                        }
                    }
                    Outcome::Unchanged => stats.unchanged += 1,
                }
            }
            Err(err) => {
                warn!("Skipping post {}: {:#}", page.id, err);
                stats.errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();

    let index = PostIndex {
        posts: summaries,
        last_updated: run_stamp,
    };
    if opts.dry_run {
        info!("Dry run: index not written");
    } else {
        write_index(&opts.index_path, &index).context("Failed to write post index")?;
    }

    Ok(stats)
}

enum Outcome {
    Written { backed_up: bool },
    Unchanged,
}

#[allow(clippy::too_many_arguments)]
async fn sync_one<A: NotionApi + Sync>(
    api: &A,
    pacer: &Pacer,
    strategy: &SyncStrategy,
    page: &PageObject,
    run_stamp: &str,
    existing: &HashMap<String, String>,
    store: &Store,
    opts: &SyncOptions,
) -> Result<(PostSummary, Outcome)> {
    let forest = fetch_forest(api, pacer, strategy, &page.id)
        .await
        .with_context(|| format!("Failed to fetch blocks for {}", page.id))?;

    let rendered = render_forest(&forest, strategy);
    let meta = PostMeta::from_page(page, rendered.title.as_deref(), strategy, run_stamp);
    let doc = PostDoc {
        meta,
        body: rendered.body,
    };

    let markdown = doc.to_markdown();
    let outcome = match existing.get(&doc.meta.slug) {
        Some(previous) if *previous == markdown => {
            info!("No changes for {}", doc.meta.slug);
            Outcome::Unchanged
        }
        previous => {
            let had_previous = previous.is_some();
            if opts.dry_run {
                info!("Would update {} (dry run)", doc.meta.slug);
            } else {
                if had_previous {
                    store.backup(&doc.meta.slug, &Utc::now())?;
                }
                store.write_post(&doc.meta.slug, &markdown)?;
                info!("Updated {}", doc.meta.slug);
            }
            Outcome::Written {
                backed_up: had_previous && !opts.dry_run,
            }
        }
    };

    Ok((doc.summary(), outcome))
}
