use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::json;

use crate::blocks::{Block, BlockKind, PageObject, Paginated};
use crate::config::SyncStrategy;
use crate::pacer::Pacer;
use crate::post::{PROP_DATE, PROP_PUBLISHED};

const NOTION_API: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// The two remote operations the sync needs. Business logic depends on
/// this trait, never on HTTP details.
#[async_trait]
pub trait NotionApi {
    /// One page of the published-post query, newest publish date first.
    async fn query_published(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<PageObject>>;

    /// One page of a block's children.
    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Block>>;
}

pub struct NotionClient {
    http: reqwest::Client,
    token: String,
}

impl NotionClient {
    pub fn new(token: &str) -> Self {
        NotionClient {
            http: reqwest::Client::new(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl NotionApi for NotionClient {
    async fn query_published(
        &self,
        database_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<PageObject>> {
        let mut body = json!({
            "filter": { "and": [
                { "property": PROP_PUBLISHED, "checkbox": { "equals": true } },
                { "property": PROP_DATE, "date": { "is_not_empty": true } }
            ]},
            "sorts": [{ "property": PROP_DATE, "direction": "descending" }],
            "page_size": PAGE_SIZE,
        });
        if let Some(c) = cursor {
            body["start_cursor"] = json!(c);
        }

        let url = format!("{NOTION_API}/databases/{database_id}/query");
        self.http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode database query response")
    }

    async fn list_children(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<Block>> {
        let mut url = format!("{NOTION_API}/blocks/{block_id}/children?page_size={PAGE_SIZE}");
        if let Some(c) = cursor {
            url.push_str("&start_cursor=");
            url.push_str(c);
        }

        self.http
            .get(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode block children response")
    }
}

/// Run the published-post query to exhaustion, concatenating pages in
/// order. `limit` truncates without issuing further requests.
pub async fn query_all_published<A: NotionApi + Sync>(
    api: &A,
    pacer: &Pacer,
    database_id: &str,
    limit: Option<usize>,
) -> Result<Vec<PageObject>> {
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        pacer.pause().await;
        let batch = api.query_published(database_id, cursor.as_deref()).await?;
        pages.extend(batch.results);
        if let Some(n) = limit {
            if pages.len() >= n {
                pages.truncate(n);
                break;
            }
        }
        match batch.next_cursor {
            Some(c) if batch.has_more => cursor = Some(c),
            _ => break,
        }
    }
    Ok(pages)
}

/// Fetch the complete ordered forest under a root page: every block with
/// `has_children` set gets its subtree attached before this returns, so
/// the renderer never needs the network.
pub async fn fetch_forest<A: NotionApi + Sync>(
    api: &A,
    pacer: &Pacer,
    strategy: &SyncStrategy,
    root_id: &str,
) -> Result<Vec<Block>> {
    fetch_children(api, pacer, strategy, root_id.to_string()).await
}

fn fetch_children<'a, A: NotionApi + Sync>(
    api: &'a A,
    pacer: &'a Pacer,
    strategy: &'a SyncStrategy,
    block_id: String,
) -> Pin<Box<dyn Future<Output = Result<Vec<Block>>> + Send + 'a>> {
    Box::pin(async move {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            pacer.pause().await;
            let page = api.list_children(&block_id, cursor.as_deref()).await?;
            blocks.extend(page.results);
            match page.next_cursor {
                Some(c) if page.has_more => cursor = Some(c),
                _ => break,
            }
        }

        for block in &mut blocks {
            if let Some(source_id) = subtree_source(block, strategy) {
                block.children = fetch_children(api, pacer, strategy, source_id).await?;
            }
        }

        Ok(blocks)
    })
}

/// Which block id a node's subtree should be fetched from, if any.
/// Synced-block copies carry their source in `synced_from` and have no
/// children of their own.
fn subtree_source(block: &Block, strategy: &SyncStrategy) -> Option<String> {
    if let BlockKind::SyncedBlock { synced_block } = &block.kind {
        if let Some(from) = &synced_block.synced_from {
            return strategy.follow_synced.then(|| from.block_id.clone());
        }
    }
    if !block.has_children {
        return None;
    }
    if matches!(block.kind, BlockKind::ChildPage { .. }) && !strategy.follow_child_pages {
        return None;
    }
    Some(block.id.clone())
}
