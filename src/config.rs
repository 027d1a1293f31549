use anyhow::{Context, Result};

/// Credentials read from the environment before any network call.
#[derive(Debug)]
pub struct Config {
    pub token: String,
    pub database_id: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let token = std::env::var("NOTION_TOKEN")
            .context("NOTION_TOKEN environment variable must be set")?;
        let database_id = std::env::var("NOTION_DATABASE_ID")
            .context("NOTION_DATABASE_ID environment variable must be set")?;
        Ok(Config { token, database_id })
    }
}

/// Where a post's title comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    /// First heading block found in document order, falling back to the
    /// title property.
    FirstHeading,
    /// Title property only.
    Property,
}

/// One value enumerating the behaviors that used to vary across script
/// revisions. Defaults reproduce the richest variant.
#[derive(Debug, Clone)]
pub struct SyncStrategy {
    pub title_source: TitleSource,
    /// Fetch the source tree of synced blocks that reference another block.
    pub follow_synced: bool,
    /// Descend into child pages found inside a post body.
    pub follow_child_pages: bool,
    /// Render tables (off leaves an empty fragment in their place).
    pub render_tables: bool,
}

impl Default for SyncStrategy {
    fn default() -> Self {
        SyncStrategy {
            title_source: TitleSource::FirstHeading,
            follow_synced: true,
            follow_child_pages: true,
            render_tables: true,
        }
    }
}
