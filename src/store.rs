use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::warn;

use crate::post::PostIndex;

const BACKUP_DIR: &str = ".backups";

/// The output directory holding one `<slug>.md` per post plus a
/// `.backups/` subdirectory for replaced versions.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Store {
            dir: dir.to_path_buf(),
        })
    }

    /// Read every existing post once, keyed by slug. Unreadable files are
    /// skipped with a warning; the sync then treats them as new.
    pub fn load_existing(&self) -> HashMap<String, String> {
        let mut posts = HashMap::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("Could not read existing posts: {}", err);
                return posts;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match fs::read_to_string(&path) {
                Ok(content) => {
                    posts.insert(slug.to_string(), content);
                }
                Err(err) => warn!("Could not read {}: {}", path.display(), err),
            }
        }
        posts
    }

    pub fn post_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }

    /// Copy the current file for `slug` verbatim into the backup
    /// directory before it is overwritten.
    pub fn backup(&self, slug: &str, at: &DateTime<Utc>) -> Result<PathBuf> {
        let backup_dir = self.dir.join(BACKUP_DIR);
        fs::create_dir_all(&backup_dir)?;
        let dest = backup_dir.join(backup_file_name(slug, at));
        fs::copy(self.post_path(slug), &dest)
            .with_context(|| format!("Failed to back up {slug}"))?;
        Ok(dest)
    }

    pub fn write_post(&self, slug: &str, content: &str) -> Result<()> {
        let path = self.post_path(slug);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Number of files in the backup directory, for `stats`.
    pub fn backup_count(&self) -> usize {
        fs::read_dir(self.dir.join(BACKUP_DIR))
            .map(|entries| entries.flatten().count())
            .unwrap_or(0)
    }
}

/// `<slug>-<ISO8601 with ':' and '.' replaced by '-'>.md`, sortable and
/// filesystem-safe.
pub fn backup_file_name(slug: &str, at: &DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{slug}-{stamp}.md")
}

/// Persist the regenerated index, replacing any previous one.
pub fn write_index(path: &Path, index: &PostIndex) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json).with_context(|| format!("Failed to write index {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::post::{PostIndex, PostSummary};

    fn ts(secs: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, secs).unwrap()
    }

    #[test]
    fn load_existing_reads_only_markdown() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        store.write_post("first-post", "content one").unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let existing = store.load_existing();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing["first-post"], "content one");
    }

    #[test]
    fn backup_copies_old_content_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(tmp.path()).unwrap();
        store.write_post("post", "version 1").unwrap();

        let backup_path = store.backup("post", &ts(0)).unwrap();
        store.write_post("post", "version 2").unwrap();

        assert_eq!(fs::read_to_string(&backup_path).unwrap(), "version 1");
        assert_eq!(
            fs::read_to_string(store.post_path("post")).unwrap(),
            "version 2"
        );
        assert_eq!(store.backup_count(), 1);
    }

    #[test]
    fn backup_names_are_slugged_safe_and_sortable() {
        let early = backup_file_name("my-post", &ts(1));
        let late = backup_file_name("my-post", &ts(2));
        assert!(early.starts_with("my-post-"));
        assert!(early.ends_with(".md"));
        assert!(early < late);
    }

    #[test]
    fn backup_name_has_no_unsafe_chars() {
        let name = backup_file_name("p", &ts(0));
        let stem = name.strip_suffix(".md").unwrap();
        assert!(stem.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn index_write_creates_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("public/blog-posts.json");
        let index = PostIndex {
            posts: vec![PostSummary {
                id: "p1".into(),
                slug: "a".into(),
                title: "A".into(),
                content: "body".into(),
                thumbnail: None,
                date: "2024-04-30".into(),
                last_edited: "2024-05-01T00:00:00.000Z".into(),
            }],
            last_updated: "2024-05-02T09:00:00.000Z".into(),
        };
        write_index(&path, &index).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["posts"][0]["slug"], "a");
        assert_eq!(parsed["lastUpdated"], "2024-05-02T09:00:00.000Z");
    }
}
