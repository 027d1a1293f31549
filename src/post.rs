use std::sync::LazyLock;

use chrono::SecondsFormat;
use regex::Regex;
use serde::Serialize;

use crate::blocks::PageObject;
use crate::config::{SyncStrategy, TitleSource};

// Database property names, as created in the workspace.
pub const PROP_TITLE: &str = "Title";
pub const PROP_SLUG: &str = "Slug";
pub const PROP_DATE: &str = "Published Date";
pub const PROP_COVER: &str = "CoverImage";
pub const PROP_EXCERPT: &str = "Page Content";
pub const PROP_PUBLISHED: &str = "Published";

const UNTITLED: &str = "Untitled";

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Lower-case, collapse non-alphanumeric runs to single hyphens, strip
/// leading/trailing hyphens.
pub fn slugify(title: &str) -> String {
    NON_SLUG_RE
        .replace_all(&title.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

#[derive(Debug, Clone)]
pub struct PostMeta {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub date: String,
    pub excerpt: String,
    pub thumbnail: Option<String>,
    pub last_edited: String,
}

impl PostMeta {
    /// Combine page properties with the title found in the rendered body.
    /// `fallback_date` is the run timestamp, used when the date property
    /// is missing.
    pub fn from_page(
        page: &PageObject,
        body_title: Option<&str>,
        strategy: &SyncStrategy,
        fallback_date: &str,
    ) -> Self {
        let property_title = page.title_text(PROP_TITLE);
        let title = match strategy.title_source {
            TitleSource::FirstHeading => body_title
                .map(str::to_string)
                .filter(|t| !t.is_empty())
                .or(property_title),
            TitleSource::Property => property_title,
        }
        .unwrap_or_else(|| UNTITLED.to_string());

        let slug = page
            .rich_text(PROP_SLUG)
            .unwrap_or_else(|| slugify(&title));

        PostMeta {
            id: page.id.clone(),
            slug,
            title,
            date: page
                .date_start(PROP_DATE)
                .unwrap_or_else(|| fallback_date.to_string()),
            excerpt: page.rich_text(PROP_EXCERPT).unwrap_or_default(),
            thumbnail: page.file_url(PROP_COVER),
            last_edited: page
                .last_edited_time
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// A post ready to persist: front matter plus serialized body.
#[derive(Debug, Clone)]
pub struct PostDoc {
    pub meta: PostMeta,
    pub body: String,
}

impl PostDoc {
    /// The exact bytes written to `<slug>.md`. Change detection compares
    /// this string against the previous run's file.
    pub fn to_markdown(&self) -> String {
        let esc = |s: &str| s.replace('"', "\\\"");
        format!(
            "---\ntitle: \"{}\"\ndate: \"{}\"\nexcerpt: \"{}\"\nthumbnail: \"{}\"\nlastEdited: \"{}\"\n---\n\n{}",
            esc(&self.meta.title),
            esc(&self.meta.date),
            esc(&self.meta.excerpt),
            esc(self.meta.thumbnail.as_deref().unwrap_or("")),
            esc(&self.meta.last_edited),
            self.body,
        )
    }

    pub fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.meta.id.clone(),
            slug: self.meta.slug.clone(),
            title: self.meta.title.clone(),
            content: self.body.clone(),
            thumbnail: self.meta.thumbnail.clone(),
            date: self.meta.date.clone(),
            last_edited: self.meta.last_edited.clone(),
        }
    }
}

/// One record of the site-facing index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub date: String,
    pub last_edited: String,
}

/// The aggregate index, fully regenerated every run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIndex {
    pub posts: Vec<PostSummary>,
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::PageObject;
    use serde_json::json;

    fn page(properties: serde_json::Value) -> PageObject {
        serde_json::from_value(json!({
            "id": "page-1",
            "last_edited_time": "2024-05-02T08:30:00.000Z",
            "properties": properties,
        }))
        .unwrap()
    }

    fn text_prop(kind: &str, text: &str) -> serde_json::Value {
        json!({ "type": kind, kind: [{ "type": "text", "text": { "content": text }, "plain_text": text }] })
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
    }

    #[test]
    fn slugify_edge_cases() {
        assert_eq!(slugify("--Already--Hyphenated--"), "already-hyphenated");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("MiXeD CaSe"), "mixed-case");
    }

    #[test]
    fn explicit_slug_wins() {
        let page = page(json!({
            "Title": text_prop("title", "A Post"),
            "Slug": text_prop("rich_text", "custom-slug"),
        }));
        let meta = PostMeta::from_page(&page, None, &SyncStrategy::default(), "now");
        assert_eq!(meta.slug, "custom-slug");
    }

    #[test]
    fn title_prefers_first_heading_then_property_then_untitled() {
        let with_prop = page(json!({ "Title": text_prop("title", "Property Title") }));
        let strategy = SyncStrategy::default();

        let meta = PostMeta::from_page(&with_prop, Some("Heading Title"), &strategy, "now");
        assert_eq!(meta.title, "Heading Title");

        let meta = PostMeta::from_page(&with_prop, None, &strategy, "now");
        assert_eq!(meta.title, "Property Title");

        let bare = page(json!({}));
        let meta = PostMeta::from_page(&bare, None, &strategy, "now");
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.slug, "untitled");
    }

    #[test]
    fn property_title_source_ignores_headings() {
        let page = page(json!({ "Title": text_prop("title", "Property Title") }));
        let strategy = SyncStrategy {
            title_source: crate::config::TitleSource::Property,
            ..SyncStrategy::default()
        };
        let meta = PostMeta::from_page(&page, Some("Heading Title"), &strategy, "now");
        assert_eq!(meta.title, "Property Title");
    }

    #[test]
    fn date_falls_back_to_run_timestamp() {
        let dated = page(json!({
            "Published Date": { "type": "date", "date": { "start": "2024-04-30" } },
        }));
        let meta = PostMeta::from_page(&dated, None, &SyncStrategy::default(), "fallback");
        assert_eq!(meta.date, "2024-04-30");

        let undated = page(json!({}));
        let meta = PostMeta::from_page(&undated, None, &SyncStrategy::default(), "fallback");
        assert_eq!(meta.date, "fallback");
    }

    fn doc() -> PostDoc {
        PostDoc {
            meta: PostMeta {
                id: "page-1".into(),
                slug: "a-post".into(),
                title: "A \"quoted\" title".into(),
                date: "2024-04-30".into(),
                excerpt: "".into(),
                thumbnail: None,
                last_edited: "2024-05-02T08:30:00.000Z".into(),
            },
            body: "# Intro\n\nhi\n\n".into(),
        }
    }

    #[test]
    fn front_matter_escapes_quotes() {
        let markdown = doc().to_markdown();
        assert!(markdown.starts_with("---\ntitle: \"A \\\"quoted\\\" title\"\n"));
        assert!(markdown.contains("\nlastEdited: \"2024-05-02T08:30:00.000Z\"\n---\n\n# Intro\n"));
        assert!(markdown.contains("\nthumbnail: \"\"\n"));
    }

    #[test]
    fn index_field_names_are_camel_case() {
        let index = PostIndex {
            posts: vec![doc().summary()],
            last_updated: "2024-05-02T09:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&index).unwrap();
        assert!(json["lastUpdated"].is_string());
        assert_eq!(json["posts"][0]["lastEdited"], "2024-05-02T08:30:00.000Z");
        assert_eq!(json["posts"][0]["content"], "# Intro\n\nhi\n\n");
        // Absent thumbnails are omitted, matching the site's optional field.
        assert!(json["posts"][0].get("thumbnail").is_none());
    }
}
