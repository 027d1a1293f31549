//! Block-tree → Markdown serialization.
//!
//! Each block renders to a self-contained fragment (carrying its own
//! trailing blank line where the format wants one); fragments concatenate
//! with no extra separator. The first heading found in document order is
//! returned alongside the body, combined first-non-empty-wins up the
//! call chain rather than threaded through shared mutable state.

pub mod inline;
pub mod table;

use tracing::warn;

use crate::blocks::{plain_text, Block, BlockKind};
use crate::config::SyncStrategy;

use self::inline::render_runs;

const INDENT: &str = "  ";

pub struct Rendered {
    pub body: String,
    pub title: Option<String>,
}

pub fn render_forest(blocks: &[Block], strategy: &SyncStrategy) -> Rendered {
    let (body, title) = render_blocks(blocks, strategy);
    Rendered { body, title }
}

fn render_blocks(blocks: &[Block], strategy: &SyncStrategy) -> (String, Option<String>) {
    let mut out = String::new();
    let mut title: Option<String> = None;
    for block in blocks {
        let (fragment, found) = render_block(block, strategy);
        out.push_str(&fragment);
        title = title.or(found);
    }
    (out, title)
}

fn render_block(block: &Block, strategy: &SyncStrategy) -> (String, Option<String>) {
    use BlockKind::*;

    match &block.kind {
        Paragraph { paragraph } => {
            let (kids, title) = render_blocks(&block.children, strategy);
            let text = render_runs(&paragraph.rich_text);
            (format!("{text}\n\n{kids}"), title)
        }
        Heading1 { heading_1 } => heading(block, strategy, 1, &heading_1.rich_text, heading_1.is_toggleable),
        Heading2 { heading_2 } => heading(block, strategy, 2, &heading_2.rich_text, heading_2.is_toggleable),
        Heading3 { heading_3 } => heading(block, strategy, 3, &heading_3.rich_text, heading_3.is_toggleable),
        BulletedListItem { bulleted_list_item } => {
            list_item(block, strategy, "- ", &bulleted_list_item.rich_text)
        }
        // The literal "1." for every item: Markdown renumbers on display.
        NumberedListItem { numbered_list_item } => {
            list_item(block, strategy, "1. ", &numbered_list_item.rich_text)
        }
        ToDo { to_do } => {
            let marker = if to_do.checked { "- [x] " } else { "- [ ] " };
            list_item(block, strategy, marker, &to_do.rich_text)
        }
        Toggle { toggle } => {
            let (kids, title) = render_blocks(&block.children, strategy);
            (wrap_toggle(&render_runs(&toggle.rich_text), &kids), title)
        }
        Code { code } => {
            let lang = match code.language.as_str() {
                "plain text" => "",
                l => l,
            };
            let text = plain_text(&code.rich_text);
            (format!("```{lang}\n{text}\n```\n\n"), None)
        }
        Quote { quote } => {
            let (kids, title) = render_blocks(&block.children, strategy);
            let text = render_runs(&quote.rich_text);
            (format!("> {text}\n\n{kids}"), title)
        }
        Callout { callout } => {
            let (kids, title) = render_blocks(&block.children, strategy);
            let text = render_runs(&callout.rich_text);
            let icon = callout
                .icon
                .as_ref()
                .and_then(|i| i.emoji())
                .map(|e| format!("{e} "))
                .unwrap_or_default();
            (format!("> {icon}{text}\n\n{kids}"), title)
        }
        Image { image } => {
            let fragment = match image.source.url() {
                Some(url) => format!("![{}]({url})\n\n", plain_text(&image.caption)),
                None => String::new(),
            };
            (fragment, None)
        }
        Video { video } => (labeled_link("Video", &plain_text(&video.caption), video.source.url()), None),
        File { file } => (labeled_link("File", &plain_text(&file.caption), file.source.url()), None),
        Pdf { pdf } => (labeled_link("PDF", &plain_text(&pdf.caption), pdf.source.url()), None),
        Embed { embed } => (labeled_link("Embed", &plain_text(&embed.caption), url_opt(&embed.url)), None),
        Bookmark { bookmark } => (
            labeled_link("Bookmark", &plain_text(&bookmark.caption), url_opt(&bookmark.url)),
            None,
        ),
        LinkPreview { link_preview } => (
            labeled_link("Link", &plain_text(&link_preview.caption), url_opt(&link_preview.url)),
            None,
        ),
        Equation { equation } => {
            let fragment = if equation.expression.is_empty() {
                String::new()
            } else {
                format!("${}$\n\n", equation.expression)
            };
            (fragment, None)
        }
        Divider { .. } => ("---\n\n".to_string(), None),
        // Navigation chrome with no Markdown counterpart.
        Breadcrumb { .. } | TableOfContents { .. } => (String::new(), None),
        ChildPage { child_page } => child_title(block, strategy, &child_page.title),
        ChildDatabase { child_database } => child_title(block, strategy, &child_database.title),
        // Layout containers: no markup of their own, children pass through.
        ColumnList { .. } | Column { .. } | SyncedBlock { .. } => {
            render_blocks(&block.children, strategy)
        }
        Table { .. } => {
            let fragment = if strategy.render_tables {
                table::render(&block.children)
            } else {
                String::new()
            };
            (fragment, None)
        }
        // Rows are consumed by their table; one on its own renders nothing.
        TableRow { .. } => (String::new(), None),
        Unsupported => {
            warn!("skipping unsupported block {}", block.id);
            (String::new(), None)
        }
    }
}

fn heading(
    block: &Block,
    strategy: &SyncStrategy,
    level: usize,
    runs: &[crate::blocks::RichText],
    toggleable: bool,
) -> (String, Option<String>) {
    let text = render_runs(runs);
    let marker = "#".repeat(level);
    let title = Some(plain_text(runs).trim().to_string()).filter(|t| !t.is_empty());

    let (kids, child_title) = render_blocks(&block.children, strategy);
    let fragment = if toggleable {
        wrap_toggle(&format!("{marker} {text}"), &kids)
    } else {
        format!("{marker} {text}\n\n{kids}")
    };
    (fragment, title.or(child_title))
}

fn list_item(
    block: &Block,
    strategy: &SyncStrategy,
    marker: &str,
    runs: &[crate::blocks::RichText],
) -> (String, Option<String>) {
    let (kids, title) = render_blocks(&block.children, strategy);
    let line = format!("{marker}{}\n", render_runs(runs));
    (format!("{line}{}", indent(&kids)), title)
}

fn child_title(block: &Block, strategy: &SyncStrategy, title: &str) -> (String, Option<String>) {
    let (kids, child_title) = render_blocks(&block.children, strategy);
    let fragment = if title.is_empty() {
        kids
    } else {
        format!("**{title}**\n\n{kids}")
    };
    (fragment, child_title)
}

fn wrap_toggle(summary: &str, children: &str) -> String {
    format!("<details>\n<summary>{summary}</summary>\n\n{children}</details>\n\n")
}

fn labeled_link(label: &str, caption: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => {
            let text = if caption.is_empty() { url } else { caption };
            format!("[{label}: {text}]({url})\n\n")
        }
        None => String::new(),
    }
}

fn url_opt(url: &str) -> Option<&str> {
    if url.is_empty() {
        None
    } else {
        Some(url)
    }
}

/// Indent every non-empty line one level; blank lines stay blank.
fn indent(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                "\n".to_string()
            } else {
                format!("{INDENT}{l}\n")
            }
        })
        .collect()
}
