use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page of a paginated Notion listing (query results or block children).
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Paginated<T> {
    #[serde(default)]
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

// ── Blocks ──

/// One node of a page's content tree. `children` is populated by the
/// fetcher when `has_children` is set; the renderer treats a flagged but
/// unpopulated block as having no children.
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub has_children: bool,
    #[serde(flatten)]
    pub kind: BlockKind,
    #[serde(skip)]
    pub children: Vec<Block>,
}

/// Closed enumeration of block types, tagged by the API's `type` field.
/// Anything the API adds later lands in `Unsupported` instead of failing
/// deserialization.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph { paragraph: TextPayload },
    #[serde(rename = "heading_1")]
    Heading1 { heading_1: HeadingPayload },
    #[serde(rename = "heading_2")]
    Heading2 { heading_2: HeadingPayload },
    #[serde(rename = "heading_3")]
    Heading3 { heading_3: HeadingPayload },
    BulletedListItem { bulleted_list_item: TextPayload },
    NumberedListItem { numbered_list_item: TextPayload },
    ToDo { to_do: TodoPayload },
    Toggle { toggle: TextPayload },
    Code { code: CodePayload },
    Quote { quote: TextPayload },
    Callout { callout: CalloutPayload },
    Image { image: FilePayload },
    Video { video: FilePayload },
    File { file: FilePayload },
    Pdf { pdf: FilePayload },
    Embed { embed: LinkPayload },
    Bookmark { bookmark: LinkPayload },
    LinkPreview { link_preview: LinkPayload },
    Equation { equation: EquationPayload },
    Divider { divider: EmptyPayload },
    Breadcrumb { breadcrumb: EmptyPayload },
    TableOfContents { table_of_contents: EmptyPayload },
    ChildPage { child_page: ChildPayload },
    ChildDatabase { child_database: ChildPayload },
    ColumnList { column_list: EmptyPayload },
    Column { column: EmptyPayload },
    SyncedBlock { synced_block: SyncedPayload },
    Table { table: TablePayload },
    TableRow { table_row: TableRowPayload },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadingPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub is_toggleable: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TodoPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub checked: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalloutPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Icon {
    Emoji { emoji: String },
    #[serde(other)]
    Other,
}

impl Icon {
    pub fn emoji(&self) -> Option<&str> {
        match self {
            Icon::Emoji { emoji } => Some(emoji),
            Icon::Other => None,
        }
    }
}

/// Image/video/file/pdf payload: a caption plus an external or hosted URL.
#[derive(Debug, Clone, Deserialize)]
pub struct FilePayload {
    #[serde(default)]
    pub caption: Vec<RichText>,
    #[serde(flatten)]
    pub source: FileSource,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileSource {
    External { external: ExternalFile },
    File { file: HostedFile },
    #[serde(other)]
    Unknown,
}

impl FileSource {
    pub fn url(&self) -> Option<&str> {
        match self {
            FileSource::External { external } => Some(&external.url),
            FileSource::File { file } => Some(&file.url),
            FileSource::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostedFile {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkPayload {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub caption: Vec<RichText>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EquationPayload {
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmptyPayload {}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildPayload {
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncedPayload {
    #[serde(default)]
    pub synced_from: Option<SyncedFrom>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncedFrom {
    pub block_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TablePayload {
    #[serde(default)]
    pub table_width: u32,
    #[serde(default)]
    pub has_column_header: bool,
    #[serde(default)]
    pub has_row_header: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TableRowPayload {
    #[serde(default)]
    pub cells: Vec<Vec<RichText>>,
}

// ── Rich text ──

/// A contiguous run of inline text sharing one set of style flags.
#[derive(Debug, Clone, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
    #[serde(flatten)]
    pub variant: RichTextVariant,
}

/// Style flags are independent, not mutually exclusive.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Annotations {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub strikethrough: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub code: bool,
    #[serde(default)]
    pub color: String,
}

impl Annotations {
    /// The color tag, unless it is the API's no-op default.
    pub fn color_tag(&self) -> Option<&str> {
        match self.color.as_str() {
            "" | "default" => None,
            c => Some(c),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextVariant {
    Text { text: TextContent },
    Mention { mention: Mention },
    Equation { equation: EquationPayload },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextContent {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub link: Option<InlineLink>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InlineLink {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mention {
    Page { page: PageRef },
    User { user: UserRef },
    Date { date: DateValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Concatenated raw text of a run list, markup-free.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

// ── Query results ──

/// One row of the document-database query: the page's properties and
/// last-edited timestamp. Body blocks are fetched separately.
#[derive(Debug, Clone, Deserialize)]
pub struct PageObject {
    pub id: String,
    pub last_edited_time: DateTime<Utc>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Date { date: Option<DateValue> },
    Checkbox { checkbox: bool },
    Files { files: Vec<FileRef> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DateValue {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub source: FileSource,
}

impl PageObject {
    /// Plain text of a title property, None when absent or empty.
    pub fn title_text(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            PropertyValue::Title { title } => non_empty(plain_text(title)),
            _ => None,
        }
    }

    /// Plain text of a rich-text property, None when absent or empty.
    pub fn rich_text(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            PropertyValue::RichText { rich_text } => non_empty(plain_text(rich_text)),
            _ => None,
        }
    }

    /// Start of a date property, None when absent or empty.
    pub fn date_start(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            PropertyValue::Date { date } => {
                date.as_ref().and_then(|d| non_empty(d.start.clone()))
            }
            _ => None,
        }
    }

    /// URL of the first file in a files property.
    pub fn file_url(&self, name: &str) -> Option<String> {
        match self.properties.get(name)? {
            PropertyValue::Files { files } => files
                .first()
                .and_then(|f| f.source.url())
                .map(str::to_string),
            _ => None,
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
