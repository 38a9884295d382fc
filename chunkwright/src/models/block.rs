use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Source format of the incoming text. Binary containers are decoded
/// upstream; the tag tells the extractor which conversion artifacts to
/// expect (page markers, converter placeholders, markdown syntax).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Markdown,
    Pdf,
    Docx,
    Text,
    Unknown,
}

impl SourceFormat {
    /// Sniff the format from a filename extension, defaulting to plain text
    /// handling for anything unrecognized.
    pub fn from_filename(filename: &str) -> Self {
        let ext = filename
            .rsplit('.')
            .next()
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "md" | "markdown" | "mdx" => SourceFormat::Markdown,
            "pdf" => SourceFormat::Pdf,
            "docx" | "doc" => SourceFormat::Docx,
            "txt" | "text" | "log" => SourceFormat::Text,
            _ => SourceFormat::Unknown,
        }
    }
}

/// Structural category assigned to one block by the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Heading,
    Paragraph,
    Code,
    Table,
    Flow,
    List,
    Qa,
    Blockquote,
    Definition,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Bullet,
    Numbered,
}

/// Category of a removed non-text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkippedKind {
    Image,
    Audio,
    Video,
    EmbeddedObject,
    Drawing,
    Chart,
    Equation,
}

/// A non-text element stripped during extraction, kept for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedElement {
    pub kind: SkippedKind,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Per-line structural hints emitted by the extractors and consumed by the
/// recognizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LineMeta {
    pub heading_level: Option<u8>,
    pub in_code_block: bool,
    pub code_language: Option<String>,
    pub in_list: bool,
    pub list_type: Option<ListType>,
    pub indent: usize,
    pub page_number: Option<u32>,
}

/// One structural unit of the intermediate representation. Created once by
/// the recognizer and never mutated afterwards; the noise filter removes
/// blocks by exclusion, not by editing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureBlock {
    pub block_type: BlockType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
    pub line_start: usize,
    pub line_end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Ancestor heading texts at recognition time, shallowest first.
    pub parent_headings: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StructureBlock {
    pub fn new(
        block_type: BlockType,
        content: impl Into<String>,
        line_start: usize,
        line_end: usize,
    ) -> Self {
        debug_assert!(line_start <= line_end, "line_start must not exceed line_end");
        Self {
            block_type,
            content: content.into(),
            level: None,
            line_start,
            line_end,
            page_number: None,
            language: None,
            headers: None,
            rows: None,
            list_type: None,
            items: None,
            question: None,
            answer: None,
            parent_headings: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_parent_headings(mut self, parents: Vec<String>) -> Self {
        self.parent_headings = parents;
        self
    }

    pub fn is_heading(&self) -> bool {
        self.block_type == BlockType::Heading
    }
}

/// Source-level metadata carried alongside the block sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMeta {
    pub format: SourceFormat,
    pub byte_len: usize,
    pub line_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
}

/// The ordered block sequence produced by the recognizer, immutable after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentIR {
    pub blocks: Vec<StructureBlock>,
    pub source: SourceMeta,
    pub skipped: Vec<SkippedElement>,
}

impl DocumentIR {
    /// Indices of every non-heading block; the set the final chunk list must
    /// cover.
    pub fn content_block_indices(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_heading())
            .map(|(i, _)| i)
            .collect()
    }
}
