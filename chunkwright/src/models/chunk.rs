use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::block::BlockType;

/// Vocabulary of chunk categories. API-prefixed variants are produced only
/// by the rule-based API chunker (or an external semantic chunker honoring
/// the same schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkType {
    Paragraph,
    Code,
    Table,
    Example,
    List,
    Definition,
    ApiDescription,
    ApiDefinition,
    ApiParams,
    ApiResponse,
    ApiExample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coverage {
    Exclusive,
    Shared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverflowStrategy {
    None,
    RowSplit,
    FunctionSplit,
    ItemSplit,
    Truncate,
}

/// Per-type defaults applied when a chunk is normalized, plus the source
/// block types the validator accepts for the chunk type. Fixed lookup
/// tables, not dispatch.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPolicy {
    pub atomic: bool,
    pub coverage: Coverage,
    pub title_strict: bool,
    pub overflow_strategy: OverflowStrategy,
    pub valid_source_types: &'static [BlockType],
}

impl ChunkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkType::Paragraph => "paragraph",
            ChunkType::Code => "code",
            ChunkType::Table => "table",
            ChunkType::Example => "example",
            ChunkType::List => "list",
            ChunkType::Definition => "definition",
            ChunkType::ApiDescription => "api_description",
            ChunkType::ApiDefinition => "api_definition",
            ChunkType::ApiParams => "api_params",
            ChunkType::ApiResponse => "api_response",
            ChunkType::ApiExample => "api_example",
        }
    }

    pub fn policy(&self) -> ChunkPolicy {
        use BlockType as B;
        match self {
            ChunkType::Paragraph => ChunkPolicy {
                atomic: false,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::None,
                valid_source_types: &[
                    B::Paragraph,
                    B::Heading,
                    B::Flow,
                    B::Blockquote,
                    B::Definition,
                    B::Unknown,
                ],
            },
            ChunkType::Code => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::FunctionSplit,
                valid_source_types: &[B::Code, B::Heading, B::Paragraph],
            },
            ChunkType::Table => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::RowSplit,
                valid_source_types: &[B::Table, B::Heading, B::Paragraph],
            },
            ChunkType::Example => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::FunctionSplit,
                valid_source_types: &[B::Code, B::Paragraph, B::Heading],
            },
            ChunkType::List => ChunkPolicy {
                atomic: false,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::ItemSplit,
                valid_source_types: &[B::List, B::Heading, B::Paragraph],
            },
            ChunkType::Definition => ChunkPolicy {
                atomic: false,
                coverage: Coverage::Exclusive,
                title_strict: false,
                overflow_strategy: OverflowStrategy::None,
                valid_source_types: &[B::Definition, B::Qa, B::Paragraph, B::Heading],
            },
            ChunkType::ApiDescription => ChunkPolicy {
                atomic: false,
                coverage: Coverage::Exclusive,
                title_strict: true,
                overflow_strategy: OverflowStrategy::None,
                valid_source_types: &[B::Paragraph, B::Heading, B::Flow, B::Blockquote],
            },
            ChunkType::ApiDefinition => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Exclusive,
                title_strict: true,
                overflow_strategy: OverflowStrategy::None,
                valid_source_types: &[B::Paragraph, B::Heading, B::Code, B::Definition],
            },
            ChunkType::ApiParams => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Shared,
                title_strict: true,
                overflow_strategy: OverflowStrategy::RowSplit,
                valid_source_types: &[B::Table, B::List, B::Paragraph],
            },
            ChunkType::ApiResponse => ChunkPolicy {
                atomic: false,
                coverage: Coverage::Exclusive,
                title_strict: true,
                overflow_strategy: OverflowStrategy::None,
                valid_source_types: &[B::Table, B::List, B::Paragraph, B::Code],
            },
            ChunkType::ApiExample => ChunkPolicy {
                atomic: true,
                coverage: Coverage::Shared,
                title_strict: true,
                overflow_strategy: OverflowStrategy::FunctionSplit,
                valid_source_types: &[B::Code, B::Paragraph],
            },
        }
    }

    /// The chunk type a lone block of the given type maps to; used for
    /// validator re-inference and fallback synthesis.
    pub fn infer_from_block(block_type: BlockType) -> ChunkType {
        match block_type {
            BlockType::Code => ChunkType::Code,
            BlockType::Table => ChunkType::Table,
            BlockType::List => ChunkType::List,
            BlockType::Qa | BlockType::Definition => ChunkType::Definition,
            _ => ChunkType::Paragraph,
        }
    }
}

/// A grouped unit of content produced by a chunker. Metadata defaults come
/// from the type's `ChunkPolicy`; chunkers override them where the emission
/// rules require.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticChunk {
    pub chunk_type: ChunkType,
    pub title_path: Vec<String>,
    pub content: String,
    /// Indices into the filtered IR block sequence. Never empty after
    /// validation.
    pub source_blocks: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub atomic: bool,
    pub coverage: Coverage,
    pub title_strict: bool,
    pub overflow_strategy: OverflowStrategy,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl SemanticChunk {
    /// Create a chunk with the type's default metadata applied.
    pub fn new(
        chunk_type: ChunkType,
        title_path: Vec<String>,
        content: impl Into<String>,
        source_blocks: Vec<usize>,
    ) -> Self {
        let policy = chunk_type.policy();
        Self {
            chunk_type,
            title_path,
            content: content.into(),
            source_blocks,
            notes: Vec::new(),
            atomic: policy.atomic,
            coverage: policy.coverage,
            title_strict: policy.title_strict,
            overflow_strategy: policy.overflow_strategy,
            metadata: HashMap::new(),
        }
    }

    pub fn with_coverage(mut self, coverage: Coverage) -> Self {
        self.coverage = coverage;
        self
    }

    pub fn with_atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    pub fn with_overflow_strategy(mut self, strategy: OverflowStrategy) -> Self {
        self.overflow_strategy = strategy;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

/// The terminal, storage-facing unit. Produced once by the splitter and
/// never re-entered into the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkItem {
    pub index: usize,
    pub content: String,
    pub token_count: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub forced_split: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<ChunkType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title_path: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_range: Option<(usize, usize)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<(u32, u32)>,
    pub merged: bool,
    pub split: bool,
    pub truncated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}
