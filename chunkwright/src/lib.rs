//! Structure-aware document chunking for retrieval pipelines.
//!
//! Heterogeneous source text (markdown, converted PDF/DOCX output, plain
//! text) goes in; bounded, semantically coherent chunk items come out. The
//! pipeline recognizes document structure into an intermediate block
//! representation, filters conversion noise, detects API-reference
//! sections, picks a chunking strategy, validates the result and enforces
//! token budgets.
//!
//! ```no_run
//! use chunkwright::{ChunkingPipeline, Config};
//!
//! # fn main() -> chunkwright::Result<()> {
//! let pipeline = ChunkingPipeline::new(Config::from_env());
//! let output = pipeline.process("# Title\n\nSome text.", "doc.md")?;
//! for item in &output.chunks {
//!     println!("{} tokens: {}", item.token_count, item.content);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod processing;

pub use config::{ApiKeywords, ChunkingConfig, Config, GateConfig, NoiseConfig};
pub use error::{ChunkwrightError, Result};
pub use models::{
    BlockType, ChunkItem, ChunkType, Coverage, DocumentIR, OverflowStrategy, SemanticChunk,
    SkippedElement, SourceFormat, StructureBlock,
};
pub use processing::{
    ChunkingPipeline, GateDecision, PipelineOutput, PipelineStats, SemanticChunkingService,
};
