pub mod block;
pub mod chunk;

pub use block::{
    BlockType, DocumentIR, LineMeta, ListType, SkippedElement, SkippedKind, SourceFormat,
    SourceMeta, StructureBlock,
};
pub use chunk::{ChunkItem, ChunkType, Coverage, OverflowStrategy, SemanticChunk};
