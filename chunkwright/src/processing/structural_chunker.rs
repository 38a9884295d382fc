use crate::models::{BlockType, ChunkType, DocumentIR, SemanticChunk, StructureBlock};

/// Generic block grouping: accumulates blocks under the current heading,
/// flushing on heading changes. Self-contained block types (code, table,
/// Q&A, list) are emitted as standalone chunks so they never share a chunk
/// with unrelated content on either side.
#[derive(Default)]
pub struct StructuralChunker;

impl StructuralChunker {
    pub fn new() -> Self {
        Self
    }

    pub fn chunk(&self, ir: &DocumentIR) -> Vec<SemanticChunk> {
        let mut chunks: Vec<SemanticChunk> = Vec::new();
        let mut title_path: Vec<String> = Vec::new();
        let mut pending: Vec<usize> = Vec::new();

        for (idx, block) in ir.blocks.iter().enumerate() {
            if block.is_heading() {
                flush(&mut chunks, &mut pending, &title_path, ir);
                title_path = block.parent_headings.clone();
                title_path.push(block.content.clone());
                pending.push(idx);
                continue;
            }

            if is_self_contained(block.block_type) {
                flush(&mut chunks, &mut pending, &title_path, ir);
                chunks.push(build_chunk(vec![idx], &title_path, ir));
                continue;
            }

            pending.push(idx);
        }
        flush(&mut chunks, &mut pending, &title_path, ir);

        tracing::debug!(chunks = chunks.len(), "structural chunking complete");
        chunks
    }
}

fn is_self_contained(block_type: BlockType) -> bool {
    matches!(
        block_type,
        BlockType::Table | BlockType::Code | BlockType::Qa | BlockType::List
    )
}

fn flush(
    chunks: &mut Vec<SemanticChunk>,
    pending: &mut Vec<usize>,
    title_path: &[String],
    ir: &DocumentIR,
) {
    if pending.is_empty() {
        return;
    }
    let indices = std::mem::take(pending);
    chunks.push(build_chunk(indices, title_path, ir));
}

fn build_chunk(indices: Vec<usize>, title_path: &[String], ir: &DocumentIR) -> SemanticChunk {
    let blocks: Vec<&StructureBlock> = indices.iter().map(|&i| &ir.blocks[i]).collect();
    let content = blocks
        .iter()
        .map(|b| b.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let chunk_type = dominant_type(&blocks);
    SemanticChunk::new(chunk_type, title_path.to_vec(), content, indices)
}

/// Priority order for a mixed group: code > table > qa > list > flow. A
/// group mixing a heading with other content reads as a paragraph; pure
/// groups take their majority type.
fn dominant_type(blocks: &[&StructureBlock]) -> ChunkType {
    let has = |t: BlockType| blocks.iter().any(|b| b.block_type == t);

    if has(BlockType::Code) {
        return ChunkType::Code;
    }
    if has(BlockType::Table) {
        return ChunkType::Table;
    }
    if has(BlockType::Qa) {
        return ChunkType::Definition;
    }
    if has(BlockType::List) {
        return ChunkType::List;
    }
    if has(BlockType::Flow) && blocks.iter().all(|b| b.block_type == BlockType::Flow) {
        return ChunkType::Paragraph;
    }
    if has(BlockType::Heading) {
        return ChunkType::Paragraph;
    }

    // Majority vote among the remaining prose-like types.
    let mut counts: std::collections::HashMap<BlockType, usize> = std::collections::HashMap::new();
    for block in blocks {
        *counts.entry(block.block_type).or_default() += 1;
    }
    let majority = counts
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .map(|(t, _)| t)
        .unwrap_or(BlockType::Paragraph);
    match majority {
        BlockType::Definition => ChunkType::Definition,
        _ => ChunkType::Paragraph,
    }
}
