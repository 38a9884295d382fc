use crate::models::{ChunkType, Coverage, DocumentIR, OverflowStrategy, SemanticChunk};
use crate::processing::api_detector::{ApiDetection, ApiSection};

/// Endpoint-aware grouping. For each detected section emits, in order:
/// shared description, merged endpoint definitions, per-endpoint
/// descriptions, shared parameters, shared response, shared examples.
/// Sections without endpoints are skipped.
#[derive(Default)]
pub struct ApiRuleBasedChunker;

impl ApiRuleBasedChunker {
    pub fn new() -> Self {
        Self
    }

    pub fn chunk(&self, ir: &DocumentIR, detection: &ApiDetection) -> Vec<SemanticChunk> {
        let mut chunks: Vec<SemanticChunk> = Vec::new();
        for section in &detection.sections {
            if section.endpoints.is_empty() {
                continue;
            }
            self.emit_section(ir, section, &mut chunks);
        }
        tracing::debug!(chunks = chunks.len(), "api rule-based chunking complete");
        chunks
    }

    fn emit_section(&self, ir: &DocumentIR, section: &ApiSection, chunks: &mut Vec<SemanticChunk>) {
        let title = &section.title_path;

        if !section.description_indices.is_empty() {
            chunks.push(
                SemanticChunk::new(
                    ChunkType::ApiDescription,
                    title.clone(),
                    join_content(ir, &section.description_indices),
                    section.description_indices.clone(),
                )
                .with_coverage(Coverage::Shared)
                .with_note("section description"),
            );
        }

        // All endpoint definitions of the section merge into one atomic
        // chunk so callers always retrieve the full endpoint set together.
        let mut definition_blocks = section.endpoint_block_indices.clone();
        if let Some(h) = section.heading_index {
            definition_blocks.insert(0, h);
        }
        chunks.push(
            SemanticChunk::new(
                ChunkType::ApiDefinition,
                title.clone(),
                join_content(ir, &definition_blocks),
                definition_blocks,
            )
            .with_atomic(true)
            .with_coverage(Coverage::Exclusive)
            .with_overflow_strategy(OverflowStrategy::None),
        );

        for &idx in &section.endpoint_description_indices {
            chunks.push(
                SemanticChunk::new(
                    ChunkType::ApiDescription,
                    title.clone(),
                    ir.blocks[idx].content.clone(),
                    vec![idx],
                )
                .with_coverage(Coverage::Exclusive)
                .with_note("endpoint description"),
            );
        }

        if !section.params_indices.is_empty() {
            chunks.push(
                SemanticChunk::new(
                    ChunkType::ApiParams,
                    title.clone(),
                    join_content(ir, &section.params_indices),
                    section.params_indices.clone(),
                )
                .with_atomic(true)
                .with_overflow_strategy(OverflowStrategy::RowSplit),
            );
        }

        if !section.response_indices.is_empty() {
            chunks.push(
                SemanticChunk::new(
                    ChunkType::ApiResponse,
                    title.clone(),
                    join_content(ir, &section.response_indices),
                    section.response_indices.clone(),
                )
                .with_coverage(Coverage::Exclusive)
                .with_overflow_strategy(OverflowStrategy::None),
            );
        }

        if !section.example_indices.is_empty() {
            chunks.push(
                SemanticChunk::new(
                    ChunkType::ApiExample,
                    title.clone(),
                    join_content(ir, &section.example_indices),
                    section.example_indices.clone(),
                )
                .with_atomic(true)
                .with_overflow_strategy(OverflowStrategy::FunctionSplit),
            );
        }
    }
}

fn join_content(ir: &DocumentIR, indices: &[usize]) -> String {
    indices
        .iter()
        .map(|&i| ir.blocks[i].content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
