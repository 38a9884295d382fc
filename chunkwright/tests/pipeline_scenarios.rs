//! End-to-end runs of the pipeline over representative documents.

use chunkwright::processing::extractors::{Extractor, ExtractorRegistry};
use chunkwright::processing::{
    ApiRuleBasedChunker, ApiStructureDetector, SemanticChunkValidator, StructuralChunker,
    StructureRecognizer, TokenCounter, TokenSplitter,
};
use chunkwright::{
    ApiKeywords, BlockType, ChunkType, ChunkingConfig, ChunkingPipeline, Config, Coverage,
    DocumentIR, OverflowStrategy, SemanticChunk, SourceFormat,
};
use pretty_assertions::assert_eq;

mod common;

fn recognize(text: &str, filename: &str) -> DocumentIR {
    let registry = ExtractorRegistry::new();
    let format = SourceFormat::from_filename(filename);
    let extracted = registry.extractor_for(format).extract(text, filename);
    StructureRecognizer::recognize(&extracted, format)
}

#[test]
fn structural_chunker_groups_heading_with_paragraph_and_isolates_table() {
    let ir = recognize(
        "# Title\n\nShort para.\n\n## Sub\n\n| a | b |\n|---|---|\n| 1 | 2 |\n",
        "doc.md",
    );
    let types: Vec<BlockType> = ir.blocks.iter().map(|b| b.block_type).collect();
    assert_eq!(
        types,
        vec![
            BlockType::Heading,
            BlockType::Paragraph,
            BlockType::Heading,
            BlockType::Table,
        ]
    );

    let chunks = StructuralChunker::new().chunk(&ir);
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].source_blocks, vec![0, 1]);
    assert_eq!(chunks[2].chunk_type, ChunkType::Table);
    assert_eq!(chunks[2].source_blocks.len(), 1);
}

#[test]
fn api_chunker_merges_endpoints_and_shares_params() {
    let ir = recognize(
        "GET /users\nPOST /users\n\nParameters:\n| name | type |\n|---|---|\n| id | int |\n",
        "api.md",
    );
    let detection = ApiStructureDetector::new(ApiKeywords::default()).detect(&ir);
    assert!(detection.is_api_document());
    assert_eq!(detection.sections.len(), 1);
    assert_eq!(detection.sections[0].endpoints.len(), 2);
    assert!(detection.sections[0].is_multi_endpoint());

    let chunks = ApiRuleBasedChunker::new().chunk(&ir, &detection);
    let definitions: Vec<&SemanticChunk> = chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::ApiDefinition)
        .collect();
    assert_eq!(definitions.len(), 1);
    assert!(definitions[0].atomic);
    assert!(definitions[0].content.contains("GET /users"));
    assert!(definitions[0].content.contains("POST /users"));

    let params: Vec<&SemanticChunk> = chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::ApiParams)
        .collect();
    assert_eq!(params.len(), 1);
    assert_eq!(params[0].overflow_strategy, OverflowStrategy::RowSplit);
}

#[test]
fn oversized_table_splits_into_bounded_fragments_with_header() {
    let config = ChunkingConfig {
        min_tokens: 16,
        max_tokens: 120,
        overlap_tokens: 20,
        embedding_hard_limit: 8000,
    };
    // Enough rows to land around 1.5x the budget.
    let mut table = String::from("| field | description |\n|---|---|\n");
    for i in 0..24 {
        table.push_str(&format!("| field_{i} | meaning of field number {i} |\n"));
    }
    let ir = recognize(&table, "table.md");
    let chunks = StructuralChunker::new().chunk(&ir);
    let splitter = TokenSplitter::new(config.clone(), TokenCounter::new());
    let items = splitter.split(chunks, &ir);

    assert!(items.len() >= 2, "expected a row split, got {}", items.len());
    for item in &items {
        assert!(item.content.starts_with("| field | description |"));
        assert!(item.content.contains("|---|---|"));
        assert!(
            item.token_count <= config.max_tokens,
            "fragment of {} tokens over budget",
            item.token_count
        );
    }
}

#[test]
fn atomic_chunk_over_hard_limit_is_never_emitted_whole() {
    let config = ChunkingConfig {
        min_tokens: 16,
        max_tokens: 100,
        overlap_tokens: 20,
        embedding_hard_limit: 400,
    };
    let text = (0..120)
        .map(|i| format!("Line {i} of one enormous endpoint definition."))
        .collect::<Vec<_>>()
        .join("\n");
    let chunk = SemanticChunk::new(ChunkType::ApiDefinition, vec![], text, vec![0]);
    assert_eq!(chunk.overflow_strategy, OverflowStrategy::None);
    assert!(chunk.atomic);

    let ir = recognize("placeholder\n", "doc.txt");
    let splitter = TokenSplitter::new(config.clone(), TokenCounter::new());
    let items = splitter.split(vec![chunk], &ir);
    assert!(items.len() > 1);
    for item in &items {
        assert!(item.forced_split);
        assert!(item.token_count <= config.max_tokens);
    }
}

#[test]
fn validator_rejects_duplicate_exclusive_claims() {
    let ir = recognize("# H\n\nOne paragraph of content here.\n\nAnother paragraph.\n", "doc.md");
    let claim = |idx: usize| {
        SemanticChunk::new(
            ChunkType::Paragraph,
            vec!["H".to_string()],
            ir.blocks[idx].content.clone(),
            vec![idx],
        )
        .with_coverage(Coverage::Exclusive)
    };
    let report = SemanticChunkValidator::new().validate(vec![claim(1), claim(1), claim(2)], &ir);
    assert!(!report.is_valid);
    assert!(report.errors.iter().any(|e| e.contains("block 1")));
}

#[test]
fn full_pipeline_handles_pdf_conversion_artifacts() -> anyhow::Result<()> {
    common::init_test_logger();
    let text = "--- Page 1 ---\nINTRODUCTION\nThis report covers the quarterly numbers in detail.\n--- Page 2 ---\nThe numbers improved across every region we track.\n";
    let out = ChunkingPipeline::new(Config::default()).process(text, "report.pdf")?;
    assert!(!out.chunks.is_empty());
    assert_eq!(out.stats.source_format, SourceFormat::Pdf);
    assert!(out
        .chunks
        .iter()
        .all(|i| !i.content.contains("--- Page")));
    Ok(())
}

#[test]
fn full_pipeline_output_is_ordered_and_bounded() {
    common::init_test_logger();
    let mut text = String::from("# Manual\n\n");
    let topics = [
        "installation on the supported platforms",
        "first-run configuration and defaults",
        "day-to-day operation of the service",
        "monitoring and the exported counters",
        "backup procedures and retention",
        "upgrade paths between releases",
        "troubleshooting common failures",
        "reference material and further reading",
    ];
    for (i, topic) in topics.iter().enumerate() {
        text.push_str(&format!(
            "## Section {i}\n\nThis section covers {topic}, in enough words to read as ordinary prose.\n\n"
        ));
    }
    let out = ChunkingPipeline::new(Config::default())
        .process(&text, "manual.md")
        .expect("pipeline run");
    for (i, item) in out.chunks.iter().enumerate() {
        assert_eq!(item.index, i);
        assert!(item.token_count <= 8000);
        assert!(item.start_char <= item.end_char);
    }
    let mut last_end = 0;
    for item in &out.chunks {
        assert!(item.start_char >= last_end || item.start_char == 0);
        last_end = item.end_char;
    }
}
