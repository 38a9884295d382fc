use std::collections::{HashMap, HashSet};

use crate::models::{BlockType, ChunkType, Coverage, DocumentIR, SemanticChunk};

/// Result of validating a chunk list against its IR. Hard errors mean the
/// chunk list cannot be trusted; warnings record repairs that were applied.
#[derive(Debug)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub chunks: Vec<SemanticChunk>,
}

/// Validates and repairs chunk lists, typically ones produced by an
/// external semantic chunker. Rule-based chunker output passes through
/// unchanged by construction.
#[derive(Default)]
pub struct SemanticChunkValidator;

impl SemanticChunkValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, chunks: Vec<SemanticChunk>, ir: &DocumentIR) -> ValidationReport {
        let mut errors: Vec<String> = Vec::new();
        let mut warnings: Vec<String> = Vec::new();

        // Steps 1 and 2: recover missing block references, drop dangling
        // ones, and discard chunks that cannot be tied to the IR at all.
        let mut kept: Vec<SemanticChunk> = Vec::new();
        for (i, mut chunk) in chunks.into_iter().enumerate() {
            if chunk.source_blocks.is_empty() {
                chunk.source_blocks = infer_source_blocks(&chunk.content, ir);
                if chunk.source_blocks.is_empty() {
                    errors.push(format!(
                        "chunk {i} has no source blocks and none could be inferred; dropped"
                    ));
                    continue;
                }
                warnings.push(format!("chunk {i} source blocks inferred by content match"));
            }

            let before = chunk.source_blocks.len();
            chunk.source_blocks.retain(|&idx| idx < ir.blocks.len());
            if chunk.source_blocks.len() < before {
                warnings.push(format!("chunk {i} referenced out-of-range blocks; discarded"));
            }
            if chunk.source_blocks.is_empty() {
                warnings.push(format!("chunk {i} had only invalid block references; dropped"));
                continue;
            }
            kept.push(chunk);
        }

        // Step 3: exclusivity. A block claimed by an exclusive chunk may not
        // appear in any other chunk; reuse between shared chunks is legal
        // but noted.
        let mut usage: HashMap<usize, Vec<(usize, Coverage)>> = HashMap::new();
        for (ci, chunk) in kept.iter().enumerate() {
            for &idx in &chunk.source_blocks {
                usage.entry(idx).or_default().push((ci, chunk.coverage));
            }
        }
        let mut claimed: Vec<(&usize, &Vec<(usize, Coverage)>)> = usage.iter().collect();
        claimed.sort_by_key(|(idx, _)| **idx);
        for (idx, users) in claimed {
            if users.len() <= 1 {
                continue;
            }
            if users.iter().any(|(_, c)| *c == Coverage::Exclusive) {
                errors.push(format!(
                    "block {idx} is claimed by {} chunks but at least one claim is exclusive",
                    users.len()
                ));
            } else {
                warnings.push(format!("block {idx} is shared by {} chunks", users.len()));
            }
        }

        for (ci, chunk) in kept.iter_mut().enumerate() {
            let block_types: Vec<BlockType> = chunk
                .source_blocks
                .iter()
                .map(|&idx| ir.blocks[idx].block_type)
                .collect();

            // Step 4: chunk type must be consistent with its source blocks.
            let policy = chunk.chunk_type.policy();
            if block_types
                .iter()
                .any(|t| !policy.valid_source_types.contains(t))
            {
                let inferred = ChunkType::infer_from_block(dominant_block_type(&block_types));
                if inferred != chunk.chunk_type {
                    warnings.push(format!(
                        "chunk {ci} type {} inconsistent with source blocks; re-inferred as {}",
                        chunk.chunk_type.as_str(),
                        inferred.as_str()
                    ));
                    chunk.chunk_type = inferred;
                }
            }

            // Step 5: strict title paths must match the heading chain the
            // recognizer recorded exactly; relaxed ones must at least be a
            // prefix of it. Both are reset on mismatch.
            let expected = expected_title_path(chunk, ir);
            if chunk.title_strict {
                if chunk.title_path != expected {
                    errors.push(format!(
                        "chunk {ci} strict title path does not match heading hierarchy; reset"
                    ));
                    chunk.title_path = expected;
                }
            } else if !expected.starts_with(&chunk.title_path) {
                warnings.push(format!(
                    "chunk {ci} title path is not a prefix of the heading hierarchy; reset"
                ));
                chunk.title_path = expected;
            }

            // Step 6: chunk content must be the source text. Any paraphrase
            // is replaced with a reconstruction from the IR.
            let reconstructed = reconstruct(chunk, ir);
            if normalize(&chunk.content) != normalize(&reconstructed) {
                warnings.push(format!(
                    "chunk {ci} content diverged from source blocks; reconstructed"
                ));
                chunk.content = reconstructed;
            }
        }

        // Step 7: every non-heading block must end up in some chunk.
        let covered: HashSet<usize> = kept
            .iter()
            .flat_map(|c| c.source_blocks.iter().copied())
            .collect();
        for idx in ir.content_block_indices() {
            if covered.contains(&idx) {
                continue;
            }
            let block = &ir.blocks[idx];
            warnings.push(format!("block {idx} uncovered; fallback chunk synthesized"));
            kept.push(
                SemanticChunk::new(
                    ChunkType::infer_from_block(block.block_type),
                    block.parent_headings.clone(),
                    block.content.clone(),
                    vec![idx],
                )
                .with_note("fallback for uncovered block"),
            );
        }

        let is_valid = errors.is_empty();
        if !is_valid {
            tracing::warn!(errors = errors.len(), "chunk validation failed");
        } else if !warnings.is_empty() {
            tracing::debug!(warnings = warnings.len(), "chunk validation repaired issues");
        }
        ValidationReport {
            is_valid,
            errors,
            warnings,
            chunks: kept,
        }
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Recover block references for a chunk by matching its normalized content
/// against each block's normalized text.
fn infer_source_blocks(content: &str, ir: &DocumentIR) -> Vec<usize> {
    let needle = normalize(content);
    if needle.is_empty() {
        return Vec::new();
    }
    ir.blocks
        .iter()
        .enumerate()
        .filter(|(_, b)| {
            let hay = normalize(&b.content);
            !hay.is_empty() && (needle.contains(&hay) || hay.contains(&needle))
        })
        .map(|(i, _)| i)
        .collect()
}

fn dominant_block_type(types: &[BlockType]) -> BlockType {
    let mut counts: HashMap<BlockType, usize> = HashMap::new();
    for t in types {
        if *t != BlockType::Heading {
            *counts.entry(*t).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .map(|(t, _)| t)
        .unwrap_or(BlockType::Paragraph)
}

fn expected_title_path(chunk: &SemanticChunk, ir: &DocumentIR) -> Vec<String> {
    let first = match chunk.source_blocks.first() {
        Some(&idx) => &ir.blocks[idx],
        None => return Vec::new(),
    };
    let mut path = first.parent_headings.clone();
    if first.is_heading() {
        path.push(first.content.clone());
    }
    path
}

fn reconstruct(chunk: &SemanticChunk, ir: &DocumentIR) -> String {
    chunk
        .source_blocks
        .iter()
        .map(|&idx| ir.blocks[idx].content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
