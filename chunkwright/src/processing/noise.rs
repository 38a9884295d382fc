use std::collections::HashMap;

use crate::config::NoiseConfig;
use crate::models::{BlockType, DocumentIR, StructureBlock};
use crate::processing::patterns;

/// Removes non-content blocks from the IR: repeated headers/footers, table
/// of contents runs, page numbers, horizontal rules and short boilerplate.
/// Conservative: keeps content when uncertain, and abandons TOC detection
/// wholesale when it would flag too much of the document.
pub struct NoiseFilter {
    config: NoiseConfig,
}

impl NoiseFilter {
    pub fn new(config: NoiseConfig) -> Self {
        Self { config }
    }

    pub fn filter(&self, ir: DocumentIR) -> DocumentIR {
        let total = ir.blocks.len();
        if total == 0 {
            return ir;
        }

        let repeated = self.repeated_block_texts(&ir.blocks);
        let toc_flags = self.toc_region(&ir.blocks);

        let mut kept: Vec<StructureBlock> = Vec::with_capacity(total);
        let mut removed = 0usize;
        for (idx, block) in ir.blocks.into_iter().enumerate() {
            if toc_flags.contains(&idx) || self.is_noise(&block, &repeated) {
                removed += 1;
                continue;
            }
            kept.push(block);
        }

        if removed > 0 {
            tracing::debug!(removed, kept = kept.len(), "noise filter dropped blocks");
        }

        DocumentIR {
            blocks: kept,
            source: ir.source,
            skipped: ir.skipped,
        }
    }

    /// Normalized texts seen at least `repeat_threshold` times. Whitespace
    /// is collapsed and digits replaced so "Page 3 of 10" and "Page 7 of 10"
    /// count as the same footer. Headings are counted on exact text only:
    /// "Section 1" and "Section 2" are distinct, a page header repeated
    /// verbatim is not.
    fn repeated_block_texts(&self, blocks: &[StructureBlock]) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for block in blocks {
            if block.content.chars().count() > 100 {
                continue;
            }
            let key = if block.is_heading() {
                normalize_exact(&block.content)
            } else {
                normalize(&block.content)
            };
            *counts.entry(key).or_default() += 1;
        }
        counts.retain(|_, c| *c >= self.config.repeat_threshold);
        counts
    }

    /// Indices belonging to a table-of-contents region, or empty if none is
    /// found or the safety reset triggers.
    fn toc_region(&self, blocks: &[StructureBlock]) -> Vec<usize> {
        let mut flags: Vec<usize> = Vec::new();

        let toc_start = blocks
            .iter()
            .position(|b| patterns::TOC_HEADING.is_match(b.content.trim()));
        let start = match toc_start {
            Some(idx) => idx,
            None => return flags,
        };

        flags.push(start);
        let mut saw_entry = false;
        for (offset, block) in blocks[start + 1..].iter().enumerate() {
            let idx = start + 1 + offset;
            let lines: Vec<&str> = block
                .content
                .lines()
                .filter(|l| !l.trim().is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }
            let entry_lines = lines
                .iter()
                .filter(|l| patterns::TOC_ENTRY.is_match(l))
                .count();
            let is_entry_block = entry_lines * 2 >= lines.len();
            // Short continuation lines (wrapped titles) extend the region.
            let is_continuation =
                saw_entry && lines.len() == 1 && lines[0].chars().count() < 40;

            if is_entry_block {
                saw_entry = true;
                flags.push(idx);
            } else if is_continuation {
                flags.push(idx);
            } else {
                break;
            }
        }

        if !saw_entry {
            return Vec::new();
        }

        // Safety reset: discard the whole flag set rather than applying a
        // partial one.
        let ratio = flags.len() as f64 / blocks.len() as f64;
        if ratio > self.config.toc_max_ratio {
            tracing::warn!(
                flagged = flags.len(),
                total = blocks.len(),
                "TOC detection would remove too much content; discarding"
            );
            return Vec::new();
        }

        flags
    }

    fn is_noise(&self, block: &StructureBlock, repeated: &HashMap<String, usize>) -> bool {
        let content = block.content.trim();

        if content.is_empty() {
            return true;
        }
        if block.block_type != BlockType::Heading
            && content.chars().count() < self.config.min_content_len
        {
            return true;
        }
        if block.block_type != BlockType::Heading && patterns::PAGE_NUMBER_ONLY.is_match(content) {
            return true;
        }
        // Setext underlines were consumed by the recognizer; a surviving
        // rule line is decoration.
        if patterns::HORIZONTAL_RULE.is_match(content) {
            return true;
        }
        if block.block_type != BlockType::Heading
            && content.chars().count() < 200
            && patterns::BOILERPLATE.is_match(content)
        {
            return true;
        }
        if content.chars().count() <= 100 {
            let key = if block.is_heading() {
                normalize_exact(content)
            } else {
                normalize(content)
            };
            if repeated.contains_key(&key) {
                return true;
            }
        }
        false
    }
}

fn normalize_exact(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize(text: &str) -> String {
    normalize_exact(text)
        .chars()
        .map(|c| if c.is_ascii_digit() { '#' } else { c })
        .collect()
}
