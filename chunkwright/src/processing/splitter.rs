use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;
use crate::models::{ChunkItem, DocumentIR, OverflowStrategy, SemanticChunk};
use crate::processing::patterns;
use crate::processing::tokenizer::TokenCounter;

/// Enforces token budgets on semantic chunks: merges adjacent undersized
/// chunks of the same kind, splits oversized ones according to their
/// overflow strategy, and emits the final `ChunkItem` list.
pub struct TokenSplitter {
    config: ChunkingConfig,
    counter: TokenCounter,
}

/// Appended to truncated content so readers can tell it was cut.
const TRUNCATION_MARKER: &str = "… [truncated]";

/// One piece of a chunk after budget enforcement, before numbering.
struct Piece {
    content: String,
    split: bool,
    truncated: bool,
    forced: bool,
    note: Option<String>,
}

impl Piece {
    fn plain(content: String) -> Self {
        Self {
            content,
            split: false,
            truncated: false,
            forced: false,
            note: None,
        }
    }

    fn split_part(content: String) -> Self {
        Self {
            split: true,
            ..Self::plain(content)
        }
    }
}

impl TokenSplitter {
    pub fn new(config: ChunkingConfig, counter: TokenCounter) -> Self {
        Self { config, counter }
    }

    pub fn split(&self, chunks: Vec<SemanticChunk>, ir: &DocumentIR) -> Vec<ChunkItem> {
        let merged = self.merge_undersized(chunks);
        let mut items: Vec<ChunkItem> = Vec::new();
        let mut offset = 0usize;

        for (chunk, was_merged) in merged {
            let pieces = self.enforce_budget(&chunk);
            let (line_range, page_range) = provenance(&chunk, ir);
            for piece in pieces {
                let token_count = self.counter.count(&piece.content);
                let char_len = piece.content.chars().count();
                let mut notes = chunk.notes.clone();
                if let Some(note) = piece.note {
                    notes.push(note);
                }
                items.push(ChunkItem {
                    index: items.len(),
                    content: piece.content,
                    token_count,
                    start_char: offset,
                    end_char: offset + char_len,
                    forced_split: piece.forced,
                    chunk_type: Some(chunk.chunk_type),
                    title_path: chunk.title_path.clone(),
                    line_range,
                    page_range,
                    merged: was_merged,
                    split: piece.split,
                    truncated: piece.truncated,
                    notes,
                    metadata: chunk.metadata.clone(),
                });
                offset += char_len;
            }
        }

        tracing::info!(
            items = items.len(),
            merged = items.iter().filter(|i| i.merged).count(),
            split = items.iter().filter(|i| i.split).count(),
            "token budgets enforced"
        );
        items
    }

    /// Forward merge pass: a run of adjacent chunks sharing a type and
    /// title path is coalesced while the run stays under `min_tokens` and
    /// the merge would not itself exceed `max_tokens`. Atomic chunks never
    /// participate.
    fn merge_undersized(&self, chunks: Vec<SemanticChunk>) -> Vec<(SemanticChunk, bool)> {
        let mut out: Vec<(SemanticChunk, bool)> = Vec::new();
        for chunk in chunks {
            if let Some((prev, merged_flag)) = out.last_mut() {
                let prev_tokens = self.counter.count(&prev.content);
                let combined = prev_tokens + self.counter.count(&chunk.content);
                let mergeable = !prev.atomic
                    && !chunk.atomic
                    && prev.chunk_type == chunk.chunk_type
                    && prev.coverage == chunk.coverage
                    && prev.title_path == chunk.title_path
                    && prev_tokens < self.config.min_tokens
                    && combined <= self.config.max_tokens;
                if mergeable {
                    prev.content.push_str("\n\n");
                    prev.content.push_str(&chunk.content);
                    prev.source_blocks.extend(chunk.source_blocks);
                    prev.notes.extend(chunk.notes);
                    *merged_flag = true;
                    continue;
                }
            }
            out.push((chunk, false));
        }
        out
    }

    fn enforce_budget(&self, chunk: &SemanticChunk) -> Vec<Piece> {
        let tokens = self.counter.count(&chunk.content);
        if tokens <= self.config.max_tokens {
            return vec![Piece::plain(chunk.content.clone())];
        }

        if !chunk.atomic {
            return self.split_prose(&chunk.content);
        }

        match chunk.overflow_strategy {
            OverflowStrategy::RowSplit => self.split_rows(&chunk.content),
            OverflowStrategy::FunctionSplit => self.split_functions(&chunk.content),
            OverflowStrategy::ItemSplit => self.split_items(&chunk.content),
            OverflowStrategy::Truncate => vec![self.truncate(&chunk.content)],
            OverflowStrategy::None => {
                if tokens > self.config.embedding_hard_limit {
                    tracing::warn!(
                        tokens,
                        limit = self.config.embedding_hard_limit,
                        chunk_type = chunk.chunk_type.as_str(),
                        "atomic chunk exceeds embedding limit, forcing split"
                    );
                    self.force_split(&chunk.content)
                } else {
                    tracing::warn!(
                        tokens,
                        max = self.config.max_tokens,
                        chunk_type = chunk.chunk_type.as_str(),
                        "atomic chunk over budget, kept intact"
                    );
                    vec![Piece::plain(chunk.content.clone())]
                }
            }
        }
    }

    /// Oversized prose splits at paragraph boundaries first. A paragraph
    /// that is itself over budget degrades to sentence packing, and a
    /// sentence that alone exceeds the budget to line packing.
    fn split_prose(&self, text: &str) -> Vec<Piece> {
        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if paragraphs.len() <= 1 {
            return self.split_sentences(text);
        }

        let mut pieces: Vec<Piece> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for para in paragraphs {
            if self.counter.count(para) > self.config.max_tokens {
                if !current.is_empty() {
                    pieces.push(Piece::split_part(current.join("\n\n")));
                    current.clear();
                }
                pieces.extend(self.split_sentences(para));
                continue;
            }
            if !current.is_empty() {
                let candidate = format!("{}\n\n{para}", current.join("\n\n"));
                if self.counter.count(&candidate) > self.config.max_tokens {
                    pieces.push(Piece::split_part(current.join("\n\n")));
                    current.clear();
                }
            }
            current.push(para);
        }
        if !current.is_empty() {
            pieces.push(Piece::split_part(current.join("\n\n")));
        }
        pieces
    }

    /// Sentence-level packing with a trailing-sentence overlap carried into
    /// the next piece. The carried overlap is shrunk from the front whenever
    /// it would push the piece past `max_tokens`.
    fn split_sentences(&self, text: &str) -> Vec<Piece> {
        let sentences = split_into_sentences(text);
        let mut pieces: Vec<Piece> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for sentence in sentences {
            if self.counter.count(&sentence) > self.config.max_tokens {
                if !current.is_empty() {
                    pieces.push(Piece::split_part(current.join(" ")));
                    current.clear();
                }
                pieces.extend(self.pack_lines(&sentence, false, self.config.max_tokens));
                continue;
            }
            if !current.is_empty() {
                let overflows = |group: &[String]| {
                    self.counter
                        .count(&format!("{} {sentence}", group.join(" ")))
                        > self.config.max_tokens
                };
                if overflows(&current) {
                    pieces.push(Piece::split_part(current.join(" ")));
                    current = self.overlap_tail(&current);
                    while !current.is_empty() && overflows(&current) {
                        current.remove(0);
                    }
                }
            }
            current.push(sentence);
        }
        if !current.is_empty() {
            pieces.push(Piece::split_part(current.join(" ")));
        }
        pieces
    }

    /// Trailing sentences of a finished piece, up to `overlap_tokens`,
    /// repeated at the head of the next piece for retrieval continuity.
    fn overlap_tail(&self, sentences: &[String]) -> Vec<String> {
        let mut tail: Vec<String> = Vec::new();
        let mut tokens = 0usize;
        for sentence in sentences.iter().rev() {
            let t = self.counter.count(sentence);
            if tokens + t > self.config.overlap_tokens && !tail.is_empty() {
                break;
            }
            tokens += t;
            tail.push(sentence.clone());
        }
        tail.reverse();
        tail
    }

    /// Table split: the header row and separator are repeated at the top of
    /// every piece and counted against the piece budget. A single row that
    /// does not fit even alone is cut at word boundaries, each cut still
    /// carrying the header.
    fn split_rows(&self, text: &str) -> Vec<Piece> {
        let lines: Vec<&str> = text.lines().collect();
        let header_end = lines
            .iter()
            .position(|l| patterns::TABLE_SEPARATOR.is_match(l))
            .map(|i| i + 1)
            .unwrap_or(0);
        let header_text = lines[..header_end].join("\n");
        let assemble = |rows: &[&str]| -> String {
            if header_text.is_empty() {
                rows.join("\n")
            } else {
                format!("{header_text}\n{}", rows.join("\n"))
            }
        };
        let row_budget = self
            .config
            .max_tokens
            .saturating_sub(self.counter.count(&assemble(&[])) + 2)
            .max(1);

        let mut pieces: Vec<Piece> = Vec::new();
        let mut rows: Vec<&str> = Vec::new();
        for &line in &lines[header_end..] {
            if self.counter.count(&assemble(&[line])) > self.config.max_tokens {
                if !rows.is_empty() {
                    pieces.push(Piece::split_part(assemble(&rows)));
                    rows.clear();
                }
                for segment in self.pack_words(line, row_budget) {
                    pieces.push(Piece::split_part(assemble(&[segment.as_str()])));
                }
                continue;
            }
            if !rows.is_empty() {
                let mut candidate = rows.clone();
                candidate.push(line);
                if self.counter.count(&assemble(&candidate)) > self.config.max_tokens {
                    pieces.push(Piece::split_part(assemble(&rows)));
                    rows.clear();
                }
            }
            rows.push(line);
        }
        if !rows.is_empty() {
            pieces.push(Piece::split_part(assemble(&rows)));
        }
        pieces
    }

    /// Code split at function/class boundaries, keeping any fence lines on
    /// every piece; fence tokens count against the piece budget. Falls back
    /// to line packing when no boundaries exist or a single unit is still
    /// over budget.
    fn split_functions(&self, text: &str) -> Vec<Piece> {
        let mut lines: Vec<&str> = text.lines().collect();
        let mut open_fence: Option<&str> = None;
        let mut close_fence: Option<&str> = None;
        if lines.first().is_some_and(|l| patterns::CODE_FENCE.is_match(l)) {
            open_fence = Some(lines.remove(0));
        }
        if lines.last().is_some_and(|l| patterns::CODE_FENCE.is_match(l)) {
            close_fence = lines.pop();
        }

        let mut units: Vec<Vec<&str>> = Vec::new();
        for line in lines {
            if is_function_boundary(line) || units.is_empty() {
                units.push(vec![line]);
            } else if let Some(last) = units.last_mut() {
                last.push(line);
            }
        }

        let wrap = |body: &str| -> String {
            let mut out = String::new();
            if let Some(open) = open_fence {
                out.push_str(open);
                out.push('\n');
            }
            out.push_str(body);
            if let Some(close) = close_fence {
                out.push('\n');
                out.push_str(close);
            }
            out
        };

        let body_budget = self
            .config
            .max_tokens
            .saturating_sub(self.counter.count(&wrap("")) + 2)
            .max(1);

        let mut pieces: Vec<Piece> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for unit in units {
            let body = unit.join("\n");
            if self.counter.count(&wrap(&body)) > self.config.max_tokens {
                if !current.is_empty() {
                    pieces.push(Piece::split_part(wrap(&current.join("\n"))));
                    current.clear();
                }
                for packed in self.pack_lines(&body, false, body_budget) {
                    pieces.push(Piece::split_part(wrap(&packed.content)));
                }
                continue;
            }
            if !current.is_empty() {
                let candidate = format!("{}\n{body}", current.join("\n"));
                if self.counter.count(&wrap(&candidate)) > self.config.max_tokens {
                    pieces.push(Piece::split_part(wrap(&current.join("\n"))));
                    current.clear();
                }
            }
            current.push(body);
        }
        if !current.is_empty() {
            pieces.push(Piece::split_part(wrap(&current.join("\n"))));
        }
        pieces
    }

    /// List split: whole items are grouped per piece; continuation lines
    /// never separate from their item. A single item over budget is cut
    /// further at line and word boundaries.
    fn split_items(&self, text: &str) -> Vec<Piece> {
        let mut items: Vec<Vec<&str>> = Vec::new();
        for line in text.lines() {
            let starts_item =
                patterns::BULLET_ITEM.is_match(line) || patterns::NUMBERED_ITEM.is_match(line);
            if starts_item || items.is_empty() {
                items.push(vec![line]);
            } else if let Some(last) = items.last_mut() {
                last.push(line);
            }
        }

        let mut pieces: Vec<Piece> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        for item in items {
            let body = item.join("\n");
            if self.counter.count(&body) > self.config.max_tokens {
                if !current.is_empty() {
                    pieces.push(Piece::split_part(current.join("\n")));
                    current.clear();
                }
                pieces.extend(self.pack_lines(&body, false, self.config.max_tokens));
                continue;
            }
            if !current.is_empty() {
                let candidate = format!("{}\n{body}", current.join("\n"));
                if self.counter.count(&candidate) > self.config.max_tokens {
                    pieces.push(Piece::split_part(current.join("\n")));
                    current.clear();
                }
            }
            current.push(body);
        }
        if !current.is_empty() {
            pieces.push(Piece::split_part(current.join("\n")));
        }
        pieces
    }

    /// Keeps the leading sentences that fit and appends a visible marker in
    /// place of the dropped tail.
    fn truncate(&self, text: &str) -> Piece {
        let mut kept = String::new();
        for sentence in split_into_sentences(text) {
            let candidate = if kept.is_empty() {
                sentence
            } else {
                format!("{kept} {sentence}")
            };
            let with_marker = format!("{candidate} {TRUNCATION_MARKER}");
            if self.counter.count(&with_marker) > self.config.max_tokens && !kept.is_empty() {
                break;
            }
            kept = candidate;
        }
        if kept.is_empty() {
            kept = TRUNCATION_MARKER.to_string();
        } else {
            kept.push(' ');
            kept.push_str(TRUNCATION_MARKER);
        }
        Piece {
            content: kept,
            split: false,
            truncated: true,
            forced: false,
            note: Some("content truncated to token budget".to_string()),
        }
    }

    fn force_split(&self, text: &str) -> Vec<Piece> {
        self.pack_lines(text, true, self.config.max_tokens)
    }

    /// Last-resort packing: lines grouped to the given budget, single
    /// oversized lines cut at word boundaries.
    fn pack_lines(&self, text: &str, forced: bool, budget: usize) -> Vec<Piece> {
        let budget = budget.max(1);
        let mut pieces: Vec<Piece> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        let mut flush = |current: &mut Vec<String>, pieces: &mut Vec<Piece>| {
            if current.is_empty() {
                return;
            }
            pieces.push(Piece {
                content: current.join("\n"),
                split: true,
                truncated: false,
                forced,
                note: None,
            });
            current.clear();
        };

        for line in text.lines() {
            let mut segments: Vec<String> = vec![line.to_string()];
            if self.counter.count(line) > budget {
                segments = self.pack_words(line, budget);
            }
            for segment in segments {
                if !current.is_empty() {
                    let candidate = format!("{}\n{segment}", current.join("\n"));
                    if self.counter.count(&candidate) > budget {
                        flush(&mut current, &mut pieces);
                    }
                }
                current.push(segment);
            }
        }
        flush(&mut current, &mut pieces);
        pieces
    }

    fn pack_words(&self, line: &str, budget: usize) -> Vec<String> {
        let budget = budget.max(1);
        let mut out: Vec<String> = Vec::new();
        let mut current = String::new();
        for word in line.split_whitespace() {
            if !current.is_empty() {
                let candidate = format!("{current} {word}");
                if self.counter.count(&candidate) <= budget {
                    current = candidate;
                    continue;
                }
                out.push(std::mem::take(&mut current));
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            out.push(current);
        }
        out
    }
}

fn provenance(
    chunk: &SemanticChunk,
    ir: &DocumentIR,
) -> (Option<(usize, usize)>, Option<(u32, u32)>) {
    let blocks: Vec<_> = chunk
        .source_blocks
        .iter()
        .filter_map(|&i| ir.blocks.get(i))
        .collect();
    if blocks.is_empty() {
        return (None, None);
    }
    let line_start = blocks.iter().map(|b| b.line_start).min().unwrap_or(0);
    let line_end = blocks.iter().map(|b| b.line_end).max().unwrap_or(0);
    let pages: Vec<u32> = blocks.iter().filter_map(|b| b.page_number).collect();
    let page_range = match (pages.iter().min(), pages.iter().max()) {
        (Some(&a), Some(&b)) => Some((a, b)),
        _ => None,
    };
    (Some((line_start, line_end)), page_range)
}

/// Grapheme-walking sentence splitter that ignores common abbreviations.
fn split_into_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for grapheme in text.graphemes(true) {
        current.push_str(grapheme);
        if is_sentence_boundary(&current) {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                sentences.push(trimmed);
            }
            current.clear();
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current.trim().to_string());
    }
    sentences
}

fn is_sentence_boundary(text: &str) -> bool {
    let trimmed = text.trim_end_matches([' ', '\t']);
    if trimmed.is_empty() {
        return false;
    }
    let last_char = match trimmed.chars().last() {
        Some(c) => c,
        None => return false,
    };
    if last_char == '\n' {
        return true;
    }
    if !matches!(last_char, '.' | '!' | '?' | '。' | '!' | '?') {
        return false;
    }

    let words: Vec<&str> = trimmed.split_whitespace().collect();
    if let Some(last_word) = words.last() {
        let abbreviations = [
            "Mr.", "Mrs.", "Ms.", "Dr.", "Prof.", "Sr.", "Jr.", "vs.", "etc.", "i.e.", "e.g.",
            "Inc.", "Ltd.", "Corp.", "Co.", "No.", "Vol.", "Ch.", "Fig.", "Eq.", "Sec.",
        ];
        if abbreviations.contains(last_word) {
            return false;
        }
    }
    true
}

fn is_function_boundary(line: &str) -> bool {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 0 {
        return false;
    }
    trimmed.starts_with("fn ")
        || trimmed.starts_with("pub fn ")
        || trimmed.starts_with("pub async fn ")
        || trimmed.starts_with("async fn ")
        || trimmed.starts_with("def ")
        || trimmed.starts_with("async def ")
        || trimmed.starts_with("function ")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("public ")
        || trimmed.starts_with("private ")
        || trimmed.starts_with("static ")
        || trimmed.starts_with("func ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        BlockType, ChunkType, SourceFormat, SourceMeta, StructureBlock,
    };

    fn tiny_config() -> ChunkingConfig {
        ChunkingConfig {
            min_tokens: 12,
            max_tokens: 30,
            overlap_tokens: 6,
            embedding_hard_limit: 200,
        }
    }

    fn splitter() -> TokenSplitter {
        TokenSplitter::new(tiny_config(), TokenCounter::new())
    }

    fn empty_ir() -> DocumentIR {
        DocumentIR {
            blocks: vec![StructureBlock::new(BlockType::Paragraph, "x", 0, 0)],
            source: SourceMeta {
                format: SourceFormat::Markdown,
                byte_len: 0,
                line_count: 1,
                page_count: None,
            },
            skipped: vec![],
        }
    }

    fn para(content: &str) -> SemanticChunk {
        SemanticChunk::new(ChunkType::Paragraph, vec!["T".into()], content, vec![0])
    }

    #[test]
    fn test_small_adjacent_paragraphs_merge() {
        let chunks = vec![para("One short."), para("Two short."), para("Three short.")];
        let items = splitter().split(chunks, &empty_ir());
        assert_eq!(items.len(), 1);
        assert!(items[0].merged);
        assert!(items[0].content.contains("One short."));
        assert!(items[0].content.contains("Three short."));
    }

    #[test]
    fn test_atomic_chunks_never_merge() {
        let table = SemanticChunk::new(
            ChunkType::Table,
            vec!["T".into()],
            "| a |\n|---|\n| 1 |",
            vec![0],
        );
        let chunks = vec![para("Short."), table, para("Also short.")];
        let items = splitter().split(chunks, &empty_ir());
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|i| !i.merged));
    }

    #[test]
    fn test_different_titles_never_merge() {
        let mut b = para("Other short.");
        b.title_path = vec!["U".into()];
        let items = splitter().split(vec![para("Short."), b], &empty_ir());
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_oversized_prose_splits_with_overlap() {
        let text = (0..12)
            .map(|i| format!("Sentence number {i} has a handful of words in it."))
            .collect::<Vec<_>>()
            .join(" ");
        let items = splitter().split(vec![para(&text)], &empty_ir());
        assert!(items.len() > 1);
        assert!(items.iter().all(|i| i.split));
        assert!(items.iter().all(|i| i.token_count <= tiny_config().max_tokens));
        // Overlap: last sentence of piece N reappears in piece N+1.
        let first_tail = items[0].content.split(". ").last().unwrap().to_string();
        assert!(items[1].content.contains(first_tail.trim_end_matches('.')));
    }

    #[test]
    fn test_scenario_c_row_split_repeats_header() {
        let mut table = String::from("| name | value |\n|---|---|\n");
        for i in 0..20 {
            table.push_str(&format!("| field_{i} | description of field {i} |\n"));
        }
        let chunk = SemanticChunk::new(ChunkType::Table, vec![], table.trim_end(), vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.split);
            assert!(item.content.starts_with("| name | value |"));
            assert!(item.content.contains("|---|---|"));
        }
    }

    #[test]
    fn test_function_split_keeps_fences() {
        let mut code = String::from("```rust\n");
        for i in 0..8 {
            code.push_str(&format!("fn handler_{i}() {{\n    respond({i});\n}}\n"));
        }
        code.push_str("```");
        let chunk = SemanticChunk::new(ChunkType::Code, vec![], code, vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.content.starts_with("```rust"));
            assert!(item.content.ends_with("```"));
        }
        // Function bodies stay whole.
        for item in &items {
            let opens = item.content.matches("fn handler_").count();
            let closes = item.content.matches("respond(").count();
            assert_eq!(opens, closes);
        }
    }

    #[test]
    fn test_item_split_groups_whole_items() {
        let list = (0..15)
            .map(|i| format!("- item number {i} with some words"))
            .collect::<Vec<_>>()
            .join("\n");
        let mut chunk = SemanticChunk::new(ChunkType::List, vec![], list, vec![0]);
        chunk.atomic = true;
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.content.lines().all(|l| l.starts_with("- ")));
        }
    }

    #[test]
    fn test_atomic_without_strategy_kept_intact() {
        let text = (0..10)
            .map(|i| format!("Endpoint line {i} with details."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunk = SemanticChunk::new(ChunkType::ApiDefinition, vec![], text.clone(), vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].content, text);
        assert!(!items[0].split);
        assert!(!items[0].forced_split);
    }

    #[test]
    fn test_hard_limit_forces_split() {
        let text = (0..100)
            .map(|i| format!("Line {i} of an enormous atomic definition."))
            .collect::<Vec<_>>()
            .join("\n");
        let chunk = SemanticChunk::new(ChunkType::ApiDefinition, vec![], text, vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        assert!(items.iter().all(|i| i.forced_split));
    }

    #[test]
    fn test_truncate_marks_item() {
        let text = (0..20)
            .map(|i| format!("Sentence {i} pads the content out."))
            .collect::<Vec<_>>()
            .join(" ");
        let mut chunk = SemanticChunk::new(ChunkType::Paragraph, vec![], text, vec![0]);
        chunk.atomic = true;
        chunk.overflow_strategy = OverflowStrategy::Truncate;
        let items = splitter().split(vec![chunk], &empty_ir());
        assert_eq!(items.len(), 1);
        assert!(items[0].truncated);
        assert!(items[0].token_count <= tiny_config().max_tokens);
        assert!(items[0].content.ends_with("[truncated]"));
        assert!(items[0].content.starts_with("Sentence 0"));
    }

    #[test]
    fn test_overlap_never_pushes_piece_over_budget() {
        let config = ChunkingConfig {
            min_tokens: 16,
            max_tokens: 64,
            overlap_tokens: 32,
            embedding_hard_limit: 8000,
        };
        let mut text = String::new();
        for i in 0..6 {
            text.push_str(&format!("Short sentence {i} goes here. "));
        }
        text.push_str(
            "Then one considerably longer sentence arrives, stretching across several \
             clauses with extra qualifiers and parenthetical asides so that it lands \
             near the middle of the budget all by itself.",
        );
        let s = TokenSplitter::new(config.clone(), TokenCounter::new());
        let items = s.split(vec![para(&text)], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(
                item.token_count <= config.max_tokens,
                "piece of {} tokens over the {} budget",
                item.token_count,
                config.max_tokens
            );
        }
    }

    #[test]
    fn test_prose_splits_at_paragraph_boundaries_first() {
        let paragraphs = [
            "First paragraph with enough words to carry weight on its own.",
            "Second paragraph continues the discussion at similar length.",
            "Third paragraph closes out the section with a final thought.",
        ];
        let text = paragraphs.join("\n\n");
        let items = splitter().split(vec![para(&text)], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.token_count <= tiny_config().max_tokens);
            for part in item.content.split("\n\n") {
                assert!(
                    paragraphs.contains(&part),
                    "piece crosses a paragraph boundary: {part:?}"
                );
            }
        }
    }

    #[test]
    fn test_row_larger_than_budget_is_cut_not_leaked() {
        let mut table = String::from("| field | description |\n|---|---|\n");
        table.push_str("| huge | ");
        for i in 0..40 {
            table.push_str(&format!("word{i} "));
        }
        table.push_str("|\n| tiny | ok |");
        let chunk = SemanticChunk::new(ChunkType::Table, vec![], table, vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.content.starts_with("| field | description |"));
            assert!(
                item.token_count <= tiny_config().max_tokens,
                "fragment of {} tokens over budget",
                item.token_count
            );
        }
    }

    #[test]
    fn test_fenced_code_pieces_stay_within_budget() {
        let mut code = String::from("```rust\n");
        for i in 0..10 {
            code.push_str(&format!("fn step_{i}() {{ advance({i}); }}\n"));
        }
        code.push_str("```");
        let chunk = SemanticChunk::new(ChunkType::Code, vec![], code, vec![0]);
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 1);
        for item in &items {
            assert!(item.content.starts_with("```rust"));
            assert!(item.content.ends_with("```"));
            assert!(
                item.token_count <= tiny_config().max_tokens,
                "fragment of {} tokens over budget",
                item.token_count
            );
        }
    }

    #[test]
    fn test_single_oversized_list_item_is_split_further() {
        let mut list = String::from("- first small item\n- ");
        for i in 0..40 {
            list.push_str(&format!("detail{i} "));
        }
        list.push('\n');
        list.push_str("- last small item");
        let mut chunk = SemanticChunk::new(ChunkType::List, vec![], list, vec![0]);
        chunk.atomic = true;
        let items = splitter().split(vec![chunk], &empty_ir());
        assert!(items.len() > 2);
        for item in &items {
            assert!(
                item.token_count <= tiny_config().max_tokens,
                "fragment of {} tokens over budget",
                item.token_count
            );
        }
    }

    #[test]
    fn test_within_budget_chunk_passes_through_unchanged() {
        let items = splitter().split(
            vec![para("A chunk already inside every budget, left alone entirely.")],
            &empty_ir(),
        );
        assert_eq!(items.len(), 1);
        assert!(!items[0].split && !items[0].merged && !items[0].truncated);
    }

    #[test]
    fn test_split_output_is_stable_on_resplit() {
        let text = (0..12)
            .map(|i| format!("Sentence number {i} has a handful of words in it."))
            .collect::<Vec<_>>()
            .join(" ");
        let s = splitter();
        let first = s.split(vec![para(&text)], &empty_ir());
        for item in &first {
            let rewrapped = SemanticChunk::new(
                ChunkType::Paragraph,
                vec!["T".into()],
                item.content.clone(),
                vec![0],
            );
            let again = s.split(vec![rewrapped], &empty_ir());
            assert_eq!(again.len(), 1, "piece re-split");
            assert_eq!(again[0].content, item.content);
        }
    }

    #[test]
    fn test_provenance_spans_source_blocks() {
        let ir = DocumentIR {
            blocks: vec![
                StructureBlock::new(BlockType::Paragraph, "a", 2, 4),
                StructureBlock::new(BlockType::Paragraph, "b", 7, 9),
            ],
            source: SourceMeta {
                format: SourceFormat::Pdf,
                byte_len: 0,
                line_count: 10,
                page_count: None,
            },
            skipped: vec![],
        };
        let chunk = SemanticChunk::new(ChunkType::Paragraph, vec![], "a\n\nb", vec![0, 1]);
        let items = splitter().split(vec![chunk], &ir);
        assert_eq!(items[0].line_range, Some((2, 9)));
    }

    #[test]
    fn test_sentence_splitter_respects_abbreviations() {
        let sentences = split_into_sentences("Dr. Smith arrived. He left at noon.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Dr. Smith arrived.");
    }
}
