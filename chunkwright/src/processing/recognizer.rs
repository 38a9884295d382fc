use crate::models::{
    BlockType, DocumentIR, LineMeta, ListType, SourceFormat, SourceMeta, StructureBlock,
};
use crate::processing::extractors::ExtractedDocument;
use crate::processing::patterns;

/// Single left-to-right scan over cleaned lines. Multi-line structures are
/// tried first (fenced code, tables, list runs, Q&A pairs), then single-line
/// rules (headings, blockquotes, flow lines, definitions); anything left
/// becomes a paragraph. A heading stack threads `parent_headings` through
/// every block.
pub struct StructureRecognizer;

struct Scan<'a> {
    lines: Vec<&'a str>,
    meta: &'a [LineMeta],
    pos: usize,
    heading_stack: Vec<(u8, String)>,
    blocks: Vec<StructureBlock>,
}

impl StructureRecognizer {
    pub fn recognize(extracted: &ExtractedDocument, format: SourceFormat) -> DocumentIR {
        let lines: Vec<&str> = extracted.text.lines().collect();
        let line_count = lines.len();
        let page_count = extracted
            .line_meta
            .iter()
            .filter_map(|m| m.page_number)
            .max();

        let mut scan = Scan {
            lines,
            meta: &extracted.line_meta,
            pos: 0,
            heading_stack: Vec::new(),
            blocks: Vec::new(),
        };
        scan.run();

        let blocks = merge_adjacent_paragraphs(scan.blocks);

        tracing::debug!(
            blocks = blocks.len(),
            lines = line_count,
            "recognized document structure"
        );

        DocumentIR {
            blocks,
            source: SourceMeta {
                format,
                byte_len: extracted.text.len(),
                line_count,
                page_count,
            },
            skipped: extracted.skipped.clone(),
        }
    }
}

impl<'a> Scan<'a> {
    fn run(&mut self) {
        while self.pos < self.lines.len() {
            if self.current().trim().is_empty() {
                self.pos += 1;
                continue;
            }

            if self.try_code_block()
                || self.try_table()
                || self.try_list_run()
                || self.try_qa_pair()
                || self.try_blockquote_run()
            {
                continue;
            }

            if self.try_heading() || self.try_flow() || self.try_definition() {
                continue;
            }

            self.take_paragraph_line();
        }
    }

    fn current(&self) -> &str {
        self.lines[self.pos]
    }

    fn meta_at(&self, idx: usize) -> Option<&LineMeta> {
        self.meta.get(idx)
    }

    fn parents(&self) -> Vec<String> {
        self.heading_stack.iter().map(|(_, t)| t.clone()).collect()
    }

    fn page_at(&self, idx: usize) -> Option<u32> {
        self.meta_at(idx).and_then(|m| m.page_number)
    }

    fn push_block(&mut self, mut block: StructureBlock) {
        block.parent_headings = self.parents();
        block.page_number = self.page_at(block.line_start);
        self.blocks.push(block);
    }

    // ── Multi-line recognition ───────────────────────────────────

    fn try_code_block(&mut self) -> bool {
        let start = self.pos;
        let fence = match patterns::CODE_FENCE.captures(self.current()) {
            Some(caps) => caps,
            None => {
                // Extractor-marked code membership without a visible fence
                // (converter output).
                if self.meta_at(start).is_some_and(|m| m.in_code_block) {
                    return self.take_marked_code_run();
                }
                return false;
            }
        };

        let marker = fence[1].to_string();
        let lang = fence[2].trim();
        let language = (!lang.is_empty()).then(|| lang.to_string());

        let mut end = start + 1;
        let mut body: Vec<&str> = Vec::new();
        let mut closed = false;
        while end < self.lines.len() {
            if let Some(caps) = patterns::CODE_FENCE.captures(self.lines[end]) {
                if caps[1].starts_with(&marker[..1]) && caps[1].len() >= marker.len() {
                    closed = true;
                    break;
                }
            }
            body.push(self.lines[end]);
            end += 1;
        }

        let line_end = if closed { end } else { end.saturating_sub(1) };
        let mut block =
            StructureBlock::new(BlockType::Code, body.join("\n"), start, line_end.max(start));
        block.language = language;
        self.push_block(block);
        self.pos = if closed { end + 1 } else { end };
        true
    }

    fn take_marked_code_run(&mut self) -> bool {
        let start = self.pos;
        let mut end = start;
        while end < self.lines.len() && self.meta_at(end).is_some_and(|m| m.in_code_block) {
            end += 1;
        }
        let mut block = StructureBlock::new(
            BlockType::Code,
            self.lines[start..end].join("\n"),
            start,
            end - 1,
        );
        block.language = self
            .meta_at(start)
            .and_then(|m| m.code_language.clone());
        self.push_block(block);
        self.pos = end;
        true
    }

    fn try_table(&mut self) -> bool {
        let start = self.pos;
        if !patterns::TABLE_ROW.is_match(self.current()) {
            return false;
        }
        let has_separator = self
            .lines
            .get(start + 1)
            .is_some_and(|l| patterns::TABLE_SEPARATOR.is_match(l));
        if !has_separator {
            return false;
        }

        let headers = split_table_row(self.current());
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut end = start + 2;
        while end < self.lines.len()
            && patterns::TABLE_ROW.is_match(self.lines[end])
            && !patterns::TABLE_SEPARATOR.is_match(self.lines[end])
        {
            rows.push(split_table_row(self.lines[end]));
            end += 1;
        }

        let mut block = StructureBlock::new(
            BlockType::Table,
            self.lines[start..end].join("\n"),
            start,
            end - 1,
        );
        block.headers = Some(headers);
        block.rows = Some(rows);
        self.push_block(block);
        self.pos = end;
        true
    }

    fn try_list_run(&mut self) -> bool {
        let start = self.pos;
        let first_item = list_item(self.current(), self.meta_at(start));
        let (list_type, base_indent) = match first_item {
            Some(v) => v,
            None => return false,
        };

        let mut items: Vec<String> = Vec::new();
        let mut raw_end = start;
        let mut end = start;
        while end < self.lines.len() {
            let line = self.lines[end];
            if line.trim().is_empty() {
                // A blank line continues the run only if another item
                // follows directly.
                let next_is_item = self
                    .lines
                    .get(end + 1)
                    .is_some_and(|l| list_item(l, self.meta_at(end + 1)).is_some());
                if next_is_item {
                    end += 1;
                    continue;
                }
                break;
            }
            if let Some((_, _)) = list_item(line, self.meta_at(end)) {
                items.push(item_text(line));
                raw_end = end;
                end += 1;
                continue;
            }
            // Indented continuation of the previous item.
            let indent = line.len() - line.trim_start().len();
            if !items.is_empty() && indent > base_indent {
                if let Some(last) = items.last_mut() {
                    last.push(' ');
                    last.push_str(line.trim());
                }
                raw_end = end;
                end += 1;
                continue;
            }
            break;
        }

        if items.is_empty() {
            return false;
        }

        let mut block = StructureBlock::new(
            BlockType::List,
            self.lines[start..=raw_end].join("\n"),
            start,
            raw_end,
        );
        block.list_type = Some(list_type);
        block.items = Some(items);
        self.push_block(block);
        self.pos = end;
        true
    }

    fn try_qa_pair(&mut self) -> bool {
        let start = self.pos;
        let question = match patterns::QUESTION_MARKER.captures(self.current()) {
            Some(caps) => caps[1].trim().to_string(),
            None => return false,
        };

        // The answer marker must appear within a short window.
        let mut answer_line = None;
        for idx in start + 1..(start + 4).min(self.lines.len()) {
            if self.lines[idx].trim().is_empty() {
                continue;
            }
            if patterns::ANSWER_MARKER.is_match(self.lines[idx]) {
                answer_line = Some(idx);
            }
            break;
        }
        let answer_start = match answer_line {
            Some(idx) => idx,
            None => return false,
        };

        let mut answer = patterns::ANSWER_MARKER.captures(self.lines[answer_start]).map(|c| c[1].trim().to_string()).unwrap_or_default();
        let mut end = answer_start + 1;
        while end < self.lines.len() {
            let line = self.lines[end];
            if line.trim().is_empty()
                || patterns::QUESTION_MARKER.is_match(line)
                || patterns::ATX_HEADING.is_match(line)
            {
                break;
            }
            answer.push(' ');
            answer.push_str(line.trim());
            end += 1;
        }

        let mut block = StructureBlock::new(
            BlockType::Qa,
            self.lines[start..end].join("\n"),
            start,
            end - 1,
        );
        block.question = Some(question);
        block.answer = Some(answer);
        self.push_block(block);
        self.pos = end;
        true
    }

    fn try_blockquote_run(&mut self) -> bool {
        let start = self.pos;
        if !patterns::BLOCKQUOTE.is_match(self.current()) {
            return false;
        }
        let mut end = start;
        let mut quoted: Vec<String> = Vec::new();
        while end < self.lines.len() {
            match patterns::BLOCKQUOTE.captures(self.lines[end]) {
                Some(caps) => {
                    quoted.push(caps[1].to_string());
                    end += 1;
                }
                None => break,
            }
        }
        let block = StructureBlock::new(BlockType::Blockquote, quoted.join("\n"), start, end - 1);
        self.push_block(block);
        self.pos = end;
        true
    }

    // ── Single-line recognition ──────────────────────────────────

    fn try_heading(&mut self) -> bool {
        let start = self.pos;
        let line = self.current();

        let hinted = self.meta_at(start).and_then(|m| m.heading_level);

        let (level, text, consumed) = if let Some(caps) = patterns::ATX_HEADING.captures(line) {
            (caps[1].len() as u8, caps[2].trim().to_string(), 1)
        } else if let Some(underline) = self.setext_underline_at(start + 1) {
            (underline, line.trim().to_string(), 2)
        } else if let Some(level) = hinted {
            (level, clean_heading_text(line), 1)
        } else if patterns::is_all_caps_heading(line) {
            (1, line.trim().to_string(), 1)
        } else if let Some(caps) = patterns::NUMBERED_HEADING.captures(line.trim()) {
            // Dotted section numbers only; single-level numbers are list
            // territory unless the extractor hinted otherwise.
            if caps[1].contains('.') {
                (
                    caps[1].matches('.').count() as u8 + 1,
                    line.trim().to_string(),
                    1,
                )
            } else {
                return false;
            }
        } else {
            return false;
        };

        // Pop everything at or below this depth, then snapshot parents.
        while self
            .heading_stack
            .last()
            .is_some_and(|(d, _)| *d >= level)
        {
            self.heading_stack.pop();
        }

        let mut block = StructureBlock::new(BlockType::Heading, text.clone(), start, start + consumed - 1);
        block.level = Some(level);
        self.push_block(block);

        self.heading_stack.push((level, text));
        self.pos = start + consumed;
        true
    }

    fn setext_underline_at(&self, idx: usize) -> Option<u8> {
        let line = self.lines.get(idx)?;
        let caps = patterns::SETEXT_UNDERLINE.captures(line)?;
        // The current line must be plain text, not markup of its own.
        let cur = self.current();
        if cur.trim().is_empty()
            || patterns::TABLE_ROW.is_match(cur)
            || list_item(cur, self.meta_at(self.pos)).is_some()
        {
            return None;
        }
        Some(if caps[1].starts_with('=') { 1 } else { 2 })
    }

    fn try_flow(&mut self) -> bool {
        let start = self.pos;
        if !patterns::FLOW_LINE.is_match(self.current()) {
            return false;
        }
        let block =
            StructureBlock::new(BlockType::Flow, self.current().trim().to_string(), start, start);
        self.push_block(block);
        self.pos += 1;
        true
    }

    fn try_definition(&mut self) -> bool {
        let start = self.pos;
        let line = self.current();
        if patterns::TABLE_ROW.is_match(line) || list_item(line, self.meta_at(start)).is_some() {
            return false;
        }
        if !patterns::DEFINITION_LINE.is_match(line) {
            return false;
        }
        let block =
            StructureBlock::new(BlockType::Definition, line.trim().to_string(), start, start);
        self.push_block(block);
        self.pos += 1;
        true
    }

    fn take_paragraph_line(&mut self) {
        let start = self.pos;
        let block = StructureBlock::new(
            BlockType::Paragraph,
            self.current().trim().to_string(),
            start,
            start,
        );
        self.push_block(block);
        self.pos += 1;
    }
}

fn clean_heading_text(line: &str) -> String {
    line.trim().trim_start_matches('#').trim().to_string()
}

fn split_table_row(line: &str) -> Vec<String> {
    line.trim()
        .trim_matches('|')
        .split('|')
        .map(|c| c.trim().to_string())
        .collect()
}

fn list_item(line: &str, meta: Option<&LineMeta>) -> Option<(ListType, usize)> {
    if let Some(caps) = patterns::BULLET_ITEM.captures(line) {
        return Some((ListType::Bullet, caps[1].len()));
    }
    if let Some(caps) = patterns::NUMBERED_ITEM.captures(line) {
        return Some((ListType::Numbered, caps[1].len()));
    }
    meta.filter(|m| m.in_list)
        .map(|m| (m.list_type.unwrap_or(ListType::Bullet), m.indent))
}

fn item_text(line: &str) -> String {
    if let Some(caps) = patterns::BULLET_ITEM.captures(line) {
        return caps[2].trim().to_string();
    }
    if let Some(caps) = patterns::NUMBERED_ITEM.captures(line) {
        return caps[2].trim().to_string();
    }
    line.trim().to_string()
}

/// Merge consecutive paragraph blocks with identical parent headings and
/// contiguous line ranges into one.
fn merge_adjacent_paragraphs(blocks: Vec<StructureBlock>) -> Vec<StructureBlock> {
    let mut merged: Vec<StructureBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.block_type == BlockType::Paragraph {
            if let Some(prev) = merged.last_mut() {
                if prev.block_type == BlockType::Paragraph
                    && prev.parent_headings == block.parent_headings
                    && prev.line_end + 1 == block.line_start
                {
                    prev.content.push(' ');
                    prev.content.push_str(&block.content);
                    prev.line_end = block.line_end;
                    continue;
                }
            }
        }
        merged.push(block);
    }
    merged
}
