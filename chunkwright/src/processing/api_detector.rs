use std::sync::LazyLock;

use regex::Regex;

use crate::config::ApiKeywords;
use crate::models::{BlockType, DocumentIR, StructureBlock};
use crate::processing::patterns;

/// Endpoint occurrences inside a block, wherever they sit on the line.
/// Paragraph merging can fold several endpoint lines into one block, so the
/// anchored pattern alone is not enough here.
static ENDPOINT_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)\s*[::]?\s+(/\S*)")
        .expect("invalid endpoint pattern")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: String,
    pub path: String,
    pub block_index: usize,
}

/// Kind of shared resource a label announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Parameters,
    Response,
    Example,
}

/// One API-documentation section: a group of endpoints sharing parameter,
/// response and example blocks.
#[derive(Debug, Clone, Default)]
pub struct ApiSection {
    pub heading_index: Option<usize>,
    pub heading_level: Option<u8>,
    pub title_path: Vec<String>,
    /// Paragraphs between the heading and the first endpoint.
    pub description_indices: Vec<usize>,
    pub endpoints: Vec<Endpoint>,
    /// Block indices holding endpoint definitions (deduplicated, ordered).
    pub endpoint_block_indices: Vec<usize>,
    /// Short paragraphs directly following an endpoint block.
    pub endpoint_description_indices: Vec<usize>,
    pub params_indices: Vec<usize>,
    pub response_indices: Vec<usize>,
    pub example_indices: Vec<usize>,
}

impl ApiSection {
    pub fn is_multi_endpoint(&self) -> bool {
        self.endpoints.len() > 1
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiDetection {
    pub sections: Vec<ApiSection>,
}

impl ApiDetection {
    /// The document is an API document iff any section holds an endpoint.
    pub fn is_api_document(&self) -> bool {
        self.sections.iter().any(|s| !s.endpoints.is_empty())
    }
}

/// Scans the filtered IR for API-documentation structure: endpoint
/// definitions, the sections grouping them, and the parameter/response/
/// example blocks those endpoints share.
pub struct ApiStructureDetector {
    keywords: ApiKeywords,
}

impl ApiStructureDetector {
    pub fn new(keywords: ApiKeywords) -> Self {
        Self { keywords }
    }

    pub fn detect(&self, ir: &DocumentIR) -> ApiDetection {
        let blocks = &ir.blocks;
        let mut sections: Vec<ApiSection> = Vec::new();
        let mut idx = 0;

        while idx < blocks.len() {
            let block = &blocks[idx];

            if block.is_heading() {
                if let Some(end) = self.heading_opens_section(blocks, idx) {
                    let section = self.collect_section(blocks, idx, end, Some(idx));
                    idx = end;
                    sections.push(section);
                    continue;
                }
                idx += 1;
                continue;
            }

            if is_endpoint_block(block) {
                // Bare endpoint run with no heading above it.
                let end = self.bare_section_end(blocks, idx);
                let section = self.collect_section(blocks, idx, end, None);
                idx = end;
                sections.push(section);
                continue;
            }

            idx += 1;
        }

        let detection = ApiDetection { sections };
        if detection.is_api_document() {
            tracing::debug!(
                sections = detection.sections.len(),
                "detected API documentation structure"
            );
        }
        detection
    }

    /// If the heading at `start` is followed by an endpoint within the
    /// lookahead window, return the exclusive end index of the section.
    fn heading_opens_section(&self, blocks: &[StructureBlock], start: usize) -> Option<usize> {
        let level = blocks[start].level.unwrap_or(1);
        let mut seen = 0usize;
        let mut found = false;
        let mut end = blocks.len();

        for (offset, block) in blocks[start + 1..].iter().enumerate() {
            let idx = start + 1 + offset;
            if block.is_heading() && block.level.unwrap_or(1) <= level {
                end = idx;
                break;
            }
            if !found {
                if is_endpoint_block(block) {
                    found = true;
                } else if !block.is_heading() {
                    seen += 1;
                    if seen >= self.keywords.endpoint_lookahead {
                        // Window exhausted without an endpoint.
                        return None;
                    }
                }
            }
        }

        found.then_some(end)
    }

    /// End of a heading-less endpoint run: the next heading or the first
    /// block that belongs to no API vocabulary at all.
    fn bare_section_end(&self, blocks: &[StructureBlock], start: usize) -> usize {
        for (offset, block) in blocks[start + 1..].iter().enumerate() {
            let idx = start + 1 + offset;
            if block.is_heading() {
                return idx;
            }
        }
        blocks.len()
    }

    fn collect_section(
        &self,
        blocks: &[StructureBlock],
        start: usize,
        end: usize,
        heading_index: Option<usize>,
    ) -> ApiSection {
        let mut section = ApiSection {
            heading_index,
            heading_level: heading_index.and_then(|i| blocks[i].level),
            ..Default::default()
        };
        if let Some(h) = heading_index {
            let mut path = blocks[h].parent_headings.clone();
            path.push(blocks[h].content.clone());
            section.title_path = path;
        } else {
            section.title_path = blocks[start].parent_headings.clone();
        }

        let body_start = heading_index.map(|h| h + 1).unwrap_or(start);
        let mut pending_label: Option<Label> = None;
        let mut last_was_endpoint = false;
        let mut any_shared = false;

        for idx in body_start..end {
            let block = &blocks[idx];

            if block.is_heading() {
                // A deeper heading inside the section may only carry a label.
                pending_label = self.label_of(&block.content);
                last_was_endpoint = false;
                continue;
            }

            if is_endpoint_block(block) {
                for caps in ENDPOINT_INLINE.captures_iter(&block.content) {
                    section.endpoints.push(Endpoint {
                        method: caps[1].to_string(),
                        path: caps[2].to_string(),
                        block_index: idx,
                    });
                }
                if section.endpoint_block_indices.last() != Some(&idx) {
                    section.endpoint_block_indices.push(idx);
                }
                last_was_endpoint = true;
                pending_label = None;
                continue;
            }

            let own_label = self.label_of(&block.content);

            match block.block_type {
                BlockType::Table | BlockType::List => {
                    match own_label.or(pending_label) {
                        Some(Label::Parameters) => section.params_indices.push(idx),
                        Some(Label::Response) => section.response_indices.push(idx),
                        Some(Label::Example) => section.example_indices.push(idx),
                        None => {
                            // Positional fallback: first table is parameters,
                            // the one after it is the response.
                            if section.params_indices.is_empty() {
                                section.params_indices.push(idx);
                            } else if section.response_indices.is_empty() {
                                section.response_indices.push(idx);
                            }
                        }
                    }
                    pending_label = None;
                    any_shared = true;
                }
                BlockType::Code => {
                    section.example_indices.push(idx);
                    pending_label = None;
                    any_shared = true;
                }
                _ => {
                    if own_label.is_some() {
                        // A label paragraph announces the next shared block.
                        pending_label = own_label;
                    } else if section.endpoints.is_empty() {
                        section.description_indices.push(idx);
                    } else if last_was_endpoint
                        && !any_shared
                        && block.content.chars().count() < 200
                    {
                        section.endpoint_description_indices.push(idx);
                    } else {
                        // Generic prose; left to the structural stages via
                        // validator fallback.
                        pending_label = None;
                    }
                }
            }
            last_was_endpoint = false;
        }

        section
    }

    fn label_of(&self, content: &str) -> Option<Label> {
        let lowered = content.trim().to_lowercase();
        let short = lowered.chars().count() < 60;
        let matches = |keys: &[String]| {
            keys.iter().any(|k| {
                let k = k.to_lowercase();
                lowered.starts_with(&k) || (short && lowered.contains(&k))
            })
        };
        if matches(&self.keywords.parameters) {
            Some(Label::Parameters)
        } else if matches(&self.keywords.response) {
            Some(Label::Response)
        } else if matches(&self.keywords.example) {
            Some(Label::Example)
        } else {
            None
        }
    }
}

/// A block defines endpoints when its content leads with an HTTP method and
/// path.
pub fn is_endpoint_block(block: &StructureBlock) -> bool {
    if block.is_heading() {
        return patterns::HTTP_ENDPOINT.is_match(&block.content);
    }
    match block.block_type {
        BlockType::Paragraph | BlockType::Definition | BlockType::Flow | BlockType::Code => {
            patterns::HTTP_ENDPOINT.is_match(&block.content)
                || ENDPOINT_INLINE
                    .find(&block.content)
                    .is_some_and(|m| m.start() == 0 || block.content[..m.start()].trim().is_empty())
        }
        _ => false,
    }
}
