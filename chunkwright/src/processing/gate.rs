use crate::config::GateConfig;
use crate::models::{BlockType, DocumentIR};
use crate::processing::api_detector::ApiDetection;
use crate::processing::patterns;

/// Outcome of the heuristic-vs-LLM gate. Pure function of IR statistics;
/// the caller decides what to do with a `use_llm` recommendation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    pub use_llm: bool,
    pub reason: String,
}

impl GateDecision {
    fn rule_based(reason: &str) -> Self {
        Self {
            use_llm: false,
            reason: reason.to_string(),
        }
    }

    fn llm(reason: &str) -> Self {
        Self {
            use_llm: true,
            reason: reason.to_string(),
        }
    }
}

pub fn evaluate(ir: &DocumentIR, detection: &ApiDetection, config: &GateConfig) -> GateDecision {
    // Rule (a): API documents with weak lead-ins confuse positional
    // heuristics; everything else API is well handled by the rule-based
    // chunker.
    if detection.is_api_document() {
        if ir
            .blocks
            .iter()
            .any(|b| b.block_type == BlockType::Paragraph && is_weak_lead_in(&b.content, config))
        {
            return GateDecision::llm("api document with weak-semantic lead-in paragraphs");
        }
        return GateDecision::rule_based("api document with clear section structure");
    }

    // Rule (b): a document of only headings and paragraphs may hide
    // implicit lists behind deceptively uniform structure.
    let only_heading_paragraph = ir
        .blocks
        .iter()
        .all(|b| matches!(b.block_type, BlockType::Heading | BlockType::Paragraph));
    if only_heading_paragraph && !ir.blocks.is_empty() {
        let lengths: Vec<usize> = ir
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Paragraph)
            .map(|b| b.content.chars().count())
            .collect();
        if lengths.is_empty() {
            return GateDecision::rule_based("headings only, nothing to chunk semantically");
        }

        let std_dev = std_deviation(&lengths);
        let short = lengths
            .iter()
            .filter(|&&l| l < config.short_para_chars)
            .count();
        let short_ratio = short as f64 / lengths.len() as f64;
        let short_run = longest_short_run(&lengths, config.short_para_chars);

        if std_dev > config.length_std_dev_threshold {
            return GateDecision::llm("paragraph lengths vary widely; implicit structure likely");
        }
        if short_ratio > config.short_ratio_threshold {
            return GateDecision::llm("high ratio of short paragraphs; likely an implicit list");
        }
        if short_run >= config.short_run_threshold {
            return GateDecision::llm("run of consecutive short paragraphs; likely an implicit list");
        }
        return GateDecision::rule_based("uniform heading/paragraph document");
    }

    // Rule (c): structural blocks with ambiguous lead-ins need semantic
    // judgement; clean boundaries do not.
    let ambiguous = ir.blocks.windows(2).any(|pair| {
        matches!(pair[1].block_type, BlockType::Code | BlockType::Table)
            && pair[0].block_type == BlockType::Paragraph
            && is_weak_lead_in(&pair[0].content, config)
    });
    if ambiguous {
        return GateDecision::llm("short lead-in paragraphs blur code/table boundaries");
    }
    GateDecision::rule_based("structural boundaries are unambiguous")
}

fn is_weak_lead_in(content: &str, config: &GateConfig) -> bool {
    content.chars().count() < config.short_para_chars * 2
        && patterns::LEAD_IN.is_match(content.trim())
}

fn std_deviation(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    let mean = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    let variance = lengths
        .iter()
        .map(|&l| {
            let d = l as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / lengths.len() as f64;
    variance.sqrt()
}

fn longest_short_run(lengths: &[usize], short_chars: usize) -> usize {
    let mut best = 0;
    let mut current = 0;
    for &len in lengths {
        if len < short_chars {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKeywords;
    use crate::models::SourceFormat;
    use crate::processing::api_detector::ApiStructureDetector;
    use crate::processing::extractors::{Extractor, ExtractorRegistry};
    use crate::processing::recognizer::StructureRecognizer;

    fn gate(text: &str) -> GateDecision {
        let registry = ExtractorRegistry::new();
        let extracted = registry
            .extractor_for(SourceFormat::Markdown)
            .extract(text, "doc.md");
        let ir = StructureRecognizer::recognize(&extracted, SourceFormat::Markdown);
        let detection = ApiStructureDetector::new(ApiKeywords::default()).detect(&ir);
        evaluate(&ir, &detection, &GateConfig::default())
    }

    #[test]
    fn test_api_document_without_lead_ins_is_rule_based() {
        let decision = gate("GET /users\n\nParameters:\n| name | type |\n|---|---|\n| id | int |\n");
        assert!(!decision.use_llm);
    }

    #[test]
    fn test_api_document_with_lead_in_uses_llm() {
        let decision =
            gate("GET /users\n\nThe fields are as follows:\n\n| name | type |\n|---|---|\n| id | int |\n");
        assert!(decision.use_llm);
    }

    #[test]
    fn test_uniform_prose_is_rule_based() {
        let long = "This paragraph carries roughly the same amount of text as its siblings, \
                    enough to look like ordinary prose in every respect.";
        let text = format!("# Doc\n\n{long}\n\n{long} Again.\n\n{long} Once more.\n");
        let decision = gate(&text);
        assert!(!decision.use_llm);
    }

    #[test]
    fn test_short_paragraph_run_uses_llm() {
        let mut text = String::from("# Doc\n\n");
        for i in 0..6 {
            text.push_str(&format!("Entry number {i}.\n\n"));
        }
        let decision = gate(&text);
        assert!(decision.use_llm, "reason: {}", decision.reason);
    }

    #[test]
    fn test_mixed_structure_with_clean_boundaries_is_rule_based() {
        let decision = gate(
            "# Doc\n\nA full explanatory paragraph that stands on its own with plenty of words.\n\n```rust\nfn main() {}\n```\n",
        );
        assert!(!decision.use_llm);
    }

    #[test]
    fn test_lead_in_before_code_uses_llm() {
        let decision = gate("# Doc\n\nSee the example below:\n\n```rust\nfn main() {}\n```\n");
        assert!(decision.use_llm);
    }

    #[test]
    fn test_std_deviation() {
        assert!((std_deviation(&[10, 10, 10]) - 0.0).abs() < f64::EPSILON);
        assert!(std_deviation(&[10, 400, 15]) > 100.0);
    }

    #[test]
    fn test_longest_short_run() {
        assert_eq!(longest_short_run(&[10, 20, 300, 5, 5, 5], 50), 3);
        assert_eq!(longest_short_run(&[300, 300], 50), 0);
    }
}
