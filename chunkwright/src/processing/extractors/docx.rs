use crate::models::{LineMeta, SkippedElement};
use crate::processing::patterns;

use super::{
    apply_list_meta, skipped_kind_from_tag, strip_inline_media, ExtractedDocument, Extractor,
};

/// Extractor for DOCX-derived text. The upstream converter renders headings
/// as `#`-prefixed lines, tables as pipe rows, and non-text parts as
/// `[IMAGE: ...]` / `[CHART: ...]` placeholders; this extractor records the
/// placeholders and blanks them out.
#[derive(Default)]
pub struct DocxTextExtractor;

impl Extractor for DocxTextExtractor {
    fn extract(&self, text: &str, _filename: &str) -> ExtractedDocument {
        let mut out = ExtractedDocument::default();
        let mut cleaned_lines: Vec<String> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let mut meta = LineMeta::default();

            if let Some(caps) = patterns::CONVERTER_PLACEHOLDER.captures(line) {
                let description = caps[2].trim();
                out.skipped.push(SkippedElement {
                    kind: skipped_kind_from_tag(&caps[1]),
                    line: line_no,
                    description: (!description.is_empty()).then(|| description.to_string()),
                });
                out.line_meta.push(meta);
                cleaned_lines.push(String::new());
                continue;
            }

            let cleaned = strip_inline_media(line, line_no, &mut out.skipped);

            if let Some(caps) = patterns::ATX_HEADING.captures(&cleaned) {
                meta.heading_level = Some(caps[1].len() as u8);
            }
            apply_list_meta(&cleaned, &mut meta);

            out.line_meta.push(meta);
            cleaned_lines.push(cleaned);
        }

        out.text = cleaned_lines.join("\n");
        out
    }
}
