use crate::models::LineMeta;

use super::{apply_list_meta, strip_inline_media, ExtractedDocument, Extractor};

/// Fallback extractor for plain text and unknown formats. Emits list hints
/// only; everything else is left for the recognizer's generic line rules.
#[derive(Default)]
pub struct PlainTextExtractor;

impl Extractor for PlainTextExtractor {
    fn extract(&self, text: &str, _filename: &str) -> ExtractedDocument {
        let mut out = ExtractedDocument::default();
        let mut cleaned_lines: Vec<String> = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let cleaned = strip_inline_media(line, line_no, &mut out.skipped);
            let mut meta = LineMeta::default();
            apply_list_meta(&cleaned, &mut meta);
            out.line_meta.push(meta);
            cleaned_lines.push(cleaned);
        }

        out.text = cleaned_lines.join("\n");
        out
    }
}
