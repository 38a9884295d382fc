use crate::models::LineMeta;
use crate::processing::patterns;

use super::{apply_list_meta, strip_inline_media, ExtractedDocument, Extractor};

/// Extractor for PDF-derived text. The binary was decoded upstream; what
/// arrives here is flat text with `--- Page N ---` markers and headings
/// flattened into ALL-CAPS, numbered or bold lines.
#[derive(Default)]
pub struct PdfTextExtractor;

impl Extractor for PdfTextExtractor {
    fn extract(&self, text: &str, _filename: &str) -> ExtractedDocument {
        let mut out = ExtractedDocument::default();
        let mut cleaned_lines: Vec<String> = Vec::new();
        let mut current_page: Option<u32> = None;

        for (line_no, line) in text.lines().enumerate() {
            let mut meta = LineMeta::default();

            if let Some(caps) = patterns::PAGE_MARKER.captures(line) {
                current_page = caps[1].parse().ok();
                meta.page_number = current_page;
                // Blank the marker line so downstream stages skip it while
                // line numbering stays aligned.
                out.line_meta.push(meta);
                cleaned_lines.push(String::new());
                continue;
            }

            let cleaned = strip_inline_media(line, line_no, &mut out.skipped);
            meta.page_number = current_page;

            if let Some(level) = pseudo_heading_level(&cleaned) {
                meta.heading_level = Some(level);
            }
            apply_list_meta(&cleaned, &mut meta);

            out.line_meta.push(meta);
            cleaned_lines.push(cleaned);
        }

        out.text = cleaned_lines.join("\n");
        out
    }
}

/// Heading depth for PDF pseudo-headings: ALL-CAPS lines are chapter-level,
/// numbered sections take their depth from the dotted numbering, a lone
/// bold line sits below both.
fn pseudo_heading_level(line: &str) -> Option<u8> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if patterns::is_all_caps_heading(trimmed) {
        return Some(1);
    }
    if let Some(caps) = patterns::NUMBERED_HEADING.captures(trimmed) {
        let numbering = &caps[1];
        let title = caps[2].trim();
        let dotted = numbering.contains('.');
        // A single-level number also opens ordinary list items; only treat
        // it as a heading when the title reads like one.
        let title_like = title.chars().next().is_some_and(|c| c.is_uppercase())
            && title.split_whitespace().count() <= 8
            && !title.ends_with(['.', ',', ';']);
        if dotted || title_like {
            let depth = numbering.matches('.').count() as u8 + 1;
            return Some(depth.min(6));
        }
    }
    if patterns::BOLD_LINE.is_match(trimmed) {
        return Some(3);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_page_numbers_thread_through() {
        let text = "--- Page 1 ---\nfirst page line\n--- Page 2 ---\nsecond page line";
        let out = PdfTextExtractor.extract(text, "paper.pdf");
        assert_eq!(out.line_meta[1].page_number, Some(1));
        assert_eq!(out.line_meta[3].page_number, Some(2));
        // Marker lines are blanked, not removed.
        assert_eq!(out.text.lines().count(), 4);
        assert_eq!(out.text.lines().next(), Some(""));
    }

    #[test]
    fn test_pdf_all_caps_heading() {
        let out = PdfTextExtractor.extract("EXECUTIVE SUMMARY\nBody text here.", "r.pdf");
        assert_eq!(out.line_meta[0].heading_level, Some(1));
        assert_eq!(out.line_meta[1].heading_level, None);
    }

    #[test]
    fn test_pdf_numbered_heading_depth() {
        assert_eq!(pseudo_heading_level("2 Results"), Some(1));
        assert_eq!(pseudo_heading_level("2.1 Detail"), Some(2));
        assert_eq!(pseudo_heading_level("2.1.3 More detail"), Some(3));
    }

    #[test]
    fn test_pdf_bold_pseudo_heading() {
        assert_eq!(pseudo_heading_level("**Methods**"), Some(3));
        assert_eq!(pseudo_heading_level("**bold** in context"), None);
    }

    #[test]
    fn test_pdf_no_markers_is_plain() {
        let out = PdfTextExtractor.extract("just a paragraph.", "p.pdf");
        assert_eq!(out.text, "just a paragraph.");
        assert_eq!(out.line_meta[0].page_number, None);
    }
}
