use crate::models::{LineMeta, SkippedElement, SkippedKind, SourceFormat};
use crate::processing::patterns;

/// Result of format-specific extraction: cleaned text, one `LineMeta` per
/// cleaned line, and the non-text elements that were stripped.
#[derive(Debug, Default)]
pub struct ExtractedDocument {
    pub text: String,
    pub line_meta: Vec<LineMeta>,
    pub skipped: Vec<SkippedElement>,
}

/// Format-specific extraction. Never errors: unrecognized markup degrades
/// to plain paragraph text.
pub trait Extractor: Send + Sync {
    fn extract(&self, text: &str, filename: &str) -> ExtractedDocument;
}

pub mod docx;
pub mod markdown;
pub mod pdf;
pub mod text;

pub use docx::DocxTextExtractor;
pub use markdown::MarkdownExtractor;
pub use pdf::PdfTextExtractor;
pub use text::PlainTextExtractor;

/// Routes documents to the appropriate extractor based on `SourceFormat`.
/// Stores owned instances and returns trait object references for dispatch.
#[derive(Default)]
pub struct ExtractorRegistry {
    markdown: MarkdownExtractor,
    pdf: PdfTextExtractor,
    docx: DocxTextExtractor,
    text: PlainTextExtractor,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extractor_for(&self, format: SourceFormat) -> &dyn Extractor {
        match format {
            SourceFormat::Markdown => &self.markdown,
            SourceFormat::Pdf => &self.pdf,
            SourceFormat::Docx => &self.docx,
            SourceFormat::Text | SourceFormat::Unknown => &self.text,
        }
    }
}

pub(crate) fn skipped_kind_from_tag(tag: &str) -> SkippedKind {
    match tag.to_ascii_uppercase().as_str() {
        "IMAGE" => SkippedKind::Image,
        "AUDIO" => SkippedKind::Audio,
        "VIDEO" => SkippedKind::Video,
        "CHART" => SkippedKind::Chart,
        "DRAWING" => SkippedKind::Drawing,
        "EQUATION" => SkippedKind::Equation,
        _ => SkippedKind::EmbeddedObject,
    }
}

fn kind_for_html_tag(fragment: &str) -> SkippedKind {
    let lower = fragment.to_ascii_lowercase();
    if lower.starts_with("<img") || lower.starts_with("<svg") {
        SkippedKind::Image
    } else if lower.starts_with("<audio") {
        SkippedKind::Audio
    } else if lower.starts_with("<video") {
        SkippedKind::Video
    } else {
        SkippedKind::EmbeddedObject
    }
}

/// Strip inline non-text elements from a single line, recording what was
/// removed. Shared by all extractors; format-specific markers (converter
/// placeholders, page breaks) are handled by each extractor before calling
/// this.
pub(crate) fn strip_inline_media(
    line: &str,
    line_no: usize,
    skipped: &mut Vec<SkippedElement>,
) -> String {
    let mut cleaned = line.to_string();

    for caps in patterns::MD_IMAGE.captures_iter(line) {
        let alt = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        skipped.push(SkippedElement {
            kind: SkippedKind::Image,
            line: line_no,
            description: (!alt.is_empty()).then(|| alt.to_string()),
        });
    }
    cleaned = patterns::MD_IMAGE.replace_all(&cleaned, "").into_owned();

    for m in patterns::HTML_MEDIA.find_iter(&cleaned.clone()) {
        skipped.push(SkippedElement {
            kind: kind_for_html_tag(m.as_str()),
            line: line_no,
            description: None,
        });
    }
    cleaned = patterns::HTML_MEDIA.replace_all(&cleaned, "").into_owned();

    if patterns::DATA_URI.is_match(&cleaned) {
        for m in patterns::DATA_URI.find_iter(&cleaned.clone()) {
            let kind = if m.as_str().starts_with("data:image") {
                SkippedKind::Image
            } else if m.as_str().starts_with("data:audio") {
                SkippedKind::Audio
            } else {
                SkippedKind::Video
            };
            skipped.push(SkippedElement {
                kind,
                line: line_no,
                description: None,
            });
        }
        cleaned = patterns::DATA_URI.replace_all(&cleaned, "").into_owned();
    }

    cleaned
}

/// Fill bullet / numbered list hints for a line. Shared by every format.
pub(crate) fn apply_list_meta(line: &str, meta: &mut LineMeta) {
    use crate::models::ListType;

    if let Some(caps) = patterns::BULLET_ITEM.captures(line) {
        meta.in_list = true;
        meta.list_type = Some(ListType::Bullet);
        meta.indent = caps[1].len();
    } else if let Some(caps) = patterns::NUMBERED_ITEM.captures(line) {
        meta.in_list = true;
        meta.list_type = Some(ListType::Numbered);
        meta.indent = caps[1].len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_routes_by_format() {
        let registry = ExtractorRegistry::new();
        let md = registry.extractor_for(SourceFormat::Markdown);
        let out = md.extract("# Title\n\nBody", "doc.md");
        assert_eq!(out.line_meta.len(), out.text.lines().count());

        let fallback = registry.extractor_for(SourceFormat::Unknown);
        let out = fallback.extract("plain text", "data.bin");
        assert_eq!(out.text, "plain text");
    }

    #[test]
    fn test_strip_inline_media_records_image() {
        let mut skipped = Vec::new();
        let cleaned = strip_inline_media("before ![logo](a.png) after", 4, &mut skipped);
        assert_eq!(cleaned, "before  after");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].kind, SkippedKind::Image);
        assert_eq!(skipped[0].line, 4);
        assert_eq!(skipped[0].description.as_deref(), Some("logo"));
    }

    #[test]
    fn test_strip_inline_media_html_and_data_uri() {
        let mut skipped = Vec::new();
        let cleaned = strip_inline_media(
            "<img src=\"x.png\"/> text data:image/png;base64,AAAA",
            0,
            &mut skipped,
        );
        assert!(!cleaned.contains("<img"));
        assert!(!cleaned.contains("base64"));
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|s| s.kind == SkippedKind::Image));
    }

    #[test]
    fn test_skipped_kind_from_tag() {
        assert_eq!(skipped_kind_from_tag("IMAGE"), SkippedKind::Image);
        assert_eq!(skipped_kind_from_tag("chart"), SkippedKind::Chart);
        assert_eq!(skipped_kind_from_tag("OLE"), SkippedKind::EmbeddedObject);
    }

    #[test]
    fn test_extractors_never_fail_on_garbage() {
        let registry = ExtractorRegistry::new();
        let garbage = "\u{0}\u{1}\u{2} ``` | ] [ ![(\n\n#\n";
        for format in [
            SourceFormat::Markdown,
            SourceFormat::Pdf,
            SourceFormat::Docx,
            SourceFormat::Text,
        ] {
            let out = registry.extractor_for(format).extract(garbage, "x");
            assert_eq!(out.line_meta.len(), out.text.lines().count());
        }
    }
}
