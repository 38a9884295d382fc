use crate::models::LineMeta;
use crate::processing::patterns;

use super::{apply_list_meta, strip_inline_media, ExtractedDocument, Extractor};

/// Extractor for markdown sources. Tracks code-fence membership so fenced
/// content is never mistaken for markup, and emits heading/list/quote hints
/// per line.
#[derive(Default)]
pub struct MarkdownExtractor;

impl Extractor for MarkdownExtractor {
    fn extract(&self, text: &str, _filename: &str) -> ExtractedDocument {
        let mut out = ExtractedDocument::default();
        let mut cleaned_lines: Vec<String> = Vec::new();

        let mut in_code = false;
        let mut fence_marker = String::new();
        let mut code_language: Option<String> = None;

        for (line_no, line) in text.lines().enumerate() {
            let mut meta = LineMeta::default();

            if let Some(caps) = patterns::CODE_FENCE.captures(line) {
                let marker = caps[1].to_string();
                if in_code {
                    // Only the matching fence style closes the block.
                    if marker.starts_with(&fence_marker[..1]) && marker.len() >= fence_marker.len()
                    {
                        meta.in_code_block = true;
                        meta.code_language = code_language.clone();
                        out.line_meta.push(meta);
                        cleaned_lines.push(line.to_string());
                        in_code = false;
                        code_language = None;
                        continue;
                    }
                } else {
                    in_code = true;
                    fence_marker = marker;
                    let lang = caps[2].trim();
                    code_language = (!lang.is_empty()).then(|| lang.to_string());
                    meta.in_code_block = true;
                    meta.code_language = code_language.clone();
                    out.line_meta.push(meta);
                    cleaned_lines.push(line.to_string());
                    continue;
                }
            }

            if in_code {
                meta.in_code_block = true;
                meta.code_language = code_language.clone();
                out.line_meta.push(meta);
                cleaned_lines.push(line.to_string());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_heading_meta() {
        let out = MarkdownExtractor.extract("# Top\n\n## Sub\n\nbody", "doc.md");
        assert_eq!(out.line_meta[0].heading_level, Some(1));
        assert_eq!(out.line_meta[2].heading_level, Some(2));
        assert_eq!(out.line_meta[4].heading_level, None);
    }

    #[test]
    fn test_markdown_code_fence_tracking() {
        let md = "```rust\nfn main() {}\n```\nafter";
        let out = MarkdownExtractor.extract(md, "doc.md");
        assert!(out.line_meta[0].in_code_block);
        assert!(out.line_meta[1].in_code_block);
        assert_eq!(out.line_meta[1].code_language.as_deref(), Some("rust"));
        assert!(out.line_meta[2].in_code_block);
        assert!(!out.line_meta[3].in_code_block);
    }

    #[test]
    fn test_markdown_image_inside_fence_untouched() {
        let md = "```\n![not an image](x.png)\n```";
        let out = MarkdownExtractor.extract(md, "doc.md");
        assert!(out.text.contains("![not an image](x.png)"));
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn test_markdown_image_outside_fence_stripped() {
        let out = MarkdownExtractor.extract("intro ![fig](f.png)\n", "doc.md");
        assert!(!out.text.contains("fig"));
        assert_eq!(out.skipped.len(), 1);
    }

    #[test]
    fn test_markdown_unclosed_fence_degrades() {
        let md = "```python\nprint('hi')";
        let out = MarkdownExtractor.extract(md, "doc.md");
        assert_eq!(out.line_meta.len(), 2);
        assert!(out.line_meta[1].in_code_block);
    }
}
