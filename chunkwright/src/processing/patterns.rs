//! Compiled-once pattern library shared by the extractors, recognizer,
//! noise filter and API detector.

use std::sync::LazyLock;

use regex::Regex;

fn compile(pattern: &str) -> Regex {
    // Patterns are all literals defined in this file; a failure here is a
    // programming error, not an input error.
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid builtin pattern {pattern:?}: {e}"))
}

// ── Non-text elements ────────────────────────────────────────────

/// Markdown inline image, including base64 data URIs.
pub static MD_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"!\[([^\]]*)\]\(([^)]*)\)"));

/// HTML media tags that carry no extractable text. Paired tags are matched
/// through their closing tag; void tags on their own.
pub static HTML_MEDIA: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?is)<(?:video|audio|iframe|object|svg)\b[^>]*>.*?</(?:video|audio|iframe|object|svg)>|<(?:img|embed)\b[^>]*/?>",
    )
});

/// Inline base64 payloads outside of tags (pasted data URIs).
pub static DATA_URI: LazyLock<Regex> =
    LazyLock::new(|| compile(r"data:(image|audio|video)/[a-zA-Z0-9.+-]+;base64,[A-Za-z0-9+/=]+"));

/// Post-conversion placeholders emitted by DOCX/PPT converters.
pub static CONVERTER_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)^\s*\[(IMAGE|CHART|DRAWING|EQUATION|OBJECT|AUDIO|VIDEO)\s*[::]?\s*([^\]]*)\]\s*$")
});

/// Page boundary marker inserted by PDF-to-text conversion.
pub static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^\s*-{2,}\s*Page\s+(\d+)\s*-{2,}\s*$"));

// ── Headings ─────────────────────────────────────────────────────

/// ATX heading: `## Title`.
pub static ATX_HEADING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(#{1,6})\s+(.+?)\s*#*\s*$"));

/// Setext underline (`===` or `---`) under a text line.
pub static SETEXT_UNDERLINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(={3,}|-{3,})\s*$"));

/// Numbered section heading: `2.1 Installation`, `3) Usage`.
pub static NUMBERED_HEADING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\d{1,2}(?:\.\d{1,2}){0,4})[.)]?\s+(\S.{0,120})$"));

/// A whole line rendered bold, used by PDF conversions as a pseudo-heading.
pub static BOLD_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\*\*([^*]{2,120})\*\*$"));

// ── Multi-line structures ────────────────────────────────────────

/// Code fence open/close, with optional language tag on the opener.
pub static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*(`{3,}|~{3,})\s*([A-Za-z0-9_+#.-]*)\s*$"));

/// A pipe-delimited table row.
pub static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*\|.*\|\s*$"));

/// The header/body separator row of a markdown table.
pub static TABLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*\|?\s*:?-{2,}:?\s*(\|\s*:?-{2,}:?\s*)*\|?\s*$"));

/// Bullet list item with captured indent.
pub static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\s*)[-*+]\s+(.+)$"));

/// Numbered list item with captured indent.
pub static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(\s*)\d{1,3}[.)]\s+(.+)$"));

/// Question marker opening a Q&A pair.
pub static QUESTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*(?:Q\d*|Question\s*\d*|问(?:题)?\s*\d*)\s*[::.．]\s*(.+)$"));

/// Answer marker closing a Q&A pair.
pub static ANSWER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*(?:A\d*|Answer\s*\d*|答(?:案)?\s*\d*)\s*[::.．]\s*(.+)$"));

// ── Single-line structures ───────────────────────────────────────

/// Blockquote line.
pub static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| compile(r"^\s*>\s?(.*)$"));

/// Key: value definition line. Keys are short; long prose with a colon in
/// the middle stays a paragraph.
pub static DEFINITION_LINE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*([\w\p{Han} ./-]{1,40}?)\s*[::]\s+(\S.*)$"));

/// Flow / conditional statement lead words.
pub static FLOW_LINE: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)^\s*(if\b|when\b|then\b|otherwise\b|step\s*\d+|如果|若|当|则|否则|步骤\s*\d*)",
    )
});

/// Horizontal rule.
pub static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^\s*(-{3,}|\*{3,}|_{3,})\s*$"));

// ── Noise ────────────────────────────────────────────────────────

/// A line that is only a page number, bare or dash-framed.
pub static PAGE_NUMBER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^\s*(?:page\s+)?\d{1,4}\s*$|^\s*[-–—]\s*\d{1,4}\s*[-–—]\s*$"));

/// TOC heading text.
pub static TOC_HEADING: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^\s*(table\s+of\s+contents|contents|目录)\s*$"));

/// A TOC entry: title, dot/space leader, page number.
pub static TOC_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^(.{1,80}?)[.·…\s]{3,}(\d{1,4})\s*$"));

/// Copyright / confidentiality boilerplate.
pub static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)(copyright|©|all\s+rights\s+reserved|confidential|proprietary|版权所有|保密|机密)")
});

// ── API documentation ────────────────────────────────────────────

/// HTTP method plus path: `GET /users`, `POST: /users`.
pub static HTTP_ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?m)^\s*(?:\*\*)?(GET|POST|PUT|DELETE|PATCH|HEAD|OPTIONS)(?:\*\*)?\s*[::]?\s+(/\S*)")
});

/// Weak-semantic lead-in: a short paragraph that only points at what comes
/// next.
pub static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)(as\s+follows|(?:as\s+)?shown\s+below|see\s+(?:the\s+)?examples?(?:\s+below)?|for\s+example|如下|如下所示|参见示例|示例如下|例如)\s*[::]?\s*$")
});

/// Whether a line is an ALL-CAPS pseudo-heading: mostly uppercase letters,
/// short, with at least two alphabetic characters.
pub fn is_all_caps_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.len() < 3 || trimmed.len() > 80 {
        return false;
    }
    let letters: Vec<char> = trimmed.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() < 2 {
        return false;
    }
    letters.iter().all(|c| c.is_uppercase())
        && trimmed
            .chars()
            .all(|c| c.is_uppercase() || c.is_numeric() || " \t-_:,.&/()".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atx_heading_levels() {
        let caps = ATX_HEADING.captures("### Usage ###").unwrap();
        assert_eq!(&caps[1], "###");
        assert_eq!(&caps[2], "Usage");
        assert!(ATX_HEADING.captures("####### too deep").is_none());
    }

    #[test]
    fn test_page_marker() {
        let caps = PAGE_MARKER.captures("--- Page 12 ---").unwrap();
        assert_eq!(&caps[1], "12");
        assert!(PAGE_MARKER.is_match("---- page 3 ----"));
        assert!(!PAGE_MARKER.is_match("Page 12"));
    }

    #[test]
    fn test_converter_placeholder() {
        let caps = CONVERTER_PLACEHOLDER.captures("[IMAGE: logo.png]").unwrap();
        assert_eq!(&caps[1], "IMAGE");
        assert_eq!(caps[2].trim(), "logo.png");
        assert!(CONVERTER_PLACEHOLDER.is_match("[CHART]"));
        assert!(!CONVERTER_PLACEHOLDER.is_match("[NOTE: read this]"));
    }

    #[test]
    fn test_table_separator() {
        assert!(TABLE_SEPARATOR.is_match("|---|---|"));
        assert!(TABLE_SEPARATOR.is_match("| :--- | ---: |"));
        assert!(!TABLE_SEPARATOR.is_match("| a | b |"));
    }

    #[test]
    fn test_endpoint_pattern() {
        let caps = HTTP_ENDPOINT.captures("GET /users").unwrap();
        assert_eq!(&caps[1], "GET");
        assert_eq!(&caps[2], "/users");
        assert!(HTTP_ENDPOINT.is_match("POST: /users/{id}/orders"));
        assert!(HTTP_ENDPOINT.is_match("**DELETE** /sessions"));
        assert!(!HTTP_ENDPOINT.is_match("GETTING started"));
    }

    #[test]
    fn test_toc_entry() {
        let caps = TOC_ENTRY.captures("Introduction ........ 3").unwrap();
        assert_eq!(caps[1].trim(), "Introduction");
        assert_eq!(&caps[2], "3");
        assert!(TOC_ENTRY.is_match("第一章 概述 ………… 12"));
    }

    #[test]
    fn test_all_caps_heading() {
        assert!(is_all_caps_heading("EXECUTIVE SUMMARY"));
        assert!(is_all_caps_heading("CHAPTER 2: RESULTS"));
        assert!(!is_all_caps_heading("Executive Summary"));
        assert!(!is_all_caps_heading("A"));
        assert!(!is_all_caps_heading("42"));
    }

    #[test]
    fn test_qa_markers() {
        assert!(QUESTION_MARKER.is_match("Q1: How do I install?"));
        assert!(QUESTION_MARKER.is_match("问:如何安装?"));
        assert!(ANSWER_MARKER.is_match("A1: Run the installer."));
        assert!(ANSWER_MARKER.is_match("答:运行安装程序。"));
    }

    #[test]
    fn test_lead_in() {
        assert!(LEAD_IN.is_match("The parameters are as follows:"));
        assert!(LEAD_IN.is_match("请求参数如下:"));
        assert!(!LEAD_IN.is_match("This paragraph explains the design in detail."));
    }

    #[test]
    fn test_definition_line() {
        let caps = DEFINITION_LINE.captures("timeout: 30 seconds").unwrap();
        assert_eq!(&caps[1], "timeout");
        assert!(DEFINITION_LINE.is_match("超时时间: 30秒"));
    }
}
