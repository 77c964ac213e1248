//! Line scanner for documents without semantic structure
//!
//! Headings are recognized by literal prefixes, consecutive list-marker
//! lines are grouped into one list, and a `SUMARIO` line collects the
//! following heading lines as summary entries until a blank or non-heading
//! line.
//! The Roman numeral table stops at X: `TÍTULO XI` is an ordinary
//! paragraph, and stored content relies on that.

use std::sync::OnceLock;

use regex_lite::Regex;

use super::fragment::{slugify, Fragment, HeadingKind, ListEntry, NoticeKind, Resolution, SummaryEntry};
use super::numbering::NumberStyle;

const ROMAN_TABLE: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

struct Patterns {
    headings: Vec<(Regex, LineKind)>,
    roman_item: Regex,
    arabic_item: Regex,
    alpha_item: Regex,
    summary: Regex,
}

#[derive(Debug, Clone, Copy)]
enum LineKind {
    Heading(HeadingKind),
    Notice(NoticeKind),
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Longest numeral first so alternation prefers VIII over V
        let roman = ROMAN_TABLE.iter().rev().copied().collect::<Vec<_>>().join("|");
        let compile = |pattern: String| Regex::new(&pattern).expect("legacy pattern must compile");

        Patterns {
            headings: vec![
                (
                    compile(format!(r"^TÍTULO\s+({roman})\b\s*[-.:]?\s*(.*)$")),
                    LineKind::Heading(HeadingKind::Titulo),
                ),
                (
                    compile(format!(r"^Capítulo\s+({roman})\b\s*[-.:]?\s*(.*)$")),
                    LineKind::Heading(HeadingKind::Capitulo),
                ),
                (
                    compile(format!(r"^Sección\s+({roman})\b\s*[-.:]?\s*(.*)$")),
                    LineKind::Heading(HeadingKind::Seccion),
                ),
                (
                    compile(r"^Artículo\s+(\d+)\b\s*[-.:]?\s*(.*)$".to_string()),
                    LineKind::Heading(HeadingKind::Articulo),
                ),
                (
                    compile(r"^DISPOSICIÓN\s+(BOGS/\d{4}/\d{3})\b\s*[-.:]?\s*(.*)$".to_string()),
                    LineKind::Notice(NoticeKind::Disposicion),
                ),
                (
                    compile(r"^Edicto\s+(BOGS/\d{4}/\d{3})\b\s*[-.:]?\s*(.*)$".to_string()),
                    LineKind::Notice(NoticeKind::Edicto),
                ),
            ],
            roman_item: compile(format!(r"^({roman})\.\s+(.+)$")),
            arabic_item: compile(r"^(\d+)\.\s+(.+)$".to_string()),
            alpha_item: compile(r"^([A-Z])\.\s+(.+)$".to_string()),
            summary: compile(r"^SUMARIO:?$".to_string()),
        }
    })
}

/// Recognize a heading line, returning the fragment it renders to
fn match_heading(line: &str) -> Option<Fragment> {
    let patterns = patterns();
    patterns.headings.iter().find_map(|(re, kind)| {
        let caps = re.captures(line)?;
        let key = caps.get(1)?.as_str().to_string();
        let text = caps.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default();

        Some(match kind {
            LineKind::Heading(kind) => Fragment::Heading {
                kind: *kind,
                anchor: format!("{}-{}", kind.slug(), slugify(&key)),
                numero: Some(key),
                text,
            },
            LineKind::Notice(kind) => Fragment::Notice {
                kind: *kind,
                anchor: slugify(&key),
                reference: Some(key),
                text,
            },
        })
    })
}

/// Recognize a list item line: marker, style and text
fn match_list_item(line: &str) -> Option<(NumberStyle, String, String)> {
    let patterns = patterns();
    [
        (&patterns.roman_item, NumberStyle::Roman),
        (&patterns.arabic_item, NumberStyle::Arabic),
        (&patterns.alpha_item, NumberStyle::Alpha),
    ]
    .into_iter()
    .find_map(|(re, style)| {
        let caps = re.captures(line)?;
        Some((
            style,
            caps.get(1)?.as_str().to_string(),
            caps.get(2)?.as_str().trim().to_string(),
        ))
    })
}

#[derive(Default)]
struct Scanner {
    fragments: Vec<Fragment>,
    list: Option<(NumberStyle, Vec<ListEntry>)>,
    summary: Option<Vec<SummaryEntry>>,
}

impl Scanner {
    fn flush_list(&mut self) {
        if let Some((style, items)) = self.list.take() {
            self.fragments.push(Fragment::List { style, items });
        }
    }

    fn flush_summary(&mut self) {
        if let Some(entries) = self.summary.take() {
            self.fragments.push(Fragment::Summary {
                title: Some("SUMARIO".to_string()),
                entries,
            });
        }
    }

    fn line(&mut self, raw: &str) {
        let line = raw.trim();

        if line.is_empty() {
            self.flush_list();
            self.flush_summary();
            self.fragments.push(Fragment::Break);
            return;
        }

        if let Some(entries) = self.summary.as_mut() {
            if let Some(anchor) = match_heading(line).as_ref().and_then(Fragment::anchor) {
                entries.push(SummaryEntry {
                    text: line.to_string(),
                    target: anchor.to_string(),
                    resolution: Resolution::Heading,
                });
                return;
            }
            // Any other line closes the summary and is scanned as usual
            self.flush_summary();
        }

        if patterns().summary.is_match(line) {
            self.flush_list();
            self.summary = Some(Vec::new());
            return;
        }

        if let Some(heading) = match_heading(line) {
            self.flush_list();
            self.fragments.push(heading);
            return;
        }

        if let Some((style, marker, text)) = match_list_item(line) {
            let (_, items) = self.list.get_or_insert_with(|| (style, Vec::new()));
            items.push(ListEntry { marker, text });
            return;
        }

        self.flush_list();
        self.fragments.push(Fragment::paragraph(line));
    }

    fn finish(mut self) -> Vec<Fragment> {
        self.flush_list();
        self.flush_summary();
        self.fragments
    }
}

/// Scan plain-text content into fragments
pub fn parse_legacy(content: &str) -> Vec<Fragment> {
    let mut scanner = Scanner::default();
    for line in content.lines() {
        scanner.line(line);
    }
    scanner.finish()
}
