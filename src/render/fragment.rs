//! Display fragments produced by the renderers

use super::numbering::NumberStyle;

/// Placeholder shown for elements with nothing to display
pub const EMPTY_CONTENT: &str = "Sin contenido";

/// Heading levels of a legal document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    Titulo,
    Capitulo,
    Seccion,
    Articulo,
    Subtitulo,
}

impl HeadingKind {
    pub fn level(&self) -> u8 {
        match self {
            HeadingKind::Titulo => 1,
            HeadingKind::Capitulo => 2,
            HeadingKind::Seccion => 3,
            HeadingKind::Articulo => 4,
            HeadingKind::Subtitulo => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HeadingKind::Titulo => "TÍTULO",
            HeadingKind::Capitulo => "CAPÍTULO",
            HeadingKind::Seccion => "Sección",
            HeadingKind::Articulo => "Artículo",
            HeadingKind::Subtitulo => "",
        }
    }

    /// Anchor prefix
    pub fn slug(&self) -> &'static str {
        match self {
            HeadingKind::Titulo => "titulo",
            HeadingKind::Capitulo => "capitulo",
            HeadingKind::Seccion => "seccion",
            HeadingKind::Articulo => "articulo",
            HeadingKind::Subtitulo => "subtitulo",
        }
    }
}

/// Referenced publications embedded in a bulletin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Disposicion,
    Edicto,
    Noticia,
}

impl NoticeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NoticeKind::Disposicion => "DISPOSICIÓN",
            NoticeKind::Edicto => "Edicto",
            NoticeKind::Noticia => "Noticia",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            NoticeKind::Disposicion => "disposicion",
            NoticeKind::Edicto => "edicto",
            NoticeKind::Noticia => "noticia",
        }
    }
}

/// One list item with its resolved marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    pub marker: String,
    pub text: String,
}

/// Which rule produced a summary link target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The item named its target id
    ExplicitId,
    /// The item's reference equals a sibling's reference
    Reference,
    /// The item's text overlaps a sibling's text
    TextMatch,
    /// A heading line of a plain-text document
    Heading,
    /// Nothing matched; slug of the item text
    Slug,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub text: String,
    pub target: String,
    pub resolution: Resolution,
}

/// A rendered piece of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Heading {
        kind: HeadingKind,
        numero: Option<String>,
        text: String,
        anchor: String,
    },

    Paragraph {
        text: String,
        class: Option<String>,
    },

    /// Blank line in a plain-text document
    Break,

    List {
        style: NumberStyle,
        items: Vec<ListEntry>,
    },

    /// Table of contents linking to anchors in the same document
    Summary {
        title: Option<String>,
        entries: Vec<SummaryEntry>,
    },

    Metadata {
        fields: Vec<(String, String)>,
    },

    Notice {
        kind: NoticeKind,
        reference: Option<String>,
        text: String,
        anchor: String,
    },
}

impl Fragment {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Fragment::Paragraph {
            text: text.into(),
            class: None,
        }
    }

    pub fn empty() -> Self {
        Self::paragraph(EMPTY_CONTENT)
    }

    /// Link target of this fragment, if it can be linked to
    pub fn anchor(&self) -> Option<&str> {
        match self {
            Fragment::Heading { anchor, .. } | Fragment::Notice { anchor, .. } => Some(anchor.as_str()),
            _ => None,
        }
    }
}

/// Lowercase ASCII slug: accents folded, runs of other characters become `-`
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };

        if c.is_ascii_alphanumeric() {
            if dash && !slug.is_empty() {
                slug.push('-');
            }
            dash = false;
            slug.push(c);
        } else {
            dash = true;
        }
    }

    if slug.is_empty() {
        "seccion".to_string()
    } else {
        slug
    }
}

/// Plain-text rendering for terminals
pub fn to_plain_text(fragments: &[Fragment]) -> String {
    let mut lines: Vec<String> = Vec::new();

    for fragment in fragments {
        match fragment {
            Fragment::Heading {
                kind, numero, text, ..
            } => {
                let mut line = kind.label().to_string();
                if let Some(numero) = numero {
                    if !line.is_empty() {
                        line.push(' ');
                    }
                    line.push_str(numero);
                }
                if !text.is_empty() {
                    if !line.is_empty() {
                        line.push_str(". ");
                    }
                    line.push_str(text);
                }
                lines.push(line);
            }
            Fragment::Paragraph { text, .. } => lines.push(text.clone()),
            Fragment::Break => lines.push(String::new()),
            Fragment::List { style, items } => {
                for item in items {
                    match style {
                        NumberStyle::Bullet if item.marker == "•" => {
                            lines.push(format!("  • {}", item.text))
                        }
                        _ => lines.push(format!("  {}. {}", item.marker, item.text)),
                    }
                }
            }
            Fragment::Summary { title, entries } => {
                lines.push(title.clone().unwrap_or_else(|| "SUMARIO".to_string()));
                for entry in entries {
                    lines.push(format!("  - {} (#{})", entry.text, entry.target));
                }
            }
            Fragment::Metadata { fields } => {
                for (label, value) in fields {
                    lines.push(format!("{}: {}", label, value));
                }
            }
            Fragment::Notice {
                kind,
                reference,
                text,
                ..
            } => {
                match reference {
                    Some(reference) => lines.push(format!("{} {}", kind.label(), reference)),
                    None => lines.push(kind.label().to_string()),
                }
                if !text.is_empty() {
                    lines.push(text.clone());
                }
            }
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Artículo 1. Objeto"), "articulo-1-objeto");
        assert_eq!(slugify("BOGS/2025/001"), "bogs-2025-001");
        assert_eq!(slugify("  ¿Qué?  "), "que");
        assert_eq!(slugify("!!!"), "seccion");
    }

    #[test]
    fn test_plain_text() {
        let fragments = vec![
            Fragment::Heading {
                kind: HeadingKind::Titulo,
                numero: Some("I".into()),
                text: "Disposiciones generales".into(),
                anchor: "titulo-i".into(),
            },
            Fragment::Break,
            Fragment::List {
                style: NumberStyle::Alpha,
                items: vec![ListEntry {
                    marker: "A".into(),
                    text: "Primero".into(),
                }],
            },
        ];

        assert_eq!(
            to_plain_text(&fragments),
            "TÍTULO I. Disposiciones generales\n\n  A. Primero"
        );
    }
}
