//! Rendering of semantic structure elements
//!
//! Every element kind has a builder; anything unrecognized goes through the
//! paragraph builder. Builders never fail: missing or oddly shaped fields
//! degrade to [`EMPTY_CONTENT`].

use serde_json::{Map, Value};

use crate::core::document::{non_empty_str, scalar_string, ElementKind, StructureElement};

use super::fragment::{
    slugify, Fragment, HeadingKind, ListEntry, NoticeKind, Resolution, SummaryEntry, EMPTY_CONTENT,
};
use super::numbering::NumberStyle;

/// Render a structure element sequence in order
pub fn render_structure(elements: &[StructureElement]) -> Vec<Fragment> {
    let anchors: Vec<String> = elements
        .iter()
        .enumerate()
        .map(|(index, element)| element_anchor(element, index))
        .collect();

    // Summaries link into the rest, so everything else renders first
    let mut fragments: Vec<Option<Fragment>> = elements
        .iter()
        .zip(&anchors)
        .map(|(element, anchor)| match element.kind() {
            ElementKind::Sumario => None,
            ElementKind::Titulo => Some(heading(element, HeadingKind::Titulo, anchor)),
            ElementKind::Capitulo => Some(heading(element, HeadingKind::Capitulo, anchor)),
            ElementKind::Seccion => Some(heading(element, HeadingKind::Seccion, anchor)),
            ElementKind::Articulo => Some(heading(element, HeadingKind::Articulo, anchor)),
            ElementKind::Subtitulo => Some(heading(element, HeadingKind::Subtitulo, anchor)),
            ElementKind::Disposicion => Some(notice(element, NoticeKind::Disposicion, anchor)),
            ElementKind::Edicto => Some(notice(element, NoticeKind::Edicto, anchor)),
            ElementKind::Noticia => Some(notice(element, NoticeKind::Noticia, anchor)),
            ElementKind::Lista => Some(list(element)),
            ElementKind::Metadata => Some(metadata(element)),
            ElementKind::Parrafo | ElementKind::Unknown => Some(paragraph(element)),
        })
        .collect();

    // Only elements that rendered with an anchor can be linked to
    let targets: Vec<Target<'_>> = elements
        .iter()
        .zip(&fragments)
        .filter_map(|(element, fragment)| {
            let anchor = fragment.as_ref()?.anchor()?;
            Some(Target {
                element,
                anchor: anchor.to_string(),
            })
        })
        .collect();

    for (element, slot) in elements.iter().zip(fragments.iter_mut()) {
        if slot.is_none() {
            *slot = Some(summary(element, &targets));
        }
    }

    fragments.into_iter().flatten().collect()
}

/// A linkable sibling of a summary
struct Target<'a> {
    element: &'a StructureElement,
    anchor: String,
}

fn kind_slug(element: &StructureElement) -> &'static str {
    match element.kind() {
        ElementKind::Titulo => "titulo",
        ElementKind::Capitulo => "capitulo",
        ElementKind::Seccion => "seccion",
        ElementKind::Articulo => "articulo",
        ElementKind::Subtitulo => "subtitulo",
        ElementKind::Disposicion => "disposicion",
        ElementKind::Edicto => "edicto",
        ElementKind::Noticia => "noticia",
        ElementKind::Sumario => "sumario",
        ElementKind::Lista => "lista",
        ElementKind::Parrafo => "parrafo",
        ElementKind::Metadata => "metadata",
        ElementKind::Unknown => "elemento",
    }
}

/// Anchor id: explicit `id`, then kind + `numero`, then the reference, then position
pub fn element_anchor(element: &StructureElement, index: usize) -> String {
    if let Some(id) = element.id() {
        return id.to_string();
    }
    let prefix = kind_slug(element);
    if let Some(numero) = element.numero() {
        return format!("{}-{}", prefix, slugify(&numero));
    }
    if let Some(reference) = element.referencia() {
        return slugify(reference);
    }
    format!("{}-{}", prefix, index + 1)
}

fn heading(element: &StructureElement, kind: HeadingKind, anchor: &str) -> Fragment {
    let numero = element.numero();
    let text = element.text().map(str::to_string);

    if numero.is_none() && text.is_none() {
        return Fragment::empty();
    }

    Fragment::Heading {
        kind,
        numero,
        text: text.unwrap_or_default(),
        anchor: anchor.to_string(),
    }
}

fn notice(element: &StructureElement, kind: NoticeKind, anchor: &str) -> Fragment {
    let reference = element.referencia().map(str::to_string);
    let text = element
        .text()
        .map(str::to_string)
        .or_else(|| element.numero());

    if reference.is_none() && text.is_none() {
        return Fragment::empty();
    }

    Fragment::Notice {
        kind,
        reference,
        text: text.unwrap_or_default(),
        anchor: anchor.to_string(),
    }
}

fn paragraph(element: &StructureElement) -> Fragment {
    let text = element.text().map(str::to_string).or_else(|| {
        // Paragraphs given as a list of lines
        let lines: Vec<&str> = element
            .items()?
            .iter()
            .filter_map(Value::as_str)
            .filter(|s| !s.trim().is_empty())
            .collect();
        (!lines.is_empty()).then(|| lines.join(" "))
    });

    Fragment::Paragraph {
        text: text.unwrap_or_else(|| EMPTY_CONTENT.to_string()),
        class: element.class().map(str::to_string),
    }
}

fn list(element: &StructureElement) -> Fragment {
    let Some(items) = element.items().filter(|items| !items.is_empty()) else {
        return Fragment::empty();
    };

    let style = element
        .style()
        .or_else(|| element.class())
        .map(NumberStyle::from_declared)
        .unwrap_or_default();

    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let (numero, text) = match item {
                Value::Object(map) => (
                    map.get("numero").and_then(scalar_string),
                    item_text(map).map(str::to_string),
                ),
                other => (None, scalar_string(other)),
            };
            ListEntry {
                marker: numero.unwrap_or_else(|| style.marker(i + 1)),
                text: text.unwrap_or_else(|| EMPTY_CONTENT.to_string()),
            }
        })
        .collect();

    Fragment::List { style, items }
}

fn item_text(map: &Map<String, Value>) -> Option<&str> {
    non_empty_str(map, "content")
        .or_else(|| non_empty_str(map, "text"))
        .or_else(|| non_empty_str(map, "titulo"))
}

fn metadata(element: &StructureElement) -> Fragment {
    let mut fields: Vec<(String, String)> = Vec::new();

    if let Some(items) = element.items() {
        for item in items {
            match item {
                Value::Object(map) => {
                    let label = ["label", "campo", "key"]
                        .iter()
                        .find_map(|k| non_empty_str(map, k));
                    let value = ["value", "valor"]
                        .iter()
                        .find_map(|k| map.get(*k).and_then(scalar_string));
                    if let (Some(label), Some(value)) = (label, value) {
                        fields.push((label.to_string(), value));
                    }
                }
                Value::String(s) => {
                    if let Some((label, value)) = s.split_once(':') {
                        fields.push((label.trim().to_string(), value.trim().to_string()));
                    }
                }
                _ => {}
            }
        }
    } else {
        // Metadata given inline on the element itself
        for (key, value) in element.as_map() {
            if key == "type" || key == "id" || key == "class" {
                continue;
            }
            if let Some(value) = scalar_string(value) {
                fields.push((key.clone(), value));
            }
        }
    }

    if fields.is_empty() {
        return Fragment::empty();
    }
    Fragment::Metadata { fields }
}

/// One summary item before resolution
struct SummaryItem<'a> {
    text: Option<&'a str>,
    id: Option<&'a str>,
    reference: Option<&'a str>,
}

impl<'a> SummaryItem<'a> {
    fn from_value(value: &'a Value) -> Self {
        match value {
            Value::String(s) => SummaryItem {
                text: Some(s.as_str()).filter(|s| !s.trim().is_empty()),
                id: None,
                reference: None,
            },
            Value::Object(map) => SummaryItem {
                text: item_text(map),
                id: non_empty_str(map, "id"),
                reference: non_empty_str(map, "reference")
                    .or_else(|| non_empty_str(map, "referencia")),
            },
            _ => SummaryItem {
                text: None,
                id: None,
                reference: None,
            },
        }
    }
}

fn summary(element: &StructureElement, targets: &[Target<'_>]) -> Fragment {
    let Some(items) = element.items().filter(|items| !items.is_empty()) else {
        return Fragment::empty();
    };

    let entries = items
        .iter()
        .map(|value| {
            let item = SummaryItem::from_value(value);
            let (target, resolution) = resolve_target(&item, targets);
            let text = item
                .text
                .or(item.reference)
                .unwrap_or(EMPTY_CONTENT)
                .to_string();
            SummaryEntry {
                text,
                target,
                resolution,
            }
        })
        .collect();

    Fragment::Summary {
        title: element.text().map(str::to_string),
        entries,
    }
}

/// Resolve a summary item, in priority order: explicit id, reference,
/// item text found in a target's text, slug.
fn resolve_target(item: &SummaryItem<'_>, targets: &[Target<'_>]) -> (String, Resolution) {
    if let Some(id) = item.id {
        return (id.to_string(), Resolution::ExplicitId);
    }

    if let Some(reference) = item.reference {
        if let Some(target) = targets
            .iter()
            .find(|t| t.element.referencia() == Some(reference))
        {
            return (target.anchor.clone(), Resolution::Reference);
        }
    }

    if let Some(text) = item.text {
        let needle = text.trim().to_lowercase();
        if let Some(target) = targets.iter().find(|t| {
            t.element
                .text()
                .is_some_and(|hay| hay.to_lowercase().contains(&needle))
        }) {
            return (target.anchor.clone(), Resolution::TextMatch);
        }
    }

    let basis = item.text.or(item.reference).unwrap_or(EMPTY_CONTENT);
    (slugify(basis), Resolution::Slug)
}
