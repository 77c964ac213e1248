//! Element-by-element outline of a structured document

use serde_json::Value;

use crate::core::document::{non_empty_str, Document};

use super::fragment::EMPTY_CONTENT;

const PREVIEW_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub type_name: String,
    pub numero: Option<String>,
    pub preview: String,
}

/// One entry per structure element; empty for flat-text documents
pub fn outline(doc: &Document) -> Vec<OutlineEntry> {
    doc.structure
        .iter()
        .map(|element| {
            let map = element.as_map();
            let preview = if let Some(content) = non_empty_str(map, "content") {
                truncate(content)
            } else if let Some(items) = map.get("items").and_then(Value::as_array) {
                format!("{} elementos", items.len())
            } else if let Some(text) = non_empty_str(map, "text") {
                truncate(text)
            } else {
                EMPTY_CONTENT.to_string()
            };

            OutlineEntry {
                type_name: element.type_name().unwrap_or("?").to_string(),
                numero: element.numero(),
                preview,
            }
        })
        .collect()
}

fn truncate(text: &str) -> String {
    if text.chars().count() > PREVIEW_CHARS {
        let head: String = text.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::parse_structure;

    #[test]
    fn test_outline_previews() {
        let long = "á".repeat(60);
        let structure = format!(
            r#"[
                {{"type":"titulo","numero":"I","content":"{long}"}},
                {{"type":"lista","items":[1,2,3]}},
                {{"type":"parrafo","text":"corto"}},
                {{"type":"metadata"}}
            ]"#
        );

        let doc: Document = serde_json::from_value(serde_json::json!({
            "id": "doc_1",
            "organism": "games",
            "type": "tos",
            "title": "Términos",
        }))
        .unwrap();
        let doc = Document {
            structure: parse_structure(&structure).unwrap(),
            ..doc
        };

        let entries = outline(&doc);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].numero.as_deref(), Some("I"));
        assert_eq!(entries[0].preview, format!("{}...", "á".repeat(50)));
        assert_eq!(entries[1].preview, "3 elementos");
        assert_eq!(entries[2].preview, "corto");
        assert_eq!(entries[3].preview, EMPTY_CONTENT);
        assert_eq!(entries[3].type_name, "metadata");
    }
}
