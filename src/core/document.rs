//! Bulletin documents and their semantic structure elements

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{BulletinError, Result};

/// Owning entity of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Organism {
    Grouvex,
    Records,
    Designs,
    Games,
}

impl Organism {
    /// Display order used when grouping documents
    pub const ALL: [Organism; 4] = [
        Organism::Grouvex,
        Organism::Records,
        Organism::Designs,
        Organism::Games,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Organism::Grouvex => "grouvex",
            Organism::Records => "records",
            Organism::Designs => "designs",
            Organism::Games => "games",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Organism::Grouvex => "Grouvex Studios",
            Organism::Records => "Grouvex Records",
            Organism::Designs => "Grouvex Designs",
            Organism::Games => "Grouvex Games",
        }
    }
}

impl FromStr for Organism {
    type Err = BulletinError;

    fn from_str(s: &str) -> Result<Self> {
        Organism::ALL
            .into_iter()
            .find(|o| o.as_str() == s.trim())
            .ok_or_else(|| BulletinError::validation(format!("unknown organism '{}'", s)))
    }
}

impl fmt::Display for Organism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    /// Boletín oficial
    Bo,
    Miembros,
    /// Nota oficial
    No,
    /// Terms of service and privacy policy
    Tos,
}

impl DocumentType {
    pub const ALL: [DocumentType; 4] = [
        DocumentType::Bo,
        DocumentType::Miembros,
        DocumentType::No,
        DocumentType::Tos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Bo => "bo",
            DocumentType::Miembros => "miembros",
            DocumentType::No => "no",
            DocumentType::Tos => "tos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Bo => "B.O.",
            DocumentType::Miembros => "Miembros",
            DocumentType::No => "N.O.",
            DocumentType::Tos => "ToS&PP",
        }
    }
}

impl FromStr for DocumentType {
    type Err = BulletinError;

    fn from_str(s: &str) -> Result<Self> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| BulletinError::validation(format!("unknown document type '{}'", s)))
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const DEFAULT_CATEGORY: &str = "general";

fn first_version() -> u32 {
    1
}

/// Older files write `null` for empty fields
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A published bulletin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub organism: Organism,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Publication date, Unix seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Flat text body, ignored when `structure` is non-empty
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub structure: Vec<StructureElement>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default = "first_version")]
    pub version: u32,
    /// Fields written by other tools are carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Whether the document carries semantic structure
    pub fn has_structure(&self) -> bool {
        !self.structure.is_empty()
    }

    /// Publication year in UTC
    pub fn year(&self) -> Option<i32> {
        DateTime::<Utc>::from_timestamp(self.date, 0).map(|d| d.year())
    }

    /// Free-form category written by the public site, `general` when absent
    pub fn category(&self) -> &str {
        self.extra
            .get("category")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Case-insensitive substring match over title, description, reference and tags
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        if term.is_empty() {
            return true;
        }

        self.title.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
            || self
                .reference
                .as_deref()
                .is_some_and(|r| r.to_lowercase().contains(&term))
            || self.tags.iter().any(|t| t.to_lowercase().contains(&term))
    }
}

/// Generate a fresh document id (`doc_<millis>_<suffix>`)
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let random = uuid::Uuid::now_v7().simple().to_string();
    format!("doc_{}_{}", millis, &random[random.len() - 9..])
}

/// Recognized structure element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Titulo,
    Capitulo,
    Seccion,
    Articulo,
    Subtitulo,
    Disposicion,
    Edicto,
    Noticia,
    Sumario,
    Lista,
    Parrafo,
    Metadata,
    /// Missing or unrecognized `type`
    Unknown,
}

impl ElementKind {
    pub fn parse(type_name: &str) -> Self {
        match type_name.trim().to_lowercase().as_str() {
            "titulo" | "h1" => ElementKind::Titulo,
            "capitulo" | "h2" => ElementKind::Capitulo,
            "seccion" | "h3" => ElementKind::Seccion,
            "articulo" | "h4" => ElementKind::Articulo,
            "subtitulo" => ElementKind::Subtitulo,
            "disposicion" => ElementKind::Disposicion,
            "edicto" => ElementKind::Edicto,
            "noticia" => ElementKind::Noticia,
            "sumario" => ElementKind::Sumario,
            "lista" => ElementKind::Lista,
            "parrafo" | "p" => ElementKind::Parrafo,
            "metadata" => ElementKind::Metadata,
            _ => ElementKind::Unknown,
        }
    }
}

/// One semantic node of a structured document.
///
/// Kept as the raw JSON object so that any shape loads and unknown
/// fields survive a save; typed accessors read the known keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructureElement(Map<String, Value>);

impl StructureElement {
    pub fn new(type_name: &str) -> Self {
        let mut map = Map::new();
        map.insert("type".to_string(), Value::String(type_name.to_string()));
        Self(map)
    }

    /// Builder-style setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn type_name(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    pub fn kind(&self) -> ElementKind {
        self.type_name()
            .map(ElementKind::parse)
            .unwrap_or(ElementKind::Unknown)
    }

    /// `content`, falling back to `text`
    pub fn text(&self) -> Option<&str> {
        non_empty_str(&self.0, "content").or_else(|| non_empty_str(&self.0, "text"))
    }

    /// `numero`, accepting strings or numbers
    pub fn numero(&self) -> Option<String> {
        scalar_string(self.0.get("numero")?)
    }

    pub fn class(&self) -> Option<&str> {
        non_empty_str(&self.0, "class")
    }

    pub fn style(&self) -> Option<&str> {
        non_empty_str(&self.0, "style")
    }

    pub fn id(&self) -> Option<&str> {
        non_empty_str(&self.0, "id")
    }

    /// `referencia`, falling back to `reference`
    pub fn referencia(&self) -> Option<&str> {
        non_empty_str(&self.0, "referencia").or_else(|| non_empty_str(&self.0, "reference"))
    }

    pub fn items(&self) -> Option<&[Value]> {
        self.0.get("items").and_then(Value::as_array).map(Vec::as_slice)
    }
}

pub(crate) fn non_empty_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

pub(crate) fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse the raw structure editor text into elements.
///
/// Must be a JSON array of objects, each declaring a string `type`.
pub fn parse_structure(text: &str) -> Result<Vec<StructureElement>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| BulletinError::validation(format!("structure is not valid JSON: {}", e)))?;

    let Value::Array(entries) = value else {
        return Err(BulletinError::validation("structure must be a JSON array"));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::Object(map) => {
                if non_empty_str(&map, "type").is_none() {
                    return Err(BulletinError::validation(format!(
                        "structure element {} has no type",
                        index
                    )));
                }
                Ok(StructureElement(map))
            }
            _ => Err(BulletinError::validation(format!(
                "structure element {} is not an object",
                index
            ))),
        })
        .collect()
}

/// Split a comma-separated tag field
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Field values coming from the admin form
#[derive(Debug, Clone, Default)]
pub struct DocumentDraft {
    pub organism: String,
    pub doc_type: String,
    pub title: String,
    pub reference: String,
    pub date: i64,
    pub description: String,
    pub content: String,
    /// Raw JSON from the structure editor; `None` means a flat-text document
    pub structure: Option<String>,
    pub tags: Vec<String>,
}

impl DocumentDraft {
    /// Prefill a draft from a stored document, as the edit form does
    pub fn from_document(doc: &Document) -> Self {
        let structure = doc
            .has_structure()
            .then(|| serde_json::to_string_pretty(&doc.structure).ok())
            .flatten();

        Self {
            organism: doc.organism.as_str().to_string(),
            doc_type: doc.doc_type.as_str().to_string(),
            title: doc.title.clone(),
            reference: doc.reference.clone().unwrap_or_default(),
            date: doc.date,
            description: doc.description.clone(),
            content: doc.content.clone(),
            structure,
            tags: doc.tags.clone(),
        }
    }

    /// Validate the draft and build a document with the given identity
    pub(crate) fn build(&self, id: String, version: u32) -> Result<Document> {
        if self.title.trim().is_empty() {
            return Err(BulletinError::validation("title is required"));
        }
        if self.organism.trim().is_empty() {
            return Err(BulletinError::validation("organism is required"));
        }
        if self.doc_type.trim().is_empty() {
            return Err(BulletinError::validation("type is required"));
        }

        let organism: Organism = self.organism.parse()?;
        let doc_type: DocumentType = self.doc_type.parse()?;

        // Structured documents drop the flat body and vice versa
        let (structure, content) = match &self.structure {
            Some(text) => (parse_structure(text)?, String::new()),
            None => (Vec::new(), self.content.clone()),
        };

        let reference = Some(self.reference.trim().to_string()).filter(|r| !r.is_empty());

        Ok(Document {
            id,
            organism,
            doc_type,
            title: self.title.trim().to_string(),
            reference,
            date: self.date,
            description: self.description.clone(),
            content,
            structure,
            tags: self.tags.clone(),
            version,
            extra: Map::new(),
        })
    }
}
