//! Document rendering into display fragments
//!
//! Structured documents go through the element builders; documents with
//! only flat text go through the legacy line scanner.

pub mod fragment;
pub mod legacy;
pub mod numbering;
pub mod outline;
pub mod structured;

pub use fragment::{to_plain_text, Fragment};

use crate::core::document::Document;

/// Render a document. Total: any document yields fragments.
pub fn render(doc: &Document) -> Vec<Fragment> {
    if doc.has_structure() {
        tracing::debug!("Rendering {} structure elements of {}", doc.structure.len(), doc.id);
        return structured::render_structure(&doc.structure);
    }

    if doc.content.trim().is_empty() {
        return vec![Fragment::empty()];
    }
    legacy::parse_legacy(&doc.content)
}
