//! Bulletin - official bulletin store, renderer and version ledger
//!
//! Documents are kept as a JSON collection, rendered from either flat text
//! or semantic structure elements, and every edit archives the prior
//! collection in a capped history.

pub mod app;
pub mod core;
pub mod render;
