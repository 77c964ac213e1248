//! Core functionality: documents, the store and its history, sync, and configuration

pub mod auth;
pub mod backup;
pub mod config;
pub mod document;
pub mod error;
pub mod ledger;
pub mod store;
pub mod sync;
pub mod time;
