//! Storage layer: durable, append-only JSON-document record store.

mod error;
pub use error::StoreError;

mod json;
pub use json::{JsonStore, StoreDocument, StoreMetadata};
