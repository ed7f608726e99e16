//! The processor facade: routes text through the active capability for a
//! task, normalizes the output, persists the result, and answers aggregate
//! queries over the record store.

mod error;
pub use error::EngineError;

mod processor;
pub use processor::{DatabaseStats, TextProcessor};
