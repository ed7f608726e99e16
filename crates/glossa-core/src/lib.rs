pub mod config;
pub mod record;
pub mod score;

pub use config::{DevicePreference, EngineConfig, ResolvedDevice};
pub use record::{
    EntitySpan, ProcessingResult, SentimentRating, StoredResult, TaskKind, TaskOutput, TextSample,
    UnknownTaskError,
};
pub use score::derive_confidence;
