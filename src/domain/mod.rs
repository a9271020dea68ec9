//! Domain layer - Core business logic and models.
//!
//! This module contains the pure domain logic for the gridpulse poller.
//! No external dependencies allowed here (hexagonal architecture inner ring).
//! All types are serializable and testable in isolation.

pub mod market_data;
pub mod synthesizer;

// Re-export core types for convenience
pub use market_data::{
    CacheKey, ConnectionStatus, DataSource, DataType, GenerationPayload,
    LoadPayload, MarketPayload, MarketSnapshot, PricePayload,
};
