//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the domain/usecases layer
//! requires from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `MarketGateway`: Remote function invocation for market data
//! - `StatusNotifier`: Degraded-mode advisories (exactly-once semantics)

pub mod gateway;
pub mod notifier;
