//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (HTTP client, structured logging, metrics
//! export). Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `gateway`: HTTP client for the serverless function gateway
//! - `notify`: Degradation advisory channels (structured log)
//! - `metrics`: Prometheus metrics export and health checks

pub mod gateway;
pub mod metrics;
pub mod notify;
