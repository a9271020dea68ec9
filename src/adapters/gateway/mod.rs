//! Gateway Adapters - Remote Function Invocation
//!
//! HTTP implementation of the `MarketGateway` port.

pub mod http;

pub use http::{HttpGateway, HttpGatewayConfig};
