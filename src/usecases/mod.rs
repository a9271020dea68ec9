//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! service's core workflows.
//!
//! Use cases:
//! - `MarketDataPoller`: Fetch + TTL cache + fallback + status machine
//! - `PollScheduler`: Periodic refetch loop with explicit start/stop

pub mod poller;
pub mod scheduler;

pub use poller::{MarketDataPoller, PollerConfig};
pub use scheduler::{PollHandle, PollScheduler};
