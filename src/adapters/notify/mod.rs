//! Notifier Adapters - Degradation Advisory Channels

pub mod log;

pub use log::LogNotifier;
