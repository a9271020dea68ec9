//! Core market data domain types.
//!
//! Defines the closed set of data types the poller understands, the
//! provenance labels attached to every snapshot, and the typed payload
//! shapes. One payload struct per data type — the wire `data` object is
//! decoded into exactly one variant, so call sites match exhaustively
//! instead of branching on untyped maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Cache key derived from a data type plus its request parameters.
pub type CacheKey = String;

// ────────────────────────────────────────────
// Enums shared across domain, ports, and usecases
// ────────────────────────────────────────────

/// Logical category of market data being requested.
///
/// Closed enumeration: the gateway's `action` strings map 1:1 onto these
/// variants. Unknown action strings are rejected at the string boundary
/// (`from_action` returns `None`), never inside the poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Current pool price ($/MWh) with rolling average.
    PoolPrice,
    /// System demand and forecast peak (MW).
    LoadForecast,
    /// Generation mix by fuel with derived renewable share.
    GenerationMix,
}

impl DataType {
    /// All data types, in poll order.
    pub const ALL: [DataType; 3] = [
        DataType::PoolPrice,
        DataType::LoadForecast,
        DataType::GenerationMix,
    ];

    /// Wire `action` string sent to the gateway.
    pub fn action(self) -> &'static str {
        match self {
            Self::PoolPrice => "price",
            Self::LoadForecast => "load",
            Self::GenerationMix => "generation",
        }
    }

    /// Parse a wire `action` string. `None` for unrecognized actions.
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "price" => Some(Self::PoolPrice),
            "load" => Some(Self::LoadForecast),
            "generation" => Some(Self::GenerationMix),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.action())
    }
}

/// Provenance of a snapshot's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Fresh response from the gateway.
    Live,
    /// Re-served from the TTL cache without a gateway call.
    Cached,
    /// Synthesized locally because the gateway failed or reported degraded.
    Fallback,
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Cached => write!(f, "cached"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Coarse connectivity indicator, one per poller instance.
///
/// Reflects only the most recently completed fetch. Allowed transitions:
/// `Connecting → Connected` on first live success,
/// `Connecting|Connected → Fallback` on failure,
/// `Fallback → Connected` on recovery. No terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No fetch has completed yet.
    Connecting,
    /// Most recent fetch returned live data.
    Connected,
    /// Most recent fetch fell back to synthetic data.
    Fallback,
}

impl ConnectionStatus {
    /// Next status after a completed fetch against the live source.
    pub fn after_outcome(self, live_success: bool) -> Self {
        if live_success {
            Self::Connected
        } else {
            Self::Fallback
        }
    }
}

// ────────────────────────────────────────────
// Typed payloads — one shape per data type
// ────────────────────────────────────────────

/// Pool price reading in $/MWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePayload {
    /// Current settlement-interval pool price.
    pub current_price: f64,
    /// Rolling 30-day average pool price.
    pub average_price: f64,
}

/// System load reading in MW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPayload {
    /// Current system demand.
    pub current_demand_mw: f64,
    /// Forecast peak demand for the day.
    pub forecast_peak_mw: f64,
}

/// Generation mix by fuel in MW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    pub gas_mw: f64,
    pub wind_mw: f64,
    pub solar_mw: f64,
    pub hydro_mw: f64,
    pub other_mw: f64,
    /// Renewable share of total generation, percent.
    pub renewable_pct: f64,
}

impl GenerationPayload {
    /// Total generation across all fuels.
    pub fn total_mw(&self) -> f64 {
        self.gas_mw + self.wind_mw + self.solar_mw + self.hydro_mw + self.other_mw
    }
}

/// Tagged union of all payload shapes.
///
/// The `kind` tag on the wire matches the gateway's `action` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarketPayload {
    Price(PricePayload),
    Load(LoadPayload),
    Generation(GenerationPayload),
}

impl MarketPayload {
    /// The data type this payload belongs to.
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Price(_) => DataType::PoolPrice,
            Self::Load(_) => DataType::LoadForecast,
            Self::Generation(_) => DataType::GenerationMix,
        }
    }
}

// ────────────────────────────────────────────
// Snapshot — the unit returned by every fetch
// ────────────────────────────────────────────

/// A completed data fetch result. Immutable once returned.
///
/// `success` is true only for live/cached provenance; fallback snapshots
/// carry `success: false` plus the triggering error message so consumers
/// can distinguish real from synthetic data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Whether the data came from the live source (directly or via cache).
    pub success: bool,
    /// Provenance label.
    pub source: DataSource,
    /// Typed payload.
    pub payload: MarketPayload,
    /// Wire timestamp (ISO-8601 when serialized).
    pub timestamp: DateTime<Utc>,
    /// Error message that triggered a fallback, if any.
    pub error: Option<String>,
}

impl MarketSnapshot {
    /// Build a live snapshot from a decoded gateway payload.
    pub fn live(payload: MarketPayload, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            source: DataSource::Live,
            payload,
            timestamp,
            error: None,
        }
    }

    /// Build a fallback snapshot from a synthesized payload.
    pub fn fallback(payload: MarketPayload, timestamp: DateTime<Utc>, error: String) -> Self {
        Self {
            success: false,
            source: DataSource::Fallback,
            payload,
            timestamp,
            error: Some(error),
        }
    }

    /// Re-serve this snapshot from the cache.
    ///
    /// Payload and timestamp are carried over unchanged; only the
    /// provenance label flips to `Cached`.
    pub fn as_cached(&self) -> Self {
        Self {
            source: DataSource::Cached,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_roundtrip() {
        for dt in DataType::ALL {
            assert_eq!(DataType::from_action(dt.action()), Some(dt));
        }
    }

    #[test]
    fn test_unrecognized_action_is_none() {
        assert_eq!(DataType::from_action("weather"), None);
        assert_eq!(DataType::from_action(""), None);
    }

    #[test]
    fn test_status_after_outcome() {
        assert_eq!(
            ConnectionStatus::Connecting.after_outcome(true),
            ConnectionStatus::Connected
        );
        assert_eq!(
            ConnectionStatus::Connected.after_outcome(false),
            ConnectionStatus::Fallback
        );
        assert_eq!(
            ConnectionStatus::Fallback.after_outcome(true),
            ConnectionStatus::Connected
        );
    }

    #[test]
    fn test_as_cached_preserves_payload_and_timestamp() {
        let now = Utc::now();
        let live = MarketSnapshot::live(
            MarketPayload::Price(PricePayload {
                current_price: 62.5,
                average_price: 58.0,
            }),
            now,
        );
        let cached = live.as_cached();
        assert_eq!(cached.source, DataSource::Cached);
        assert_eq!(cached.payload, live.payload);
        assert_eq!(cached.timestamp, live.timestamp);
        assert!(cached.success);
    }

    #[test]
    fn test_fallback_snapshot_carries_error() {
        let snap = MarketSnapshot::fallback(
            MarketPayload::Load(LoadPayload {
                current_demand_mw: 9500.0,
                forecast_peak_mw: 10800.0,
            }),
            Utc::now(),
            "rate limited".to_string(),
        );
        assert!(!snap.success);
        assert_eq!(snap.source, DataSource::Fallback);
        assert_eq!(snap.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn test_generation_total() {
        let g = GenerationPayload {
            gas_mw: 5000.0,
            wind_mw: 2000.0,
            solar_mw: 500.0,
            hydro_mw: 300.0,
            other_mw: 200.0,
            renewable_pct: 35.0,
        };
        assert!((g.total_mw() - 8000.0).abs() < 1e-9);
    }

    #[test]
    fn test_payload_tag_serialization() {
        let p = MarketPayload::Price(PricePayload {
            current_price: 45.0,
            average_price: 50.0,
        });
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["kind"], "price");
        assert_eq!(json["current_price"], 45.0);
    }
}
