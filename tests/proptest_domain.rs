//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that the fallback synthesizer maintains its
//! domain clamps across arbitrary wall-clock instants.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use gridpulse::domain::market_data::{DataType, MarketPayload};
use gridpulse::domain::synthesizer::synthesize;

// Any instant between 1970 and ~2100.
const MAX_EPOCH_SECS: i64 = 4_102_444_800;

// ── Synthesizer Properties ──────────────────────────────────

proptest! {
    /// Synthetic pool price never drops below the $20/MWh floor.
    #[test]
    fn synthetic_price_respects_floor(secs in 0i64..MAX_EPOCH_SECS) {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let MarketPayload::Price(p) = synthesize(DataType::PoolPrice, now) else {
            return Err(TestCaseError::fail("wrong payload variant"));
        };
        prop_assert!(p.current_price >= 20.0, "price {} below floor", p.current_price);
        prop_assert!(p.average_price >= 20.0, "average {} below floor", p.average_price);
        prop_assert!(p.current_price.is_finite());
    }

    /// Synthetic demand never drops below the 8000 MW floor, and the
    /// forecast peak never undercuts current demand.
    #[test]
    fn synthetic_demand_respects_floor(secs in 0i64..MAX_EPOCH_SECS) {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let MarketPayload::Load(l) = synthesize(DataType::LoadForecast, now) else {
            return Err(TestCaseError::fail("wrong payload variant"));
        };
        prop_assert!(l.current_demand_mw >= 8000.0);
        prop_assert!(l.forecast_peak_mw >= l.current_demand_mw);
    }

    /// Renewable share always lands in the plausible [20, 80]% band and
    /// every fuel component is non-negative.
    #[test]
    fn synthetic_mix_stays_in_band(secs in 0i64..MAX_EPOCH_SECS) {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let MarketPayload::Generation(g) = synthesize(DataType::GenerationMix, now)
        else {
            return Err(TestCaseError::fail("wrong payload variant"));
        };
        prop_assert!(g.renewable_pct >= 20.0 && g.renewable_pct <= 80.0);
        prop_assert!(g.gas_mw >= 0.0);
        prop_assert!(g.wind_mw >= 0.0);
        prop_assert!(g.solar_mw >= 0.0);
        prop_assert!(g.hydro_mw >= 0.0);
        prop_assert!(g.other_mw >= 0.0);
        prop_assert!(g.total_mw() > 0.0);
    }

    /// The synthesizer is a pure function of (data type, instant).
    #[test]
    fn synthesizer_deterministic(
        secs in 0i64..MAX_EPOCH_SECS,
        nanos in 0u32..1_000_000_000,
    ) {
        let now = Utc.timestamp_opt(secs, nanos).unwrap();
        for dt in DataType::ALL {
            prop_assert_eq!(synthesize(dt, now), synthesize(dt, now));
        }
    }
}
