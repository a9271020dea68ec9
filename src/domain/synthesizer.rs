//! Fallback synthesizer - plausible substitute values for degraded mode.
//!
//! Pure function of `(DataType, now)`: a smooth sine oscillation around a
//! per-field baseline, scaled to a small amplitude, then clamped to a
//! domain-sane floor. Repeated calls within a process vary smoothly with
//! wall-clock time but are fully deterministic for a given instant.
//!
//! No I/O, never fails. Composite payloads derive their dependent fields
//! (renewable share) from the synthesized components so internal ratios
//! stay self-consistent.

use chrono::{DateTime, Utc};

use super::market_data::{
    DataType, GenerationPayload, LoadPayload, MarketPayload, PricePayload,
};

// Pool price ($/MWh)
const PRICE_BASE: f64 = 62.0;
const PRICE_AMPLITUDE: f64 = 0.15;
const PRICE_FLOOR: f64 = 20.0;
const AVG_PRICE_BASE: f64 = 58.0;

// System load (MW)
const DEMAND_BASE: f64 = 9_800.0;
const DEMAND_AMPLITUDE: f64 = 0.12;
const DEMAND_FLOOR: f64 = 8_000.0;
const PEAK_OVER_DEMAND: f64 = 1.12;

// Generation mix (MW)
const GAS_BASE: f64 = 5_200.0;
const WIND_BASE: f64 = 2_400.0;
const SOLAR_BASE: f64 = 600.0;
const HYDRO_BASE: f64 = 350.0;
const OTHER_BASE: f64 = 250.0;
const RENEWABLE_PCT_MIN: f64 = 20.0;
const RENEWABLE_PCT_MAX: f64 = 80.0;

// Oscillation periods. Staggered so composite fields do not move in
// lockstep and the mix ratio itself drifts over time.
const PRICE_PERIOD_SECS: f64 = 900.0;
const LOAD_PERIOD_SECS: f64 = 1_800.0;
const WIND_PERIOD_SECS: f64 = 600.0;

/// Synthesize a complete payload for `data_type` as of `now`.
///
/// Total over the `DataType` enum; unrecognized action strings never reach
/// this function (rejected at `DataType::from_action`).
pub fn synthesize(data_type: DataType, now: DateTime<Utc>) -> MarketPayload {
    match data_type {
        DataType::PoolPrice => MarketPayload::Price(synth_price(now)),
        DataType::LoadForecast => MarketPayload::Load(synth_load(now)),
        DataType::GenerationMix => MarketPayload::Generation(synth_generation(now)),
    }
}

/// Smooth oscillation in [-1, 1] with the given period and phase offset.
fn oscillation(now: DateTime<Utc>, period_secs: f64, phase: f64) -> f64 {
    let t = now.timestamp_millis() as f64 / 1_000.0;
    (t / period_secs * std::f64::consts::TAU + phase).sin()
}

fn synth_price(now: DateTime<Utc>) -> PricePayload {
    let wave = oscillation(now, PRICE_PERIOD_SECS, 0.0);
    let current = PRICE_BASE * (1.0 + PRICE_AMPLITUDE * wave);
    // Average moves a quarter as much as the spot price
    let average = AVG_PRICE_BASE * (1.0 + PRICE_AMPLITUDE * 0.25 * wave);

    PricePayload {
        current_price: current.max(PRICE_FLOOR),
        average_price: average.max(PRICE_FLOOR),
    }
}

fn synth_load(now: DateTime<Utc>) -> LoadPayload {
    let wave = oscillation(now, LOAD_PERIOD_SECS, 0.5);
    let demand = (DEMAND_BASE * (1.0 + DEMAND_AMPLITUDE * wave)).max(DEMAND_FLOOR);
    // Peak forecast always at or above current demand
    let peak = (demand * PEAK_OVER_DEMAND).max(demand);

    LoadPayload {
        current_demand_mw: demand,
        forecast_peak_mw: peak,
    }
}

fn synth_generation(now: DateTime<Utc>) -> GenerationPayload {
    let slow = oscillation(now, LOAD_PERIOD_SECS, 1.0);
    let fast = oscillation(now, WIND_PERIOD_SECS, 0.0);

    let gas = (GAS_BASE * (1.0 + 0.10 * slow)).max(0.0);
    let wind = (WIND_BASE * (1.0 + 0.20 * fast)).max(0.0);
    let solar = (SOLAR_BASE * (1.0 + 0.18 * fast)).max(0.0);
    let hydro = (HYDRO_BASE * (1.0 + 0.08 * slow)).max(0.0);
    let other = (OTHER_BASE * (1.0 + 0.05 * slow)).max(0.0);

    let total = gas + wind + solar + hydro + other;
    let renewable = wind + solar + hydro;
    let renewable_pct =
        (renewable / total * 100.0).clamp(RENEWABLE_PCT_MIN, RENEWABLE_PCT_MAX);

    GenerationPayload {
        gas_mw: gas,
        wind_mw: wind,
        solar_mw: solar,
        hydro_mw: hydro,
        other_mw: other,
        renewable_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_price_respects_floor() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let MarketPayload::Price(p) = synthesize(DataType::PoolPrice, now) else {
            panic!("wrong payload variant");
        };
        assert!(p.current_price >= PRICE_FLOOR);
        assert!(p.average_price >= PRICE_FLOOR);
    }

    #[test]
    fn test_demand_respects_floor_and_peak_ordering() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let MarketPayload::Load(l) = synthesize(DataType::LoadForecast, now) else {
            panic!("wrong payload variant");
        };
        assert!(l.current_demand_mw >= DEMAND_FLOOR);
        assert!(l.forecast_peak_mw >= l.current_demand_mw);
    }

    #[test]
    fn test_renewable_share_in_band_and_self_consistent() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let MarketPayload::Generation(g) = synthesize(DataType::GenerationMix, now)
        else {
            panic!("wrong payload variant");
        };
        assert!(g.renewable_pct >= RENEWABLE_PCT_MIN);
        assert!(g.renewable_pct <= RENEWABLE_PCT_MAX);

        let derived = (g.wind_mw + g.solar_mw + g.hydro_mw) / g.total_mw() * 100.0;
        let clamped = derived.clamp(RENEWABLE_PCT_MIN, RENEWABLE_PCT_MAX);
        assert!((g.renewable_pct - clamped).abs() < 1e-9);
    }

    #[test]
    fn test_deterministic_for_fixed_instant() {
        let now = Utc.timestamp_opt(1_700_000_123, 456_000_000).unwrap();
        for dt in DataType::ALL {
            assert_eq!(synthesize(dt, now), synthesize(dt, now));
        }
    }

    #[test]
    fn test_values_vary_across_time() {
        let t1 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let t2 = Utc.timestamp_opt(1_700_000_200, 0).unwrap();
        assert_ne!(
            synthesize(DataType::PoolPrice, t1),
            synthesize(DataType::PoolPrice, t2)
        );
    }
}
