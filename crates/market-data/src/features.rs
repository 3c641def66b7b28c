//! Lookback features over an hourly price series.
//!
//! Pure and deterministic: no external calls, no shared state. Each derived
//! field stays `None` until its full lookback window exists; a short warm-up
//! is never reported as a zero change.

use analysis_core::{DerivedPriceBar, PriceBar};

const WINDOW_1H: usize = 1;
const WINDOW_24H: usize = 24;
const WINDOW_7D: usize = 168;

/// Percentage change of close over the last `window` bars, in percent.
fn pct_change(bars: &[PriceBar], idx: usize, window: usize) -> Option<f64> {
    if idx < window {
        return None;
    }
    let prev = bars[idx - window].close;
    if prev == 0.0 {
        return None;
    }
    Some((bars[idx].close - prev) / prev * 100.0)
}

/// Rolling band ratio: max(high) / min(low) - 1 over the trailing 24 bars.
fn volatility_24h(bars: &[PriceBar], idx: usize) -> Option<f64> {
    if idx + 1 < WINDOW_24H {
        return None;
    }
    let window = &bars[idx + 1 - WINDOW_24H..=idx];
    let max_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
    let min_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);
    if min_low <= 0.0 {
        return None;
    }
    Some(max_high / min_low - 1.0)
}

/// Derive 1h/24h/7d percentage changes and the 24h volatility band for every
/// bar. Input is re-sorted ascending by timestamp before computation so the
/// lookback indices always point backwards in time.
pub fn derive_price_features(bars: &[PriceBar]) -> Vec<DerivedPriceBar> {
    let mut sorted: Vec<PriceBar> = bars.to_vec();
    sorted.sort_by_key(|bar| bar.timestamp);

    sorted
        .iter()
        .enumerate()
        .map(|(idx, bar)| DerivedPriceBar {
            bar: bar.clone(),
            pct_change_1h: pct_change(&sorted, idx, WINDOW_1H),
            pct_change_24h: pct_change(&sorted, idx, WINDOW_24H),
            pct_change_7d: pct_change(&sorted, idx, WINDOW_7D),
            volatility_24h: volatility_24h(&sorted, idx),
        })
        .collect()
}
