//! Price-history analytics: volatility, beta, max drawdown.
//!
//! Degenerate inputs (too few points, zero variance) return 0.0 rather than
//! erroring; these figures decorate reports, they never gate execution.

use std::collections::BTreeMap;

/// Simple returns between consecutive prices. Zero-price predecessors are
/// skipped.
fn to_returns(prices: &[f64]) -> Vec<f64> {
    prices
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| pair[1] / pair[0] - 1.0)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation of simple returns.
pub fn volatility(prices: &[f64]) -> f64 {
    let returns = to_returns(prices);
    if returns.len() < 2 {
        return 0.0;
    }
    let mu = mean(&returns);
    let variance = returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}

/// Covariance of asset and benchmark returns over their aligned tail,
/// divided by benchmark variance. 0.0 when either side is degenerate.
pub fn beta(asset_prices: &[f64], benchmark_prices: &[f64]) -> f64 {
    let asset_returns = to_returns(asset_prices);
    let benchmark_returns = to_returns(benchmark_prices);
    let length = asset_returns.len().min(benchmark_returns.len());
    if length == 0 {
        return 0.0;
    }

    let asset = &asset_returns[asset_returns.len() - length..];
    let benchmark = &benchmark_returns[benchmark_returns.len() - length..];
    let asset_mean = mean(asset);
    let benchmark_mean = mean(benchmark);

    let covariance = asset
        .iter()
        .zip(benchmark)
        .map(|(a, b)| (a - asset_mean) * (b - benchmark_mean))
        .sum::<f64>()
        / length as f64;
    let variance = benchmark
        .iter()
        .map(|b| (b - benchmark_mean).powi(2))
        .sum::<f64>()
        / length as f64;

    if variance == 0.0 {
        0.0
    } else {
        covariance / variance
    }
}

/// Largest peak-to-trough decline as a positive fraction.
pub fn max_drawdown(prices: &[f64]) -> f64 {
    let mut peak = match prices.first() {
        Some(&first) => first,
        None => return 0.0,
    };
    let mut worst: f64 = 0.0;
    for &price in prices {
        peak = peak.max(price);
        if peak == 0.0 {
            continue;
        }
        worst = worst.min((price - peak) / peak);
    }
    worst.abs()
}

/// The full metric set for one instrument, keyed by metric name.
pub fn instrument_metrics(
    last_price: f64,
    history: &[f64],
    benchmark: &[f64],
) -> BTreeMap<&'static str, f64> {
    BTreeMap::from([
        ("price", last_price),
        ("volatility", volatility(history)),
        ("beta", beta(history, benchmark)),
        ("max_drawdown", max_drawdown(history)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn volatility_of_flat_series_is_zero() {
        assert_relative_eq!(volatility(&[100.0, 100.0, 100.0, 100.0]), 0.0);
    }

    #[test]
    fn volatility_of_short_series_is_zero() {
        assert_relative_eq!(volatility(&[]), 0.0);
        assert_relative_eq!(volatility(&[100.0]), 0.0);
        assert_relative_eq!(volatility(&[100.0, 110.0]), 0.0);
    }

    #[test]
    fn volatility_of_alternating_series() {
        // Returns: +0.1, then -1/11. Population std dev of two values is
        // half their absolute difference.
        let prices = [100.0, 110.0, 100.0];
        let expected = (0.1_f64 + 1.0 / 11.0) / 2.0;
        assert_relative_eq!(volatility(&prices), expected, epsilon = 1e-12);
    }

    #[test]
    fn beta_of_identical_series_is_one() {
        let prices = [100.0, 105.0, 101.0, 108.0, 103.0];
        assert_relative_eq!(beta(&prices, &prices), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn beta_against_flat_benchmark_is_zero() {
        let asset = [100.0, 105.0, 101.0];
        let benchmark = [50.0, 50.0, 50.0];
        assert_relative_eq!(beta(&asset, &benchmark), 0.0);
    }

    #[test]
    fn beta_of_empty_inputs_is_zero() {
        assert_relative_eq!(beta(&[], &[100.0, 101.0]), 0.0);
    }

    #[test]
    fn max_drawdown_monotonic_rise_is_zero() {
        assert_relative_eq!(max_drawdown(&[100.0, 110.0, 120.0]), 0.0);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        // Peak 120, trough 90: 25%.
        let prices = [100.0, 120.0, 90.0, 110.0];
        assert_relative_eq!(max_drawdown(&prices), 0.25);
    }

    #[test]
    fn max_drawdown_empty_is_zero() {
        assert_relative_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn instrument_metrics_has_all_keys() {
        let history = [100.0, 102.0, 101.0, 103.0];
        let benchmark = [200.0, 201.0, 202.0, 203.0];
        let metrics = instrument_metrics(103.0, &history, &benchmark);
        assert_relative_eq!(metrics["price"], 103.0);
        assert!(metrics.contains_key("volatility"));
        assert!(metrics.contains_key("beta"));
        assert!(metrics.contains_key("max_drawdown"));
    }
}
