//! Weighted moving average forecast with a short-term trend.
//!
//! Weights `[1, 2, 3, 4, 5]` apply to the trailing five values, most recent
//! heaviest. The first four positions have no full window and carry the raw
//! value. Step `i` forecasts `WMA_last + trend · i` with
//! `trend = (WMA_last - WMA_{last-2}) / 2` and half-width `z · σ · √i`.

use super::method::{Forecaster, History, Projection};

/// Weights, oldest first.
pub const WEIGHTS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

/// Weighted moving average with linear extrapolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedMovingAverage;

impl WeightedMovingAverage {
    /// WMA at each position.
    pub fn smooth(&self, values: &[f64]) -> Vec<f64> {
        let w = WEIGHTS.len();
        let weight_sum: f64 = WEIGHTS.iter().sum();
        (0..values.len())
            .map(|i| {
                if i + 1 < w {
                    values[i]
                } else {
                    let window = &values[i + 1 - w..=i];
                    window
                        .iter()
                        .zip(WEIGHTS.iter())
                        .map(|(x, wt)| x * wt)
                        .sum::<f64>()
                        / weight_sum
                }
            })
            .collect()
    }
}

impl Forecaster for WeightedMovingAverage {
    fn project(&self, history: &History<'_>, horizon: usize, z: f64) -> Vec<Projection> {
        let wma = self.smooth(history.values);
        let n = wma.len();
        if n < 3 {
            return Vec::new();
        }
        let last = wma[n - 1];
        let trend = (last - wma[n - 3]) / 2.0;
        (1..=horizon)
            .map(|i| Projection {
                point: last + trend * i as f64,
                half_width: z * history.std_dev * (i as f64).sqrt(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smooth_weights_recent_values() {
        let wma = WeightedMovingAverage.smooth(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(&wma[..4], &[1.0, 2.0, 3.0, 4.0]);
        // (1·1 + 2·2 + 3·3 + 4·4 + 5·5) / 15 = 55/15
        assert!((wma[4] - 55.0 / 15.0).abs() < 1e-12);
        assert!((wma[5] - 70.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_trend_from_three_point_history() {
        // No full window: WMA equals the raw values, trend = (3 - 1) / 2
        let values = [1.0, 2.0, 3.0];
        let history = History::new(&values).unwrap();
        let p = WeightedMovingAverage.project(&history, 2, 1.96);
        assert!((p[0].point - 4.0).abs() < 1e-12);
        assert!((p[1].point - 5.0).abs() < 1e-12);
        assert!((p[1].half_width - 1.96 * history.std_dev * 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
