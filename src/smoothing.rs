//! Smoothing Filter: a scalar Kalman-style estimator producing a trend line from a
//! chronological temperature series.

use crate::models::{HistoryPoint, SmoothedPoint};
use serde::{Deserialize, Serialize};

/// Noise parameters of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    /// Expected drift per step.
    pub process_noise: f64,
    /// Expected observation noise.
    pub measurement_noise: f64,
}

impl FilterParams {
    /// Tuning for map-level trend values (stiff).
    pub const MAP: FilterParams = FilterParams {
        process_noise: 0.01,
        measurement_noise: 0.6,
    };

    /// Tuning for the drill-down chart (follows the data more closely).
    pub const CHART: FilterParams = FilterParams {
        process_noise: 0.1,
        measurement_noise: 0.5,
    };
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::CHART
    }
}

/// Running filter state. Feed observations in chronological order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KalmanSmoother {
    params: FilterParams,
    estimate: f64,
    error_estimate: f64,
}

impl KalmanSmoother {
    /// Start at `initial` with unit error.
    pub fn new(params: FilterParams, initial: f64) -> Self {
        Self {
            params,
            estimate: initial,
            error_estimate: 1.0,
        }
    }

    /// Fold one observation in and return the new estimate.
    pub fn update(&mut self, measurement: f64) -> f64 {
        let predicted_error = self.error_estimate + self.params.process_noise;
        let gain = predicted_error / (predicted_error + self.params.measurement_noise);
        self.estimate += gain * (measurement - self.estimate);
        self.error_estimate = (1.0 - gain) * predicted_error;
        self.estimate
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    pub fn error_estimate(&self) -> f64 {
        self.error_estimate
    }
}

/// Smooth `points` in the order given. Output has the same length and years;
/// the first smoothed value equals the first raw value.
pub fn smooth(points: &[HistoryPoint], params: FilterParams) -> Vec<SmoothedPoint> {
    let Some(first) = points.first() else {
        return Vec::new();
    };
    let mut filter = KalmanSmoother::new(params, first.temperature);
    points
        .iter()
        .map(|p| SmoothedPoint {
            year: p.year,
            temperature: filter.update(p.temperature),
            original_temperature: p.temperature,
        })
        .collect()
}

/// Smoothed value after the last point, or `None` for an empty series.
pub fn trend_value(points: &[HistoryPoint], params: FilterParams) -> Option<f64> {
    let first = points.first()?;
    let mut filter = KalmanSmoother::new(params, first.temperature);
    for p in points {
        filter.update(p.temperature);
    }
    Some(filter.estimate())
}
