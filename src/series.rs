//! Measurement series: the validated input to every engine in this crate.
//!
//! A [`MeasurementSeries`] is an immutable, non-empty, time-ordered sequence
//! of [`Sample`]s plus a subgroup size. Construction is the only validation
//! gate: non-finite values and backwards timestamps are rejected here so the
//! statistical code downstream never has to guard against NaN.
//!
//! Samples live behind an [`Arc`], so cloning a series is a cheap frozen
//! snapshot. A newer snapshot is a new value; an evaluation running over an
//! older clone is never affected by it.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SpcError;

/// Largest subgroup size covered by the d2 constant table.
pub const MAX_SUBGROUP_SIZE: usize = 10;

/// A single timestamped measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Summary of one complete rational subgroup.
#[derive(Debug, Clone, PartialEq)]
pub struct Subgroup {
    /// Zero-based subgroup number.
    pub index: usize,
    /// Subgroup mean (X-bar).
    pub mean: f64,
    /// Subgroup range (max - min).
    pub range: f64,
    /// Timestamp of the first sample in the subgroup.
    pub start: DateTime<Utc>,
}

#[derive(Debug)]
struct SeriesData {
    samples: Vec<Sample>,
    values: Vec<f64>,
}

/// An ordered, non-empty, finite sequence of samples.
///
/// # Invariants
///
/// - `len() >= 1`
/// - every value is finite
/// - timestamps are non-decreasing (duplicates keep arrival order)
/// - `subgroup_size()` is in `1..=10`
///
/// # Examples
///
/// ```
/// use spc_core::series::MeasurementSeries;
///
/// let series = MeasurementSeries::from_values(&[10.1, 10.3, 9.9]).unwrap();
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.subgroup_size(), 1);
///
/// assert!(MeasurementSeries::from_values(&[1.0, f64::NAN]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MeasurementSeries {
    data: Arc<SeriesData>,
    subgroup_size: usize,
}

impl MeasurementSeries {
    /// Builds a series in individual (moving-range) mode.
    ///
    /// # Errors
    ///
    /// - [`SpcError::EmptySeries`] if `samples` is empty
    /// - [`SpcError::NonFiniteValue`] for NaN or infinite values
    /// - [`SpcError::UnorderedTimestamp`] if a timestamp precedes its predecessor
    pub fn new(samples: Vec<Sample>) -> Result<Self, SpcError> {
        if samples.is_empty() {
            return Err(SpcError::EmptySeries);
        }
        for (index, sample) in samples.iter().enumerate() {
            if !sample.value.is_finite() {
                return Err(SpcError::NonFiniteValue {
                    index,
                    value: sample.value,
                });
            }
        }
        if let Some(index) = samples
            .windows(2)
            .position(|w| w[1].timestamp < w[0].timestamp)
        {
            return Err(SpcError::UnorderedTimestamp { index: index + 1 });
        }

        let values = samples.iter().map(|s| s.value).collect();
        Ok(Self {
            data: Arc::new(SeriesData { samples, values }),
            subgroup_size: 1,
        })
    }

    /// Builds a series from bare values, one per day starting at the Unix epoch.
    pub fn from_values(values: &[f64]) -> Result<Self, SpcError> {
        let origin = Utc.timestamp_opt(0, 0).single().unwrap_or_default();
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, &v)| Sample::new(origin + Duration::days(i as i64), v))
            .collect();
        Self::new(samples)
    }

    /// Returns a copy of this series using subgroups of `size` consecutive samples.
    ///
    /// # Errors
    ///
    /// [`SpcError::InvalidSubgroupSize`] unless `1 <= size <= 10`.
    pub fn with_subgroup_size(mut self, size: usize) -> Result<Self, SpcError> {
        if !(1..=MAX_SUBGROUP_SIZE).contains(&size) {
            return Err(SpcError::InvalidSubgroupSize(size));
        }
        self.subgroup_size = size;
        Ok(self)
    }

    /// Returns a new snapshot with `sample` appended. `self` is left untouched.
    pub fn appended(&self, sample: Sample) -> Result<Self, SpcError> {
        let mut samples = self.data.samples.clone();
        samples.push(sample);
        Self::new(samples)?.with_subgroup_size(self.subgroup_size)
    }

    pub fn len(&self) -> usize {
        self.data.samples.len()
    }

    /// Always `false`; a series cannot be constructed empty.
    pub fn is_empty(&self) -> bool {
        self.data.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.data.samples
    }

    pub fn values(&self) -> &[f64] {
        &self.data.values
    }

    pub fn subgroup_size(&self) -> usize {
        self.subgroup_size
    }

    pub fn first_timestamp(&self) -> DateTime<Utc> {
        self.data.samples[0].timestamp
    }

    pub fn last_timestamp(&self) -> DateTime<Utc> {
        self.data.samples[self.len() - 1].timestamp
    }

    /// Complete subgroups of `subgroup_size()` consecutive samples.
    ///
    /// A trailing partial subgroup is dropped. In individual mode every
    /// sample is its own subgroup with range 0.
    pub fn subgroups(&self) -> Vec<Subgroup> {
        self.data
            .samples
            .chunks_exact(self.subgroup_size)
            .enumerate()
            .map(|(index, chunk)| {
                let (sum, min, max) = chunk.iter().fold(
                    (0.0, f64::INFINITY, f64::NEG_INFINITY),
                    |(sum, min, max), s| (sum + s.value, min.min(s.value), max.max(s.value)),
                );
                Subgroup {
                    index,
                    mean: sum / chunk.len() as f64,
                    range: max - min,
                    start: chunk[0].timestamp,
                }
            })
            .collect()
    }

    /// Returns `true` if both handles point at the same frozen snapshot.
    pub fn same_snapshot(&self, other: &MeasurementSeries) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
