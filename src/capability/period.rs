//! Realized capability per calendar period.
//!
//! Samples are bucketed by shift, day, week or month and each bucket is run
//! through [`SpecLimits::compute`]. The Cpk of every bucket that has one
//! becomes a point of a new [`MeasurementSeries`], which is what the
//! forecaster consumes as CPK history.
//!
//! | Period | Bucket |
//! |--------|--------|
//! | shift | morning 06-14, afternoon 14-22, night 22-06 (crosses midnight) |
//! | day | 00:00 to 24:00 |
//! | week | Monday 00:00 to the following Monday |
//! | month | first of the month 00:00 |
//!
//! Buckets are computed on UTC timestamps.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::indices::{CapabilityIndices, SpecLimits};
use crate::error::SpcError;
use crate::series::{MeasurementSeries, Sample};

/// Aggregation period for realized capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Shift,
    #[default]
    Day,
    Week,
    Month,
}

/// Production shift of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    /// 06:00 to 14:00.
    Morning,
    /// 14:00 to 22:00.
    Afternoon,
    /// 22:00 to 06:00 the next day.
    Night,
}

impl Shift {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=13 => Shift::Morning,
            14..=21 => Shift::Afternoon,
            _ => Shift::Night,
        }
    }

    pub fn start_hour(self) -> u32 {
        match self {
            Shift::Morning => 6,
            Shift::Afternoon => 14,
            Shift::Night => 22,
        }
    }
}

impl Period {
    /// Start of the bucket containing `ts`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use spc_core::capability::Period;
    ///
    /// // 03:00 belongs to the night shift that began at 22:00 the day before.
    /// let ts = Utc.with_ymd_and_hms(2024, 3, 5, 3, 0, 0).unwrap();
    /// assert_eq!(
    ///     Period::Shift.bucket_start(ts),
    ///     Utc.with_ymd_and_hms(2024, 3, 4, 22, 0, 0).unwrap()
    /// );
    /// ```
    pub fn bucket_start(self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let date = ts.date_naive();
        let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        match self {
            Period::Day => midnight,
            Period::Shift => {
                let hour = ts.hour();
                let shift = Shift::from_hour(hour);
                if shift == Shift::Night && hour < shift.start_hour() {
                    midnight - Duration::hours(24 - i64::from(shift.start_hour()))
                } else {
                    midnight + Duration::hours(i64::from(shift.start_hour()))
                }
            }
            Period::Week => {
                midnight - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Period::Month => midnight - Duration::days(i64::from(date.day0())),
        }
    }
}

/// Capability of one period bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCapability {
    pub period: Period,
    /// Start of the bucket.
    pub start: DateTime<Utc>,
    /// Number of samples in the bucket.
    pub samples: usize,
    pub indices: CapabilityIndices,
}

/// Capability indices for every non-empty `period` bucket of `series`, in
/// time order. Buckets keep the series' subgroup size.
///
/// # Errors
///
/// Propagates [`SpcError`] from rebuilding a bucket; a valid series never
/// produces one.
pub fn capability_by_period(
    series: &MeasurementSeries,
    spec: &SpecLimits,
    period: Period,
) -> Result<Vec<PeriodCapability>, SpcError> {
    let samples = series.samples();
    let mut buckets = Vec::new();
    let mut begin = 0;
    while begin < samples.len() {
        let start = period.bucket_start(samples[begin].timestamp);
        let len = samples[begin..]
            .iter()
            .take_while(|s| period.bucket_start(s.timestamp) == start)
            .count();
        let chunk: Vec<Sample> = samples[begin..begin + len].to_vec();
        let bucket = MeasurementSeries::new(chunk)?.with_subgroup_size(series.subgroup_size())?;
        buckets.push(PeriodCapability {
            period,
            start,
            samples: len,
            indices: spec.compute(&bucket),
        });
        begin += len;
    }
    Ok(buckets)
}

/// Realized Cpk per `period` bucket as a series stamped at each bucket start.
///
/// Buckets without a Cpk (too few samples, zero variance, no spec limit)
/// are skipped. `None` when no bucket has one.
///
/// # Errors
///
/// Same as [`capability_by_period`].
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use spc_core::capability::{cpk_by_period, Period, SpecLimits};
/// use spc_core::series::{MeasurementSeries, Sample};
///
/// let origin = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
/// let samples = (0..72)
///     .map(|h| Sample::new(origin + Duration::hours(h), 10.0 + 0.1 * ((h * 7) % 5) as f64))
///     .collect();
/// let series = MeasurementSeries::new(samples).unwrap();
/// let spec = SpecLimits::new(Some(11.0), Some(9.0)).unwrap();
///
/// let cpk = cpk_by_period(&series, &spec, Period::Day).unwrap().unwrap();
/// assert_eq!(cpk.len(), 3);
/// assert_eq!(cpk.first_timestamp(), origin);
/// ```
pub fn cpk_by_period(
    series: &MeasurementSeries,
    spec: &SpecLimits,
    period: Period,
) -> Result<Option<MeasurementSeries>, SpcError> {
    let points: Vec<Sample> = capability_by_period(series, spec, period)?
        .into_iter()
        .filter_map(|b| b.indices.cpk.map(|cpk| Sample::new(b.start, cpk)))
        .collect();
    if points.is_empty() {
        return Ok(None);
    }
    MeasurementSeries::new(points).map(Some)
}
