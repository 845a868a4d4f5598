// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Typed time-series containers returned by statistic queries.

use crate::statistics::kind::StatisticType;
use serde::{Deserialize, Serialize};

/// A raw sample as recorded by the sampling machinery: a timestamp in
/// milliseconds since the Unix epoch and an untyped numeric value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timestamped {
    /// When the sample was taken.
    pub timestamp: u64,
    /// The recorded value.
    pub value: SampleValue,
}

impl Timestamped {
    /// Creates a raw sample.
    pub fn new(timestamp: u64, value: SampleValue) -> Self {
        Self { timestamp, value }
    }
}

/// The numeric representation of a raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SampleValue {
    /// Whole quantities: counts, sizes, nanosecond extremes.
    Integer(u64),
    /// Fractional quantities: rates, ratios, averages.
    Fractional(f64),
}

/// An immutable `(timestamp, value)` pair inside a typed history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample<T> {
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// The sampled value.
    pub value: T,
}

impl<T> Sample<T> {
    /// Creates a sample.
    pub fn new(timestamp: u64, value: T) -> Self {
        Self { timestamp, value }
    }
}

/// Unit attached to a typed history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatisticUnit {
    /// Dimensionless count.
    Count,
    /// Dimensionless ratio in `[0, 1]`.
    Ratio,
    /// Events per second.
    PerSecond,
    /// Nanoseconds.
    Nanoseconds,
    /// Bytes.
    Bytes,
}

/// A time-ascending sequence of samples sharing one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History<T> {
    samples: Vec<Sample<T>>,
    unit: StatisticUnit,
}

impl<T> History<T> {
    /// Wraps already ordered samples.
    pub fn new(samples: Vec<Sample<T>>, unit: StatisticUnit) -> Self {
        Self { samples, unit }
    }

    /// The samples, oldest first.
    pub fn samples(&self) -> &[Sample<T>] {
        &self.samples
    }

    /// The unit of every sample.
    pub fn unit(&self) -> StatisticUnit {
        self.unit
    }

    /// The most recent sample, if any.
    pub fn latest(&self) -> Option<&Sample<T>> {
        self.samples.last()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the history holds no sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The result of a statistic query: a history tagged with its kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "history", rename_all = "snake_case")]
pub enum StatisticHistory {
    /// Integer counts.
    Counter(History<u64>),
    /// Per-second rates.
    Rate(History<f64>),
    /// Minimum or maximum latency in nanoseconds.
    Duration(History<u64>),
    /// Average latency in nanoseconds.
    Average(History<f64>),
    /// Fractions in `[0, 1]`.
    Ratio(History<f64>),
    /// Byte sizes.
    Size(History<u64>),
}

impl StatisticHistory {
    /// The discovery kind this history corresponds to.
    pub fn statistic_type(&self) -> StatisticType {
        match self {
            StatisticHistory::Counter(_) => StatisticType::CounterHistory,
            StatisticHistory::Rate(_) => StatisticType::RateHistory,
            StatisticHistory::Duration(_) => StatisticType::DurationHistory,
            StatisticHistory::Average(_) => StatisticType::AverageHistory,
            StatisticHistory::Ratio(_) => StatisticType::RatioHistory,
            StatisticHistory::Size(_) => StatisticType::SizeHistory,
        }
    }

    /// The unit of the wrapped history.
    pub fn unit(&self) -> StatisticUnit {
        match self {
            StatisticHistory::Counter(h) | StatisticHistory::Duration(h) | StatisticHistory::Size(h) => {
                h.unit()
            }
            StatisticHistory::Rate(h) | StatisticHistory::Average(h) | StatisticHistory::Ratio(h) => {
                h.unit()
            }
        }
    }

    /// Number of samples in the wrapped history.
    pub fn len(&self) -> usize {
        match self {
            StatisticHistory::Counter(h) | StatisticHistory::Duration(h) | StatisticHistory::Size(h) => {
                h.len()
            }
            StatisticHistory::Rate(h) | StatisticHistory::Average(h) | StatisticHistory::Ratio(h) => {
                h.len()
            }
        }
    }

    /// Returns `true` if the wrapped history holds no sample.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The most recent value widened to `f64`, if any.
    pub fn latest_value(&self) -> Option<f64> {
        match self {
            StatisticHistory::Counter(h) | StatisticHistory::Duration(h) | StatisticHistory::Size(h) => {
                h.latest().map(|s| s.value as f64)
            }
            StatisticHistory::Rate(h) | StatisticHistory::Average(h) | StatisticHistory::Ratio(h) => {
                h.latest().map(|s| s.value)
            }
        }
    }

    /// Returns the ratio history, if this is one.
    pub fn as_ratio(&self) -> Option<&History<f64>> {
        match self {
            StatisticHistory::Ratio(h) => Some(h),
            _ => None,
        }
    }

    /// Returns the counter history, if this is one.
    pub fn as_counter(&self) -> Option<&History<u64>> {
        match self {
            StatisticHistory::Counter(h) => Some(h),
            _ => None,
        }
    }
}

/// An externally advertised, queryable statistic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StatisticDescriptor {
    /// The exact name to query.
    pub name: String,
    /// The kind of history a query returns.
    pub statistic_type: StatisticType,
}

impl StatisticDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, statistic_type: StatisticType) -> Self {
        Self {
            name: name.into(),
            statistic_type,
        }
    }
}
