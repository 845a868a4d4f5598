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

//! Kind tags for registered statistics, resolved samples, and advertised histories.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The kind of an entry in the registration ledger.
///
/// Fixed at registration time. A [`StatisticKind::Compound`] entry has no value
/// of its own and is only reachable through its suffixed sub-metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatisticKind {
    /// A directly observed monotonic count.
    Counter,
    /// A numerator outcome subset divided by a denominator outcome subset.
    Ratio,
    /// A directly observed byte size.
    Size,
    /// A derived operation statistic exposing count, rate, and latencies.
    Compound,
}

/// The kind of a sampled series once a name has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleType {
    /// Integer event count.
    Counter,
    /// Events per second.
    Rate,
    /// Smallest observed latency, in nanoseconds.
    LatencyMin,
    /// Largest observed latency, in nanoseconds.
    LatencyMax,
    /// Mean observed latency, in nanoseconds.
    LatencyAvg,
    /// Dimensionless fraction in `[0, 1]`.
    Ratio,
    /// Byte size.
    Size,
}

impl Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SampleType::Counter => "COUNTER",
            SampleType::Rate => "RATE",
            SampleType::LatencyMin => "LATENCY_MIN",
            SampleType::LatencyMax => "LATENCY_MAX",
            SampleType::LatencyAvg => "LATENCY_AVG",
            SampleType::Ratio => "RATIO",
            SampleType::Size => "SIZE",
        };
        f.write_str(name)
    }
}

/// The kind of history advertised by a discovery descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatisticType {
    /// History of integer counts.
    CounterHistory,
    /// History of per-second rates.
    RateHistory,
    /// History of integer nanosecond durations.
    DurationHistory,
    /// History of fractional nanosecond averages.
    AverageHistory,
    /// History of ratios.
    RatioHistory,
    /// History of byte sizes.
    SizeHistory,
}

impl From<SampleType> for StatisticType {
    fn from(sample_type: SampleType) -> Self {
        match sample_type {
            SampleType::Counter => StatisticType::CounterHistory,
            SampleType::Rate => StatisticType::RateHistory,
            SampleType::LatencyMin | SampleType::LatencyMax => StatisticType::DurationHistory,
            SampleType::LatencyAvg => StatisticType::AverageHistory,
            SampleType::Ratio => StatisticType::RatioHistory,
            SampleType::Size => StatisticType::SizeHistory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_extremes_share_duration_history() {
        assert_eq!(
            StatisticType::from(SampleType::LatencyMin),
            StatisticType::DurationHistory
        );
        assert_eq!(
            StatisticType::from(SampleType::LatencyMax),
            StatisticType::DurationHistory
        );
        assert_eq!(
            StatisticType::from(SampleType::LatencyAvg),
            StatisticType::AverageHistory
        );
    }

    #[test]
    fn test_statistic_type_serializes_screaming_case() {
        let json = serde_json::to_string(&StatisticType::RatioHistory).unwrap();
        assert_eq!(json, "\"RATIO_HISTORY\"");
    }

    #[test]
    fn test_sample_type_display() {
        assert_eq!(SampleType::LatencyAvg.to_string(), "LATENCY_AVG");
    }
}
