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

//! Conversion of raw sampled series into typed histories.

use strata_core::statistics::{
    History, Sample, SampleType, SampleValue, StatisticHistory, StatisticUnit, StatisticsError,
    StatisticsResult, Timestamped,
};

use crate::sampling::SampledStatistic;

/// Copies the samples of `statistic` taken at or after `since` into a typed history.
pub fn sample_history(statistic: &SampledStatistic, since: u64) -> StatisticsResult<StatisticHistory> {
    to_history(statistic.sample_type(), statistic.history(since))
}

/// Wraps raw samples of a series of `sample_type` in the matching history.
///
/// Fails with [`StatisticsError::UnsupportedKind`] when a sample's numeric
/// representation disagrees with the series kind.
pub fn to_history(
    sample_type: SampleType,
    samples: Vec<Timestamped>,
) -> StatisticsResult<StatisticHistory> {
    let history = match sample_type {
        SampleType::Counter => {
            StatisticHistory::Counter(integers(sample_type, samples, StatisticUnit::Count)?)
        }
        SampleType::Rate => {
            StatisticHistory::Rate(fractions(sample_type, samples, StatisticUnit::PerSecond)?)
        }
        SampleType::LatencyMin | SampleType::LatencyMax => {
            StatisticHistory::Duration(integers(sample_type, samples, StatisticUnit::Nanoseconds)?)
        }
        SampleType::LatencyAvg => {
            StatisticHistory::Average(fractions(sample_type, samples, StatisticUnit::Nanoseconds)?)
        }
        SampleType::Ratio => {
            StatisticHistory::Ratio(fractions(sample_type, samples, StatisticUnit::Ratio)?)
        }
        SampleType::Size => {
            StatisticHistory::Size(integers(sample_type, samples, StatisticUnit::Bytes)?)
        }
    };
    Ok(history)
}

fn integers(
    sample_type: SampleType,
    samples: Vec<Timestamped>,
    unit: StatisticUnit,
) -> StatisticsResult<History<u64>> {
    let samples = samples
        .into_iter()
        .map(|sample| match sample.value {
            SampleValue::Integer(value) => Ok(Sample::new(sample.timestamp, value)),
            SampleValue::Fractional(_) => Err(mismatch(sample_type, &sample)),
        })
        .collect::<StatisticsResult<Vec<_>>>()?;
    Ok(History::new(samples, unit))
}

fn fractions(
    sample_type: SampleType,
    samples: Vec<Timestamped>,
    unit: StatisticUnit,
) -> StatisticsResult<History<f64>> {
    let samples = samples
        .into_iter()
        .map(|sample| match sample.value {
            SampleValue::Fractional(value) => Ok(Sample::new(sample.timestamp, value)),
            SampleValue::Integer(_) => Err(mismatch(sample_type, &sample)),
        })
        .collect::<StatisticsResult<Vec<_>>>()?;
    Ok(History::new(samples, unit))
}

fn mismatch(sample_type: SampleType, sample: &Timestamped) -> StatisticsError {
    StatisticsError::UnsupportedKind(format!(
        "{sample_type} series holds {:?} at {}",
        sample.value, sample.timestamp
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::SampleHistory;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    #[test]
    fn test_units_follow_sample_type() {
        let cases = [
            (SampleType::Counter, SampleValue::Integer(4), StatisticUnit::Count),
            (SampleType::Rate, SampleValue::Fractional(0.5), StatisticUnit::PerSecond),
            (SampleType::LatencyMin, SampleValue::Integer(10), StatisticUnit::Nanoseconds),
            (SampleType::LatencyMax, SampleValue::Integer(90), StatisticUnit::Nanoseconds),
            (SampleType::LatencyAvg, SampleValue::Fractional(42.5), StatisticUnit::Nanoseconds),
            (SampleType::Ratio, SampleValue::Fractional(0.25), StatisticUnit::Ratio),
            (SampleType::Size, SampleValue::Integer(4096), StatisticUnit::Bytes),
        ];
        for (sample_type, value, unit) in cases {
            let history = to_history(sample_type, vec![Timestamped::new(1, value)]).unwrap();
            assert_eq!(history.unit(), unit, "{sample_type}");
            assert_eq!(history.statistic_type(), sample_type.into());
        }
    }

    #[test]
    fn test_since_cutoff_is_inclusive() {
        let series = Arc::new(SampleHistory::new(8));
        series.push(100, SampleValue::Fractional(0.1));
        series.push(200, SampleValue::Fractional(0.2));
        series.push(300, SampleValue::Fractional(0.3));
        let statistic = SampledStatistic::new(SampleType::Ratio, series);

        let history = sample_history(&statistic, 200).unwrap();
        let ratios = history.as_ratio().unwrap();
        assert_eq!(ratios.len(), 2);
        assert_eq!(ratios.samples()[0].timestamp, 200);
        assert_relative_eq!(ratios.samples()[1].value, 0.3);

        assert!(sample_history(&statistic, 301).unwrap().is_empty());
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let result = to_history(
            SampleType::Counter,
            vec![
                Timestamped::new(1, SampleValue::Integer(1)),
                Timestamped::new(2, SampleValue::Fractional(1.5)),
            ],
        );
        assert!(matches!(result, Err(StatisticsError::UnsupportedKind(_))));
    }
}
