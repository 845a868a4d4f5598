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

//! Name resolution: direct entries first, then compound sub-metrics by suffix.

use strata_core::statistics::{SampleType, StatisticsError, StatisticsResult};

use crate::registry::StatisticsRegistry;
use crate::sampling::SampledStatistic;

/// Suffix rules for compound sub-metrics, tried in this order.
pub const COMPOUND_SUFFIXES: [(&str, SampleType); 5] = [
    ("Count", SampleType::Counter),
    ("Rate", SampleType::Rate),
    ("LatencyMinimum", SampleType::LatencyMin),
    ("LatencyMaximum", SampleType::LatencyMax),
    ("LatencyAverage", SampleType::LatencyAvg),
];

/// Suffix under which ratio entries are advertised.
pub const RATIO_SUFFIX: &str = "Ratio";

/// Resolves `name` against the ledger.
///
/// A counter, size or ratio entry registered under exactly `name` wins. Otherwise
/// the first suffix rule whose prefix names a compound entry selects that
/// sub-metric. Finally `<ratio>Ratio` falls back to the ratio entry `<ratio>`.
pub fn resolve(registry: &StatisticsRegistry, name: &str) -> StatisticsResult<SampledStatistic> {
    if let Some(statistic) = registry.find_sampled_statistic(name) {
        return Ok(statistic);
    }

    for (suffix, sample_type) in COMPOUND_SUFFIXES {
        let Some(prefix) = name.strip_suffix(suffix) else {
            continue;
        };
        if let Some(statistic) = registry.find_sampled_compound_statistic(prefix, sample_type) {
            return Ok(statistic);
        }
    }

    if let Some(prefix) = name.strip_suffix(RATIO_SUFFIX) {
        if let Some(statistic) = registry.find_sampled_statistic(prefix) {
            if statistic.sample_type() == SampleType::Ratio {
                return Ok(statistic);
            }
        }
    }

    log::trace!("Statistic '{name}' did not resolve");
    Err(StatisticsError::UnknownStatistic(name.to_string()))
}
