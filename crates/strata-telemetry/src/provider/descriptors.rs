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

//! Discovery: the full catalog of queryable names derived from the ledger.

use std::collections::HashSet;

use strata_core::statistics::{StatisticDescriptor, StatisticKind, StatisticType};

use crate::provider::resolver::{COMPOUND_SUFFIXES, RATIO_SUFFIX};
use crate::registry::StatisticsRegistry;

/// Lists every name a query can use, with the kind of history it returns.
///
/// Ratio entries are advertised with an extra `Ratio` suffix. Compound entries
/// are advertised only through their five sub-metrics.
pub fn get_descriptors(registry: &StatisticsRegistry) -> HashSet<StatisticDescriptor> {
    let mut descriptors = HashSet::new();
    for (name, kind) in registry.get_registrations() {
        match kind {
            StatisticKind::Counter => {
                descriptors.insert(StatisticDescriptor::new(name, StatisticType::CounterHistory));
            }
            StatisticKind::Size => {
                descriptors.insert(StatisticDescriptor::new(name, StatisticType::SizeHistory));
            }
            StatisticKind::Ratio => {
                descriptors.insert(StatisticDescriptor::new(
                    format!("{name}{RATIO_SUFFIX}"),
                    StatisticType::RatioHistory,
                ));
            }
            StatisticKind::Compound => {
                descriptors.extend(COMPOUND_SUFFIXES.iter().map(|(suffix, sample_type)| {
                    StatisticDescriptor::new(format!("{name}{suffix}"), (*sample_type).into())
                }));
            }
        }
    }
    descriptors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StatisticsContext;
    use std::sync::Arc;
    use strata_core::statistics::{
        OperationStatisticDescriptor, Outcome, StatisticsProviderConfiguration,
        TierEvictionOutcome, TierGetOutcome, ValueStatisticDescriptor,
    };
    use strata_core::ManualClock;

    #[test]
    fn test_catalog_per_kind() {
        let context = StatisticsContext::new(Arc::new(ManualClock::new(0)));
        context.operation_observer::<TierGetOutcome>("get", &["tier"], Some("OnHeap"));
        context.operation_observer::<TierEvictionOutcome>("eviction", &["tier"], Some("OnHeap"));
        context.register_value("occupiedMemory", &["tier"], Some("OnHeap"), || 0);
        let registry =
            StatisticsRegistry::new(context, &StatisticsProviderConfiguration::default()).unwrap();

        let get = OperationStatisticDescriptor::<TierGetOutcome>::descriptor("get", ["tier"]);
        let eviction =
            OperationStatisticDescriptor::<TierEvictionOutcome>::descriptor("eviction", ["tier"]);
        registry
            .register_ratios("MissRatio", &get, &[TierGetOutcome::Miss], TierGetOutcome::ALL)
            .unwrap();
        registry
            .register_compound_operations("Eviction", &eviction, TierEvictionOutcome::ALL)
            .unwrap();
        registry
            .register_size(
                "OccupiedByteSize",
                &ValueStatisticDescriptor::descriptor("occupiedMemory", ["tier"]),
            )
            .unwrap();

        let descriptors = get_descriptors(&registry);
        assert_eq!(descriptors.len(), 7);
        let expected = [
            ("OnHeap:MissRatioRatio", StatisticType::RatioHistory),
            ("OnHeap:OccupiedByteSize", StatisticType::SizeHistory),
            ("OnHeap:EvictionCount", StatisticType::CounterHistory),
            ("OnHeap:EvictionRate", StatisticType::RateHistory),
            ("OnHeap:EvictionLatencyMinimum", StatisticType::DurationHistory),
            ("OnHeap:EvictionLatencyMaximum", StatisticType::DurationHistory),
            ("OnHeap:EvictionLatencyAverage", StatisticType::AverageHistory),
        ];
        for (name, statistic_type) in expected {
            assert!(
                descriptors.contains(&StatisticDescriptor::new(name, statistic_type)),
                "missing {name}"
            );
        }
        assert!(!descriptors.iter().any(|d| d.name == "OnHeap:Eviction"));
    }

    #[test]
    fn test_empty_ledger_has_empty_catalog() {
        let registry = StatisticsRegistry::new(
            StatisticsContext::default(),
            &StatisticsProviderConfiguration::default(),
        )
        .unwrap();
        assert!(get_descriptors(&registry).is_empty());
    }
}
