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

//! The per-cache statistics engine and its standard catalog.

use std::collections::HashSet;

use strata_core::statistics::{
    CacheClearOutcome, CacheGetOutcome, OperationStatisticDescriptor, Outcome, StatisticDescriptor,
    StatisticHistory, StatisticsProviderConfiguration, StatisticsResult, TierEvictionOutcome,
    TierGetOutcome, ValueStatisticDescriptor,
};

use crate::context::StatisticsContext;
use crate::provider::{descriptors, resolver, sampler};
use crate::registry::StatisticsRegistry;

/// Tag carried by cache-level operations.
pub const CACHE_TAG: &str = "cache";
/// Tag carried by tier-level operations and values.
pub const TIER_TAG: &str = "tier";

/// Statistics of one cache, queryable by name.
///
/// Construction registers the standard catalog against whatever the context
/// publishes: cache-level hit, miss and clear statistics, and per-tier hit,
/// miss, eviction, mapping and memory statistics prefixed with the tier name.
#[derive(Debug)]
pub struct StandardStatistics {
    registry: StatisticsRegistry,
}

impl StandardStatistics {
    /// Builds the engine over `context`.
    ///
    /// If any registration fails, everything registered so far is cleared and
    /// the error is returned.
    pub fn new(
        context: &StatisticsContext,
        configuration: &StatisticsProviderConfiguration,
    ) -> StatisticsResult<Self> {
        let registry = StatisticsRegistry::new(context.clone(), configuration)?;
        if let Err(err) = register_catalog(&registry) {
            log::warn!("Failed to register standard statistics: {err}");
            registry.clear_registrations();
            return Err(err);
        }
        log::info!("Registered {} standard statistics", registry.len());
        Ok(Self { registry })
    }

    /// Returns the samples of the statistic named `name` taken at or after `since`.
    pub fn query_statistic(&self, name: &str, since: u64) -> StatisticsResult<StatisticHistory> {
        let statistic = resolver::resolve(&self.registry, name)?;
        sampler::sample_history(&statistic, since)
    }

    /// Every name [`query_statistic`](Self::query_statistic) accepts.
    pub fn get_descriptors(&self) -> HashSet<StatisticDescriptor> {
        descriptors::get_descriptors(&self.registry)
    }

    /// Samples every active statistic now.
    pub fn sample(&self) {
        self.registry.sample();
    }

    /// Drops every registration. Safe to call more than once.
    pub fn dispose(&self) {
        self.registry.clear_registrations();
        log::debug!("Disposed statistics");
    }

    /// The underlying ledger.
    pub fn registry(&self) -> &StatisticsRegistry {
        &self.registry
    }
}

fn register_catalog(registry: &StatisticsRegistry) -> StatisticsResult<()> {
    let cache_get = OperationStatisticDescriptor::<CacheGetOutcome>::descriptor("get", [CACHE_TAG]);
    let cache_clear =
        OperationStatisticDescriptor::<CacheClearOutcome>::descriptor("clear", [CACHE_TAG]);

    registry.register_compound_operations(
        "Cache:Hit",
        &cache_get,
        &[CacheGetOutcome::HitNoLoader, CacheGetOutcome::HitWithLoader],
    )?;
    registry.register_compound_operations(
        "Cache:Miss",
        &cache_get,
        &[CacheGetOutcome::MissNoLoader, CacheGetOutcome::MissWithLoader],
    )?;
    registry.register_compound_operations("Cache:Clear", &cache_clear, CacheClearOutcome::ALL)?;
    registry.register_ratios(
        "Cache:HitRatio",
        &cache_get,
        &[CacheGetOutcome::HitNoLoader, CacheGetOutcome::HitWithLoader],
        CacheGetOutcome::ALL,
    )?;
    registry.register_ratios(
        "Cache:MissRatio",
        &cache_get,
        &[CacheGetOutcome::MissNoLoader, CacheGetOutcome::MissWithLoader],
        CacheGetOutcome::ALL,
    )?;

    let tier_get = OperationStatisticDescriptor::<TierGetOutcome>::descriptor("get", [TIER_TAG]);
    let tier_eviction =
        OperationStatisticDescriptor::<TierEvictionOutcome>::descriptor("eviction", [TIER_TAG]);

    registry.register_compound_operations("Hit", &tier_get, &[TierGetOutcome::Hit])?;
    registry.register_compound_operations("Miss", &tier_get, &[TierGetOutcome::Miss])?;
    registry.register_compound_operations("Eviction", &tier_eviction, TierEvictionOutcome::ALL)?;
    registry.register_ratios("HitRatio", &tier_get, &[TierGetOutcome::Hit], TierGetOutcome::ALL)?;
    registry.register_ratios("MissRatio", &tier_get, &[TierGetOutcome::Miss], TierGetOutcome::ALL)?;

    registry.register_counter(
        "MappingCount",
        &ValueStatisticDescriptor::descriptor("mappings", [TIER_TAG]),
    )?;
    registry.register_counter(
        "MaxMappingCount",
        &ValueStatisticDescriptor::descriptor("maxMappings", [TIER_TAG]),
    )?;
    registry.register_size(
        "AllocatedByteSize",
        &ValueStatisticDescriptor::descriptor("allocatedMemory", [TIER_TAG]),
    )?;
    registry.register_size(
        "OccupiedByteSize",
        &ValueStatisticDescriptor::descriptor("occupiedMemory", [TIER_TAG]),
    )?;
    Ok(())
}
