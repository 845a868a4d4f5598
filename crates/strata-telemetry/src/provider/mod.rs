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

//! Query surface: name resolution, typed histories, discovery, and the
//! per-cache and multi-cache engines built on them.

pub mod descriptors;
pub mod resolver;
pub mod sampler;
pub mod standard;

pub use standard::StandardStatistics;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use strata_core::statistics::{
    StatisticDescriptor, StatisticHistory, StatisticsError, StatisticsProviderConfiguration,
    StatisticsResult,
};

use crate::context::StatisticsContext;

/// Manages the statistics of several caches, keyed by alias.
///
/// Every cache shares one configuration.
#[derive(Debug)]
pub struct StatisticsProvider {
    configuration: StatisticsProviderConfiguration,
    caches: RwLock<HashMap<String, Arc<StandardStatistics>>>,
}

impl StatisticsProvider {
    /// Creates a provider with no cache bound.
    pub fn new(configuration: StatisticsProviderConfiguration) -> StatisticsResult<Self> {
        configuration.validate()?;
        Ok(Self {
            configuration,
            caches: RwLock::new(HashMap::new()),
        })
    }

    /// The configuration applied to every cache.
    pub fn configuration(&self) -> &StatisticsProviderConfiguration {
        &self.configuration
    }

    /// Builds the standard statistics of `context` and binds them to `alias`.
    pub fn register(&self, alias: &str, context: &StatisticsContext) -> StatisticsResult<()> {
        let mut caches = self
            .caches
            .write()
            .map_err(|_| StatisticsError::StorageError("Failed to acquire write lock".to_string()))?;
        if caches.contains_key(alias) {
            return Err(StatisticsError::DuplicateRegistration(alias.to_string()));
        }
        let statistics = StandardStatistics::new(context, &self.configuration)?;
        caches.insert(alias.to_string(), Arc::new(statistics));
        log::info!("Bound statistics of cache '{alias}'");
        Ok(())
    }

    /// Disposes and unbinds the statistics of `alias`.
    pub fn unregister(&self, alias: &str) -> StatisticsResult<()> {
        let removed = self
            .caches
            .write()
            .map_err(|_| StatisticsError::StorageError("Failed to acquire write lock".to_string()))?
            .remove(alias);
        match removed {
            Some(statistics) => {
                statistics.dispose();
                log::info!("Unbound statistics of cache '{alias}'");
                Ok(())
            }
            None => Err(StatisticsError::UnknownContext(alias.to_string())),
        }
    }

    /// The statistics bound to `alias`.
    pub fn statistics(&self, alias: &str) -> StatisticsResult<Arc<StandardStatistics>> {
        self.caches
            .read()
            .map_err(|_| StatisticsError::StorageError("Failed to acquire read lock".to_string()))?
            .get(alias)
            .cloned()
            .ok_or_else(|| StatisticsError::UnknownContext(alias.to_string()))
    }

    /// Every queryable name of the cache `alias`.
    pub fn descriptors(&self, alias: &str) -> StatisticsResult<HashSet<StatisticDescriptor>> {
        Ok(self.statistics(alias)?.get_descriptors())
    }

    /// Queries one statistic of the cache `alias`.
    pub fn query(&self, alias: &str, name: &str, since: u64) -> StatisticsResult<StatisticHistory> {
        self.statistics(alias)?.query_statistic(name, since)
    }

    /// Queries several statistics of the cache `alias` at once.
    ///
    /// Fails on the first name that does not resolve.
    pub fn collect_statistics<'a, I>(
        &self,
        alias: &str,
        names: I,
        since: u64,
    ) -> StatisticsResult<BTreeMap<String, StatisticHistory>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let statistics = self.statistics(alias)?;
        names
            .into_iter()
            .map(|name| Ok((name.to_string(), statistics.query_statistic(name, since)?)))
            .collect()
    }

    /// Samples the statistics of every bound cache.
    pub fn sample_all(&self) {
        for statistics in self.snapshot() {
            statistics.sample();
        }
    }

    /// Aliases of the bound caches, sorted.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self
            .caches
            .read()
            .map(|caches| caches.keys().cloned().collect())
            .unwrap_or_default();
        aliases.sort();
        aliases
    }

    fn snapshot(&self) -> Vec<Arc<StandardStatistics>> {
        self.caches
            .read()
            .map(|caches| caches.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for StatisticsProvider {
    fn default() -> Self {
        Self {
            configuration: StatisticsProviderConfiguration::default(),
            caches: RwLock::new(HashMap::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::standard::TIER_TAG;
    use strata_core::statistics::{StatisticType, TierGetOutcome};
    use strata_core::ManualClock;

    fn tier_context(clock: Arc<ManualClock>) -> StatisticsContext {
        let context = StatisticsContext::new(clock);
        context.operation_observer::<TierGetOutcome>("get", &[TIER_TAG], Some("OnHeap"));
        context
    }

    #[test]
    fn test_register_and_unregister() {
        let provider = StatisticsProvider::default();
        let clock = Arc::new(ManualClock::new(0));
        provider.register("users", &tier_context(clock.clone())).unwrap();
        provider.register("orders", &tier_context(clock)).unwrap();
        assert_eq!(provider.aliases(), vec!["orders".to_string(), "users".to_string()]);

        let descriptors = provider.descriptors("users").unwrap();
        assert!(descriptors.contains(&StatisticDescriptor::new(
            "OnHeap:HitRatioRatio",
            StatisticType::RatioHistory
        )));

        provider.unregister("users").unwrap();
        assert_eq!(
            provider.query("users", "OnHeap:HitCount", 0).unwrap_err(),
            StatisticsError::UnknownContext("users".to_string())
        );
        assert!(provider.unregister("users").is_err());
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let provider = StatisticsProvider::default();
        let context = tier_context(Arc::new(ManualClock::new(0)));
        provider.register("users", &context).unwrap();
        assert_eq!(
            provider.register("users", &context).unwrap_err(),
            StatisticsError::DuplicateRegistration("users".to_string())
        );
    }

    #[test]
    fn test_collect_statistics() {
        let provider = StatisticsProvider::default();
        let clock = Arc::new(ManualClock::new(0));
        let context = tier_context(clock.clone());
        provider.register("users", &context).unwrap();

        clock.advance(1_000);
        provider.sample_all();

        let collected = provider
            .collect_statistics("users", ["OnHeap:HitCount", "OnHeap:MissRate"], 0)
            .unwrap();
        assert_eq!(collected.len(), 2);
        assert_eq!(collected["OnHeap:HitCount"].len(), 1);
        assert_eq!(collected["OnHeap:HitCount"].latest_value(), Some(0.0));

        assert!(matches!(
            provider.collect_statistics("users", ["OnHeap:HitCount", "OnHeap:Hit"], 0),
            Err(StatisticsError::UnknownStatistic(name)) if name == "OnHeap:Hit"
        ));
    }

    #[test]
    fn test_invalid_configuration_is_rejected() {
        let configuration = StatisticsProviderConfiguration {
            history_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            StatisticsProvider::new(configuration),
            Err(StatisticsError::InvalidConfiguration(_))
        ));
    }
}
