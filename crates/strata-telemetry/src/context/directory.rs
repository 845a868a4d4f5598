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

//! Directory of instrumented operations and observed values.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use strata_core::statistics::{Outcome, OperationStatisticDescriptor, ValueStatisticDescriptor};
use strata_core::{Clock, SystemClock};

use super::observer::{OperationObserver, OutcomeSource};

/// A callback yielding the current value of an observed quantity.
pub type ValueSource = Arc<dyn Fn() -> u64 + Send + Sync>;

struct OperationEntry {
    name: String,
    tags: BTreeSet<String>,
    discriminator: Option<String>,
    observer: Arc<dyn Any + Send + Sync>,
    source: Arc<dyn OutcomeSource>,
}

struct ValueEntry {
    name: String,
    tags: BTreeSet<String>,
    discriminator: Option<String>,
    source: ValueSource,
}

#[derive(Default)]
struct Entries {
    operations: Vec<OperationEntry>,
    values: Vec<ValueEntry>,
}

/// An operation source matched by a descriptor.
#[derive(Debug, Clone)]
pub struct FoundOperation {
    /// Label of the publishing component (e.g. the tier name), if any.
    pub discriminator: Option<String>,
    /// Read access to the observer's counters.
    pub source: Arc<dyn OutcomeSource>,
}

/// A value source matched by a descriptor.
#[derive(Clone)]
pub struct FoundValue {
    /// Label of the publishing component (e.g. the tier name), if any.
    pub discriminator: Option<String>,
    /// Callback returning the current value.
    pub source: ValueSource,
}

impl Debug for FoundValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoundValue")
            .field("discriminator", &self.discriminator)
            .finish_non_exhaustive()
    }
}

/// A thread-safe directory where an instrumented cache publishes its statistics sources.
///
/// Cloning is cheap and yields a handle to the same directory.
#[derive(Clone)]
pub struct StatisticsContext {
    entries: Arc<RwLock<Entries>>,
    clock: Arc<dyn Clock>,
}

impl StatisticsContext {
    /// Creates an empty context timestamping latencies with `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            clock,
        }
    }

    /// The clock shared with every observer created by this context.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Creates and publishes an observer for the operation `name`.
    ///
    /// `discriminator` labels the publishing component when several publish the
    /// same operation (one observer per tier, for instance).
    pub fn operation_observer<O: Outcome>(
        &self,
        name: &str,
        tags: &[&str],
        discriminator: Option<&str>,
    ) -> Arc<OperationObserver<O>> {
        let observer = Arc::new(OperationObserver::<O>::new(self.clock.clone()));
        let entry = OperationEntry {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            discriminator: discriminator.map(str::to_string),
            observer: observer.clone(),
            source: observer.clone(),
        };
        self.write_entries().operations.push(entry);
        log::debug!(
            "Published operation '{}' ({:?}) for {:?}",
            name,
            tags,
            discriminator
        );
        observer
    }

    /// Publishes a value source for the quantity `name`.
    pub fn register_value<F>(&self, name: &str, tags: &[&str], discriminator: Option<&str>, source: F)
    where
        F: Fn() -> u64 + Send + Sync + 'static,
    {
        let entry = ValueEntry {
            name: name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            discriminator: discriminator.map(str::to_string),
            source: Arc::new(source),
        };
        self.write_entries().values.push(entry);
    }

    /// Finds every published observer matching `descriptor` whose outcome type is `O`.
    pub fn find_operations<O: Outcome>(
        &self,
        descriptor: &OperationStatisticDescriptor<O>,
    ) -> Vec<FoundOperation> {
        self.read_entries()
            .operations
            .iter()
            .filter(|entry| descriptor.matches(&entry.name, &entry.tags))
            .filter(|entry| entry.observer.is::<OperationObserver<O>>())
            .map(|entry| FoundOperation {
                discriminator: entry.discriminator.clone(),
                source: entry.source.clone(),
            })
            .collect()
    }

    /// Finds every published value source matching `descriptor`.
    pub fn find_values(&self, descriptor: &ValueStatisticDescriptor) -> Vec<FoundValue> {
        self.read_entries()
            .values
            .iter()
            .filter(|entry| descriptor.matches(&entry.name, &entry.tags))
            .map(|entry| FoundValue {
                discriminator: entry.discriminator.clone(),
                source: entry.source.clone(),
            })
            .collect()
    }

    /// Number of published operations and values.
    pub fn len(&self) -> usize {
        let entries = self.read_entries();
        entries.operations.len() + entries.values.len()
    }

    /// Returns `true` if nothing has been published.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| {
            log::warn!("Statistics context lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| {
            log::warn!("Statistics context lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl Default for StatisticsContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl Debug for StatisticsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsContext")
            .field("entries", &self.len())
            .field("clock", &self.clock)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::statistics::{CacheGetOutcome, TierEvictionOutcome, TierGetOutcome};

    #[test]
    fn test_find_operations_by_tags_and_type() {
        let context = StatisticsContext::default();
        let _cache_get = context.operation_observer::<CacheGetOutcome>("get", &["cache"], None);
        let heap_get = context.operation_observer::<TierGetOutcome>("get", &["tier"], Some("OnHeap"));
        let _disk_get = context.operation_observer::<TierGetOutcome>("get", &["tier"], Some("Disk"));
        let _eviction =
            context.operation_observer::<TierEvictionOutcome>("eviction", &["tier"], Some("OnHeap"));

        let descriptor = OperationStatisticDescriptor::<TierGetOutcome>::descriptor("get", ["tier"]);
        let found = context.find_operations(&descriptor);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].discriminator.as_deref(), Some("OnHeap"));
        assert_eq!(found[1].discriminator.as_deref(), Some("Disk"));

        heap_get.record(TierGetOutcome::Hit);
        assert_eq!(found[0].source.count(&[TierGetOutcome::Hit.ordinal()]), 1);

        let cache = OperationStatisticDescriptor::<CacheGetOutcome>::descriptor("get", ["cache"]);
        assert_eq!(context.find_operations(&cache).len(), 1);
    }

    #[test]
    fn test_outcome_type_must_match() {
        let context = StatisticsContext::default();
        context.operation_observer::<TierGetOutcome>("get", &["tier"], None);

        let wrong = OperationStatisticDescriptor::<CacheGetOutcome>::descriptor("get", ["tier"]);
        assert!(context.find_operations(&wrong).is_empty());
    }

    #[test]
    fn test_find_values() {
        let context = StatisticsContext::default();
        context.register_value("mappings", &["tier"], Some("OnHeap"), || 42);
        context.register_value("mappings", &["cache"], None, || 7);

        let descriptor = ValueStatisticDescriptor::descriptor("mappings", ["tier"]);
        let found = context.find_values(&descriptor);
        assert_eq!(found.len(), 1);
        assert_eq!((found[0].source)(), 42);
        assert_eq!(context.len(), 2);
    }
}
