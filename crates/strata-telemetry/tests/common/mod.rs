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

//! A tiered cache double publishing the operations the statistics engine expects.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use strata_core::statistics::{
    CacheClearOutcome, CacheGetOutcome, TierEvictionOutcome, TierGetOutcome,
};
use strata_core::ManualClock;
use strata_telemetry::{OperationObserver, StatisticsContext};

/// Bytes accounted per stored entry.
pub const ENTRY_SIZE: u64 = 64;

type Entries = Arc<Mutex<VecDeque<(u64, String)>>>;

fn lock(entries: &Entries) -> MutexGuard<'_, VecDeque<(u64, String)>> {
    entries.lock().unwrap()
}

struct Tier {
    entries: Entries,
    capacity: Option<usize>,
    gets: Arc<OperationObserver<TierGetOutcome>>,
    evictions: Arc<OperationObserver<TierEvictionOutcome>>,
}

impl Tier {
    fn new(context: &StatisticsContext, name: &str, capacity: Option<usize>) -> Self {
        let entries: Entries = Arc::default();
        let gets = context.operation_observer("get", &["tier"], Some(name));
        let evictions = context.operation_observer("eviction", &["tier"], Some(name));

        let mappings = entries.clone();
        context.register_value("mappings", &["tier"], Some(name), move || {
            lock(&mappings).len() as u64
        });
        let max_mappings = capacity.map_or(u64::MAX, |c| c as u64);
        context.register_value("maxMappings", &["tier"], Some(name), move || max_mappings);
        let occupied = entries.clone();
        context.register_value("occupiedMemory", &["tier"], Some(name), move || {
            lock(&occupied).len() as u64 * ENTRY_SIZE
        });
        let allocated = capacity.map_or(0, |c| c as u64 * ENTRY_SIZE);
        context.register_value("allocatedMemory", &["tier"], Some(name), move || allocated);

        Self {
            entries,
            capacity,
            gets,
            evictions,
        }
    }

    fn lookup(&self, key: u64) -> Option<String> {
        let found = lock(&self.entries)
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone());
        self.gets.record(if found.is_some() {
            TierGetOutcome::Hit
        } else {
            TierGetOutcome::Miss
        });
        found
    }

    fn install(&self, key: u64, value: String) {
        let mut entries = lock(&self.entries);
        entries.retain(|(k, _)| *k != key);
        if self.capacity.is_some_and(|capacity| entries.len() >= capacity) {
            entries.pop_front();
            self.evictions.record(TierEvictionOutcome::Success);
        }
        entries.push_back((key, value));
    }
}

/// A cache whose tiers are checked top-down, promoting hits into the tiers above.
pub struct TieredCache {
    tiers: Vec<Tier>,
    gets: Arc<OperationObserver<CacheGetOutcome>>,
    clears: Arc<OperationObserver<CacheClearOutcome>>,
}

impl TieredCache {
    /// Tiers are given top-down as `(name, capacity in entries)`.
    pub fn new(context: &StatisticsContext, tiers: &[(&str, Option<usize>)]) -> Self {
        Self {
            tiers: tiers
                .iter()
                .map(|(name, capacity)| Tier::new(context, name, *capacity))
                .collect(),
            gets: context.operation_observer("get", &["cache"], None),
            clears: context.operation_observer("clear", &["cache"], None),
        }
    }

    /// Stores into the lowest tier.
    pub fn put(&self, key: u64, value: &str) {
        if let Some(lowest) = self.tiers.last() {
            lowest.install(key, value.to_string());
        }
    }

    pub fn get(&self, key: u64) -> Option<String> {
        let operation = self.gets.begin();
        for (depth, tier) in self.tiers.iter().enumerate() {
            if let Some(value) = tier.lookup(key) {
                for upper in &self.tiers[..depth] {
                    upper.install(key, value.clone());
                }
                operation.end(CacheGetOutcome::HitNoLoader);
                return Some(value);
            }
        }
        operation.end(CacheGetOutcome::MissNoLoader);
        None
    }

    pub fn clear(&self) {
        for tier in &self.tiers {
            lock(&tier.entries).clear();
        }
        self.clears.record(CacheClearOutcome::Success);
    }
}

/// A context on a manual clock, plus the clock.
pub fn manual_context() -> (StatisticsContext, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    (StatisticsContext::new(clock.clone()), clock)
}
