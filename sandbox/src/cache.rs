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

//! A small two-level cache instrumented for the statistics service.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use strata_core::statistics::{CacheClearOutcome, CacheGetOutcome, TierEvictionOutcome, TierGetOutcome};
use strata_telemetry::{OperationObserver, StatisticsContext};

const BYTES_PER_ENTRY: u64 = 128;

#[derive(Default)]
struct Store {
    values: HashMap<String, String>,
    order: VecDeque<String>,
}

struct Level {
    store: Arc<Mutex<Store>>,
    capacity: usize,
    gets: Arc<OperationObserver<TierGetOutcome>>,
    evictions: Arc<OperationObserver<TierEvictionOutcome>>,
}

impl Level {
    fn new(context: &StatisticsContext, name: &str, capacity: usize) -> Self {
        let store: Arc<Mutex<Store>> = Arc::default();
        let tags = ["tier"];

        let mappings = store.clone();
        context.register_value("mappings", &tags, Some(name), move || {
            mappings.lock().map(|s| s.values.len() as u64).unwrap_or(0)
        });
        context.register_value("maxMappings", &tags, Some(name), move || capacity as u64);
        let occupied = store.clone();
        context.register_value("occupiedMemory", &tags, Some(name), move || {
            occupied
                .lock()
                .map(|s| s.values.len() as u64 * BYTES_PER_ENTRY)
                .unwrap_or(0)
        });
        context.register_value("allocatedMemory", &tags, Some(name), move || {
            capacity as u64 * BYTES_PER_ENTRY
        });

        Self {
            store,
            capacity,
            gets: context.operation_observer("get", &tags, Some(name)),
            evictions: context.operation_observer("eviction", &tags, Some(name)),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let value = self
            .store
            .lock()
            .ok()
            .and_then(|store| store.values.get(key).cloned());
        self.gets.record(match value {
            Some(_) => TierGetOutcome::Hit,
            None => TierGetOutcome::Miss,
        });
        value
    }

    fn put(&self, key: &str, value: String) {
        let Ok(mut store) = self.store.lock() else {
            return;
        };
        if store.values.insert(key.to_string(), value).is_none() {
            store.order.push_back(key.to_string());
        }
        while store.values.len() > self.capacity {
            let Some(oldest) = store.order.pop_front() else {
                break;
            };
            store.values.remove(&oldest);
            self.evictions.record(TierEvictionOutcome::Success);
            log::trace!("Evicted '{oldest}'");
        }
    }

    fn clear(&self) {
        if let Ok(mut store) = self.store.lock() {
            *store = Store::default();
        }
    }
}

/// A bounded heap in front of a larger authoritative disk level.
pub struct DemoCache {
    heap: Level,
    disk: Level,
    gets: Arc<OperationObserver<CacheGetOutcome>>,
    clears: Arc<OperationObserver<CacheClearOutcome>>,
}

impl DemoCache {
    pub fn new(context: &StatisticsContext, heap_capacity: usize, disk_capacity: usize) -> Self {
        Self {
            heap: Level::new(context, "OnHeap", heap_capacity),
            disk: Level::new(context, "Disk", disk_capacity),
            gets: context.operation_observer("get", &["cache"], None),
            clears: context.operation_observer("clear", &["cache"], None),
        }
    }

    pub fn put(&self, key: &str, value: &str) {
        self.disk.put(key, value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let operation = self.gets.begin();
        if let Some(value) = self.heap.get(key) {
            operation.end(CacheGetOutcome::HitNoLoader);
            return Some(value);
        }
        match self.disk.get(key) {
            Some(value) => {
                self.heap.put(key, value.clone());
                operation.end(CacheGetOutcome::HitNoLoader);
                Some(value)
            }
            None => {
                operation.end(CacheGetOutcome::MissNoLoader);
                None
            }
        }
    }

    pub fn clear(&self) {
        self.heap.clear();
        self.disk.clear();
        self.clears.record(CacheClearOutcome::Success);
    }
}
