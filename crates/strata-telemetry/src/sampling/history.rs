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

//! Efficient storage for rolling statistic samples.

use std::collections::VecDeque;
use std::sync::RwLock;

use strata_core::statistics::{SampleValue, Timestamped};

/// A bounded, time-ordered buffer of samples, overwriting the oldest when full.
///
/// Writers append under a write lock; readers copy the samples they need
/// under a read lock, so a reader never observes a partially written sample.
#[derive(Debug)]
pub struct SampleHistory {
    samples: RwLock<VecDeque<Timestamped>>,
    capacity: usize,
}

impl SampleHistory {
    /// Creates an empty history retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends a sample, evicting the oldest one if the buffer is full.
    ///
    /// Samples older than the newest retained one are dropped to keep the
    /// history time-ascending.
    pub fn push(&self, timestamp: u64, value: SampleValue) {
        let mut samples = match self.samples.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Sample history lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if samples.back().is_some_and(|last| last.timestamp > timestamp) {
            log::trace!("Dropping out-of-order sample at {timestamp}");
            return;
        }
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(Timestamped::new(timestamp, value));
    }

    /// Copies every sample taken at or after `since`, oldest first.
    pub fn since(&self, since: u64) -> Vec<Timestamped> {
        if let Ok(samples) = self.samples.read() {
            let start = samples.partition_point(|sample| sample.timestamp < since);
            samples.range(start..).copied().collect()
        } else {
            Vec::new()
        }
    }

    /// Returns the number of samples currently retained.
    pub fn count(&self) -> usize {
        self.samples.read().map(|samples| samples.len()).unwrap_or(0)
    }
}
