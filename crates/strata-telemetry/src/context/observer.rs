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

//! Per-operation outcome counters with a bounded latency log.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use strata_core::statistics::Outcome;
use strata_core::Clock;

/// Number of latency observations an observer keeps before discarding the oldest.
pub const LATENCY_LOG_CAPACITY: usize = 4096;

/// Aggregated latencies of a set of outcomes over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStats {
    /// Number of timed operations.
    pub count: u64,
    /// Smallest latency, in nanoseconds.
    pub min: u64,
    /// Largest latency, in nanoseconds.
    pub max: u64,
    /// Sum of all latencies, in nanoseconds.
    pub total: u128,
}

impl LatencyStats {
    /// Mean latency in nanoseconds, or `None` without observations.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total as f64 / self.count as f64)
    }

    fn accumulate(&mut self, nanos: u64) {
        if self.count == 0 {
            self.min = nanos;
            self.max = nanos;
        } else {
            self.min = self.min.min(nanos);
            self.max = self.max.max(nanos);
        }
        self.count += 1;
        self.total += u128::from(nanos);
    }
}

/// Type-erased read access to an observer's counters.
///
/// Outcomes are addressed by ordinal so the registry can hold sources of
/// different outcome types side by side.
pub trait OutcomeSource: Send + Sync + Debug {
    /// Sum of the counters of the given outcomes.
    fn count(&self, ordinals: &[usize]) -> u64;

    /// Latencies of the given outcomes recorded at or after `since` (epoch ms).
    fn latency_since(&self, ordinals: &[usize], since: u64) -> LatencyStats;
}

#[derive(Debug, Clone, Copy)]
struct LatencyEvent {
    timestamp: u64,
    ordinal: usize,
    nanos: u64,
}

/// Counts the outcomes of one instrumented operation.
#[derive(Debug)]
pub struct OperationObserver<O: Outcome> {
    counts: Vec<AtomicU64>,
    latencies: Mutex<VecDeque<LatencyEvent>>,
    clock: Arc<dyn Clock>,
    _outcome: PhantomData<fn() -> O>,
}

impl<O: Outcome> OperationObserver<O> {
    /// Creates an observer with every counter at zero.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counts: O::ALL.iter().map(|_| AtomicU64::new(0)).collect(),
            latencies: Mutex::new(VecDeque::new()),
            clock,
            _outcome: PhantomData,
        }
    }

    /// Records an outcome without timing information.
    pub fn record(&self, outcome: O) {
        self.counts[outcome.ordinal()].fetch_add(1, Ordering::Relaxed);
    }

    /// Records an outcome together with how long the operation took.
    pub fn record_with_latency(&self, outcome: O, latency: Duration) {
        self.record(outcome);
        let event = LatencyEvent {
            timestamp: self.clock.now_millis(),
            ordinal: outcome.ordinal(),
            nanos: latency.as_nanos().min(u128::from(u64::MAX)) as u64,
        };
        let mut log = self.latency_log();
        if log.len() == LATENCY_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(event);
    }

    /// Starts timing an operation; finish it with [`PendingOperation::end`].
    pub fn begin(&self) -> PendingOperation<'_, O> {
        PendingOperation {
            observer: self,
            started: Instant::now(),
        }
    }

    /// Current counter of a single outcome.
    pub fn count(&self, outcome: O) -> u64 {
        self.counts[outcome.ordinal()].load(Ordering::Relaxed)
    }

    /// Sum of every outcome counter.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    fn latency_log(&self) -> MutexGuard<'_, VecDeque<LatencyEvent>> {
        match self.latencies.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Latency log lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

impl<O: Outcome> OutcomeSource for OperationObserver<O> {
    fn count(&self, ordinals: &[usize]) -> u64 {
        ordinals
            .iter()
            .filter_map(|&ordinal| self.counts.get(ordinal))
            .map(|c| c.load(Ordering::Relaxed))
            .sum()
    }

    fn latency_since(&self, ordinals: &[usize], since: u64) -> LatencyStats {
        let mut stats = LatencyStats::default();
        for event in self.latency_log().iter().rev() {
            if event.timestamp < since {
                break;
            }
            if ordinals.contains(&event.ordinal) {
                stats.accumulate(event.nanos);
            }
        }
        stats
    }
}

/// An operation being timed by an [`OperationObserver`].
#[must_use = "an operation is only recorded once `end` is called"]
pub struct PendingOperation<'a, O: Outcome> {
    observer: &'a OperationObserver<O>,
    started: Instant,
}

impl<'a, O: Outcome> PendingOperation<'a, O> {
    /// Records `outcome` with the time elapsed since [`OperationObserver::begin`].
    pub fn end(self, outcome: O) {
        self.observer
            .record_with_latency(outcome, self.started.elapsed());
    }
}
