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

//! Ledger entries and the sampling logic behind each kind.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use strata_core::statistics::{SampleType, SampleValue, StatisticKind, StatisticsProviderConfiguration};

use crate::context::{OutcomeSource, ValueSource};
use crate::sampling::{SampleHistory, SampledStatistic};

/// Sampling parameters derived from the provider configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingSettings {
    /// Averaging window for rates, ratios and latencies, in milliseconds.
    pub window_ms: u64,
    /// Samples retained per series.
    pub history_size: usize,
    /// Inactivity after which a registration stops being sampled, in milliseconds.
    /// Zero disables the mechanism.
    pub time_to_disable_ms: u64,
}

impl From<&StatisticsProviderConfiguration> for SamplingSettings {
    fn from(configuration: &StatisticsProviderConfiguration) -> Self {
        Self {
            window_ms: configuration.average_window.as_millis(),
            history_size: configuration.history_size,
            time_to_disable_ms: configuration.time_to_disable.as_millis(),
        }
    }
}

/// Snapshots of raw totals spanning the averaging window.
///
/// The front entry is the newest snapshot taken at or before the window start,
/// so differences against it cover the whole window once enough time passed.
#[derive(Debug)]
struct Window {
    snapshots: VecDeque<(u64, [u64; 2])>,
}

impl Window {
    fn starting_at(now: u64, totals: [u64; 2]) -> Self {
        Self {
            snapshots: VecDeque::from([(now, totals)]),
        }
    }

    /// Records `totals` at `now` and returns the baseline snapshot.
    fn advance(&mut self, now: u64, totals: [u64; 2], width: u64) -> (u64, [u64; 2]) {
        self.snapshots.push_back((now, totals));
        let window_start = now.saturating_sub(width);
        while self.snapshots.len() > 1 && self.snapshots[1].0 <= window_start {
            self.snapshots.pop_front();
        }
        self.snapshots[0]
    }
}

fn lock_window(window: &Mutex<Window>) -> std::sync::MutexGuard<'_, Window> {
    match window.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// A directly observed value: counters and sizes.
pub struct ValueStatistic {
    source: ValueSource,
    history: Arc<SampleHistory>,
}

impl ValueStatistic {
    pub(crate) fn new(source: ValueSource, history_size: usize) -> Self {
        Self {
            source,
            history: Arc::new(SampleHistory::new(history_size)),
        }
    }

    fn sample(&self, now: u64) {
        self.history.push(now, SampleValue::Integer((self.source)()));
    }
}

impl Debug for ValueStatistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStatistic")
            .field("samples", &self.history.count())
            .finish_non_exhaustive()
    }
}

/// Numerator outcomes over denominator outcomes of one operation.
#[derive(Debug)]
pub struct RatioStatistic {
    source: Arc<dyn OutcomeSource>,
    numerator: Vec<usize>,
    denominator: Vec<usize>,
    window: Mutex<Window>,
    history: Arc<SampleHistory>,
}

impl RatioStatistic {
    pub(crate) fn new(
        source: Arc<dyn OutcomeSource>,
        numerator: Vec<usize>,
        denominator: Vec<usize>,
        now: u64,
        history_size: usize,
    ) -> Self {
        let totals = [source.count(&numerator), source.count(&denominator)];
        Self {
            source,
            numerator,
            denominator,
            window: Mutex::new(Window::starting_at(now, totals)),
            history: Arc::new(SampleHistory::new(history_size)),
        }
    }

    fn sample(&self, now: u64, window_ms: u64) {
        let totals = [
            self.source.count(&self.numerator),
            self.source.count(&self.denominator),
        ];
        let (_, base) = lock_window(&self.window).advance(now, totals, window_ms);
        let numerator = totals[0].saturating_sub(base[0]);
        let denominator = totals[1].saturating_sub(base[1]);
        if denominator > 0 {
            let ratio = numerator as f64 / denominator as f64;
            self.history.push(now, SampleValue::Fractional(ratio));
        }
    }
}

/// Count, rate and latencies of a subset of an operation's outcomes.
#[derive(Debug)]
pub struct CompoundStatistic {
    source: Arc<dyn OutcomeSource>,
    members: Vec<usize>,
    window: Mutex<Window>,
    count: Arc<SampleHistory>,
    rate: Arc<SampleHistory>,
    latency_min: Arc<SampleHistory>,
    latency_max: Arc<SampleHistory>,
    latency_avg: Arc<SampleHistory>,
}

impl CompoundStatistic {
    pub(crate) fn new(
        source: Arc<dyn OutcomeSource>,
        members: Vec<usize>,
        now: u64,
        history_size: usize,
    ) -> Self {
        let total = source.count(&members);
        let history = || Arc::new(SampleHistory::new(history_size));
        Self {
            source,
            members,
            window: Mutex::new(Window::starting_at(now, [total, 0])),
            count: history(),
            rate: history(),
            latency_min: history(),
            latency_max: history(),
            latency_avg: history(),
        }
    }

    fn sample(&self, now: u64, window_ms: u64) {
        let total = self.source.count(&self.members);
        self.count.push(now, SampleValue::Integer(total));

        let (base_time, base) = lock_window(&self.window).advance(now, [total, 0], window_ms);
        let elapsed_ms = now.saturating_sub(base_time);
        let rate = if elapsed_ms > 0 {
            total.saturating_sub(base[0]) as f64 * 1_000.0 / elapsed_ms as f64
        } else {
            0.0
        };
        self.rate.push(now, SampleValue::Fractional(rate));

        let latency = self
            .source
            .latency_since(&self.members, now.saturating_sub(window_ms));
        if let Some(average) = latency.average() {
            self.latency_min.push(now, SampleValue::Integer(latency.min));
            self.latency_max.push(now, SampleValue::Integer(latency.max));
            self.latency_avg.push(now, SampleValue::Fractional(average));
        }
    }

    fn history(&self, sample_type: SampleType) -> Option<&Arc<SampleHistory>> {
        match sample_type {
            SampleType::Counter => Some(&self.count),
            SampleType::Rate => Some(&self.rate),
            SampleType::LatencyMin => Some(&self.latency_min),
            SampleType::LatencyMax => Some(&self.latency_max),
            SampleType::LatencyAvg => Some(&self.latency_avg),
            SampleType::Ratio | SampleType::Size => None,
        }
    }
}

/// One entry of the registration ledger.
#[derive(Debug)]
pub enum RegisteredStatistic {
    /// A directly observed count.
    Counter(ValueStatistic),
    /// A ratio of outcome subsets.
    Ratio(RatioStatistic),
    /// A directly observed byte size.
    Size(ValueStatistic),
    /// A compound operation statistic, reachable only through suffixed names.
    Compound(CompoundStatistic),
}

impl RegisteredStatistic {
    /// The ledger kind of this entry.
    pub fn kind(&self) -> StatisticKind {
        match self {
            RegisteredStatistic::Counter(_) => StatisticKind::Counter,
            RegisteredStatistic::Ratio(_) => StatisticKind::Ratio,
            RegisteredStatistic::Size(_) => StatisticKind::Size,
            RegisteredStatistic::Compound(_) => StatisticKind::Compound,
        }
    }

    fn sample(&self, now: u64, settings: &SamplingSettings) {
        match self {
            RegisteredStatistic::Counter(value) | RegisteredStatistic::Size(value) => {
                value.sample(now)
            }
            RegisteredStatistic::Ratio(ratio) => ratio.sample(now, settings.window_ms),
            RegisteredStatistic::Compound(compound) => compound.sample(now, settings.window_ms),
        }
    }

    /// The series of a counter, size or ratio entry. Compound entries have none.
    pub fn direct(&self) -> Option<SampledStatistic> {
        match self {
            RegisteredStatistic::Counter(value) => Some(SampledStatistic::new(
                SampleType::Counter,
                value.history.clone(),
            )),
            RegisteredStatistic::Size(value) => {
                Some(SampledStatistic::new(SampleType::Size, value.history.clone()))
            }
            RegisteredStatistic::Ratio(ratio) => {
                Some(SampledStatistic::new(SampleType::Ratio, ratio.history.clone()))
            }
            RegisteredStatistic::Compound(_) => None,
        }
    }

    /// The `sample_type` series of a compound entry.
    pub fn compound(&self, sample_type: SampleType) -> Option<SampledStatistic> {
        match self {
            RegisteredStatistic::Compound(compound) => compound
                .history(sample_type)
                .map(|history| SampledStatistic::new(sample_type, history.clone())),
            _ => None,
        }
    }
}

/// A ledger entry together with its activity bookkeeping.
#[derive(Debug)]
pub(crate) struct Registration {
    statistic: RegisteredStatistic,
    last_access: AtomicU64,
    touches: AtomicU64,
    enabled: AtomicBool,
}

impl Registration {
    pub(crate) fn new(statistic: RegisteredStatistic, now: u64) -> Self {
        Self {
            statistic,
            last_access: AtomicU64::new(now),
            touches: AtomicU64::new(0),
            enabled: AtomicBool::new(true),
        }
    }

    pub(crate) fn statistic(&self) -> &RegisteredStatistic {
        &self.statistic
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Marks the entry as queried, re-enabling sampling if it had been disabled.
    pub(crate) fn touch(&self, name: &str, now: u64) {
        self.last_access.fetch_max(now, Ordering::SeqCst);
        self.touches.fetch_add(1, Ordering::SeqCst);
        if !self.enabled.swap(true, Ordering::SeqCst) {
            log::debug!("Re-enabled sampling of '{name}'");
        }
    }

    pub(crate) fn sample(&self, name: &str, now: u64, settings: &SamplingSettings) {
        if !self.is_enabled() {
            return;
        }
        let touches = self.touches.load(Ordering::SeqCst);
        let idle = now.saturating_sub(self.last_access.load(Ordering::SeqCst));
        if settings.time_to_disable_ms > 0 && idle > settings.time_to_disable_ms {
            self.enabled.store(false, Ordering::SeqCst);
            // A touch racing with the store above must win.
            if self.touches.load(Ordering::SeqCst) != touches {
                self.enabled.store(true, Ordering::SeqCst);
            } else {
                log::debug!("Disabled sampling of '{name}' after {idle} ms without queries");
                return;
            }
        }
        self.statistic.sample(now, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::OperationObserver;
    use approx::assert_relative_eq;
    use std::time::Duration;
    use strata_core::statistics::{Outcome, TierGetOutcome};
    use strata_core::ManualClock;

    const SETTINGS: SamplingSettings = SamplingSettings {
        window_ms: 10_000,
        history_size: 16,
        time_to_disable_ms: 60_000,
    };

    fn latest(statistic: &SampledStatistic) -> Option<SampleValue> {
        statistic.history(0).last().map(|s| s.value)
    }

    #[test]
    fn test_window_baseline_tracks_window_start() {
        let mut window = Window::starting_at(0, [0, 0]);
        assert_eq!(window.advance(5_000, [5, 0], 10_000), (0, [0, 0]));
        assert_eq!(window.advance(10_000, [10, 0], 10_000), (0, [0, 0]));
        assert_eq!(window.advance(16_000, [16, 0], 10_000), (5_000, [5, 0]));
        assert_eq!(window.advance(16_000, [16, 0], 0), (16_000, [16, 0]));
    }

    #[test]
    fn test_compound_count_rate_and_latency() {
        let clock = Arc::new(ManualClock::new(0));
        let observer = Arc::new(OperationObserver::<TierGetOutcome>::new(clock.clone()));
        let compound = RegisteredStatistic::Compound(CompoundStatistic::new(
            observer.clone(),
            vec![TierGetOutcome::Hit.ordinal()],
            0,
            SETTINGS.history_size,
        ));

        clock.set(2_000);
        for nanos in [100, 200, 600] {
            observer.record_with_latency(TierGetOutcome::Hit, Duration::from_nanos(nanos));
        }
        observer.record(TierGetOutcome::Miss);
        compound.sample(2_000, &SETTINGS);

        let count = compound.compound(SampleType::Counter).unwrap();
        assert_eq!(latest(&count), Some(SampleValue::Integer(3)));

        let rate = compound.compound(SampleType::Rate).unwrap();
        match latest(&rate) {
            Some(SampleValue::Fractional(r)) => assert_relative_eq!(r, 1.5),
            other => panic!("unexpected rate sample {other:?}"),
        }

        let min = compound.compound(SampleType::LatencyMin).unwrap();
        let max = compound.compound(SampleType::LatencyMax).unwrap();
        let avg = compound.compound(SampleType::LatencyAvg).unwrap();
        assert_eq!(latest(&min), Some(SampleValue::Integer(100)));
        assert_eq!(latest(&max), Some(SampleValue::Integer(600)));
        assert_eq!(latest(&avg), Some(SampleValue::Fractional(300.0)));

        assert!(compound.compound(SampleType::Ratio).is_none());
        assert!(compound.direct().is_none());
        assert_eq!(compound.kind(), StatisticKind::Compound);
    }

    #[test]
    fn test_compound_skips_latency_without_observations() {
        let observer = Arc::new(OperationObserver::<TierGetOutcome>::new(Arc::new(
            ManualClock::new(0),
        )));
        let compound = RegisteredStatistic::Compound(CompoundStatistic::new(
            observer.clone(),
            vec![TierGetOutcome::Miss.ordinal()],
            0,
            4,
        ));
        observer.record(TierGetOutcome::Miss);
        compound.sample(1_000, &SETTINGS);

        assert_eq!(compound.compound(SampleType::Counter).unwrap().history(0).len(), 1);
        assert!(compound.compound(SampleType::LatencyAvg).unwrap().history(0).is_empty());
    }

    #[test]
    fn test_ratio_counts_since_registration() {
        let observer = Arc::new(OperationObserver::<TierGetOutcome>::new(Arc::new(
            ManualClock::new(0),
        )));
        observer.record(TierGetOutcome::Miss);

        let all: Vec<usize> = TierGetOutcome::ALL.iter().map(|o| o.ordinal()).collect();
        let ratio = RegisteredStatistic::Ratio(RatioStatistic::new(
            observer.clone(),
            vec![TierGetOutcome::Hit.ordinal()],
            all,
            0,
            4,
        ));

        ratio.sample(500, &SETTINGS);
        assert!(ratio.direct().unwrap().history(0).is_empty());

        observer.record(TierGetOutcome::Hit);
        observer.record(TierGetOutcome::Miss);
        ratio.sample(1_000, &SETTINGS);

        let series = ratio.direct().unwrap();
        assert_eq!(series.sample_type(), SampleType::Ratio);
        assert_eq!(latest(&series), Some(SampleValue::Fractional(0.5)));
    }

    #[test]
    fn test_registration_disables_when_idle() {
        let value = RegisteredStatistic::Counter(ValueStatistic::new(Arc::new(|| 9), 4));
        let registration = Registration::new(value, 0);

        registration.sample("MappingCount", 1_000, &SETTINGS);
        assert!(registration.is_enabled());

        registration.sample("MappingCount", 61_001, &SETTINGS);
        assert!(!registration.is_enabled());
        registration.sample("MappingCount", 62_000, &SETTINGS);
        assert_eq!(registration.statistic().direct().unwrap().history(0).len(), 1);

        registration.touch("MappingCount", 62_500);
        assert!(registration.is_enabled());
        registration.sample("MappingCount", 63_000, &SETTINGS);
        assert_eq!(registration.statistic().direct().unwrap().history(0).len(), 2);
    }

    #[test]
    fn test_touch_racing_with_idle_sample_keeps_sampling() {
        for _ in 0..500 {
            let value = RegisteredStatistic::Counter(ValueStatistic::new(Arc::new(|| 1), 4));
            let registration = Registration::new(value, 0);
            let barrier = std::sync::Barrier::new(2);

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    registration.sample("MappingCount", 100_000, &SETTINGS);
                });
                scope.spawn(|| {
                    barrier.wait();
                    registration.touch("MappingCount", 100_000);
                });
            });

            assert!(registration.is_enabled());
        }
    }
}
