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

//! Drivers that sample registered statistics periodically.

use crate::provider::StatisticsProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Polled sampling driver for hosts that already run a loop.
#[derive(Debug)]
pub struct StatisticsService {
    provider: Arc<StatisticsProvider>,
    last_update: Instant,
    update_interval: Duration,
}

impl StatisticsService {
    /// Creates a service sampling `provider` every `update_interval`.
    pub fn new(provider: Arc<StatisticsProvider>, update_interval: Duration) -> Self {
        Self {
            provider,
            last_update: Instant::now(),
            update_interval,
        }
    }

    /// Creates a service sampling at the provider's configured history interval.
    pub fn from_configuration(provider: Arc<StatisticsProvider>) -> Self {
        let update_interval = provider.configuration().history_interval.as_duration();
        Self::new(provider, update_interval)
    }

    /// Should be called periodically (e.g., once per loop iteration).
    /// Samples every bound cache if the interval has passed.
    pub fn tick(&mut self) -> bool {
        if self.last_update.elapsed() >= self.update_interval {
            log::trace!("Sampling statistics of all caches...");
            self.provider.sample_all();
            self.last_update = Instant::now();
            true
        } else {
            false
        }
    }

    /// Returns the sampled provider.
    pub fn provider(&self) -> &Arc<StatisticsProvider> {
        &self.provider
    }
}

impl Default for StatisticsService {
    fn default() -> Self {
        Self::new(Arc::new(StatisticsProvider::default()), Duration::from_secs(1))
    }
}

/// A sampling loop running on a caller-supplied tokio runtime.
///
/// Dropping the task also stops the loop, without waiting for it.
#[derive(Debug)]
pub struct SamplingTask {
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl SamplingTask {
    /// Stops the loop and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = (&mut self.handle).await {
            log::warn!("Sampling task ended abnormally: {err}");
        }
    }

    /// Returns `true` once the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Samples every cache of `provider` each `interval` on the runtime behind `handle`.
///
/// A zero `interval` is raised to one millisecond.
pub fn spawn_sampling(
    provider: Arc<StatisticsProvider>,
    interval: Duration,
    handle: &Handle,
) -> SamplingTask {
    let interval = interval.max(Duration::from_millis(1));
    let (stop, mut stopped) = oneshot::channel::<()>();
    let handle = handle.spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        log::info!("Sampling statistics every {interval:?}");
        loop {
            tokio::select! {
                _ = &mut stopped => break,
                _ = ticker.tick() => provider.sample_all(),
            }
        }
        log::info!("Statistics sampling stopped");
    });
    SamplingTask {
        stop: Some(stop),
        handle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StatisticsContext;
    use crate::provider::standard::TIER_TAG;
    use strata_core::statistics::StatisticsProviderConfiguration;

    fn provider_with_cache() -> Arc<StatisticsProvider> {
        let context = StatisticsContext::default();
        context.register_value("mappings", &[TIER_TAG], Some("OnHeap"), || 7);
        let provider = Arc::new(StatisticsProvider::new(StatisticsProviderConfiguration::default()).unwrap());
        provider.register("users", &context).unwrap();
        provider
    }

    #[test]
    fn test_tick_respects_interval() {
        let provider = provider_with_cache();
        let mut service = StatisticsService::new(provider.clone(), Duration::from_secs(3600));
        assert!(!service.tick());

        let mut eager = StatisticsService::new(provider.clone(), Duration::ZERO);
        assert!(eager.tick());
        let history = provider.query("users", "OnHeap:MappingCount", 0).unwrap();
        assert_eq!(history.latest_value(), Some(7.0));
    }

    #[test]
    fn test_from_configuration_uses_history_interval() {
        let service = StatisticsService::from_configuration(provider_with_cache());
        assert_eq!(service.update_interval, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_spawned_sampling_runs_until_shutdown() {
        let provider = provider_with_cache();
        let task = spawn_sampling(provider.clone(), Duration::from_millis(10), &Handle::current());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!task.is_finished());
        task.shutdown().await;

        let sampled = provider
            .query("users", "OnHeap:MappingCount", 0)
            .unwrap()
            .len();
        assert!(sampled >= 1);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let after = provider
            .query("users", "OnHeap:MappingCount", 0)
            .unwrap()
            .len();
        assert_eq!(sampled, after);
    }
}
