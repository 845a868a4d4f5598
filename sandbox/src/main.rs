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

// Strata sandbox
// Drives a two-tier cache and prints its statistics as JSON.

mod cache;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use cache::DemoCache;
use strata_core::statistics::StatisticsProviderConfiguration;
use strata_telemetry::{spawn_sampling, StatisticsContext, StatisticsProvider};

const CACHE_ALIAS: &str = "users";

fn load_configuration() -> Result<StatisticsProviderConfiguration> {
    match std::env::args().nth(1) {
        Some(path) => StatisticsProviderConfiguration::from_file(&path)
            .with_context(|| format!("Failed to load statistics configuration from {path}")),
        None => Ok(StatisticsProviderConfiguration::default()),
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = load_configuration()?;
    let interval = configuration.history_interval.as_duration().min(Duration::from_millis(200));
    let provider = Arc::new(StatisticsProvider::new(configuration)?);

    let context = StatisticsContext::default();
    let cache = DemoCache::new(&context, 4, 64);
    provider.register(CACHE_ALIAS, &context)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let sampling = spawn_sampling(provider.clone(), interval, runtime.handle());

    for round in 0..5u64 {
        for key in 0..16u64 {
            cache.put(&format!("user-{key}"), &format!("profile {key} rev {round}"));
        }
        for key in 0..32u64 {
            cache.get(&format!("user-{}", (key * 7 + round) % 20));
        }
        std::thread::sleep(interval);
    }
    cache.clear();
    std::thread::sleep(interval);

    runtime.block_on(sampling.shutdown());

    let descriptors = provider.descriptors(CACHE_ALIAS)?;
    log::info!("{} statistics available for '{}'", descriptors.len(), CACHE_ALIAS);

    let mut names: Vec<&str> = descriptors
        .iter()
        .map(|descriptor| descriptor.name.as_str())
        .filter(|name| name.starts_with("Cache:") || name.ends_with("Ratio") || name.ends_with("Count"))
        .collect();
    names.sort_unstable();

    let latest: BTreeMap<String, Option<f64>> = provider
        .collect_statistics(CACHE_ALIAS, names.iter().copied(), 0)?
        .into_iter()
        .map(|(name, history)| (name, history.latest_value()))
        .collect();
    println!("{}", serde_json::to_string_pretty(&latest)?);

    let hit_ratio = provider.query(CACHE_ALIAS, "Cache:HitRatioRatio", 0)?;
    println!("{}", serde_json::to_string_pretty(&hit_ratio)?);

    provider.unregister(CACHE_ALIAS)?;
    Ok(())
}
