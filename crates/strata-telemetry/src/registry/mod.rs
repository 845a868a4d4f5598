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

//! The registration ledger: what statistics exist, of which kind, and their sampled series.

pub mod registration;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use strata_core::statistics::{
    OperationStatisticDescriptor, Outcome, SampleType, StatisticKind, StatisticsError,
    StatisticsProviderConfiguration, StatisticsResult, ValueStatisticDescriptor,
};
use strata_core::Clock;

use crate::context::StatisticsContext;
use crate::provider::resolver::{COMPOUND_SUFFIXES, RATIO_SUFFIX};
use crate::sampling::SampledStatistic;

pub use self::registration::{RegisteredStatistic, SamplingSettings};
use self::registration::{CompoundStatistic, RatioStatistic, Registration, ValueStatistic};

/// Central ledger of derived statistics over the sources of a [`StatisticsContext`].
///
/// Every registration call resolves its descriptor against the context. Each
/// matching source yields one entry, named `<discriminator>:<name>` when the
/// source carries a discriminator and `<name>` otherwise. A call either
/// registers all of its entries or none of them.
///
/// Every name a query can use reaches at most one entry: an entry is rejected
/// when one of its query names is already answered by another entry.
#[derive(Debug)]
pub struct StatisticsRegistry {
    context: StatisticsContext,
    clock: Arc<dyn Clock>,
    settings: SamplingSettings,
    registrations: RwLock<HashMap<String, Registration>>,
}

impl StatisticsRegistry {
    /// Creates an empty registry over `context`, sampling per `configuration`.
    pub fn new(
        context: StatisticsContext,
        configuration: &StatisticsProviderConfiguration,
    ) -> StatisticsResult<Self> {
        configuration.validate()?;
        Ok(Self {
            clock: context.clock().clone(),
            context,
            settings: SamplingSettings::from(configuration),
            registrations: RwLock::new(HashMap::new()),
        })
    }

    /// Registers a compound statistic over `members` of every operation matching `descriptor`.
    ///
    /// Returns the number of entries created.
    pub fn register_compound_operations<O: Outcome>(
        &self,
        name: &str,
        descriptor: &OperationStatisticDescriptor<O>,
        members: &[O],
    ) -> StatisticsResult<usize> {
        check_name(name)?;
        let members = ordinals(members);
        if members.is_empty() {
            return Err(StatisticsError::InvalidRegistration(format!(
                "compound '{name}' needs at least one outcome"
            )));
        }

        let now = self.clock.now_millis();
        let history_size = self.settings.history_size;
        let entries = self
            .context
            .find_operations(descriptor)
            .into_iter()
            .map(|found| {
                let statistic = CompoundStatistic::new(found.source, members.clone(), now, history_size);
                (
                    qualified_name(name, found.discriminator.as_deref()),
                    RegisteredStatistic::Compound(statistic),
                )
            })
            .collect();
        self.insert_all(name, descriptor.name(), entries, now)
    }

    /// Registers a ratio of `numerator` over `denominator` outcomes of every
    /// operation matching `descriptor`.
    pub fn register_ratios<O: Outcome>(
        &self,
        name: &str,
        descriptor: &OperationStatisticDescriptor<O>,
        numerator: &[O],
        denominator: &[O],
    ) -> StatisticsResult<usize> {
        check_name(name)?;
        let numerator = ordinals(numerator);
        let denominator = ordinals(denominator);
        if numerator.is_empty() {
            return Err(StatisticsError::InvalidRegistration(format!(
                "ratio '{name}' needs at least one numerator outcome"
            )));
        }
        if !numerator.iter().all(|ordinal| denominator.contains(ordinal)) {
            return Err(StatisticsError::InvalidRegistration(format!(
                "ratio '{name}' numerator is not a subset of its denominator"
            )));
        }

        let now = self.clock.now_millis();
        let history_size = self.settings.history_size;
        let entries = self
            .context
            .find_operations(descriptor)
            .into_iter()
            .map(|found| {
                let statistic = RatioStatistic::new(
                    found.source,
                    numerator.clone(),
                    denominator.clone(),
                    now,
                    history_size,
                );
                (
                    qualified_name(name, found.discriminator.as_deref()),
                    RegisteredStatistic::Ratio(statistic),
                )
            })
            .collect();
        self.insert_all(name, descriptor.name(), entries, now)
    }

    /// Registers a pass-through count of every value matching `descriptor`.
    pub fn register_counter(
        &self,
        name: &str,
        descriptor: &ValueStatisticDescriptor,
    ) -> StatisticsResult<usize> {
        self.register_value(name, descriptor, RegisteredStatistic::Counter)
    }

    /// Registers a pass-through byte size of every value matching `descriptor`.
    pub fn register_size(
        &self,
        name: &str,
        descriptor: &ValueStatisticDescriptor,
    ) -> StatisticsResult<usize> {
        self.register_value(name, descriptor, RegisteredStatistic::Size)
    }

    fn register_value(
        &self,
        name: &str,
        descriptor: &ValueStatisticDescriptor,
        wrap: fn(ValueStatistic) -> RegisteredStatistic,
    ) -> StatisticsResult<usize> {
        check_name(name)?;
        let now = self.clock.now_millis();
        let entries = self
            .context
            .find_values(descriptor)
            .into_iter()
            .map(|found| {
                (
                    qualified_name(name, found.discriminator.as_deref()),
                    wrap(ValueStatistic::new(found.source, self.settings.history_size)),
                )
            })
            .collect();
        self.insert_all(name, descriptor.name(), entries, now)
    }

    fn insert_all(
        &self,
        name: &str,
        source: &str,
        entries: Vec<(String, RegisteredStatistic)>,
        now: u64,
    ) -> StatisticsResult<usize> {
        if entries.is_empty() {
            log::debug!("No source named '{source}' for statistic '{name}', nothing registered");
            return Ok(0);
        }

        let mut registrations = self.write_registrations()?;
        let mut answered: HashSet<String> = registrations
            .iter()
            .flat_map(|(name, registration)| query_names(name, registration.statistic().kind()))
            .collect();
        let mut seen = HashSet::new();
        for (entry_name, statistic) in &entries {
            if registrations.contains_key(entry_name) || !seen.insert(entry_name.as_str()) {
                return Err(StatisticsError::DuplicateRegistration(entry_name.clone()));
            }
            for query_name in query_names(entry_name, statistic.kind()) {
                if answered.contains(&query_name) {
                    return Err(StatisticsError::DuplicateRegistration(query_name));
                }
                answered.insert(query_name);
            }
        }

        let count = entries.len();
        for (entry_name, statistic) in entries {
            log::debug!("Registered {:?} statistic '{}'", statistic.kind(), entry_name);
            registrations.insert(entry_name, Registration::new(statistic, now));
        }
        Ok(count)
    }

    /// Snapshot of every registered name and its kind.
    pub fn get_registrations(&self) -> BTreeMap<String, StatisticKind> {
        self.read_registrations()
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|(name, registration)| (name.clone(), registration.statistic().kind()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Finds the series of a counter, size or ratio entry registered as `name`.
    pub fn find_sampled_statistic(&self, name: &str) -> Option<SampledStatistic> {
        let registrations = self.read_registrations().ok()?;
        let registration = registrations.get(name)?;
        let statistic = registration.statistic().direct()?;
        registration.touch(name, self.clock.now_millis());
        Some(statistic)
    }

    /// Finds the `sample_type` series of a compound entry registered as `name`.
    pub fn find_sampled_compound_statistic(
        &self,
        name: &str,
        sample_type: SampleType,
    ) -> Option<SampledStatistic> {
        let registrations = self.read_registrations().ok()?;
        let registration = registrations.get(name)?;
        let statistic = registration.statistic().compound(sample_type)?;
        registration.touch(name, self.clock.now_millis());
        Some(statistic)
    }

    /// Samples every enabled entry at the clock's current time.
    pub fn sample(&self) {
        self.sample_at(self.clock.now_millis());
    }

    /// Samples every enabled entry, timestamping samples with `now`.
    pub fn sample_at(&self, now: u64) {
        if let Ok(registrations) = self.read_registrations() {
            log::trace!("Sampling {} statistics at {}", registrations.len(), now);
            for (name, registration) in registrations.iter() {
                registration.sample(name, now, &self.settings);
            }
        }
    }

    /// Drops every registration and its history. Idempotent.
    ///
    /// Sources in the context are left untouched.
    pub fn clear_registrations(&self) {
        match self.registrations.write() {
            Ok(mut registrations) => registrations.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    /// Returns `true` if `name` is registered and currently being sampled.
    pub fn is_sampling(&self, name: &str) -> bool {
        self.read_registrations()
            .ok()
            .and_then(|registrations| registrations.get(name).map(Registration::is_enabled))
            .unwrap_or(false)
    }

    /// Number of ledger entries.
    pub fn len(&self) -> usize {
        self.read_registrations().map(|r| r.len()).unwrap_or(0)
    }

    /// Returns `true` if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_registrations(
        &self,
    ) -> StatisticsResult<RwLockReadGuard<'_, HashMap<String, Registration>>> {
        self.registrations
            .read()
            .map_err(|_| StatisticsError::StorageError("Failed to acquire read lock".to_string()))
    }

    fn write_registrations(
        &self,
    ) -> StatisticsResult<RwLockWriteGuard<'_, HashMap<String, Registration>>> {
        self.registrations
            .write()
            .map_err(|_| StatisticsError::StorageError("Failed to acquire write lock".to_string()))
    }
}

fn check_name(name: &str) -> StatisticsResult<()> {
    if name.is_empty() {
        Err(StatisticsError::InvalidRegistration(
            "statistic name must not be empty".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Names under which an entry of `kind` registered as `name` can be queried.
fn query_names(name: &str, kind: StatisticKind) -> Vec<String> {
    match kind {
        StatisticKind::Counter | StatisticKind::Size => vec![name.to_string()],
        StatisticKind::Ratio => vec![name.to_string(), format!("{name}{RATIO_SUFFIX}")],
        StatisticKind::Compound => COMPOUND_SUFFIXES
            .iter()
            .map(|(suffix, _)| format!("{name}{suffix}"))
            .collect(),
    }
}

fn qualified_name(name: &str, discriminator: Option<&str>) -> String {
    match discriminator {
        Some(discriminator) => format!("{discriminator}:{name}"),
        None => name.to_string(),
    }
}

fn ordinals<O: Outcome>(outcomes: &[O]) -> Vec<usize> {
    let mut ordinals: Vec<usize> = outcomes.iter().map(|outcome| outcome.ordinal()).collect();
    ordinals.sort_unstable();
    ordinals.dedup();
    ordinals
}
