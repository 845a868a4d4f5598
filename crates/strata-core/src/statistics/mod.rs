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

//! Provides the foundational types and contracts for cache statistics.
//!
//! This module defines the "common language" spoken between an instrumented
//! cache, the statistics service that derives named time-series from it, and
//! the management tooling that queries those series. It contains outcome
//! enumerations, statistic descriptors, typed histories, and configuration.
//!
//! `strata-core` only defines the abstract "what"; `strata-telemetry` provides
//! the registry, resolver, and sampling machinery.

pub mod config;
pub mod error;
pub mod history;
pub mod kind;
pub mod outcome;

pub use self::config::{StatisticsProviderConfiguration, TimeSpan, TimeUnit};
pub use self::error::{StatisticsError, StatisticsResult};
pub use self::history::{
    History, Sample, SampleValue, StatisticDescriptor, StatisticHistory, StatisticUnit,
    Timestamped,
};
pub use self::kind::{SampleType, StatisticKind, StatisticType};
pub use self::outcome::{
    CacheClearOutcome, CacheGetOutcome, OperationStatisticDescriptor, Outcome,
    TierEvictionOutcome, TierGetOutcome, ValueStatisticDescriptor,
};
