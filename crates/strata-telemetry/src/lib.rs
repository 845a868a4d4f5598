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

//! # Strata Telemetry
//!
//! The statistics service: discovers instrumented operations in a
//! [`StatisticsContext`], registers derived statistics against them in a
//! [`StatisticsRegistry`], samples them into bounded histories, and answers
//! name-based queries through [`StandardStatistics`] and [`StatisticsProvider`].

#![warn(missing_docs)]

pub mod context;
pub mod provider;
pub mod registry;
pub mod sampling;
pub mod service;

pub use context::{OperationObserver, StatisticsContext};
pub use provider::{StandardStatistics, StatisticsProvider};
pub use registry::StatisticsRegistry;
pub use sampling::SampledStatistic;
pub use service::{spawn_sampling, SamplingTask, StatisticsService};
