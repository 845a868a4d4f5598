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

//! Error type shared by the statistics registry, resolver, and provider.

use std::fmt::Display;

/// A specialized `Result` type for statistics operations.
pub type StatisticsResult<T> = Result<T, StatisticsError>;

/// An error that can occur within the statistics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// No registered statistic answers to the queried name.
    UnknownStatistic(String),
    /// A statistic with the same name is already registered.
    DuplicateRegistration(String),
    /// A resolved statistic produced samples that cannot be represented by
    /// any typed history. Indicates a broken internal invariant.
    UnsupportedKind(String),
    /// A registration request was malformed (empty name, empty or
    /// inconsistent outcome sets).
    InvalidRegistration(String),
    /// No statistics are bound to the requested cache alias.
    UnknownContext(String),
    /// The provider configuration holds an unusable value.
    InvalidConfiguration(String),
    /// An error originating from internal storage (e.g. a poisoned lock).
    StorageError(String),
}

impl Display for StatisticsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatisticsError::UnknownStatistic(name) => {
                write!(f, "No registered statistic named '{name}'")
            }
            StatisticsError::DuplicateRegistration(name) => {
                write!(f, "Statistic '{name}' is already registered")
            }
            StatisticsError::UnsupportedKind(detail) => write!(f, "Unsupported kind: {detail}"),
            StatisticsError::InvalidRegistration(msg) => write!(f, "Invalid registration: {msg}"),
            StatisticsError::UnknownContext(alias) => {
                write!(f, "No statistics bound to cache '{alias}'")
            }
            StatisticsError::InvalidConfiguration(msg) => {
                write!(f, "Invalid configuration: {msg}")
            }
            StatisticsError::StorageError(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for StatisticsError {}
