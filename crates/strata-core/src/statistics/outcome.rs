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

//! Outcome enumerations and the descriptors used to locate instrumented operations.
//!
//! An *outcome* is one of the exhaustive results an instrumented operation can
//! produce (a cache `get` is either a hit or a miss, with or without a loader).
//! Descriptors name an operation and the scope tags it is published under so
//! the registry can find every matching source.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;

/// A closed enumeration of the results of one instrumented operation.
pub trait Outcome: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every value of the enumeration, in ordinal order.
    const ALL: &'static [Self];

    /// Stable position of this outcome within [`Outcome::ALL`].
    fn ordinal(self) -> usize;

    /// Upper-case label of the outcome (e.g. `HIT_NO_LOADER`).
    fn name(self) -> &'static str;
}

macro_rules! outcome_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $label:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl Outcome for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn ordinal(self) -> usize {
                self as usize
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

outcome_enum! {
    /// Outcomes of a cache-level `get`.
    CacheGetOutcome {
        /// Found without invoking a loader.
        HitNoLoader => "HIT_NO_LOADER",
        /// Absent and no loader configured.
        MissNoLoader => "MISS_NO_LOADER",
        /// Found after consulting the loader path.
        HitWithLoader => "HIT_WITH_LOADER",
        /// Absent even after invoking the loader.
        MissWithLoader => "MISS_WITH_LOADER",
        /// The operation failed.
        Failure => "FAILURE",
    }
}

outcome_enum! {
    /// Outcomes of a cache-level `clear`.
    CacheClearOutcome {
        /// All mappings were removed.
        Success => "SUCCESS",
        /// The clear failed.
        Failure => "FAILURE",
    }
}

outcome_enum! {
    /// Outcomes of a `get` against a single storage tier.
    TierGetOutcome {
        /// The tier held the key.
        Hit => "HIT",
        /// The tier did not hold the key.
        Miss => "MISS",
    }
}

outcome_enum! {
    /// Outcomes of an eviction attempt within a single storage tier.
    TierEvictionOutcome {
        /// A mapping was evicted.
        Success => "SUCCESS",
        /// No mapping could be evicted.
        Failure => "FAILURE",
    }
}

fn collect_tags<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}

/// Identifies an instrumented operation by name and scope tags, typed by its outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatisticDescriptor<O: Outcome> {
    name: String,
    tags: BTreeSet<String>,
    _outcome: PhantomData<fn() -> O>,
}

impl<O: Outcome> OperationStatisticDescriptor<O> {
    /// Creates a descriptor for the operation `name` published under `tags`.
    pub fn descriptor<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            tags: collect_tags(tags),
            _outcome: PhantomData,
        }
    }

    /// The operation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scope tags a source must carry to match.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// The exhaustive outcome enumeration of this operation.
    pub fn outcomes(&self) -> &'static [O] {
        O::ALL
    }

    /// Returns `true` if a source published as `name` with `tags` matches.
    pub fn matches(&self, name: &str, tags: &BTreeSet<String>) -> bool {
        self.name == name && self.tags.is_subset(tags)
    }
}

/// Identifies a directly observed numeric value by name and scope tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValueStatisticDescriptor {
    name: String,
    tags: BTreeSet<String>,
}

impl ValueStatisticDescriptor {
    /// Creates a descriptor for the value `name` published under `tags`.
    pub fn descriptor<I, S>(name: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            tags: collect_tags(tags),
        }
    }

    /// The value name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The scope tags a source must carry to match.
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Returns `true` if a source published as `name` with `tags` matches.
    pub fn matches(&self, name: &str, tags: &BTreeSet<String>) -> bool {
        self.name == name && self.tags.is_subset(tags)
    }
}
