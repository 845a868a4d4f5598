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

//! Read handles on sampled series.

use std::sync::Arc;

use strata_core::statistics::{SampleType, Timestamped};

use super::history::SampleHistory;

/// A read handle on one sampled series, as found by the registry.
///
/// The handle shares the underlying buffer with the registry; reading copies
/// the requested window out of it.
#[derive(Debug, Clone)]
pub struct SampledStatistic {
    sample_type: SampleType,
    history: Arc<SampleHistory>,
}

impl SampledStatistic {
    /// Wraps a history produced for `sample_type`.
    pub fn new(sample_type: SampleType, history: Arc<SampleHistory>) -> Self {
        Self {
            sample_type,
            history,
        }
    }

    /// The kind of the sampled series.
    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// Samples taken at or after `since` (epoch ms), oldest first.
    pub fn history(&self, since: u64) -> Vec<Timestamped> {
        self.history.since(since)
    }
}
