// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ambient engine tuning: worker pool sizing, cache capacity, and the
//! default interpolation applied when a request doesn't specify one.

use crate::datasource::Interpolation;
use crate::error::{EngineError, Result};

/// The hard ceiling on concurrent attribute-pass workers (see §5 of the
/// design: "at most 32 workers").
pub const MAX_ATTRIBUTE_WORKERS: usize = 32;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub attribute_workers: usize,
    pub horizon_fetch_min_workers: usize,
    pub cache_capacity_bytes: u64,
    pub default_interpolation: Interpolation,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            attribute_workers: MAX_ATTRIBUTE_WORKERS,
            horizon_fetch_min_workers: 1,
            cache_capacity_bytes: 512 * 1024 * 1024,
            default_interpolation: Interpolation::Nearest,
        }
    }
}

/// Builds a validated [`EngineConfig`]. Construction-time checks (zero
/// worker counts, zero cache capacity) are programmer errors — they fail
/// with [`EngineError::nullptr`], never `bad_request`, because no request
/// input feeds them.
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attribute_workers(mut self, n: usize) -> Self {
        self.config.attribute_workers = n;
        self
    }

    pub fn horizon_fetch_min_workers(mut self, n: usize) -> Self {
        self.config.horizon_fetch_min_workers = n;
        self
    }

    pub fn cache_capacity_bytes(mut self, bytes: u64) -> Self {
        self.config.cache_capacity_bytes = bytes;
        self
    }

    pub fn default_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.config.default_interpolation = interpolation;
        self
    }

    pub fn build(self) -> Result<EngineConfig> {
        if self.config.attribute_workers == 0 {
            return Err(EngineError::nullptr("attribute_workers must be >= 1"));
        }
        if self.config.attribute_workers > MAX_ATTRIBUTE_WORKERS {
            return Err(EngineError::nullptr(format!(
                "attribute_workers must be <= {MAX_ATTRIBUTE_WORKERS}"
            )));
        }
        if self.config.horizon_fetch_min_workers == 0 {
            return Err(EngineError::nullptr(
                "horizon_fetch_min_workers must be >= 1",
            ));
        }
        Ok(self.config)
    }
}
