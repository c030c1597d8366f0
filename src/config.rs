//! Runtime tuning for a single [`crate::world::World`] instance.
//!
//! `original_source` keeps its equivalents (`CHUNK_WIDTH`, `worker` array
//! length, database handle) as process-wide globals. spec.md §9 calls for an
//! explicit world object owning its own tuning and collaborators instead, so
//! construction can happen more than once (e.g. in tests). `WorldConfig` is
//! that explicit state.

use crate::constants;
use crate::world::core::{MAX_CHUNK_HEIGHT, MAX_CHUNK_WIDTH};
use crate::world::WorldError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub chunk_width: i32,
    pub chunk_height: i32,
    pub world_width: i32,
    pub worker_count: usize,
    pub database_max_jobs: usize,
    pub noise: constants::NoiseVariant,
    pub database_path: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            chunk_width: constants::CHUNK_WIDTH,
            chunk_height: constants::CHUNK_HEIGHT,
            world_width: constants::WORLD_WIDTH,
            worker_count: constants::WORKER_COUNT,
            database_max_jobs: constants::DATABASE_MAX_JOBS,
            noise: constants::NoiseVariant::default(),
            database_path: PathBuf::from("world.sqlite"),
        }
    }
}

impl WorldConfig {
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_world_width(mut self, width: i32) -> Self {
        self.world_width = width;
        self
    }

    pub fn with_chunk_width(mut self, width: i32) -> Self {
        self.chunk_width = width;
        self
    }

    pub fn with_chunk_height(mut self, height: i32) -> Self {
        self.chunk_height = height;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_noise(mut self, noise: constants::NoiseVariant) -> Self {
        self.noise = noise;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub(crate) fn validate(&self) {
        debug_assert!(self.chunk_width > 0 && (self.chunk_width & (self.chunk_width - 1)) == 0);
        debug_assert!(self.chunk_width <= MAX_CHUNK_WIDTH);
        debug_assert!(self.chunk_height <= MAX_CHUNK_HEIGHT);
        debug_assert!(self.world_width % 2 == 1);
        debug_assert!(self.worker_count >= 1);
    }

    /// Construction-time validation that returns an explicit error instead
    /// of asserting, for release builds and host applications that load
    /// `WorldConfig` from an untrusted TOML file (spec.md §7: persistence
    /// open/prepare failure at init is fatal; malformed construction
    /// parameters are the same class of error). Chunk dimensions are also
    /// checked against the vertex packer's bit widths (`world::core::mesh`)
    /// so a config the packer can't represent is rejected here rather than
    /// silently dropping far-edge faces at mesh time.
    pub fn try_validate(&self) -> Result<(), WorldError> {
        if self.chunk_width <= 0 || (self.chunk_width & (self.chunk_width - 1)) != 0 {
            return Err(WorldError::ChunkWidthNotPowerOfTwo(self.chunk_width));
        }
        if self.chunk_width > MAX_CHUNK_WIDTH {
            return Err(WorldError::ChunkWidthExceedsPackingLimit(self.chunk_width, MAX_CHUNK_WIDTH));
        }
        if self.chunk_height > MAX_CHUNK_HEIGHT {
            return Err(WorldError::ChunkHeightExceedsPackingLimit(self.chunk_height, MAX_CHUNK_HEIGHT));
        }
        if self.world_width % 2 != 1 {
            return Err(WorldError::WorldWidthNotOdd(self.world_width));
        }
        if self.worker_count < 1 {
            return Err(WorldError::NoWorkers);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = WorldConfig::default();
        cfg.validate();
        assert_eq!(cfg.world_width % 2, 1);
    }

    #[test]
    fn builder_overrides_apply() {
        let cfg = WorldConfig::default().with_world_width(11).with_worker_count(2);
        assert_eq!(cfg.world_width, 11);
        assert_eq!(cfg.worker_count, 2);
    }

    #[test]
    fn try_validate_rejects_even_world_width() {
        let cfg = WorldConfig::default().with_world_width(10);
        assert!(matches!(cfg.try_validate(), Err(WorldError::WorldWidthNotOdd(10))));
    }

    #[test]
    fn try_validate_rejects_zero_workers() {
        let cfg = WorldConfig::default().with_worker_count(0);
        assert!(matches!(cfg.try_validate(), Err(WorldError::NoWorkers)));
    }

    #[test]
    fn try_validate_accepts_the_documented_typical_chunk_size() {
        let cfg = WorldConfig::default().with_chunk_width(32).with_chunk_height(256);
        assert!(cfg.try_validate().is_ok());
    }

    #[test]
    fn try_validate_rejects_a_chunk_height_the_packer_cannot_represent() {
        let cfg = WorldConfig::default().with_chunk_height(MAX_CHUNK_HEIGHT + 1);
        assert!(matches!(cfg.try_validate(), Err(WorldError::ChunkHeightExceedsPackingLimit(_, _))));
    }

    #[test]
    fn try_validate_rejects_a_chunk_width_the_packer_cannot_represent() {
        let cfg = WorldConfig::default().with_chunk_width(128);
        assert!(matches!(cfg.try_validate(), Err(WorldError::ChunkWidthExceedsPackingLimit(_, _))));
    }
}
