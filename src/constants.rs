//! Build/init-time tuning constants.
//!
//! These mirror the `#define`-style knobs in `original_source/src/main.c`
//! (`CHUNK_WIDTH`, `CHUNK_HEIGHT`, `WORLD_WIDTH`, workers) but are plain
//! `const`s here since the crate is a library, not a standalone binary.

/// Chunk width/depth in blocks. Must be a power of two.
pub const CHUNK_WIDTH: i32 = 16;

/// Chunk height in blocks.
pub const CHUNK_HEIGHT: i32 = 128;

/// Side length of the chunk grid window, in chunks. Must be odd so the
/// viewer chunk sits exactly at the center slot.
pub const WORLD_WIDTH: i32 = 21;

/// Number of worker threads dispatching SET_BLOCKS/SET_VOXELS/SET_LIGHTS jobs.
pub const WORKER_COUNT: usize = 4;

/// Bounded persistence job queue depth.
pub const DATABASE_MAX_JOBS: usize = 1024;

/// Named but intentionally unused: `original_source/src/physics.c`'s stepped
/// sampler used a fixed step size for raycasting. The DDA raycaster (§4.9)
/// advances voxel-to-voxel exactly and has no step parameter. Kept as a
/// recognized constant name so config files written against the older model
/// don't silently fail to parse.
#[allow(dead_code)]
pub const RAYCAST_STEP: f32 = 0.0;

/// Terrain noise source, replacing the original's function-pointer
/// dispatch (`noise.c`'s `NOISE_CUBE`/`NOISE_FLAT`) with an enum match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum NoiseVariant {
    /// Single solid chunk at the origin; everything else empty. Useful for
    /// mesh/packing tests that want a known, tiny block layout.
    Cube,
    /// Three flat layers (stone, dirt, grass) repeated across every column.
    Flat,
    /// Fractal Brownian motion terrain (the default).
    #[default]
    Fbm,
}

fn assert_power_of_two(n: i32) {
    debug_assert!(n > 0 && (n & (n - 1)) == 0, "chunk width must be a power of two");
}

pub fn validate() {
    assert_power_of_two(CHUNK_WIDTH);
    debug_assert!(WORLD_WIDTH % 2 == 1, "world width must be odd");
    debug_assert!(WORKER_COUNT >= 1, "at least one worker is required");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_width_is_power_of_two() {
        assert_eq!(CHUNK_WIDTH & (CHUNK_WIDTH - 1), 0);
    }

    #[test]
    fn world_width_is_odd() {
        assert_eq!(WORLD_WIDTH % 2, 1);
    }
}
