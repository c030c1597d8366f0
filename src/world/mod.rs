//! World streaming and meshing core: the sliding grid (C3/C7), terrain
//! generator (C4), worker pool (C6), and façade (C8) that together
//! implement spec.md §§3-4.
//!
//! Mirrors the teacher's `world/` split into `core` (backend-independent
//! data types), `chunk`/`grid` (storage), `terrain` (generation), `worker`
//! (the dispatcher's job bodies), and `facade` (the public entry point),
//! rather than the single `world.c`/`world.h` pair in `original_source`.

pub mod chunk;
pub mod core;
pub mod facade;
pub mod grid;
pub mod physics;
pub mod terrain;
pub mod worker;

pub use facade::{ChunkDraw, World};

/// Errors surfaced only at [`World::new`](facade::World::new) construction
/// time. Per spec.md §7, every steady-state per-frame path (`get_block`,
/// `set_block`, `update`, `render`) has no observable error state and uses
/// sentinel/no-op behavior instead — `WorldError` is never returned from
/// those.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("chunk width must be a power of two, got {0}")]
    ChunkWidthNotPowerOfTwo(i32),

    #[error("world width must be odd, got {0}")]
    WorldWidthNotOdd(i32),

    #[error("at least one worker thread is required")]
    NoWorkers,

    #[error("chunk_width {0} exceeds the packer's limit of {1}")]
    ChunkWidthExceedsPackingLimit(i32, i32),

    #[error("chunk_height {0} exceeds the packer's limit of {1}")]
    ChunkHeightExceedsPackingLimit(i32, i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_error_messages_are_non_empty() {
        let errs = [
            WorldError::ChunkWidthNotPowerOfTwo(15),
            WorldError::WorldWidthNotOdd(10),
            WorldError::NoWorkers,
            WorldError::ChunkWidthExceedsPackingLimit(128, core::MAX_CHUNK_WIDTH),
            WorldError::ChunkHeightExceedsPackingLimit(1024, core::MAX_CHUNK_HEIGHT),
        ];
        for e in errs {
            assert!(!e.to_string().is_empty());
        }
    }
}
