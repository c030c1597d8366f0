//! Voxel world streaming and meshing core.
//!
//! An infinite, streaming, editable 3D block world: a sliding grid of
//! chunk columns around the viewer (`world::grid`), a worker pool that
//! generates terrain and meshes off the render thread (`world::worker`),
//! a chunk lifecycle state machine (`world::chunk`), a persistence thread
//! backed by an embedded relational store (`persistence`), a fractal-noise
//! terrain generator (`world::terrain`), and a DDA voxel raycaster
//! (`world::core::raycast`). The GPU abstraction, shader/pipeline library,
//! camera math, input handling, window/event loop, and texture-atlas
//! management are external collaborators this crate only consumes through
//! [`gpu::GpuBackend`].
//!
//! [`world::World`] is the single entry point: construct one with
//! [`world::World::new`], call [`world::World::update`] once per frame,
//! and [`world::World::render`] to enumerate draw calls.

pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod persistence;
pub mod world;

pub use config::WorldConfig;
pub use error::{EngineError, EngineResult};
pub use world::{ChunkDraw, World};
