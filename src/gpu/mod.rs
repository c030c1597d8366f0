//! The narrow GPU buffer contract this crate consumes.
//!
//! Everything pipeline/shader/command-buffer related is an external
//! collaborator per spec.md §1/§6 — this trait only covers the handful of
//! operations C2/C6/C8 actually need: uploading packed vertex words into a
//! device buffer, growing one shared index buffer, and binding a
//! (possibly empty) per-chunk light storage buffer. Shape mirrors
//! `original_source/src/buffer.h`'s `cpu_buffer_t`/`gpu_buffer_t` pair,
//! translated into the teacher's `wgpu`-backed idiom.
//!
//! Implementations own the actual `wgpu::Device`/`wgpu::Queue`; this crate
//! never constructs either itself (that's the host's window/event-loop
//! code), matching the teacher's separation between `world::storage` (owns
//! buffers) and `renderer` (owns the device). [`wgpu_backend::WgpuBackend`]
//! is the real implementation against a caller-supplied device/queue;
//! [`tests_support::NullGpu`] is an in-memory stand-in for tests that never
//! touch a GPU adapter.

pub mod wgpu_backend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshClass {
    Opaque,
    Transparent,
    Sprite,
}

impl MeshClass {
    pub const ALL: [MeshClass; 3] = [MeshClass::Opaque, MeshClass::Transparent, MeshClass::Sprite];
}

/// One propagated light contribution, matching `original_source/src/light.h`'s
/// `light_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightEntry {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub intensity: u8,
}

/// Backend consumed by [`crate::world::World`] for chunk vertex/light
/// uploads and the shared index buffer. Buffers are opaque handles from
/// this crate's point of view; it never reads them back.
pub trait GpuBackend: Send + Sync + 'static {
    type Buffer: Send + Sync + Clone + std::fmt::Debug;

    /// Uploads packed face vertices (see `world::core::mesh`) for one mesh
    /// class of one chunk, returning the buffer handle to store on the chunk.
    fn upload_vertex_buffer(&self, class: MeshClass, words: &[u32]) -> Self::Buffer;

    /// Uploads a chunk's light list.
    fn upload_light_buffer(&self, lights: &[LightEntry]) -> Self::Buffer;

    /// A shared single-element buffer bound when a chunk has no lights, so
    /// the render path never needs a branch for "no light buffer".
    fn empty_light_buffer(&self) -> Self::Buffer;

    /// Grows the single shared index buffer (pattern in
    /// `world::core::mesh::FACE_INDEX_PATTERN`) so it can address at least
    /// `min_faces` faces. No-op if already large enough.
    fn grow_shared_index_buffer(&self, min_faces: u32);

    /// Handle to the shared index buffer bound alongside every chunk's
    /// per-class vertex buffer at render time.
    fn shared_index_buffer(&self) -> Self::Buffer;
}

/// An in-memory stand-in for `GpuBackend` used by unit/integration tests,
/// since this crate never constructs a real `wgpu::Device` itself (that's
/// the host application's job). Buffers are just owned `Vec`s.
#[doc(hidden)]
pub mod tests_support {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    pub enum TestBuffer {
        Vertices(Vec<u32>),
        Lights(Vec<LightEntry>),
        Empty,
        Index,
    }

    pub struct NullGpu {
        index_faces: AtomicU32,
    }

    impl Default for NullGpu {
        fn default() -> Self {
            NullGpu { index_faces: AtomicU32::new(0) }
        }
    }

    impl GpuBackend for NullGpu {
        type Buffer = TestBuffer;

        fn upload_vertex_buffer(&self, _class: MeshClass, words: &[u32]) -> Self::Buffer {
            TestBuffer::Vertices(words.to_vec())
        }

        fn upload_light_buffer(&self, lights: &[LightEntry]) -> Self::Buffer {
            TestBuffer::Lights(lights.to_vec())
        }

        fn empty_light_buffer(&self) -> Self::Buffer {
            TestBuffer::Empty
        }

        fn grow_shared_index_buffer(&self, min_faces: u32) {
            self.index_faces.fetch_max(min_faces, Ordering::Relaxed);
        }

        fn shared_index_buffer(&self) -> Self::Buffer {
            TestBuffer::Index
        }
    }
}
