//! Chunk storage and lifecycle flags (components C3/C7).
//!
//! The six-flag state machine below matches spec.md §4.7 exactly:
//!
//! | Flag | Set by | Cleared by | Meaning |
//! |---|---|---|---|
//! | `set_blocks` | slide (re-home), init | dispatcher before SET_BLOCKS | terrain/persistence load is needed |
//! | `has_blocks` | SET_BLOCKS job completion | slide (re-home) | block array is valid to read |
//! | `set_voxels` | `World::set_block` (self + neighbors), SET_BLOCKS completion | dispatcher before SET_VOXELS | mesh needs rebuilding |
//! | `has_voxels` | SET_VOXELS job completion | slide, `set_voxels` flip | mesh buffers are valid to render |
//! | `set_lights` | `World::set_block`, light-source edit (3x3 neighborhood) | dispatcher before SET_LIGHTS | light list needs rebuilding |
//! | `has_lights` | SET_LIGHTS job completion | slide | light buffer is valid to bind |

use crate::gpu::{GpuBackend, LightEntry, MeshClass};
use crate::world::core::BlockId;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Identity (stable for the chunk slot's lifetime) + generation (bumped on
/// every block mutation), matching `original_source/src/helpers.c`'s `tag_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub identity: u64,
    pub generation: u64,
}

#[derive(Default)]
pub struct ChunkFlags {
    pub set_blocks: AtomicBool,
    pub has_blocks: AtomicBool,
    pub set_voxels: AtomicBool,
    pub has_voxels: AtomicBool,
    pub set_lights: AtomicBool,
    pub has_lights: AtomicBool,
}

impl ChunkFlags {
    fn new_needs_blocks() -> Self {
        let flags = ChunkFlags::default();
        flags.set_blocks.store(true, Ordering::Relaxed);
        flags
    }

    pub fn reset_for_rehome(&self) {
        self.set_blocks.store(true, Ordering::Relaxed);
        self.has_blocks.store(false, Ordering::Relaxed);
        self.set_voxels.store(false, Ordering::Relaxed);
        self.has_voxels.store(false, Ordering::Relaxed);
        self.set_lights.store(false, Ordering::Relaxed);
        self.has_lights.store(false, Ordering::Relaxed);
    }
}

pub struct MeshBuffers<G: GpuBackend> {
    pub buffer: Option<G::Buffer>,
    /// CPU-side face count for this mesh class, used to size index draws.
    pub face_count: u32,
}

impl<G: GpuBackend> Default for MeshBuffers<G> {
    fn default() -> Self {
        Self { buffer: None, face_count: 0 }
    }
}

/// One grid slot's owned chunk data (component C3). Dense block array,
/// world-space origin, lifecycle flags, and per-mesh-class GPU buffers.
/// Chunks never hold a back-pointer to their grid (spec.md §9): neighbor
/// access always goes through `ChunkGrid`.
pub struct Chunk<G: GpuBackend> {
    pub origin_x: i32,
    pub origin_z: i32,
    chunk_width: i32,
    chunk_height: i32,
    blocks: Vec<BlockId>,
    pub flags: ChunkFlags,
    pub tag: Mutex<Tag>,
    pub mesh: [MeshBuffers<G>; 3],
    pub lights: Mutex<Vec<LightEntry>>,
    pub light_buffer: Mutex<Option<G::Buffer>>,
}

impl<G: GpuBackend> Chunk<G> {
    fn block_index(&self, x: i32, y: i32, z: i32) -> usize {
        debug_assert!(x >= 0 && x < self.chunk_width);
        debug_assert!(y >= 0 && y < self.chunk_height);
        debug_assert!(z >= 0 && z < self.chunk_width);
        let cw = self.chunk_width as usize;
        (y as usize * cw * cw) + (z as usize * cw) + x as usize
    }

    pub fn new(identity: u64, origin_x: i32, origin_z: i32, chunk_width: i32, chunk_height: i32) -> Self {
        let cw = chunk_width as usize;
        let ch = chunk_height as usize;
        Chunk {
            origin_x,
            origin_z,
            chunk_width,
            chunk_height,
            blocks: vec![BlockId::EMPTY; cw * ch * cw],
            flags: ChunkFlags::new_needs_blocks(),
            tag: Mutex::new(Tag { identity, generation: 0 }),
            mesh: Default::default(),
            lights: Mutex::new(Vec::new()),
            light_buffer: Mutex::new(None),
        }
    }

    pub fn chunk_width(&self) -> i32 {
        self.chunk_width
    }

    pub fn chunk_height(&self) -> i32 {
        self.chunk_height
    }

    pub fn get_block_local(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.blocks[self.block_index(x, y, z)]
    }

    pub fn set_block_local(&mut self, x: i32, y: i32, z: i32, kind: BlockId) {
        let idx = self.block_index(x, y, z);
        self.blocks[idx] = kind;
        let mut tag = self.tag.lock();
        tag.generation += 1;
    }

    pub fn blocks_mut(&mut self) -> &mut [BlockId] {
        &mut self.blocks
    }

    pub fn blocks(&self) -> &[BlockId] {
        &self.blocks
    }

    pub fn tag_snapshot(&self) -> Tag {
        *self.tag.lock()
    }

    pub fn upload_mesh(&mut self, class: MeshClass, words: &[u32], face_count: u32, backend: &G) {
        let buffer = backend.upload_vertex_buffer(class, words);
        let slot = &mut self.mesh[class as usize];
        slot.buffer = Some(buffer);
        slot.face_count = face_count;
    }

    pub fn upload_lights(&self, lights: Vec<LightEntry>, backend: &G) {
        let buffer = backend.upload_light_buffer(&lights);
        *self.light_buffer.lock() = Some(buffer);
        *self.lights.lock() = lights;
    }

    pub fn rehome(&mut self, identity_preserving: bool, new_x: i32, new_z: i32) {
        self.origin_x = new_x;
        self.origin_z = new_z;
        self.flags.reset_for_rehome();
        if !identity_preserving {
            let mut tag = self.tag.lock();
            tag.generation += 1;
        }
        for m in &mut self.mesh {
            m.buffer = None;
            m.face_count = 0;
        }
        *self.light_buffer.lock() = None;
        self.lights.lock().clear();
    }
}

impl MeshClass {
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[allow(dead_code)]
fn _assert_mesh_class_indexes_match() {
    // MeshClass::ALL order must match Chunk::mesh's [MeshBuffers; 3] layout.
    let _ = MeshClass::ALL;
}
