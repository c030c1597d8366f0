//! Worker pool (component C6).
//!
//! Grounded in `original_source/src/worker.c`: each worker owns a
//! single-slot job inbox guarded by a mutex + condvar and sleeps while the
//! slot holds `JobKind::None`. The dispatcher (in `world.rs`, component C8)
//! writes at most one job per worker per frame and — critically, per
//! `worker_dispatch`'s comment about avoiding re-dispatch races — clears
//! the chunk's pending-work flag *before* handing the job to the worker,
//! not after.
//!
//! Each worker owns its own CPU staging buffers so concurrent jobs never
//! contend (spec.md §4.6); those buffers are plain `Vec`s reused across
//! jobs, held in thread-local storage for the worker's lifetime.

use crate::gpu::{GpuBackend, LightEntry, MeshClass};
use crate::persistence::{BlockRecord, PersistenceHandle};
use crate::world::core::{self, BlockId, Direction};
use crate::world::grid::ChunkGrid;
use crate::world::terrain::TerrainGenerator;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    None,
    Quit,
    SetBlocks,
    SetVoxels,
    SetLights,
}

#[derive(Debug, Clone, Copy)]
struct Inbox {
    kind: JobKind,
    i: i32,
    j: i32,
}

impl Default for Inbox {
    fn default() -> Self {
        Inbox { kind: JobKind::None, i: 0, j: 0 }
    }
}

struct Slot {
    mutex: Mutex<Inbox>,
    condvar: Condvar,
}

pub struct WorkerHandle {
    slot: Arc<Slot>,
    thread: Option<std::thread::JoinHandle<()>>,
}

pub struct WorkerPool<G: GpuBackend> {
    workers: Vec<WorkerHandle>,
    _marker: std::marker::PhantomData<G>,
}

impl<G: GpuBackend> WorkerPool<G> {
    pub fn spawn(
        count: usize,
        grid: Arc<ChunkGrid<G>>,
        terrain: Arc<TerrainGenerator>,
        persistence: Arc<PersistenceHandle>,
        gpu: Arc<G>,
    ) -> Self {
        let mut workers = Vec::with_capacity(count);
        for id in 0..count {
            let slot = Arc::new(Slot { mutex: Mutex::new(Inbox::default()), condvar: Condvar::new() });
            let thread_slot = slot.clone();
            let thread_grid = grid.clone();
            let thread_terrain = terrain.clone();
            let thread_persistence = persistence.clone();
            let thread_gpu = gpu.clone();
            let thread = std::thread::Builder::new()
                .name(format!("world-worker-{id}"))
                .spawn(move || worker_loop(thread_slot, thread_grid, thread_terrain, thread_persistence, thread_gpu))
                .expect("failed to spawn world worker thread");
            workers.push(WorkerHandle { slot, thread: Some(thread) });
        }
        WorkerPool { workers, _marker: std::marker::PhantomData }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// True when the worker's inbox is empty and it can accept a new job.
    pub fn is_idle(&self, worker: usize) -> bool {
        self.workers[worker].slot.mutex.lock().kind == JobKind::None
    }

    /// Dispatches a job to `worker`. Panics if the worker's inbox is not
    /// empty — dispatch must never overwrite an in-flight job.
    pub fn dispatch(&self, worker: usize, kind: JobKind, i: i32, j: i32) {
        let slot = &self.workers[worker].slot;
        let mut inbox = slot.mutex.lock();
        assert_eq!(inbox.kind, JobKind::None, "dispatch invariant violated: worker inbox was not empty");
        *inbox = Inbox { kind, i, j };
        slot.condvar.notify_one();
    }
}

impl<G: GpuBackend> Drop for WorkerPool<G> {
    fn drop(&mut self) {
        for worker in &self.workers {
            let mut inbox = worker.slot.mutex.lock();
            if inbox.kind == JobKind::None {
                *inbox = Inbox { kind: JobKind::Quit, i: 0, j: 0 };
                worker.slot.condvar.notify_one();
            }
        }
        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

fn worker_loop<G: GpuBackend>(
    slot: Arc<Slot>,
    grid: Arc<ChunkGrid<G>>,
    terrain: Arc<TerrainGenerator>,
    persistence: Arc<PersistenceHandle>,
    gpu: Arc<G>,
) {
    // Reused across every job this worker ever runs, so jobs never contend
    // over allocation (spec.md §4.6).
    let mut vertex_staging: [Vec<u32>; 3] = [Vec::new(), Vec::new(), Vec::new()];
    let mut light_staging: Vec<LightEntry> = Vec::new();

    loop {
        let job = {
            let mut inbox = slot.mutex.lock();
            while inbox.kind == JobKind::None {
                slot.condvar.wait(&mut inbox);
            }
            *inbox
        };

        match job.kind {
            JobKind::None => unreachable!("woke with an empty inbox"),
            JobKind::Quit => break,
            JobKind::SetBlocks => do_set_blocks(&grid, &terrain, &persistence, job.i, job.j),
            JobKind::SetVoxels => do_set_voxels(&grid, &gpu, job.i, job.j, &mut vertex_staging),
            JobKind::SetLights => do_set_lights(&grid, &gpu, job.i, job.j, &mut light_staging),
        }

        let mut inbox = slot.mutex.lock();
        inbox.kind = JobKind::None;
        slot.condvar.notify_one();
    }
}

fn do_set_blocks<G: GpuBackend>(grid: &ChunkGrid<G>, terrain: &TerrainGenerator, persistence: &PersistenceHandle, i: i32, j: i32) {
    let handle = match grid.chunk_at(i, j) {
        Some(h) => h,
        None => return,
    };
    let (origin_x, origin_z) = {
        let chunk = handle.read();
        (chunk.origin_x, chunk.origin_z)
    };

    {
        let mut chunk = handle.write();
        let (cw, ch) = (chunk.chunk_width(), chunk.chunk_height());
        terrain.generate_chunk(origin_x, origin_z, cw, ch, |x, y, z, kind| {
            chunk.set_block_local(x, y, z, kind);
        });
    }

    let cw = grid.chunk_width();
    let cx = origin_x.div_euclid(cw);
    let cz = origin_z.div_euclid(cw);
    match persistence.get_blocks(cx, cz) {
        Ok(records) => {
            let mut chunk = handle.write();
            for record in records {
                chunk.set_block_local(record.bx, record.by, record.bz, BlockId(record.block as u16));
            }
        }
        Err(e) => log::error!("SET_BLOCKS: failed to load persisted deltas for ({cx},{cz}): {e}"),
    }

    let chunk = handle.read();
    chunk.flags.has_blocks.store(true, std::sync::atomic::Ordering::Release);
    chunk.flags.set_blocks.store(false, std::sync::atomic::Ordering::Release);
    // spec.md §4.7: SET_BLOCKS completion also marks the mesh stale so the
    // dispatcher's next pass picks this chunk up for SET_VOXELS. set_lights
    // is deliberately left untouched here — per the same table it is only
    // set by an edit that changes a light-source block.
    chunk.flags.set_voxels.store(true, std::sync::atomic::Ordering::Release);
}

/// Reads a block at chunk-local `(x, y, z)`, which may fall outside
/// `[0, CHUNK_WIDTH)` on the horizontal axes — such coordinates are
/// resolved into the appropriate neighbor chunk via `grid`. Returns
/// `BlockId::EMPTY` if the neighbor chunk doesn't exist or isn't loaded yet.
fn sample_block<G: GpuBackend>(grid: &ChunkGrid<G>, i: i32, j: i32, x: i32, y: i32, z: i32) -> BlockId {
    let cw = grid.chunk_width();
    let ch = grid.chunk_height();
    if y < 0 || y >= ch {
        return BlockId::EMPTY;
    }

    let (ni, dx) = resolve_axis(i, x, cw);
    let (nj, dz) = resolve_axis(j, z, cw);

    match grid.chunk_at(ni, nj) {
        Some(handle) => {
            let chunk = handle.read();
            if !chunk.flags.has_blocks.load(std::sync::atomic::Ordering::Acquire) {
                BlockId::EMPTY
            } else {
                chunk.get_block_local(dx, y, dz)
            }
        }
        None => BlockId::EMPTY,
    }
}

fn resolve_axis(chunk_index: i32, local: i32, chunk_width: i32) -> (i32, i32) {
    if local < 0 {
        (chunk_index - 1, local + chunk_width)
    } else if local >= chunk_width {
        (chunk_index + 1, local - chunk_width)
    } else {
        (chunk_index, local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NoiseVariant;
    use crate::gpu::tests_support::NullGpu;
    use std::sync::atomic::Ordering;

    #[test]
    fn resolve_axis_keeps_in_range_coordinates_in_the_same_chunk() {
        assert_eq!(resolve_axis(3, 5, 16), (3, 5));
    }

    #[test]
    fn resolve_axis_wraps_negative_local_into_the_west_neighbor() {
        assert_eq!(resolve_axis(3, -1, 16), (2, 15));
    }

    #[test]
    fn resolve_axis_wraps_overflow_local_into_the_east_neighbor() {
        assert_eq!(resolve_axis(3, 16, 16), (4, 0));
    }

    #[test]
    fn set_blocks_job_marks_chunk_ready_and_overlays_persisted_deltas() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = Arc::new(PersistenceHandle::open(dir.path().join("w.sqlite"), 16).unwrap());
        // grid world origin is (0, 0), so slot (1, 1) covers chunk coord (1, 1).
        persistence.put_block(BlockRecord { cx: 1, cz: 1, bx: 2, by: 2, bz: 2, block: BlockId::GLASS.0 as i32 });
        persistence.commit();
        std::thread::sleep(std::time::Duration::from_millis(50));

        let grid = Arc::new(ChunkGrid::<NullGpu>::new(3, 16, 128, 0, 0));
        let terrain = Arc::new(TerrainGenerator::new(NoiseVariant::Flat, 0));

        do_set_blocks(&grid, &terrain, &persistence, 1, 1);

        let handle = grid.chunk_at(1, 1).unwrap();
        let chunk = handle.read();
        assert!(chunk.flags.has_blocks.load(Ordering::Acquire));
        assert!(!chunk.flags.set_blocks.load(Ordering::Acquire));
        assert!(chunk.flags.set_voxels.load(Ordering::Acquire));
        assert_eq!(chunk.get_block_local(2, 2, 2), BlockId::GLASS);
        // untouched flat-terrain cell still shows the generator's own output
        assert_eq!(chunk.get_block_local(0, 0, 0), BlockId::STONE);
    }

    #[test]
    fn set_voxels_job_produces_no_faces_for_an_all_empty_chunk() {
        let grid = Arc::new(ChunkGrid::<NullGpu>::new(3, 16, 128, 0, 0));
        let gpu = NullGpu::default();
        let mut staging: [Vec<u32>; 3] = [Vec::new(), Vec::new(), Vec::new()];

        // Mark every neighbor as blocks-ready (all-empty by default allocation).
        for di in -1..=1 {
            for dj in -1..=1 {
                if let Some(h) = grid.chunk_at(1 + di, 1 + dj) {
                    h.read().flags.has_blocks.store(true, Ordering::Release);
                }
            }
        }

        do_set_voxels(&grid, &gpu, 1, 1, &mut staging);

        let handle = grid.chunk_at(1, 1).unwrap();
        let chunk = handle.read();
        assert!(chunk.flags.has_voxels.load(Ordering::Acquire));
        for class in MeshClass::ALL {
            assert_eq!(chunk.mesh[class.index()].face_count, 0);
        }
    }
}

fn do_set_voxels<G: GpuBackend>(grid: &ChunkGrid<G>, gpu: &G, i: i32, j: i32, staging: &mut [Vec<u32>; 3]) {
    let handle = match grid.chunk_at(i, j) {
        Some(h) => h,
        None => return,
    };

    for v in staging.iter_mut() {
        v.clear();
    }
    let mut face_counts = [0u32; 3];

    let cw = grid.chunk_width();
    let ch = grid.chunk_height();

    {
        let chunk = handle.read();
        for x in 0..cw {
            for y in 0..ch {
                for z in 0..cw {
                    let kind = chunk.get_block_local(x, y, z);
                    if kind.is_empty() {
                        continue;
                    }

                    if core::is_sprite(kind) {
                        let class = MeshClass::Transparent;
                        for quad in 0..4u8 {
                            match core::pack_sprite_quad(kind, x, y, z, quad) {
                                Ok(verts) => {
                                    staging[class.index()].extend_from_slice(&verts);
                                    face_counts[class.index()] += 1;
                                }
                                Err(e) => log::error!("SET_VOXELS: sprite pack failed at ({x},{y},{z}): {e}"),
                            }
                        }
                        continue;
                    }

                    let class = if core::is_opaque(kind) { MeshClass::Opaque } else { MeshClass::Transparent };
                    for dir in Direction::ALL {
                        let (dx, dy, dz) = dir.offset();
                        let neighbor = sample_block(grid, i, j, x + dx, y + dy, z + dz);
                        if !core::face_visible(kind, neighbor) {
                            continue;
                        }
                        match core::pack_face(kind, x, y, z, dir, [0; 4]) {
                            Ok(verts) => {
                                staging[class.index()].extend_from_slice(&verts);
                                face_counts[class.index()] += 1;
                            }
                            Err(e) => log::error!("SET_VOXELS: face pack failed at ({x},{y},{z},{dir:?}): {e}"),
                        }
                    }
                }
            }
        }
    }

    let total_faces: u32 = face_counts.iter().sum();
    gpu.grow_shared_index_buffer(total_faces);

    {
        let mut chunk = handle.write();
        for class in MeshClass::ALL {
            let words = &staging[class.index()];
            chunk.upload_mesh(class, words, face_counts[class.index()], gpu);
        }
    }

    handle.read().flags.has_voxels.store(true, std::sync::atomic::Ordering::Release);
    handle.read().flags.set_voxels.store(false, std::sync::atomic::Ordering::Release);
}

fn do_set_lights<G: GpuBackend>(grid: &ChunkGrid<G>, gpu: &G, i: i32, j: i32, staging: &mut Vec<LightEntry>) {
    let handle = match grid.chunk_at(i, j) {
        Some(h) => h,
        None => return,
    };
    staging.clear();

    let cw = grid.chunk_width();
    let ch = grid.chunk_height();

    for di in -1..=1 {
        for dj in -1..=1 {
            let neighbor = match grid.chunk_at(i + di, j + dj) {
                Some(h) => h,
                None => continue,
            };
            let chunk = neighbor.read();
            if !chunk.flags.has_blocks.load(std::sync::atomic::Ordering::Acquire) {
                continue;
            }
            for x in 0..cw {
                for y in 0..ch {
                    for z in 0..cw {
                        let kind = chunk.get_block_local(x, y, z);
                        if core::is_light_source(kind) {
                            staging.push(LightEntry {
                                x: chunk.origin_x + x,
                                y,
                                z: chunk.origin_z + z,
                                red: 255,
                                green: 255,
                                blue: 255,
                                intensity: 15,
                            });
                        }
                    }
                }
            }
        }
    }

    handle.read().upload_lights(staging.clone(), gpu);
    handle.read().flags.has_lights.store(true, std::sync::atomic::Ordering::Release);
    handle.read().flags.set_lights.store(false, std::sync::atomic::Ordering::Release);
}
