//! World façade (component C8): the one entry point the host application
//! calls once per frame, plus the synchronous edit API. Grounded in
//! `original_source/src/world.c`'s `world_update`/`world_render`/
//! `world_get_block`/`world_set_block`.
//!
//! Per spec.md §9, this struct is the explicit, constructed-once owner
//! the reference implementation's process-wide statics (`world_x`,
//! `workers[]`, `chunks[][]`, the database handle) are replaced with —
//! nothing here is a global.

use crate::config::WorldConfig;
use crate::error::EngineResult;
use crate::gpu::{GpuBackend, MeshClass};
use crate::persistence::{BlockRecord, PersistenceHandle};
use crate::world::core::{self, raycast, Aabb, BlockId, Frustum, RaycastHit};
use crate::world::grid::ChunkGrid;
use crate::world::terrain::TerrainGenerator;
use crate::world::worker::{JobKind, WorkerPool};
use cgmath::{Point3, Vector3};
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub struct ChunkDraw<G: GpuBackend> {
    pub origin_x: i32,
    pub origin_z: i32,
    /// Per `MeshClass` (opaque/transparent/sprite): vertex buffer + face count.
    pub mesh: [(Option<G::Buffer>, u32); 3],
    pub light_buffer: G::Buffer,
    pub index_buffer: G::Buffer,
}

pub struct World<G: GpuBackend> {
    config: WorldConfig,
    grid: Arc<ChunkGrid<G>>,
    workers: WorkerPool<G>,
    persistence: Arc<PersistenceHandle>,
    gpu: Arc<G>,
}

impl<G: GpuBackend> World<G> {
    pub fn new(config: WorldConfig, gpu: G) -> EngineResult<Self> {
        config.try_validate()?;
        let grid = Arc::new(ChunkGrid::new(config.world_width, config.chunk_width, config.chunk_height, 0, 0));
        let terrain = Arc::new(TerrainGenerator::new(config.noise, 0));
        let persistence = Arc::new(PersistenceHandle::open(&config.database_path, config.database_max_jobs)?);
        let gpu = Arc::new(gpu);
        let workers = WorkerPool::spawn(config.worker_count, grid.clone(), terrain, persistence.clone(), gpu.clone());
        log::info!(
            "world initialized: {}x{} grid, chunk size {}, {} workers",
            config.world_width,
            config.world_width,
            config.chunk_width,
            config.worker_count
        );
        Ok(World { config, grid, workers, persistence, gpu })
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Called once per frame. Re-homes the grid to follow `viewer` (deferred
    /// if any worker is busy); a successful slide falls through to the same
    /// dispatch pass below rather than waiting for the next call, matching
    /// `original_source/src/world.c`'s `world_update` (`move_chunks`, then
    /// `if (!should_move) update_chunks()` — `should_move` is already false
    /// once the move succeeds). Dispatches up to one job per idle worker in
    /// near-to-far, dependency-respecting priority order (spec.md §4.8).
    pub fn update(&self, viewer_x: f32, viewer_z: f32) {
        let cw = self.grid.chunk_width();
        let half = self.grid.width() / 2;
        let desired_wx = (viewer_x / cw as f32).floor() as i32 - half;
        let desired_wz = (viewer_z / cw as f32).floor() as i32 - half;

        let origin_changed = desired_wx != self.grid.world_x() || desired_wz != self.grid.world_z();

        if origin_changed || self.grid.is_slide_pending() {
            if self.any_worker_busy() {
                self.grid.set_slide_pending(true);
                return;
            }
            self.grid.slide(desired_wx, desired_wz);
            self.grid.set_slide_pending(false);
        }

        self.dispatch_jobs();
    }

    fn any_worker_busy(&self) -> bool {
        (0..self.workers.worker_count()).any(|w| !self.workers.is_idle(w))
    }

    fn dispatch_jobs(&self) {
        let mut idle: Vec<usize> = (0..self.workers.worker_count()).filter(|&w| self.workers.is_idle(w)).collect();
        if idle.is_empty() {
            return;
        }

        for &slot in self.grid.sort_order() {
            if idle.is_empty() {
                return;
            }
            let (i, j) = self.grid.coords(slot);
            let handle = self.grid.chunk(slot);
            let needs_blocks = handle.read().flags.set_blocks.load(Ordering::Acquire);
            if needs_blocks {
                handle.read().flags.set_blocks.store(false, Ordering::Release);
                let worker = idle.remove(0);
                self.workers.dispatch(worker, JobKind::SetBlocks, i, j);
            }
        }
        if idle.is_empty() {
            return;
        }

        for &slot in self.grid.sort_order() {
            if idle.is_empty() {
                return;
            }
            let (i, j) = self.grid.coords(slot);
            if self.grid.is_bordering(i, j) {
                continue;
            }
            let handle = self.grid.chunk(slot);
            let needs_voxels = handle.read().flags.set_voxels.load(Ordering::Acquire);
            if !needs_voxels || !self.neighborhood_has_blocks(i, j) {
                continue;
            }
            handle.read().flags.set_voxels.store(false, Ordering::Release);
            let worker = idle.remove(0);
            self.workers.dispatch(worker, JobKind::SetVoxels, i, j);
        }
        if idle.is_empty() {
            return;
        }

        for &slot in self.grid.sort_order() {
            if idle.is_empty() {
                return;
            }
            let (i, j) = self.grid.coords(slot);
            if self.grid.is_bordering(i, j) {
                continue;
            }
            let handle = self.grid.chunk(slot);
            let needs_lights = handle.read().flags.set_lights.load(Ordering::Acquire);
            if !needs_lights || !self.neighborhood_has_blocks(i, j) {
                continue;
            }
            handle.read().flags.set_lights.store(false, Ordering::Release);
            let worker = idle.remove(0);
            self.workers.dispatch(worker, JobKind::SetLights, i, j);
        }
    }

    fn neighborhood_has_blocks(&self, i: i32, j: i32) -> bool {
        for di in -1..=1 {
            for dj in -1..=1 {
                match self.grid.chunk_at(i + di, j + dj) {
                    Some(handle) => {
                        if !handle.read().flags.has_blocks.load(Ordering::Acquire) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
        }
        true
    }

    fn chunk_coords_of(&self, x: i32, z: i32) -> (i32, i32, i32, i32) {
        let cw = self.grid.chunk_width();
        let ci = x.div_euclid(cw) - self.grid.world_x();
        let cj = z.div_euclid(cw) - self.grid.world_z();
        (ci, cj, x.rem_euclid(cw), z.rem_euclid(cw))
    }

    /// Returns `BlockId::EMPTY` for any out-of-range, not-yet-loaded, or
    /// mid-remesh query instead of an error (spec.md §7 — this is the
    /// normal idle response, not a fault to surface).
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> BlockId {
        if y < 0 || y >= self.config.chunk_height {
            return BlockId::EMPTY;
        }
        let (ci, cj, lx, lz) = self.chunk_coords_of(x, z);
        let handle = match self.grid.chunk_at(ci, cj) {
            Some(h) => h,
            None => return BlockId::EMPTY,
        };
        let chunk = handle.read();
        if !chunk.flags.has_blocks.load(Ordering::Acquire) || chunk.flags.set_voxels.load(Ordering::Acquire) {
            return BlockId::EMPTY;
        }
        chunk.get_block_local(lx, y, lz)
    }

    /// No-op if the owning chunk isn't ready (spec.md §3/§7). Otherwise
    /// mutates the block array synchronously, dirties the owning chunk's
    /// (and up to two face-boundary neighbors') mesh flag, dirties the
    /// 3x3 light neighborhood if a light source was added or removed, and
    /// enqueues a persistence write.
    pub fn set_block(&self, x: i32, y: i32, z: i32, kind: BlockId) {
        if y < 0 || y >= self.config.chunk_height {
            return;
        }
        let (ci, cj, lx, lz) = self.chunk_coords_of(x, z);
        let handle = match self.grid.chunk_at(ci, cj) {
            Some(h) => h,
            None => return,
        };

        let old_kind;
        {
            let chunk = handle.read();
            if !chunk.flags.has_blocks.load(Ordering::Acquire) || chunk.flags.set_voxels.load(Ordering::Acquire) {
                return;
            }
        }
        {
            let mut chunk = handle.write();
            old_kind = chunk.get_block_local(lx, y, lz);
            chunk.set_block_local(lx, y, lz, kind);
        }
        handle.read().flags.set_voxels.store(true, Ordering::Release);

        let cw = self.grid.chunk_width();
        let mut face_neighbors: Vec<(i32, i32)> = Vec::with_capacity(2);
        if lx == 0 {
            face_neighbors.push((ci - 1, cj));
        }
        if lx == cw - 1 {
            face_neighbors.push((ci + 1, cj));
        }
        if lz == 0 {
            face_neighbors.push((ci, cj - 1));
        }
        if lz == cw - 1 {
            face_neighbors.push((ci, cj + 1));
        }
        for (ni, nj) in face_neighbors {
            if let Some(h) = self.grid.chunk_at(ni, nj) {
                h.read().flags.set_voxels.store(true, Ordering::Release);
            }
        }

        if core::is_light_source(old_kind) || core::is_light_source(kind) {
            for di in -1..=1 {
                for dj in -1..=1 {
                    if let Some(h) = self.grid.chunk_at(ci + di, cj + dj) {
                        h.read().flags.set_lights.store(true, Ordering::Release);
                    }
                }
            }
        }

        let cx = ci + self.grid.world_x();
        let cz = cj + self.grid.world_z();
        self.persistence.put_block(BlockRecord { cx, cz, bx: lx, by: y, bz: lz, block: kind.0 as i32 });
    }

    /// Amanatides-Woo DDA raycast (component C9) against this world's
    /// `get_block`.
    pub fn raycast(&self, origin: Point3<f32>, direction: Vector3<f32>, max_distance: f32) -> RaycastHit {
        raycast(origin, direction, max_distance, |x, y, z| self.get_block(x, y, z))
    }

    /// Walks the grid near-to-far, frustum-culls, and hands each visible,
    /// ready chunk's draw data to `emit` (spec.md §4.8's `world_render`).
    /// Border-ring chunks and chunks without a ready mesh are skipped.
    pub fn render(&self, frustum: &Frustum, mut emit: impl FnMut(ChunkDraw<G>)) {
        let size = Vector3::new(
            self.config.chunk_width as f32,
            self.config.chunk_height as f32,
            self.config.chunk_width as f32,
        );

        for &slot in self.grid.sort_order() {
            let (i, j) = self.grid.coords(slot);
            if self.grid.is_bordering(i, j) {
                continue;
            }
            let handle = self.grid.chunk(slot);
            let chunk = handle.read();
            if !chunk.flags.has_voxels.load(Ordering::Acquire) {
                continue;
            }

            let origin = Point3::new(chunk.origin_x as f32, 0.0, chunk.origin_z as f32);
            let aabb = Aabb::from_origin_size(origin, size);
            if !core::aabb_in_frustum(&aabb, frustum, size) {
                continue;
            }

            let mesh = std::array::from_fn(|idx| (chunk.mesh[idx].buffer.clone(), chunk.mesh[idx].face_count));
            let light_buffer = chunk.light_buffer.lock().clone().unwrap_or_else(|| self.gpu.empty_light_buffer());

            emit(ChunkDraw {
                origin_x: chunk.origin_x,
                origin_z: chunk.origin_z,
                mesh,
                light_buffer,
                index_buffer: self.gpu.shared_index_buffer(),
            });
        }
    }
}
