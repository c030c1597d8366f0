//! Sliding chunk-column grid (component C3) and its precomputed
//! near-to-far sort order (first half of component C10).
//!
//! `slide` is a direct translation of `original_source/src/world.c`'s
//! `move_chunks`: pointers are shuffled between grid slots, never
//! reallocated, and re-homed chunks get their flags reset to "needs
//! blocks" rather than their memory freed. Each slot holds an
//! `Arc<RwLock<Chunk>>` rather than a bare pointer so the grid can be
//! shared with worker threads (`&self`, not `&mut self`) while still
//! giving `slide` exclusive access to reshuffle slots; the reshuffle
//! itself only swaps cheap `Arc` pointers under one short-lived write
//! lock, never touching chunk contents.

use crate::gpu::GpuBackend;
use crate::world::chunk::Chunk;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

pub type ChunkHandle<G> = Arc<RwLock<Chunk<G>>>;

pub struct ChunkGrid<G: GpuBackend> {
    width: i32,
    chunk_width: i32,
    chunk_height: i32,
    slots: RwLock<Vec<ChunkHandle<G>>>,
    world_x: AtomicI32,
    world_z: AtomicI32,
    /// Slot indices ordered by ascending squared distance from the center,
    /// precomputed once at construction and reused for both dispatch
    /// priority and render order (spec.md §4.10).
    sort_order: Vec<usize>,
    next_identity: std::sync::atomic::AtomicU64,
    slide_pending: AtomicBool,
}

impl<G: GpuBackend> ChunkGrid<G> {
    pub fn new(width: i32, chunk_width: i32, chunk_height: i32, world_x: i32, world_z: i32) -> Self {
        debug_assert!(width % 2 == 1);
        let mut next_identity = 0u64;
        let mut slots = Vec::with_capacity((width * width) as usize);
        for i in 0..width {
            for j in 0..width {
                let cx = (world_x + i) * chunk_width;
                let cz = (world_z + j) * chunk_width;
                slots.push(Arc::new(RwLock::new(Chunk::new(next_identity, cx, cz, chunk_width, chunk_height))));
                next_identity += 1;
            }
        }
        let sort_order = compute_sort_order(width);
        ChunkGrid {
            width,
            chunk_width,
            chunk_height,
            slots: RwLock::new(slots),
            world_x: AtomicI32::new(world_x),
            world_z: AtomicI32::new(world_z),
            sort_order,
            next_identity: std::sync::atomic::AtomicU64::new(next_identity),
            slide_pending: AtomicBool::new(false),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn chunk_width(&self) -> i32 {
        self.chunk_width
    }

    pub fn chunk_height(&self) -> i32 {
        self.chunk_height
    }

    pub fn world_x(&self) -> i32 {
        self.world_x.load(Ordering::Acquire)
    }

    pub fn world_z(&self) -> i32 {
        self.world_z.load(Ordering::Acquire)
    }

    pub fn sort_order(&self) -> &[usize] {
        &self.sort_order
    }

    pub fn index(&self, i: i32, j: i32) -> usize {
        (i * self.width + j) as usize
    }

    pub fn coords(&self, slot: usize) -> (i32, i32) {
        let slot = slot as i32;
        (slot / self.width, slot % self.width)
    }

    pub fn is_in_bounds(&self, i: i32, j: i32) -> bool {
        i >= 0 && j >= 0 && i < self.width && j < self.width
    }

    /// Border ring slots are never meshed (spec.md §3).
    pub fn is_bordering(&self, i: i32, j: i32) -> bool {
        i == 0 || j == 0 || i == self.width - 1 || j == self.width - 1
    }

    pub fn chunk(&self, slot: usize) -> ChunkHandle<G> {
        self.slots.read()[slot].clone()
    }

    pub fn chunk_at(&self, i: i32, j: i32) -> Option<ChunkHandle<G>> {
        if self.is_in_bounds(i, j) {
            Some(self.chunk(self.index(i, j)))
        } else {
            None
        }
    }

    pub fn set_slide_pending(&self, pending: bool) {
        self.slide_pending.store(pending, Ordering::Relaxed);
    }

    pub fn is_slide_pending(&self) -> bool {
        self.slide_pending.load(Ordering::Relaxed)
    }

    /// Re-homes chunks leaving the window to the cells entering on the
    /// opposite side by pointer shuffle, with no allocation. Returns false
    /// (and does nothing) if `(new_world_x, new_world_z)` is unchanged.
    /// Caller (`World::update`) must only invoke this while no worker holds
    /// a job, per spec.md §4.3.
    pub fn slide(&self, new_world_x: i32, new_world_z: i32) -> bool {
        let world_x = self.world_x();
        let world_z = self.world_z();
        let di = new_world_x - world_x;
        let dj = new_world_z - world_z;
        if di == 0 && dj == 0 {
            return false;
        }

        let width = self.width;
        let mut retained: Vec<Option<usize>> = vec![None; (width * width) as usize];
        let mut evicted: Vec<usize> = Vec::new();

        for i in 0..width {
            for j in 0..width {
                let old_slot = self.index(i, j);
                let new_i = i - di;
                let new_j = j - dj;
                if self.is_in_bounds(new_i, new_j) {
                    retained[self.index(new_i, new_j)] = Some(old_slot);
                } else {
                    evicted.push(old_slot);
                }
            }
        }

        let mut new_slot_order: Vec<usize> = Vec::with_capacity((width * width) as usize);
        let mut evicted_iter = evicted.into_iter();
        for target in 0..(width * width) as usize {
            match retained[target] {
                Some(source) => new_slot_order.push(source),
                None => new_slot_order.push(evicted_iter.next().expect("evicted list covers every freed slot")),
            }
        }

        let mut slots = self.slots.write();
        let old_slots: Vec<ChunkHandle<G>> = slots.clone();
        let mut rehomed: Vec<ChunkHandle<G>> = Vec::with_capacity(new_slot_order.len());

        for (target, &source) in new_slot_order.iter().enumerate() {
            let handle = old_slots[source].clone();
            if retained[target].is_none() {
                let (new_i, new_j) = self.coords(target);
                let new_x = (new_world_x + new_i) * self.chunk_width;
                let new_z = (new_world_z + new_j) * self.chunk_width;
                let mut chunk = handle.write();
                chunk.rehome(false, new_x, new_z);
            }
            rehomed.push(handle);
        }

        *slots = rehomed;
        self.world_x.store(new_world_x, Ordering::Release);
        self.world_z.store(new_world_z, Ordering::Release);
        true
    }
}

fn compute_sort_order(width: i32) -> Vec<usize> {
    let center = width as f64 / 2.0;
    let mut order: Vec<usize> = (0..(width * width) as usize).collect();
    order.sort_by_key(|&slot| {
        let i = (slot as i32) / width;
        let j = (slot as i32) % width;
        let di = i as f64 - center;
        let dj = j as f64 - center;
        ((di * di + dj * dj) * 1_000_000.0) as i64
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::tests_support::NullGpu;

    fn identities(grid: &ChunkGrid<NullGpu>) -> std::collections::BTreeSet<u64> {
        grid.slots.read().iter().map(|c| c.read().tag_snapshot().identity).collect()
    }

    #[test]
    fn grid_has_exactly_n_squared_chunks() {
        let grid = ChunkGrid::<NullGpu>::new(5, 16, 128, 0, 0);
        assert_eq!(grid.sort_order().len(), 25);
    }

    #[test]
    fn sort_order_starts_near_center() {
        let grid = ChunkGrid::<NullGpu>::new(5, 16, 128, 0, 0);
        let center_slot = grid.index(2, 2);
        assert_eq!(grid.sort_order()[0], center_slot);
    }

    #[test]
    fn slide_preserves_chunk_identity_multiset() {
        let grid = ChunkGrid::<NullGpu>::new(3, 16, 128, 0, 0);
        let before = identities(&grid);
        grid.slide(1, 0);
        let after = identities(&grid);
        assert_eq!(before, after);
    }

    #[test]
    fn slide_updates_origins_to_match_new_window() {
        let grid = ChunkGrid::<NullGpu>::new(3, 16, 128, 0, 0);
        grid.slide(1, 0);
        for i in 0..3 {
            for j in 0..3 {
                let slot = grid.index(i, j);
                let chunk = grid.chunk(slot);
                let chunk = chunk.read();
                assert_eq!(chunk.origin_x, (grid.world_x() + i) * 16);
                assert_eq!(chunk.origin_z, (grid.world_z() + j) * 16);
            }
        }
    }

    #[test]
    fn slide_no_op_when_origin_unchanged() {
        let grid = ChunkGrid::<NullGpu>::new(3, 16, 128, 0, 0);
        assert!(!grid.slide(0, 0));
    }

    #[test]
    fn non_default_chunk_dimensions_propagate_to_every_chunk() {
        let grid = ChunkGrid::<NullGpu>::new(3, 32, 64, 0, 0);
        assert_eq!(grid.chunk_width(), 32);
        assert_eq!(grid.chunk_height(), 64);
        for slot in 0..9 {
            let chunk = grid.chunk(slot);
            let chunk = chunk.read();
            assert_eq!(chunk.chunk_width(), 32);
            assert_eq!(chunk.chunk_height(), 64);
        }
    }
}
