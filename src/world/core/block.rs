//! Block catalog (component C1).
//!
//! Static per-kind tables plus O(1) predicate lookups, in the teacher's
//! data-oriented style (`world/core/block.rs`'s flat `BlockId` newtype and
//! its accompanying comment that per-block trait objects were dropped in
//! favor of table lookups). Kind names and groupings follow
//! `original_source/src/block.h`, with GARDENIA substituted for the
//! original's DANDELION per spec.md §4.4's literal wording.

use super::Direction;

/// A block kind, tagged `[0, BlockId::COUNT)`. `EMPTY` is the sentinel.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BlockId(pub u16);

unsafe impl bytemuck::Pod for BlockId {}
unsafe impl bytemuck::Zeroable for BlockId {}

impl BlockId {
    pub const EMPTY: BlockId = BlockId(0);
    pub const GRASS: BlockId = BlockId(1);
    pub const DIRT: BlockId = BlockId(2);
    pub const SAND: BlockId = BlockId(3);
    pub const SNOW: BlockId = BlockId(4);
    pub const STONE: BlockId = BlockId(5);
    pub const LOG: BlockId = BlockId(6);
    pub const LEAVES: BlockId = BlockId(7);
    pub const CLOUD: BlockId = BlockId(8);
    pub const BUSH: BlockId = BlockId(9);
    pub const BLUEBELL: BlockId = BlockId(10);
    pub const GARDENIA: BlockId = BlockId(11);
    pub const LAVENDER: BlockId = BlockId(12);
    pub const ROSE: BlockId = BlockId(13);
    pub const WATER: BlockId = BlockId(14);
    pub const GLASS: BlockId = BlockId(15);

    pub const COUNT: usize = 16;

    pub fn is_empty(self) -> bool {
        self == BlockId::EMPTY
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match *self {
            BlockId::EMPTY => "empty",
            BlockId::GRASS => "grass",
            BlockId::DIRT => "dirt",
            BlockId::SAND => "sand",
            BlockId::SNOW => "snow",
            BlockId::STONE => "stone",
            BlockId::LOG => "log",
            BlockId::LEAVES => "leaves",
            BlockId::CLOUD => "cloud",
            BlockId::BUSH => "bush",
            BlockId::BLUEBELL => "bluebell",
            BlockId::GARDENIA => "gardenia",
            BlockId::LAVENDER => "lavender",
            BlockId::ROSE => "rose",
            BlockId::WATER => "water",
            BlockId::GLASS => "glass",
            _ => "unknown",
        };
        f.write_str(name)
    }
}

/// Per-kind static properties, one row per `BlockId`. Indexed directly by
/// `BlockId.0 as usize`, mirroring `original_source/src/block.c`'s flat
/// `opaque()`/`blocks[][][]` tables rather than a hash map.
#[derive(Debug, Clone, Copy)]
struct BlockInfo {
    opaque: bool,
    sprite: bool,
    solid: bool,
    light_source: bool,
    /// (u, v) atlas tile origin per face direction, indexed by `Direction as usize`.
    face_uv: [(u16, u16); 6],
}

const fn uniform(tile: (u16, u16)) -> [(u16, u16); 6] {
    [tile; 6]
}

static CATALOG: [BlockInfo; BlockId::COUNT] = [
    // EMPTY
    BlockInfo { opaque: false, sprite: false, solid: false, light_source: false, face_uv: uniform((0, 0)) },
    // GRASS: top differs from sides/bottom.
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: [
        (2, 0), (2, 0), (2, 0), (2, 0), (0, 0), (3, 0),
    ] },
    // DIRT
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: uniform((3, 0)) },
    // SAND
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: uniform((4, 0)) },
    // SNOW
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: [
        (5, 0), (5, 0), (5, 0), (5, 0), (5, 0), (3, 0),
    ] },
    // STONE
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: uniform((6, 0)) },
    // LOG
    BlockInfo { opaque: true, sprite: false, solid: true, light_source: false, face_uv: [
        (7, 0), (7, 0), (7, 0), (7, 0), (8, 0), (8, 0),
    ] },
    // LEAVES
    BlockInfo { opaque: false, sprite: false, solid: true, light_source: false, face_uv: uniform((9, 0)) },
    // CLOUD
    BlockInfo { opaque: false, sprite: false, solid: false, light_source: false, face_uv: uniform((10, 0)) },
    // BUSH (sprite)
    BlockInfo { opaque: false, sprite: true, solid: false, light_source: false, face_uv: uniform((11, 0)) },
    // BLUEBELL (sprite)
    BlockInfo { opaque: false, sprite: true, solid: false, light_source: false, face_uv: uniform((12, 0)) },
    // GARDENIA (sprite)
    BlockInfo { opaque: false, sprite: true, solid: false, light_source: false, face_uv: uniform((13, 0)) },
    // LAVENDER (sprite)
    BlockInfo { opaque: false, sprite: true, solid: false, light_source: false, face_uv: uniform((14, 0)) },
    // ROSE (sprite)
    BlockInfo { opaque: false, sprite: true, solid: false, light_source: false, face_uv: uniform((15, 0)) },
    // WATER
    BlockInfo { opaque: false, sprite: false, solid: false, light_source: false, face_uv: uniform((16, 0)) },
    // GLASS
    BlockInfo { opaque: false, sprite: false, solid: true, light_source: false, face_uv: uniform((17, 0)) },
];

fn info(kind: BlockId) -> &'static BlockInfo {
    &CATALOG[kind.0 as usize]
}

pub fn is_opaque(kind: BlockId) -> bool {
    info(kind).opaque
}

pub fn is_sprite(kind: BlockId) -> bool {
    info(kind).sprite
}

pub fn is_solid(kind: BlockId) -> bool {
    info(kind).solid
}

pub fn is_light_source(kind: BlockId) -> bool {
    info(kind).light_source
}

/// Atlas tile origin for a face of `kind` facing `dir`. Sprite blocks use
/// the single table entry for all four cross-quad rotations (spec.md §4.1).
pub fn face_uv(kind: BlockId, dir: Direction) -> (u16, u16) {
    info(kind).face_uv[dir as usize]
}

/// Visibility rule between a face owner `a` and the neighbor `b` sitting
/// behind that face (spec.md §4.1): emit the face unless `b` is solid-opaque
/// blocking it, and never let two non-empty transparent blocks occlude one
/// another (avoids z-fighting between e.g. adjacent water blocks).
pub fn face_visible(a: BlockId, b: BlockId) -> bool {
    if b.is_empty() {
        return true;
    }
    if !is_opaque(a) {
        // non-empty neighbor behind a transparent face: never emit, even if
        // the neighbor itself is transparent.
        return false;
    }
    !is_opaque(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_never_opaque_or_solid() {
        assert!(!is_opaque(BlockId::EMPTY));
        assert!(!is_solid(BlockId::EMPTY));
    }

    #[test]
    fn face_visible_against_empty_neighbor() {
        assert!(face_visible(BlockId::STONE, BlockId::EMPTY));
    }

    #[test]
    fn opaque_face_hidden_behind_opaque_neighbor() {
        assert!(!face_visible(BlockId::STONE, BlockId::DIRT));
    }

    #[test]
    fn opaque_face_visible_against_non_opaque_neighbor() {
        assert!(face_visible(BlockId::STONE, BlockId::WATER));
    }

    #[test]
    fn transparent_owner_never_emits_against_non_empty() {
        assert!(!face_visible(BlockId::WATER, BlockId::WATER));
        assert!(!face_visible(BlockId::WATER, BlockId::STONE));
    }

    #[test]
    fn sprite_blocks_are_never_opaque() {
        for &kind in &[BlockId::BUSH, BlockId::BLUEBELL, BlockId::GARDENIA, BlockId::LAVENDER, BlockId::ROSE] {
            assert!(is_sprite(kind));
            assert!(!is_opaque(kind));
        }
    }
}
