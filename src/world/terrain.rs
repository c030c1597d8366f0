//! Procedural terrain generator (component C4), implementing spec.md
//! §4.4's column algorithm exactly. Grounded in the `noise` crate (already
//! a dependency of the teacher, `noahsabaj-hearth-engine`, and used the
//! same way by `MetroManDevTeam-Bloksel`'s `terrain.rs`), but the fbm/
//! turbulence composition itself is hand-rolled per the glossary's literal
//! definition (lacunarity=2, gain=0.5, given frequency+octave count) rather
//! than delegated to `noise::Fbm`, whose internal normalization doesn't
//! match spec.md's formula.
//!
//! `original_source/src/noise.c`'s `NOISE_CUBE`/`NOISE_FLAT` variants are
//! preserved as the non-fbm branches of [`crate::constants::NoiseVariant`].

use crate::constants::NoiseVariant;
use crate::world::core::BlockId;
use noise::{NoiseFn, Perlin};

pub struct TerrainGenerator {
    variant: NoiseVariant,
    perlin: Perlin,
}

impl TerrainGenerator {
    pub fn new(variant: NoiseVariant, seed: u32) -> Self {
        TerrainGenerator { variant, perlin: Perlin::new(seed) }
    }

    fn fbm(&self, x: f64, y: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        fractal_sum(&self.perlin, x, y, z, octaves, persistence, lacunarity, false)
    }

    fn turbulence(&self, x: f64, y: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
        fractal_sum(&self.perlin, x, y, z, octaves, persistence, lacunarity, true)
    }

    /// Fills one chunk's block array via `write_block(local_x, y, local_z, kind)`.
    /// `world_x`/`world_z` are the chunk's block-space origin (spec.md §3);
    /// `chunk_width`/`chunk_height` are that chunk's configured dimensions
    /// (spec.md §6 — recognized at init time, not fixed in this generator).
    pub fn generate_chunk(
        &self,
        world_x: i32,
        world_z: i32,
        chunk_width: i32,
        chunk_height: i32,
        mut write_block: impl FnMut(i32, i32, i32, BlockId),
    ) {
        match self.variant {
            NoiseVariant::Cube => self.generate_cube(world_x, world_z, &mut write_block),
            NoiseVariant::Flat => self.generate_flat(chunk_width, &mut write_block),
            NoiseVariant::Fbm => self.generate_fbm(world_x, world_z, chunk_width, chunk_height, &mut write_block),
        }
    }

    fn generate_cube(&self, world_x: i32, world_z: i32, write_block: &mut impl FnMut(i32, i32, i32, BlockId)) {
        if world_x == 0 && world_z == 0 {
            write_block(0, 0, 0, BlockId::STONE);
        }
    }

    fn generate_flat(&self, cw: i32, write_block: &mut impl FnMut(i32, i32, i32, BlockId)) {
        for x in 0..cw {
            for z in 0..cw {
                write_block(x, 0, z, BlockId::STONE);
                write_block(x, 1, z, BlockId::DIRT);
                write_block(x, 2, z, BlockId::GRASS);
            }
        }
    }

    fn generate_fbm(
        &self,
        world_x: i32,
        world_z: i32,
        cw: i32,
        ch: i32,
        write_block: &mut impl FnMut(i32, i32, i32, BlockId),
    ) {
        for local_x in 0..cw {
            for local_z in 0..cw {
                let s = (world_x + local_x) as f64;
                let t = (world_z + local_z) as f64;

                // (1) base height
                let raw = self.fbm(s * 0.005, 0.0, t * 0.005, 2, 0.5, 6.0) * 50.0;
                let mut h0 = raw.max(0.0).powf(1.3) + 30.0;
                h0 = h0.clamp(0.0, (ch - 1) as f64);

                // (2) low-land variation
                let mut low = false;
                if h0 < 40.0 {
                    h0 += self.fbm(-s * 0.01, 0.0, t * 0.01, 2, 0.5, 6.0) * 12.0;
                    low = true;
                }

                // (3) biome offset
                let beta0 = self.fbm(s * 0.2, 0.0, t * 0.2, 2, 0.5, 6.0);
                let beta = (beta0 * 8.0).clamp(-5.0, 5.0);

                // (4) surface selection. `original_source/src/rand.c:51-56`'s
                // `for (; y < height; y++) ...; function(top)` leaves `y`
                // equal to `ceil(height)` for any non-integer height (the
                // loop only stops once `y >= height`), so `top` lands one
                // block higher than a plain truncation would put it.
                let h0_i = h0.ceil() as i32;
                let h_beach = h0 + beta0;
                let h = h0 + beta;

                let (top, bottom, grass) = if h_beach < 31.0 {
                    (BlockId::SAND, BlockId::SAND, false)
                } else if h < 61.0 {
                    (BlockId::GRASS, BlockId::DIRT, true)
                } else if h < 132.0 {
                    (BlockId::STONE, BlockId::STONE, false)
                } else {
                    (BlockId::SNOW, BlockId::STONE, false)
                };

                // (5) fill column
                for y in 0..h0_i.max(0) {
                    write_block(local_x, y, local_z, bottom);
                }
                if h0_i >= 0 && h0_i < ch {
                    write_block(local_x, h0_i, local_z, top);
                }
                for y in (h0_i + 1)..30 {
                    if y >= 0 && y < ch {
                        write_block(local_x, y, local_z, BlockId::WATER);
                    }
                }

                // (6) decoration
                let near_edge = local_x < 3 || local_z < 3 || local_x >= cw - 3 || local_z >= cw - 3;
                if low && grass && !near_edge {
                    let p = self.fbm(s * 0.2, 0.0, t * 0.2, 2, 0.5, 3.0) * 0.5 + 0.5;
                    if p > 0.8 {
                        place_tree(local_x, h0_i, local_z, p, cw, ch, write_block);
                    } else if p > 0.55 {
                        if h0_i + 1 < ch {
                            write_block(local_x, h0_i + 1, local_z, BlockId::BUSH);
                        }
                    } else if p > 0.52 {
                        const FLOWERS: [BlockId; 4] = [BlockId::BLUEBELL, BlockId::GARDENIA, BlockId::LAVENDER, BlockId::ROSE];
                        let species = FLOWERS[((p * 1000.0) as i64).rem_euclid(4) as usize];
                        if h0_i + 1 < ch {
                            write_block(local_x, h0_i + 1, local_z, species);
                        }
                    }
                }

                // (7) clouds
                if h0_i <= 130 {
                    let c = self.turbulence(s * 0.015, 0.0, t * 0.015, 2, 0.5, 6.0);
                    let radius = if c > 0.9 {
                        2
                    } else if c > 0.7 {
                        1
                    } else if c > 0.6 {
                        0
                    } else {
                        -1
                    };
                    if radius >= 0 {
                        for k in -radius..=radius {
                            let y = 155 + k;
                            if y >= 0 && y < ch {
                                write_block(local_x, y, local_z, BlockId::CLOUD);
                            }
                        }
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn place_tree(
    local_x: i32,
    surface_y: i32,
    local_z: i32,
    p: f64,
    chunk_width: i32,
    chunk_height: i32,
    write_block: &mut impl FnMut(i32, i32, i32, BlockId),
) {
    let trunk_height = 3 + (p * 2.0).floor() as i32;
    for dy in 1..=trunk_height {
        let y = surface_y + dy;
        if y < chunk_height {
            write_block(local_x, y, local_z, BlockId::LOG);
        }
    }
    // `original_source/src/rand.c`'s canopy loop walks `dy` in `0..2` at
    // `y + log + dy`, i.e. the first layer (`dy == 0`) sits at the same
    // height as the trunk's topmost log cell and the second (`dy == 1`) one
    // block above it. Only `dx == 0 && dz == 0 && dy == 0` is excluded there
    // (the true log cell); the second layer's center is a leaf.
    let canopy_base = surface_y + trunk_height;
    for ly in 0..2 {
        let y = canopy_base + ly;
        if y < 0 || y >= chunk_height {
            continue;
        }
        for dx in -1..=1 {
            for dz in -1..=1 {
                if ly == 0 && dx == 0 && dz == 0 {
                    // log column cell, never leaves
                    continue;
                }
                let x = local_x + dx;
                let z = local_z + dz;
                if x < 0 || z < 0 || x >= chunk_width || z >= chunk_width {
                    continue;
                }
                write_block(x, y, z, BlockId::LEAVES);
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn fractal_sum(perlin: &Perlin, x: f64, y: f64, z: f64, octaves: u32, persistence: f64, lacunarity: f64, turbulence: bool) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;
    for _ in 0..octaves {
        let sample = perlin.get([x * frequency, y * frequency, z * frequency]);
        total += if turbulence { sample.abs() * amplitude } else { sample * amplitude };
        max_amplitude += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }
    if max_amplitude > 0.0 {
        total / max_amplitude
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic_for_same_chunk_coords() {
        let gen_a = TerrainGenerator::new(NoiseVariant::Fbm, 42);
        let gen_b = TerrainGenerator::new(NoiseVariant::Fbm, 42);

        let mut blocks_a = Vec::new();
        gen_a.generate_chunk(320, 320, 16, 128, |x, y, z, k| blocks_a.push((x, y, z, k)));

        let mut blocks_b = Vec::new();
        gen_b.generate_chunk(320, 320, 16, 128, |x, y, z, k| blocks_b.push((x, y, z, k)));

        assert_eq!(blocks_a, blocks_b);
    }

    #[test]
    fn different_seeds_can_diverge() {
        let gen_a = TerrainGenerator::new(NoiseVariant::Fbm, 1);
        let gen_b = TerrainGenerator::new(NoiseVariant::Fbm, 2);

        let mut blocks_a = Vec::new();
        gen_a.generate_chunk(0, 0, 16, 128, |x, y, z, k| blocks_a.push((x, y, z, k)));
        let mut blocks_b = Vec::new();
        gen_b.generate_chunk(0, 0, 16, 128, |x, y, z, k| blocks_b.push((x, y, z, k)));

        assert_ne!(blocks_a, blocks_b);
    }

    #[test]
    fn cube_variant_places_single_block_at_origin_chunk_only() {
        let gen = TerrainGenerator::new(NoiseVariant::Cube, 0);
        let mut blocks = Vec::new();
        gen.generate_chunk(0, 0, 16, 128, |x, y, z, k| blocks.push((x, y, z, k)));
        assert_eq!(blocks, vec![(0, 0, 0, BlockId::STONE)]);

        let mut blocks_elsewhere = Vec::new();
        gen.generate_chunk(16, 0, 16, 128, |x, y, z, k| blocks_elsewhere.push((x, y, z, k)));
        assert!(blocks_elsewhere.is_empty());
    }

    /// spec.md §8 scenario 6: a qualifying column gets a `3 + floor(p*2)`
    /// tall LOG column topped by a 3x3x2 LEAVES shell, with no leaf cell
    /// overlapping a log cell. Drives `place_tree` directly across the
    /// full range of `p` that reaches it (`p > 0.8`, spec.md §4.4 step 6)
    /// rather than hunting for a qualifying fbm column at some seed, so the
    /// invariant is checked exhaustively instead of by chance.
    #[test]
    fn tree_placement_matches_height_formula_and_never_overlaps_leaves_with_log() {
        let mut p = 0.80001;
        while p < 1.0 {
            let mut blocks = std::collections::HashMap::new();
            place_tree(10, 50, 10, p, 32, 256, &mut |x, y, z, k| {
                blocks.insert((x, y, z), k);
            });

            let expected_trunk_height = 3 + (p * 2.0).floor() as i32;
            let logs: Vec<_> = blocks.iter().filter(|(_, &k)| k == BlockId::LOG).map(|(&pos, _)| pos).collect();
            assert_eq!(logs.len() as i32, expected_trunk_height, "p={p}");
            for dy in 1..=expected_trunk_height {
                assert_eq!(blocks.get(&(10, 50 + dy, 10)), Some(&BlockId::LOG), "p={p} dy={dy}");
            }

            let leaves: Vec<_> = blocks.iter().filter(|(_, &k)| k == BlockId::LEAVES).map(|(&pos, _)| pos).collect();
            // 3x3 shell minus the true log cell (layer 0) plus a full 3x3
            // shell (layer 1) = 8 + 9 = 17 leaves.
            assert_eq!(leaves.len(), 17, "p={p}");
            for leaf in &leaves {
                assert!(!logs.contains(leaf), "leaf at {leaf:?} overlaps a log cell, p={p}");
                assert!(leaf.0 >= 9 && leaf.0 <= 11 && leaf.2 >= 9 && leaf.2 <= 11, "leaf {leaf:?} outside 3x3 shell, p={p}");
            }
            let top_log_y = 50 + expected_trunk_height;
            assert!(blocks.get(&(10, top_log_y + 1, 10)) == Some(&BlockId::LEAVES), "no leaf directly above the trunk top, p={p}");

            p += 0.025;
        }
    }

    #[test]
    fn flat_variant_produces_three_layers_per_column() {
        let gen = TerrainGenerator::new(NoiseVariant::Flat, 0);
        let mut blocks = Vec::new();
        gen.generate_chunk(0, 0, 16, 128, |x, y, z, k| blocks.push((x, y, z, k)));
        assert_eq!(blocks.len(), 16 * 16 * 3);
    }
}
