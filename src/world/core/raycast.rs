//! Amanatides-Woo DDA voxel raycast (component C9), grounded in
//! `original_source/src/world.c`'s `world_query`. The older stepped sampler
//! in `original_source/src/physics.c` is non-normative per spec.md §9(b).

use super::{is_solid, BlockId};
use cgmath::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RaycastHit {
    pub current: (i32, i32, i32),
    pub previous: (i32, i32, i32),
    pub block: BlockId,
}

/// Steps a ray from `origin` along `direction` (need not be normalized, but
/// direction components of zero are treated as "never reaches another
/// voxel on that axis") up to `max_distance`, calling `get_block` once per
/// voxel entered. Returns the first voxel containing a solid block, or
/// `BlockId::EMPTY` with the endpoint reached if none is hit within range.
pub fn raycast(
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
    mut get_block: impl FnMut(i32, i32, i32) -> BlockId,
) -> RaycastHit {
    const EPS: f32 = 1e-6;
    const HUGE: f32 = 1e30;

    let mut current = (
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    );
    let mut previous = current;

    let step = (signum(direction.x), signum(direction.y), signum(direction.z));

    let delta = (
        if direction.x.abs() < EPS { HUGE } else { (1.0 / direction.x).abs() },
        if direction.y.abs() < EPS { HUGE } else { (1.0 / direction.y).abs() },
        if direction.z.abs() < EPS { HUGE } else { (1.0 / direction.z).abs() },
    );

    let mut t = (
        initial_t(step.0, current.0, origin.x, delta.0),
        initial_t(step.1, current.1, origin.y, delta.1),
        initial_t(step.2, current.2, origin.z, delta.2),
    );

    let block = get_block(current.0, current.1, current.2);
    if is_solid(block) {
        return RaycastHit { current, previous, block };
    }

    loop {
        let axis = if t.0 <= t.1 && t.0 <= t.2 {
            0
        } else if t.1 <= t.2 {
            1
        } else {
            2
        };

        if match axis {
            0 => t.0,
            1 => t.1,
            _ => t.2,
        } > max_distance
        {
            return RaycastHit { current, previous, block: BlockId::EMPTY };
        }

        previous = current;
        match axis {
            0 => {
                current.0 += step.0;
                t.0 += delta.0;
            }
            1 => {
                current.1 += step.1;
                t.1 += delta.1;
            }
            _ => {
                current.2 += step.2;
                t.2 += delta.2;
            }
        }

        let block = get_block(current.0, current.1, current.2);
        if is_solid(block) {
            return RaycastHit { current, previous, block };
        }
    }
}

fn signum(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn initial_t(step: i32, current: i32, p: f32, delta: f32) -> f32 {
    if step > 0 {
        ((current + 1) as f32 - p) * delta
    } else if step < 0 {
        (p - current as f32) * delta
    } else {
        f32::INFINITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_first_solid_block_along_axis() {
        let hit = raycast(
            Point3::new(0.5, 5.5, 5.5),
            Vector3::new(1.0, 0.0, 0.0),
            10.0,
            |x, y, z| if (x, y, z) == (5, 5, 5) { BlockId::STONE } else { BlockId::EMPTY },
        );
        assert_eq!(hit.current, (5, 5, 5));
        assert_eq!(hit.previous, (4, 5, 5));
        assert_eq!(hit.block, BlockId::STONE);
    }

    #[test]
    fn misses_when_nothing_solid_within_range() {
        let hit = raycast(Point3::new(0.5, 0.5, 0.5), Vector3::new(1.0, 0.0, 0.0), 3.0, |_, _, _| BlockId::EMPTY);
        assert_eq!(hit.block, BlockId::EMPTY);
    }

    #[test]
    fn sandwich_property_holds() {
        let hit = raycast(
            Point3::new(0.5, 0.5, 0.5),
            Vector3::new(0.0, 0.0, 1.0),
            20.0,
            |x, y, z| if (x, y, z) == (0, 0, 4) { BlockId::STONE } else { BlockId::EMPTY },
        );
        assert_eq!(hit.block, BlockId::STONE);
        assert_eq!(hit.current, (0, 0, 4));
        assert_eq!(hit.previous, (0, 0, 3));
    }

    #[test]
    fn passes_through_non_solid_blocks_to_the_next_solid_one() {
        // WATER is non-solid (§4.1 catalog); the ray must not stop there.
        let hit = raycast(
            Point3::new(0.5, 5.5, 5.5),
            Vector3::new(1.0, 0.0, 0.0),
            10.0,
            |x, y, z| match (x, y, z) {
                (3, 5, 5) => BlockId::WATER,
                (7, 5, 5) => BlockId::STONE,
                _ => BlockId::EMPTY,
            },
        );
        assert_eq!(hit.current, (7, 5, 5));
        assert_eq!(hit.block, BlockId::STONE);
    }
}
