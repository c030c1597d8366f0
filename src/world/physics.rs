//! Minimal player/terrain collision primitive.
//!
//! spec.md §1 names "physics beyond player/terrain collision and
//! raycasting" as a non-goal, which by construction keeps *basic*
//! player/terrain collision in scope. Grounded in
//! `original_source/src/physics.c`'s `physics_collide` — it resolves a
//! desired move one axis at a time (Y, then X, then Z) by raycasting along
//! that axis and clamping to the last position that wasn't inside a solid
//! block — translated into the teacher's `physics::aabb` idiom of pure
//! functions over a `Point3`/`Vector3` pair rather than a resolver struct.
//! No gravity, velocity integration, or broader simulation lives here.

use crate::world::core::Aabb;
use cgmath::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

fn axis_value(p: Point3<f32>, axis: Axis) -> f32 {
    match axis {
        Axis::X => p.x,
        Axis::Y => p.y,
        Axis::Z => p.z,
    }
}

fn with_axis(mut p: Point3<f32>, axis: Axis, value: f32) -> Point3<f32> {
    match axis {
        Axis::X => p.x = value,
        Axis::Y => p.y = value,
        Axis::Z => p.z = value,
    }
    p
}

/// True if the axis-aligned box of `half_extents` centered at `center`
/// overlaps any solid voxel, per `is_solid(x, y, z)`.
fn aabb_blocked(center: Point3<f32>, half_extents: Vector3<f32>, is_solid: &mut impl FnMut(i32, i32, i32) -> bool) -> bool {
    let aabb = Aabb::from_origin_size(center - half_extents, half_extents * 2.0);
    let min = (aabb.min.x.floor() as i32, aabb.min.y.floor() as i32, aabb.min.z.floor() as i32);
    let max = (aabb.max.x.ceil() as i32 - 1, aabb.max.y.ceil() as i32 - 1, aabb.max.z.ceil() as i32 - 1);
    for x in min.0..=max.0 {
        for y in min.1..=max.1 {
            for z in min.2..=max.2 {
                if is_solid(x, y, z) {
                    return true;
                }
            }
        }
    }
    false
}

/// Sweeps `pos` along one axis towards `pos[axis] + delta` in whole-voxel
/// increments, stopping one increment short of the first solid overlap.
/// Returns the final position reached along that axis.
fn sweep_axis(
    pos: Point3<f32>,
    delta: f32,
    axis: Axis,
    half_extents: Vector3<f32>,
    is_solid: &mut impl FnMut(i32, i32, i32) -> bool,
) -> f32 {
    if delta == 0.0 {
        return axis_value(pos, axis);
    }
    let steps = delta.abs().ceil().max(1.0) as i32;
    let step = delta / steps as f32;
    let mut last_good = axis_value(pos, axis);
    for n in 1..=steps {
        let candidate = axis_value(pos, axis) + step * n as f32;
        let probe = with_axis(pos, axis, candidate);
        if aabb_blocked(probe, half_extents, is_solid) {
            return last_good;
        }
        last_good = candidate;
    }
    last_good
}

/// Resolves a desired move from `from` to `to` against solid voxels,
/// matching `physics_collide`'s per-axis order (Y first, then X, then Z)
/// so gravity resolves independently of horizontal movement. `is_solid`
/// should answer from the same world snapshot used for the whole call.
pub fn resolve_move(
    from: Point3<f32>,
    to: Point3<f32>,
    half_extents: Vector3<f32>,
    mut is_solid: impl FnMut(i32, i32, i32) -> bool,
) -> Point3<f32> {
    let mut pos = from;
    pos.y = sweep_axis(pos, to.y - pos.y, Axis::Y, half_extents, &mut is_solid);
    pos.x = sweep_axis(pos, to.x - pos.x, Axis::X, half_extents, &mut is_solid);
    pos.z = sweep_axis(pos, to.z - pos.z, Axis::Z, half_extents, &mut is_solid);
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unobstructed_move_reaches_target() {
        let from = Point3::new(0.0, 10.0, 0.0);
        let to = Point3::new(5.0, 10.0, 5.0);
        let half = Vector3::new(0.3, 0.9, 0.3);
        let result = resolve_move(from, to, half, |_, _, _| false);
        assert!((result.x - to.x).abs() < 1e-3);
        assert!((result.z - to.z).abs() < 1e-3);
    }

    #[test]
    fn falling_onto_solid_floor_stops_above_it() {
        let from = Point3::new(0.0, 5.0, 0.0);
        let to = Point3::new(0.0, 0.0, 0.0);
        let half = Vector3::new(0.3, 0.9, 0.3);
        let result = resolve_move(from, to, half, |_, y, _| y <= 0);
        assert!(result.y > to.y, "should have stopped above the floor, got {}", result.y);
    }

    #[test]
    fn horizontal_move_blocked_by_wall_stops_before_it() {
        let from = Point3::new(0.0, 10.0, 0.0);
        let to = Point3::new(10.0, 10.0, 0.0);
        let half = Vector3::new(0.3, 0.9, 0.3);
        let result = resolve_move(from, to, half, |x, _, _| x >= 4);
        assert!(result.x < 4.0);
        assert!(result.x > 0.0);
    }
}
