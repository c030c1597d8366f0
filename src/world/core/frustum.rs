//! Loose cone frustum test and AABB type (half of component C10), grounded
//! in `original_source/src/camera.c`'s field-of-view test. Full camera
//! projection math is an external collaborator (spec.md §1); this module
//! only consumes a position/forward/fov triple.

use cgmath::{InnerSpace, Point3, Vector3};

#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_origin_size(origin: Point3<f32>, size: Vector3<f32>) -> Self {
        Aabb { min: origin, max: origin + size }
    }

    pub fn corners(&self) -> [Point3<f32>; 8] {
        [
            Point3::new(self.min.x, self.min.y, self.min.z),
            Point3::new(self.max.x, self.min.y, self.min.z),
            Point3::new(self.min.x, self.max.y, self.min.z),
            Point3::new(self.max.x, self.max.y, self.min.z),
            Point3::new(self.min.x, self.min.y, self.max.z),
            Point3::new(self.max.x, self.min.y, self.max.z),
            Point3::new(self.min.x, self.max.y, self.max.z),
            Point3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
    pub fov_radians: f32,
}

/// Intentionally loose: true if *any* of the AABB's 8 corners is either
/// close enough to the camera to ignore angle, or within the (widened)
/// view cone. Cheaper than six-plane testing and conservative in the
/// direction that matters — it never hides a chunk that's actually visible.
pub fn aabb_in_frustum(aabb: &Aabb, frustum: &Frustum, size: Vector3<f32>) -> bool {
    let max_extent = size.x.max(size.y).max(size.z);
    let forward = frustum.forward.normalize();
    let half_fov = frustum.fov_radians / 1.25;

    for corner in aabb.corners() {
        let to_corner = corner - frustum.position;
        let distance = to_corner.magnitude();
        if distance < max_extent {
            return true;
        }
        if distance < 1e-6 {
            continue;
        }
        let cos_angle = forward.dot(to_corner) / distance;
        let angle = cos_angle.clamp(-1.0, 1.0).acos();
        if angle < half_fov {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_dead_ahead_is_visible() {
        let aabb = Aabb::from_origin_size(Point3::new(10.0, 0.0, 0.0), Vector3::new(16.0, 128.0, 16.0));
        let frustum = Frustum { position: Point3::new(0.0, 0.0, 0.0), forward: Vector3::new(1.0, 0.0, 0.0), fov_radians: std::f32::consts::FRAC_PI_2 };
        assert!(aabb_in_frustum(&aabb, &frustum, Vector3::new(16.0, 128.0, 16.0)));
    }

    #[test]
    fn chunk_directly_behind_camera_is_culled() {
        let aabb = Aabb::from_origin_size(Point3::new(-500.0, 0.0, 0.0), Vector3::new(16.0, 128.0, 16.0));
        let frustum = Frustum { position: Point3::new(0.0, 0.0, 0.0), forward: Vector3::new(1.0, 0.0, 0.0), fov_radians: std::f32::consts::FRAC_PI_2 };
        assert!(!aabb_in_frustum(&aabb, &frustum, Vector3::new(16.0, 128.0, 16.0)));
    }

    #[test]
    fn overlapping_aabbs_intersect() {
        let a = Aabb { min: Point3::new(0.0, 0.0, 0.0), max: Point3::new(1.0, 1.0, 1.0) };
        let b = Aabb { min: Point3::new(0.5, 0.5, 0.5), max: Point3::new(1.5, 1.5, 1.5) };
        assert!(a.intersects(&b));
    }
}
