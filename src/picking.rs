//! Ray casting against spherical targets.
//!
//! This module provides the geometric half of focus detection:
//!
//! - [`Ray`] — A world-space ray with origin and normalized direction
//! - [`Collider`] — A sphere collider attached to scene entities
//! - [`RayHit`] — Information about a ray-collider intersection
//!
//! Hits are accepted only in front of the ray origin. A root closer than
//! [`HIT_EPSILON`] does not count, so a ray that starts on a sphere's surface
//! and points away from it misses.
//!
//! # Example
//!
//! ```
//! use sightline::{Ray, Vec3};
//!
//! let ray = Ray::new(Vec3::new(0.0, 2.0, -4.0), Vec3::X);
//! let distance = ray.intersect_sphere(Vec3::new(1.0, 2.0, -4.0), 0.8);
//! assert!(distance.is_some());
//!
//! let away = Ray::new(Vec3::new(0.0, 2.0, -4.0), Vec3::NEG_X);
//! assert!(away.intersect_sphere(Vec3::new(1.0, 2.0, -4.0), 0.8).is_none());
//! ```

use glam::Vec3;

use crate::transform::Transform;

/// Minimum distance along a ray for an intersection to count as a hit.
pub const HIT_EPSILON: f32 = 1e-4;

/// A ray in 3D space, used for raycasting and picking.
///
/// A ray has an origin point and a normalized direction. It represents
/// an infinite half-line starting at the origin and extending in the direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The normalized direction of the ray.
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with the given origin and direction.
    ///
    /// The direction will be normalized automatically.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get a point along the ray at the given distance from the origin.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Test intersection with a sphere.
    ///
    /// Returns the distance to the nearest intersection farther than
    /// [`HIT_EPSILON`] along the ray, or `None` if there is none. A ray whose
    /// origin is inside the sphere hits the far wall.
    ///
    /// # Arguments
    ///
    /// * `center` - Center of the sphere
    /// * `radius` - Radius of the sphere
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        if a <= f32::EPSILON {
            return None;
        }
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        if t1 > HIT_EPSILON {
            Some(t1)
        } else if t2 > HIT_EPSILON {
            Some(t2)
        } else {
            None
        }
    }

    /// Like [`Ray::intersect_sphere`], but returns the world-space hit point.
    pub fn hit_point_on_sphere(&self, center: Vec3, radius: f32) -> Option<Vec3> {
        self.intersect_sphere(center, radius)
            .map(|t| self.point_at(t))
    }
}

/// A sphere collider for picking and hit detection.
///
/// The collider is centered on the entity's [`Transform`] position and its
/// radius grows with the transform's average scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider {
    /// Radius of the sphere before scaling.
    pub radius: f32,
}

impl Collider {
    pub fn sphere(radius: f32) -> Self {
        Self { radius }
    }

    /// Radius after applying a transform's scale.
    pub fn scaled_radius(&self, scale: Vec3) -> f32 {
        let avg_scale = (scale.x + scale.y + scale.z) / 3.0;
        self.radius * avg_scale
    }

    /// Test if a ray intersects this collider at the given transform.
    ///
    /// Returns the distance along the ray to the hit point, or `None` if no hit.
    pub fn intersect(&self, ray: &Ray, transform: &Transform) -> Option<f32> {
        ray.intersect_sphere(transform.position, self.scaled_radius(transform.scale))
    }
}

/// Information about a ray-collider intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// The entity that was hit.
    pub entity: hecs::Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// Cast a ray against all entities with colliders and return hits.
///
/// Tests the ray against every entity that has both a [`Transform`] and a
/// [`Collider`] component.
///
/// # Returns
///
/// A vector of all hits, sorted by distance (closest first).
pub fn raycast_all(world: &hecs::World, ray: &Ray) -> Vec<RayHit> {
    let mut hits = Vec::new();

    for (entity, (transform, collider)) in world.query::<(&Transform, &Collider)>().iter() {
        if let Some(distance) = collider.intersect(ray, transform) {
            hits.push(RayHit {
                entity,
                distance,
                point: ray.point_at(distance),
            });
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// Cast a ray and return the closest hit, or `None` if nothing was hit.
pub fn raycast(world: &hecs::World, ray: &Ray) -> Option<RayHit> {
    raycast_all(world, ray).into_iter().next()
}

/// Whether the ray hits one specific entity's collider.
///
/// Entities without a transform or collider are never hit.
pub fn ray_hits_entity(world: &hecs::World, ray: &Ray, entity: hecs::Entity) -> Option<RayHit> {
    let mut query = world.query_one::<(&Transform, &Collider)>(entity).ok()?;
    let (transform, collider) = query.get()?;
    let distance = collider.intersect(ray, transform)?;
    Some(RayHit {
        entity,
        distance,
        point: ray.point_at(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Vec3 = Vec3::new(1.0, 2.0, -4.0);
    const RADIUS: f32 = 0.8;

    #[test]
    fn side_ray_toward_center_hits() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, -4.0), Vec3::X);
        let t = ray.intersect_sphere(CENTER, RADIUS).unwrap();
        assert!((t - 0.2).abs() < 1e-5);
    }

    #[test]
    fn side_ray_away_from_center_misses() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, -4.0), Vec3::NEG_X);
        assert!(ray.intersect_sphere(CENTER, RADIUS).is_none());
    }

    #[test]
    fn rays_aimed_at_center_hit_the_near_surface() {
        let origins = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 2.0, -4.0),
            Vec3::new(1.0, 10.0, -4.0),
            Vec3::new(-3.0, -1.0, 6.0),
            Vec3::new(1.5, 2.5, -8.0),
        ];
        for origin in origins {
            let ray = Ray::new(origin, CENTER - origin);
            let point = ray.hit_point_on_sphere(CENTER, RADIUS).unwrap();
            assert!(((point - CENTER).length() - RADIUS).abs() < 1e-4);
            // The near surface lies between the origin and the center.
            assert!((point - origin).length() < (CENTER - origin).length());
        }
    }

    #[test]
    fn rays_aimed_away_from_center_miss() {
        let origins = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 2.0, -4.0),
            Vec3::new(-3.0, -1.0, 6.0),
        ];
        for origin in origins {
            let ray = Ray::new(origin, origin - CENTER);
            assert!(ray.intersect_sphere(CENTER, RADIUS).is_none());
        }
    }

    #[test]
    fn origin_inside_sphere_hits_far_wall() {
        let ray = Ray::new(CENTER, Vec3::Y);
        let t = ray.intersect_sphere(CENTER, RADIUS).unwrap();
        assert!((t - RADIUS).abs() < 1e-5);
    }

    #[test]
    fn origin_on_surface_pointing_out_misses() {
        let ray = Ray::new(CENTER + Vec3::new(0.0, RADIUS, 0.0), Vec3::Y);
        assert!(ray.intersect_sphere(CENTER, RADIUS).is_none());
    }

    #[test]
    fn intersection_is_pure() {
        let ray = Ray::new(Vec3::new(0.3, 1.7, 0.0), Vec3::new(0.1, 0.05, -1.0));
        let first = ray.intersect_sphere(CENTER, RADIUS);
        let second = ray.intersect_sphere(CENTER, RADIUS);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_direction_never_hits() {
        let ray = Ray::new(Vec3::ZERO, Vec3::ZERO);
        assert!(ray.intersect_sphere(Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn raycast_returns_closest_entity() {
        let mut world = hecs::World::new();
        let far = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -10.0)),
            Collider::sphere(1.0),
        ));
        let near = world.spawn((
            Transform::from_position(Vec3::new(0.0, 0.0, -4.0)),
            Collider::sphere(1.0),
        ));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hits = raycast_all(&world, &ray);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].entity, near);
        assert_eq!(hits[1].entity, far);
        assert!((hits[0].distance - 3.0).abs() < 1e-5);

        let closest = raycast(&world, &ray).unwrap();
        assert_eq!(closest.entity, near);
    }

    #[test]
    fn entity_hit_respects_scale() {
        let mut world = hecs::World::new();
        let target = world.spawn((
            Transform::from_position(Vec3::new(1.5, 0.0, -5.0)).uniform_scale(2.0),
            Collider::sphere(1.0),
        ));
        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        assert!(ray_hits_entity(&world, &ray, target).is_some());

        let untracked = world.spawn((Transform::new(),));
        assert!(ray_hits_entity(&world, &ray, untracked).is_none());
    }
}
