// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::interaction::{SurfaceIntersection, SurfaceSampleRecord};
use crate::core::shape::Shape;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::RGBSpectrum;
use crate::math::transform::Transform;

/// The canonical rectangle spans [-1, 1]^2 in the local xy plane with its
/// normal along +z; `to_world` places it in the scene. `flip_normals`
/// turns it into a -z facing surface without touching the transform.
pub struct Rectangle {
    to_world: Transform,
    normal: Vector3f,
    area: Float,
    inv_area: Float,
}

impl Rectangle {
    pub fn new(to_world: Transform, flip_normals: bool) -> Self {
        let dp_du = to_world.apply_vector(Vector3f::new(2.0, 0.0, 0.0));
        let dp_dv = to_world.apply_vector(Vector3f::new(0.0, 2.0, 0.0));
        let cross = dp_du.cross(&dp_dv);
        let area = cross.norm();
        let inv_area = if area > 0.0 { 1.0 / area } else { 0.0 };

        let mut normal = if area > 0.0 {
            cross / area
        } else {
            to_world.apply_normal(Vector3f::new(0.0, 0.0, 1.0)).normalize()
        };
        if flip_normals {
            normal = -normal;
        }

        Self { to_world, normal, area, inv_area }
    }

    fn intersect_local(&self, ray: &Ray3f) -> Option<(Vector3f, Vector2f)> {
        let ray_local = self.to_world.inv_apply_ray(ray);
        let dir = ray_local.dir();
        if dir.z.abs() < EPSILON {
            return None;
        }

        let t_local = -ray_local.origin().z / dir.z;
        if t_local <= 0.0 {
            return None;
        }
        let p_local = ray_local.at(t_local);
        if p_local.x.abs() > 1.0 || p_local.y.abs() > 1.0 {
            return None;
        }

        let uv = Vector2f::new(0.5 * (p_local.x + 1.0), 0.5 * (p_local.y + 1.0));
        Some((p_local, uv))
    }
}

impl ComputationNode for Rectangle {
    fn to_string(&self) -> String {
        String::from("Rectangle")
    }
}

impl Shape for Rectangle {
    fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        let corners = [
            Vector3f::new(-1.0, -1.0, 0.0),
            Vector3f::new(-1.0,  1.0, 0.0),
            Vector3f::new( 1.0, -1.0, 0.0),
            Vector3f::new( 1.0,  1.0, 0.0),
        ];
        for corner in &corners {
            let p = self.to_world.apply_point(*corner);
            bbox.expand_by_point(&p);
        }
        bbox
    }

    fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let (p_local, uv) = self.intersect_local(ray)?;
        let p_world = self.to_world.apply_point(p_local);
        let t_world = (p_world - ray.origin()).dot(&ray.dir());
        if !ray.test_segment(t_world) {
            return None;
        }

        Some(SurfaceIntersection::new(
            p_world,
            self.normal,
            self.normal,
            uv,
            t_world,
            RGBSpectrum::default(),
            None,
        ))
    }

    fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        let (p_local, _) = match self.intersect_local(ray) {
            Some(hit) => hit,
            None => return false,
        };
        let p_world = self.to_world.apply_point(p_local);
        let t_world = (p_world - ray.origin()).dot(&ray.dir());
        ray.test_segment(t_world)
    }

    fn sample(&self, u: &Vector2f) -> SurfaceSampleRecord {
        let p_local = Vector3f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0, 0.0);
        let p_world = self.to_world.apply_point(p_local);
        let intersection = SurfaceIntersection::new(
            p_world,
            self.normal,
            self.normal,
            *u,
            0.0,
            RGBSpectrum::default(),
            None,
        );
        SurfaceSampleRecord::new(intersection, self.inv_area)
    }

    fn surface_area(&self) -> Float {
        self.area
    }
}
