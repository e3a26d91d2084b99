// Copyright @yucwang 2026

use crate::core::bsdf::BSDF;
use crate::core::bvh::BVH;
use crate::core::emitter::{DirectionSample, Emitter};
use crate::core::interaction::SurfaceIntersection;
use crate::core::sensor::Sensor;
use crate::core::shape::Shape;
use crate::emitters::area::AreaEmitter;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::sync::Arc;

pub struct SceneObject {
    pub shape: Arc<dyn Shape>,
    pub material: Arc<dyn BSDF>,
    pub emission: RGBSpectrum,
}

impl SceneObject {
    pub fn new(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>) -> Self {
        Self { shape, material, emission: RGBSpectrum::default() }
    }

    pub fn with_emission(shape: Arc<dyn Shape>, material: Arc<dyn BSDF>, emission: RGBSpectrum) -> Self {
        Self { shape, material, emission }
    }
}

pub struct Scene {
    objects: Vec<SceneObject>,
    sensors: Vec<Box<dyn Sensor>>,
    emitters: Vec<Box<dyn Emitter>>,
    scene_bounds: AABB,
    bvh: Option<BVH>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            sensors: Vec::new(),
            emitters: Vec::new(),
            scene_bounds: AABB::default(),
            bvh: None,
        }
    }

    pub fn add_object(&mut self, object: SceneObject) {
        let emitter = if !object.emission.is_black() {
            Some(AreaEmitter::from_shape(object.shape.clone(), object.emission))
        } else {
            None
        };
        self.objects.push(object);
        if let Some(emitter) = emitter {
            self.emitters.push(Box::new(emitter));
        }
        self.bvh = None;
    }

    pub fn objects(&self) -> &Vec<SceneObject> {
        &self.objects
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn add_emitter(&mut self, emitter: Box<dyn Emitter>) {
        self.emitters.push(emitter);
    }

    pub fn emitters(&self) -> &Vec<Box<dyn Emitter>> {
        &self.emitters
    }

    pub fn scene_bounds(&self) -> &AABB {
        &self.scene_bounds
    }

    pub fn camera(&self, camera_id: usize) -> Option<&dyn Sensor> {
        self.sensors.get(camera_id).map(|s| s.as_ref())
    }

    pub fn take_sensor(&mut self, camera_id: usize) -> Option<Box<dyn Sensor>> {
        if camera_id < self.sensors.len() {
            Some(self.sensors.remove(camera_id))
        } else {
            None
        }
    }

    pub fn insert_sensor(&mut self, camera_id: usize, sensor: Box<dyn Sensor>) {
        if camera_id <= self.sensors.len() {
            self.sensors.insert(camera_id, sensor);
        } else {
            self.sensors.push(sensor);
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn build_bvh(&mut self) {
        let mut prim_bounds = Vec::with_capacity(self.objects.len());
        let mut prim_centroids = Vec::with_capacity(self.objects.len());
        let mut scene_bounds = AABB::default();
        for obj in &self.objects {
            let bounds = obj.shape.bounding_box();
            prim_centroids.push(bounds.center());
            prim_bounds.push(bounds);
            scene_bounds.expand_by_aabb(&bounds);
        }

        self.bvh = Some(BVH::new(prim_bounds, prim_centroids));
        self.scene_bounds = scene_bounds;

        for emitter in &mut self.emitters {
            emitter.set_scene_bounds(&scene_bounds);
        }
    }

    pub fn ray_intersection(&self, ray: &Ray3f) -> Option<SurfaceIntersection> {
        let bvh = self.bvh.as_ref()?;
        if let Some((idx, hit)) = bvh.ray_intersection(ray, |prim_idx, ray| {
            self.objects[prim_idx].shape.ray_intersection(ray).map(|h| {
                let t = h.t();
                (h, t)
            })
        }) {
            let object = &self.objects[idx];
            // emitters are one-sided: the back face stays dark, matching
            // the cosine gate of area-emitter sampling
            let le = if hit.geo_normal().dot(&-ray.dir()) > 0.0 {
                object.emission
            } else {
                RGBSpectrum::default()
            };
            let result = hit
                .with_le(le)
                .with_material(object.material.clone())
                .with_object_index(Some(idx));
            Some(result)
        } else {
            None
        }
    }

    pub fn ray_intersection_t(&self, ray: &Ray3f) -> bool {
        match self.bvh.as_ref() {
            Some(bvh) => bvh.ray_intersection_t(ray, |prim_idx, ray| {
                self.objects[prim_idx].shape.ray_intersection_t(ray)
            }),
            None => false,
        }
    }

    /// Sample a direction toward one of the scene's emitters from the given
    /// reference intersection. Picks an emitter uniformly, folds the
    /// selection probability into the returned pdf and, when requested,
    /// discards occluded samples. `None` is a zero-contribution outcome.
    pub fn sample_emitter_direction(&self,
                                    reference: &SurfaceIntersection,
                                    u1: Float,
                                    u2: &Vector2f,
                                    check_visibility: bool) -> Option<DirectionSample> {
        if self.emitters.is_empty() {
            return None;
        }

        let emitter_count = self.emitters.len();
        let mut emitter_index = (u1 * emitter_count as Float) as usize;
        if emitter_index >= emitter_count {
            emitter_index = emitter_count - 1;
        }
        let select_pdf = 1.0 / (emitter_count as Float);

        let mut ds = self.emitters[emitter_index].sample_direction(reference, u2)?;
        if ds.pdf <= 0.0 {
            return None;
        }
        ds.pdf *= select_pdf;

        if check_visibility && !self.visible_along(reference, &ds) {
            return None;
        }

        Some(ds)
    }

    /// Solid-angle density that emitter sampling at `ref_p` would have
    /// produced the direction toward `hit`, used as the MIS counterpart of
    /// BSDF sampling. Zero when the hit is not on an emitter, when the
    /// direction is degenerate, or when the caller's previous scattering
    /// event was a delta event (`non_delta == false`).
    pub fn pdf_emitter_direction(&self,
                                 ref_p: &Vector3f,
                                 hit: &SurfaceIntersection,
                                 non_delta: bool) -> Float {
        if !non_delta || self.emitters.is_empty() {
            return 0.0;
        }
        let obj_idx = match hit.object_index() {
            Some(idx) => idx,
            None => return 0.0,
        };
        let object = match self.objects.get(obj_idx) {
            Some(object) => object,
            None => return 0.0,
        };
        if object.emission.is_black() {
            return 0.0;
        }
        let area = object.shape.surface_area();
        if area <= 0.0 {
            return 0.0;
        }

        let to_light = hit.p() - *ref_p;
        let dist2 = to_light.dot(&to_light);
        if dist2 <= 0.0 {
            return 0.0;
        }
        let dir = to_light / dist2.sqrt();
        let cos_light = hit.geo_normal().dot(&(-dir)).max(0.0);
        if cos_light <= 0.0 {
            return 0.0;
        }

        let select_pdf = 1.0 / (self.emitters.len() as Float);
        let area_pdf = 1.0 / area;
        area_pdf * select_pdf * dist2 / cos_light
    }

    /// Radiance from directional emitters for a ray that escaped the scene.
    pub fn eval_environment(&self, direction: &Vector3f) -> RGBSpectrum {
        let mut radiance = RGBSpectrum::default();
        for emitter in &self.emitters {
            radiance += emitter.eval_direction(direction);
        }
        radiance
    }

    /// Density that emitter sampling would have produced `direction` via a
    /// directional (environment) emitter; the MIS counterpart for escaped
    /// rays.
    pub fn pdf_environment_direction(&self, direction: &Vector3f) -> Float {
        if self.emitters.is_empty() {
            return 0.0;
        }
        let select_pdf = 1.0 / (self.emitters.len() as Float);
        let mut pdf = 0.0;
        for emitter in &self.emitters {
            pdf += select_pdf * emitter.pdf_direction(direction);
        }
        pdf
    }

    fn visible_along(&self, reference: &SurfaceIntersection, ds: &DirectionSample) -> bool {
        let mut offset_n = reference.geo_normal();
        if offset_n.dot(&ds.direction) < 0.0 {
            offset_n = -offset_n;
        }
        let origin = reference.p() + offset_n * EPSILON;
        let max_t = if ds.infinite {
            None
        } else {
            Some((ds.distance - 2.0 * EPSILON).max(0.0))
        };
        let shadow_ray = Ray3f::new(origin, ds.direction, Some(0.0), max_t);
        !self.ray_intersection_t(&shadow_ray)
    }
}
