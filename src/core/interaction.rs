// Copyright @yucwang 2023

use crate::core::bsdf::BSDF;
use crate::math::constants::{ EPSILON, Float, Vector2f, Vector3f };
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};
use std::sync::Arc;

/// Scene intersection result. Copied by value into bounce records because
/// the solve phase needs vertex-local data after the forward ray has moved
/// on.
#[derive(Clone)]
pub struct SurfaceIntersection {
    p: Vector3f,
    geo_normal: Vector3f,
    sh_normal: Vector3f,
    uv: Vector2f,
    t: Float,
    le: RGBSpectrum,
    material: Option<Arc<dyn BSDF>>,
    object_index: Option<usize>,
    valid: bool,
}

pub struct SurfaceSampleRecord {
    intersection: SurfaceIntersection,
    pdf: Float,
}

impl SurfaceIntersection {
    pub fn new(new_p: Vector3f,
               new_geo_normal: Vector3f,
               new_sh_normal: Vector3f,
               new_uv: Vector2f,
               new_t: Float,
               new_le: RGBSpectrum,
               new_material: Option<Arc<dyn BSDF>>) -> Self {
        Self { p: new_p, geo_normal: new_geo_normal, sh_normal: new_sh_normal,
               uv: new_uv, t: new_t, le: new_le, material: new_material,
               object_index: None, valid: true }
    }

    /// Sentinel for "no previous vertex" bookkeeping.
    pub fn invalid() -> Self {
        Self {
            p: Vector3f::zeros(),
            geo_normal: Vector3f::new(0.0, 0.0, 1.0),
            sh_normal: Vector3f::new(0.0, 0.0, 1.0),
            uv: Vector2f::new(0.0, 0.0),
            t: 0.0,
            le: RGBSpectrum::default(),
            material: None,
            object_index: None,
            valid: false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn t(&self) -> Float {
        self.t
    }

    pub fn le(&self) -> RGBSpectrum {
        self.le
    }

    pub fn is_emitter(&self) -> bool {
        !self.le.is_black()
    }

    pub fn p(&self) -> Vector3f {
        self.p
    }

    pub fn uv(&self) -> Vector2f {
        self.uv
    }

    pub fn geo_normal(&self) -> Vector3f {
        self.geo_normal
    }

    pub fn sh_normal(&self) -> Vector3f {
        self.sh_normal
    }

    pub fn material(&self) -> Option<&dyn BSDF> {
        self.material.as_deref()
    }

    pub fn object_index(&self) -> Option<usize> {
        self.object_index
    }

    pub fn with_le(mut self, new_le: RGBSpectrum) -> Self {
        self.le = new_le;
        self
    }

    pub fn with_material(mut self, new_material: Arc<dyn BSDF>) -> Self {
        self.material = Some(new_material);
        self
    }

    pub fn with_object_index(mut self, object_index: Option<usize>) -> Self {
        self.object_index = object_index;
        self
    }

    /// Continuation ray leaving the surface along `dir`, offset along the
    /// geometric normal to dodge self-intersection.
    pub fn spawn_ray(&self, dir: &Vector3f) -> Ray3f {
        let mut n = self.geo_normal;
        if n.dot(dir) < 0.0 {
            n = -n;
        }
        Ray3f::new(self.p + n * EPSILON, *dir, Some(0.0), None)
    }
}

impl SurfaceSampleRecord {
    pub fn new(new_intersection: SurfaceIntersection,
               new_pdf: Float) -> Self {
        Self { intersection: new_intersection, pdf: new_pdf }
    }

    pub fn intersection(&self) -> &SurfaceIntersection {
        &self.intersection
    }

    pub fn pdf(&self) -> Float {
        self.pdf
    }

    pub fn set_pdf(&mut self, pdf: Float) {
        self.pdf = pdf;
    }
}
