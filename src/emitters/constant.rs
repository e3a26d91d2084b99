// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::core::interaction::SurfaceIntersection;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{sample_uniform_sphere, sample_uniform_sphere_pdf};

/// Environment emitter with uniform radiance over the whole sphere of
/// directions. Shadow rays toward it only need to clear the scene, so the
/// sample distance is derived from the scene bounds.
pub struct ConstantEmitter {
    radiance: RGBSpectrum,
    scene_radius: Float,
}

impl ConstantEmitter {
    pub fn new(radiance: RGBSpectrum) -> Self {
        Self { radiance, scene_radius: 1.0 }
    }
}

impl ComputationNode for ConstantEmitter {
    fn to_string(&self) -> String {
        String::from("ConstantEmitter")
    }
}

impl Emitter for ConstantEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::DIRECTION
    }

    fn set_scene_bounds(&mut self, bounds: &AABB) {
        if bounds.is_valid() {
            self.scene_radius = bounds.radius().max(EPSILON);
        }
    }

    fn eval_direction(&self, _direction: &Vector3f) -> RGBSpectrum {
        self.radiance
    }

    fn pdf_direction(&self, _direction: &Vector3f) -> Float {
        sample_uniform_sphere_pdf()
    }

    fn sample_direction(&self, _reference: &SurfaceIntersection, u: &Vector2f)
        -> Option<DirectionSample> {
        Some(DirectionSample {
            direction: sample_uniform_sphere(u),
            distance: 2.0 * self.scene_radius,
            radiance: self.radiance,
            pdf: sample_uniform_sphere_pdf(),
            delta: false,
            infinite: true,
        })
    }
}
