// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::core::interaction::SurfaceIntersection;
use crate::math::aabb::AABB;
use crate::math::constants::{EPSILON, Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Distant sun-style emitter: all light arrives from a single fixed
/// direction, so its direction distribution is degenerate and it never
/// participates in MIS.
pub struct DirectionalEmitter {
    // direction the light travels, as given in the scene description
    direction: Vector3f,
    irradiance: RGBSpectrum,
    scene_radius: Float,
}

impl DirectionalEmitter {
    pub fn new(direction: Vector3f, irradiance: RGBSpectrum) -> Self {
        Self {
            direction: direction.normalize(),
            irradiance,
            scene_radius: 1.0,
        }
    }
}

impl ComputationNode for DirectionalEmitter {
    fn to_string(&self) -> String {
        String::from("DirectionalEmitter")
    }
}

impl Emitter for DirectionalEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::DIRECTION | EmitterFlag::DELTA
    }

    fn set_scene_bounds(&mut self, bounds: &AABB) {
        if bounds.is_valid() {
            self.scene_radius = bounds.radius().max(EPSILON);
        }
    }

    fn sample_direction(&self, _reference: &SurfaceIntersection, _u: &Vector2f)
        -> Option<DirectionSample> {
        Some(DirectionSample {
            direction: -self.direction,
            distance: 2.0 * self.scene_radius,
            radiance: self.irradiance,
            pdf: 1.0,
            delta: true,
            infinite: true,
        })
    }
}
