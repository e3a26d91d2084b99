// Copyright @yucwang 2026

use crate::core::computation_node::ComputationNode;
use crate::core::emitter::{DirectionSample, Emitter, EmitterFlag};
use crate::core::interaction::SurfaceIntersection;
use crate::core::shape::Shape;
use crate::math::constants::Vector2f;
use crate::math::spectrum::RGBSpectrum;
use std::sync::Arc;

/// One-sided diffuse area light attached to a scene shape. The scene
/// creates one automatically for every object with a non-black emission.
pub struct AreaEmitter {
    shape: Arc<dyn Shape>,
    radiance: RGBSpectrum,
}

impl AreaEmitter {
    pub fn from_shape(shape: Arc<dyn Shape>, radiance: RGBSpectrum) -> Self {
        Self { shape, radiance }
    }

    pub fn radiance(&self) -> RGBSpectrum {
        self.radiance
    }
}

impl ComputationNode for AreaEmitter {
    fn to_string(&self) -> String {
        String::from("AreaEmitter")
    }
}

impl Emitter for AreaEmitter {
    fn get_flag(&self) -> EmitterFlag {
        EmitterFlag::SURFACE
    }

    fn sample_direction(&self, reference: &SurfaceIntersection, u: &Vector2f)
        -> Option<DirectionSample> {
        let sample = self.shape.sample(u);
        let area_pdf = sample.pdf();
        if area_pdf <= 0.0 {
            return None;
        }

        let to_light = sample.intersection().p() - reference.p();
        let dist2 = to_light.dot(&to_light);
        if dist2 <= 0.0 {
            return None;
        }
        let dist = dist2.sqrt();
        let direction = to_light / dist;

        // one-sided: no emission toward the back face
        let cos_light = sample.intersection().geo_normal().dot(&(-direction));
        if cos_light <= 0.0 {
            return None;
        }

        Some(DirectionSample {
            direction,
            distance: dist,
            radiance: self.radiance,
            pdf: area_pdf * dist2 / cos_light,
            delta: false,
            infinite: false,
        })
    }
}
