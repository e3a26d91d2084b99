// Copyright 2020 @TwoCookingMice

use crate::core::bsdf::{BSDF, BSDFFlags, BSDFSample, BSDFValue};
use crate::core::computation_node::ComputationNode;
use crate::math::constants::{Float, INV_PI, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

pub struct LambertianDiffuse {
    albedo: RGBSpectrum,
}

impl LambertianDiffuse {
    pub fn new(albedo: RGBSpectrum) -> Self {
        Self { albedo }
    }
}

impl ComputationNode for LambertianDiffuse {
    fn to_string(&self) -> String {
        String::from("LambertianDiffuse")
    }
}

impl BSDF for LambertianDiffuse {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DIFFUSE | BSDFFlags::REFLECTION
    }

    fn sample(&self, _u1: Float, u2: &Vector2f, wi: &Vector3f) -> (BSDFSample, BSDFValue) {
        if wi.z == 0.0 {
            return (BSDFSample::default(), BSDFValue::default());
        }

        let mut wo = sample_cosine_hemisphere(u2);
        // scatter into the incident hemisphere
        if wi.z < 0.0 {
            wo.z = -wo.z;
        }
        let pdf = sample_cosine_hemisphere_pdf(wo.z.abs());
        if pdf <= 0.0 {
            return (BSDFSample::default(), BSDFValue::default());
        }

        let sample = BSDFSample {
            wo,
            pdf,
            eta: 1.0,
            flags: self.flags(),
        };
        // f * |cos| / pdf = albedo for the cosine-weighted density
        (sample, self.albedo)
    }

    fn eval(&self, wi: &Vector3f, wo: &Vector3f) -> BSDFValue {
        if wi.z * wo.z <= 0.0 {
            return BSDFValue::default();
        }
        self.albedo * (INV_PI * wo.z.abs())
    }

    fn pdf(&self, wi: &Vector3f, wo: &Vector3f) -> Float {
        if wi.z * wo.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wo.z.abs())
    }
}
