// Copyright @yucwang 2026

use crate::core::bsdf::{BSDF, BSDFFlags, BSDFSample, BSDFValue};
use crate::core::computation_node::ComputationNode;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::spectrum::RGBSpectrum;

/// Ideal specular reflector. The lobe is a delta distribution, so `eval`
/// and `pdf` are identically zero and only `sample` ever contributes.
pub struct Mirror {
    reflectance: RGBSpectrum,
}

impl Mirror {
    pub fn new(reflectance: RGBSpectrum) -> Self {
        Self { reflectance }
    }
}

impl ComputationNode for Mirror {
    fn to_string(&self) -> String {
        String::from("Mirror")
    }
}

impl BSDF for Mirror {
    fn flags(&self) -> BSDFFlags {
        BSDFFlags::DELTA | BSDFFlags::REFLECTION
    }

    fn sample(&self, _u1: Float, _u2: &Vector2f, wi: &Vector3f) -> (BSDFSample, BSDFValue) {
        if wi.z == 0.0 {
            return (BSDFSample::default(), BSDFValue::default());
        }

        let sample = BSDFSample {
            wo: Vector3f::new(-wi.x, -wi.y, wi.z),
            pdf: 1.0,
            eta: 1.0,
            flags: self.flags(),
        };
        (sample, self.reflectance)
    }

    fn eval(&self, _wi: &Vector3f, _wo: &Vector3f) -> BSDFValue {
        BSDFValue::default()
    }

    fn pdf(&self, _wi: &Vector3f, _wo: &Vector3f) -> Float {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::Spectrum;

    #[test]
    fn test_mirror_reflects_about_normal() {
        let bsdf = Mirror::new(RGBSpectrum::splat(0.9));
        let wi = Vector3f::new(0.5, -0.1, 0.7).normalize();
        let (sample, weight) = bsdf.sample(0.5, &Vector2f::new(0.5, 0.5), &wi);

        assert!((sample.wo.x + wi.x).abs() < 1e-6);
        assert!((sample.wo.y + wi.y).abs() < 1e-6);
        assert!((sample.wo.z - wi.z).abs() < 1e-6);
        assert_eq!(sample.pdf, 1.0);
        assert!(sample.flags.contains(BSDFFlags::DELTA));
        assert_eq!(weight[0], 0.9);
    }

    #[test]
    fn test_mirror_eval_pdf_zero() {
        let bsdf = Mirror::new(RGBSpectrum::splat(0.9));
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        assert!(bsdf.eval(&wi, &wi).is_black());
        assert_eq!(bsdf.pdf(&wi, &wi), 0.0);
        assert!(!bsdf.flags().is_smooth());
    }
}
