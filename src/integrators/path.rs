// Copyright @yucwang 2026

use crate::core::integrator::{ConfigError, Integrator, mis_weight};
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::tangent_frame::{build_tangent_frame, local_to_world, world_to_local};
use crate::math::constants::{Float, Vector2f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};

const RR_PROB_MAX: Float = 0.95;

/// Single-pass path tracer with next-event estimation and multiple
/// importance sampling. Gathers radiance as it walks, which makes it the
/// natural reference for the two-phase integrator: both visit the same
/// vertices with the same strategies.
pub struct PathIntegrator {
    max_depth: u32,
    rr_depth: u32,
    samples_per_pixel: u32,
}

impl PathIntegrator {
    pub fn new(max_depth: u32, rr_depth: u32, samples_per_pixel: u32)
        -> Result<Self, ConfigError> {
        if max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if rr_depth > max_depth {
            return Err(ConfigError::RouletteDepthOutOfRange { rr_depth, max_depth });
        }
        Ok(Self { max_depth, rr_depth, samples_per_pixel })
    }

    /// Radiance arriving along `ray`.
    pub fn li(&self, scene: &Scene, ray: &Ray3f, rng: &mut LcgRng) -> RGBSpectrum {
        let mut ray = ray.clone();
        let mut result = RGBSpectrum::default();
        let mut throughput = RGBSpectrum::white();
        let mut eta: Float = 1.0;
        let mut depth: u32 = 0;
        let mut last_nd_pdf: Float = 1.0;
        let mut prev_delta = false;
        let mut prev_p = ray.origin();

        while depth < self.max_depth {
            let hit = match scene.ray_intersection(&ray) {
                Some(hit) => hit,
                None => {
                    let env = scene.eval_environment(&ray.dir());
                    if !env.is_black() {
                        let mis = if depth == 0 {
                            1.0
                        } else {
                            let em_pdf = if prev_delta {
                                0.0
                            } else {
                                scene.pdf_environment_direction(&ray.dir())
                            };
                            mis_weight(last_nd_pdf, em_pdf)
                        };
                        result += throughput * env * mis;
                    }
                    break;
                }
            };

            if hit.is_emitter() {
                let mis = if depth == 0 {
                    1.0
                } else {
                    let em_pdf = scene.pdf_emitter_direction(&prev_p, &hit, !prev_delta);
                    mis_weight(last_nd_pdf, em_pdf)
                };
                result += throughput * hit.le() * mis;
            }

            let material = match hit.material() {
                Some(material) => material,
                None => break,
            };

            let n = hit.sh_normal();
            let (tangent, bitangent) = build_tangent_frame(&n);
            let wi_local = world_to_local(&(-ray.dir()), &tangent, &bitangent, &n);

            // next-event estimation
            if material.flags().is_smooth() {
                let u2 = rng.next_2d();
                if let Some(ds) = scene.sample_emitter_direction(
                    &hit, rng.next_1d(), &u2, true) {
                    let wo_local = world_to_local(&ds.direction, &tangent, &bitangent, &n);
                    let (f, bsdf_pdf) = material.eval_pdf(&wi_local, &wo_local);
                    if !f.is_black() {
                        let mis = if ds.delta {
                            1.0
                        } else {
                            mis_weight(ds.pdf, bsdf_pdf)
                        };
                        result += throughput * f * ds.radiance * (mis / ds.pdf);
                    }
                }
            }

            // continue the walk
            let u2 = rng.next_2d();
            let (bs, bsdf_weight) = material.sample(rng.next_1d(), &u2, &wi_local);
            if bsdf_weight.is_black() {
                break;
            }

            throughput *= bsdf_weight;
            eta *= bs.eta;
            depth += 1;
            prev_delta = !bs.flags.is_smooth();
            if !prev_delta {
                last_nd_pdf = bs.pdf;
            }

            if depth >= self.rr_depth {
                let rr_prob = (throughput.max_channel() * eta * eta).min(RR_PROB_MAX);
                if rr_prob <= 0.0 || rng.next_1d() >= rr_prob {
                    break;
                }
                throughput *= 1.0 / rr_prob;
            }

            let wo_world = local_to_world(&bs.wo, &tangent, &bitangent, &n);
            prev_p = hit.p();
            ray = hit.spawn_ray(&wo_world);
        }

        result
    }
}

impl Integrator for PathIntegrator {
    fn trace_ray_forward(&self,
                         scene: &Scene,
                         sensor: &dyn Sensor,
                         pixel: Vector2f,
                         rng: &mut LcgRng) -> RGBSpectrum {
        let width = sensor.bitmap().width() as Float;
        let height = sensor.bitmap().height() as Float;
        let uv = Vector2f::new((pixel.x + rng.next_1d()) / width,
                               (pixel.y + rng.next_1d()) / height);
        let ray = sensor.sample_ray(&uv);
        self.li(scene, &ray, rng)
    }

    fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneObject;
    use crate::emitters::constant::ConstantEmitter;
    use crate::materials::lambertian_diffuse::LambertianDiffuse;
    use crate::math::constants::Vector3f;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;
    use std::sync::Arc;

    #[test]
    fn test_path_config_validation() {
        assert!(PathIntegrator::new(0, 0, 1).is_err());
        assert!(PathIntegrator::new(4, 8, 1).is_err());
        assert!(PathIntegrator::new(8, 4, 1).is_ok());
    }

    #[test]
    fn test_environment_seen_directly() {
        let mut scene = Scene::new();
        scene.add_emitter(Box::new(ConstantEmitter::new(RGBSpectrum::splat(2.0))));
        scene.build_bvh();

        let it = PathIntegrator::new(4, 4, 1).unwrap();
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let radiance = it.li(&scene, &ray, &mut rng);

        // camera ray escaping straight to the environment, full weight
        assert!((radiance[0] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_emitter_seen_directly() {
        let mut scene = Scene::new();
        let to_world = Transform::translate(Vector3f::new(0.0, 0.0, 2.0));
        scene.add_object(SceneObject::with_emission(
            Arc::new(Rectangle::new(to_world, true)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.2))),
            RGBSpectrum::splat(5.0),
        ));
        scene.build_bvh();

        let it = PathIntegrator::new(4, 4, 1).unwrap();
        let mut rng = LcgRng::new(1);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let radiance = it.li(&scene, &ray, &mut rng);

        assert!((radiance[0] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_diffuse_floor_under_environment() {
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Arc::new(Rectangle::new(Transform::default(), false)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.5))),
        ));
        scene.add_emitter(Box::new(ConstantEmitter::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh();

        let it = PathIntegrator::new(8, 8, 1).unwrap();
        let mut rng = LcgRng::new(13);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);

        let n = 50_000;
        let mut mean = 0.0;
        for _ in 0..n {
            mean += it.li(&scene, &ray, &mut rng)[0];
        }
        mean /= n as Float;

        assert!((mean - 0.5).abs() < 0.03, "mean {} expected 0.5", mean);
    }
}
