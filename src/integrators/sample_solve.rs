// Copyright @yucwang 2026

//! Two-phase light-transport integrator.
//!
//! The sample phase walks a path forward from the sensor and records every
//! vertex into a [`BounceBuffer`] without accumulating any radiance. The
//! solve phase then revisits the recorded vertices and gathers emission and
//! next-event estimates, rebuilding the path weight up to each vertex with
//! a replay walk over the earlier records. Splitting the two concerns costs
//! O(depth^2) per path but lets the gather step re-evaluate scattering with
//! state that is only known once the whole path is laid out.

use crate::core::bounce::{BounceBuffer, BounceRecord};
use crate::core::bsdf::BSDFFlags;
use crate::core::integrator::{ConfigError, Integrator, RadianceSample, mis_weight};
use crate::core::rng::LcgRng;
use crate::core::scene::Scene;
use crate::core::sensor::Sensor;
use crate::core::tangent_frame::{build_tangent_frame, local_to_world, world_to_local};
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;
use crate::math::spectrum::{RGBSpectrum, Spectrum};

const RR_PROB_MAX: Float = 0.95;

/// Parameters of the (stubbed) spectral coherence state threaded through
/// the replay step. Only the hero wavelength draw is live today.
#[derive(Debug, Clone, Copy)]
pub struct CoherenceConfig {
    pub wavelength_min: Float,
    pub wavelength_max: Float,
}

impl Default for CoherenceConfig {
    fn default() -> Self {
        // visible range, nanometers
        Self { wavelength_min: 360.0, wavelength_max: 830.0 }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SampleSolveConfig {
    pub max_depth: u32,
    pub rr_depth: u32,
    pub samples_per_pixel: u32,
    /// Stop forward sampling at the first emitter hit instead of scattering
    /// through it.
    pub terminate_on_emitter: bool,
    /// Re-evaluate the BSDF from the stored directions during replay
    /// instead of reusing the cached sampling weight.
    pub replay_eval: bool,
    pub coherence: CoherenceConfig,
}

impl Default for SampleSolveConfig {
    fn default() -> Self {
        Self {
            max_depth: 16,
            rr_depth: 4,
            samples_per_pixel: 32,
            terminate_on_emitter: false,
            replay_eval: false,
            coherence: CoherenceConfig::default(),
        }
    }
}

pub struct SampleSolveIntegrator {
    config: SampleSolveConfig,
}

impl SampleSolveIntegrator {
    pub fn new(config: SampleSolveConfig) -> Result<Self, ConfigError> {
        if config.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if config.rr_depth > config.max_depth {
            return Err(ConfigError::RouletteDepthOutOfRange {
                rr_depth: config.rr_depth,
                max_depth: config.max_depth,
            });
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SampleSolveConfig {
        &self.config
    }

    /// Run both phases for one sensor ray and return the radiance estimate.
    /// The buffer is cleared first, so a pooled per-worker buffer can be
    /// passed in between paths.
    pub fn sample(&self,
                  scene: &Scene,
                  ray: &Ray3f,
                  rng: &mut LcgRng,
                  buffer: &mut BounceBuffer) -> RadianceSample {
        buffer.clear();
        let (wavelength, final_throughput) = self.sample_path(scene, ray, rng, buffer);
        let radiance = self.solve(scene, buffer, rng);
        // AOV layout: hero wavelength, then the final path throughput
        let aovs = vec![wavelength,
                        final_throughput[0],
                        final_throughput[1],
                        final_throughput[2]];
        RadianceSample { radiance, valid: true, aovs }
    }

    /// Phase one: walk the path forward and record one `BounceRecord` per
    /// vertex. Returns the hero wavelength drawn for this path and the
    /// throughput left when the walk ended.
    pub fn sample_path(&self,
                       scene: &Scene,
                       ray: &Ray3f,
                       rng: &mut LcgRng,
                       buffer: &mut BounceBuffer) -> (Float, RGBSpectrum) {
        let coherence = &self.config.coherence;
        let wavelength = coherence.wavelength_min
            + rng.next_1d() * (coherence.wavelength_max - coherence.wavelength_min);

        let mut ray = ray.clone();
        let mut throughput = RGBSpectrum::white();
        let mut eta: Float = 1.0;
        let mut depth: u32 = 0;
        // pdf of the last non-delta scattering event; the sensor counts as
        // a unit-density one so the first emissive hit gets full weight
        let mut last_nd_pdf: Float = 1.0;

        while depth < self.config.max_depth {
            let hit = match scene.ray_intersection(&ray) {
                Some(hit) => hit,
                None => break,
            };
            let is_emitter = hit.is_emitter();

            let (tangent, bitangent) = build_tangent_frame(&hit.sh_normal());
            let n = hit.sh_normal();
            let wi_local = world_to_local(&(-ray.dir()), &tangent, &bitangent, &n);

            let stop_here = (self.config.terminate_on_emitter && is_emitter)
                || hit.material().is_none();
            if stop_here {
                buffer.push(BounceRecord {
                    index: depth,
                    interaction: hit,
                    wi: wi_local,
                    wo: Vector3f::new(0.0, 0.0, 1.0),
                    flags: BSDFFlags::NONE,
                    throughput,
                    bsdf_weight: RGBSpectrum::white(),
                    bsdf_pdf: 0.0,
                    rr_correction: 1.0,
                    last_nd_pdf,
                    is_emitter,
                    active: false,
                });
                break;
            }

            let material = match hit.material() {
                Some(material) => material,
                None => break,
            };
            let u2 = rng.next_2d();
            let (bs, bsdf_weight) = material.sample(rng.next_1d(), &u2, &wi_local);

            throughput *= bsdf_weight;
            eta *= bs.eta;
            depth += 1;

            // Roulette fires once the path is deep enough. The survivor
            // correction is stored in the record rather than folded into
            // `bsdf_weight`, so the replay walk can account for it when it
            // rebuilds the weight of later contributions.
            let mut rr_correction: Float = 1.0;
            let mut alive = !bsdf_weight.is_black();
            if alive && depth >= self.config.rr_depth {
                let rr_prob = (throughput.max_channel() * eta * eta).min(RR_PROB_MAX);
                if rr_prob <= 0.0 || rng.next_1d() >= rr_prob {
                    alive = false;
                } else {
                    rr_correction = 1.0 / rr_prob;
                    throughput *= rr_correction;
                }
            }

            let wo_world = local_to_world(&bs.wo, &tangent, &bitangent, &n);
            let next_ray = hit.spawn_ray(&wo_world);
            // `active` marks a vertex with valid scattering information.
            // Roulette and the depth cap end the forward walk but do not
            // invalidate the vertex itself for next-event estimation.
            buffer.push(BounceRecord {
                index: depth - 1,
                interaction: hit,
                wi: wi_local,
                wo: bs.wo,
                flags: bs.flags,
                throughput,
                bsdf_weight,
                bsdf_pdf: bs.pdf,
                rr_correction,
                last_nd_pdf,
                is_emitter,
                active: true,
            });

            // carry/replace: delta events leave the last non-delta pdf alone
            if bs.flags.is_smooth() {
                last_nd_pdf = bs.pdf;
            }

            if !alive {
                break;
            }
            ray = next_ray;
        }

        (wavelength, throughput)
    }

    /// Phase two: gather radiance from the recorded vertices. Each vertex
    /// contributes its own emission and one next-event estimate, both scaled
    /// by the replayed path weight up to that vertex.
    pub fn solve(&self,
                 scene: &Scene,
                 buffer: &BounceBuffer,
                 rng: &mut LcgRng) -> RGBSpectrum {
        let mut radiance = RGBSpectrum::default();
        for i in 0..buffer.len() {
            let path_weight = self.replay(buffer, i);
            if path_weight.is_black() {
                continue;
            }
            let gathered = self.solve_emissive(scene, buffer, i)
                + self.solve_next_event(scene, buffer, i, rng);
            radiance += gathered * path_weight;
        }
        // TODO: add the escaped-ray environment term here once the sampler
        // records the final miss direction; until then environment light is
        // covered in full by solve_next_event.
        radiance
    }

    /// Rebuild the path weight accumulated before vertex `i` from the
    /// stored records; `replay(_, 0) == 1`. Roulette corrections of earlier
    /// vertices are applied here, never the one of vertex `i` itself.
    pub fn replay(&self, buffer: &BounceBuffer, i: usize) -> RGBSpectrum {
        let mut weight = RGBSpectrum::white();
        for j in 0..i {
            let record = match buffer.get(j) {
                Some(record) => record,
                None => break,
            };
            let step = if self.config.replay_eval {
                self.replay_step(record)
            } else {
                record.bsdf_weight
            };
            weight *= step * record.rr_correction;
        }
        weight
    }

    // Re-derive one vertex weight from the stored directions. This is the
    // seam where a coherence state updated along the path would change the
    // scattering response; with none attached it reproduces f * cos / pdf.
    fn replay_step(&self, record: &BounceRecord) -> RGBSpectrum {
        if !record.flags.is_smooth() || record.bsdf_pdf <= 0.0 {
            return record.bsdf_weight;
        }
        match record.interaction.material() {
            Some(material) => material.eval(&record.wi, &record.wo) / record.bsdf_pdf,
            None => record.bsdf_weight,
        }
    }

    /// Emission of vertex `i` toward the previous vertex, MIS-weighted
    /// against the emitter sampling strategy of that previous vertex. The
    /// first vertex is only reachable by the sensor and keeps full weight.
    fn solve_emissive(&self, scene: &Scene, buffer: &BounceBuffer, i: usize) -> RGBSpectrum {
        let record = match buffer.get(i) {
            Some(record) => record,
            None => return RGBSpectrum::default(),
        };
        if !record.is_emitter {
            return RGBSpectrum::default();
        }
        if i == 0 {
            return record.interaction.le();
        }

        let prev = match buffer.get(i - 1) {
            Some(prev) => prev,
            None => return RGBSpectrum::default(),
        };
        let prev_p = prev.interaction.p();
        let emitter_pdf = scene.pdf_emitter_direction(
            &prev_p, &record.interaction, prev.flags.is_smooth());
        record.interaction.le() * mis_weight(record.last_nd_pdf, emitter_pdf)
    }

    /// One emitter sample at vertex `i`, MIS-weighted against the BSDF
    /// strategy. Delta emitters and directions the sampler cannot produce
    /// keep full weight; environment emitters do as well because the
    /// escaped-ray counterpart is not gathered (see `solve`).
    fn solve_next_event(&self,
                        scene: &Scene,
                        buffer: &BounceBuffer,
                        i: usize,
                        rng: &mut LcgRng) -> RGBSpectrum {
        let record = match buffer.get(i) {
            Some(record) => record,
            None => return RGBSpectrum::default(),
        };
        if !record.active {
            return RGBSpectrum::default();
        }
        let material = match record.interaction.material() {
            Some(material) => material,
            None => return RGBSpectrum::default(),
        };
        if !material.flags().is_smooth() {
            return RGBSpectrum::default();
        }

        let u2 = rng.next_2d();
        let ds = match scene.sample_emitter_direction(
            &record.interaction, rng.next_1d(), &u2, true) {
            Some(ds) => ds,
            None => return RGBSpectrum::default(),
        };

        let n = record.interaction.sh_normal();
        let (tangent, bitangent) = build_tangent_frame(&n);
        let wo_local = world_to_local(&ds.direction, &tangent, &bitangent, &n);
        let (f, bsdf_pdf) = material.eval_pdf(&record.wi, &wo_local);
        if f.is_black() {
            return RGBSpectrum::default();
        }

        let mis = if ds.delta || ds.infinite {
            1.0
        } else {
            mis_weight(ds.pdf, bsdf_pdf)
        };
        f * ds.radiance * (mis / ds.pdf)
    }
}

impl Integrator for SampleSolveIntegrator {
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

        let mut buffer = BounceBuffer::with_capacity(self.config.max_depth as usize);
        self.sample(scene, &ray, rng, &mut buffer).radiance
    }

    fn samples_per_pixel(&self) -> u32 {
        self.config.samples_per_pixel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bsdf::BSDF;
    use crate::core::interaction::SurfaceIntersection;
    use crate::core::scene::SceneObject;
    use crate::integrators::path::PathIntegrator;
    use crate::materials::lambertian_diffuse::LambertianDiffuse;
    use crate::materials::mirror::Mirror;
    use crate::emitters::constant::ConstantEmitter;
    use crate::emitters::directional::DirectionalEmitter;
    use crate::math::constants::INV_PI;
    use crate::math::transform::Transform;
    use crate::shapes::rectangle::Rectangle;
    use std::sync::Arc;

    fn integrator(config: SampleSolveConfig) -> SampleSolveIntegrator {
        SampleSolveIntegrator::new(config).expect("valid config")
    }

    fn diffuse_floor(albedo: Float) -> SceneObject {
        SceneObject::new(
            Arc::new(Rectangle::new(Transform::default(), false)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(albedo))),
        )
    }

    fn down_ray() -> Ray3f {
        Ray3f::new(Vector3f::new(0.0, 0.0, 1.0),
                   Vector3f::new(0.0, 0.0, -1.0), None, None)
    }

    #[test]
    fn test_config_validation() {
        let bad = SampleSolveConfig { max_depth: 0, ..SampleSolveConfig::default() };
        assert_eq!(SampleSolveIntegrator::new(bad).err(),
                   Some(ConfigError::ZeroMaxDepth));

        let bad = SampleSolveConfig { max_depth: 4, rr_depth: 9,
                                      ..SampleSolveConfig::default() };
        assert_eq!(SampleSolveIntegrator::new(bad).err(),
                   Some(ConfigError::RouletteDepthOutOfRange { rr_depth: 9, max_depth: 4 }));

        assert!(SampleSolveIntegrator::new(SampleSolveConfig::default()).is_ok());
    }

    #[test]
    fn test_replay_base_and_single_bounce() {
        let it = integrator(SampleSolveConfig::default());
        let mut buffer = BounceBuffer::with_capacity(4);

        let base = it.replay(&buffer, 0);
        assert_eq!(base, RGBSpectrum::white());

        buffer.push(BounceRecord {
            index: 0,
            interaction: SurfaceIntersection::invalid(),
            wi: Vector3f::new(0.0, 0.0, 1.0),
            wo: Vector3f::new(0.0, 0.0, 1.0),
            flags: BSDFFlags::DIFFUSE,
            throughput: RGBSpectrum::white(),
            bsdf_weight: RGBSpectrum::splat(0.5),
            bsdf_pdf: 0.3,
            rr_correction: 2.0,
            last_nd_pdf: 1.0,
            is_emitter: false,
            active: true,
        });

        // stored weight times the roulette correction
        let replayed = it.replay(&buffer, 1);
        assert!((replayed[0] - 1.0).abs() < 1e-6);
        assert!((replayed[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_replay_eval_matches_cached_weight_for_diffuse() {
        let config = SampleSolveConfig { replay_eval: true, ..SampleSolveConfig::default() };
        let it = integrator(config);

        let material = Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.7)));
        let wi = Vector3f::new(0.2, 0.1, 0.97).normalize();
        let mut rng = LcgRng::new(11);
        let u2 = rng.next_2d();
        let (bs, weight) = material.sample(rng.next_1d(), &u2, &wi);

        let n = Vector3f::new(0.0, 0.0, 1.0);
        let hit = SurfaceIntersection::new(
            Vector3f::zeros(), n, n, Vector2f::new(0.5, 0.5), 1.0,
            RGBSpectrum::default(), None)
            .with_material(material);

        let mut buffer = BounceBuffer::with_capacity(2);
        buffer.push(BounceRecord {
            index: 0,
            interaction: hit,
            wi,
            wo: bs.wo,
            flags: bs.flags,
            throughput: weight,
            bsdf_weight: weight,
            bsdf_pdf: bs.pdf,
            rr_correction: 1.0,
            last_nd_pdf: 1.0,
            is_emitter: false,
            active: true,
        });

        // re-evaluating f/pdf reproduces the cached f*cos/pdf weight
        let replayed = it.replay(&buffer, 1);
        for c in 0..3 {
            assert!((replayed[c] - weight[c]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_miss_yields_empty_buffer_and_black() {
        let mut scene = Scene::new();
        scene.build_bvh();
        let it = integrator(SampleSolveConfig::default());
        let mut rng = LcgRng::new(1);
        let mut buffer = BounceBuffer::with_capacity(16);

        let estimate = it.sample(&scene, &down_ray(), &mut rng, &mut buffer);
        assert!(buffer.is_empty());
        assert!(estimate.radiance.is_black());
        assert!(estimate.valid);
    }

    fn emissive_panel_scene() -> Scene {
        let mut scene = Scene::new();
        // light at z = 2 facing back down toward the origin
        let to_world = Transform::translate(Vector3f::new(0.0, 0.0, 2.0));
        scene.add_object(SceneObject::with_emission(
            Arc::new(Rectangle::new(to_world, true)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.2))),
            RGBSpectrum::splat(5.0),
        ));
        scene.build_bvh();
        scene
    }

    #[test]
    fn test_direct_emitter_hit_full_weight() {
        let scene = emissive_panel_scene();
        let it = integrator(SampleSolveConfig::default());
        let mut rng = LcgRng::new(3);
        let mut buffer = BounceBuffer::with_capacity(16);

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let estimate = it.sample(&scene, &ray, &mut rng, &mut buffer);

        // first vertex is the light itself: no MIS discount
        assert!((estimate.radiance[0] - 5.0).abs() < 1e-4);
        assert!(buffer.len() >= 1);
        assert!(buffer.get(0).map(|r| r.is_emitter).unwrap_or(false));
    }

    #[test]
    fn test_terminate_on_emitter_stops_sampling() {
        let scene = emissive_panel_scene();
        let config = SampleSolveConfig { terminate_on_emitter: true,
                                         ..SampleSolveConfig::default() };
        let it = integrator(config);
        let mut rng = LcgRng::new(3);
        let mut buffer = BounceBuffer::with_capacity(16);

        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let estimate = it.sample(&scene, &ray, &mut rng, &mut buffer);

        assert_eq!(buffer.len(), 1);
        let record = buffer.get(0).unwrap();
        assert!(!record.active);
        assert!(record.is_emitter);
        assert!((estimate.radiance[0] - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_last_nd_pdf_carries_through_delta_bounce() {
        let mut scene = Scene::new();
        // mirror floor, diffuse ceiling two units up facing back down
        scene.add_object(SceneObject::new(
            Arc::new(Rectangle::new(Transform::default(), false)),
            Arc::new(Mirror::new(RGBSpectrum::splat(0.9))),
        ));
        scene.add_object(SceneObject::new(
            Arc::new(Rectangle::new(
                Transform::translate(Vector3f::new(0.0, 0.0, 2.0)), true)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.5))),
        ));
        scene.build_bvh();

        let config = SampleSolveConfig { max_depth: 3, rr_depth: 3,
                                         ..SampleSolveConfig::default() };
        let it = integrator(config);
        let mut rng = LcgRng::new(5);
        let mut buffer = BounceBuffer::with_capacity(3);

        let ray = Ray3f::new(Vector3f::new(0.4, 0.0, 1.0),
                             Vector3f::new(-0.1, 0.0, -1.0), None, None);
        it.sample_path(&scene, &ray, &mut rng, &mut buffer);

        assert!(buffer.len() >= 2);
        let first = buffer.get(0).unwrap();
        assert!(first.flags.contains(BSDFFlags::DELTA));
        assert_eq!(first.last_nd_pdf, 1.0);

        // delta bounce does not replace the carried pdf
        let second = buffer.get(1).unwrap();
        assert_eq!(second.last_nd_pdf, 1.0);

        if let Some(third) = buffer.get(2) {
            // the diffuse bounce at the ceiling does
            assert!((third.last_nd_pdf - second.bsdf_pdf).abs() < 1e-6);
        }
    }

    #[test]
    fn test_aovs_carry_wavelength_and_final_throughput() {
        // empty scene: the walk ends immediately with unit throughput
        let mut scene = Scene::new();
        scene.build_bvh();
        let it = integrator(SampleSolveConfig::default());
        let mut rng = LcgRng::new(4);
        let mut buffer = BounceBuffer::with_capacity(16);

        let estimate = it.sample(&scene, &down_ray(), &mut rng, &mut buffer);
        assert_eq!(estimate.aovs.len(), 4);
        assert!(estimate.aovs[0] >= 360.0 && estimate.aovs[0] < 830.0);
        for c in 1..4 {
            assert_eq!(estimate.aovs[c], 1.0);
        }

        // one mirror bounce scales the escaping throughput by the
        // reflectance
        let mut scene = Scene::new();
        scene.add_object(SceneObject::new(
            Arc::new(Rectangle::new(Transform::default(), false)),
            Arc::new(Mirror::new(RGBSpectrum::splat(0.9))),
        ));
        scene.build_bvh();

        let ray = Ray3f::new(Vector3f::new(0.4, 0.0, 1.0),
                             Vector3f::new(-0.1, 0.0, -1.0), None, None);
        let estimate = it.sample(&scene, &ray, &mut rng, &mut buffer);
        assert_eq!(buffer.len(), 1);
        for c in 1..4 {
            assert!((estimate.aovs[c] - 0.9).abs() < 1e-6);
        }
    }

    #[test]
    fn test_directional_emitter_nee_full_weight() {
        // Delta emitter: emitter sampling is the only viable strategy, so
        // its estimate carries no MIS discount and is exact at normal
        // incidence: albedo / pi * E.
        let mut scene = Scene::new();
        scene.add_object(diffuse_floor(0.6));
        scene.add_emitter(Box::new(DirectionalEmitter::new(
            Vector3f::new(0.0, 0.0, -1.0), RGBSpectrum::splat(2.0))));
        scene.build_bvh();

        let expected = 0.6 * INV_PI * 2.0;

        let it = integrator(SampleSolveConfig::default());
        let mut rng = LcgRng::new(21);
        let mut buffer = BounceBuffer::with_capacity(16);
        let estimate = it.sample(&scene, &down_ray(), &mut rng, &mut buffer);
        assert!((estimate.radiance[0] - expected).abs() < 1e-5,
                "two-phase {} expected {}", estimate.radiance[0], expected);

        // the conventional tracer lands on the same exact value
        let reference = PathIntegrator::new(16, 4, 1).expect("valid config");
        let mut rng = LcgRng::new(33);
        let from_path = reference.li(&scene, &down_ray(), &mut rng);
        assert!((from_path[0] - expected).abs() < 1e-5,
                "path {} expected {}", from_path[0], expected);
    }

    #[test]
    fn test_determinism_same_seed_same_radiance() {
        let mut scene = Scene::new();
        scene.add_object(diffuse_floor(0.5));
        scene.add_emitter(Box::new(ConstantEmitter::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh();

        let it = integrator(SampleSolveConfig::default());
        let mut run = |seed: u64| {
            let mut rng = LcgRng::new(seed);
            let mut buffer = BounceBuffer::with_capacity(16);
            it.sample(&scene, &down_ray(), &mut rng, &mut buffer).radiance
        };

        let a = run(42);
        let b = run(42);
        for c in 0..3 {
            assert_eq!(a[c], b[c]);
        }
    }

    #[test]
    fn test_constant_environment_direct_lighting() {
        // A Lambertian plane under a uniform environment reflects
        // albedo * Le toward any viewer.
        let mut scene = Scene::new();
        scene.add_object(diffuse_floor(0.5));
        scene.add_emitter(Box::new(ConstantEmitter::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh();

        let it = integrator(SampleSolveConfig::default());
        let mut rng = LcgRng::new(9);
        let mut buffer = BounceBuffer::with_capacity(16);

        let n = 50_000;
        let mut mean = 0.0;
        for _ in 0..n {
            let estimate = it.sample(&scene, &down_ray(), &mut rng, &mut buffer);
            mean += estimate.radiance[0];
        }
        mean /= n as Float;

        assert!((mean - 0.5).abs() < 0.03, "mean {} expected 0.5", mean);
    }

    fn two_plane_scene() -> Scene {
        let mut scene = Scene::new();
        scene.add_object(diffuse_floor(0.6));
        scene.add_object(SceneObject::new(
            Arc::new(Rectangle::new(
                Transform::translate(Vector3f::new(0.0, 0.0, 1.0)), true)),
            Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.6))),
        ));
        scene.add_emitter(Box::new(ConstantEmitter::new(RGBSpectrum::splat(1.0))));
        scene.build_bvh();
        scene
    }

    fn estimate_mean_se(it: &SampleSolveIntegrator, scene: &Scene, seed: u64,
                        n: usize) -> (Float, Float) {
        let mut rng = LcgRng::new(seed);
        let mut buffer = BounceBuffer::with_capacity(it.config().max_depth as usize);
        let ray = Ray3f::new(Vector3f::new(0.1, 0.1, 0.5),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let x = it.sample(scene, &ray, &mut rng, &mut buffer).radiance[0];
            sum += x;
            sum_sq += x * x;
        }
        let mean = sum / n as Float;
        let var = (sum_sq / n as Float - mean * mean).max(0.0);
        (mean, (var / n as Float).sqrt())
    }

    #[test]
    fn test_russian_roulette_is_unbiased() {
        let scene = two_plane_scene();
        let n = 20_000;

        let no_rr = integrator(SampleSolveConfig {
            max_depth: 8, rr_depth: 8, ..SampleSolveConfig::default()
        });
        let with_rr = integrator(SampleSolveConfig {
            max_depth: 8, rr_depth: 1, ..SampleSolveConfig::default()
        });

        let (mean_a, se_a) = estimate_mean_se(&no_rr, &scene, 17, n);
        let (mean_b, se_b) = estimate_mean_se(&with_rr, &scene, 71, n);

        let tolerance = (4.0 * (se_a * se_a + se_b * se_b).sqrt()).max(0.02);
        assert!((mean_a - mean_b).abs() < tolerance,
                "no-rr {} vs rr {} (tolerance {})", mean_a, mean_b, tolerance);
    }

    #[test]
    fn test_agrees_with_conventional_path_tracer() {
        let scene = two_plane_scene();
        let n = 20_000;

        let two_phase = integrator(SampleSolveConfig {
            max_depth: 6, rr_depth: 6, ..SampleSolveConfig::default()
        });
        let (mean_a, se_a) = estimate_mean_se(&two_phase, &scene, 23, n);

        let reference = PathIntegrator::new(6, 6, 1).expect("valid config");
        let ray = Ray3f::new(Vector3f::new(0.1, 0.1, 0.5),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let mut rng = LcgRng::new(32);
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        for _ in 0..n {
            let x = reference.li(&scene, &ray, &mut rng)[0];
            sum += x;
            sum_sq += x * x;
        }
        let mean_b = sum / n as Float;
        let var = (sum_sq / n as Float - mean_b * mean_b).max(0.0);
        let se_b = (var / n as Float).sqrt();

        let tolerance = (4.0 * (se_a * se_a + se_b * se_b).sqrt()).max(0.02);
        assert!((mean_a - mean_b).abs() < tolerance,
                "two-phase {} vs path {} (tolerance {})", mean_a, mean_b, tolerance);
    }
}
