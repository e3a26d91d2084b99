// Copyright @yucwang 2026

//! Scene description loader. The format is a small Mitsuba-flavored XML
//! dialect: an `integrator` block (`path` or `sample_solve`), a
//! `perspective` sensor with its film, `diffuse`/`mirror` BSDFs (inline or
//! referenced by id), `rectangle` shapes with translate/scale transforms,
//! `area` emitters nested in their shape, and scene-level `constant` /
//! `directional` emitters.

use crate::core::bsdf::BSDF;
use crate::core::integrator::{ConfigError, Integrator};
use crate::core::scene::{Scene, SceneObject};
use crate::emitters::constant::ConstantEmitter;
use crate::emitters::directional::DirectionalEmitter;
use crate::integrators::path::PathIntegrator;
use crate::integrators::sample_solve::{SampleSolveConfig, SampleSolveIntegrator};
use crate::materials::lambertian_diffuse::LambertianDiffuse;
use crate::materials::mirror::Mirror;
use crate::math::constants::{FLOAT_MAX, Float, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::transform::Transform;
use crate::sensors::perspective::PerspectiveCamera;
use crate::shapes::rectangle::Rectangle;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum SceneLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(String),
    Config(ConfigError),
}

impl fmt::Display for SceneLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneLoadError::Io(e) => write!(f, "scene io error: {}", e),
            SceneLoadError::Parse(msg) => write!(f, "scene parse error: {}", msg),
            SceneLoadError::MissingField(name) => {
                write!(f, "scene description is missing: {}", name)
            }
            SceneLoadError::Config(e) => write!(f, "integrator config error: {}", e),
        }
    }
}

impl std::error::Error for SceneLoadError {}

impl From<std::io::Error> for SceneLoadError {
    fn from(e: std::io::Error) -> Self {
        SceneLoadError::Io(e)
    }
}

impl From<quick_xml::Error> for SceneLoadError {
    fn from(e: quick_xml::Error) -> Self {
        SceneLoadError::Parse(e.to_string())
    }
}

impl From<ConfigError> for SceneLoadError {
    fn from(e: ConfigError) -> Self {
        SceneLoadError::Config(e)
    }
}

pub struct SceneLoadResult {
    pub scene: Scene,
    pub integrator: Box<dyn Integrator>,
}

impl std::fmt::Debug for SceneLoadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneLoadResult").finish_non_exhaustive()
    }
}

/// Command-line overrides applied on top of the scene description.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoadOverrides {
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
}

pub fn load_scene_from_file(file_path: &str) -> Result<SceneLoadResult, SceneLoadError> {
    load_scene_from_file_with(file_path, LoadOverrides::default())
}

pub fn load_scene_from_file_with(file_path: &str, overrides: LoadOverrides)
    -> Result<SceneLoadResult, SceneLoadError> {
    log::info!("Loading scene from: {}.", file_path);
    let contents = std::fs::read_to_string(file_path)?;
    load_scene_from_str_with(&contents, overrides)
}

pub fn load_scene_from_str(xml: &str) -> Result<SceneLoadResult, SceneLoadError> {
    load_scene_from_str_with(xml, LoadOverrides::default())
}

pub fn load_scene_from_str_with(xml: &str, overrides: LoadOverrides)
    -> Result<SceneLoadResult, SceneLoadError> {
    let mut loader = Loader::new();
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event()? {
            Event::Start(e) => loader.handle_start(&e)?,
            Event::Empty(e) => {
                loader.handle_start(&e)?;
                loader.handle_end(e.name().as_ref())?;
            }
            Event::End(e) => loader.handle_end(e.name().as_ref())?,
            Event::Eof => break,
            _ => {}
        }
    }

    loader.finish(overrides)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scope {
    Scene,
    Integrator,
    Sensor,
    Film,
    Bsdf,
    Shape,
    ShapeEmitter,
    Emitter,
    Transform,
    Other,
}

struct IntegratorParams {
    kind: String,
    max_depth: u32,
    rr_depth: u32,
    sample_count: u32,
    terminate_on_emitter: bool,
    replay_eval: bool,
}

impl Default for IntegratorParams {
    fn default() -> Self {
        let defaults = SampleSolveConfig::default();
        Self {
            kind: String::new(),
            max_depth: defaults.max_depth,
            rr_depth: defaults.rr_depth,
            sample_count: defaults.samples_per_pixel,
            terminate_on_emitter: defaults.terminate_on_emitter,
            replay_eval: defaults.replay_eval,
        }
    }
}

struct SensorParams {
    fov_degrees: Float,
    origin: Vector3f,
    target: Vector3f,
    up: Vector3f,
    width: usize,
    height: usize,
}

impl Default for SensorParams {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            origin: Vector3f::new(0.0, 0.0, 0.0),
            target: Vector3f::new(0.0, 0.0, -1.0),
            up: Vector3f::new(0.0, 1.0, 0.0),
            width: 512,
            height: 512,
        }
    }
}

struct BsdfParams {
    kind: String,
    id: Option<String>,
    reflectance: RGBSpectrum,
}

struct ShapeParams {
    kind: String,
    to_world: Transform,
    flip_normals: bool,
    material: Option<Arc<dyn BSDF>>,
    emission: RGBSpectrum,
}

struct EmitterParams {
    kind: String,
    radiance: RGBSpectrum,
    direction: Vector3f,
}

struct Loader {
    scopes: Vec<Scope>,
    scene: Scene,
    materials: HashMap<String, Arc<dyn BSDF>>,
    integrator: Option<IntegratorParams>,
    current_integrator: Option<IntegratorParams>,
    current_sensor: Option<SensorParams>,
    current_bsdf: Option<BsdfParams>,
    current_shape: Option<ShapeParams>,
    current_emitter: Option<EmitterParams>,
}

impl Loader {
    fn new() -> Self {
        Self {
            scopes: Vec::new(),
            scene: Scene::new(),
            materials: HashMap::new(),
            integrator: None,
            current_integrator: None,
            current_sensor: None,
            current_bsdf: None,
            current_shape: None,
            current_emitter: None,
        }
    }

    fn scope(&self) -> Scope {
        *self.scopes.last().unwrap_or(&Scope::Other)
    }

    fn handle_start(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        match e.name().as_ref() {
            b"scene" => self.scopes.push(Scope::Scene),
            b"integrator" => {
                let mut params = IntegratorParams::default();
                params.kind = require_attr(e, "type")?;
                self.current_integrator = Some(params);
                self.scopes.push(Scope::Integrator);
            }
            b"sensor" => {
                let kind = require_attr(e, "type")?;
                if kind != "perspective" {
                    return Err(SceneLoadError::Parse(
                        format!("unsupported sensor type: {}", kind)));
                }
                self.current_sensor = Some(SensorParams::default());
                self.scopes.push(Scope::Sensor);
            }
            b"film" => self.scopes.push(Scope::Film),
            b"bsdf" => {
                self.current_bsdf = Some(BsdfParams {
                    kind: require_attr(e, "type")?,
                    id: attr(e, "id")?,
                    reflectance: RGBSpectrum::splat(0.5),
                });
                self.scopes.push(Scope::Bsdf);
            }
            b"shape" => {
                self.current_shape = Some(ShapeParams {
                    kind: require_attr(e, "type")?,
                    to_world: Transform::default(),
                    flip_normals: false,
                    material: None,
                    emission: RGBSpectrum::default(),
                });
                self.scopes.push(Scope::Shape);
            }
            b"emitter" => {
                let params = EmitterParams {
                    kind: require_attr(e, "type")?,
                    radiance: RGBSpectrum::white(),
                    direction: Vector3f::new(0.0, 0.0, -1.0),
                };
                self.current_emitter = Some(params);
                if self.scope() == Scope::Shape {
                    self.scopes.push(Scope::ShapeEmitter);
                } else {
                    self.scopes.push(Scope::Emitter);
                }
            }
            b"transform" => self.scopes.push(Scope::Transform),
            b"translate" => {
                if let Some(shape) = self.current_shape.as_mut() {
                    let v = read_xyz(e, 0.0)?;
                    shape.to_world = Transform::translate(v).compose(&shape.to_world);
                }
            }
            b"scale" => {
                if let Some(shape) = self.current_shape.as_mut() {
                    let v = match attr(e, "value")? {
                        Some(value) => Vector3f::from_element(parse_float(&value)?),
                        None => read_xyz(e, 1.0)?,
                    };
                    shape.to_world = Transform::scale(v).compose(&shape.to_world);
                }
            }
            b"integer" => self.set_integer(e)?,
            b"float" => self.set_float(e)?,
            b"boolean" => self.set_boolean(e)?,
            b"rgb" => self.set_rgb(e)?,
            b"point" | b"vector" => self.set_vector(e)?,
            b"ref" => {
                let id = require_attr(e, "id")?;
                let material = self.materials.get(&id).cloned().ok_or_else(|| {
                    SceneLoadError::MissingField(format!("bsdf with id \"{}\"", id))
                })?;
                if let Some(shape) = self.current_shape.as_mut() {
                    shape.material = Some(material);
                }
            }
            _ => self.scopes.push(Scope::Other),
        }
        Ok(())
    }

    fn handle_end(&mut self, name: &[u8]) -> Result<(), SceneLoadError> {
        match name {
            b"scene" | b"film" | b"transform" => {
                self.scopes.pop();
            }
            b"integrator" => {
                self.scopes.pop();
                self.integrator = self.current_integrator.take();
            }
            b"sensor" => {
                self.scopes.pop();
                if let Some(params) = self.current_sensor.take() {
                    let aspect = params.width as Float / params.height as Float;
                    let camera = PerspectiveCamera::new(
                        params.origin,
                        params.target,
                        params.up,
                        params.fov_degrees.to_radians(),
                        aspect,
                        params.width,
                        params.height,
                        1e-4,
                        FLOAT_MAX,
                    );
                    self.scene.add_sensor(Box::new(camera));
                }
            }
            b"bsdf" => {
                self.scopes.pop();
                if let Some(params) = self.current_bsdf.take() {
                    let material: Arc<dyn BSDF> = match params.kind.as_str() {
                        "diffuse" => Arc::new(LambertianDiffuse::new(params.reflectance)),
                        "mirror" | "conductor" => Arc::new(Mirror::new(params.reflectance)),
                        other => {
                            return Err(SceneLoadError::Parse(
                                format!("unsupported bsdf type: {}", other)));
                        }
                    };
                    if self.scope() == Scope::Shape {
                        if let Some(shape) = self.current_shape.as_mut() {
                            shape.material = Some(material);
                        }
                    } else if let Some(id) = params.id {
                        self.materials.insert(id, material);
                    }
                }
            }
            b"emitter" => {
                let scope = self.scope();
                self.scopes.pop();
                if let Some(params) = self.current_emitter.take() {
                    if scope == Scope::ShapeEmitter {
                        if params.kind != "area" {
                            return Err(SceneLoadError::Parse(format!(
                                "unsupported shape emitter type: {}", params.kind)));
                        }
                        if let Some(shape) = self.current_shape.as_mut() {
                            shape.emission = params.radiance;
                        }
                    } else {
                        match params.kind.as_str() {
                            "constant" => self.scene.add_emitter(
                                Box::new(ConstantEmitter::new(params.radiance))),
                            "directional" => self.scene.add_emitter(
                                Box::new(DirectionalEmitter::new(
                                    params.direction, params.radiance))),
                            other => {
                                return Err(SceneLoadError::Parse(
                                    format!("unsupported emitter type: {}", other)));
                            }
                        }
                    }
                }
            }
            b"shape" => {
                self.scopes.pop();
                if let Some(params) = self.current_shape.take() {
                    if params.kind != "rectangle" {
                        return Err(SceneLoadError::Parse(
                            format!("unsupported shape type: {}", params.kind)));
                    }
                    let shape = Arc::new(Rectangle::new(params.to_world,
                                                        params.flip_normals));
                    let material = params.material.unwrap_or_else(|| {
                        Arc::new(LambertianDiffuse::new(RGBSpectrum::splat(0.5)))
                    });
                    self.scene.add_object(SceneObject::with_emission(
                        shape, material, params.emission));
                }
            }
            // leaf parameter tags never push a scope
            b"integer" | b"float" | b"boolean" | b"rgb" | b"point" | b"vector"
                | b"ref" | b"translate" | b"scale" => {}
            _ => {
                self.scopes.pop();
            }
        }
        Ok(())
    }

    fn set_integer(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let name = require_attr(e, "name")?;
        let value = require_attr(e, "value")?;
        let parsed: u32 = value.parse().map_err(|_| {
            SceneLoadError::Parse(format!("bad integer \"{}\" for {}", value, name))
        })?;

        match self.scope() {
            Scope::Integrator => {
                if let Some(params) = self.current_integrator.as_mut() {
                    match name.as_str() {
                        "max_depth" => params.max_depth = parsed,
                        "rr_depth" => params.rr_depth = parsed,
                        "sample_count" => params.sample_count = parsed,
                        _ => {}
                    }
                }
            }
            Scope::Film => {
                if let Some(params) = self.current_sensor.as_mut() {
                    match name.as_str() {
                        "width" => params.width = parsed as usize,
                        "height" => params.height = parsed as usize,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn set_float(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let name = require_attr(e, "name")?;
        let value = parse_float(&require_attr(e, "value")?)?;

        if self.scope() == Scope::Sensor && name == "fov" {
            if let Some(params) = self.current_sensor.as_mut() {
                params.fov_degrees = value;
            }
        }
        Ok(())
    }

    fn set_boolean(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let name = require_attr(e, "name")?;
        let value = require_attr(e, "value")?;
        let parsed = match value.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(SceneLoadError::Parse(
                    format!("bad boolean \"{}\" for {}", other, name)));
            }
        };

        match self.scope() {
            Scope::Integrator => {
                if let Some(params) = self.current_integrator.as_mut() {
                    match name.as_str() {
                        "terminate_on_emitter" => params.terminate_on_emitter = parsed,
                        "replay_eval" => params.replay_eval = parsed,
                        _ => {}
                    }
                }
            }
            Scope::Shape => {
                if name == "flip_normals" {
                    if let Some(params) = self.current_shape.as_mut() {
                        params.flip_normals = parsed;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn set_rgb(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let name = require_attr(e, "name")?;
        let value = parse_rgb(&require_attr(e, "value")?)?;

        match self.scope() {
            Scope::Bsdf => {
                if let Some(params) = self.current_bsdf.as_mut() {
                    if name == "reflectance" {
                        params.reflectance = value;
                    }
                }
            }
            Scope::ShapeEmitter | Scope::Emitter => {
                if let Some(params) = self.current_emitter.as_mut() {
                    if name == "radiance" || name == "irradiance" {
                        params.radiance = value;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn set_vector(&mut self, e: &BytesStart) -> Result<(), SceneLoadError> {
        let name = require_attr(e, "name")?;
        let value = read_xyz(e, 0.0)?;

        match self.scope() {
            Scope::Sensor => {
                if let Some(params) = self.current_sensor.as_mut() {
                    match name.as_str() {
                        "origin" => params.origin = value,
                        "target" => params.target = value,
                        "up" => params.up = value,
                        _ => {}
                    }
                }
            }
            Scope::Emitter => {
                if let Some(params) = self.current_emitter.as_mut() {
                    if name == "direction" {
                        params.direction = value;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(mut self, overrides: LoadOverrides) -> Result<SceneLoadResult, SceneLoadError> {
        let mut params = self.integrator
            .ok_or_else(|| SceneLoadError::MissingField(String::from("integrator")))?;
        if let Some(spp) = overrides.samples_per_pixel {
            params.sample_count = spp;
        }
        if let Some(max_depth) = overrides.max_depth {
            params.max_depth = max_depth;
        }

        let integrator: Box<dyn Integrator> = match params.kind.as_str() {
            "sample_solve" => {
                let config = SampleSolveConfig {
                    max_depth: params.max_depth,
                    rr_depth: params.rr_depth,
                    samples_per_pixel: params.sample_count,
                    terminate_on_emitter: params.terminate_on_emitter,
                    replay_eval: params.replay_eval,
                    ..SampleSolveConfig::default()
                };
                Box::new(SampleSolveIntegrator::new(config)?)
            }
            "path" => Box::new(PathIntegrator::new(
                params.max_depth, params.rr_depth, params.sample_count)?),
            other => {
                return Err(SceneLoadError::Parse(
                    format!("unsupported integrator type: {}", other)));
            }
        };

        self.scene.build_bvh();
        log::info!("Scene loaded: {} objects, {} emitters.",
                   self.scene.len(), self.scene.emitters().len());

        Ok(SceneLoadResult { scene: self.scene, integrator })
    }
}

fn attr(e: &BytesStart, name: &str) -> Result<Option<String>, SceneLoadError> {
    for a in e.attributes() {
        let a = a.map_err(|err| SceneLoadError::Parse(err.to_string()))?;
        if a.key.as_ref() == name.as_bytes() {
            let value = a.unescape_value()
                .map_err(|err| SceneLoadError::Parse(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn require_attr(e: &BytesStart, name: &str) -> Result<String, SceneLoadError> {
    attr(e, name)?.ok_or_else(|| {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        SceneLoadError::MissingField(format!("attribute \"{}\" on <{}>", name, tag))
    })
}

fn parse_float(value: &str) -> Result<Float, SceneLoadError> {
    value.trim().parse().map_err(|_| {
        SceneLoadError::Parse(format!("bad float \"{}\"", value))
    })
}

fn parse_rgb(value: &str) -> Result<RGBSpectrum, SceneLoadError> {
    let parts: Vec<&str> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    match parts.len() {
        1 => Ok(RGBSpectrum::splat(parse_float(parts[0])?)),
        3 => Ok(RGBSpectrum::new(parse_float(parts[0])?,
                                 parse_float(parts[1])?,
                                 parse_float(parts[2])?)),
        _ => Err(SceneLoadError::Parse(format!("bad rgb value \"{}\"", value))),
    }
}

fn read_xyz(e: &BytesStart, default: Float) -> Result<Vector3f, SceneLoadError> {
    let read = |name: &str| -> Result<Float, SceneLoadError> {
        match attr(e, name)? {
            Some(value) => parse_float(&value),
            None => Ok(default),
        }
    };
    Ok(Vector3f::new(read("x")?, read("y")?, read("z")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORNELL_LITE: &str = r#"
        <scene version="3.0.0">
            <integrator type="sample_solve">
                <integer name="max_depth" value="8"/>
                <integer name="rr_depth" value="3"/>
                <integer name="sample_count" value="4"/>
                <boolean name="terminate_on_emitter" value="true"/>
            </integrator>
            <sensor type="perspective">
                <float name="fov" value="39.3"/>
                <point name="origin" x="0" y="1" z="4"/>
                <point name="target" x="0" y="1" z="0"/>
                <vector name="up" x="0" y="1" z="0"/>
                <film type="hdrfilm">
                    <integer name="width" value="64"/>
                    <integer name="height" value="32"/>
                </film>
            </sensor>
            <bsdf type="diffuse" id="white">
                <rgb name="reflectance" value="0.7 0.7 0.7"/>
            </bsdf>
            <shape type="rectangle">
                <transform name="to_world">
                    <scale value="2"/>
                    <translate y="-1"/>
                </transform>
                <ref id="white"/>
            </shape>
            <shape type="rectangle">
                <transform name="to_world">
                    <scale x="0.5" y="0.5"/>
                    <translate y="1.99"/>
                </transform>
                <boolean name="flip_normals" value="true"/>
                <ref id="white"/>
                <emitter type="area">
                    <rgb name="radiance" value="10 10 8"/>
                </emitter>
            </shape>
            <emitter type="constant">
                <rgb name="radiance" value="0.1"/>
            </emitter>
        </scene>
    "#;

    #[test]
    fn test_load_full_scene() {
        let result = load_scene_from_str(CORNELL_LITE).expect("scene should load");
        assert_eq!(result.scene.len(), 2);
        // one area emitter from the light panel plus the constant emitter
        assert_eq!(result.scene.emitters().len(), 2);
        assert!(result.scene.camera(0).is_some());
        assert_eq!(result.scene.camera(0).unwrap().bitmap().width(), 64);
        assert_eq!(result.integrator.samples_per_pixel(), 4);
    }

    #[test]
    fn test_load_path_integrator() {
        let xml = r#"
            <scene version="3.0.0">
                <integrator type="path">
                    <integer name="max_depth" value="5"/>
                    <integer name="rr_depth" value="5"/>
                    <integer name="sample_count" value="2"/>
                </integrator>
            </scene>
        "#;
        let result = load_scene_from_str(xml).expect("scene should load");
        assert_eq!(result.integrator.samples_per_pixel(), 2);
    }

    #[test]
    fn test_missing_integrator_is_an_error() {
        let err = load_scene_from_str("<scene version=\"3.0.0\"></scene>").unwrap_err();
        match err {
            SceneLoadError::MissingField(name) => assert!(name.contains("integrator")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_invalid_integrator_config_is_an_error() {
        let xml = r#"
            <scene version="3.0.0">
                <integrator type="sample_solve">
                    <integer name="max_depth" value="0"/>
                    <integer name="rr_depth" value="0"/>
                </integrator>
            </scene>
        "#;
        match load_scene_from_str(xml).unwrap_err() {
            SceneLoadError::Config(ConfigError::ZeroMaxDepth) => {}
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unknown_bsdf_ref_is_an_error() {
        let xml = r#"
            <scene version="3.0.0">
                <integrator type="path"/>
                <shape type="rectangle">
                    <ref id="missing"/>
                </shape>
            </scene>
        "#;
        match load_scene_from_str(xml).unwrap_err() {
            SceneLoadError::MissingField(name) => assert!(name.contains("missing")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unsupported_shape_is_an_error() {
        let xml = r#"
            <scene version="3.0.0">
                <integrator type="path"/>
                <shape type="sphere"/>
            </scene>
        "#;
        match load_scene_from_str(xml).unwrap_err() {
            SceneLoadError::Parse(msg) => assert!(msg.contains("sphere")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
