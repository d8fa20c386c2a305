//! Shader program interface: what each stage declares and how the two link.
//!
//! The stages themselves are Rust functions ([`super::vertex`] and
//! [`super::shader`]); a [`ProgramSource`] describes the attributes and
//! uniforms they consume so the frame driver can bind every value by name and
//! a mismatch is caught once, before the first frame, instead of silently
//! rendering with a missing input.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, error};

use super::params::{param_specs, ParamValue, ParameterSet, IMAGE_SCALE};
use super::shader::Uniforms;
use crate::error::ShaderError;

pub const A_POSITION: &str = "a_position";
pub const A_TEX_COORD: &str = "a_tex_coord";
pub const U_TIME: &str = "u_time";
pub const U_GLITCH_INTENSITY: &str = "u_glitch_intensity";
pub const U_RESOLUTION: &str = "u_resolution";
pub const U_IMAGE_SIZE: &str = "u_image_size";
pub const U_TEXTURE: &str = "u_texture";

/// Declared inputs of one pipeline stage
#[derive(Debug, Clone, Default)]
pub struct StageSource {
    pub attributes: Vec<String>,
    pub uniforms: Vec<String>,
}

impl StageSource {
    pub fn new<A, U>(attributes: A, uniforms: U) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        U: IntoIterator,
        U::Item: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(Into::into).collect(),
            uniforms: uniforms.into_iter().map(Into::into).collect(),
        }
    }

    fn compile(&self, stage: &str) -> Result<(), ShaderError> {
        let mut log = Vec::new();

        if self.attributes.is_empty() && self.uniforms.is_empty() {
            log.push("stage declares no inputs".to_string());
        }

        let mut seen = BTreeSet::new();
        for name in self.attributes.iter().chain(&self.uniforms) {
            if name.trim().is_empty() {
                log.push("empty identifier".to_string());
            } else if !seen.insert(name.as_str()) {
                log.push(format!("redeclaration of '{}'", name));
            }
        }

        if log.is_empty() {
            debug!("{} stage compiled ({} attributes, {} uniforms)",
                   stage, self.attributes.len(), self.uniforms.len());
            Ok(())
        } else {
            Err(ShaderError::CompileFailed { stage: stage.to_string(), log: log.join("\n") })
        }
    }
}

/// Vertex and fragment stage declarations
#[derive(Debug, Clone)]
pub struct ProgramSource {
    pub vertex: StageSource,
    pub fragment: StageSource,
}

impl Default for ProgramSource {
    fn default() -> Self {
        let vertex = StageSource::new(
            [A_POSITION, A_TEX_COORD],
            [U_RESOLUTION.to_string(), U_IMAGE_SIZE.to_string(), uniform_name(IMAGE_SCALE)],
        );

        let mut fragment_uniforms = vec![
            U_TEXTURE.to_string(),
            U_TIME.to_string(),
            U_GLITCH_INTENSITY.to_string(),
        ];
        fragment_uniforms.extend(
            param_specs()
                .iter()
                .filter(|spec| spec.name != IMAGE_SCALE)
                .map(|spec| uniform_name(spec.name)),
        );

        Self { vertex, fragment: StageSource::new(Vec::<String>::new(), fragment_uniforms) }
    }
}

/// Uniform name a parameter is bound to (`scanline_speed` -> `u_scanline_speed`)
pub fn uniform_name(param: &str) -> String {
    format!("u_{}", param)
}

/// Every uniform the pipeline expects to be able to bind
pub fn required_uniforms() -> BTreeSet<String> {
    let mut names: BTreeSet<String> = [U_TIME, U_GLITCH_INTENSITY, U_RESOLUTION, U_IMAGE_SIZE, U_TEXTURE]
        .iter()
        .map(|s| s.to_string())
        .collect();
    names.extend(param_specs().iter().map(|spec| uniform_name(spec.name)));
    names
}

/// Index of a bound uniform within a linked program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(usize);

/// A compiled and linked program
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    locations: HashMap<String, UniformLocation>,
    attributes: Vec<String>,
}

impl ShaderProgram {
    /// Compile both stages and link them.
    pub fn build(source: &ProgramSource) -> Result<Self, ShaderError> {
        let compiled = source
            .vertex
            .compile("vertex")
            .and_then(|_| source.fragment.compile("fragment"));
        if let Err(e) = compiled {
            error!("Shader compile error: {}", e);
            return Err(e);
        }

        let program = Self::link(source).map_err(|e| {
            error!("Shader program failed to link: {}", e);
            e
        })?;

        debug!("Shader program linked ({} uniforms)", program.locations.len());
        Ok(program)
    }

    fn link(source: &ProgramSource) -> Result<Self, ShaderError> {
        let mut log = Vec::new();

        for attribute in [A_POSITION, A_TEX_COORD] {
            if !source.vertex.attributes.iter().any(|a| a == attribute) {
                log.push(format!("vertex stage does not declare attribute '{}'", attribute));
            }
        }
        if !source.fragment.attributes.is_empty() {
            log.push("fragment stage cannot declare attributes".to_string());
        }

        let required = required_uniforms();
        let mut declared = BTreeSet::new();
        for name in source.vertex.uniforms.iter().chain(&source.fragment.uniforms) {
            declared.insert(name.clone());
        }

        for missing in required.difference(&declared) {
            log.push(format!("uniform '{}' is not declared by any stage", missing));
        }
        for unknown in declared.difference(&required) {
            log.push(format!("uniform '{}' has no value source", unknown));
        }

        if !log.is_empty() {
            return Err(ShaderError::LinkFailed { log: log.join("\n") });
        }

        let locations = required
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, UniformLocation(i)))
            .collect();

        Ok(Self { locations, attributes: source.vertex.attributes.clone() })
    }

    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.locations.get(name).copied()
    }

    pub fn attribute_location(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a == name)
    }

    pub fn uniform_count(&self) -> usize {
        self.locations.len()
    }

    /// Bind this frame's values to every uniform location.
    ///
    /// Built-in uniforms come from `uniforms`, tunables from `params` by name.
    pub fn bind(&self, uniforms: &Uniforms, params: &ParameterSet) -> BoundUniforms {
        let mut slots = vec![None; self.locations.len()];
        let mut put = |name: &str, value: UniformValue| {
            if let Some(UniformLocation(i)) = self.uniform_location(name) {
                slots[i] = Some(value);
            }
        };

        put(U_TIME, UniformValue::Float(uniforms.time));
        put(U_GLITCH_INTENSITY, UniformValue::Float(uniforms.glitch_intensity));
        put(U_RESOLUTION, UniformValue::Vec2(uniforms.resolution));
        put(U_IMAGE_SIZE, UniformValue::Vec2(uniforms.image_size));
        put(U_TEXTURE, UniformValue::Sampler(0));

        for (name, value) in params.iter() {
            let value = match value {
                ParamValue::Float(v) => UniformValue::Float(v),
                ParamValue::Bool(b) => UniformValue::Bool(b),
            };
            put(&uniform_name(name), value);
        }

        BoundUniforms { slots }
    }
}

/// A value pushed to one uniform slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Bool(bool),
    /// Texture unit
    Sampler(u32),
}

/// Values bound for one draw, indexed by [`UniformLocation`]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundUniforms {
    slots: Vec<Option<UniformValue>>,
}

impl BoundUniforms {
    pub fn get(&self, location: UniformLocation) -> Option<UniformValue> {
        self.slots.get(location.0).copied().flatten()
    }

    /// Whether every declared uniform received a value
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }
}
