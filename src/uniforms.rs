//! Named shader uniforms.
//!
//! Uniforms are addressed by the qualified names a GLSL-style shader would
//! declare (`"material.glossiness"`, `"pointLights[2].specular"`). Sinks either
//! record them (headless runs, tests) or pack them into a std140 uniform block
//! that is uploaded to the GPU.

use std::collections::{BTreeSet, HashMap};

use bytemuck::Pod;
use glam::{Mat4, Vec3};

use crate::error::UniformError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn as_float(&self, name: &str) -> Result<f32, UniformError> {
        match self {
            Self::Float(value) => Ok(*value),
            _ => Err(mismatch(name, "float")),
        }
    }

    pub fn as_int(&self, name: &str) -> Result<i32, UniformError> {
        match self {
            Self::Int(value) => Ok(*value),
            _ => Err(mismatch(name, "int")),
        }
    }

    pub fn as_vec3(&self, name: &str) -> Result<[f32; 3], UniformError> {
        match self {
            Self::Vec3(value) => Ok(value.to_array()),
            _ => Err(mismatch(name, "vec3")),
        }
    }

    pub fn as_mat4(&self, name: &str) -> Result<[[f32; 4]; 4], UniformError> {
        match self {
            Self::Mat4(value) => Ok(value.to_cols_array_2d()),
            _ => Err(mismatch(name, "mat4")),
        }
    }
}

fn mismatch(name: &str, expected: &'static str) -> UniformError {
    UniformError::KindMismatch {
        name: name.to_string(),
        expected,
    }
}

/// Anything that accepts named uniform values.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Field(&'a str),
    Index(usize),
}

/// Parsed form of a dot/bracket qualified uniform name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformPath<'a> {
    name: &'a str,
    segments: Vec<PathSegment<'a>>,
}

impl<'a> UniformPath<'a> {
    pub fn parse(name: &'a str) -> Result<Self, UniformError> {
        let malformed = || UniformError::MalformedName(name.to_string());
        let mut segments = Vec::new();
        for part in name.split('.') {
            let (field, rest) = match part.find('[') {
                Some(open) => part.split_at(open),
                None => (part, ""),
            };
            if !is_identifier(field) {
                return Err(malformed());
            }
            segments.push(PathSegment::Field(field));

            let mut rest = rest;
            while !rest.is_empty() {
                let inner = rest.strip_prefix('[').ok_or_else(malformed)?;
                let close = inner.find(']').ok_or_else(malformed)?;
                let index = inner[..close].parse::<usize>().map_err(|_| malformed())?;
                segments.push(PathSegment::Index(index));
                rest = &inner[close + 1..];
            }
        }
        Ok(Self { name, segments })
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn segments(&self) -> &[PathSegment<'a>] {
        &self.segments
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

/// A GPU uniform block that knows how to store named uniforms in its fields.
pub trait UniformBlock: Pod {
    const LABEL: &'static str;

    fn apply(&mut self, path: &UniformPath<'_>, value: UniformValue) -> Result<(), UniformError>;

    fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let path = UniformPath::parse(name)?;
        self.apply(&path, value)
    }
}

/// Sink that remembers every uniform it receives, in order.
#[derive(Clone, Debug, Default)]
pub struct UniformRecorder {
    log: Vec<(String, UniformValue)>,
    latest: HashMap<String, UniformValue>,
}

impl UniformRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.latest.get(name).copied()
    }

    pub fn log(&self) -> &[(String, UniformValue)] {
        &self.log
    }

    /// Forgets the ordered log but keeps the latest values.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Distinct array indices written under the top-level field `array`
    /// since the log was last cleared.
    pub fn indices_of(&self, array: &str) -> BTreeSet<usize> {
        self.log
            .iter()
            .filter_map(|(name, _)| UniformPath::parse(name).ok())
            .filter_map(|path| match path.segments() {
                [PathSegment::Field(field), PathSegment::Index(index), ..] if *field == array => {
                    Some(*index)
                }
                _ => None,
            })
            .collect()
    }
}

impl UniformSink for UniformRecorder {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.log.push((name.to_string(), value));
        self.latest.insert(name.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_qualified_names() {
        let path = UniformPath::parse("pointLights[2].specular").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("pointLights"),
                PathSegment::Index(2),
                PathSegment::Field("specular"),
            ]
        );

        let path = UniformPath::parse("viewPos").unwrap();
        assert_eq!(path.segments(), &[PathSegment::Field("viewPos")]);
    }

    #[test]
    fn rejects_malformed_names() {
        for name in ["", "a..b", "lights[", "lights[x]", "lights]2[", "9lives", "a[1]b"] {
            assert!(
                matches!(UniformPath::parse(name), Err(UniformError::MalformedName(_))),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn value_kinds_are_checked() {
        let value = UniformValue::Float(1.0);
        assert_eq!(value.as_float("x"), Ok(1.0));
        assert_eq!(
            value.as_int("x"),
            Err(UniformError::KindMismatch {
                name: "x".into(),
                expected: "int"
            })
        );
    }

    #[test]
    fn recorder_tracks_latest_and_indices() {
        let mut recorder = UniformRecorder::new();
        recorder.set_float("pointLights[0].constant", 1.0);
        recorder.set_float("pointLights[3].constant", 1.0);
        recorder.set_int("material.diffuse", 0);
        recorder.set_int("material.diffuse", 2);

        assert_eq!(recorder.get("material.diffuse"), Some(UniformValue::Int(2)));
        assert_eq!(recorder.log().len(), 4);
        assert_eq!(
            recorder.indices_of("pointLights").into_iter().collect::<Vec<_>>(),
            vec![0, 3]
        );

        recorder.clear_log();
        assert!(recorder.indices_of("pointLights").is_empty());
        assert!(recorder.get("pointLights[3].constant").is_some());
    }
}
