//! Error types for scene construction and rendering.

use thiserror::Error;

/// Errors raised while assembling a scene.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("environment map has {actual} floats, expected {expected} (width * height * 3)")]
    EnvironmentSize { expected: usize, actual: usize },

    #[error("environment map dimensions must be non-zero, got {width}x{height}")]
    EnvironmentDimensions { width: usize, height: usize },

    #[error("scene contains more than one environment light")]
    MultipleEnvironments,

    #[error("invalid material: {0}")]
    InvalidMaterial(String),
}

/// Errors raised by the frame driver before any pixel is traced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("scene has no samplable lights; explicit light sampling needs at least one")]
    NoLights,

    #[error("image has zero width or height")]
    EmptyImage,

    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub type SceneResult<T> = Result<T, SceneError>;
pub type RenderResult<T> = Result<T, RenderError>;
