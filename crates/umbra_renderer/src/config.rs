//! Render configuration.
//!
//! Everything a render needs besides the scene and camera: sample count,
//! tile size, seed, Russian roulette, tolerance and the two global model
//! switches. Loadable from JSON through serde; missing fields take defaults.

use crate::error::{RenderError, RenderResult};
use crate::Distribution;
use serde::{Deserialize, Serialize};

/// How direct lighting is estimated at each path vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingStrategy {
    /// Next-event estimation and BRDF sampling combined with the balance
    /// heuristic, each contribution scaled by 0.5.
    #[default]
    Mis,
    /// Only explicit light samples contribute; lights hit by BRDF-sampled
    /// rays are ignored.
    NextEventOnly,
    /// Only lights hit by BRDF-sampled rays contribute.
    BrdfOnly,
}

impl LightingStrategy {
    /// Constant factor applied to every lighting contribution.
    pub fn split(self) -> f32 {
        match self {
            LightingStrategy::Mis => 0.5,
            LightingStrategy::NextEventOnly | LightingStrategy::BrdfOnly => 1.0,
        }
    }

    pub fn uses_light_sampling(self) -> bool {
        !matches!(self, LightingStrategy::BrdfOnly)
    }

    pub fn uses_brdf_hits(self) -> bool {
        !matches!(self, LightingStrategy::NextEventOnly)
    }
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Number of passes; each pass adds one sample to every pixel
    pub passes: u32,
    /// Bucket edge length in pixels
    pub bucket_size: u32,
    /// Base seed for the per-bucket generators
    pub seed: u64,
    /// Russian roulette continuation probability
    pub russian_roulette: f32,
    /// Intersection and pdf tolerance
    pub epsilon: f32,
    /// Microfacet model used by every material
    pub distribution: Distribution,
    pub strategy: LightingStrategy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            passes: 16,
            bucket_size: 32,
            seed: 0,
            russian_roulette: 0.8,
            epsilon: 1e-4,
            distribution: Distribution::Beckmann,
            strategy: LightingStrategy::Mis,
        }
    }
}

impl RenderConfig {
    /// Reject settings the integrator cannot work with.
    pub fn validate(&self) -> RenderResult<()> {
        if !(0.0..=1.0).contains(&self.russian_roulette) {
            return Err(RenderError::InvalidConfig(format!(
                "russian_roulette must be in [0, 1], got {}",
                self.russian_roulette
            )));
        }
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(RenderError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.bucket_size == 0 {
            return Err(RenderError::InvalidConfig("bucket_size must be non-zero".into()));
        }
        Ok(())
    }
}
