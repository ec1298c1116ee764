//! Height-field oracles consumed by the terrain builder.
//!
//! The builder only needs "one scalar per 2D coordinate". Any `Fn(f64, f64) -> f64` works,
//! and [`FractalNoise`] wraps the `noise` crate behind a serializable [`NoiseSettings`].

use noise::{
    Billow, Fbm, MultiFractal, NoiseFn, OpenSimplex, Perlin, RidgedMulti, Seedable, Simplex, Value,
};
use serde::{Deserialize, Serialize};

use crate::error::OracleError;

/// Deterministic, side-effect free height source.
pub trait NoiseOracle {
    /// Sample the field at `(x, z)`. Must return the same value for the same input.
    fn sample(&self, x: f64, z: f64) -> Result<f64, OracleError>;
}

impl<F> NoiseOracle for F
where
    F: Fn(f64, f64) -> f64,
{
    #[inline]
    fn sample(&self, x: f64, z: f64) -> Result<f64, OracleError> {
        Ok(self(x, z))
    }
}

/// Base gradient/value noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseType {
    Perlin,
    Simplex,
    #[default]
    OpenSimplex,
    Value,
}

/// Octave combination applied on top of the base noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FractalType {
    /// Single octave of the base noise.
    #[default]
    None,
    Fbm,
    Ridged,
    Billow,
}

/// Upper bound on octaves accepted by the `noise` crate's fractal generators.
pub const MAX_OCTAVES: usize = 32;

/// Parameters for [`FractalNoise`]. Loaded from RON alongside the terrain settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    pub seed: u32,
    pub noise_type: NoiseType,
    /// Input scale (lower = smoother).
    pub frequency: f64,
    pub fractal: FractalType,
    /// Number of octaves for fractal noise. Clamped to `1..=MAX_OCTAVES`.
    pub octaves: usize,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            seed: 1337,
            noise_type: NoiseType::OpenSimplex,
            frequency: 0.01,
            fractal: FractalType::None,
            octaves: 3,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

type BoxedSource = Box<dyn NoiseFn<f64, 2> + Send + Sync>;

/// Noise oracle backed by the `noise` crate. Output is roughly in `[-1, 1]`.
pub struct FractalNoise {
    settings: NoiseSettings,
    source: BoxedSource,
}

impl FractalNoise {
    pub fn new(settings: &NoiseSettings) -> Self {
        let source = match settings.noise_type {
            NoiseType::Perlin => fractal_source::<Perlin>(settings),
            NoiseType::Simplex => fractal_source::<Simplex>(settings),
            NoiseType::OpenSimplex => fractal_source::<OpenSimplex>(settings),
            NoiseType::Value => fractal_source::<Value>(settings),
        };
        Self {
            settings: settings.clone(),
            source,
        }
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }
}

impl std::fmt::Debug for FractalNoise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FractalNoise")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl NoiseOracle for FractalNoise {
    fn sample(&self, x: f64, z: f64) -> Result<f64, OracleError> {
        let frequency = self.settings.frequency;
        let value = self.source.get([x * frequency, z * frequency]);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(OracleError::NonFinite { value })
        }
    }
}

/// Frequency is applied by the caller, so every fractal runs at a base frequency of 1.
fn fractal_source<T>(settings: &NoiseSettings) -> BoxedSource
where
    T: Default + Seedable + NoiseFn<f64, 2> + Send + Sync + 'static,
{
    let octaves = settings.octaves.clamp(1, MAX_OCTAVES);
    match settings.fractal {
        FractalType::None => Box::new(T::default().set_seed(settings.seed)),
        FractalType::Fbm => Box::new(
            Fbm::<T>::new(settings.seed)
                .set_octaves(octaves)
                .set_frequency(1.0)
                .set_lacunarity(settings.lacunarity)
                .set_persistence(settings.persistence),
        ),
        FractalType::Ridged => Box::new(
            RidgedMulti::<T>::new(settings.seed)
                .set_octaves(octaves)
                .set_frequency(1.0)
                .set_lacunarity(settings.lacunarity)
                .set_persistence(settings.persistence),
        ),
        FractalType::Billow => Box::new(
            Billow::<T>::new(settings.seed)
                .set_octaves(octaves)
                .set_frequency(1.0)
                .set_lacunarity(settings.lacunarity)
                .set_persistence(settings.persistence),
        ),
    }
}
