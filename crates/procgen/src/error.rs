//! Errors raised while building terrain meshes.

use thiserror::Error;

/// Failure reported by a [`NoiseOracle`](crate::NoiseOracle) for a single sample.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OracleError {
    #[error("noise sample is not finite ({value})")]
    NonFinite { value: f64 },
    /// Finite sample whose scaled height does not fit an `f32`.
    #[error("noise sample {value} is out of the representable height range")]
    OutOfRange { value: f64 },
    #[error("noise oracle unavailable: {0}")]
    Unavailable(String),
}

/// Reasons a terrain build is rejected. A failed build never produces a partial mesh.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Width or depth is zero, or the vertex grid does not fit a `u32` index buffer.
    #[error("invalid terrain dimensions {width}x{depth}")]
    InvalidDimension { width: u32, depth: u32 },
    #[error("{name} must be finite, got {value}")]
    InvalidScale { name: &'static str, value: f32 },
    #[error("noise oracle failed at grid ({x}, {z})")]
    OracleFailure {
        x: u32,
        z: u32,
        #[source]
        source: OracleError,
    },
}
