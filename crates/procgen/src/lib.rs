//! Procedural terrain meshes: noise-displaced grids with UVs and a fixed triangle winding.

pub mod error;
pub mod generator;
pub mod noise_oracle;
pub mod staggered;
pub mod terrain;

pub use error::*;
pub use generator::*;
pub use noise_oracle::*;
pub use staggered::*;
pub use terrain::*;

// Re-export the math types the mesh buffers are made of
pub use glam::{Vec2, Vec3};
