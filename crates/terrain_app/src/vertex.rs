//! Interleaved vertex layout for uploading terrain to a GPU buffer.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use procgen::TerrainMesh;

/// Terrain vertex with position, normal and UV coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl TerrainVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Pack one vertex per grid vertex, in the mesh's row-major order.
pub fn interleave(mesh: &TerrainMesh, normals: &[Vec3]) -> Vec<TerrainVertex> {
    mesh.positions
        .iter()
        .zip(normals)
        .zip(&mesh.uvs)
        .map(|((p, n), uv)| TerrainVertex::new(p.to_array(), n.to_array(), uv.to_array()))
        .collect()
}
