//! Smooth vertex normals for a finished terrain mesh (the consumer's half of the contract).

use glam::Vec3;

/// Accumulate face normals over the index buffer and normalize per vertex.
///
/// Face normals are left unnormalized before accumulation, so larger triangles weigh more.
/// Vertices no triangle references get +Y.
pub fn recalculate_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let v0 = positions[i0];
        let v1 = positions[i1];
        let v2 = positions[i2];

        let n = (v1 - v0).cross(v2 - v0);
        normals[i0] += n;
        normals[i1] += n;
        normals[i2] += n;
    }

    for n in &mut normals {
        *n = n.try_normalize().unwrap_or(Vec3::Y);
    }
    normals
}
