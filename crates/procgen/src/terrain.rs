//! Grid terrain mesh construction.
//!
//! A `width x depth` grid of quads becomes `(width+1) x (depth+1)` vertices laid out row-major
//! (`index = z * (width + 1) + x`). Positions, UVs and triangle indices all address vertices
//! through that one layout, so every grid vertex is shared by its neighbouring cells purely
//! through index reuse.
//!
//! The build is a single synchronous call: a mesh is either returned whole or not at all.

use std::ops::Range;

use glam::{Vec2, Vec3};

use crate::error::{MeshError, OracleError};
use crate::noise_oracle::NoiseOracle;

/// Default amplitude applied to raw oracle samples.
pub const DEFAULT_HEIGHT_SCALE: f32 = 2.0;

/// Indices emitted per grid cell (two triangles).
pub const INDICES_PER_CELL: usize = 6;

/// Renderable terrain: three parallel buffers plus the grid they were built from.
///
/// Normals are left to the consumer since they depend on render-backend conventions.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    pub width: u32,
    pub depth: u32,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub uvs: Vec<Vec2>,
}

impl TerrainMesh {
    /// Row-major flat index of grid vertex `(x, z)`.
    #[inline]
    pub fn vertex_index(&self, x: u32, z: u32) -> usize {
        vertex_index(self.width, x, z)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.depth as usize
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The two triangles of cell `(x, z)`: `(bl, tl, tr)` then `(bl, tr, br)`.
    /// `None` outside `[0, width) x [0, depth)`.
    pub fn cell_triangles(&self, x: u32, z: u32) -> Option<[[u32; 3]; 2]> {
        if x >= self.width || z >= self.depth {
            return None;
        }
        let offset = (z as usize * self.width as usize + x as usize) * INDICES_PER_CELL;
        let t = self.indices.get(offset..offset + INDICES_PER_CELL)?;
        Some([[t[0], t[1], t[2]], [t[3], t[4], t[5]]])
    }

    /// Height of grid vertex `(x, z)`. `None` outside `[0, width] x [0, depth]`.
    pub fn height_at(&self, x: u32, z: u32) -> Option<f32> {
        if x > self.width || z > self.depth {
            return None;
        }
        self.positions.get(self.vertex_index(x, z)).map(|p| p.y)
    }

    /// Lowest and highest vertex heights.
    pub fn height_range(&self) -> (f32, f32) {
        self.positions
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.y), hi.max(p.y))
            })
    }

    /// Raw position bytes, ready for a vertex buffer upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Hand the buffers over to the consumer as `(positions, indices, uvs)`.
    pub fn into_parts(self) -> (Vec<Vec3>, Vec<u32>, Vec<Vec2>) {
        (self.positions, self.indices, self.uvs)
    }
}

#[inline]
fn vertex_index(width: u32, x: u32, z: u32) -> usize {
    z as usize * (width as usize + 1) + x as usize
}

/// Builds [`TerrainMesh`]es from a grid size and a [`NoiseOracle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainMeshBuilder {
    /// Multiplier applied to each oracle sample to get the vertex height.
    pub height_scale: f32,
    /// Multiplier applied to the `[0, 1]` UV fractions (> 1 tiles the texture).
    pub uv_scale: f32,
}

impl Default for TerrainMeshBuilder {
    fn default() -> Self {
        Self {
            height_scale: DEFAULT_HEIGHT_SCALE,
            uv_scale: 1.0,
        }
    }
}

impl TerrainMeshBuilder {
    pub fn new(height_scale: f32, uv_scale: f32) -> Self {
        Self {
            height_scale,
            uv_scale,
        }
    }

    /// Build the full mesh. Nothing is allocated until the inputs have been validated, and an
    /// oracle failure discards everything generated so far.
    pub fn build<N>(&self, width: u32, depth: u32, noise: &N) -> Result<TerrainMesh, MeshError>
    where
        N: NoiseOracle + ?Sized,
    {
        self.validate(width, depth)?;
        log::debug!("Building {}x{} terrain mesh", width, depth);

        let uvs = self.generate_uvs(width, depth);
        let positions = self.generate_positions(width, depth, noise)?;

        let cells = width as usize * depth as usize;
        let mut indices = Vec::with_capacity(cells * INDICES_PER_CELL);
        triangulate_cells(width, depth, 0..cells, &mut indices);

        log::debug!(
            "Built terrain mesh: {} vertices, {} triangles",
            positions.len(),
            indices.len() / 3
        );

        Ok(TerrainMesh {
            width,
            depth,
            positions,
            indices,
            uvs,
        })
    }

    /// Reject grids that are empty or whose vertices cannot be addressed by `u32` indices,
    /// and scales that would poison every vertex.
    pub fn validate(&self, width: u32, depth: u32) -> Result<(), MeshError> {
        let vertex_count = (width as u64 + 1) * (depth as u64 + 1);
        if width == 0 || depth == 0 || vertex_count > u32::MAX as u64 {
            return Err(MeshError::InvalidDimension { width, depth });
        }
        if !self.height_scale.is_finite() {
            return Err(MeshError::InvalidScale {
                name: "height_scale",
                value: self.height_scale,
            });
        }
        if !self.uv_scale.is_finite() {
            return Err(MeshError::InvalidScale {
                name: "uv_scale",
                value: self.uv_scale,
            });
        }
        Ok(())
    }

    /// Vertex pass: `(x, noise(x, z) * height_scale, z)` for every grid vertex, row-major.
    ///
    /// Assumes `validate` has passed.
    pub fn generate_positions<N>(
        &self,
        width: u32,
        depth: u32,
        noise: &N,
    ) -> Result<Vec<Vec3>, MeshError>
    where
        N: NoiseOracle + ?Sized,
    {
        let mut positions = Vec::with_capacity((width as usize + 1) * (depth as usize + 1));
        for z in 0..=depth {
            for x in 0..=width {
                let sample = noise
                    .sample(x as f64, z as f64)
                    .map_err(|source| MeshError::OracleFailure { x, z, source })?;
                let height = sample as f32 * self.height_scale;
                if !sample.is_finite() {
                    return Err(MeshError::OracleFailure {
                        x,
                        z,
                        source: OracleError::NonFinite { value: sample },
                    });
                }
                if !height.is_finite() {
                    return Err(MeshError::OracleFailure {
                        x,
                        z,
                        source: OracleError::OutOfRange { value: sample },
                    });
                }
                positions.push(Vec3::new(x as f32, height, z as f32));
            }
        }
        Ok(positions)
    }

    /// UV pass: `(x / width, z / depth) * uv_scale`. Independent of heights.
    pub fn generate_uvs(&self, width: u32, depth: u32) -> Vec<Vec2> {
        let mut uvs = Vec::with_capacity((width as usize + 1) * (depth as usize + 1));
        for z in 0..=depth {
            for x in 0..=width {
                let uv = Vec2::new(x as f32 / width as f32, z as f32 / depth as f32);
                uvs.push(uv * self.uv_scale);
            }
        }
        uvs
    }
}

/// Append the six indices of each flat cell `c = z * width + x` in `cells`, in order.
///
/// For cell `(x, z)` with corners `bl = (x, z)`, `tl = (x, z+1)`, `tr = (x+1, z+1)` and
/// `br = (x+1, z)` the triangles are `(bl, tl, tr)` then `(bl, tr, br)`. This winding is what
/// makes the surface face +Y; do not reorder it.
pub fn triangulate_cells(width: u32, depth: u32, cells: Range<usize>, out: &mut Vec<u32>) {
    let w = width as usize;
    let end = cells.end.min(w * depth as usize);
    out.reserve(end.saturating_sub(cells.start) * INDICES_PER_CELL);

    for cell in cells.start..end {
        let x = (cell % w) as u32;
        let z = (cell / w) as u32;

        let bl = vertex_index(width, x, z) as u32;
        let tl = vertex_index(width, x, z + 1) as u32;
        let tr = tl + 1;
        let br = bl + 1;

        out.extend_from_slice(&[bl, tl, tr, bl, tr, br]);
    }
}

/// Build with the default height scale. Returns `(positions, indices, uvs)`.
pub fn build_terrain_mesh<N>(
    width: u32,
    depth: u32,
    noise: &N,
    uv_scale: f32,
) -> Result<(Vec<Vec3>, Vec<u32>, Vec<Vec2>), MeshError>
where
    N: NoiseOracle + ?Sized,
{
    let builder = TerrainMeshBuilder {
        uv_scale,
        ..Default::default()
    };
    Ok(builder.build(width, depth, noise)?.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise_oracle::{FractalNoise, FractalType, NoiseSettings};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::cell::Cell;

    fn flat(_x: f64, _z: f64) -> f64 {
        0.0
    }

    fn wavy(x: f64, z: f64) -> f64 {
        (x * 0.7).sin() * (z * 0.3).cos()
    }

    /// A handful of reproducible grid sizes, including the 1-wide strips.
    fn grid_sizes() -> Vec<(u32, u32)> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut sizes = vec![(1, 1), (1, 7), (9, 1), (2, 1)];
        sizes.extend((0..12).map(|_| (rng.gen_range(1..40), rng.gen_range(1..40))));
        sizes
    }

    #[test]
    fn two_by_one_flat_grid() {
        let (positions, indices, uvs) = build_terrain_mesh(2, 1, &flat, 1.0).unwrap();

        let expected_positions: Vec<Vec3> = [
            (0.0, 0.0),
            (1.0, 0.0),
            (2.0, 0.0),
            (0.0, 1.0),
            (1.0, 1.0),
            (2.0, 1.0),
        ]
        .iter()
        .map(|&(x, z)| Vec3::new(x, 0.0, z))
        .collect();
        assert_eq!(positions, expected_positions);

        assert_eq!(indices, vec![0, 3, 4, 0, 4, 1, 1, 4, 5, 1, 5, 2]);

        let expected_uvs = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.5, 1.0),
            Vec2::new(1.0, 1.0),
        ];
        assert_eq!(uvs, expected_uvs);
    }

    #[test]
    fn buffer_lengths_match_grid() {
        let builder = TerrainMeshBuilder::default();
        for (w, d) in grid_sizes() {
            let mesh = builder.build(w, d, &wavy).unwrap();
            let (w, d) = (w as usize, d as usize);
            assert_eq!(mesh.positions.len(), (w + 1) * (d + 1));
            assert_eq!(mesh.indices.len(), w * d * 6);
            assert_eq!(mesh.uvs.len(), mesh.positions.len());
            assert_eq!(mesh.triangle_count(), w * d * 2);
        }
    }

    #[test]
    fn noise_only_moves_height() {
        let builder = TerrainMeshBuilder::default();
        for (w, d) in grid_sizes() {
            let mesh = builder.build(w, d, &wavy).unwrap();
            for z in 0..=d {
                for x in 0..=w {
                    let p = mesh.positions[mesh.vertex_index(x, z)];
                    assert_eq!(p.x, x as f32);
                    assert_eq!(p.z, z as f32);
                    assert_eq!(p.y, wavy(x as f64, z as f64) as f32 * DEFAULT_HEIGHT_SCALE);
                }
            }
        }
    }

    #[test]
    fn height_scale_multiplies_samples() {
        let builder = TerrainMeshBuilder::new(5.0, 1.0);
        let mesh = builder.build(3, 3, &|_x: f64, _z: f64| 0.5).unwrap();
        assert!(mesh.positions.iter().all(|p| p.y == 2.5));
        assert_eq!(mesh.height_range(), (2.5, 2.5));
    }

    #[test]
    fn indices_stay_in_range() {
        let builder = TerrainMeshBuilder::default();
        for (w, d) in grid_sizes() {
            let mesh = builder.build(w, d, &flat).unwrap();
            let n = mesh.vertex_count() as u32;
            assert!(mesh.indices.iter().all(|&i| i < n));
        }
    }

    #[test]
    fn every_cell_shares_its_diagonal_with_fixed_winding() {
        let builder = TerrainMeshBuilder::default();
        for (w, d) in grid_sizes() {
            let mesh = builder.build(w, d, &flat).unwrap();
            for z in 0..d {
                for x in 0..w {
                    let bl = mesh.vertex_index(x, z) as u32;
                    let tl = mesh.vertex_index(x, z + 1) as u32;
                    let tr = mesh.vertex_index(x + 1, z + 1) as u32;
                    let br = mesh.vertex_index(x + 1, z) as u32;
                    let [a, b] = mesh.cell_triangles(x, z).unwrap();
                    assert_eq!(a, [bl, tl, tr]);
                    assert_eq!(b, [bl, tr, br]);
                }
            }
        }
    }

    /// Flat terrain under the fixed winding faces +Y for every triangle.
    #[test]
    fn triangles_face_up() {
        let mesh = TerrainMeshBuilder::default().build(4, 3, &flat).unwrap();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [0usize, 1, 2].map(|k| mesh.positions[tri[k] as usize]);
            let n = (b - a).cross(c - a);
            assert!(n.y > 0.0, "triangle {:?} faces {:?}", tri, n);
        }
    }

    /// Interior vertices are referenced by the six triangles around them; nothing is duplicated.
    #[test]
    fn interior_vertices_are_shared() {
        let mesh = TerrainMeshBuilder::default().build(5, 4, &wavy).unwrap();
        let mut uses = vec![0usize; mesh.vertex_count()];
        for &i in &mesh.indices {
            uses[i as usize] += 1;
        }
        for z in 1..4 {
            for x in 1..5 {
                assert_eq!(uses[mesh.vertex_index(x, z)], 6);
            }
        }
        assert!(uses.iter().all(|&u| u > 0));
    }

    #[test]
    fn uv_corners_and_scale() {
        for (w, d) in grid_sizes() {
            let mesh = TerrainMeshBuilder::default().build(w, d, &flat).unwrap();
            assert_eq!(mesh.uvs[mesh.vertex_index(0, 0)], Vec2::ZERO);
            assert_eq!(mesh.uvs[mesh.vertex_index(w, d)], Vec2::ONE);
            assert!(mesh
                .uvs
                .iter()
                .all(|uv| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));

            let tiled = TerrainMeshBuilder::new(DEFAULT_HEIGHT_SCALE, 2.0)
                .build(w, d, &flat)
                .unwrap();
            for (a, b) in mesh.uvs.iter().zip(&tiled.uvs) {
                assert_eq!(*a * 2.0, *b);
            }
        }
    }

    #[test]
    fn uvs_ignore_noise() {
        let builder = TerrainMeshBuilder::default();
        let a = builder.build(6, 5, &flat).unwrap();
        let b = builder.build(6, 5, &wavy).unwrap();
        assert_eq!(a.uvs, b.uvs);
        assert_eq!(a.indices, b.indices);
    }

    /// Same inputs must produce byte-identical buffers.
    #[test]
    fn deterministic_output() {
        let noise = FractalNoise::new(&NoiseSettings {
            seed: 98765,
            fractal: FractalType::Fbm,
            frequency: 0.08,
            ..Default::default()
        });
        let builder = TerrainMeshBuilder::default();
        let a = builder.build(24, 17, &noise).unwrap();
        let b = builder.build(24, 17, &noise).unwrap();
        assert_eq!(a.position_bytes(), b.position_bytes());
        assert_eq!(a.index_bytes(), b.index_bytes());
        assert_eq!(a.uv_bytes(), b.uv_bytes());
    }

    #[test]
    fn zero_dimension_is_rejected_before_sampling() {
        let calls = Cell::new(0usize);
        let counting = |_x: f64, _z: f64| {
            calls.set(calls.get() + 1);
            0.0
        };
        let builder = TerrainMeshBuilder::default();
        assert_eq!(
            builder.build(0, 4, &counting),
            Err(MeshError::InvalidDimension { width: 0, depth: 4 })
        );
        assert_eq!(
            builder.build(4, 0, &counting),
            Err(MeshError::InvalidDimension { width: 4, depth: 0 })
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let builder = TerrainMeshBuilder::default();
        assert_eq!(
            builder.validate(u32::MAX, 2),
            Err(MeshError::InvalidDimension {
                width: u32::MAX,
                depth: 2
            })
        );
        assert_eq!(
            builder.validate(65535, 65535),
            Err(MeshError::InvalidDimension {
                width: 65535,
                depth: 65535
            })
        );
        assert!(builder.validate(65534, 65535).is_ok());
    }

    #[test]
    fn non_finite_scale_is_rejected() {
        let builder = TerrainMeshBuilder::new(f32::NAN, 1.0);
        assert!(matches!(
            builder.build(2, 2, &flat),
            Err(MeshError::InvalidScale { name: "height_scale", .. })
        ));
        let builder = TerrainMeshBuilder::new(2.0, f32::INFINITY);
        assert!(matches!(
            builder.build(2, 2, &flat),
            Err(MeshError::InvalidScale { name: "uv_scale", .. })
        ));
    }

    #[test]
    fn non_finite_sample_fails_the_build() {
        let poisoned = |x: f64, z: f64| if x == 3.0 && z == 2.0 { f64::NAN } else { 0.0 };
        let err = TerrainMeshBuilder::default()
            .build(5, 5, &poisoned)
            .unwrap_err();
        match err {
            MeshError::OracleFailure {
                x: 3,
                z: 2,
                source: OracleError::NonFinite { value },
            } => assert!(value.is_nan()),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn height_overflow_is_an_oracle_failure() {
        let huge = |_x: f64, _z: f64| 1.0e300;
        let err = TerrainMeshBuilder::default().build(1, 1, &huge).unwrap_err();
        assert_eq!(
            err,
            MeshError::OracleFailure {
                x: 0,
                z: 0,
                source: OracleError::OutOfRange { value: 1.0e300 },
            }
        );
        let message = std::error::Error::source(&err).unwrap().to_string();
        assert!(!message.contains("not finite"), "{}", message);
    }

    /// Coordinates past the grid edge must not alias into the next row.
    #[test]
    fn accessors_reject_out_of_grid_coordinates() {
        let ramp = |x: f64, z: f64| x + 10.0 * z;
        let mesh = TerrainMeshBuilder::new(1.0, 1.0).build(3, 2, &ramp).unwrap();

        assert_eq!(mesh.cell_triangles(0, 1), Some([[4, 8, 9], [4, 9, 5]]));
        assert_eq!(mesh.cell_triangles(3, 0), None);
        assert_eq!(mesh.cell_triangles(0, 2), None);
        assert!(mesh.cell_triangles(2, 1).is_some());

        assert_eq!(mesh.height_at(0, 1), Some(10.0));
        assert_eq!(mesh.height_at(3, 2), Some(23.0));
        assert_eq!(mesh.height_at(4, 0), None);
        assert_eq!(mesh.height_at(0, 3), None);
    }

    struct Unreachable;

    impl NoiseOracle for Unreachable {
        fn sample(&self, x: f64, _z: f64) -> Result<f64, OracleError> {
            if x > 1.0 {
                Err(OracleError::Unavailable("backend offline".into()))
            } else {
                Ok(0.0)
            }
        }
    }

    #[test]
    fn oracle_errors_propagate() {
        let err = TerrainMeshBuilder::default()
            .build(3, 1, &Unreachable)
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::OracleFailure {
                x: 2,
                z: 0,
                source: OracleError::Unavailable("backend offline".into()),
            }
        );
    }

    #[test]
    fn triangulating_slices_matches_full_pass() {
        let (w, d) = (7, 5);
        let mut full = Vec::new();
        triangulate_cells(w, d, 0..35, &mut full);

        let mut sliced = Vec::new();
        for start in (0..35).step_by(4) {
            triangulate_cells(w, d, start..start + 4, &mut sliced);
        }
        assert_eq!(full, sliced);
        assert_eq!(full.len(), 35 * INDICES_PER_CELL);
    }

    #[test]
    fn triangulating_past_the_end_is_clamped() {
        let mut out = Vec::new();
        triangulate_cells(2, 2, 3..100, &mut out);
        assert_eq!(out.len(), INDICES_PER_CELL);
        triangulate_cells(2, 2, 10..12, &mut out);
        assert_eq!(out.len(), INDICES_PER_CELL);
    }
}
