//! Paced terrain reveal for visualization.
//!
//! Vertices and UVs are generated up front in one call, so every validation and oracle
//! failure surfaces from [`StaggeredBuild::start`]. Triangles are then produced a slice of
//! the cell loop at a time; the caller decides how long to wait between slices.

use crate::error::MeshError;
use crate::noise_oracle::NoiseOracle;
use crate::terrain::{triangulate_cells, TerrainMesh, TerrainMeshBuilder, INDICES_PER_CELL};

/// A terrain mesh whose triangles are revealed cell by cell.
#[derive(Debug, Clone)]
pub struct StaggeredBuild {
    mesh: TerrainMesh,
    cells_done: usize,
}

impl StaggeredBuild {
    pub fn start<N>(
        builder: &TerrainMeshBuilder,
        width: u32,
        depth: u32,
        noise: &N,
    ) -> Result<Self, MeshError>
    where
        N: NoiseOracle + ?Sized,
    {
        builder.validate(width, depth)?;
        let uvs = builder.generate_uvs(width, depth);
        let positions = builder.generate_positions(width, depth, noise)?;

        let cells = width as usize * depth as usize;
        Ok(Self {
            mesh: TerrainMesh {
                width,
                depth,
                positions,
                indices: Vec::with_capacity(cells * INDICES_PER_CELL),
                uvs,
            },
            cells_done: 0,
        })
    }

    /// Triangulate up to `cells` more cells. Returns how many were added.
    pub fn advance(&mut self, cells: usize) -> usize {
        let total = self.mesh.cell_count();
        let end = self.cells_done.saturating_add(cells).min(total);
        let added = end - self.cells_done;
        if added > 0 {
            triangulate_cells(
                self.mesh.width,
                self.mesh.depth,
                self.cells_done..end,
                &mut self.mesh.indices,
            );
            self.cells_done = end;
        }
        added
    }

    /// `(cells triangulated, total cells)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.cells_done, self.mesh.cell_count())
    }

    pub fn is_complete(&self) -> bool {
        self.cells_done == self.mesh.cell_count()
    }

    /// The mesh as revealed so far. Positions and UVs are complete; indices cover only the
    /// cells triangulated so far.
    pub fn partial_mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn visible_indices(&self) -> &[u32] {
        &self.mesh.indices
    }

    /// Triangulate whatever is left and hand over the finished mesh.
    pub fn finish(mut self) -> TerrainMesh {
        let remaining = self.mesh.cell_count() - self.cells_done;
        self.advance(remaining);
        self.mesh
    }
}
