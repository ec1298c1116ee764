//! Rebuild-on-demand ownership of the current terrain mesh.
//!
//! Settings and mesh are committed together: a rebuild that fails leaves the previous pair
//! untouched, so a consumer never observes a mesh that disagrees with its settings.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::noise_oracle::{FractalNoise, NoiseSettings};
use crate::terrain::{TerrainMesh, TerrainMeshBuilder, DEFAULT_HEIGHT_SCALE};

/// Everything needed to (re)build one terrain mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Quads along X.
    pub width: u32,
    /// Quads along Z.
    pub depth: u32,
    pub height_scale: f32,
    pub uv_scale: f32,
    pub noise: NoiseSettings,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            width: 20,
            depth: 20,
            height_scale: DEFAULT_HEIGHT_SCALE,
            uv_scale: 1.0,
            noise: NoiseSettings::default(),
        }
    }
}

impl TerrainSettings {
    pub fn builder(&self) -> TerrainMeshBuilder {
        TerrainMeshBuilder::new(self.height_scale, self.uv_scale)
    }

    /// Build a fresh mesh from these settings.
    pub fn build(&self) -> Result<TerrainMesh, MeshError> {
        let noise = FractalNoise::new(&self.noise);
        self.builder().build(self.width, self.depth, &noise)
    }
}

/// Owns the settings and the mesh built from them.
#[derive(Debug, Default)]
pub struct TerrainGenerator {
    settings: TerrainSettings,
    mesh: Option<TerrainMesh>,
    revision: u64,
}

impl TerrainGenerator {
    /// Create a generator. No mesh exists until the first rebuild.
    pub fn new(settings: TerrainSettings) -> Self {
        Self {
            settings,
            mesh: None,
            revision: 0,
        }
    }

    pub fn settings(&self) -> &TerrainSettings {
        &self.settings
    }

    pub fn mesh(&self) -> Option<&TerrainMesh> {
        self.mesh.as_ref()
    }

    /// Number of successful rebuilds so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Rebuild from the current settings, replacing the mesh only on success.
    pub fn rebuild(&mut self) -> Result<&TerrainMesh, MeshError> {
        let mesh = self.settings.build()?;
        self.revision += 1;
        log::info!(
            "Terrain rebuilt (rev {}): {}x{}, {} vertices",
            self.revision,
            mesh.width,
            mesh.depth,
            mesh.vertex_count()
        );
        Ok(self.mesh.insert(mesh))
    }

    /// Switch to `settings`, rebuilding if they differ from the current ones or no mesh exists
    /// yet. Returns whether a rebuild happened. On error neither settings nor mesh change.
    pub fn apply_settings(&mut self, settings: TerrainSettings) -> Result<bool, MeshError> {
        if self.mesh.is_some() && settings == self.settings {
            return Ok(false);
        }
        let mesh = match settings.build() {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("Terrain settings rejected, keeping previous mesh: {}", e);
                return Err(e);
            }
        };
        self.settings = settings;
        self.mesh = Some(mesh);
        self.revision += 1;
        Ok(true)
    }

    /// Transfer ownership of the current mesh to the caller.
    pub fn take_mesh(&mut self) -> Option<TerrainMesh> {
        self.mesh.take()
    }
}
