//! terraingen: builds a noise-displaced terrain mesh from terrain.ron and prepares it for upload.

mod config;
mod normals;
mod vertex;

use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use procgen::{FractalNoise, StaggeredBuild, TerrainGenerator, TerrainMesh, TerrainSettings};

use crate::config::{AppConfig, RevealConfig};
use crate::normals::recalculate_normals;
use crate::vertex::{interleave, TerrainVertex};

/// Triangulate `cells_per_tick` cells per tick, calling `pause` between ticks (never after the
/// last one). Returns the number of ticks.
fn reveal_cells(
    build: &mut StaggeredBuild,
    cells_per_tick: usize,
    mut pause: impl FnMut(),
) -> usize {
    let per_tick = cells_per_tick.max(1);
    let mut ticks = 0;
    while !build.is_complete() {
        build.advance(per_tick);
        ticks += 1;
        let (done, total) = build.progress();
        log::debug!(
            "Revealed {}/{} cells ({} triangles visible)",
            done,
            total,
            build.visible_indices().len() / 3
        );
        if !build.is_complete() {
            pause();
        }
    }
    ticks
}

/// Build the mesh a few cells per tick, like an animated editor preview.
fn reveal(settings: &TerrainSettings, pacing: &RevealConfig) -> Result<TerrainMesh> {
    let noise = FractalNoise::new(&settings.noise);
    let builder = settings.builder();
    let mut build = StaggeredBuild::start(&builder, settings.width, settings.depth, &noise)
        .context("Failed to start terrain build")?;

    let tick = Duration::from_millis(pacing.tick_ms);
    reveal_cells(&mut build, pacing.cells_per_tick, || thread::sleep(tick));
    Ok(build.finish())
}

fn generate(settings: &TerrainSettings) -> Result<TerrainMesh> {
    let mut generator = TerrainGenerator::new(settings.clone());
    generator.rebuild().context("Failed to build terrain")?;
    generator
        .take_mesh()
        .context("Terrain generator produced no mesh")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = config::config_path();
    let mut config = AppConfig::load(&path);
    if config.random_seed {
        config.terrain.noise.seed = rand::random();
        log::info!("Using random noise seed {}", config.terrain.noise.seed);
    }

    let settings = &config.terrain;
    log::info!(
        "Generating {}x{} terrain ({:?}/{:?} noise, seed {})",
        settings.width,
        settings.depth,
        settings.noise.noise_type,
        settings.noise.fractal,
        settings.noise.seed
    );

    let mesh = if config.reveal.enabled {
        reveal(settings, &config.reveal)?
    } else {
        generate(settings)?
    };

    if config.draw_markers {
        for (i, p) in mesh.positions.iter().enumerate() {
            log::debug!("marker {} at ({:.3}, {:.3}, {:.3})", i, p.x, p.y, p.z);
        }
    }

    let normals = recalculate_normals(&mesh.positions, &mesh.indices);
    let vertices = interleave(&mesh, &normals);
    let vertex_bytes: &[u8] = bytemuck::cast_slice::<TerrainVertex, u8>(&vertices);
    let (low, high) = mesh.height_range();

    log::info!(
        "Terrain ready: {} vertices, {} triangles, heights {:.3}..{:.3}",
        mesh.vertex_count(),
        mesh.triangle_count(),
        low,
        high
    );
    log::info!(
        "Buffers: {} bytes vertex data, {} bytes index data",
        vertex_bytes.len(),
        mesh.index_bytes().len()
    );

    Ok(())
}
