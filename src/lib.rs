#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Marching Terrain
//!
//! Procedural voxel terrain built from a fractal noise density field and
//! triangulated with marching cubes, organised into chunks that are generated
//! on demand.
//!
//! ## Key Modules
//!
//! * `core` - Shared-ownership primitives used across subsystems
//! * `engine_state` - Configuration, density sampling, meshing and the chunk store
//!
//! ## Architecture
//!
//! Generation is driven through [`ChunkStore`]. The store is given a density
//! evaluator (sequential or parallel, see [`DensityBackend`]) and a mesh sink
//! at construction; it never reaches for global state.
//!
//! ## Usage
//!
//! ```rust
//! use cgmath::Point3;
//! use marching_terrain::{
//!     core::MtResource, ChunkStore, DensityBackend, InMemoryMeshSink, TerrainConfig,
//! };
//!
//! let config = TerrainConfig {
//!     chunk_size: [8, 8, 8],
//!     iso_level: 4.0,
//!     ..TerrainConfig::default()
//! };
//! let sink = MtResource::new(InMemoryMeshSink::new());
//! let evaluator = DensityBackend::Sequential.build().unwrap();
//! let mut store = ChunkStore::new(evaluator, Box::new(sink.clone()));
//!
//! let generated = store
//!     .generate_region(&config, Point3::new(0.0, 0.0, 0.0), [3, 1, 3])
//!     .unwrap();
//! assert_eq!(generated.len(), 9);
//! assert_eq!(sink.get().len(), 9);
//! ```

use std::path::Path;

use log::{info, warn};

pub mod core;
pub mod engine_state;

pub use engine_state::{
    config::{DensityBackend, EngineConfig, NoiseSettings, TerrainConfig},
    error::{ConfigError, EvaluatorError, TerrainError},
    rendering::meshing::{InMemoryMeshSink, Mesh, MeshSink},
    voxels::{chunk::ChunkCoord, world::ChunkStore},
};

use crate::{
    core::MtResource,
    engine_state::voxels::density::{DensityEvaluator, SequentialDensityEvaluator},
};

/// Name of the timer reported for the startup generation.
pub const STARTUP_GENERATION_STOPWATCH: &str = "Startup Generation";

/// Initialises `env_logger` on stdout with the filter taken from `RUST_LOG`.
///
/// Calling it more than once is harmless; later calls are ignored.
pub fn init_logger() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Builds the evaluator `backend` describes, falling back to the sequential
/// one if it cannot be started.
pub fn build_evaluator(backend: &DensityBackend) -> Box<dyn DensityEvaluator> {
    backend.build().unwrap_or_else(|err| {
        warn!("{err}; falling back to the sequential density evaluator");
        Box::new(SequentialDensityEvaluator)
    })
}

/// Runs the headless generator.
///
/// Loads the engine configuration from `config_path` (defaults when `None`),
/// generates the spawn chunk and the spawn region into an in-memory mesh sink
/// and logs a summary.
///
/// # Errors
/// Returns an error if the configuration cannot be loaded or is invalid, or
/// if density evaluation fails.
pub fn run(config_path: Option<&Path>) -> Result<(), TerrainError> {
    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            EngineConfig::load(path)?
        }
        None => EngineConfig::default(),
    };

    let sink = MtResource::new(InMemoryMeshSink::new());
    let mut store = ChunkStore::new(build_evaluator(&config.backend), Box::new(sink.clone()));

    let start = web_time::Instant::now();
    let spawn = config.spawn.world_position();
    let spawn_coord = store.generate_single(&config.terrain, spawn)?;
    info!("Spawn chunk is {:?}", spawn_coord);

    let generated = store.generate_region(&config.terrain, spawn, config.spawn.region)?;

    let sink = sink.get();
    info!(
        "{}: {} chunk(s) ({} from the region) with the {} evaluator, {} mesh byte(s), in {:?}",
        STARTUP_GENERATION_STOPWATCH,
        store.len(),
        generated.len(),
        store.evaluator_name(),
        sink.total_bytes(),
        start.elapsed()
    );

    Ok(())
}
