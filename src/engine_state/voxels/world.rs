//! # World Module
//!
//! This module provides [`ChunkStore`], the index of every generated chunk in
//! the terrain. It is the only entry point for generation: callers ask for a
//! world position or a region around one, and the store works out which chunk
//! coordinates are still missing and generates exactly those.
//!
//! ## Chunk Generation
//!
//! Each missing chunk goes through the same pipeline, fully, before the next
//! one starts:
//! 1. The injected [`DensityEvaluator`] samples the chunk's density lattice
//! 2. Marching cubes extracts the iso-surface mesh
//! 3. The injected [`MeshSink`] receives the mesh
//! 4. A [`ChunkRecord`] is inserted under the chunk's coordinate
//!
//! The density grid lives only for the duration of one generation call.
//!
//! ## Lifecycle
//!
//! A coordinate is either absent or present. Generating at a present
//! coordinate is a silent no-op; the only way back to absent is
//! [`ChunkStore::clear`].
//!
//! ## Thread Safety
//!
//! The store assumes a single writer. Mutating calls take `&mut self`, so
//! sharing one store between threads requires wrapping it in an
//! [`MtResource`](crate::core::MtResource) or similar.

use std::collections::HashMap;

use cgmath::Point3;
use log::{debug, info};

use crate::engine_state::{
    config::TerrainConfig,
    error::TerrainError,
    rendering::meshing::{extract, MeshSink},
    voxels::{
        chunk::{world_to_chunk_coord, ChunkBounds, ChunkCoord, ChunkRecord, ChunkRegion},
        density::DensityEvaluator,
    },
};

/// Owns every generated chunk, keyed by chunk coordinate.
///
/// The density backend and the mesh sink are injected at construction, so the
/// store itself knows nothing about threads or presentation.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use marching_terrain::engine_state::{
///     config::TerrainConfig,
///     rendering::meshing::InMemoryMeshSink,
///     voxels::{density::SequentialDensityEvaluator, world::ChunkStore},
/// };
///
/// let config = TerrainConfig {
///     chunk_size: [8, 8, 8],
///     ..TerrainConfig::default()
/// };
/// let mut store = ChunkStore::new(
///     Box::new(SequentialDensityEvaluator),
///     Box::new(InMemoryMeshSink::new()),
/// );
///
/// let coord = store.generate_single(&config, Point3::new(0.0, 0.0, 0.0)).unwrap();
/// assert!(store.contains(coord));
///
/// // Generating again at the same chunk does nothing
/// store.generate_single(&config, Point3::new(1.0, 1.0, 1.0)).unwrap();
/// assert_eq!(store.len(), 1);
/// ```
pub struct ChunkStore {
    chunks: HashMap<ChunkCoord, ChunkRecord>,
    evaluator: Box<dyn DensityEvaluator>,
    mesh_sink: Box<dyn MeshSink>,
}

impl ChunkStore {
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `evaluator` - Backend that fills density grids
    /// * `mesh_sink` - Receiver of every generated mesh
    pub fn new(evaluator: Box<dyn DensityEvaluator>, mesh_sink: Box<dyn MeshSink>) -> Self {
        ChunkStore {
            chunks: HashMap::new(),
            evaluator,
            mesh_sink,
        }
    }

    /// Generates the chunk containing `world_position`, unless it already exists.
    ///
    /// # Returns
    /// The coordinate of the chunk containing `world_position`, whether it was
    /// generated by this call or earlier.
    ///
    /// # Errors
    /// * [`TerrainError::InvalidConfig`] if `config` fails validation or
    ///   `world_position` lies outside the supported chunk range
    /// * [`TerrainError::DensityEvaluation`] if the density backend fails; the
    ///   store is left unchanged
    pub fn generate_single(
        &mut self,
        config: &TerrainConfig,
        world_position: Point3<f32>,
    ) -> Result<ChunkCoord, TerrainError> {
        config.validate()?;

        let coord = world_to_chunk_coord(world_position, config)?;
        self.generate_chunk(config, coord)?;
        Ok(coord)
    }

    /// Generates every missing chunk of a box of `dimensions` chunks centred on
    /// the chunk containing `center`.
    ///
    /// Chunks are generated one at a time, X outermost, then Y, then Z. Odd
    /// dimensions are centred exactly; even ones reach one chunk further on
    /// the negative side.
    ///
    /// # Returns
    /// The coordinates generated by this call, in generation order. Chunks
    /// that already existed are not included, so repeating a call returns an
    /// empty list.
    ///
    /// # Errors
    /// * [`TerrainError::InvalidConfig`] if `config` fails validation, any
    ///   dimension is not positive, the chunk count overflows, or the box
    ///   reaches outside the supported chunk range
    /// * [`TerrainError::DensityEvaluation`] if the density backend fails;
    ///   chunks generated before the failure stay in the store
    pub fn generate_region(
        &mut self,
        config: &TerrainConfig,
        center: Point3<f32>,
        dimensions: [i32; 3],
    ) -> Result<Vec<ChunkCoord>, TerrainError> {
        config.validate()?;
        let center_coord = world_to_chunk_coord(center, config)?;
        let region = ChunkRegion::new(center_coord, dimensions, config)?;
        let start = web_time::Instant::now();

        let mut generated = Vec::new();
        for coord in region.coords() {
            if self.generate_chunk(config, coord)? {
                generated.push(coord);
            }
        }

        info!(
            "Generated {} new chunk(s) in a {}x{}x{} region around {:?} in {:?}",
            generated.len(),
            dimensions[0],
            dimensions[1],
            dimensions[2],
            center_coord,
            start.elapsed()
        );

        Ok(generated)
    }

    /// Removes every chunk and tells the mesh sink to drop each mesh.
    ///
    /// Clearing an empty store does nothing.
    pub fn clear(&mut self) {
        if self.chunks.is_empty() {
            return;
        }

        let count = self.chunks.len();
        for (coord, _) in self.chunks.drain() {
            self.mesh_sink.remove(coord);
        }
        info!("Cleared {} chunk(s)", count);
    }

    /// Number of generated chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk has been generated since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Whether the chunk at `coord` has been generated.
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    /// The record of the chunk at `coord`, if generated.
    pub fn get(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.chunks.get(&coord)
    }

    /// All generated coordinates, sorted by X, then Y, then Z.
    pub fn coords(&self) -> Vec<ChunkCoord> {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort_by_key(|coord| (coord.x, coord.y, coord.z));
        coords
    }

    /// World-space boxes of all generated chunks, for debug drawing.
    pub fn chunk_bounds(&self) -> impl Iterator<Item = (ChunkCoord, ChunkBounds)> + '_ {
        self.chunks
            .iter()
            .map(|(coord, record)| (*coord, record.bounds()))
    }

    /// Name of the density backend in use.
    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.name()
    }

    /// Runs the pipeline for one coordinate.
    ///
    /// # Returns
    /// `true` if the chunk was generated, `false` if it already existed.
    fn generate_chunk(
        &mut self,
        config: &TerrainConfig,
        coord: ChunkCoord,
    ) -> Result<bool, TerrainError> {
        if self.chunks.contains_key(&coord) {
            return Ok(false);
        }

        let start = web_time::Instant::now();

        let mesh = {
            let grid = self.evaluator.sample(coord, config)?;
            if let Some((min, max)) = grid.min_max() {
                debug!("Chunk {:?} density range [{}, {}]", coord, min, max);
            }
            extract(&grid, config)
        };

        self.mesh_sink.upload(coord, &mesh);
        debug!(
            "Generated chunk {:?} with {} triangle(s) using the {} evaluator in {:?}",
            coord,
            mesh.triangle_count(),
            self.evaluator.name(),
            start.elapsed()
        );

        self.chunks
            .insert(coord, ChunkRecord::new(coord, mesh, config));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::MtResource,
        engine_state::{
            error::{ConfigError, EvaluatorError},
            rendering::meshing::InMemoryMeshSink,
            voxels::density::{DensityGrid, SequentialDensityEvaluator},
        },
    };

    /// Backend that fails after a fixed number of successful samples.
    struct FailingEvaluator {
        remaining: usize,
    }

    impl DensityEvaluator for FailingEvaluator {
        fn sample(
            &mut self,
            coord: ChunkCoord,
            config: &TerrainConfig,
        ) -> Result<DensityGrid, EvaluatorError> {
            if self.remaining == 0 {
                return Err(EvaluatorError::WorkerDisconnected);
            }
            self.remaining -= 1;
            SequentialDensityEvaluator.sample(coord, config)
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    fn config() -> TerrainConfig {
        TerrainConfig {
            chunk_size: [4, 4, 4],
            iso_level: 2.0,
            ..TerrainConfig::default()
        }
    }

    fn store() -> (ChunkStore, MtResource<InMemoryMeshSink>) {
        let sink = MtResource::new(InMemoryMeshSink::new());
        let store = ChunkStore::new(Box::new(SequentialDensityEvaluator), Box::new(sink.clone()));
        (store, sink)
    }

    #[test]
    fn test_generate_single_is_idempotent() {
        let (mut store, sink) = store();
        let config = config();

        let first = store.generate_single(&config, Point3::new(0.5, 0.0, -0.5)).unwrap();
        let second = store.generate_single(&config, Point3::new(-1.0, 1.0, 1.5)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(sink.get().upload_count(), 1);
    }

    #[test]
    fn test_record_mesh_matches_upload() {
        let (mut store, sink) = store();
        let coord = store
            .generate_single(&config(), Point3::new(0.0, 0.0, 0.0))
            .unwrap();

        let record = store.get(coord).unwrap();
        let sink = sink.get();
        let uploaded = sink.get(coord).unwrap();
        assert!(!record.mesh().is_empty());
        assert_eq!(uploaded.indices, record.mesh().indices());
        assert_eq!(uploaded.vertices.len(), record.mesh().vertex_count());
    }

    #[test]
    fn test_invalid_config_is_rejected_before_generation() {
        let (mut store, sink) = store();
        let config = TerrainConfig {
            chunk_size: [4, 0, 4],
            ..config()
        };

        let result = store.generate_single(&config, Point3::new(0.0, 0.0, 0.0));
        assert!(matches!(
            result,
            Err(TerrainError::InvalidConfig(ConfigError::NonPositiveChunkDimension {
                axis: "y",
                value: 0
            }))
        ));
        assert!(store.is_empty());
        assert!(sink.get().is_empty());
    }

    #[test]
    fn test_region_rejects_non_positive_dimensions() {
        let (mut store, _) = store();
        let result = store.generate_region(&config(), Point3::new(0.0, 0.0, 0.0), [2, -1, 2]);
        assert!(matches!(
            result,
            Err(TerrainError::InvalidConfig(ConfigError::NonPositiveRegionDimension {
                axis: "y",
                value: -1
            }))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_out_of_range_requests_are_rejected_before_generation() {
        let (mut store, sink) = store();
        let config = config();

        assert!(matches!(
            store.generate_single(&config, Point3::new(3.0e9, 0.0, 0.0)),
            Err(TerrainError::InvalidConfig(ConfigError::PositionOutOfRange { axis: "x", .. }))
        ));
        assert!(matches!(
            store.generate_region(&config, Point3::new(0.0, 0.0, 0.0), [70_000, 70_000, 1]),
            Err(TerrainError::InvalidConfig(ConfigError::RegionTooLarge { .. }))
        ));
        // The lowest chunk still fits, but a box around it does not.
        let lowest = Point3::new(0.0, 0.0, i32::MIN as f32);
        assert!(store.generate_region(&config, lowest, [1, 1, 1]).is_ok());
        store.clear();
        assert!(matches!(
            store.generate_region(&config, lowest, [1, 1, 3]),
            Err(TerrainError::InvalidConfig(ConfigError::ChunkCoordOutOfRange { axis: "z", .. }))
        ));
        assert!(store.is_empty());
        assert!(sink.get().is_empty());
    }

    #[test]
    fn test_evaluator_failure_is_distinct_and_keeps_earlier_chunks() {
        let sink = MtResource::new(InMemoryMeshSink::new());
        let mut store = ChunkStore::new(
            Box::new(FailingEvaluator { remaining: 2 }),
            Box::new(sink.clone()),
        );

        let result = store.generate_region(&config(), Point3::new(0.0, 0.0, 0.0), [3, 1, 1]);
        assert!(matches!(
            result,
            Err(TerrainError::DensityEvaluation(EvaluatorError::WorkerDisconnected))
        ));
        assert_eq!(
            store.coords(),
            vec![Point3::new(-1, 0, 0), Point3::new(0, 0, 0)]
        );
        assert_eq!(sink.get().len(), 2);
    }

    #[test]
    fn test_clear_removes_sink_entries() {
        let (mut store, sink) = store();
        let config = config();
        store
            .generate_region(&config, Point3::new(0.0, 0.0, 0.0), [2, 1, 2])
            .unwrap();
        assert_eq!(sink.get().len(), 4);

        store.clear();
        assert!(store.is_empty());
        assert!(sink.get().is_empty());

        // Clearing again is a no-op
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_chunk_bounds_follow_records() {
        let (mut store, _) = store();
        let config = config();
        store
            .generate_region(&config, Point3::new(0.0, 0.0, 0.0), [1, 1, 2])
            .unwrap();

        let mut bounds: Vec<_> = store.chunk_bounds().collect();
        bounds.sort_by_key(|(coord, _)| coord.z);
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].0, Point3::new(0, 0, -1));
        assert_eq!(bounds[0].1.min(), Point3::new(-2.0, -2.0, -6.0));
        assert_eq!(bounds[1].1.max(), Point3::new(2.0, 2.0, 2.0));
    }
}
