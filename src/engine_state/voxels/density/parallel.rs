//! Worker-pool density backend.
//!
//! The lattice is cut into slabs of whole Z layers. Each slab is an
//! independent [`DensitySlabTask`]; the results are copied into one flat
//! readback buffer in `x + y * width + z * width * height` order and the
//! per-slab buffers are dropped before the grid is handed back.

use std::sync::Arc;

use log::debug;

use crate::engine_state::{
    config::TerrainConfig,
    error::EvaluatorError,
    task_management::TaskManager,
    voxels::{
        chunk::ChunkCoord,
        noise_field::NoiseField,
        tasks::density_slab_task::{DensitySlab, DensitySlabTask},
    },
};

use super::{DensityEvaluator, DensityGrid};

/// Evaluates chunk lattices on a pool of worker threads.
///
/// The pool is created once and reused for every chunk. `sample` still
/// blocks until every slab is back, so callers see the same synchronous
/// contract as the sequential backend.
pub struct ParallelDensityEvaluator {
    task_manager: TaskManager<DensitySlab>,
    slab_depth: usize,
}

impl ParallelDensityEvaluator {
    /// Starts the worker pool.
    ///
    /// # Arguments
    /// * `workers` - Worker thread count; 0 uses the available parallelism
    /// * `slab_depth` - Z layers per work item; 0 is treated as 1
    pub fn new(workers: usize, slab_depth: usize) -> Result<Self, EvaluatorError> {
        Ok(ParallelDensityEvaluator {
            task_manager: TaskManager::new(workers, "density")?,
            slab_depth: slab_depth.max(1),
        })
    }

    /// Number of worker threads backing this evaluator.
    pub fn num_workers(&self) -> usize {
        self.task_manager.num_workers()
    }
}

impl DensityEvaluator for ParallelDensityEvaluator {
    fn sample(
        &mut self,
        coord: ChunkCoord,
        config: &TerrainConfig,
    ) -> Result<DensityGrid, EvaluatorError> {
        let dimensions = config.grid_points();
        let [width, height, depth] = dimensions;
        let layer_len = width * height;

        let noise = Arc::new(NoiseField::from_settings(&config.noise));
        let shared_config = Arc::new(config.clone());

        let mut num_slabs = 0;
        for first_layer in (0..depth).step_by(self.slab_depth) {
            let layers = first_layer..(first_layer + self.slab_depth).min(depth);
            self.task_manager.publish_task(Box::new(DensitySlabTask::new(
                noise.clone(),
                shared_config.clone(),
                coord,
                layers,
            )))?;
            num_slabs += 1;
        }

        let slabs = self.task_manager.wait_for_results()?;
        if slabs.len() != num_slabs {
            return Err(EvaluatorError::ReadbackSizeMismatch {
                expected: num_slabs,
                actual: slabs.len(),
            });
        }

        let mut readback = vec![0.0f32; layer_len * depth];
        for slab in slabs {
            let start = slab.first_layer * layer_len;
            let end = start + slab.values.len();
            if end > readback.len() {
                return Err(EvaluatorError::ReadbackSizeMismatch {
                    expected: readback.len(),
                    actual: end,
                });
            }
            readback[start..end].copy_from_slice(&slab.values);
        }

        debug!(
            "Chunk {:?}: {} slab(s) read back on {} worker(s)",
            coord,
            num_slabs,
            self.task_manager.num_workers()
        );

        DensityGrid::from_flat(dimensions, readback)
    }

    fn name(&self) -> &'static str {
        "parallel"
    }
}
