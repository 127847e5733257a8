//! # Density Slab Task
//!
//! One work item of the parallel density backend: a contiguous run of Z layers
//! of a chunk's lattice.

use std::ops::Range;
use std::sync::Arc;

use crate::engine_state::{
    config::TerrainConfig,
    task_management::task::Task,
    voxels::{chunk::ChunkCoord, density::density_at, noise_field::NoiseField},
};

/// Samples every lattice point whose Z index lies in `layers`.
pub struct DensitySlabTask {
    noise: Arc<NoiseField>,
    config: Arc<TerrainConfig>,
    coord: ChunkCoord,
    layers: Range<usize>,
}

impl DensitySlabTask {
    /// Creates a slab task for layers `layers` of chunk `coord`.
    pub fn new(
        noise: Arc<NoiseField>,
        config: Arc<TerrainConfig>,
        coord: ChunkCoord,
        layers: Range<usize>,
    ) -> Self {
        DensitySlabTask {
            noise,
            config,
            coord,
            layers,
        }
    }
}

/// Samples produced by a [`DensitySlabTask`].
///
/// `values` holds the slab in the grid's flat order, so it belongs at
/// `first_layer * width * height` in the full readback buffer.
pub struct DensitySlab {
    /// Z index of the first layer in this slab
    pub first_layer: usize,
    /// Flat samples of the slab
    pub values: Vec<f32>,
}

impl Task<DensitySlab> for DensitySlabTask {
    fn process(&self) -> DensitySlab {
        let [width, height, _] = self.config.grid_points();
        let mut values = Vec::with_capacity(width * height * self.layers.len());

        for z in self.layers.clone() {
            for y in 0..height {
                for x in 0..width {
                    values.push(density_at(
                        &self.noise,
                        &self.config,
                        self.coord,
                        x,
                        y,
                        z,
                    ));
                }
            }
        }

        DensitySlab {
            first_layer: self.layers.start,
            values,
        }
    }
}
