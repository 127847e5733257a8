//! # Density Module
//!
//! Builds the scalar lattice a chunk's surface is extracted from.
//!
//! For every lattice point `(x, y, z)` of chunk `c` the value is
//! `iso_level + height(world_x, world_z) - world_y` with
//! `world = local + c * chunk_size`. Extraction compares against the same
//! iso-level, so it cancels out: points with `world_y <= height` are at or
//! above the iso-level and the surface always lies at `world_y = height`.
//!
//! ## Backends
//!
//! * [`SequentialDensityEvaluator`]: triple loop on the calling thread
//! * [`ParallelDensityEvaluator`]: Z slabs dispatched to a worker pool and
//!   reassembled from a flat readback buffer
//!
//! Both evaluate [`density_at`] for each point, so they agree to the bit; the
//! difference is only in how the work is scheduled.

use log::info;

use crate::engine_state::config::{DensityBackend, TerrainConfig};
use crate::engine_state::error::EvaluatorError;
use crate::engine_state::voxels::chunk::ChunkCoord;
use crate::engine_state::voxels::noise_field::NoiseField;

mod parallel;

pub use parallel::ParallelDensityEvaluator;

/// A dense 3D grid of density samples for one chunk.
///
/// Values are stored flat in row-major order, `x + y * width + z * width *
/// height`, which is also the order the parallel backend reads back in.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityGrid {
    dimensions: [usize; 3],
    values: Vec<f32>,
}

impl DensityGrid {
    /// Wraps a flat buffer as a grid.
    ///
    /// # Errors
    /// [`EvaluatorError::ReadbackSizeMismatch`] if `values` does not hold
    /// exactly one sample per lattice point.
    pub fn from_flat(dimensions: [usize; 3], values: Vec<f32>) -> Result<Self, EvaluatorError> {
        let expected = dimensions.iter().product();
        if values.len() != expected {
            return Err(EvaluatorError::ReadbackSizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(DensityGrid { dimensions, values })
    }

    /// Number of lattice points along each axis.
    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    /// Total number of lattice points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the grid holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat index of lattice point `(x, y, z)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        let [width, height, _] = self.dimensions;
        x + y * width + z * width * height
    }

    /// Density at lattice point `(x, y, z)`.
    ///
    /// # Panics
    /// Panics if the point lies outside the grid.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> f32 {
        self.values[self.index(x, y, z)]
    }

    /// The flat sample buffer.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Smallest and largest sample, or `None` for an empty grid.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.values.iter().fold(None, |acc, &value| match acc {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
    }
}

/// Density of lattice point `(x, y, z)` of chunk `coord`.
///
/// The single formula shared by every backend.
#[inline]
pub fn density_at(
    noise: &NoiseField,
    config: &TerrainConfig,
    coord: ChunkCoord,
    x: usize,
    y: usize,
    z: usize,
) -> f32 {
    let extent = config.chunk_extent();
    let world_x = x as f32 + coord.x as f32 * extent.x;
    let world_y = y as f32 + coord.y as f32 * extent.y;
    let world_z = z as f32 + coord.z as f32 * extent.z;

    let ground_y = config.iso_level + noise.height(world_x, world_z, &config.noise);
    ground_y - world_y
}

/// A way of filling a [`DensityGrid`] for one chunk.
///
/// Implementations block until the whole grid is available; a parallel
/// backend may fan out internally but never returns a partial grid.
pub trait DensityEvaluator {
    /// Samples the `(W+1) x (H+1) x (D+1)` lattice of chunk `coord`.
    ///
    /// `config` is assumed to be validated.
    fn sample(&mut self, coord: ChunkCoord, config: &TerrainConfig)
        -> Result<DensityGrid, EvaluatorError>;

    /// Short human-readable backend name, used in logs.
    fn name(&self) -> &'static str;
}

/// Evaluates one lattice point at a time on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialDensityEvaluator;

impl DensityEvaluator for SequentialDensityEvaluator {
    fn sample(
        &mut self,
        coord: ChunkCoord,
        config: &TerrainConfig,
    ) -> Result<DensityGrid, EvaluatorError> {
        let noise = NoiseField::from_settings(&config.noise);
        let dimensions = config.grid_points();
        let [width, height, depth] = dimensions;

        let mut values = vec![0.0; width * height * depth];
        for x in 0..width {
            for y in 0..height {
                for z in 0..depth {
                    values[x + y * width + z * width * height] =
                        density_at(&noise, config, coord, x, y, z);
                }
            }
        }

        DensityGrid::from_flat(dimensions, values)
    }

    fn name(&self) -> &'static str {
        "sequential"
    }
}

impl DensityBackend {
    /// Builds the evaluator this backend selection describes.
    ///
    /// # Errors
    /// Only the parallel backend can fail here, when its worker pool cannot be
    /// started.
    pub fn build(&self) -> Result<Box<dyn DensityEvaluator>, EvaluatorError> {
        let evaluator: Box<dyn DensityEvaluator> = match *self {
            DensityBackend::Sequential => Box::new(SequentialDensityEvaluator),
            DensityBackend::Parallel {
                workers,
                slab_depth,
            } => Box::new(ParallelDensityEvaluator::new(workers, slab_depth)?),
        };
        info!("Using {} density evaluator", evaluator.name());
        Ok(evaluator)
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Point3;

    use super::*;
    use crate::engine_state::{config::NoiseSettings, rendering::meshing::extract};

    fn config() -> TerrainConfig {
        TerrainConfig {
            chunk_size: [5, 4, 3],
            iso_level: 10.0,
            noise: NoiseSettings {
                scale: 0.07,
                octaves: 3,
                height_multiplier: 6.0,
                seed: 9,
                ..NoiseSettings::default()
            },
        }
    }

    #[test]
    fn test_grid_has_one_point_more_per_axis() {
        let grid = SequentialDensityEvaluator
            .sample(Point3::new(0, 0, 0), &config())
            .unwrap();
        assert_eq!(grid.dimensions(), [6, 5, 4]);
        assert_eq!(grid.len(), 6 * 5 * 4);
    }

    #[test]
    fn test_flat_terrain_density_is_iso_minus_height() {
        let mut config = config();
        config.noise.height_multiplier = 0.0;
        let coord = Point3::new(2, -1, 3);

        let grid = SequentialDensityEvaluator.sample(coord, &config).unwrap();
        for y in 0..5 {
            let world_y = y as f32 + (coord.y * 4) as f32;
            assert_eq!(grid.get(1, y, 2), config.iso_level - world_y);
        }
    }

    #[test]
    fn test_samples_use_world_coordinates() {
        let config = config();
        let noise = NoiseField::from_settings(&config.noise);
        let coord = Point3::new(-1, 0, 2);

        let grid = SequentialDensityEvaluator.sample(coord, &config).unwrap();
        let expected = config.iso_level + noise.height(3.0 - 5.0, 1.0 + 6.0, &config.noise) - 2.0;
        assert_eq!(grid.get(3, 2, 1), expected);
    }

    #[test]
    fn test_neighbouring_chunks_share_boundary_samples() {
        let config = config();
        let left = SequentialDensityEvaluator
            .sample(Point3::new(0, 0, 0), &config)
            .unwrap();
        let right = SequentialDensityEvaluator
            .sample(Point3::new(1, 0, 0), &config)
            .unwrap();

        for y in 0..5 {
            for z in 0..4 {
                assert_eq!(left.get(5, y, z), right.get(0, y, z));
            }
        }
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        assert!(matches!(
            DensityGrid::from_flat([2, 2, 2], vec![0.0; 7]),
            Err(EvaluatorError::ReadbackSizeMismatch {
                expected: 8,
                actual: 7
            })
        ));
    }

    #[test]
    fn test_iso_level_does_not_move_the_surface() {
        let low = TerrainConfig {
            iso_level: 0.0,
            ..config()
        };
        let high = TerrainConfig {
            iso_level: 64.0,
            ..config()
        };
        let coord = Point3::new(1, 0, -2);

        // Relative to their own threshold the lattices agree.
        let a = SequentialDensityEvaluator.sample(coord, &low).unwrap();
        let b = SequentialDensityEvaluator.sample(coord, &high).unwrap();
        for (x, y) in a.values().iter().zip(b.values()) {
            assert!(((x - low.iso_level) - (y - high.iso_level)).abs() < 1e-4);
        }

        // On flat terrain both thresholds put the surface at world y = 0.
        let flat = |iso_level| TerrainConfig {
            iso_level,
            noise: NoiseSettings {
                height_multiplier: 0.0,
                ..config().noise
            },
            ..config()
        };
        for config in [flat(0.0), flat(64.0)] {
            let grid = SequentialDensityEvaluator
                .sample(Point3::new(0, 0, 0), &config)
                .unwrap();
            let mesh = extract(&grid, &config);
            assert!(!mesh.is_empty());
            // Local y is centred on the chunk: world 0 is local -H/2.
            assert!(mesh.positions().iter().all(|p| p.y == -2.0));
        }
    }

    #[test]
    fn test_extreme_chunk_coordinates_stay_finite() {
        let config = config();
        let noise = NoiseField::from_settings(&config.noise);
        let coord = Point3::new(i32::MAX, i32::MIN, i32::MAX);

        let density = density_at(&noise, &config, coord, 5, 4, 3);
        assert!(density.is_finite(), "{density}");
    }

    #[test]
    fn test_min_max() {
        let grid = DensityGrid::from_flat([2, 1, 1], vec![3.0, -1.5]).unwrap();
        assert_eq!(grid.min_max(), Some((-1.5, 3.0)));
    }

    #[test]
    fn test_backend_builds_requested_evaluator() {
        let sequential = DensityBackend::Sequential.build().unwrap();
        assert_eq!(sequential.name(), "sequential");

        let parallel = DensityBackend::Parallel {
            workers: 2,
            slab_depth: 1,
        }
        .build()
        .unwrap();
        assert_eq!(parallel.name(), "parallel");
    }
}
