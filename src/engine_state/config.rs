//! # Configuration
//!
//! The terrain asset ([`TerrainConfig`]) and the engine-level settings that wrap
//! it ([`EngineConfig`]).
//!
//! Both are plain `serde` structs so they can be stored as JSON next to the
//! binary. Every field has a default, so a partial file only overrides what it
//! names.
//!
//! ## Validation
//!
//! Nothing here is trusted: the chunk store calls [`TerrainConfig::validate`]
//! at every generation entry point and rejects bad values with a
//! [`ConfigError`] instead of producing an empty or corrupt chunk.

use std::path::Path;

use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Default chunk size along every axis, in lattice cells.
pub const DEFAULT_CHUNK_DIMENSION: i32 = 32;
/// Default number of chunks stacked vertically when deriving the iso-level.
pub const DEFAULT_VERTICAL_CHUNKS: i32 = 6;

const AXES: [&str; 3] = ["x", "y", "z"];

/// Parameters of the fractal height noise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Base horizontal frequency applied to world coordinates
    pub scale: f32,
    /// Number of summed octaves, at least 1
    pub octaves: i32,
    /// Amplitude factor applied after each octave
    pub persistence: f32,
    /// Frequency factor applied after each octave
    pub lacunarity: f32,
    /// Final multiplier on the summed noise
    pub height_multiplier: f32,
    /// Horizontal (x, z) offset added to world coordinates before scaling
    pub offset: [f32; 2],
    /// Seed of the gradient-noise permutation table
    pub seed: u32,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        NoiseSettings {
            scale: 0.01,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            height_multiplier: 1.0,
            offset: [0.0, 0.0],
            seed: 0,
        }
    }
}

/// The terrain asset: chunk geometry, surface threshold and noise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Chunk size `(W, H, D)` in cells; the density lattice has one more point per axis
    pub chunk_size: [i32; 3],
    /// Threshold separating inside from outside
    pub iso_level: f32,
    /// Height noise parameters
    pub noise: NoiseSettings,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        TerrainConfig {
            chunk_size: [DEFAULT_CHUNK_DIMENSION; 3],
            iso_level: 0.0,
            noise: NoiseSettings::default(),
        }
        .with_vertical_chunks(DEFAULT_VERTICAL_CHUNKS)
    }
}

impl TerrainConfig {
    /// Derives the iso-level from an estimated count of vertically stacked chunks.
    ///
    /// Only sets the threshold value, to half of `vertical_chunks + 1` chunk
    /// heights. Densities are offset by the same iso-level, so this does not
    /// move the extracted surface, which stays at world `y = height(x, z)`.
    ///
    /// # Arguments
    /// * `vertical_chunks` - Estimated number of chunks stacked along Y
    pub fn with_vertical_chunks(mut self, vertical_chunks: i32) -> Self {
        let height = self.chunk_size[1] as f32;
        self.iso_level = (vertical_chunks as f32 * height + height) / 2.0;
        self
    }

    /// Checks every parameter the generator relies on.
    ///
    /// # Returns
    /// `Ok(())` if the configuration can be used for generation, otherwise the
    /// first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, &value) in AXES.into_iter().zip(self.chunk_size.iter()) {
            if value <= 0 {
                return Err(ConfigError::NonPositiveChunkDimension { axis, value });
            }
        }

        if self.noise.octaves < 1 {
            return Err(ConfigError::NonPositiveOctaves(self.noise.octaves));
        }

        let floats = [
            ("iso_level", self.iso_level),
            ("noise.scale", self.noise.scale),
            ("noise.persistence", self.noise.persistence),
            ("noise.lacunarity", self.noise.lacunarity),
            ("noise.height_multiplier", self.noise.height_multiplier),
            ("noise.offset.x", self.noise.offset[0]),
            ("noise.offset.z", self.noise.offset[1]),
        ];
        for (field, value) in floats {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }

        Ok(())
    }

    /// Number of lattice points per axis, `(W+1, H+1, D+1)`.
    ///
    /// Only meaningful on a validated configuration.
    pub fn grid_points(&self) -> [usize; 3] {
        self.chunk_size.map(|cells| cells.max(0) as usize + 1)
    }

    /// Chunk extent as a float vector, used for world-space bookkeeping.
    pub fn chunk_extent(&self) -> Vector3<f32> {
        Vector3::new(
            self.chunk_size[0] as f32,
            self.chunk_size[1] as f32,
            self.chunk_size[2] as f32,
        )
    }
}

/// Which density evaluator the engine should build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DensityBackend {
    /// One sample at a time on the calling thread.
    #[default]
    Sequential,
    /// Lattice split into Z slabs evaluated on a worker pool.
    Parallel {
        /// Worker thread count; 0 means the available parallelism
        #[serde(default)]
        workers: usize,
        /// Number of Z layers per work item; 0 means 1
        #[serde(default)]
        slab_depth: usize,
    },
}

/// What the binary generates on startup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// World position of the first chunk and centre of the region
    pub position: [f32; 3],
    /// Region size in chunks per axis
    pub region: [i32; 3],
}

impl Default for SpawnSettings {
    fn default() -> Self {
        SpawnSettings {
            position: [0.0, 0.0, 0.0],
            region: [3, 1, 3],
        }
    }
}

impl SpawnSettings {
    /// The spawn position as a point.
    pub fn world_position(&self) -> Point3<f32> {
        Point3::new(self.position[0], self.position[1], self.position[2])
    }
}

/// Top-level settings file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The terrain asset
    pub terrain: TerrainConfig,
    /// Density backend selection
    pub backend: DensityBackend,
    /// Startup generation request
    pub spawn: SpawnSettings,
}

impl EngineConfig {
    /// Parses an engine configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses an engine configuration file.
    ///
    /// # Arguments
    /// * `path` - Path of a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_asset_defaults() {
        let config = TerrainConfig::default();
        assert_eq!(config.chunk_size, [32, 32, 32]);
        // (6 * 32 + 32) / 2
        assert_eq!(config.iso_level, 112.0);
        assert_eq!(config.noise.octaves, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_grid_points_adds_one_per_axis() {
        let config = TerrainConfig {
            chunk_size: [4, 5, 6],
            ..TerrainConfig::default()
        };
        assert_eq!(config.grid_points(), [5, 6, 7]);
    }

    #[test]
    fn test_validate_rejects_non_positive_dimension() {
        let config = TerrainConfig {
            chunk_size: [8, 0, 8],
            ..TerrainConfig::default()
        };
        match config.validate() {
            Err(ConfigError::NonPositiveChunkDimension { axis, value }) => {
                assert_eq!(axis, "y");
                assert_eq!(value, 0);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_octaves() {
        let mut config = TerrainConfig::default();
        config.noise.octaves = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveOctaves(0))
        ));
    }

    #[test]
    fn test_validate_rejects_nan_iso_level() {
        let config = TerrainConfig {
            iso_level: f32::NAN,
            ..TerrainConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                field: "iso_level",
                ..
            })
        ));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{
                "terrain": { "chunk_size": [8, 8, 8], "noise": { "octaves": 2 } },
                "backend": { "kind": "parallel", "workers": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.terrain.chunk_size, [8, 8, 8]);
        assert_eq!(config.terrain.noise.octaves, 2);
        assert_eq!(config.terrain.noise.lacunarity, 2.0);
        assert_eq!(
            config.backend,
            DensityBackend::Parallel {
                workers: 2,
                slab_depth: 0
            }
        );
        assert_eq!(config.spawn, SpawnSettings::default());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = EngineConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
