//! # Terrain Errors
//!
//! Error types returned by the generation entry points.
//!
//! Validation problems and density-backend faults are kept in separate enums so
//! callers can tell "fix your terrain asset" apart from "this backend broke, try
//! the sequential one".

use std::path::PathBuf;

use thiserror::Error;

/// A terrain configuration or generation request that cannot be honoured.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A chunk dimension is zero or negative.
    #[error("chunk {axis} dimension must be positive, got {value}")]
    NonPositiveChunkDimension {
        /// Axis name (`"x"`, `"y"` or `"z"`)
        axis: &'static str,
        /// The rejected value
        value: i32,
    },
    /// The noise octave count is below one.
    #[error("noise octave count must be at least 1, got {0}")]
    NonPositiveOctaves(i32),
    /// A floating-point parameter is NaN or infinite.
    #[error("{field} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending parameter
        field: &'static str,
        /// The rejected value
        value: f32,
    },
    /// A region request has a zero or negative chunk count on some axis.
    #[error("region {axis} dimension must be positive, got {value}")]
    NonPositiveRegionDimension {
        /// Axis name (`"x"`, `"y"` or `"z"`)
        axis: &'static str,
        /// The rejected value
        value: i32,
    },
    /// A region request covers more chunks than can be counted.
    #[error("region of {dimensions:?} chunks is too large")]
    RegionTooLarge {
        /// The requested chunk counts per axis
        dimensions: [i32; 3],
    },
    /// A world position does not map to a chunk of the supported grid.
    #[error("world {axis} position {value} is outside the chunk grid")]
    PositionOutOfRange {
        /// Axis name (`"x"`, `"y"` or `"z"`)
        axis: &'static str,
        /// The rejected position component
        value: f32,
    },
    /// A chunk coordinate whose lattice would not fit integer world coordinates.
    #[error("chunk {axis} coordinate {value} is outside the supported range")]
    ChunkCoordOutOfRange {
        /// Axis name (`"x"`, `"y"` or `"z"`)
        axis: &'static str,
        /// The rejected coordinate
        value: i64,
    },
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid JSON for the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A failure inside a density evaluator backend.
///
/// These are fatal for the generation call that hit them. The sequential
/// backend never produces them.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    /// A worker thread could not be started.
    #[error("failed to spawn density worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
    /// A worker hung up before accepting a work item or returning its result.
    #[error("density worker disconnected before returning its results")]
    WorkerDisconnected,
    /// The assembled readback buffer does not match the lattice size.
    #[error("density readback holds {actual} values, expected {expected}")]
    ReadbackSizeMismatch {
        /// Number of lattice points the grid needs
        expected: usize,
        /// Number of values actually read back
        actual: usize,
    },
}

/// Error returned by the chunk store's generation entry points.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// The request was rejected before any work was done.
    #[error("invalid terrain configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The density backend failed while sampling a chunk.
    #[error("density evaluation failed: {0}")]
    DensityEvaluation(#[from] EvaluatorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display_names_axis() {
        let err = ConfigError::NonPositiveChunkDimension {
            axis: "y",
            value: 0,
        };
        let msg = format!("{err}");
        assert!(msg.contains("chunk y dimension"), "got: {msg}");
        assert!(msg.contains('0'), "got: {msg}");
    }

    #[test]
    fn test_terrain_error_keeps_validation_and_evaluation_apart() {
        let invalid: TerrainError = ConfigError::NonPositiveOctaves(0).into();
        let failed: TerrainError = EvaluatorError::WorkerDisconnected.into();

        assert!(matches!(invalid, TerrainError::InvalidConfig(_)));
        assert!(matches!(failed, TerrainError::DensityEvaluation(_)));
    }

    #[test]
    fn test_worker_spawn_exposes_source() {
        let err = EvaluatorError::WorkerSpawn(std::io::Error::new(
            std::io::ErrorKind::OutOfMemory,
            "no threads left",
        ));
        assert!(std::error::Error::source(&err).is_some());
    }
}
