//! # Engine State Module
//!
//! The subsystems that make up the terrain generator.
//!
//! ## Key Components
//!
//! * `config` - Terrain asset and engine settings, loaded from JSON
//! * `error` - Validation and generation errors
//! * `rendering` - Marching-cubes meshing, vertex layout and mesh sinks
//! * `task_management` - Worker threads used by the parallel density backend
//! * `voxels` - Noise, density sampling, chunk bookkeeping and the chunk store
//!
//! ## Architecture
//!
//! Dependencies are passed in rather than looked up: the chunk store receives
//! its density evaluator and its mesh sink at construction, and the evaluator
//! is chosen from configuration through [`config::DensityBackend`].

pub mod config;
pub mod error;
pub mod rendering;
pub mod task_management;
pub mod voxels;
