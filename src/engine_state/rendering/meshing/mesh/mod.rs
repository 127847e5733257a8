//! Surface extraction and the mesh it produces.
//!
//! # Architecture
//! - [`Mesh`]: vertex positions, triangle indices and recalculated normals
//! - [`marching_cubes::extract`]: density grid to mesh, one unit cell at a time
//! - [`tables`]: the fixed 256-case edge and triangle lookup tables
//!
//! # Usage
//! ```rust
//! use cgmath::Point3;
//! use marching_terrain::engine_state::{
//!     config::TerrainConfig,
//!     rendering::meshing::extract,
//!     voxels::density::{DensityEvaluator, SequentialDensityEvaluator},
//! };
//!
//! let config = TerrainConfig {
//!     chunk_size: [8, 8, 8],
//!     iso_level: 4.0,
//!     ..TerrainConfig::default()
//! };
//! let grid = SequentialDensityEvaluator
//!     .sample(Point3::new(0, 0, 0), &config)
//!     .unwrap();
//! let mesh = extract(&grid, &config);
//! assert_eq!(mesh.vertex_count(), mesh.triangle_count() * 3);
//! ```

pub mod marching_cubes;
mod mesh;
pub mod tables;

pub use marching_cubes::extract;
pub use mesh::Mesh;
