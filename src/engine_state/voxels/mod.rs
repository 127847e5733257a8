//! # Voxel Terrain Core
//!
//! Everything needed to go from a noise function to chunked terrain meshes.
//!
//! ## Architecture
//!
//! * **Noise field**: the deterministic fractal height function
//! * **Density**: per-chunk density lattices and the backends that fill them
//! * **Chunk**: coordinate mapping between world and chunk space, and chunk records
//! * **Tasks**: work items the parallel density backend hands to its worker pool
//! * **World**: the chunk store that drives generation
//!
//! ## Data Flow
//!
//! 1. The store maps a world position to a chunk coordinate
//! 2. For a missing coordinate the density backend samples the lattice
//! 3. Marching cubes turns the lattice into a mesh
//! 4. The mesh goes to the mesh sink and the chunk record is stored

pub mod chunk;
pub mod density;
pub mod noise_field;
pub mod tasks;
pub mod world;
