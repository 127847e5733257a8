//! # Voxel Task System
//!
//! Work items the density backends hand to the worker pool.

pub mod density_slab_task;
