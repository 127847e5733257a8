//! # Core Module
//!
//! Shared-ownership primitives used to hand the same collaborator to more than
//! one owner, for example a mesh sink that the chunk store writes into while
//! the host reads the uploaded buffers.
//!
//! ## Key Components
//! - `MtResource`: Thread-safe reference-counted resource with read-write locking
//!
//! ## Usage
//! ```rust
//! use marching_terrain::core::MtResource;
//!
//! let counter = MtResource::new(0);
//! *counter.get_mut() += 1;
//! assert_eq!(*counter.get(), 1);
//! ```

pub mod mt_resource;

pub use mt_resource::MtResource;
