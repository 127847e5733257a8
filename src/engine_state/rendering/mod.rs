//! # Rendering Module
//!
//! Everything between a density grid and something a renderer can draw:
//! surface extraction, the mesh type, the vertex layout and the mesh sinks
//! generated chunks are uploaded to.
//!
//! Nothing in here talks to a GPU. Presentation lives behind the
//! [`meshing::MeshSink`] trait, supplied by whoever owns the chunk store.

pub mod meshing;
mod vertex;

pub use vertex::Vertex;
