//! # Chunk Module
//!
//! Coordinate bookkeeping between world space and the integer chunk grid, and
//! the record the chunk store keeps for every generated chunk.
//!
//! ## Coordinate Spaces
//!
//! - **World space**: continuous `f32` positions.
//! - **Chunk space**: integer [`ChunkCoord`]s. Chunk `c` has its origin at
//!   `c * chunk_size` in world space.
//! - **Chunk-local mesh space**: extracted meshes are centred on their own
//!   volume, so a local position `p` sits at `origin + p` in world space and
//!   the chunk covers `origin ± chunk_size / 2`.
//!
//! Because of that centring, [`world_to_chunk_coord`] shifts the query by half
//! a chunk before flooring: the chunk it returns is the one whose box
//! contains the query position.
//!
//! ## Supported Range
//!
//! A chunk is only usable if its whole lattice, `coord * size` up to
//! `(coord + 1) * size`, fits in `i32` world coordinates. Positions and
//! regions outside that range are rejected with a [`ConfigError`].

use cgmath::{Point3, Vector3};

use crate::engine_state::{config::TerrainConfig, error::ConfigError, rendering::meshing::Mesh};

/// Integer position of a chunk in the chunk grid.
pub type ChunkCoord = Point3<i32>;

const AXES: [&str; 3] = ["x", "y", "z"];

/// Checks that chunk `value` along `axis` has its whole lattice, from
/// `value * size` to `(value + 1) * size`, inside the `i32` range.
fn checked_axis(axis: &'static str, value: i64, size: i32) -> Result<i32, ConfigError> {
    let size = i64::from(size);
    let fits = |n: i64| i32::try_from(n).is_ok();

    match i32::try_from(value) {
        Ok(coord) if fits(value * size) && fits((value + 1) * size) => Ok(coord),
        _ => Err(ConfigError::ChunkCoordOutOfRange { axis, value }),
    }
}

/// Maps a world position to the coordinate of the chunk containing it.
///
/// Each component is computed as `floor((p + size / 2) / size)`. The result is
/// piecewise constant in `position` and depends only on the chunk size.
///
/// # Errors
/// [`ConfigError::PositionOutOfRange`] if a component is not finite or lands
/// on a chunk whose lattice falls outside `i32` world coordinates.
pub fn world_to_chunk_coord(
    position: Point3<f32>,
    config: &TerrainConfig,
) -> Result<ChunkCoord, ConfigError> {
    let position: [f32; 3] = position.into();
    let mut coord = [0; 3];

    for (i, axis) in AXES.into_iter().enumerate() {
        let p = position[i];
        let size = config.chunk_size[i];
        let chunk = ((p + size as f32 * 0.5) / size as f32).floor();
        let out_of_range = ConfigError::PositionOutOfRange { axis, value: p };

        if !chunk.is_finite() {
            return Err(out_of_range);
        }
        // Saturating cast; anything that saturates is rejected by the range check.
        coord[i] = checked_axis(axis, chunk as i64, size).map_err(|_| out_of_range)?;
    }

    Ok(coord.into())
}

/// An axis-aligned box of chunk coordinates.
///
/// Construction validates the request, so every coordinate a region yields
/// has a representable lattice and the iteration itself cannot overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkRegion {
    start: ChunkCoord,
    dimensions: [i32; 3],
}

impl ChunkRegion {
    /// Region of `dimensions` chunks around `center`.
    ///
    /// Every axis starts at `center - floor(n / 2)`. Odd counts are centred
    /// exactly; even counts extend one chunk further on the negative side.
    ///
    /// # Errors
    /// * [`ConfigError::NonPositiveRegionDimension`] if any count is not positive
    /// * [`ConfigError::RegionTooLarge`] if the total chunk count overflows `i32`
    /// * [`ConfigError::ChunkCoordOutOfRange`] if the box reaches past the
    ///   supported chunk range
    pub fn new(
        center: ChunkCoord,
        dimensions: [i32; 3],
        config: &TerrainConfig,
    ) -> Result<Self, ConfigError> {
        for (axis, &value) in AXES.into_iter().zip(dimensions.iter()) {
            if value <= 0 {
                return Err(ConfigError::NonPositiveRegionDimension { axis, value });
            }
        }

        dimensions[0]
            .checked_mul(dimensions[1])
            .and_then(|n| n.checked_mul(dimensions[2]))
            .ok_or(ConfigError::RegionTooLarge { dimensions })?;

        let center: [i32; 3] = center.into();
        let mut start = [0; 3];
        for (i, axis) in AXES.into_iter().enumerate() {
            let first = i64::from(center[i]) - i64::from(dimensions[i] / 2);
            let last = first + i64::from(dimensions[i]) - 1;

            start[i] = checked_axis(axis, first, config.chunk_size[i])?;
            checked_axis(axis, last, config.chunk_size[i])?;
        }

        Ok(ChunkRegion {
            start: start.into(),
            dimensions,
        })
    }

    /// First coordinate of the region.
    pub fn start(&self) -> ChunkCoord {
        self.start
    }

    /// Number of chunks in the region.
    pub fn len(&self) -> usize {
        self.dimensions.iter().map(|&n| n as usize).product()
    }

    /// Always false; a validated region holds at least one chunk.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All coordinates of the region, in generation order.
    ///
    /// The order is lexicographic with X outermost, then Y, then Z.
    pub fn coords(&self) -> impl Iterator<Item = ChunkCoord> {
        let start = self.start;
        let [nx, ny, nz] = self.dimensions;

        (0..nx).flat_map(move |x| {
            (0..ny).flat_map(move |y| {
                (0..nz).map(move |z| Point3::new(start.x + x, start.y + y, start.z + z))
            })
        })
    }
}

/// World-space origin of chunk `coord`, where its centred mesh is placed.
pub fn chunk_origin(coord: ChunkCoord, config: &TerrainConfig) -> Point3<f32> {
    let extent = config.chunk_extent();
    Point3::new(
        coord.x as f32 * extent.x,
        coord.y as f32 * extent.y,
        coord.z as f32 * extent.z,
    )
}

/// Axis-aligned world-space box of a chunk, for debug drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChunkBounds {
    /// Centre of the box (the chunk origin)
    pub center: Point3<f32>,
    /// Full edge lengths of the box
    pub size: Vector3<f32>,
}

impl ChunkBounds {
    /// Lowest corner of the box.
    pub fn min(&self) -> Point3<f32> {
        self.center - self.size * 0.5
    }

    /// Highest corner of the box.
    pub fn max(&self) -> Point3<f32> {
        self.center + self.size * 0.5
    }

    /// Whether `point` lies inside the box, lower faces inclusive.
    pub fn contains(&self, point: Point3<f32>) -> bool {
        let (min, max) = (self.min(), self.max());
        (min.x..max.x).contains(&point.x)
            && (min.y..max.y).contains(&point.y)
            && (min.z..max.z).contains(&point.z)
    }
}

/// A generated chunk, owned by the chunk store.
///
/// Created once per coordinate; only a store-wide clear removes it.
#[derive(Debug)]
pub struct ChunkRecord {
    coord: ChunkCoord,
    origin: Point3<f32>,
    size: Vector3<f32>,
    mesh: Mesh,
}

impl ChunkRecord {
    /// Creates the record for chunk `coord` with its extracted mesh.
    pub fn new(coord: ChunkCoord, mesh: Mesh, config: &TerrainConfig) -> Self {
        ChunkRecord {
            coord,
            origin: chunk_origin(coord, config),
            size: config.chunk_extent(),
            mesh,
        }
    }

    /// The chunk's grid coordinate.
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    /// World-space position of the chunk-local mesh origin.
    pub fn origin(&self) -> Point3<f32> {
        self.origin
    }

    /// The chunk's mesh in chunk-local, centred coordinates.
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// World-space box covered by the chunk.
    pub fn bounds(&self) -> ChunkBounds {
        ChunkBounds {
            center: self.origin,
            size: self.size,
        }
    }
}
