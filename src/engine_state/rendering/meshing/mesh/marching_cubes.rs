//! Marching-cubes surface extraction.
//!
//! Every unit cell of the density grid is classified by which of its eight
//! corners lie below the iso-level. That 8-bit case index selects the crossed
//! edges from [`EDGE_TABLE`] and the triangles from [`TRIANGLE_TABLE`]; the
//! surface crosses each edge at the linearly interpolated iso-level position.

use cgmath::{Point3, Vector3};
use log::debug;

use crate::engine_state::{config::TerrainConfig, voxels::density::DensityGrid};

use super::{
    mesh::Mesh,
    tables::{CORNER_OFFSETS, EDGE_CORNERS, EDGE_TABLE, TRIANGLE_SENTINEL, TRIANGLE_TABLE},
};

/// Case index of a cell: bit `i` is set iff corner `i` is below `iso_level`.
pub fn cube_index(corners: &[f32; 8], iso_level: f32) -> usize {
    corners
        .iter()
        .enumerate()
        .filter(|(_, density)| **density < iso_level)
        .fold(0, |index, (corner, _)| index | 1 << corner)
}

/// Position of the iso-level crossing along an edge, as a fraction from `a` to `b`.
///
/// Clamped to `[0, 1]`. Equal densities have no crossing point and resolve
/// to `0`, the `a` end, instead of dividing by zero.
pub fn edge_interpolation(iso_level: f32, density_a: f32, density_b: f32) -> f32 {
    let t = (iso_level - density_a) / (density_b - density_a);
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

/// Reads the eight corner densities of cell `(x, y, z)`.
fn cell_corners(grid: &DensityGrid, x: usize, y: usize, z: usize) -> [f32; 8] {
    CORNER_OFFSETS.map(|[dx, dy, dz]| grid.get(x + dx, y + dy, z + dz))
}

/// Corner offset as a float point.
fn corner_point(corner: usize) -> Point3<f32> {
    let [x, y, z] = CORNER_OFFSETS[corner];
    Point3::new(x as f32, y as f32, z as f32)
}

/// Builds the triangle mesh of the iso-surface in `grid`.
///
/// Positions are chunk-local and centred: the lattice point `(x, y, z)` maps
/// to `(x, y, z) - chunk_size / 2`. Every triangle gets three fresh vertices,
/// pushed in table order and indexed as `(a, c, b)` so front faces are
/// counter-clockwise seen from the region below the iso-level. Normals are
/// recalculated after all cells are processed.
pub fn extract(grid: &DensityGrid, config: &TerrainConfig) -> Mesh {
    let iso_level = config.iso_level;
    let half_extent = config.chunk_extent() * 0.5;
    let [width, height, depth] = grid.dimensions().map(|points| points.saturating_sub(1));

    let mut mesh = Mesh::new();
    let mut edge_vertices = [Point3::new(0.0f32, 0.0, 0.0); 12];

    for x in 0..width {
        for y in 0..height {
            for z in 0..depth {
                let corners = cell_corners(grid, x, y, z);
                let case = cube_index(&corners, iso_level);

                let edge_mask = EDGE_TABLE[case];
                if edge_mask == 0 {
                    continue;
                }

                let cell = Vector3::new(x as f32, y as f32, z as f32);
                for (edge, [a, b]) in EDGE_CORNERS.iter().copied().enumerate() {
                    if edge_mask & (1 << edge) == 0 {
                        continue;
                    }
                    let t = edge_interpolation(iso_level, corners[a], corners[b]);
                    let (p1, p2) = (corner_point(a), corner_point(b));
                    edge_vertices[edge] = p1 + (p2 - p1) * t + cell - half_extent;
                }

                for triangle in TRIANGLE_TABLE[case].chunks_exact(3) {
                    if triangle[0] == TRIANGLE_SENTINEL {
                        break;
                    }
                    let a = mesh.push_vertex(edge_vertices[triangle[0] as usize]);
                    let b = mesh.push_vertex(edge_vertices[triangle[1] as usize]);
                    let c = mesh.push_vertex(edge_vertices[triangle[2] as usize]);
                    mesh.push_triangle(a, c, b);
                }
            }
        }
    }

    mesh.recalculate_normals();

    debug!(
        "Extracted {} triangle(s) from {}x{}x{} cells",
        mesh.triangle_count(),
        width,
        height,
        depth
    );

    mesh
}

#[cfg(test)]
mod tests {
    use cgmath::InnerSpace;

    use super::*;

    fn config(size: [i32; 3], iso_level: f32) -> TerrainConfig {
        TerrainConfig {
            chunk_size: size,
            iso_level,
            ..TerrainConfig::default()
        }
    }

    /// Grid filled from a closure over lattice coordinates.
    fn grid_from(size: [i32; 3], f: impl Fn(usize, usize, usize) -> f32) -> DensityGrid {
        let dims = size.map(|n| n as usize + 1);
        let mut values = Vec::new();
        for z in 0..dims[2] {
            for y in 0..dims[1] {
                for x in 0..dims[0] {
                    values.push(f(x, y, z));
                }
            }
        }
        DensityGrid::from_flat(dims, values).unwrap()
    }

    #[test]
    fn test_cube_index_bits() {
        let iso = 0.5;
        assert_eq!(cube_index(&[1.0; 8], iso), 0);
        assert_eq!(cube_index(&[0.0; 8], iso), 255);
        let mut corners = [1.0; 8];
        corners[0] = 0.0;
        corners[6] = 0.2;
        assert_eq!(cube_index(&corners, iso), 0b0100_0001);
        // Exactly at the iso-level counts as not below.
        corners[0] = iso;
        assert_eq!(cube_index(&corners, iso), 0b0100_0000);
    }

    #[test]
    fn test_uniform_cells_produce_nothing() {
        let config = config([3, 3, 3], 0.5);
        assert!(extract(&grid_from([3, 3, 3], |_, _, _| 0.1), &config).is_empty());
        assert!(extract(&grid_from([3, 3, 3], |_, _, _| 0.9), &config).is_empty());
        assert!(extract(&grid_from([3, 3, 3], |_, _, _| 0.5), &config).is_empty());
    }

    #[test]
    fn test_interpolation_midpoint() {
        let t = edge_interpolation(0.5, 0.0, 1.0);
        assert_eq!(t, 0.5);

        let (p1, p2) = (corner_point(0), corner_point(1));
        assert_eq!(p1 + (p2 - p1) * t, Point3::new(0.5, 0.0, 0.0));
    }

    #[test]
    fn test_interpolation_clamps() {
        assert_eq!(edge_interpolation(2.0, 0.0, 1.0), 1.0);
        assert_eq!(edge_interpolation(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(edge_interpolation(0.25, 1.0, 0.0), 0.75);
    }

    #[test]
    fn test_interpolation_equal_densities_does_not_fail() {
        assert_eq!(edge_interpolation(0.5, 0.5, 0.5), 0.0);
        let t = edge_interpolation(0.7, 0.2, 0.2);
        assert!((0.0..=1.0).contains(&t));
    }

    #[test]
    fn test_single_corner_case() {
        // Only lattice point (0,0,0) is below the iso-level.
        let config = config([1, 1, 1], 0.5);
        let grid = grid_from([1, 1, 1], |x, y, z| if x + y + z == 0 { 0.0 } else { 1.0 });
        let mesh = extract(&grid, &config);

        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);

        // Table order for case 1 is edges (0, 8, 3); half a cell along x, y, z
        // from corner 0, re-centred by half the chunk extent.
        assert_eq!(
            mesh.positions(),
            &[
                Point3::new(0.0, -0.5, -0.5),
                Point3::new(-0.5, 0.0, -0.5),
                Point3::new(-0.5, -0.5, 0.0),
            ]
        );
        // Winding is reversed relative to the table.
        assert_eq!(mesh.indices(), &[0, 2, 1]);

        // The face points towards the below-iso corner.
        let normal = mesh.normals()[0];
        let expected = Vector3::new(-1.0, -1.0, -1.0).normalize();
        assert!((normal - expected).magnitude() < 1e-5, "{normal:?}");
    }

    #[test]
    fn test_flat_surface() {
        // Lattice layer y = 0 sits exactly on the iso-level, everything above is below it.
        let size = [4, 3, 2];
        let iso = 10.0;
        let config = config(size, iso);
        let grid = grid_from(size, |_, y, _| iso - y as f32);
        let mesh = extract(&grid, &config);

        assert_eq!(mesh.triangle_count(), 4 * 2 * 2);
        assert_eq!(mesh.vertex_count(), mesh.triangle_count() * 3);
        for position in mesh.positions() {
            assert_eq!(position.y, -1.5);
            assert!((-2.0..=2.0).contains(&position.x));
            assert!((-1.0..=1.0).contains(&position.z));
        }
        for normal in mesh.normals() {
            assert!((normal - Vector3::unit_y()).magnitude() < 1e-5, "{normal:?}");
        }
    }

    #[test]
    fn test_sloped_surface_crosses_at_iso_level() {
        // Density falls off along x; the surface is the plane x = 1.25.
        let size = [3, 2, 2];
        let config = config(size, 0.0);
        let grid = grid_from(size, |x, _, _| 1.25 - x as f32);
        let mesh = extract(&grid, &config);

        assert!(!mesh.is_empty());
        for position in mesh.positions() {
            assert!((position.x - (1.25 - 1.5)).abs() < 1e-6, "{position:?}");
        }
    }
}
