//! Seed positions and the static render data of the cloth mesh.

use glam::{Mat4, Vec2, Vec4};

use crate::{config::ClothDesc, grid::Grid};

/// Marks the end of a triangle strip in [`strip_indices`]. This is the value wgpu
/// restarts `Uint32` strips on, and validated grids never reach it as a vertex index.
pub const PRIMITIVE_RESTART: u32 = u32::MAX;

/// Positions of the undeformed sheet with `desc.transform` applied.
pub fn initial_positions(desc: &ClothDesc) -> Vec<Vec4> {
    let grid = desc.grid();
    let rest = desc.rest_lengths;
    (0..grid.len())
        .map(|idx| {
            let (x, y) = grid.coords(idx);
            let p = Vec4::new(x as f32 * rest.horizontal, y as f32 * rest.vertical, 0., 1.);
            if desc.transform == Mat4::IDENTITY {
                p
            } else {
                desc.transform * p
            }
        })
        .collect()
}

/// One triangle strip per pair of adjacent rows, each followed by
/// [`PRIMITIVE_RESTART`].
pub fn strip_indices(grid: Grid) -> Vec<u32> {
    let (w, h) = (grid.width(), grid.height());
    if grid.is_empty() {
        return Vec::new();
    }
    let mut indices = Vec::with_capacity(h.saturating_sub(1) as usize * (2 * w as usize + 1));
    for row in 0..h.saturating_sub(1) {
        for col in 0..w {
            indices.push((row + 1) * w + col);
            indices.push(row * w + col);
        }
        indices.push(PRIMITIVE_RESTART);
    }
    indices
}

/// Texture coordinates spanning `[0, 1]` across the grid.
pub fn tex_coords(grid: Grid) -> Vec<Vec2> {
    fn step(n: u32) -> f32 {
        if n > 1 {
            1. / (n - 1) as f32
        } else {
            0.
        }
    }
    let (ds, dt) = (step(grid.width()), step(grid.height()));
    (0..grid.len())
        .map(|idx| {
            let (x, y) = grid.coords(idx);
            Vec2::new(x as f32 * ds, y as f32 * dt)
        })
        .collect()
}
