//! Per-particle kernels. Each function reads only immutable buffers and returns the
//! values for one particle, so any number of them can run side by side.

use glam::{Vec3, Vec4};
use rayon::prelude::*;

use crate::{
    config::{PhysicalConstants, RestLengths},
    grid::{Direction, Grid},
};

/// Hookean force pulling `p` toward (or pushing it away from) `neighbor`.
///
/// Coincident points contribute nothing.
#[inline]
pub fn spring_force(p: Vec3, neighbor: Vec3, rest_length: f32, stiffness: f32) -> Vec3 {
    let r = neighbor - p;
    r.normalize_or_zero() * stiffness * (r.length() - rest_length)
}

/// Gravity, spring and damping force on the particle at `(x, y)`.
pub fn accumulate_force(
    grid: Grid,
    positions: &[Vec4],
    x: u32,
    y: u32,
    velocity: Vec3,
    rest_lengths: &RestLengths,
    constants: &PhysicalConstants,
) -> Vec3 {
    let p = positions[grid.index(x, y)].truncate();

    let springs: Vec3 = grid
        .neighbors(x, y)
        .map(|(dir, idx)| {
            spring_force(
                p,
                positions[idx].truncate(),
                rest_lengths.for_class(dir.rest_class()),
                constants.spring_stiffness,
            )
        })
        .sum();

    constants.gravity * constants.particle_mass + springs - constants.damping * velocity
}

/// Semi-implicit Euler: velocity is advanced first and the new velocity moves the
/// position. Returns `(position, velocity)`.
#[inline]
pub fn integrate(force: Vec3, p: Vec3, v: Vec3, inv_mass: f32, dt: f32) -> (Vec3, Vec3) {
    debug_assert!(inv_mass.is_finite());
    let a = force * inv_mass;
    let v_next = v + a * dt;
    let p_next = p + v_next * dt + 0.5 * a * dt * dt;
    (p_next, v_next)
}

/// Next-generation `(position, velocity)` of particle `idx`.
pub fn step_particle(
    grid: Grid,
    positions: &[Vec4],
    velocities: &[Vec4],
    idx: usize,
    rest_lengths: &RestLengths,
    constants: &PhysicalConstants,
    dt: f32,
) -> (Vec4, Vec4) {
    let (x, y) = grid.coords(idx);
    if grid.is_pinned(x, y) {
        return (positions[idx], Vec4::ZERO);
    }

    let p = positions[idx].truncate();
    let v = velocities[idx].truncate();
    let force = accumulate_force(grid, positions, x, y, v, rest_lengths, constants);
    let (p, v) = integrate(force, p, v, constants.inv_mass(), dt);
    (p.extend(1.), v.extend(0.))
}

/// Area-weighted normal at `(x, y)` from the up to 4 triangles spanned by the vertex
/// and consecutive orthogonal neighbours, walked counter-clockwise. Zero when the
/// vertex bounds no triangle.
pub fn vertex_normal(grid: Grid, positions: &[Vec4], x: u32, y: u32) -> Vec3 {
    let p = positions[grid.index(x, y)].truncate();
    let edge = |dir| {
        grid.neighbor(x, y, dir)
            .map(|idx| positions[idx].truncate() - p)
    };
    let ring = [
        edge(Direction::Right),
        edge(Direction::Up),
        edge(Direction::Left),
        edge(Direction::Down),
    ];

    (0..4)
        .filter_map(|i| match (ring[i], ring[(i + 1) % 4]) {
            (Some(a), Some(b)) => Some(a.cross(b)),
            _ => None,
        })
        .sum::<Vec3>()
        .normalize_or_zero()
}

/// Recomputes every normal from `positions`.
pub fn compute_normals(grid: Grid, positions: &[Vec4], normals: &mut [Vec4]) {
    debug_assert_eq!(positions.len(), grid.len());
    normals.par_iter_mut().enumerate().for_each(|(idx, n)| {
        let (x, y) = grid.coords(idx);
        *n = vertex_normal(grid, positions, x, y).extend(0.);
    });
}
