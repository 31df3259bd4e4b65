use glam::Vec4;
use log::{debug, info, trace};
use rayon::prelude::*;

use crate::{
    config::{ClothDesc, PhysicalConstants, RestLengths},
    grid::Grid,
    kernels, mesh, ClothError,
};

/// Splits a double buffer into the generation to read and the one to write.
fn generations<T>(buffers: &mut [Vec<T>; 2], current: usize) -> (&[T], &mut [T]) {
    let [a, b] = buffers;
    if current == 0 {
        (a.as_slice(), b.as_mut_slice())
    } else {
        (b.as_slice(), a.as_mut_slice())
    }
}

/// Cloth simulated on the CPU, one rayon task per particle.
///
/// Positions and velocities are double buffered: a step reads generation `current`
/// and writes the other one, then flips `current`. Nothing outside this type can
/// write to the buffers.
pub struct CpuSimulation {
    grid: Grid,
    rest_lengths: RestLengths,
    constants: PhysicalConstants,
    substeps: u32,
    positions: [Vec<Vec4>; 2],
    velocities: [Vec<Vec4>; 2],
    normals: Vec<Vec4>,
    current: usize,
    steps: u64,
}

impl CpuSimulation {
    pub fn new(desc: &ClothDesc) -> Result<Self, ClothError> {
        desc.validate()?;

        let grid = desc.grid();
        let positions = mesh::initial_positions(desc);
        let velocities = vec![Vec4::ZERO; grid.len()];
        let mut normals = vec![Vec4::ZERO; grid.len()];
        kernels::compute_normals(grid, &positions, &mut normals);

        info!(
            "cpu cloth {}x{} ({} particles), rest lengths {:?}",
            grid.width(),
            grid.height(),
            grid.len(),
            desc.rest_lengths
        );

        Ok(Self {
            grid,
            rest_lengths: desc.rest_lengths,
            constants: desc.constants,
            substeps: desc.substeps,
            positions: [positions.clone(), positions],
            velocities: [velocities.clone(), velocities],
            normals,
            current: 0,
            steps: 0,
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn constants(&self) -> &PhysicalConstants {
        &self.constants
    }

    pub fn rest_lengths(&self) -> &RestLengths {
        &self.rest_lengths
    }

    /// Index (0 or 1) of the generation holding the current state.
    pub fn generation(&self) -> usize {
        self.current
    }

    /// Integration steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Current positions in grid order, `w = 1`.
    pub fn positions(&self) -> &[Vec4] {
        &self.positions[self.current]
    }

    /// Current velocities in grid order, `w = 0`.
    pub fn velocities(&self) -> &[Vec4] {
        &self.velocities[self.current]
    }

    /// Normals of the current positions, `w = 0`.
    pub fn normals(&self) -> &[Vec4] {
        &self.normals
    }

    /// Advances the cloth by `dt` and recomputes the normals.
    pub fn step(&mut self, dt: f32) {
        self.integrate(dt);
        self.recalc_normals();
    }

    /// Runs the configured number of substeps with the configured timestep, then
    /// recomputes the normals once.
    pub fn advance_frame(&mut self) {
        let (substeps, dt) = (self.substeps, self.constants.timestep);
        debug!("cpu cloth frame: {substeps} substeps of {dt}s");
        for _ in 0..substeps {
            self.integrate(dt);
        }
        self.recalc_normals();
    }

    fn integrate(&mut self, dt: f32) {
        let grid = self.grid;
        let rest_lengths = &self.rest_lengths;
        let constants = &self.constants;
        let (pos_in, pos_out) = generations(&mut self.positions, self.current);
        let (vel_in, vel_out) = generations(&mut self.velocities, self.current);

        pos_out
            .par_iter_mut()
            .zip(vel_out.par_iter_mut())
            .enumerate()
            .for_each(|(idx, (p, v))| {
                (*p, *v) = kernels::step_particle(
                    grid,
                    pos_in,
                    vel_in,
                    idx,
                    rest_lengths,
                    constants,
                    dt,
                );
            });

        self.current = 1 - self.current;
        self.steps += 1;
        trace!(
            "cpu cloth step {} (dt {dt}), generation {}",
            self.steps,
            self.current
        );
    }

    fn recalc_normals(&mut self) {
        kernels::compute_normals(
            self.grid,
            &self.positions[self.current],
            &mut self.normals,
        );
    }
}
