use std::sync::mpsc;

use encase::{ShaderType, StorageBuffer, UniformBuffer};
use glam::{Vec3, Vec4};
use log::{debug, info};
use thiserror::Error;
use wgpu::{
    util::{DeviceExt, DownloadBuffer},
    Buffer, BufferUsages, CommandEncoder, Device, Queue,
};

use crate::{
    config::{ClothDesc, PhysicalConstants, RestLengths},
    grid::Grid,
    kernels, mesh, ClothError,
};

use self::{normal_pass::NormalPass, spring_step::SpringStep};

mod context;
mod normal_pass;
mod shaders;
mod spring_step;

pub use context::request_device;

#[derive(Debug, Error)]
pub enum GpuError {
    #[error(transparent)]
    Config(#[from] ClothError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to request GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("failed to map buffer for reading: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("failed to encode {what}: {reason}")]
    Encode { what: &'static str, reason: String },
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("readback of {0} did not complete")]
    ReadbackPending(&'static str),
    #[error("cloth grid {width}x{height} needs {needed} but the device allows {allowed} ({limit})")]
    GridTooLarge {
        width: u32,
        height: u32,
        limit: &'static str,
        needed: u64,
        allowed: u64,
    },
}

#[derive(Clone, Copy, ShaderType)]
struct ClothParams {
    gravity: Vec3,
    particle_mass: f32,
    particle_inv_mass: f32,
    spring_k: f32,
    rest_length_horiz: f32,
    rest_length_vert: f32,
    rest_length_diag: f32,
    damping: f32,
    delta_t: f32,
    width: u32,
    height: u32,
}

impl ClothParams {
    fn new(
        grid: Grid,
        rest_lengths: &RestLengths,
        constants: &PhysicalConstants,
        delta_t: f32,
    ) -> Self {
        Self {
            gravity: constants.gravity,
            particle_mass: constants.particle_mass,
            particle_inv_mass: constants.inv_mass(),
            spring_k: constants.spring_stiffness,
            rest_length_horiz: rest_lengths.horizontal,
            rest_length_vert: rest_lengths.vertical,
            rest_length_diag: rest_lengths.diagonal,
            damping: constants.damping,
            delta_t,
            width: grid.width(),
            height: grid.height(),
        }
    }
}

/// Cloth simulated with compute shaders, one invocation per particle.
///
/// Positions and velocities live in two generations of storage buffers; each step
/// dispatch reads one and writes the other. The generation index is flipped when
/// the dispatches are encoded, so reads through [`GpuSimulation::positions_buffer`]
/// or the download methods see the new state once the encoder has been submitted.
pub struct GpuSimulation {
    grid: Grid,
    rest_lengths: RestLengths,
    constants: PhysicalConstants,
    substeps: u32,
    spring_step: SpringStep,
    normal_pass: NormalPass,
    positions: [Buffer; 2],
    velocities: [Buffer; 2],
    normals: Buffer,
    params: Buffer,
    current: usize,
}

impl GpuSimulation {
    pub fn new(device: &Device, desc: &ClothDesc) -> Result<Self, GpuError> {
        fn create_buffer(device: &Device, els: &[Vec4], usage: BufferUsages, label: &str) -> Buffer {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(els),
                usage,
            })
        }

        desc.validate()?;

        let grid = desc.grid();
        check_limits(&device.limits(), grid)?;

        let initial_positions = mesh::initial_positions(desc);
        let initial_velocities = vec![Vec4::ZERO; grid.len()];
        let mut initial_normals = vec![Vec4::ZERO; grid.len()];
        kernels::compute_normals(grid, &initial_positions, &mut initial_normals);

        let state = BufferUsages::STORAGE | BufferUsages::COPY_SRC | BufferUsages::COPY_DST;

        let positions = [0, 1].map(|generation| {
            create_buffer(
                device,
                &initial_positions,
                state | BufferUsages::VERTEX,
                &format!("Positions {generation}"),
            )
        });

        let velocities = [0, 1].map(|generation| {
            create_buffer(
                device,
                &initial_velocities,
                state,
                &format!("Velocities {generation}"),
            )
        });

        let normals = create_buffer(
            device,
            &initial_normals,
            state | BufferUsages::VERTEX,
            "Normals",
        );

        let params = create_params(
            device,
            &ClothParams::new(
                grid,
                &desc.rest_lengths,
                &desc.constants,
                desc.constants.timestep,
            ),
        )?;

        let spring_step = SpringStep::new(device, &params, &positions, &velocities);
        let normal_pass = NormalPass::new(device, &params, &positions, &normals);

        info!(
            "gpu cloth {}x{} ({} particles), rest lengths {:?}",
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
            spring_step,
            normal_pass,
            positions,
            velocities,
            normals,
            params,
            current: 0,
        })
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn generation(&self) -> usize {
        self.current
    }

    /// Buffer holding the current positions, one `vec4<f32>` per particle.
    pub fn positions_buffer(&self) -> &Buffer {
        &self.positions[self.current]
    }

    pub fn normals_buffer(&self) -> &Buffer {
        &self.normals
    }

    /// Encodes `substeps` integration steps of `delta` seconds followed by one normal
    /// estimate.
    pub fn simulate(
        &mut self,
        device: &Device,
        encoder: &mut CommandEncoder,
        substeps: u32,
        delta: f32,
    ) -> Result<(), GpuError> {
        let params = ClothParams::new(self.grid, &self.rest_lengths, &self.constants, delta);
        self.params = create_params(device, &params)?;

        self.spring_step
            .update_bind_groups(device, &self.params, &self.positions, &self.velocities);
        self.normal_pass
            .update_bind_groups(device, &self.params, &self.positions, &self.normals);

        debug!("gpu cloth frame: {substeps} substeps of {delta}s");

        let mut generation = self.current;
        {
            let mut cpass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("cloth frame"),
            });
            for _ in 0..substeps {
                self.spring_step.run(&mut cpass, generation, self.grid);
                generation = 1 - generation;
            }
            self.normal_pass.run(&mut cpass, generation, self.grid);
        }
        self.current = generation;

        Ok(())
    }

    /// [`GpuSimulation::simulate`] with the configured substeps and timestep.
    pub fn advance_frame(
        &mut self,
        device: &Device,
        encoder: &mut CommandEncoder,
    ) -> Result<(), GpuError> {
        self.simulate(device, encoder, self.substeps, self.constants.timestep)
    }

    pub fn download_positions(&self, device: &Device, queue: &Queue) -> Result<Vec<Vec4>, GpuError> {
        download(device, queue, &self.positions[self.current], "positions")
    }

    pub fn download_velocities(
        &self,
        device: &Device,
        queue: &Queue,
    ) -> Result<Vec<Vec4>, GpuError> {
        download(device, queue, &self.velocities[self.current], "velocities")
    }

    pub fn download_normals(&self, device: &Device, queue: &Queue) -> Result<Vec<Vec4>, GpuError> {
        download(device, queue, &self.normals, "normals")
    }
}

/// Rejects grids whose state buffers or dispatch size exceed what `limits` allow.
fn check_limits(limits: &wgpu::Limits, grid: Grid) -> Result<(), GpuError> {
    let too_large = |limit, needed: u64, allowed: u64| {
        if needed > allowed {
            Err(GpuError::GridTooLarge {
                width: grid.width(),
                height: grid.height(),
                limit,
                needed,
                allowed,
            })
        } else {
            Ok(())
        }
    };

    let bytes = grid.len() as u64 * std::mem::size_of::<Vec4>() as u64;
    too_large(
        "max_storage_buffer_binding_size",
        bytes,
        limits.max_storage_buffer_binding_size as u64,
    )?;
    too_large("max_buffer_size", bytes, limits.max_buffer_size)?;

    let (x, y) = shaders::work_groups(grid);
    let max_groups = limits.max_compute_workgroups_per_dimension as u64;
    too_large("max_compute_workgroups_per_dimension", x as u64, max_groups)?;
    too_large("max_compute_workgroups_per_dimension", y as u64, max_groups)
}

fn create_params(device: &Device, params: &ClothParams) -> Result<Buffer, GpuError> {
    let mut buffer = UniformBuffer::new(Vec::new());
    buffer.write(params).map_err(|e| GpuError::Encode {
        what: "cloth params",
        reason: format!("{e:?}"),
    })?;

    Ok(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Cloth params"),
        contents: &buffer.into_inner(),
        usage: BufferUsages::UNIFORM,
    }))
}

/// Copies `buffer` back to the host, blocking until the copy has finished.
fn download(
    device: &Device,
    queue: &Queue,
    buffer: &Buffer,
    what: &'static str,
) -> Result<Vec<Vec4>, GpuError> {
    let (sender, receiver) = mpsc::channel();
    DownloadBuffer::read_buffer(device, queue, &buffer.slice(..), move |result| {
        let decoded = result.map_err(GpuError::from).and_then(|buff| {
            let mut values: Vec<Vec4> = Vec::new();
            StorageBuffer::new(&buff[..])
                .read(&mut values)
                .map_err(|e| GpuError::Decode {
                    what,
                    reason: format!("{e:?}"),
                })?;
            Ok(values)
        });
        // Nobody is listening only if the caller already gave up.
        let _ = sender.send(decoded);
    });

    device.poll(wgpu::Maintain::Wait);
    receiver
        .try_recv()
        .map_err(|_| GpuError::ReadbackPending(what))?
}
