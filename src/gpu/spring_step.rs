use wgpu::{BindGroup, Buffer, ComputePass, ComputePipeline, Device};

use crate::grid::Grid;

use super::shaders::{self, Access};

/// Force accumulation and integration for every particle, reading one generation of
/// positions and velocities and writing the other.
pub struct SpringStep {
    pipeline: ComputePipeline,
    /// Indexed by the generation read.
    bind_groups: [BindGroup; 2],
}

impl SpringStep {
    pub fn new(
        device: &Device,
        params: &Buffer,
        positions: &[Buffer; 2],
        velocities: &[Buffer; 2],
    ) -> Self {
        // positions in/out, velocities in/out
        let pipeline = shaders::create_pipeline(
            device,
            "cloth_step",
            &[Access::Read, Access::ReadWrite, Access::Read, Access::ReadWrite],
            shaders::CLOTH_STEP_SRC,
        );

        let bind_groups =
            Self::create_bind_groups(device, &pipeline, params, positions, velocities);

        Self {
            pipeline,
            bind_groups,
        }
    }

    fn create_bind_groups(
        device: &Device,
        pipeline: &ComputePipeline,
        params: &Buffer,
        positions: &[Buffer; 2],
        velocities: &[Buffer; 2],
    ) -> [BindGroup; 2] {
        let layout = pipeline.get_bind_group_layout(0);
        [0usize, 1].map(|read| {
            let write = 1 - read;
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("cloth_step {read} -> {write}")),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: positions[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: positions[write].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: velocities[read].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: velocities[write].as_entire_binding(),
                    },
                ],
            })
        })
    }

    pub fn update_bind_groups(
        &mut self,
        device: &Device,
        params: &Buffer,
        positions: &[Buffer; 2],
        velocities: &[Buffer; 2],
    ) {
        self.bind_groups =
            Self::create_bind_groups(device, &self.pipeline, params, positions, velocities);
    }

    /// Dispatches one step that reads generation `read`.
    pub fn run<'a: 'b, 'b>(
        &'a self,
        compute_pass: &'b mut ComputePass<'a>,
        read: usize,
        grid: Grid,
    ) {
        let (x, y) = shaders::work_groups(grid);

        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, &self.bind_groups[read], &[]);
        compute_pass.dispatch_workgroups(x, y, 1);
    }
}
