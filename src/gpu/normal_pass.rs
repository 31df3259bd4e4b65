use wgpu::{BindGroup, Buffer, ComputePass, ComputePipeline, Device};

use crate::grid::Grid;

use super::shaders::{self, Access};

pub struct NormalPass {
    pipeline: ComputePipeline,
    bind_groups: [BindGroup; 2],
}

impl NormalPass {
    pub fn new(device: &Device, params: &Buffer, positions: &[Buffer; 2], normals: &Buffer) -> Self {
        let pipeline = shaders::create_pipeline(
            device,
            "cloth_normals",
            &[Access::Read, Access::ReadWrite],
            shaders::CLOTH_NORMALS_SRC,
        );

        let bind_groups = Self::create_bind_groups(device, &pipeline, params, positions, normals);

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
        normals: &Buffer,
    ) -> [BindGroup; 2] {
        let layout = pipeline.get_bind_group_layout(0);
        [0usize, 1].map(|generation| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("cloth_normals {generation}")),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: params.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: positions[generation].as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: normals.as_entire_binding(),
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
        normals: &Buffer,
    ) {
        self.bind_groups =
            Self::create_bind_groups(device, &self.pipeline, params, positions, normals);
    }

    /// Dispatches the normal estimate over positions of `generation`.
    pub fn run<'a: 'b, 'b>(
        &'a self,
        compute_pass: &'b mut ComputePass<'a>,
        generation: usize,
        grid: Grid,
    ) {
        let (x, y) = shaders::work_groups(grid);

        compute_pass.set_pipeline(&self.pipeline);
        compute_pass.set_bind_group(0, &self.bind_groups[generation], &[]);
        compute_pass.dispatch_workgroups(x, y, 1);
    }
}
