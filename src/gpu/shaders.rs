use wgpu::{ComputePipeline, Device};

use crate::grid::Grid;

pub const COMMON_SRC: &str = include_str!("shaders/common.wgsl");
pub const CLOTH_STEP_SRC: &str = include_str!("shaders/cloth_step.wgsl");
pub const CLOTH_NORMALS_SRC: &str = include_str!("shaders/cloth_normals.wgsl");

/// Edge length of the square workgroups declared in the shaders.
pub const WORKGROUP_SIZE: u32 = 8;

/// How a kernel accesses one of its storage buffers.
#[derive(Clone, Copy)]
pub enum Access {
    Read,
    ReadWrite,
}

/// Workgroups covering every particle of `grid`. Invocations past the edge return
/// early in the shaders.
pub fn work_groups(grid: Grid) -> (u32, u32) {
    (
        (grid.width() / WORKGROUP_SIZE) + 1,
        (grid.height() / WORKGROUP_SIZE) + 1,
    )
}

fn buffer_entry(binding: u32, ty: wgpu::BufferBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Builds the compute pipeline of a cloth kernel. `kernel_src` is appended to
/// [`COMMON_SRC`], whose `ClothParams` uniform sits at binding 0; `storage` lists the
/// kernel's storage buffers from binding 1 on.
pub fn create_pipeline(
    device: &Device,
    label: &str,
    storage: &[Access],
    kernel_src: &str,
) -> ComputePipeline {
    let mut entries = vec![buffer_entry(0, wgpu::BufferBindingType::Uniform)];
    entries.extend(storage.iter().zip(1..).map(|(access, binding)| {
        let read_only = matches!(access, Access::Read);
        buffer_entry(binding, wgpu::BufferBindingType::Storage { read_only })
    }));

    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{label} bindings")),
        entries: &entries,
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} layout")),
        bind_group_layouts: &[&layout],
        push_constant_ranges: &[],
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl([COMMON_SRC, kernel_src].concat().into()),
    });

    device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: "main",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_groups_cover_grid() {
        assert_eq!(work_groups(Grid::new(8, 7)), (2, 1));
        assert_eq!(work_groups(Grid::new(30, 40)), (4, 6));
        let (gx, gy) = work_groups(Grid::new(33, 2));
        assert!(gx * WORKGROUP_SIZE >= 33 && gy * WORKGROUP_SIZE >= 2);
    }
}
