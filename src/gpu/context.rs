use log::{info, warn};
use wgpu::{Device, Queue};

use super::GpuError;

/// Opens a headless device suitable for [`super::GpuSimulation`].
///
/// Only downlevel limits are requested; the step pipeline binds four storage buffers,
/// which is the downlevel maximum.
pub async fn request_device() -> Result<(Device, Queue), GpuError> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        })
        .await
        .ok_or_else(|| {
            warn!("no GPU adapter available");
            GpuError::NoAdapter
        })?;

    let info = adapter.get_info();
    info!("using {} ({:?})", info.name, info.backend);

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("velum"),
                features: wgpu::Features::empty(),
                limits: wgpu::Limits::downlevel_defaults(),
            },
            None,
        )
        .await?;

    Ok((device, queue))
}
