//! Global uniform bindings for camera data
//!
//! The view-projection matrix shared by every draw in a frame. Bound to slot 0
//! of the scene pipeline.

use crate::{
    gfx::camera::camera_utils::CameraUniform,
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<CameraUniform>;

/// Uploads the latest view and projection. Unchanged matrices cost nothing.
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, camera: CameraUniform) {
    ubo.update_content(queue, camera);
}

/// Bind group layout and bind group for [`GlobalUBO`]
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let bind_group_layout = binding_types::single_binding_layout(
            device,
            "Globals Bind Group Layout",
            wgpu::ShaderStages::VERTEX,
            binding_types::uniform(),
        );
        let bind_group = binding_types::single_binding_group(
            device,
            "Global Bind Group",
            &bind_group_layout,
            ubo.binding_resource(),
        );

        GlobalBindings {
            bind_group_layout,
            bind_group,
        }
    }

    /// Used when creating render pipelines that need access to global uniforms.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
