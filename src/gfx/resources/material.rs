//! GPU side of scene materials
//!
//! Each registered object owns one small uniform buffer holding its color and
//! surface pattern, bound to slot 1 of the scene pipeline.

use wgpu::Device;

use crate::{
    gfx::scene::object::{Material, SurfacePattern},
    wgpu_utils::{binding_types, uniform_buffer::UniformBuffer},
};

/// GPU uniform data for materials
///
/// Must match `MaterialUniform` in `shader.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    /// `x` selects the pattern; the rest is padding
    pub pattern: [u32; 4],
}

impl From<&Material> for MaterialUniform {
    fn from(material: &Material) -> Self {
        let pattern = match material.pattern {
            SurfacePattern::Flat => 0,
            SurfacePattern::Checker => 1,
        };
        Self {
            base_color: material.base_color,
            pattern: [pattern, 0, 0, 0],
        }
    }
}

pub type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Shared layout for per-object material bind groups
pub struct MaterialBindings {
    bind_group_layout: wgpu::BindGroupLayout,
}

impl MaterialBindings {
    pub fn new(device: &Device) -> Self {
        let bind_group_layout = binding_types::single_binding_layout(
            device,
            "Material Bind Group Layout",
            wgpu::ShaderStages::FRAGMENT,
            binding_types::uniform(),
        );

        MaterialBindings { bind_group_layout }
    }

    pub fn create_bind_group(&self, device: &Device, label: &str, ubo: &MaterialUBO) -> wgpu::BindGroup {
        binding_types::single_binding_group(
            device,
            &format!("Material Bind Group: {}", label),
            &self.bind_group_layout,
            ubo.binding_resource(),
        )
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 32);
    }

    #[test]
    fn test_checker_flag() {
        let floor = Material::rgb("floor", 0.5, 0.5, 0.5).with_pattern(SurfacePattern::Checker);
        let uniform = MaterialUniform::from(&floor);
        assert_eq!(uniform.pattern[0], 1);
        assert_eq!(uniform.base_color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(MaterialUniform::from(&Material::furniture()).pattern[0], 0);
    }
}
