//! WGPU-based rendering backend
//!
//! Implements [`RenderBackend`] on top of a window surface. `clear` acquires
//! the next surface texture, `draw` records the request, and `present` encodes
//! the recorded draws into a single render pass, submits it and presents.

use std::{collections::HashMap, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};
use wgpu::{util::DeviceExt, Device, TextureFormat};

use crate::gfx::{
    backend::{BackendError, BufferHandle, ClearMask, RenderBackend},
    camera::camera_utils::CameraUniform,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        material::{MaterialBindings, MaterialUBO, MaterialUniform},
        texture_resource::TextureResource,
    },
    scene::{
        object::{Material, Topology},
        vertex::Vertex3D,
    },
};

use super::pipeline::PipelineConfig;

/// Surface and pass settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Fifo presentation when true, otherwise the fastest mode available
    pub vsync: bool,
    pub depth_test: bool,
    pub clear_mask: ClearMask,
    pub clear_color: [f64; 4],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            vsync: true,
            depth_test: true,
            clear_mask: ClearMask::COLOR_DEPTH,
            clear_color: [0.5, 0.5, 0.5, 1.0],
        }
    }
}

impl RenderConfig {
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.depth_test = enabled;
        self
    }

    pub fn with_clear_mask(mut self, mask: ClearMask) -> Self {
        self.clear_mask = mask;
        self
    }

    pub fn with_clear_color(mut self, r: f64, g: f64, b: f64) -> Self {
        self.clear_color = [r, g, b, 1.0];
        self
    }

    fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

/// Vertex buffer plus the material it is drawn with
struct GpuBuffer {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    material_ubo: MaterialUBO,
    material_bind_group: wgpu::BindGroup,
}

/// Index buffer turning every 4 vertices into 2 triangles: (0,1,2) (0,2,3)
struct QuadIndexBuffer {
    buffer: Option<wgpu::Buffer>,
    quad_capacity: u32,
}

impl QuadIndexBuffer {
    fn indices(quads: u32) -> Vec<u32> {
        (0..quads)
            .flat_map(|q| {
                let base = q * 4;
                [base, base + 1, base + 2, base, base + 2, base + 3]
            })
            .collect()
    }

    fn ensure_capacity(&mut self, device: &Device, quads: u32) {
        if quads <= self.quad_capacity {
            return;
        }
        let capacity = quads.next_power_of_two();
        log::debug!("growing quad index buffer to {} quads", capacity);

        if let Some(old) = self.buffer.take() {
            old.destroy();
        }
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Index Buffer"),
            contents: bytemuck::cast_slice(&Self::indices(capacity)),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.quad_capacity = capacity;
    }

    /// Index buffer and index count for drawing `quads` quads.
    ///
    /// `Ok(None)` means there is nothing to draw. A missing or short buffer is an error.
    fn draw_range(&self, quads: u32) -> Result<Option<(&wgpu::Buffer, u32)>, BackendError> {
        if quads == 0 {
            return Ok(None);
        }
        match self.buffer.as_ref() {
            Some(buffer) if quads <= self.quad_capacity => Ok(Some((buffer, quads * 6))),
            _ => Err(BackendError::QuadIndicesMissing {
                quads,
                capacity: self.quad_capacity,
            }),
        }
    }
}

struct PendingDraw {
    handle: BufferHandle,
    topology: Topology,
    vertex_count: u32,
}

/// A frame between `clear` and `present`
struct FrameInProgress {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    mask: ClearMask,
    draws: Vec<PendingDraw>,
}

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    render_config: RenderConfig,
    depth_texture: Option<TextureResource>,
    pipeline: wgpu::RenderPipeline,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    material_bindings: MaterialBindings,
    quad_indices: QuadIndexBuffer,
    buffers: HashMap<BufferHandle, GpuBuffer>,
    next_buffer_id: u64,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
    frame: Option<FrameInProgress>,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `render_config` - Presentation, depth and clear settings
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        render_config: &RenderConfig,
    ) -> Result<RenderEngine, BackendError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| BackendError::AdapterUnavailable(e.to_string()))?;
        log::info!("using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| {
                BackendError::AdapterUnavailable("surface reports no texture formats".to_string())
            })?;
        let alpha_mode = surface_capabilities
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: render_config.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = render_config
            .depth_test
            .then(|| TextureResource::create_depth_texture(&device, &config, "depth_texture"));

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let material_bindings = MaterialBindings::new(&device);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shader.wgsl").into()),
        });

        let pipeline = PipelineConfig::default()
            .with_label("Scene Pipeline")
            .with_color_format(format)
            .with_depth_test(render_config.depth_test)
            .with_bind_group_layouts(vec![
                global_bindings.bind_group_layout().clone(),
                material_bindings.bind_group_layout().clone(),
            ])
            .create(&device, &shader);

        log::info!(
            "render engine ready: {}x{} {:?}, {:?}, depth test {}",
            config.width,
            config.height,
            format,
            config.present_mode,
            if render_config.depth_test { "on" } else { "off" }
        );

        Ok(RenderEngine {
            surface,
            device: device.into(),
            queue: queue.into(),
            config,
            render_config: *render_config,
            depth_texture,
            pipeline,
            global_ubo,
            global_bindings,
            material_bindings,
            quad_indices: QuadIndexBuffer {
                buffer: None,
                quad_capacity: 0,
            },
            buffers: HashMap::new(),
            next_buffer_id: 1,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            frame: None,
        })
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero dimensions (a minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.reconfigure();
    }

    fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
        if self.render_config.depth_test {
            self.depth_texture = Some(TextureResource::create_depth_texture(
                &self.device,
                &self.config,
                "depth_texture",
            ));
        }
    }

    /// Returns current surface dimensions
    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.config.format
    }

    fn acquire_surface_texture(&mut self) -> Result<wgpu::SurfaceTexture, BackendError> {
        match self.surface.get_current_texture() {
            Ok(texture) => Ok(texture),
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {}; reconfiguring", e);
                self.reconfigure();
                Ok(self.surface.get_current_texture()?)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.render_config.clear_color;
        wgpu::Color { r, g, b, a }
    }
}

impl RenderBackend for RenderEngine {
    fn create_buffer(
        &mut self,
        label: &str,
        vertices: &[Vertex3D],
        material: &Material,
    ) -> Result<BufferHandle, BackendError> {
        if vertices.is_empty() {
            return Err(BackendError::EmptyBuffer {
                label: label.to_string(),
            });
        }
        let vertex_count = u32::try_from(vertices.len()).map_err(|_| BackendError::BufferCreation {
            label: label.to_string(),
            reason: format!("{} vertices exceed the u32 range", vertices.len()),
        })?;

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("Vertex Buffer: {}", label)),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let material_ubo = MaterialUBO::new_with_data(&self.device, &MaterialUniform::from(material));
        let material_bind_group = self
            .material_bindings
            .create_bind_group(&self.device, label, &material_ubo);

        let handle = BufferHandle::new(self.next_buffer_id);
        self.next_buffer_id += 1;
        self.buffers.insert(
            handle,
            GpuBuffer {
                vertex_buffer,
                vertex_count,
                material_ubo,
                material_bind_group,
            },
        );

        log::debug!("created buffer {} '{}' ({} vertices)", handle, label, vertex_count);
        Ok(handle)
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError> {
        let buffer = self
            .buffers
            .remove(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;

        buffer.vertex_buffer.destroy();
        buffer.material_ubo.destroy();
        log::debug!("released buffer {}", handle);
        Ok(())
    }

    fn draw(
        &mut self,
        handle: BufferHandle,
        topology: Topology,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        if self.frame.is_none() {
            return Err(BackendError::FrameNotStarted);
        }

        let buffer = self
            .buffers
            .get(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        if vertex_count > buffer.vertex_count {
            return Err(BackendError::VertexCountMismatch {
                handle,
                requested: vertex_count,
                available: buffer.vertex_count,
            });
        }

        if topology == Topology::QuadList {
            self.quad_indices
                .ensure_capacity(&self.device, topology.primitive_count(vertex_count));
        }

        if let Some(frame) = self.frame.as_mut() {
            frame.draws.push(PendingDraw {
                handle,
                topology,
                vertex_count,
            });
        }
        Ok(())
    }

    fn set_view_transform(&mut self, view: Matrix4<f32>) {
        self.view = view;
    }

    fn set_projection_transform(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
    }

    fn clear(&mut self, mask: ClearMask) -> Result<(), BackendError> {
        if self.frame.is_some() {
            return Err(BackendError::FrameAlreadyStarted);
        }

        let surface_texture = self.acquire_surface_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.frame = Some(FrameInProgress {
            surface_texture,
            view,
            mask,
            draws: Vec::new(),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        let frame = self.frame.take().ok_or(BackendError::FrameNotStarted)?;

        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            CameraUniform::from_transforms(self.view, self.projection),
        );

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let color_load = if frame.mask.color {
                wgpu::LoadOp::Clear(self.clear_color())
            } else {
                wgpu::LoadOp::Load
            };
            let depth_load = if frame.mask.depth {
                wgpu::LoadOp::Clear(1.0)
            } else {
                wgpu::LoadOp::Load
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: self.depth_texture.as_ref().map(|depth| {
                    wgpu::RenderPassDepthStencilAttachment {
                        view: &depth.view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            for draw in &frame.draws {
                let buffer = self
                    .buffers
                    .get(&draw.handle)
                    .ok_or(BackendError::UnknownBuffer(draw.handle))?;

                render_pass.set_bind_group(1, &buffer.material_bind_group, &[]);
                render_pass.set_vertex_buffer(0, buffer.vertex_buffer.slice(..));

                match draw.topology {
                    Topology::TriangleList => render_pass.draw(0..draw.vertex_count, 0..1),
                    Topology::QuadList => {
                        let quads = draw.topology.primitive_count(draw.vertex_count);
                        if let Some((indices, index_count)) = self.quad_indices.draw_range(quads)? {
                            render_pass
                                .set_index_buffer(indices.slice(..), wgpu::IndexFormat::Uint32);
                            render_pass.draw_indexed(0..index_count, 0, 0..1);
                        }
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_indices_split_each_quad() {
        assert_eq!(
            QuadIndexBuffer::indices(2),
            vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]
        );
    }

    #[test]
    fn test_quad_draw_without_indices_is_an_error() {
        let empty = QuadIndexBuffer {
            buffer: None,
            quad_capacity: 0,
        };

        assert!(matches!(empty.draw_range(0), Ok(None)));
        assert!(matches!(
            empty.draw_range(6),
            Err(BackendError::QuadIndicesMissing {
                quads: 6,
                capacity: 0
            })
        ));
    }

    #[test]
    fn test_render_config_defaults() {
        let config = RenderConfig::default();
        assert!(config.vsync && config.depth_test);
        assert_eq!(config.clear_mask, ClearMask::COLOR_DEPTH);
        assert_eq!(config.present_mode(), wgpu::PresentMode::Fifo);
        assert_eq!(
            config.with_vsync(false).present_mode(),
            wgpu::PresentMode::AutoNoVsync
        );
    }
}
