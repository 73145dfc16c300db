//! Headless backend that records every call
//!
//! Used by `roomview --headless` to exercise the full load/frame/release cycle
//! without a GPU, and by the unit tests to observe draw order and buffer
//! lifecycles.

use std::collections::BTreeMap;

use cgmath::{Matrix4, SquareMatrix};

use crate::gfx::scene::{
    object::{Material, Topology},
    vertex::Vertex3D,
};

use super::{BackendError, BufferHandle, ClearMask, RenderBackend};

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    CreateBuffer {
        handle: BufferHandle,
        label: String,
        vertex_count: u32,
    },
    ReleaseBuffer(BufferHandle),
    Draw {
        handle: BufferHandle,
        topology: Topology,
        vertex_count: u32,
    },
    SetView(Matrix4<f32>),
    SetProjection(Matrix4<f32>),
    Clear(ClearMask),
    Present,
}

#[derive(Debug)]
struct LiveBuffer {
    label: String,
    vertex_count: u32,
}

/// In-memory [`RenderBackend`]
#[derive(Debug)]
pub struct RecordingBackend {
    calls: Vec<BackendCall>,
    live: BTreeMap<BufferHandle, LiveBuffer>,
    next_id: u64,
    frame_open: bool,
    buffer_limit: Option<usize>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            live: BTreeMap::new(),
            next_id: 1,
            frame_open: false,
            buffer_limit: None,
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }

    /// Fails buffer creation once `limit` buffers are live, the way a device
    /// does when it runs out of memory.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_buffer_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: BufferHandle) -> bool {
        self.live.contains_key(&handle)
    }

    pub fn label_of(&self, handle: BufferHandle) -> Option<&str> {
        self.live.get(&handle).map(|b| b.label.as_str())
    }

    pub fn view(&self) -> Matrix4<f32> {
        self.view
    }

    pub fn projection(&self) -> Matrix4<f32> {
        self.projection
    }

    /// Handles drawn since the last `clear_calls`, in submission order
    pub fn drawn_handles(&self) -> Vec<BufferHandle> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Draw { handle, .. } => Some(*handle),
                _ => None,
            })
            .collect()
    }

    pub fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.calls.iter().filter(|c| predicate(c)).count()
    }
}

impl RenderBackend for RecordingBackend {
    fn create_buffer(
        &mut self,
        label: &str,
        vertices: &[Vertex3D],
        _material: &Material,
    ) -> Result<BufferHandle, BackendError> {
        if vertices.is_empty() {
            return Err(BackendError::EmptyBuffer {
                label: label.to_string(),
            });
        }

        if let Some(limit) = self.buffer_limit {
            if self.live.len() >= limit {
                return Err(BackendError::BufferCreation {
                    label: label.to_string(),
                    reason: format!("buffer limit of {} reached", limit),
                });
            }
        }

        let handle = BufferHandle::new(self.next_id);
        self.next_id += 1;

        let vertex_count = vertices.len() as u32;
        self.live.insert(
            handle,
            LiveBuffer {
                label: label.to_string(),
                vertex_count,
            },
        );
        self.calls.push(BackendCall::CreateBuffer {
            handle,
            label: label.to_string(),
            vertex_count,
        });

        Ok(handle)
    }

    fn release_buffer(&mut self, handle: BufferHandle) -> Result<(), BackendError> {
        self.live
            .remove(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;
        self.calls.push(BackendCall::ReleaseBuffer(handle));
        Ok(())
    }

    fn draw(
        &mut self,
        handle: BufferHandle,
        topology: Topology,
        vertex_count: u32,
    ) -> Result<(), BackendError> {
        if !self.frame_open {
            return Err(BackendError::FrameNotStarted);
        }

        let buffer = self
            .live
            .get(&handle)
            .ok_or(BackendError::UnknownBuffer(handle))?;

        if vertex_count > buffer.vertex_count {
            return Err(BackendError::VertexCountMismatch {
                handle,
                requested: vertex_count,
                available: buffer.vertex_count,
            });
        }

        self.calls.push(BackendCall::Draw {
            handle,
            topology,
            vertex_count,
        });
        Ok(())
    }

    fn set_view_transform(&mut self, view: Matrix4<f32>) {
        self.view = view;
        self.calls.push(BackendCall::SetView(view));
    }

    fn set_projection_transform(&mut self, projection: Matrix4<f32>) {
        self.projection = projection;
        self.calls.push(BackendCall::SetProjection(projection));
    }

    fn clear(&mut self, mask: ClearMask) -> Result<(), BackendError> {
        if self.frame_open {
            return Err(BackendError::FrameAlreadyStarted);
        }
        self.frame_open = true;
        self.calls.push(BackendCall::Clear(mask));
        Ok(())
    }

    fn present(&mut self) -> Result<(), BackendError> {
        if !self.frame_open {
            return Err(BackendError::FrameNotStarted);
        }
        self.frame_open = false;
        self.calls.push(BackendCall::Present);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Vertex3D> {
        vec![
            Vertex3D::from_position([0.0, 0.0, 0.0]),
            Vertex3D::from_position([1.0, 0.0, 0.0]),
            Vertex3D::from_position([0.0, 1.0, 0.0]),
        ]
    }

    #[test]
    fn test_draw_after_release_fails() {
        let mut backend = RecordingBackend::new();
        let handle = backend
            .create_buffer("tri", &triangle(), &Material::furniture())
            .unwrap();
        backend.release_buffer(handle).unwrap();

        backend.clear(ClearMask::COLOR).unwrap();
        let err = backend
            .draw(handle, Topology::TriangleList, 3)
            .unwrap_err();
        assert!(matches!(err, BackendError::UnknownBuffer(h) if h == handle));
    }

    #[test]
    fn test_double_release_fails() {
        let mut backend = RecordingBackend::new();
        let handle = backend
            .create_buffer("tri", &triangle(), &Material::furniture())
            .unwrap();
        backend.release_buffer(handle).unwrap();
        assert!(backend.release_buffer(handle).is_err());
    }

    #[test]
    fn test_draw_outside_frame_fails() {
        let mut backend = RecordingBackend::new();
        let handle = backend
            .create_buffer("tri", &triangle(), &Material::furniture())
            .unwrap();
        assert!(matches!(
            backend.draw(handle, Topology::TriangleList, 3),
            Err(BackendError::FrameNotStarted)
        ));
    }

    #[test]
    fn test_overlong_draw_fails() {
        let mut backend = RecordingBackend::new();
        let handle = backend
            .create_buffer("tri", &triangle(), &Material::furniture())
            .unwrap();
        backend.clear(ClearMask::COLOR_DEPTH).unwrap();
        assert!(matches!(
            backend.draw(handle, Topology::TriangleList, 6),
            Err(BackendError::VertexCountMismatch { .. })
        ));
    }

    #[test]
    fn test_buffer_limit() {
        let mut backend = RecordingBackend::new().with_buffer_limit(1);
        backend
            .create_buffer("a", &triangle(), &Material::furniture())
            .unwrap();
        assert!(matches!(
            backend.create_buffer("b", &triangle(), &Material::furniture()),
            Err(BackendError::BufferCreation { .. })
        ));
    }
}
