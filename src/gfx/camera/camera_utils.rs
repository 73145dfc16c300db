use cgmath::{Matrix4, SquareMatrix};

/// Corrects OpenGL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Contains the view projection matrix.
    pub view_proj: [[f32; 4]; 4],
}

impl Default for CameraUniform {
    /// Creates a default [CameraUniform].
    fn default() -> Self {
        Self {
            view_proj: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

impl CameraUniform {
    pub fn from_transforms(view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        Self {
            view_proj: convert_matrix4_to_array(OPENGL_TO_WGPU_MATRIX * projection * view),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{perspective, Deg, Vector4};

    #[test]
    fn test_near_plane_maps_to_zero_depth() {
        let proj = perspective(Deg(45.0), 1.0, 0.1, 100.0);
        let uniform = CameraUniform::from_transforms(Matrix4::identity(), proj);
        let m = Matrix4::from(uniform.view_proj);

        let near = m * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = m * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }
}
