//! Orthographic projection for the sprite plane.
//!
//! Sprites live in a space spanning `[-1, 1]` vertically and
//! `[-aspect, aspect]` horizontally. The projection is recomputed from the
//! surface size every frame so resizing never distorts the grid.

use cgmath::{Matrix4, SquareMatrix, Vector2};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalPosition;

/// cgmath targets OpenGL's `[-1, 1]` depth range while wgpu expects `[0, 1]`.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    width: u32,
    height: u32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        *self = Self::new(width, height);
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        let aspect = self.aspect();
        OPENGL_TO_WGPU_MATRIX * cgmath::ortho(-aspect, aspect, -1.0, 1.0, -1.0, 1.0)
    }

    /// Map a pointer position in surface pixels into sprite space.
    pub fn pointer_to_scene(&self, coords: PhysicalPosition<f64>) -> Vector2<f32> {
        let x = ((coords.x as f32 / self.width as f32) - 0.5) * 2.0 * self.aspect();
        let y = ((coords.y as f32 / self.height as f32) - 0.5) * -2.0;
        Vector2::new(x, y)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ProjectionUniform {
    proj: [[f32; 4]; 4],
}

impl ProjectionUniform {
    pub fn new() -> Self {
        Self {
            proj: Matrix4::identity().into(),
        }
    }

    pub fn update(&mut self, projection: &Projection) {
        self.proj = projection.calc_matrix().into();
    }
}

impl Default for ProjectionUniform {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ProjectionResources {
    pub projection: Projection,
    pub uniform: ProjectionUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl ProjectionResources {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let projection = Projection::new(width, height);
        let mut uniform = ProjectionUniform::new();
        uniform.update(&projection);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Projection Buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("projection_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("projection_bind_group"),
        });

        Self {
            projection,
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recompute the projection for the current surface size and upload it.
    pub fn update(&mut self, queue: &wgpu::Queue, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.uniform.update(&self.projection);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
