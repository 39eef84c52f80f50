//! Animated sprites drawn from a horizontally tiled sprite sheet.
//!
//! Every sprite shares one [`InterleavedVertexBuffer`] (the unit quad) and a
//! [`Texture`]; they only differ by transform, animation clock and therefore
//! the slice of the sheet they show. Per-sprite data is packed into
//! [`SpriteRaw`] records which live in a single per-instance buffer
//! ([`SpriteInstances`]), so drawing a sprite is one draw call selecting its
//! own instance.

use std::rc::Rc;

use bytemuck::Zeroable;
use cgmath::Vector2;
use instant::Duration;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        animation::FrameClock,
        layout::{AttributeLayout, ComponentType, VertexLayout},
        texture::{Texture, TextureUnit},
        vertex_buffer::InterleavedVertexBuffer,
    },
    error::RenderError,
};

/// A centered unit quad: position (x, y) followed by texture coordinates (u, v),
/// ordered as a fan.
#[rustfmt::skip]
pub const CENTERED_TEXTURED_SQUARE: [f32; 16] = [
    -0.5,  0.5, 0.0, 0.0,
    -0.5, -0.5, 0.0, 1.0,
     0.5, -0.5, 1.0, 1.0,
     0.5,  0.5, 1.0, 0.0,
];

/// Attributes of [`CENTERED_TEXTURED_SQUARE`]: position at location 0 and
/// texture coordinates at location 1.
pub fn quad_attributes() -> Vec<AttributeLayout> {
    vec![
        AttributeLayout::float32(0, 2),
        // Normalization is a no-op for floats.
        AttributeLayout::new(1, ComponentType::Float32, 2, true),
    ]
}

/**
 * The raw sprite is the per-instance data stored on the GPU:
 * the model matrix (as four columns) followed by the frame info.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteRaw {
    pub model: [[f32; 4]; 4],
    pub frame_info: [f32; 2],
}

impl SpriteRaw {
    /// A mat4 takes four vertex slots (locations 2 to 5), the frame info one more (6).
    pub fn layout() -> Result<VertexLayout, RenderError> {
        VertexLayout::per_instance(vec![
            AttributeLayout::float32(2, 4),
            AttributeLayout::float32(3, 4),
            AttributeLayout::float32(4, 4),
            AttributeLayout::float32(5, 4),
            AttributeLayout::float32(6, 2),
        ])
    }
}

#[derive(Debug)]
pub struct Sprite {
    position: Vector2<f32>,
    scale: f32,
    model: cgmath::Matrix4<f32>,
    vertex_buffer: Rc<InterleavedVertexBuffer>,
    texture: Rc<Texture>,
    clock: FrameClock,
}

impl Sprite {
    pub fn new(
        vertex_buffer: Rc<InterleavedVertexBuffer>,
        texture: Rc<Texture>,
        frame_count: u32,
        frame_duration: Duration,
        position: Vector2<f32>,
        scale: f32,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            position,
            scale,
            model: model_matrix(position, scale),
            vertex_buffer,
            texture,
            clock: FrameClock::new(frame_count, frame_duration)?,
        })
    }

    pub fn set_transform(&mut self, x: f32, y: f32, scale: f32) {
        self.position = Vector2::new(x, y);
        self.scale = scale;
        self.model = model_matrix(self.position, scale);
    }

    pub fn position(&self) -> Vector2<f32> {
        self.position
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn model_matrix(&self) -> cgmath::Matrix4<f32> {
        self.model
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn texture(&self) -> &Rc<Texture> {
        &self.texture
    }

    /// Tell the sprite that `dt` has passed.
    pub fn advance(&mut self, dt: Duration) {
        self.clock.advance(dt);
    }

    pub fn to_raw(&self) -> SpriteRaw {
        SpriteRaw {
            model: self.model.into(),
            frame_info: self.clock.frame_info(),
        }
    }

    /// Draw this sprite as `instance` of the currently bound [`SpriteInstances`].
    ///
    /// Expects the shared quad to be applied already (see
    /// [`InterleavedVertexBuffer::apply_layout`]).
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instance: u32) {
        self.texture.bind(render_pass, TextureUnit::DIFFUSE);
        self.vertex_buffer.draw(render_pass, instance..instance + 1);
    }
}

/// Translate first, then scale x and y, so scaling never moves the sprite.
pub fn model_matrix(position: Vector2<f32>, scale: f32) -> cgmath::Matrix4<f32> {
    cgmath::Matrix4::from_translation(position.extend(0.0))
        * cgmath::Matrix4::from_nonuniform_scale(scale, scale, 1.0)
}

/// Per-instance buffer holding one [`SpriteRaw`] per sprite, rewritten every frame.
#[derive(Debug)]
pub struct SpriteInstances {
    buffer: wgpu::Buffer,
    layout: VertexLayout,
    capacity: usize,
}

impl SpriteInstances {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Result<Self, RenderError> {
        let layout = SpriteRaw::layout()?;
        let data = vec![SpriteRaw::zeroed(); capacity.max(1)];
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sprite Instance Buffer"),
            contents: bytemuck::cast_slice(&data),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Ok(Self {
            buffer,
            layout,
            capacity,
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn write(&self, queue: &wgpu::Queue, sprites: &[Sprite]) {
        if sprites.len() > self.capacity {
            log::warn!(
                "{} sprites but only room for {}, the rest is not drawn",
                sprites.len(),
                self.capacity
            );
        }
        let data = sprites
            .iter()
            .take(self.capacity)
            .map(Sprite::to_raw)
            .collect::<Vec<_>>();
        if !data.is_empty() {
            queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&data));
        }
    }

    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(1, self.buffer.slice(..));
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
