//! A static, interleaved vertex buffer shared by every sprite.
//!
//! The buffer is uploaded once and never written again. Since `wgpu` has no
//! triangle fan topology, the fan described by the vertices is expanded into a
//! static triangle-list index buffer at construction time.

use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::{
    data_structures::layout::{AttributeLayout, VertexLayout},
    error::RenderError,
};

/// Expand a polygon fan over `vertex_count` vertices into a triangle list.
///
/// Vertex 0 is the shared corner, every following pair of vertices closes one
/// triangle. Fewer than three vertices make no triangles.
pub fn fan_indices(vertex_count: u32) -> Vec<u32> {
    (1..vertex_count.saturating_sub(1))
        .flat_map(|i| [0, i, i + 1])
        .collect()
}

#[derive(Debug)]
pub struct InterleavedVertexBuffer {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    layout: VertexLayout,
    vertex_count: u32,
    index_count: u32,
}

impl InterleavedVertexBuffer {
    /// Upload `data` as a write-once vertex buffer described by `attributes`.
    ///
    /// `data` is a flat slice of scalars. Every attribute has to be made of
    /// scalars of exactly that width, and the slice has to hold a whole number of
    /// vertices.
    pub fn new<T: bytemuck::Pod>(
        device: &wgpu::Device,
        label: &str,
        data: &[T],
        attributes: Vec<AttributeLayout>,
    ) -> Result<Self, RenderError> {
        let layout = VertexLayout::per_vertex(attributes)?;
        let scalar_width = std::mem::size_of::<T>();
        if let Some(attribute) = layout
            .attributes()
            .iter()
            .find(|a| a.component_byte_width() as usize != scalar_width)
        {
            return Err(RenderError::ComponentMismatch {
                expected: attribute.component_byte_width(),
                actual: scalar_width,
            });
        }
        let vertex_count = layout.vertex_count(data.len())?;

        let bytes: &[u8] = bytemuck::cast_slice(data);
        let max_buffer_size = device.limits().max_buffer_size;
        if bytes.len() as u64 > max_buffer_size {
            return Err(RenderError::ResourceCreation(format!(
                "{label}: {} bytes exceed the device limit of {max_buffer_size} bytes",
                bytes.len()
            )));
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });

        let indices = fan_indices(vertex_count);
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "{label}: {vertex_count} vertices, stride {} bytes, {} fan indices",
            layout.stride(),
            indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            layout,
            vertex_count,
            index_count: indices.len() as u32,
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn stride(&self) -> wgpu::BufferAddress {
        self.layout.stride()
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Bind this buffer's vertices (slot 0) and fan indices for the draws that follow.
    ///
    /// The attribute pointers themselves are baked into the pipeline through
    /// [`VertexLayout::desc`]; call this again whenever another buffer was bound
    /// in between.
    pub fn apply_layout(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    }

    /// Draw the fan once per instance in `instances`. Uniforms and per-instance
    /// data are the caller's business.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        if self.index_count == 0 {
            return;
        }
        render_pass.draw_indexed(0..self.index_count, 0, instances);
    }
}
