//! Vertex attribute descriptions and the interleaved layout built from them.
//!
//! An [`AttributeLayout`] describes the shape of one attribute (which shader
//! location it feeds, the scalar type, how many scalars and whether integer
//! data is normalized). A [`VertexLayout`] packs an ordered list of them into a
//! single interleaved record: it computes the stride, the byte offset of every
//! attribute and the `wgpu` vertex formats, and rejects combinations the GPU
//! cannot express at construction time instead of at draw time.

use std::collections::HashSet;

use crate::error::RenderError;

/// Scalar type of a single attribute component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentType {
    Float32,
    Uint8,
    Uint16,
    Uint32,
    Sint8,
    Sint16,
    Sint32,
}

impl ComponentType {
    /// Size of one component in bytes.
    pub const fn byte_width(self) -> u32 {
        match self {
            ComponentType::Uint8 | ComponentType::Sint8 => 1,
            ComponentType::Uint16 | ComponentType::Sint16 => 2,
            ComponentType::Float32 | ComponentType::Uint32 | ComponentType::Sint32 => 4,
        }
    }
}

/// Shape of one named vertex attribute. Immutable once constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttributeLayout {
    pub location: wgpu::ShaderLocation,
    pub ty: ComponentType,
    pub count: u32,
    pub normalize: bool,
}

impl AttributeLayout {
    pub const fn new(
        location: wgpu::ShaderLocation,
        ty: ComponentType,
        count: u32,
        normalize: bool,
    ) -> Self {
        Self {
            location,
            ty,
            count,
            normalize,
        }
    }

    /// `count` 32 bit floats at `location`.
    pub const fn float32(location: wgpu::ShaderLocation, count: u32) -> Self {
        Self::new(location, ComponentType::Float32, count, false)
    }

    pub const fn component_byte_width(&self) -> u32 {
        self.ty.byte_width()
    }

    /// Contribution of this attribute to the stride of a vertex.
    pub const fn byte_length(&self) -> u32 {
        self.count * self.ty.byte_width()
    }

    /// The `wgpu` format for this attribute, if the GPU has one.
    ///
    /// The normalize flag only matters for integer data. Floats are passed through
    /// unchanged regardless of it.
    pub fn format(&self) -> Option<wgpu::VertexFormat> {
        use ComponentType::*;
        use wgpu::VertexFormat as F;
        let format = match (self.ty, self.count, self.normalize) {
            (Float32, 1, _) => F::Float32,
            (Float32, 2, _) => F::Float32x2,
            (Float32, 3, _) => F::Float32x3,
            (Float32, 4, _) => F::Float32x4,
            (Uint32, 1, false) => F::Uint32,
            (Uint32, 2, false) => F::Uint32x2,
            (Uint32, 3, false) => F::Uint32x3,
            (Uint32, 4, false) => F::Uint32x4,
            (Sint32, 1, false) => F::Sint32,
            (Sint32, 2, false) => F::Sint32x2,
            (Sint32, 3, false) => F::Sint32x3,
            (Sint32, 4, false) => F::Sint32x4,
            (Uint16, 2, false) => F::Uint16x2,
            (Uint16, 4, false) => F::Uint16x4,
            (Uint16, 2, true) => F::Unorm16x2,
            (Uint16, 4, true) => F::Unorm16x4,
            (Sint16, 2, false) => F::Sint16x2,
            (Sint16, 4, false) => F::Sint16x4,
            (Sint16, 2, true) => F::Snorm16x2,
            (Sint16, 4, true) => F::Snorm16x4,
            (Uint8, 2, false) => F::Uint8x2,
            (Uint8, 4, false) => F::Uint8x4,
            (Uint8, 2, true) => F::Unorm8x2,
            (Uint8, 4, true) => F::Unorm8x4,
            (Sint8, 2, false) => F::Sint8x2,
            (Sint8, 4, false) => F::Sint8x4,
            (Sint8, 2, true) => F::Snorm8x2,
            (Sint8, 4, true) => F::Snorm8x4,
            _ => return None,
        };
        Some(format)
    }
}

/// An ordered, validated list of attributes interleaved into one record.
#[derive(Clone, Debug)]
pub struct VertexLayout {
    attributes: Vec<AttributeLayout>,
    wgpu_attributes: Vec<wgpu::VertexAttribute>,
    stride: wgpu::BufferAddress,
    components_per_vertex: u32,
    step_mode: wgpu::VertexStepMode,
}

impl VertexLayout {
    pub fn new(
        attributes: Vec<AttributeLayout>,
        step_mode: wgpu::VertexStepMode,
    ) -> Result<Self, RenderError> {
        if attributes.is_empty() {
            return Err(RenderError::MalformedBuffer {
                components: 0,
                components_per_vertex: 0,
            });
        }

        let mut locations = HashSet::new();
        let mut wgpu_attributes = Vec::with_capacity(attributes.len());
        let mut offset: wgpu::BufferAddress = 0;
        let mut components_per_vertex = 0;
        for attribute in &attributes {
            if !locations.insert(attribute.location) {
                return Err(RenderError::DuplicateLocation(attribute.location));
            }
            let format = attribute
                .format()
                .ok_or(RenderError::UnsupportedAttribute {
                    location: attribute.location,
                    ty: attribute.ty,
                    count: attribute.count,
                    normalize: attribute.normalize,
                })?;
            wgpu_attributes.push(wgpu::VertexAttribute {
                format,
                offset,
                shader_location: attribute.location,
            });
            offset += attribute.byte_length() as wgpu::BufferAddress;
            components_per_vertex += attribute.count;
        }

        Ok(Self {
            attributes,
            wgpu_attributes,
            stride: offset,
            components_per_vertex,
            step_mode,
        })
    }

    /// Layout advancing once per vertex.
    pub fn per_vertex(attributes: Vec<AttributeLayout>) -> Result<Self, RenderError> {
        Self::new(attributes, wgpu::VertexStepMode::Vertex)
    }

    /// Layout advancing once per instance.
    pub fn per_instance(attributes: Vec<AttributeLayout>) -> Result<Self, RenderError> {
        Self::new(attributes, wgpu::VertexStepMode::Instance)
    }

    pub fn attributes(&self) -> &[AttributeLayout] {
        &self.attributes
    }

    /// Sum of every attribute's byte length.
    pub fn stride(&self) -> wgpu::BufferAddress {
        self.stride
    }

    pub fn components_per_vertex(&self) -> u32 {
        self.components_per_vertex
    }

    pub fn step_mode(&self) -> wgpu::VertexStepMode {
        self.step_mode
    }

    /// Byte offset of each attribute inside a record, in declaration order.
    pub fn offsets(&self) -> impl Iterator<Item = wgpu::BufferAddress> + '_ {
        self.wgpu_attributes.iter().map(|a| a.offset)
    }

    /// Number of whole records held by `components` scalars.
    pub fn vertex_count(&self, components: usize) -> Result<u32, RenderError> {
        let per_vertex = self.components_per_vertex as usize;
        if components % per_vertex != 0 {
            return Err(RenderError::MalformedBuffer {
                components,
                components_per_vertex: self.components_per_vertex,
            });
        }
        u32::try_from(components / per_vertex).map_err(|_| {
            RenderError::ResourceCreation(format!(
                "{} vertices do not fit into a single draw call",
                components / per_vertex
            ))
        })
    }

    /**
     * The layout handed to the render pipeline:
     *
     * stride: length of one interleaved record
     * attributes: one read pointer per attribute, offsets accumulated in declaration order
     */
    pub fn desc(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: self.step_mode,
            attributes: &self.wgpu_attributes,
        }
    }
}
