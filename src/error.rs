//! Error taxonomy for the rendering core.
//!
//! Setup errors (`ResourceCreation`, `MalformedBuffer`, layout problems) are
//! fatal and abort scene construction. `ShaderCompile`, `ShaderLink` and
//! `AssetLoad` are only ever logged: the scene keeps running with the
//! built-in shader or the placeholder texture.

use thiserror::Error;

use crate::data_structures::layout::ComponentType;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create graphics resource: {0}")]
    ResourceCreation(String),
    #[error(
        "Malformed vertex buffer: {components} components is not a multiple of {components_per_vertex} components per vertex"
    )]
    MalformedBuffer {
        components: usize,
        components_per_vertex: u32,
    },
    #[error(
        "Attribute at location {location} ({count} x {ty:?}, normalize: {normalize}) has no matching vertex format"
    )]
    UnsupportedAttribute {
        location: u32,
        ty: ComponentType,
        count: u32,
        normalize: bool,
    },
    #[error("Shader location {0} is used by more than one attribute")]
    DuplicateLocation(u32),
    #[error("Attribute components are {expected} bytes wide but the vertex data holds {actual}-byte values")]
    ComponentMismatch { expected: u32, actual: usize },
    #[error("Animations need at least one frame and a non-zero frame duration")]
    InvalidAnimation,
    #[error("Failed to compile shader {label}:\n{message}")]
    ShaderCompile { label: String, message: String },
    #[error("Failed to link shader {label}: {message}")]
    ShaderLink { label: String, message: String },
    #[error("Failed to load asset {name}: {message}")]
    AssetLoad { name: String, message: String },
}

impl RenderError {
    pub(crate) fn asset_load(name: &str, err: anyhow::Error) -> Self {
        Self::AssetLoad {
            name: name.to_string(),
            message: format!("{err:#}"),
        }
    }
}
