//! Shader sources: the built-in sprite shader and optional overrides.
//!
//! Overrides are checked with naga before they reach the device so a broken
//! shader is reported in the log instead of taking the whole app down. A
//! failed override falls back to the built-in source.

use std::borrow::Cow;

use crate::{error::RenderError, resources::load_string};

pub const SPRITE_SHADER: &str = include_str!("sprite.wgsl");
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Parse and validate WGSL and make sure both entry points exist.
pub fn validate_wgsl(label: &str, source: &str) -> Result<(), RenderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| RenderError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| RenderError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    let has_entry = |name: &str, stage: naga::ShaderStage| {
        module
            .entry_points
            .iter()
            .any(|ep| ep.name == name && ep.stage == stage)
    };
    for (name, stage) in [
        (VERTEX_ENTRY, naga::ShaderStage::Vertex),
        (FRAGMENT_ENTRY, naga::ShaderStage::Fragment),
    ] {
        if !has_entry(name, stage) {
            return Err(RenderError::ShaderLink {
                label: label.to_string(),
                message: format!("missing {stage:?} entry point `{name}`"),
            });
        }
    }
    Ok(())
}

/// Pick the shader source for the sprite pipeline.
///
/// `None` or any failure to load, compile or link the override yields the
/// built-in shader.
pub async fn load_sprite_shader(file_name: Option<&str>) -> Cow<'static, str> {
    let Some(file_name) = file_name else {
        return Cow::Borrowed(SPRITE_SHADER);
    };
    let source = match load_string(file_name).await {
        Ok(source) => source,
        Err(e) => {
            log::error!("{}", RenderError::asset_load(file_name, e));
            return Cow::Borrowed(SPRITE_SHADER);
        }
    };
    match validate_wgsl(file_name, &source) {
        Ok(()) => {
            log::info!("Using shader {file_name}");
            Cow::Owned(source)
        }
        Err(e) => {
            log::error!("{e}");
            log::error!("Falling back to the built-in sprite shader");
            Cow::Borrowed(SPRITE_SHADER)
        }
    }
}
