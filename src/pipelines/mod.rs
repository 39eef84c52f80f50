//! Render pipelines and their shaders.
//!
//! - `shader` holds the built-in WGSL sources and validates overrides
//! - `sprite` builds the sprite pipeline from the quad and instance layouts

pub mod shader;
pub mod sprite;
