//! Engine data structures: vertex layouts, buffers, textures and sprites.
//!
//! - `layout` describes vertex attributes and interleaves them into records
//! - `vertex_buffer` holds static interleaved geometry drawn as a fan
//! - `texture` is a GPU texture that loads in the background
//! - `animation` is the sprite-sheet frame clock and pointer proximity
//! - `sprite` ties geometry, texture and clock into something drawable

pub mod animation;
pub mod layout;
pub mod sprite;
pub mod texture;
pub mod vertex_buffer;
