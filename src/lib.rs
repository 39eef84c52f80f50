//! sprite-ngin
//!
//! A small wgpu sprite-sheet renderer that runs natively and in the browser
//! (WebGL2). One interleaved quad is shared by a grid of sprites; each sprite
//! steps through the frames of a horizontally tiled sprite sheet, faster the
//! closer it is to the pointer.
//!
//! High-level modules
//! - `context`: GPU and window context owning device, queue and shared layouts
//! - `data_structures`: vertex layouts, interleaved buffers, textures, sprites
//! - `error`: the error type shared by every fallible operation
//! - `flow`: the host event loop and the flow abstraction scenes implement
//! - `pipelines`: the sprite pipeline and its shader
//! - `projection`: the aspect-corrected orthographic projection
//! - `resources`: asset loading for native builds and the web
//! - `scene`: the demo scene, a grid of animated sprites
//!

pub mod context;
pub mod data_structures;
pub mod error;
pub mod flow;
pub mod pipelines;
pub mod projection;
pub mod resources;
pub mod scene;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::Vector2;
pub use error::RenderError;
pub use winit::dpi::PhysicalPosition;
pub use winit::event::WindowEvent;

use scene::{Scene, SceneConfig};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Run the sprite grid with its default configuration until the window closes.
pub fn startup() -> anyhow::Result<()> {
    flow::run(vec![Scene::constructor(SceneConfig::default())])
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook();
    startup().map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

#[cfg(target_arch = "wasm32")]
fn console_error_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        web_sys::console::error_1(&info.to_string().into());
    }));
}
