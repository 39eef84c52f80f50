use std::sync::Arc;

use cgmath::{Vector2, Zero};
use winit::{dpi::PhysicalPosition, window::Window};

use crate::{
    error::RenderError,
    projection::{Projection, ProjectionResources},
    resources::texture::diffuse_layout,
};

/// Last known pointer position in surface pixels, `None` until the cursor first moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct MouseState {
    pub coords: Option<PhysicalPosition<f64>>,
}

impl MouseState {
    /// The pointer in sprite space. Before any cursor movement it rests at the origin.
    pub fn scene_position(&self, projection: &Projection) -> Vector2<f32> {
        self.coords
            .map(|coords| projection.pointer_to_scene(coords))
            .unwrap_or_else(Vector2::zero)
    }
}

/// Everything that renders: window, GPU handles, the per-scene projection and
/// shared layouts. Built once when the window exists and only reconfigured
/// (never rebuilt) afterwards.
#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub projection: ProjectionResources,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
    pub clear_colour: wgpu::Color,
    pub mouse: MouseState,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            #[cfg(not(target_arch = "wasm32"))]
            backends: wgpu::Backends::PRIMARY,
            #[cfg(target_arch = "wasm32")]
            backends: wgpu::Backends::GL,
            ..wgpu::InstanceDescriptor::new_without_display_handle()
        });

        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| RenderError::ResourceCreation(format!("surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::ResourceCreation(format!("adapter: {e}")))?;

        log::info!("Device and queue on {:?}", adapter.get_info().name);
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // WebGL doesn't support all of wgpu's features, so if
                // we're building for the web we'll have to disable some.
                required_limits: if cfg!(target_arch = "wasm32") {
                    wgpu::Limits::downlevel_webgl2_defaults()
                } else {
                    wgpu::Limits::default()
                },
                ..Default::default()
            })
            .await
            .map_err(|e| RenderError::ResourceCreation(format!("device: {e}")))?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Sprite sheets are uploaded as sRGB, so prefer an sRGB surface to keep
        // their colours as authored.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                RenderError::ResourceCreation("surface is incompatible with the adapter".into())
            })?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let projection = ProjectionResources::new(&device, config.width, config.height);
        let texture_bind_group_layout = diffuse_layout(&device);

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            projection,
            texture_bind_group_layout,
            // dull grey
            clear_colour: wgpu::Color {
                r: 0.4,
                g: 0.4,
                b: 0.4,
                a: 1.0,
            },
            mouse: MouseState::default(),
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// What a flow constructor gets to build its GPU resources with.
///
/// The clones only copy handles; device and queue are reference counted internally.
#[derive(Debug, Clone)]
pub struct InitContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub projection_bind_group_layout: wgpu::BindGroupLayout,
    pub texture_bind_group_layout: wgpu::BindGroupLayout,
}

impl From<&Context> for InitContext {
    fn from(ctx: &Context) -> Self {
        Self {
            device: ctx.device.clone(),
            queue: ctx.queue.clone(),
            surface_format: ctx.config.format,
            projection_bind_group_layout: ctx.projection.bind_group_layout.clone(),
            texture_bind_group_layout: ctx.texture_bind_group_layout.clone(),
        }
    }
}

/// Upload per-frame data ahead of the render pass.
///
/// Queue writes land before the commands of the frame are submitted, so
/// everything a flow draws this frame has to be written here.
pub trait BufferWriter {
    fn write_to_buffer(&mut self, ctx: &Context);
}
