//! Flow control and application event loop.
//!
//! A "flow" is a self-contained piece of the application that draws into the
//! shared render pass and advances its own state every frame. The host owns the
//! window, the GPU context and the timing; flows only see the [`Context`].
//!
//! # Lifecycle
//!
//! Every redraw runs in this order:
//! 1. Refresh the projection for the current surface size
//! 2. `write_to_buffer` on every flow (queue writes for this frame)
//! 3. Clear to `ctx.clear_colour` and let every flow record `on_render`
//! 4. Submit and present
//! 5. `on_update` with the wall-clock time since the previous redraw
//!
//! Drawing before updating means the very first frame shows every sprite at
//! its initial animation frame.

use std::{fmt::Debug, iter, pin::Pin, sync::Arc};

use instant::{Duration, Instant};

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::context::{BufferWriter, Context, InitContext};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Canvas the browser build renders into.
pub const CANVAS_ID: &str = "glcanvas";

///
/// Output of every lifecycle hook.
///
/// `Out::Configure` modifies the Context at runtime, for instance to change
/// the clear colour.
///
/// `Empty` is the default output when nothing needs to change.
///
pub enum Out {
    Configure(Box<dyn FnOnce(&mut Context)>),
    Empty,
}

impl Default for Out {
    fn default() -> Self {
        Self::Empty
    }
}

/// A renderable piece of the application.
///
/// # Lifecycle
///
/// 1. `on_init()` is called once after construction; configure the context here
/// 2. `on_window_events()` is called for each winit window event
/// 3. `write_to_buffer()` and `on_render()` are called every frame
/// 4. `on_update()` is called every frame after the frame was presented
///
pub trait GraphicsFlow: BufferWriter {
    /// Initialize the flow and configure the context.
    fn on_init(&mut self, ctx: &mut Context) -> Out;

    /// Advance state by the elapsed wall-clock time `dt`.
    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out;

    /// Handle window events (keyboard, pointer, resizing).
    fn on_window_events(&mut self, ctx: &Context, event: &WindowEvent) -> Out;

    /// Record draw commands into the frame's render pass.
    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>);
}

// Dummy impl to make wasm work
impl Debug for dyn GraphicsFlow + 'static {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("GraphicsFlow")
    }
}

/// A flow under construction.
pub type FlowFuture = Pin<Box<dyn Future<Output = anyhow::Result<Box<dyn GraphicsFlow>>>>>;

/// Type alias for a flow constructor (factory function).
///
/// A flow constructor takes an `InitContext` and asynchronously builds a
/// boxed `GraphicsFlow`, so flows can load their resources lazily.
pub type FlowConstructor = Box<dyn FnOnce(InitContext) -> FlowFuture>;

/// GPU context plus surface status.
#[derive(Debug)]
pub struct AppState {
    pub(crate) ctx: Context,
    is_surface_configured: bool,
}

impl AppState {
    async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let ctx = Context::new(window).await?;
        Ok(Self {
            ctx,
            is_surface_configured: false,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.ctx.config.width = width;
            self.ctx.config.height = height;
            self.is_surface_configured = true;
            self.ctx
                .surface
                .configure(&self.ctx.device, &self.ctx.config);
        }
    }

    fn render(&mut self, graphics_flows: &mut [Box<dyn GraphicsFlow>]) -> Result<(), wgpu::CurrentSurfaceTexture> {
        // invoke main render loop
        self.ctx.window.request_redraw();

        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        let (width, height) = (self.ctx.config.width, self.ctx.config.height);
        self.ctx.projection.update(&self.ctx.queue, width, height);
        graphics_flows
            .iter_mut()
            .for_each(|flow| flow.write_to_buffer(&self.ctx));

        let output = match self.ctx.surface.get_current_texture() {
            wgpu::CurrentSurfaceTexture::Success(t) | wgpu::CurrentSurfaceTexture::Suboptimal(t) => t,
            other => return Err(other),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.ctx.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                ..Default::default()
            });
            render_pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

            graphics_flows
                .iter()
                .for_each(|flow| flow.on_render(&self.ctx, &mut render_pass));
        }

        self.ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    proxy: winit::event_loop::EventLoopProxy<FlowEvent>,
    state: Option<AppState>,
    // This will hold the fully initialized flows once they are ready.
    graphics_flows: Vec<Box<dyn GraphicsFlow>>,
    // This holds the constructors at the start.
    // We use Option to `take()` it after use.
    constructors: Option<Vec<FlowConstructor>>,
    last_time: Instant,
    // Why the loop stopped before the first frame, if it did.
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<FlowEvent>, constructors: Vec<FlowConstructor>) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            state: None,
            graphics_flows: Vec::new(),
            constructors: Some(constructors),
            last_time: Instant::now(),
            failure: None,
        })
    }

    fn initialized(&mut self, mut app_state: AppState, flows: Vec<Box<dyn GraphicsFlow>>) {
        let size = app_state.ctx.window.inner_size();
        app_state.resize(size.width, size.height);
        self.graphics_flows = flows;
        self.graphics_flows.iter_mut().for_each(|flow| {
            let out = flow.on_init(&mut app_state.ctx);
            handle_flow_output(&mut app_state.ctx, out);
        });
        app_state.ctx.window.request_redraw();
        self.state = Some(app_state);
        self.last_time = Instant::now();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("Initialization failed: {error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }
}

pub(crate) enum FlowEvent {
    #[allow(dead_code)]
    Initialized {
        state: AppState,
        flows: Vec<Box<dyn GraphicsFlow>>,
    },
    #[allow(dead_code)]
    Failed(String),
}

impl Debug for FlowEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized { state: _, flows } => {
                f.debug_struct("Initialized").field("flows", flows).finish()
            }
            Self::Failed(msg) => f.debug_tuple("Failed").field(msg).finish(),
        }
    }
}

impl ApplicationHandler<FlowEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(constructors) = self.constructors.take() else {
            // Already initialized, e.g. resumed after a suspend.
            return;
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title("sprite-ngin");

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let window = wgpu::web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.fail(event_loop, anyhow::Error::new(e).context("Unable to create a window"));
                return;
            }
        };

        let init_future = async move {
            let app_state = AppState::new(window).await?;
            let flow_futures: Vec<_> = constructors
                .into_iter()
                // The clone in into() leverages the internal Arcs of Device and Queue and thus only clones the ref
                .map(|constructor| constructor((&app_state.ctx).into()))
                .collect();
            let flows = futures::future::try_join_all(flow_futures).await?;
            anyhow::Ok((app_state, flows))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            match self.async_runtime.block_on(init_future) {
                Ok((app_state, flows)) => self.initialized(app_state, flows),
                Err(e) => self.fail(event_loop, e),
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let event = match init_future.await {
                    Ok((state, flows)) => FlowEvent::Initialized { state, flows },
                    Err(e) => FlowEvent::Failed(format!("{e:#}")),
                };
                if proxy.send_event(event).is_err() {
                    log::error!("Event loop closed before initialization finished");
                }
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: FlowEvent) {
        match event {
            FlowEvent::Initialized { state, flows } => {
                // This is the message from our wasm `spawn_local`
                self.initialized(state, flows);
            }
            FlowEvent::Failed(msg) => self.fail(event_loop, anyhow::anyhow!(msg)),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        if let WindowEvent::CursorMoved {
            device_id: _,
            position,
        } = event
        {
            state.ctx.mouse.coords = Some(position);
        };

        self.graphics_flows.iter_mut().for_each(|f| {
            let out = f.on_window_events(&state.ctx, &event);
            handle_flow_output(&mut state.ctx, out);
        });

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                match state.render(&mut self.graphics_flows) {
                    Ok(_) => {
                        self.graphics_flows.iter_mut().for_each(|f| {
                            let out = f.on_update(&state.ctx, dt);
                            handle_flow_output(&mut state.ctx, out);
                        });
                    }
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::CurrentSurfaceTexture::Lost | wgpu::CurrentSurfaceTexture::Outdated) => {
                        let size = state.ctx.window.inner_size();
                        state.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {:?}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

fn handle_flow_output(ctx: &mut Context, out: Out) {
    match out {
        Out::Configure(f) => f(ctx),
        Out::Empty => (),
    }
}

pub fn run(constructors: Vec<FlowConstructor>) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&format!("Could not initialize logger: {e}").into());
        }
    }

    let event_loop: EventLoop<FlowEvent> = EventLoop::with_user_event().build()?;

    let mut app = App::new(&event_loop, constructors)?;

    event_loop.run_app(&mut app)?;

    match app.failure.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
