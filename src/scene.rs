//! The sprite grid: one shared quad, one sprite sheet, a grid of animated sprites.
//!
//! Each frame the scene uploads every sprite's transform and current frame,
//! draws all sprites in insertion order and then advances their animation
//! clocks. Sprites near the pointer play faster than real time, sprites
//! outside the proximity radius stand still.

use std::rc::Rc;

use cgmath::Vector2;
use instant::Duration;

use crate::{
    context::{BufferWriter, Context, InitContext},
    data_structures::{
        animation::Proximity,
        sprite::{CENTERED_TEXTURED_SQUARE, Sprite, SpriteInstances, quad_attributes},
        texture::Texture,
        vertex_buffer::InterleavedVertexBuffer,
    },
    error::RenderError,
    flow::{FlowConstructor, FlowFuture, GraphicsFlow, Out},
    pipelines::{shader::load_sprite_shader, sprite::mk_sprite_pipeline},
};

/// Scene settings. The defaults reproduce the bird grid demo.
#[derive(Clone, Debug)]
pub struct SceneConfig {
    /// Sprites per row and per column.
    pub grid_size: u32,
    /// Horizontally tiled sprite sheet, relative to the assets directory.
    pub sprite_sheet: String,
    pub frame_count: u32,
    pub frame_duration: Duration,
    pub proximity: Proximity,
    pub clear_colour: wgpu::Color,
    /// WGSL override for the sprite shader, relative to the assets directory.
    pub shader: Option<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            grid_size: 32,
            sprite_sheet: "birbsprites.png".to_string(),
            frame_count: 20,
            frame_duration: Duration::from_secs(1) / 30,
            proximity: Proximity::default(),
            clear_colour: wgpu::Color {
                r: 0.4,
                g: 0.4,
                b: 0.4,
                a: 1.0,
            },
            shader: None,
        }
    }
}

/// Centers and scale of a `count` x `count` grid covering `[-1, 1]` on both axes.
///
/// Row-major, starting at the bottom left cell.
pub fn grid_layout(count: u32) -> Vec<(Vector2<f32>, f32)> {
    if count == 0 {
        return Vec::new();
    }
    let width = 2.0 / count as f32;
    (0..count)
        .flat_map(|row| (0..count).map(move |col| (row, col)))
        .map(|(row, col)| {
            let x = -1.0 + width * 0.5 + col as f32 * width;
            let y = -1.0 + width * 0.5 + row as f32 * width;
            (Vector2::new(x, y), width)
        })
        .collect()
}

/// Advance every sprite by `dt` scaled with its proximity to `pointer`.
pub fn animate(sprites: &mut [Sprite], proximity: &Proximity, pointer: Vector2<f32>, dt: Duration) {
    for sprite in sprites {
        let speed = proximity.speed(pointer, sprite.position());
        if speed > 0.0 {
            sprite.advance(dt.mul_f32(speed));
        }
    }
}

pub struct Scene {
    config: SceneConfig,
    quad: Rc<InterleavedVertexBuffer>,
    sprite_sheet: Rc<Texture>,
    sprites: Vec<Sprite>,
    instances: SpriteInstances,
    pipeline: wgpu::RenderPipeline,
}

impl Scene {
    pub async fn new(ctx: InitContext, config: SceneConfig) -> Result<Self, RenderError> {
        let sprite_sheet = Rc::new(Texture::load(
            &ctx.device,
            &ctx.queue,
            &ctx.texture_bind_group_layout,
            &config.sprite_sheet,
        ));
        Self::with_sprite_sheet(ctx, config, sprite_sheet).await
    }

    /// Build the scene around an existing sprite sheet instead of loading `config.sprite_sheet`.
    pub async fn with_sprite_sheet(
        ctx: InitContext,
        config: SceneConfig,
        sprite_sheet: Rc<Texture>,
    ) -> Result<Self, RenderError> {
        let quad = Rc::new(InterleavedVertexBuffer::new(
            &ctx.device,
            "Centered Square",
            &CENTERED_TEXTURED_SQUARE,
            quad_attributes(),
        )?);

        let sprites = grid_layout(config.grid_size)
            .into_iter()
            .map(|(position, scale)| {
                Sprite::new(
                    quad.clone(),
                    sprite_sheet.clone(),
                    config.frame_count,
                    config.frame_duration,
                    position,
                    scale,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let instances = SpriteInstances::new(&ctx.device, sprites.len())?;

        let shader = load_sprite_shader(config.shader.as_deref()).await;
        let pipeline = mk_sprite_pipeline(
            &ctx.device,
            ctx.surface_format,
            &ctx.projection_bind_group_layout,
            &ctx.texture_bind_group_layout,
            &[quad.layout().desc(), instances.layout().desc()],
            &shader,
        )
        .await;

        log::info!(
            "Scene with {} sprites of {} frames each",
            sprites.len(),
            config.frame_count
        );

        Ok(Self {
            config,
            quad,
            sprite_sheet,
            sprites,
            instances,
            pipeline,
        })
    }

    /// A flow constructor for the host loop.
    pub fn constructor(config: SceneConfig) -> FlowConstructor {
        Box::new(move |ctx: InitContext| {
            let flow: FlowFuture = Box::pin(async move {
                let scene = Scene::new(ctx, config).await?;
                anyhow::Ok(Box::new(scene) as Box<dyn GraphicsFlow>)
            });
            flow
        })
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut [Sprite] {
        &mut self.sprites
    }

    pub fn sprite_sheet(&self) -> &Texture {
        &self.sprite_sheet
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Swap in the sprite sheet once it arrived and upload this frame's sprite records.
    pub fn prepare(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
    ) {
        self.sprite_sheet
            .poll(device, queue, texture_bind_group_layout);
        self.instances.write(queue, &self.sprites);
    }

    /// Draw every sprite in insertion order, later sprites on top.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, projection: &wgpu::BindGroup) {
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, projection, &[]);
        self.quad.apply_layout(render_pass);
        self.instances.bind(render_pass);
        let drawable = self.sprites.len().min(self.instances.capacity());
        for (instance, sprite) in self.sprites[..drawable].iter().enumerate() {
            sprite.draw(render_pass, instance as u32);
        }
    }

    /// Advance the animations by `dt`, `pointer` given in sprite space.
    pub fn update(&mut self, pointer: Vector2<f32>, dt: Duration) {
        animate(&mut self.sprites, &self.config.proximity, pointer, dt);
    }
}

impl BufferWriter for Scene {
    fn write_to_buffer(&mut self, ctx: &Context) {
        self.prepare(&ctx.device, &ctx.queue, &ctx.texture_bind_group_layout);
    }
}

impl GraphicsFlow for Scene {
    fn on_init(&mut self, _: &mut Context) -> Out {
        let colour = self.config.clear_colour;
        Out::Configure(Box::new(move |ctx: &mut Context| ctx.clear_colour = colour))
    }

    fn on_update(&mut self, ctx: &Context, dt: Duration) -> Out {
        let pointer = ctx.mouse.scene_position(&ctx.projection.projection);
        self.update(pointer, dt);
        Out::Empty
    }

    fn on_window_events(&mut self, _: &Context, _: &winit::event::WindowEvent) -> Out {
        Out::Empty
    }

    fn on_render(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        self.draw(render_pass, &ctx.projection.bind_group);
    }
}
