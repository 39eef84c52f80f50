#![allow(dead_code)]

use std::time::Duration;

use futures::channel::oneshot;
use image::RgbaImage;
use sprite_ngin::{context::InitContext, projection::ProjectionResources, resources::texture::diffuse_layout, scene::Scene};

pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// A headless device plus the layouts a scene is built with.
pub(crate) struct Gpu {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) texture_layout: wgpu::BindGroupLayout,
}

impl Gpu {
    /// `None` when the machine has no usable adapter; callers skip the test then.
    pub(crate) fn new() -> Option<Self> {
        futures::executor::block_on(async {
            let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::new_without_display_handle());
            let adapter = match instance
                .request_adapter(&wgpu::RequestAdapterOptions::default())
                .await
            {
                Ok(adapter) => adapter,
                Err(e) => {
                    eprintln!("skipping GPU test, no adapter: {e}");
                    return None;
                }
            };
            let (device, queue) = match adapter
                .request_device(&wgpu::DeviceDescriptor::default())
                .await
            {
                Ok(pair) => pair,
                Err(e) => {
                    eprintln!("skipping GPU test, no device: {e}");
                    return None;
                }
            };
            let texture_layout = diffuse_layout(&device);
            Some(Self {
                device,
                queue,
                texture_layout,
            })
        })
    }

    pub(crate) fn projection(&self, width: u32, height: u32) -> ProjectionResources {
        ProjectionResources::new(&self.device, width, height)
    }

    pub(crate) fn init_context(&self, projection: &ProjectionResources) -> InitContext {
        InitContext {
            device: self.device.clone(),
            queue: self.queue.clone(),
            surface_format: TARGET_FORMAT,
            projection_bind_group_layout: projection.bind_group_layout.clone(),
            texture_bind_group_layout: self.texture_layout.clone(),
        }
    }

    /// Render one frame of `scene` into a `size` x `size` target and read it back.
    ///
    /// `size` has to keep rows 256 byte aligned.
    pub(crate) fn render(
        &self,
        scene: &Scene,
        projection: &ProjectionResources,
        clear: wgpu::Color,
        size: u32,
    ) -> RgbaImage {
        scene.prepare(&self.device, &self.queue, &self.texture_layout);

        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        };
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Test Output Texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = target.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Test Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Test Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
                ..Default::default()
            });
            scene.draw(&mut render_pass, &projection.bind_group);
        }

        let u32_size = std::mem::size_of::<u32>() as u32;
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            size: (u32_size * size * size) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            label: None,
            mapped_at_creation: false,
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &output_buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(u32_size * size),
                    rows_per_image: Some(size),
                },
            },
            extent,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let (tx, rx) = oneshot::channel();
        let buffer_slice = output_buffer.slice(..);
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: Some(Duration::from_secs(3)),
            })
            .unwrap();
        futures::executor::block_on(rx).unwrap().unwrap();
        let data = buffer_slice.get_mapped_range().to_vec();
        RgbaImage::from_raw(size, size, data).unwrap()
    }
}

/// Assert `actual` is within `tolerance` of `expected` on every channel.
pub(crate) fn assert_pixel(actual: &image::Rgba<u8>, expected: [u8; 4], tolerance: u8) {
    for (a, e) in actual.0.iter().zip(expected) {
        assert!(
            a.abs_diff(e) <= tolerance,
            "pixel {:?} differs from {:?}",
            actual.0,
            expected
        );
    }
}
