//! GPU textures with a placeholder-then-replace loading policy.
//!
//! A [`Texture`] is usable the moment it is created: it starts out as a single
//! opaque blue pixel while the real image is fetched and decoded in the
//! background. The decoded image is picked up and swapped in by
//! [`Texture::poll`] on the main tick, before anything is drawn,
//! so draws never see a half-replaced texture. Holders keep the same
//! `Texture` handle throughout.

use std::{
    borrow::Cow,
    cell::{Cell, RefCell},
};

use futures::FutureExt;
use image::{RgbaImage, imageops::FilterType};

use crate::{
    error::RenderError,
    resources::texture::{ImageFuture, fetch_image},
};

/// Number of texture units a [`TextureUnit`] can address.
pub const MAX_TEXTURE_UNITS: u32 = 8;

/// Bind group of texture unit 0. Group 0 holds the projection.
pub const TEXTURE_GROUP_BASE: u32 = 1;

/// The single pixel shown until the real image arrives (opaque blue).
pub const PLACEHOLDER_PIXEL: [u8; 4] = [0, 0, 255, 255];

/// One of a fixed set of texture slots. Unit `n` is bound as group `1 + n`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureUnit(u32);

impl TextureUnit {
    pub const DIFFUSE: Self = Self(0);

    pub fn new(index: u32) -> Option<Self> {
        (index < MAX_TEXTURE_UNITS).then_some(Self(index))
    }

    pub fn index(self) -> u32 {
        self.0
    }

    pub fn bind_group_index(self) -> u32 {
        TEXTURE_GROUP_BASE + self.0
    }
}

/// Filtering and wrapping chosen from the dimensions of the arrived image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// Both sides are powers of two: full mip chain, trilinear filtering, repeat wrapping.
    Mipmapped { levels: u32 },
    /// Anything else: a single level, linear filtering, clamped to the edge.
    Clamped,
}

impl SamplingPolicy {
    pub fn for_size(width: u32, height: u32) -> Self {
        if width.is_power_of_two() && height.is_power_of_two() {
            let levels = u32::BITS - width.max(height).leading_zeros();
            SamplingPolicy::Mipmapped { levels }
        } else {
            SamplingPolicy::Clamped
        }
    }

    pub fn mip_level_count(self) -> u32 {
        match self {
            SamplingPolicy::Mipmapped { levels } => levels,
            SamplingPolicy::Clamped => 1,
        }
    }

    pub fn sampler_descriptor(self) -> wgpu::SamplerDescriptor<'static> {
        match self {
            SamplingPolicy::Mipmapped { .. } => wgpu::SamplerDescriptor {
                label: Some("mipmapped sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                address_mode_w: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Linear,
                ..Default::default()
            },
            SamplingPolicy::Clamped => wgpu::SamplerDescriptor {
                label: Some("clamped sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                address_mode_w: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug)]
struct GpuTexture {
    #[allow(unused)]
    texture: wgpu::Texture,
    #[allow(unused)]
    view: wgpu::TextureView,
    #[allow(unused)]
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
    policy: SamplingPolicy,
}

impl GpuTexture {
    /// Images larger than the device allows are refused and never reach `create_texture`.
    fn check_size(device: &wgpu::Device, label: &str, rgba: &RgbaImage) -> Result<(), RenderError> {
        let (width, height) = rgba.dimensions();
        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::AssetLoad {
                name: label.to_string(),
                message: format!("{width}x{height} exceeds the device limit of {max} texels per side"),
            });
        }
        Ok(())
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        rgba: &RgbaImage,
    ) -> Self {
        let (width, height) = rgba.dimensions();
        let policy = SamplingPolicy::for_size(width, height);
        let mip_level_count = policy.mip_level_count();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // WebGL would generate the mips for us, wgpu does not.
        for level in 0..mip_level_count {
            let level_width = (width >> level).max(1);
            let level_height = (height >> level).max(1);
            let data: Cow<RgbaImage> = if level == 0 {
                Cow::Borrowed(rgba)
            } else {
                Cow::Owned(image::imageops::resize(
                    rgba,
                    level_width,
                    level_height,
                    FilterType::Triangle,
                ))
            };
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level,
                    origin: wgpu::Origin3d::ZERO,
                },
                data.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * level_width),
                    rows_per_image: Some(level_height),
                },
                wgpu::Extent3d {
                    width: level_width,
                    height: level_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&policy.sampler_descriptor());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
            label: Some(&format!("{label} bind group")),
        });

        Self {
            texture,
            view,
            sampler,
            bind_group,
            policy,
        }
    }
}

/// A 2D image shared (read-only) by any number of sprites.
pub struct Texture {
    label: String,
    gpu: RefCell<GpuTexture>,
    pending: RefCell<Option<ImageFuture>>,
    ready: Cell<bool>,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("label", &self.label)
            .field("gpu", &self.gpu)
            .field("loading", &self.pending.borrow().is_some())
            .field("ready", &self.ready.get())
            .finish()
    }
}

impl Texture {
    /// Start loading `file_name` and return the placeholder right away.
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        file_name: &str,
    ) -> Self {
        let texture = Self::placeholder(device, queue, layout, file_name);
        *texture.pending.borrow_mut() = Some(fetch_image(file_name));
        texture
    }

    /// A texture that only ever shows [`PLACEHOLDER_PIXEL`].
    pub fn placeholder(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
    ) -> Self {
        let pixel = RgbaImage::from_raw(1, 1, PLACEHOLDER_PIXEL.to_vec())
            .unwrap_or_else(|| RgbaImage::new(1, 1));
        Self {
            label: label.to_string(),
            gpu: RefCell::new(GpuTexture::upload(device, queue, layout, label, &pixel)),
            pending: RefCell::new(None),
            ready: Cell::new(false),
        }
    }

    /// Create a ready texture from an already decoded image.
    ///
    /// An image the device cannot hold is logged and leaves the placeholder.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        rgba: &RgbaImage,
    ) -> Self {
        if let Err(e) = GpuTexture::check_size(device, label, rgba) {
            log::warn!("{e}");
            return Self::placeholder(device, queue, layout, label);
        }
        Self {
            label: label.to_string(),
            gpu: RefCell::new(GpuTexture::upload(device, queue, layout, label, rgba)),
            pending: RefCell::new(None),
            ready: Cell::new(true),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the real image has replaced the placeholder.
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn sampling_policy(&self) -> SamplingPolicy {
        self.gpu.borrow().policy
    }

    /// Swap in the loaded image if it arrived since the last call.
    ///
    /// Failed loads are logged once and leave the placeholder in place for good.
    pub fn poll(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> bool {
        let mut pending = self.pending.borrow_mut();
        let Some(image) = pending.as_mut() else {
            return self.is_ready();
        };
        let Some(result) = image.as_mut().now_or_never() else {
            return false;
        };
        *pending = None;

        let rgba = match result {
            Ok(rgba) => rgba,
            Err(e) => {
                log::warn!("{}", RenderError::asset_load(&self.label, e));
                return false;
            }
        };
        if let Err(e) = GpuTexture::check_size(device, &self.label, &rgba) {
            log::warn!("{e}");
            return false;
        }

        let (width, height) = rgba.dimensions();
        let gpu = GpuTexture::upload(device, queue, layout, &self.label, &rgba);
        log::info!(
            "Texture {} ready ({}x{}, {:?})",
            self.label,
            width,
            height,
            gpu.policy
        );
        *self.gpu.borrow_mut() = gpu;
        self.ready.set(true);
        true
    }

    /// Attach this texture to `unit` for the following draws.
    pub fn bind(&self, render_pass: &mut wgpu::RenderPass<'_>, unit: TextureUnit) {
        render_pass.set_bind_group(unit.bind_group_index(), &self.gpu.borrow().bind_group, &[]);
    }
}
