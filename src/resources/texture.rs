use std::{future::Future, pin::Pin};

use futures::channel::oneshot;
use image::RgbaImage;

use crate::resources::load_binary;

/// Layout of a texture unit: the diffuse texture at binding 0, its sampler at binding 1.
pub fn diffuse_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("diffuse_bind_group_layout"),
    })
}

pub fn decode_image(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

/// An image on its way in. Polling it never blocks.
pub type ImageFuture = Pin<Box<dyn Future<Output = anyhow::Result<RgbaImage>>>>;

async fn load_image(file_name: String) -> anyhow::Result<RgbaImage> {
    let bytes = load_binary(&file_name).await?;
    decode_image(&bytes)
}

/// Fetch and decode `file_name`.
///
/// With an executor around (tokio natively, the browser's on the web) the
/// fetch runs in the background and the returned future only waits for its
/// result. Without one, the fetch itself is returned and makes progress
/// whenever it is polled. There is no way to cancel the fetch.
pub fn fetch_image(file_name: &str) -> ImageFuture {
    in_background(load_image(file_name.to_string()))
}

/// Split `load` into a task to spawn and the future that receives its result.
fn forward(
    load: impl Future<Output = anyhow::Result<RgbaImage>> + 'static,
) -> (impl Future<Output = ()> + 'static, ImageFuture) {
    let (tx, rx) = oneshot::channel();
    let task = async move {
        // The texture may have been dropped in the meantime; then nobody cares.
        let _ = tx.send(load.await);
    };
    let result = Box::pin(async move {
        rx.await
            .unwrap_or_else(|_| Err(anyhow::anyhow!("loader went away")))
    });
    (task, result)
}

#[cfg(target_arch = "wasm32")]
fn in_background(load: impl Future<Output = anyhow::Result<RgbaImage>> + 'static) -> ImageFuture {
    let (task, result) = forward(load);
    wasm_bindgen_futures::spawn_local(task);
    result
}

#[cfg(not(target_arch = "wasm32"))]
fn in_background(
    load: impl Future<Output = anyhow::Result<RgbaImage>> + Send + 'static,
) -> ImageFuture {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            let (task, result) = forward(load);
            handle.spawn(task);
            result
        }
        Err(_) => {
            log::debug!("No async runtime around, loading on poll");
            Box::pin(load)
        }
    }
}
