use crate::{
    error::RenderError,
    pipelines::shader::{FRAGMENT_ENTRY, SPRITE_SHADER, VERTEX_ENTRY},
};

/// Bind group 0 is the projection, group 1 the diffuse texture unit.
///
/// `vertex_layouts` are the shared quad (slot 0) followed by the per-sprite
/// instance records (slot 1). A shader override the device rejects against
/// this layout is logged and replaced with the built-in shader.
pub async fn mk_sprite_pipeline(
    device: &wgpu::Device,
    color_format: wgpu::TextureFormat,
    projection_bind_group_layout: &wgpu::BindGroupLayout,
    texture_bind_group_layout: &wgpu::BindGroupLayout,
    vertex_layouts: &[wgpu::VertexBufferLayout<'_>],
    shader_source: &str,
) -> wgpu::RenderPipeline {
    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Sprite Pipeline Layout"),
        bind_group_layouts: &[Some(projection_bind_group_layout), Some(texture_bind_group_layout)],
        ..Default::default()
    });

    let build = |source: &str| {
        mk_render_pipeline(
            device,
            &render_pipeline_layout,
            color_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            vertex_layouts,
            wgpu::ShaderModuleDescriptor {
                label: Some("Sprite Shader"),
                source: wgpu::ShaderSource::Wgsl(source.to_string().into()),
            },
        )
    };

    if shader_source != SPRITE_SHADER {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = build(shader_source);
        match scope.pop().await {
            None => return pipeline,
            Some(e) => {
                log::error!(
                    "{}",
                    RenderError::ShaderLink {
                        label: "sprite shader override".to_string(),
                        message: e.to_string(),
                    }
                );
                log::error!("Falling back to the built-in sprite shader");
            }
        }
    }
    build(SPRITE_SHADER)
}

pub fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: wgpu::ShaderModuleDescriptor,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(shader);

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Sprite Render Pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(VERTEX_ENTRY),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(FRAGMENT_ENTRY),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Sprites may be mirrored with a negative scale.
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        // Sprites are drawn back to front in insertion order, no depth test.
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
    })
}
