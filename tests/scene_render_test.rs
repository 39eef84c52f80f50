#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod gpu {
    use std::rc::Rc;

    use image::{Rgba, RgbaImage};
    use instant::Duration;
    use sprite_ngin::{
        RenderError,
        data_structures::{
            layout::AttributeLayout,
            sprite::{CENTERED_TEXTURED_SQUARE, quad_attributes},
            texture::{PLACEHOLDER_PIXEL, SamplingPolicy, Texture},
            vertex_buffer::InterleavedVertexBuffer,
        },
        scene::{Scene, SceneConfig},
    };

    use crate::common::test_utils::{Gpu, assert_pixel};

    const WHITE: wgpu::Color = wgpu::Color::WHITE;
    const SIZE: u32 = 256;

    /// Four frames, each a single texel: red, green, blue, white.
    fn four_frame_sheet() -> RgbaImage {
        let mut sheet = RgbaImage::new(4, 1);
        sheet.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        sheet.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        sheet.put_pixel(2, 0, Rgba([0, 0, 255, 255]));
        sheet.put_pixel(3, 0, Rgba([255, 255, 255, 255]));
        sheet
    }

    fn single_sprite_config() -> SceneConfig {
        SceneConfig {
            grid_size: 1,
            frame_count: 4,
            frame_duration: Duration::from_millis(100),
            ..Default::default()
        }
    }

    #[test]
    fn uploads_the_shared_quad() {
        let Some(gpu) = Gpu::new() else { return };
        let quad = InterleavedVertexBuffer::new(
            &gpu.device,
            "quad",
            &CENTERED_TEXTURED_SQUARE,
            quad_attributes(),
        )
        .unwrap();
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.stride(), 16);
    }

    #[test]
    fn rejects_mismatched_vertex_data() {
        let Some(gpu) = Gpu::new() else { return };
        let partial = [0.0f32; 6];
        assert!(matches!(
            InterleavedVertexBuffer::new(&gpu.device, "partial", &partial, quad_attributes()),
            Err(RenderError::MalformedBuffer { .. })
        ));

        let bytes = [0u8; 16];
        assert!(matches!(
            InterleavedVertexBuffer::new(
                &gpu.device,
                "bytes",
                &bytes,
                vec![AttributeLayout::float32(0, 4)]
            ),
            Err(RenderError::ComponentMismatch {
                expected: 4,
                actual: 1
            })
        ));
    }

    #[test]
    fn missing_sprite_sheet_keeps_the_placeholder() {
        let Some(gpu) = Gpu::new() else { return };
        let texture = Texture::load(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            "definitely_not_here.png",
        );
        assert!(!texture.poll(&gpu.device, &gpu.queue, &gpu.texture_layout));
        assert!(!texture.poll(&gpu.device, &gpu.queue, &gpu.texture_layout));
        assert!(!texture.is_ready());
        assert_eq!(
            texture.sampling_policy(),
            SamplingPolicy::Mipmapped { levels: 1 }
        );
    }

    #[test]
    fn loaded_sprite_sheet_replaces_the_placeholder() {
        let Some(gpu) = Gpu::new() else { return };
        let path = std::env::temp_dir().join(format!("sprite-ngin-sheet-{}.png", std::process::id()));
        image::RgbaImage::new(640, 64).save(&path).unwrap();

        let texture = Texture::load(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            path.to_str().unwrap(),
        );
        assert!(!texture.is_ready());
        assert!(texture.poll(&gpu.device, &gpu.queue, &gpu.texture_layout));
        assert_eq!(texture.sampling_policy(), SamplingPolicy::Clamped);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn oversized_sprite_sheet_keeps_the_placeholder() {
        let Some(gpu) = Gpu::new() else { return };
        let too_wide = gpu.device.limits().max_texture_dimension_2d + 1;

        let texture = Texture::from_image(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            "too wide",
            &RgbaImage::new(too_wide, 1),
        );
        assert!(!texture.is_ready());
        assert_eq!(
            texture.sampling_policy(),
            SamplingPolicy::Mipmapped { levels: 1 }
        );

        let path = std::env::temp_dir().join(format!("sprite-ngin-wide-{}.png", std::process::id()));
        RgbaImage::new(too_wide, 1).save(&path).unwrap();
        let texture = Texture::load(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            path.to_str().unwrap(),
        );
        assert!(!texture.poll(&gpu.device, &gpu.queue, &gpu.texture_layout));
        assert!(!texture.is_ready());
        assert!(!texture.poll(&gpu.device, &gpu.queue, &gpu.texture_layout));

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn scene_builds_on_a_plain_executor() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let config = SceneConfig {
            grid_size: 3,
            sprite_sheet: "definitely_not_here.png".to_string(),
            ..Default::default()
        };
        let scene = futures::executor::block_on(async {
            Scene::new(gpu.init_context(&projection), config).await
        })
        .unwrap();
        assert_eq!(scene.sprites().len(), 9);

        scene.prepare(&gpu.device, &gpu.queue, &gpu.texture_layout);
        assert!(!scene.sprite_sheet().is_ready());
    }

    #[test]
    fn shader_override_not_matching_the_pipeline_falls_back() {
        let Some(gpu) = Gpu::new() else { return };
        // Valid WGSL with both entry points, but it wants a third bind group.
        let source = r#"
@group(2) @binding(0) var<uniform> tint: vec4<f32>;

@vertex
fn vs_main(@location(0) position: vec2<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(position, 0.0, 1.0) + tint * 0.0;
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.0, 0.0, 1.0);
}
"#;
        sprite_ngin::pipelines::shader::validate_wgsl("tinted.wgsl", source).unwrap();
        let path = std::env::temp_dir().join(format!("sprite-ngin-tinted-{}.wgsl", std::process::id()));
        std::fs::write(&path, source).unwrap();

        let projection = gpu.projection(SIZE, SIZE);
        let config = SceneConfig {
            grid_size: 1,
            sprite_sheet: "definitely_not_here.png".to_string(),
            shader: Some(path.to_str().unwrap().to_string()),
            ..Default::default()
        };
        let scene =
            futures::executor::block_on(Scene::new(gpu.init_context(&projection), config)).unwrap();

        // The built-in shader draws the placeholder, the override would have drawn red.
        let frame = gpu.render(&scene, &projection, WHITE, SIZE);
        assert_pixel(frame.get_pixel(128, 128), PLACEHOLDER_PIXEL, 1);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn placeholder_fills_the_grid() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let config = SceneConfig {
            grid_size: 4,
            sprite_sheet: "definitely_not_here.png".to_string(),
            ..Default::default()
        };
        let scene =
            futures::executor::block_on(Scene::new(gpu.init_context(&projection), config)).unwrap();
        assert_eq!(scene.sprites().len(), 16);

        let frame = gpu.render(&scene, &projection, WHITE, SIZE);
        for (x, y) in [(1, 1), (128, 128), (254, 3), (200, 250)] {
            assert_pixel(frame.get_pixel(x, y), PLACEHOLDER_PIXEL, 1);
        }
    }

    #[test]
    fn wide_surfaces_leave_the_sides_clear() {
        let Some(gpu) = Gpu::new() else { return };
        // 2:1 aspect squeezed into a square target: the grid covers the middle half.
        let projection = gpu.projection(2 * SIZE, SIZE);
        let config = SceneConfig {
            grid_size: 2,
            sprite_sheet: "definitely_not_here.png".to_string(),
            ..Default::default()
        };
        let scene =
            futures::executor::block_on(Scene::new(gpu.init_context(&projection), config)).unwrap();

        let frame = gpu.render(&scene, &projection, WHITE, SIZE);
        assert_pixel(frame.get_pixel(10, 128), [255, 255, 255, 255], 1);
        assert_pixel(frame.get_pixel(128, 128), PLACEHOLDER_PIXEL, 1);
        assert_pixel(frame.get_pixel(245, 128), [255, 255, 255, 255], 1);
    }

    #[test]
    fn sprite_shows_the_slice_of_its_current_frame() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let sheet = Rc::new(Texture::from_image(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            "four frames",
            &four_frame_sheet(),
        ));
        let mut scene = futures::executor::block_on(Scene::with_sprite_sheet(
            gpu.init_context(&projection),
            single_sprite_config(),
            sheet,
        ))
        .unwrap();

        let frame = gpu.render(&scene, &projection, WHITE, SIZE);
        assert_pixel(frame.get_pixel(128, 128), [255, 0, 0, 255], 8);

        scene.sprites_mut()[0].advance(Duration::from_millis(201));
        assert_eq!(scene.sprites()[0].clock().frame(), 2);
        let frame = gpu.render(&scene, &projection, WHITE, SIZE);
        assert_pixel(frame.get_pixel(128, 128), [0, 0, 255, 255], 8);
    }

    #[test]
    fn pointer_far_away_freezes_the_animation() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let sheet = Rc::new(Texture::from_image(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            "four frames",
            &four_frame_sheet(),
        ));
        let mut scene = futures::executor::block_on(Scene::with_sprite_sheet(
            gpu.init_context(&projection),
            single_sprite_config(),
            sheet,
        ))
        .unwrap();

        scene.update([5.0, 5.0].into(), Duration::from_secs(3));
        assert_eq!(scene.sprites()[0].clock().frame(), 0);

        // Right on top of the sprite time runs about 1.45 times faster.
        scene.update([0.0, 0.0].into(), Duration::from_millis(150));
        assert_eq!(scene.sprites()[0].clock().frame(), 2);
    }

    #[test]
    fn set_transform_rebuilds_the_model_matrix() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let sheet = Rc::new(Texture::from_image(
            &gpu.device,
            &gpu.queue,
            &gpu.texture_layout,
            "four frames",
            &four_frame_sheet(),
        ));
        let mut scene = futures::executor::block_on(Scene::with_sprite_sheet(
            gpu.init_context(&projection),
            single_sprite_config(),
            sheet,
        ))
        .unwrap();

        let sprite = &mut scene.sprites_mut()[0];
        sprite.set_transform(0.25, -0.5, 0.1);
        assert_eq!(sprite.position(), sprite_ngin::Vector2::new(0.25, -0.5));
        assert_eq!(sprite.scale(), 0.1);
        let model = sprite.model_matrix();
        assert_eq!(model.w.x, 0.25);
        assert_eq!(model.w.y, -0.5);
        assert_eq!(model.x.x, 0.1);
        assert_eq!(model.z.z, 1.0);
        assert_eq!(sprite.to_raw().model[3][0], 0.25);
    }

    #[test]
    fn invalid_animation_aborts_the_scene() {
        let Some(gpu) = Gpu::new() else { return };
        let projection = gpu.projection(SIZE, SIZE);
        let config = SceneConfig {
            frame_count: 0,
            grid_size: 1,
            sprite_sheet: "definitely_not_here.png".to_string(),
            ..Default::default()
        };
        let result = futures::executor::block_on(Scene::new(gpu.init_context(&projection), config));
        assert!(matches!(result, Err(RenderError::InvalidAnimation)));
    }
}
