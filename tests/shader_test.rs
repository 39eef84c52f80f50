use sprite_ngin::{
    RenderError,
    pipelines::shader::{SPRITE_SHADER, load_sprite_shader, validate_wgsl},
};

#[test]
fn built_in_shader_is_valid() {
    validate_wgsl("sprite.wgsl", SPRITE_SHADER).unwrap();
}

#[test]
fn syntax_errors_fail_to_compile() {
    let broken = SPRITE_SHADER.replacen("fn vs_main", "fn vs_main(((", 1);
    match validate_wgsl("broken.wgsl", &broken) {
        Err(RenderError::ShaderCompile { label, message }) => {
            assert_eq!(label, "broken.wgsl");
            assert!(!message.is_empty());
        }
        other => panic!("expected ShaderCompile, got {other:?}"),
    }
}

#[test]
fn missing_entry_point_fails_to_link() {
    let source = r#"
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(i), 0.0, 0.0, 1.0);
}
"#;
    assert!(matches!(
        validate_wgsl("vertex_only.wgsl", source),
        Err(RenderError::ShaderLink { .. })
    ));
}

#[test]
fn no_override_uses_the_built_in_shader() {
    let source = futures::executor::block_on(load_sprite_shader(None));
    assert_eq!(source, SPRITE_SHADER);
}

#[test]
fn missing_override_falls_back_to_the_built_in_shader() {
    let source = futures::executor::block_on(load_sprite_shader(Some("no_such_shader.wgsl")));
    assert_eq!(source, SPRITE_SHADER);
}
