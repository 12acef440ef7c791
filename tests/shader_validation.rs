// tests/shader_validation.rs — offline WGSL validation (no GPU required).
//
// Parses and validates the pixelation kernel with naga, the same front end
// wgpu uses at runtime, so a malformed shader fails `cargo test` on any
// machine instead of failing at pipeline creation on a machine with a GPU.

use pixelfe::WorkgroupSize;
use pixelfe::gpu::shaders::{
    PIXELATE_ENTRY_POINT, PIXELATE_SHADER, WORKGROUP_X_OVERRIDE, WORKGROUP_Y_OVERRIDE,
};

fn parse_and_validate(source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(m) => m,
        Err(e) => panic!("pixelate shader parse failed: {e:?}"),
    };

    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module);

    if let Err(e) = info {
        panic!("pixelate shader validation failed: {e:?}");
    }

    module
}

#[test]
fn pixelate_shader_validates() {
    parse_and_validate(PIXELATE_SHADER);
}

#[test]
fn entry_point_exists_and_is_compute() {
    let module = parse_and_validate(PIXELATE_SHADER);
    let ep = module
        .entry_points
        .iter()
        .find(|ep| ep.name == PIXELATE_ENTRY_POINT)
        .unwrap_or_else(|| panic!("entry point '{PIXELATE_ENTRY_POINT}' not found"));

    assert_eq!(ep.stage, naga::ShaderStage::Compute);
}

#[test]
fn shader_declares_the_workgroup_override_constants() {
    // Pipeline creation specialises WORKGROUP_X/WORKGROUP_Y through
    // `PipelineCompilationOptions::constants`; the shader must declare
    // overrides under exactly the names `WorkgroupSize::as_constants`
    // emits, or specialisation silently falls back to the defaults.
    for name in [WORKGROUP_X_OVERRIDE, WORKGROUP_Y_OVERRIDE] {
        assert!(
            PIXELATE_SHADER.contains(&format!("override {name}: u32")),
            "shader is missing override constant '{name}'"
        );
    }

    let constants = WorkgroupSize { x: 16, y: 16 }.as_constants();
    assert!(constants.contains_key(WORKGROUP_X_OVERRIDE));
    assert!(constants.contains_key(WORKGROUP_Y_OVERRIDE));

    // And the workgroup size attribute must consume them.
    assert!(
        PIXELATE_SHADER.contains(&format!(
            "@workgroup_size({WORKGROUP_X_OVERRIDE}, {WORKGROUP_Y_OVERRIDE}, 1)"
        )),
        "workgroup_size attribute does not use the override constants"
    );
}

#[test]
fn module_contains_both_overrides() {
    let module = parse_and_validate(PIXELATE_SHADER);

    let override_names: Vec<&str> = module
        .overrides
        .iter()
        .filter_map(|(_, ov)| ov.name.as_deref())
        .collect();

    assert!(override_names.contains(&WORKGROUP_X_OVERRIDE));
    assert!(override_names.contains(&WORKGROUP_Y_OVERRIDE));
}
