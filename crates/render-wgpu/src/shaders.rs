/// Number of spot lights the shader evaluates. Must match `MAX_SPOTS` in WGSL.
pub const MAX_SPOTS: usize = 2;

/// WGSL shader shared by the drum and the rig.
///
/// Normals come from screen-space derivatives of the world position, which
/// gives flat shading per triangle without a normal attribute. Lighting is an
/// ambient term plus cone lights with inverse-square falloff and a smooth
/// range cutoff.
pub const WORLD_SHADER: &str = r#"
const MAX_SPOTS: u32 = 2u;

struct SpotLight {
    // xyz = position, w = range (0 = unlimited)
    position: vec4<f32>,
    // xyz = unit direction, w = cos(outer angle)
    direction: vec4<f32>,
    // rgb = colour, w = intensity
    color: vec4<f32>,
    // x = cos(inner angle)
    params: vec4<f32>,
};

struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
    ambient: vec4<f32>,
    spots: array<SpotLight, MAX_SPOTS>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
};

struct InstanceInput {
    @location(1) model_0: vec4<f32>,
    @location(2) model_1: vec4<f32>,
    @location(3) model_2: vec4<f32>,
    @location(4) model_3: vec4<f32>,
    @location(5) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.color = instance.color;
    return out;
}

fn spot_contribution(s: SpotLight, pos: vec3<f32>, n: vec3<f32>) -> vec3<f32> {
    let to_light = s.position.xyz - pos;
    let d = max(length(to_light), 1e-4);
    let l = to_light / d;

    let cos_angle = dot(-l, s.direction.xyz);
    let hard = step(s.direction.w, cos_angle);
    let soft = smoothstep(s.direction.w, s.params.x, cos_angle);
    let cone = select(hard, soft, s.params.x > s.direction.w);

    var range = 1.0;
    if (s.position.w > 0.0) {
        let r = clamp(1.0 - pow(d / s.position.w, 4.0), 0.0, 1.0);
        range = r * r;
    }
    let falloff = range / max(d * d, 1e-4);

    return s.color.rgb * s.color.w * falloff * cone * max(dot(n, l), 0.0);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    var n = normalize(cross(dpdx(in.world_pos), dpdy(in.world_pos)));
    let view_dir = uniforms.eye.xyz - in.world_pos;
    if (dot(n, view_dir) < 0.0) {
        n = -n;
    }

    var light = uniforms.ambient.rgb;
    for (var i = 0u; i < MAX_SPOTS; i = i + 1u) {
        light = light + spot_contribution(uniforms.spots[i], in.world_pos, n);
    }
    return vec4<f32>(in.color.rgb * min(light, vec3<f32>(1.0)), in.color.a);
}
"#;
