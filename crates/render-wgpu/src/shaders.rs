/// WGSL shader for scene meshes: sun lighting, environment reflection, linear fog.
pub const SCENE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    // xyz: direction toward the sun
    sun_dir: vec4<f32>,
    // rgb: color * intensity
    sun_color: vec4<f32>,
    // rgb: fog color, a: 1 when fog is enabled
    fog_color: vec4<f32>,
    // x: near, y: far, z: 1 when an environment is bound, w: overlay alpha
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(1)
var env_map: texture_cube<f32>;
@group(0) @binding(2)
var env_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) base_color: vec4<f32>,
    // x: metalness, y: roughness, z: opacity
    @location(7) surface: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) base_color: vec4<f32>,
    @location(3) surface: vec4<f32>,
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
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_pos = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.base_color = instance.base_color;
    out.surface = instance.surface;
    return out;
}

const PI: f32 = 3.14159265;

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.world_normal);
    if !front {
        n = -n;
    }
    let to_camera = globals.camera_pos.xyz - in.world_pos;
    let v = normalize(to_camera);
    let l = normalize(globals.sun_dir.xyz);
    let h = normalize(v + l);

    let metalness = in.surface.x;
    let roughness = clamp(in.surface.y, 0.04, 1.0);
    let albedo = in.base_color.rgb;
    let f0 = mix(vec3<f32>(0.04), albedo, metalness);

    let n_dot_l = max(dot(n, l), 0.0);
    let n_dot_v = max(dot(n, v), 0.001);
    let n_dot_h = max(dot(n, h), 0.0);
    let fresnel = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - n_dot_v, 5.0);

    // Blinn-Phong lobe standing in for GGX, sharpened as roughness drops.
    let shininess = 2.0 / (roughness * roughness * roughness * roughness) - 2.0;
    let specular = fresnel * pow(n_dot_h, max(shininess, 1.0)) * (shininess + 8.0) / (8.0 * PI);
    let diffuse = albedo * (1.0 - metalness) / PI;
    var color = (diffuse + specular) * globals.sun_color.rgb * n_dot_l;

    if globals.params.z > 0.5 {
        let r = reflect(-v, n);
        let reflection = textureSample(env_map, env_sampler, r).rgb;
        let irradiance = textureSample(env_map, env_sampler, n).rgb;
        color += irradiance * diffuse * PI * 0.3;
        color += reflection * fresnel * (1.0 - roughness);
    }

    if globals.fog_color.a > 0.5 {
        let near = globals.params.x;
        let far = globals.params.y;
        let fog = clamp((length(to_camera) - near) / max(far - near, 0.0001), 0.0, 1.0);
        color = mix(color, globals.fog_color.rgb, fog);
    }

    return vec4<f32>(color, in.base_color.a * in.surface.z);
}
"#;

/// WGSL shader for the full-screen loading overlay.
pub const OVERLAY_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
    sun_dir: vec4<f32>,
    sun_color: vec4<f32>,
    fog_color: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@vertex
fn vs_overlay(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let x = f32((index << 1u) & 2u) * 2.0 - 1.0;
    let y = f32(index & 2u) * 2.0 - 1.0;
    return vec4<f32>(x, y, 0.0, 1.0);
}

@fragment
fn fs_overlay() -> @location(0) vec4<f32> {
    return vec4<f32>(0.0, 0.0, 0.0, globals.params.w);
}
"#;
