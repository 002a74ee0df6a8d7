/// WGSL shader code for the demosaic pipelines
///
/// Two fragment pipelines share one full-screen-triangle vertex stage:
///
/// - PLANE: the high-quality reconstruction. What was historically a
///   multi-pass fixed-function pipeline (extract four half-resolution
///   color planes, bilinearly upsample each with a sub-texel bias, blend
///   the two greens, composite RGB with per-channel write masks) collapses
///   here into a single programmable stage expressing the same
///   offset-sample / interpolate / blend / sum algebra. No intermediate
///   plane textures are materialized.
/// - DIRECT: a quick-preview decode that samples the raw mosaic plus a
///   repeating 2x2 color-selection mask and applies brightness, contrast
///   and grayscale.

/// Full-screen triangle vertex stage, shared by both pipelines.
const FULLSCREEN_VERTEX: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var output: VertexOutput;

    // Single triangle covering the entire viewport, no vertex buffers.
    let x = f32(i32(vertex_index & 1u) * 4 - 1);
    let y = f32(i32(vertex_index >> 1u) * 4 - 1);

    output.clip_position = vec4<f32>(x, -y, 0.0, 1.0);
    output.tex_coords = vec2<f32>((x + 1.0) * 0.5, (y + 1.0) * 0.5);

    return output;
}
"#;

/// Plane-reconstruction fragment stage.
///
/// For every output pixel, each of the four GRBG planes is sampled by
/// manual bilinear interpolation over its strided half-resolution grid.
/// Sample positions carry the plane's phase offset within the 2x2 tile
/// plus a fixed sub-texel bias of 3/8 texel, empirically chosen to center
/// each half-resolution sample over its true sensor position. The two
/// green estimates blend with equal weights; quality degrades gracefully
/// (blur) away from sample positions.
const PLANE_FRAGMENT: &str = r#"
@group(0) @binding(0)
var mosaic: texture_2d<u32>;

// Phase offsets of the GRBG tile. Must match mosaic::Channel::phase.
const OFFSET_GREEN1: vec2<i32> = vec2<i32>(0, 0);
const OFFSET_RED: vec2<i32> = vec2<i32>(1, 0);
const OFFSET_BLUE: vec2<i32> = vec2<i32>(0, 1);
const OFFSET_GREEN2: vec2<i32> = vec2<i32>(1, 1);

// Sub-texel bias of the upsampling lattice, in plane texels.
const SUBTEXEL_BIAS: f32 = 0.375;

// Equal-weight blend of the two green planes, fixed by the physical
// sampling density (green occupies half of all mosaic samples).
const GREEN_BLEND: f32 = 0.5;

// One sample of the half-resolution plane with the given phase offset,
// clamped to the plane's bounds (edge-clamp addressing).
fn fetch_plane(phase: vec2<i32>, cell: vec2<i32>) -> f32 {
    let half = vec2<i32>(textureDimensions(mosaic)) / 2;
    let c = clamp(cell, vec2<i32>(0, 0), half - 1);
    return f32(textureLoad(mosaic, c * 2 + phase, 0).r) / 255.0;
}

// Bilinear reconstruction of one color plane at output pixel px.
fn plane_sample(phase: vec2<i32>, px: vec2<f32>) -> f32 {
    let q = (px - vec2<f32>(phase)) * 0.5 + (SUBTEXEL_BIAS - 0.5);
    let base = floor(q);
    let f = q - base;
    let i0 = vec2<i32>(base);
    let s00 = fetch_plane(phase, i0);
    let s10 = fetch_plane(phase, i0 + vec2<i32>(1, 0));
    let s01 = fetch_plane(phase, i0 + vec2<i32>(0, 1));
    let s11 = fetch_plane(phase, i0 + vec2<i32>(1, 1));
    return mix(mix(s00, s10, f.x), mix(s01, s11, f.x), f.y);
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let px = floor(input.clip_position.xy);

    let r = plane_sample(OFFSET_RED, px);
    let g1 = plane_sample(OFFSET_GREEN1, px);
    let g2 = plane_sample(OFFSET_GREEN2, px);
    let b = plane_sample(OFFSET_BLUE, px);

    let g = mix(g1, g2, GREEN_BLEND);
    return vec4<f32>(r, g, b, 1.0);
}
"#;

/// Direct-decode fragment stage (quick preview).
///
/// Gathers the four samples of the pixel's 2x2 tile and routes them into
/// channels through the repeating color-selection mask texture; the mask
/// alpha channel tags the second green. Applies
/// `output = color * contrast + brightness`, then optionally collapses to
/// the green estimate for grayscale.
const DIRECT_FRAGMENT: &str = r#"
struct PostParams {
    brightness: f32,
    contrast: f32,
    grayscale: u32,
    _pad: u32,
}

@group(0) @binding(0)
var mosaic: texture_2d<u32>;

@group(0) @binding(1)
var tile_mask: texture_2d<f32>;

@group(0) @binding(2)
var<uniform> params: PostParams;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let dims = vec2<i32>(textureDimensions(mosaic));
    let p = vec2<i32>(floor(input.clip_position.xy));
    let base = p - (p % vec2<i32>(2, 2));

    var rgb = vec3<f32>(0.0, 0.0, 0.0);
    var green2 = 0.0;
    for (var j: i32 = 0; j < 2; j = j + 1) {
        for (var i: i32 = 0; i < 2; i = i + 1) {
            let t = vec2<i32>(i, j);
            let c = clamp(base + t, vec2<i32>(0, 0), dims - 1);
            let s = f32(textureLoad(mosaic, c, 0).r) / 255.0;
            let m = textureLoad(tile_mask, t, 0);
            rgb = rgb + s * m.rgb;
            green2 = green2 + s * m.a;
        }
    }
    rgb.g = (rgb.g + green2) * 0.5;

    var color = rgb * params.contrast + vec3<f32>(params.brightness);
    if (params.grayscale != 0u) {
        color = vec3<f32>(color.g);
    }
    return vec4<f32>(clamp(color, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0);
}
"#;

/// Texel data of the 2x2 RGBA color-selection mask, row-major from the
/// tile origin: G1 R / B G2. The alpha channel tags the second green so
/// the shader can blend both greens with equal weight.
pub(crate) const MASK_TEXELS: [u8; 16] = [
    0, 255, 0, 0, // (0,0) green 1
    255, 0, 0, 0, // (1,0) red
    0, 0, 255, 0, // (0,1) blue
    0, 0, 0, 255, // (1,1) green 2
];

/// Complete WGSL source for the plane-reconstruction pipeline.
pub fn plane_shader() -> String {
    format!("{FULLSCREEN_VERTEX}\n{PLANE_FRAGMENT}")
}

/// Complete WGSL source for the direct-decode pipeline.
pub fn direct_shader() -> String {
    format!("{FULLSCREEN_VERTEX}\n{DIRECT_FRAGMENT}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mosaic::{Channel, MosaicFrame};

    // Rust mirrors of the WGSL algebra above, kept in lockstep with the
    // shader constants so the reconstruction properties can be checked
    // without a GPU device.

    const SUBTEXEL_BIAS: f32 = 0.375;
    const GREEN_BLEND: f32 = 0.5;

    fn fetch_plane(frame: &MosaicFrame, phase: (u32, u32), cx: i32, cy: i32) -> f32 {
        let half_w = (frame.width() / 2) as i32;
        let half_h = (frame.height() / 2) as i32;
        let cx = cx.clamp(0, half_w - 1);
        let cy = cy.clamp(0, half_h - 1);
        let x = 2 * cx as u32 + phase.0;
        let y = 2 * cy as u32 + phase.1;
        frame.sample(x, y) as f32 / 255.0
    }

    fn plane_sample(frame: &MosaicFrame, channel: Channel, px: f32, py: f32) -> f32 {
        let (ox, oy) = channel.phase();
        let qx = (px - ox as f32) * 0.5 + (SUBTEXEL_BIAS - 0.5);
        let qy = (py - oy as f32) * 0.5 + (SUBTEXEL_BIAS - 0.5);
        let (bx, by) = (qx.floor(), qy.floor());
        let (fx, fy) = (qx - bx, qy - by);
        let (ix, iy) = (bx as i32, by as i32);
        let phase = (ox, oy);
        let s00 = fetch_plane(frame, phase, ix, iy);
        let s10 = fetch_plane(frame, phase, ix + 1, iy);
        let s01 = fetch_plane(frame, phase, ix, iy + 1);
        let s11 = fetch_plane(frame, phase, ix + 1, iy + 1);
        let top = s00 + (s10 - s00) * fx;
        let bottom = s01 + (s11 - s01) * fx;
        top + (bottom - top) * fy
    }

    fn reconstruct(frame: &MosaicFrame, x: u32, y: u32) -> [f32; 3] {
        let (px, py) = (x as f32, y as f32);
        let r = plane_sample(frame, Channel::Red, px, py);
        let g1 = plane_sample(frame, Channel::Green1, px, py);
        let g2 = plane_sample(frame, Channel::Green2, px, py);
        let b = plane_sample(frame, Channel::Blue, px, py);
        [r, g1 + (g2 - g1) * GREEN_BLEND, b]
    }

    fn direct_decode(frame: &MosaicFrame, x: u32, y: u32) -> [f32; 3] {
        let (bx, by) = (x & !1, y & !1);
        let mut rgb = [0.0f32; 3];
        let mut green2 = 0.0f32;
        for j in 0..2u32 {
            for i in 0..2u32 {
                let s = frame.sample(bx + i, by + j) as f32 / 255.0;
                let m = &MASK_TEXELS[((j * 2 + i) * 4) as usize..][..4];
                for c in 0..3 {
                    rgb[c] += s * m[c] as f32 / 255.0;
                }
                green2 += s * m[3] as f32 / 255.0;
            }
        }
        rgb[1] = (rgb[1] + green2) * 0.5;
        rgb
    }

    fn mosaic_with_channel_values(w: u32, h: u32, values: impl Fn(Channel) -> u8) -> MosaicFrame {
        let data: Vec<u8> = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .map(|(x, y)| values(Channel::at(x, y)))
            .collect();
        MosaicFrame::new(w, h, data).unwrap()
    }

    #[test]
    fn mask_texels_select_each_tile_position_once() {
        for j in 0..2u32 {
            for i in 0..2u32 {
                let texel = &MASK_TEXELS[((j * 2 + i) * 4) as usize..][..4];
                assert_eq!(texel.iter().filter(|&&v| v == 255).count(), 1);
                let hot = texel.iter().position(|&v| v == 255).unwrap();
                let expected = match Channel::at(i, j) {
                    Channel::Red => 0,
                    Channel::Green1 => 1,
                    Channel::Blue => 2,
                    Channel::Green2 => 3,
                };
                assert_eq!(hot, expected);
            }
        }
    }

    #[test]
    fn green_blend_is_equal_weight() {
        for (g1, g2) in [(0u8, 255u8), (255, 0), (100, 101), (37, 201), (255, 255)] {
            let frame = mosaic_with_channel_values(8, 8, |ch| match ch {
                Channel::Green1 => g1,
                Channel::Green2 => g2,
                _ => 0,
            });
            // Interior pixel; constant planes make the bilinear exact.
            let [_, g, _] = reconstruct(&frame, 4, 4);
            let got = (g * 255.0).round();
            let want = (0.5 * (g1 as f32 + g2 as f32)).round();
            assert!(
                (got - want).abs() <= 1.0,
                "g1={g1} g2={g2}: got {got}, want {want}"
            );
        }
    }

    #[test]
    fn plane_path_uniform_round_trip() {
        let (w, h) = (16u32, 12u32);
        let color = [50u8, 100, 150];
        let rgb: Vec<u8> = color
            .iter()
            .copied()
            .cycle()
            .take((w * h * 3) as usize)
            .collect();
        let frame = MosaicFrame::from_rgb(&rgb, w, h).unwrap();

        // Uniform planes interpolate to the uniform value everywhere, so
        // not even the border is off by more than rounding.
        for y in 0..h {
            for x in 0..w {
                let out = reconstruct(&frame, x, y);
                for c in 0..3 {
                    let got = (out[c] * 255.0).round();
                    assert!(
                        (got - color[c] as f32).abs() <= 1.0,
                        "pixel ({x},{y}) channel {c}: got {got}"
                    );
                }
            }
        }
    }

    #[test]
    fn direct_path_uniform_round_trip() {
        let (w, h) = (8u32, 8u32);
        let color = [200u8, 60, 10];
        let rgb: Vec<u8> = color
            .iter()
            .copied()
            .cycle()
            .take((w * h * 3) as usize)
            .collect();
        let frame = MosaicFrame::from_rgb(&rgb, w, h).unwrap();

        for y in 0..h {
            for x in 0..w {
                let out = direct_decode(&frame, x, y);
                for c in 0..3 {
                    let got = (out[c] * 255.0).round();
                    assert!(
                        (got - color[c] as f32).abs() <= 1.0,
                        "pixel ({x},{y}) channel {c}: got {got}"
                    );
                }
            }
        }
    }

    #[test]
    fn shader_sources_contain_entry_points() {
        for src in [plane_shader(), direct_shader()] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
        }
    }
}
