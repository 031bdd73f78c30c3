use crate::coords::{Vec2, Viewport};
use crate::lens::MirrorTransform;

/// Row-major 4×4.
type Mat4 = [[f32; 4]; 4];

const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [[0.0; 4]; 4];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = (0..4).map(|k| a[r][k] * b[k][c]).sum();
        }
    }
    out
}

/// Geometry is planar; input depth is dropped.
const FLATTEN_Z: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn translate(x: f32, y: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[0][3] = x;
    m[1][3] = y;
    m
}

/// CSS px (top-left origin, +Y down) to clip space. Depth is flattened to 0.
fn css_to_clip(viewport: Viewport) -> Mat4 {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    [
        [2.0 / w, 0.0, 0.0, -1.0],
        [0.0, -2.0 / h, 0.0, 1.0],
        [0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]
}

/// Clip-space matrix of a tilt mirror, column-major for a WGSL `mat4x4<f32>`.
///
/// Equivalent to `transform-origin: pivot; transform: perspective(p)
/// rotateX(rx) rotateY(ry)` applied to geometry given in CSS px.
pub fn mirror_clip_matrix(t: &MirrorTransform, viewport: Viewport) -> [[f32; 4]; 4] {
    let (sx, cx) = t.rotate_x.to_radians().sin_cos();
    let (sy, cy) = t.rotate_y.to_radians().sin_cos();

    let rot_x: Mat4 = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, cx, -sx, 0.0],
        [0.0, sx, cx, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let rot_y: Mat4 = [
        [cy, 0.0, sy, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [-sy, 0.0, cy, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    let mut persp = IDENTITY;
    if t.perspective > 0.0 {
        persp[3][2] = -1.0 / t.perspective;
    }

    let m = [
        css_to_clip(viewport),
        translate(t.pivot.x, t.pivot.y),
        persp,
        rot_x,
        rot_y,
        translate(-t.pivot.x, -t.pivot.y),
        FLATTEN_Z,
    ]
    .iter()
    .fold(IDENTITY, |acc, m| mul(&acc, m));

    transpose(&m)
}

/// Orthographic clip matrix for flat blits, column-major.
pub fn flat_clip_matrix(viewport: Viewport) -> [[f32; 4]; 4] {
    transpose(&css_to_clip(viewport))
}

fn transpose(m: &Mat4) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (r, row) in m.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            out[c][r] = *v;
        }
    }
    out
}

/// Applies a column-major matrix to a CSS point and divides by w.
pub fn project(m: &[[f32; 4]; 4], p: Vec2) -> (Vec2, f32) {
    let x = m[0][0] * p.x + m[1][0] * p.y + m[3][0];
    let y = m[0][1] * p.x + m[1][1] * p.y + m[3][1];
    let w = m[0][3] * p.x + m[1][3] * p.y + m[3][3];
    (Vec2::new(x / w, y / w), w)
}
