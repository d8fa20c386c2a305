//! Quad placement: fit the image into the surface without distorting it.

use crate::surface::types::{ImageDimensions, SurfaceSize};

/// One corner of the drawn quad
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Clip-space position in `[-1, 1]`, y up
    pub position: [f32; 2],
    /// Texture coordinate, `(0, 0)` at the image's top-left
    pub tex_coord: [f32; 2],
}

const fn vertex(x: f32, y: f32, u: f32, v: f32) -> Vertex {
    Vertex { position: [x, y], tex_coord: [u, v] }
}

/// Full-surface quad as two triangles, before scaling
pub const QUAD: [Vertex; 6] = [
    vertex(-1.0, -1.0, 0.0, 1.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(-1.0, 1.0, 0.0, 0.0),
    vertex(1.0, -1.0, 1.0, 1.0),
    vertex(1.0, 1.0, 1.0, 0.0),
];

/// Compute the `[x, y]` clip-space scale for the quad.
///
/// The axis along which the image is relatively narrower is shrunk so the
/// image keeps its aspect ratio, then both axes are multiplied by
/// `image_scale`. Degenerate sizes give a zero scale, which draws nothing.
pub fn quad_scale(surface: SurfaceSize, image: ImageDimensions, image_scale: f32) -> [f32; 2] {
    if surface.is_empty() || image.is_empty() {
        return [0.0, 0.0];
    }

    let screen_aspect = surface.aspect();
    let image_aspect = image.aspect();

    let mut scale = [1.0f32, 1.0f32];
    if image_aspect > screen_aspect {
        // Wider than the surface: fit to width
        scale[1] = screen_aspect / image_aspect;
    } else {
        scale[0] = image_aspect / screen_aspect;
    }

    [scale[0] * image_scale, scale[1] * image_scale]
}

/// The two triangles of the quad, scaled for this frame
pub fn placed_quad(scale: [f32; 2]) -> [Vertex; 6] {
    QUAD.map(|v| Vertex {
        position: [v.position[0] * scale[0], v.position[1] * scale[1]],
        tex_coord: v.tex_coord,
    })
}
