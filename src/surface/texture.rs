use image::DynamicImage;

use crate::effect::shader::Sampler;
use crate::surface::types::{Color, ImageDimensions};

/// Decoded source image, ready for sampling
///
/// Texels are stored as RGB `f32` in `[0, 1]`. Sampling is bilinear with
/// clamp-to-edge addressing, so coordinates pushed outside `[0, 1]` by the
/// distortion passes repeat the border texels.
#[derive(Debug, Clone)]
pub struct Texture {
    dims: ImageDimensions,
    texels: Vec<[f32; 3]>,
}

impl Texture {
    /// Build a texture from a decoded image, flattening alpha over `background`
    pub fn from_image(image: &DynamicImage, background: Color) -> Self {
        let rgba = image.to_rgba32f();
        let dims = ImageDimensions::new(rgba.width(), rgba.height());
        let bg = background.0;

        let texels = rgba
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                [
                    r * a + bg[0] * (1.0 - a),
                    g * a + bg[1] * (1.0 - a),
                    b * a + bg[2] * (1.0 - a),
                ]
            })
            .collect();

        Self { dims, texels }
    }

    /// Build a texture by evaluating `f(x, y)` for every texel
    pub fn from_fn<F>(width: u32, height: u32, mut f: F) -> Self
    where
        F: FnMut(u32, u32) -> [f32; 3],
    {
        let mut texels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                texels.push(f(x, y));
            }
        }
        Self { dims: ImageDimensions::new(width, height), texels }
    }

    pub fn dimensions(&self) -> ImageDimensions {
        self.dims
    }

    fn texel(&self, x: i64, y: i64) -> [f32; 3] {
        let x = x.clamp(0, self.dims.width as i64 - 1) as usize;
        let y = y.clamp(0, self.dims.height as i64 - 1) as usize;
        self.texels[y * self.dims.width as usize + x]
    }
}

impl Sampler for Texture {
    fn sample(&self, u: f32, v: f32) -> [f32; 3] {
        if self.texels.is_empty() {
            return [0.0; 3];
        }

        // Texel centres sit at (i + 0.5) / size
        let x = u * self.dims.width as f32 - 0.5;
        let y = v * self.dims.height as f32 - 0.5;
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let a = self.texel(x0, y0);
        let b = self.texel(x0 + 1, y0);
        let c = self.texel(x0, y0 + 1);
        let d = self.texel(x0 + 1, y0 + 1);

        let mut out = [0.0; 3];
        for i in 0..3 {
            let top = a[i] + (b[i] - a[i]) * fx;
            let bottom = c[i] + (d[i] - c[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }
}
