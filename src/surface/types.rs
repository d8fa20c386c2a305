use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// Output surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn as_vec2(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(640, 360)
    }
}

/// Source image size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn as_vec2(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl Default for ImageDimensions {
    /// Square placeholder used until an image has loaded
    fn default() -> Self {
        Self::new(512, 512)
    }
}

/// Linear RGB colour with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 3]);

impl Color {
    pub const WHITE: Color = Color([1.0, 1.0, 1.0]);

    /// Quantize to 8 bits, clamping out-of-range channels
    pub fn to_rgb8(self) -> [u8; 3] {
        self.0.map(quantize)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Clamp a shaded channel into `[0, 1]` and quantize it
#[inline]
pub fn quantize(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
}

/// One rendered output frame
///
/// A thin wrapper around an RGB image buffer with the pixel accessors the
/// software backend and the recorder need.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width(), self.height())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Fill the whole frame with one colour
    pub fn fill(&mut self, color: [u8; 3]) {
        for pixel in self.buffer.pixels_mut() {
            *pixel = Rgb(color);
        }
    }

    /// Raw interleaved RGB rows, for row-parallel rasterization
    pub fn rows_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(quantize(-0.3), 0);
        assert_eq!(quantize(1.7), 255);
        assert_eq!(quantize(0.5), 128);
        assert_eq!(Color([0.0, 1.0, 2.0]).to_rgb8(), [0, 255, 255]);
    }

    #[test]
    fn test_frame_fill() {
        let mut frame = Frame::new_filled(4, 3, [0, 0, 0]);
        frame.fill([255, 10, 20]);
        assert_eq!(frame.get_pixel(3, 2), [255, 10, 20]);
        assert_eq!(frame.rows_mut().len(), 4 * 3 * 3);
        assert_eq!(frame.size(), SurfaceSize::new(4, 3));
    }

    #[test]
    fn test_placeholder_image_is_square() {
        let dims = ImageDimensions::default();
        assert_eq!(dims.aspect(), 1.0);
    }
}
