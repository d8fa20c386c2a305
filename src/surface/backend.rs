//! Render backends: where the frame driver's clear and draw calls land.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::effect::program::{BoundUniforms, ShaderProgram};
use crate::effect::shader::{shade, Uniforms};
use crate::effect::vertex::Vertex;
use crate::error::RenderError;
use crate::surface::texture::Texture;
use crate::surface::types::{quantize, Color, Frame, SurfaceSize};

/// Largest surface edge the software backend will allocate
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// One draw of the textured quad
#[derive(Debug, Clone)]
pub struct DrawCall<'a> {
    pub program: &'a ShaderProgram,
    /// Two triangles, already placed by the vertex stage
    pub vertices: [Vertex; 6],
    pub uniforms: Uniforms,
    pub bound: BoundUniforms,
    pub texture: &'a Texture,
}

/// Target of the frame driver's clear and draw calls
pub trait RenderBackend {
    /// Current surface size
    fn size(&self) -> SurfaceSize;

    /// Resize the surface; later frames use the new size
    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError>;

    /// Fill the whole surface with `color`
    fn clear(&mut self, color: Color);

    /// Rasterize and shade one draw call
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), RenderError>;

    /// The most recently rendered frame, if this backend keeps pixels
    fn frame(&self) -> Option<&Frame> {
        None
    }
}

fn check_size(size: SurfaceSize) -> Result<(), RenderError> {
    if size.is_empty() {
        return Err(RenderError::InvalidSurface { width: size.width, height: size.height });
    }
    if size.width > MAX_SURFACE_DIMENSION || size.height > MAX_SURFACE_DIMENSION {
        return Err(RenderError::BackendUnavailable {
            reason: format!("surface {}x{} exceeds the {} pixel limit",
                            size.width, size.height, MAX_SURFACE_DIMENSION),
        });
    }
    Ok(())
}

/// Triangle in pixel space (y down) with its texture coordinates
#[derive(Debug, Clone, Copy)]
struct ScreenTriangle {
    p: [[f32; 2]; 3],
    t: [[f32; 2]; 3],
    inv_area: f32,
    min_x: u32,
    max_x: u32,
    min_y: u32,
    max_y: u32,
}

impl ScreenTriangle {
    fn new(vertices: &[Vertex], size: SurfaceSize) -> Option<Self> {
        let (w, h) = (size.width as f32, size.height as f32);
        let to_pixels = |v: &Vertex| [(v.position[0] + 1.0) * 0.5 * w, (1.0 - v.position[1]) * 0.5 * h];

        let p = [to_pixels(&vertices[0]), to_pixels(&vertices[1]), to_pixels(&vertices[2])];
        let area = edge(p[0], p[1], p[2]);
        if area.abs() < f32::EPSILON {
            return None;
        }

        let xs = [p[0][0], p[1][0], p[2][0]];
        let ys = [p[0][1], p[1][1], p[2][1]];
        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max).ceil().min(w) as u32;
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min).floor().max(0.0) as u32;
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max).ceil().min(h) as u32;

        Some(Self {
            p,
            t: [vertices[0].tex_coord, vertices[1].tex_coord, vertices[2].tex_coord],
            inv_area: 1.0 / area,
            min_x,
            max_x,
            min_y,
            max_y,
        })
    }

    /// Interpolated texture coordinate at a pixel centre, if covered
    fn tex_coord_at(&self, x: f32, y: f32) -> Option<[f32; 2]> {
        let q = [x, y];
        let w0 = edge(self.p[1], self.p[2], q) * self.inv_area;
        let w1 = edge(self.p[2], self.p[0], q) * self.inv_area;
        let w2 = edge(self.p[0], self.p[1], q) * self.inv_area;
        if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
            return None;
        }
        Some([
            w0 * self.t[0][0] + w1 * self.t[1][0] + w2 * self.t[2][0],
            w0 * self.t[0][1] + w1 * self.t[1][1] + w2 * self.t[2][1],
        ])
    }
}

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> f32 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// CPU rasterizer writing into an RGB frame buffer
///
/// Rows are shaded in parallel on a dedicated rayon pool; the shading stage is
/// a pure function so rows never depend on each other.
pub struct SoftwareBackend {
    frame: Frame,
    pool: rayon::ThreadPool,
}

impl SoftwareBackend {
    pub fn new(size: SurfaceSize, threads: usize) -> Result<Self, RenderError> {
        check_size(size).map_err(|e| match e {
            RenderError::InvalidSurface { width, height } => RenderError::BackendUnavailable {
                reason: format!("cannot create a {}x{} surface", width, height),
            },
            other => other,
        })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("vhs-raster-{}", i))
            .build()
            .map_err(|e| RenderError::BackendUnavailable { reason: e.to_string() })?;

        info!("Software backend ready: {}x{} on {} threads", size.width, size.height, threads.max(1));

        Ok(Self {
            frame: Frame::new_filled(size.width, size.height, [0, 0, 0]),
            pool,
        })
    }
}

impl RenderBackend for SoftwareBackend {
    fn size(&self) -> SurfaceSize {
        self.frame.size()
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        check_size(size)?;
        if size != self.frame.size() {
            debug!("Resizing software surface to {}x{}", size.width, size.height);
            self.frame = Frame::new_filled(size.width, size.height, [0, 0, 0]);
        }
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.frame.fill(color.to_rgb8());
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), RenderError> {
        let size = self.frame.size();
        let triangles: Vec<ScreenTriangle> = call
            .vertices
            .chunks(3)
            .filter_map(|tri| ScreenTriangle::new(tri, size))
            .collect();

        if triangles.is_empty() {
            return Ok(());
        }

        let row_len = size.width as usize * 3;
        let uniforms = &call.uniforms;
        let texture = call.texture;
        let rows = self.frame.rows_mut();

        self.pool.install(|| {
            rows.par_chunks_mut(row_len).enumerate().for_each(|(y, row)| {
                let y = y as u32;
                let py = y as f32 + 0.5;
                for tri in triangles.iter().filter(|t| y >= t.min_y && y < t.max_y) {
                    for x in tri.min_x..tri.max_x {
                        if let Some(uv) = tri.tex_coord_at(x as f32 + 0.5, py) {
                            let color = shade(uv, uniforms, texture);
                            let i = x as usize * 3;
                            row[i] = quantize(color[0]);
                            row[i + 1] = quantize(color[1]);
                            row[i + 2] = quantize(color[2]);
                        }
                    }
                }
            });
        });

        Ok(())
    }

    fn frame(&self) -> Option<&Frame> {
        Some(&self.frame)
    }
}

/// Backend that keeps no pixels and only counts calls
///
/// Used for `--headless` runs and for checking what the driver submits.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    size: SurfaceSize,
    pub clears: u64,
    pub draws: u64,
    pub last_clear: Option<Color>,
    pub last_uniforms: Option<Uniforms>,
    pub last_bound: Option<BoundUniforms>,
}

impl HeadlessBackend {
    pub fn new(size: SurfaceSize) -> Result<Self, RenderError> {
        check_size(size)?;
        Ok(Self {
            size,
            clears: 0,
            draws: 0,
            last_clear: None,
            last_uniforms: None,
            last_bound: None,
        })
    }
}

impl RenderBackend for HeadlessBackend {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) -> Result<(), RenderError> {
        check_size(size)?;
        self.size = size;
        Ok(())
    }

    fn clear(&mut self, color: Color) {
        self.clears += 1;
        self.last_clear = Some(color);
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<(), RenderError> {
        self.draws += 1;
        self.last_uniforms = Some(call.uniforms);
        self.last_bound = Some(call.bound.clone());
        Ok(())
    }
}
