use std::sync::Arc;

use crate::{
    assets::decode::Bitmap,
    foundation::{
        error::{StorysheetError, StorysheetResult},
        geometry::{CanvasSize, Placement, Rect},
    },
};

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::opaque(0xff, 0xff, 0xff);
    /// Opaque black.
    pub const BLACK: Self = Self::opaque(0x00, 0x00, 0x00);
    /// Light gray sheet background (`#f3f4f6`).
    pub const LIGHT_GRAY: Self = Self::opaque(0xf3, 0xf4, 0xf6);

    /// Opaque color from components.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb` form, used in SVG attributes.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Finished pixels of a surface: premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Premultiplied RGBA8 bytes.
    pub data: Vec<u8>,
}

impl Raster {
    /// Pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }
}

/// A drawing surface owned by exactly one compositor run.
///
/// Draw calls accumulate in order; nothing is shared between surfaces.
pub struct Surface {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Allocate a transparent surface. Fails if either side is zero or exceeds `u16`.
    pub fn new(size: CanvasSize) -> StorysheetResult<Self> {
        let width: u16 = size.width.try_into().map_err(|_| {
            StorysheetError::encoding(format!("surface width {} exceeds u16", size.width))
        })?;
        let height: u16 = size.height.try_into().map_err(|_| {
            StorysheetError::encoding(format!("surface height {} exceeds u16", size.height))
        })?;
        if width == 0 || height == 0 {
            return Err(StorysheetError::encoding("surface has zero width or height"));
        }
        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
        })
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Fill the whole surface.
    pub fn fill(&mut self, color: Rgba8) {
        let all = Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height));
        self.fill_rect(all, color);
    }

    /// Fill `rect` with a solid color.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            color.r, color.g, color.b, color.a,
        ));
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    /// Draw `bitmap` scaled into `placement.dest`.
    pub fn draw_bitmap(&mut self, bitmap: &Bitmap, placement: &Placement) -> StorysheetResult<()> {
        let placed = PlacedBitmap::new(bitmap, placement)?;
        self.draw_placed(&placed);
        Ok(())
    }

    /// Draw `bitmap` scaled into `placement.dest`, discarding anything outside `clip`.
    pub fn draw_bitmap_clipped(
        &mut self,
        bitmap: &Bitmap,
        placement: &Placement,
        clip: Rect,
    ) -> StorysheetResult<()> {
        let placed = PlacedBitmap::new(bitmap, placement)?;

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let mut clip_path = vello_cpu::kurbo::BezPath::new();
        clip_path.move_to((clip.x0, clip.y0));
        clip_path.line_to((clip.x1, clip.y0));
        clip_path.line_to((clip.x1, clip.y1));
        clip_path.line_to((clip.x0, clip.y1));
        clip_path.close_path();
        self.ctx.push_clip_layer(&clip_path);

        self.draw_placed(&placed);

        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.pop_layer();
        Ok(())
    }

    /// Draw a bitmap that was already converted with [`PlacedBitmap::new`].
    pub fn draw_placed(&mut self, placed: &PlacedBitmap) {
        let placement = &placed.placement;
        let transform = vello_cpu::kurbo::Affine::translate((placement.dest.x0, placement.dest.y0))
            * vello_cpu::kurbo::Affine::scale_non_uniform(placement.scale_x, placement.scale_y);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(transform);
        self.ctx.set_paint(placed.paint.clone());
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(placed.width),
            f64::from(placed.height),
        ));
    }

    /// Rasterize everything drawn so far.
    pub fn finish(mut self) -> Raster {
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut pixmap);
        Raster {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: pixmap.data_as_u8_slice().to_vec(),
        }
    }
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

/// A bitmap converted to a paint and bound to where it lands.
///
/// Converting first lets a compositor find out whether an item can be drawn before it touches
/// the canvas.
#[derive(Clone, Debug)]
pub struct PlacedBitmap {
    paint: vello_cpu::Image,
    width: u32,
    height: u32,
    placement: Placement,
}

impl PlacedBitmap {
    /// Convert `bitmap` for drawing at `placement`.
    ///
    /// Paint sources are limited to `u16` sides, so a larger bitmap is first downscaled toward
    /// its on-canvas size and the placement scale adjusted to match.
    pub fn new(bitmap: &Bitmap, placement: &Placement) -> StorysheetResult<Self> {
        let max = u32::from(u16::MAX);
        if bitmap.width <= max && bitmap.height <= max {
            let pixmap = premul_bytes_to_pixmap(
                bitmap.rgba8_premul.as_slice(),
                bitmap.width,
                bitmap.height,
            )?;
            return Ok(Self::from_pixmap(pixmap, bitmap.width, bitmap.height, *placement));
        }

        let width = downscaled_side(bitmap.width, placement.dest.width());
        let height = downscaled_side(bitmap.height, placement.dest.height());
        let source = image::RgbaImage::from_raw(
            bitmap.width,
            bitmap.height,
            bitmap.rgba8_premul.as_slice().to_vec(),
        )
        .ok_or_else(|| StorysheetError::encoding("image byte length mismatch"))?;
        // Resized bytes stay premultiplied.
        let resized =
            image::imageops::resize(&source, width, height, image::imageops::FilterType::Triangle);
        tracing::debug!(
            from_width = bitmap.width,
            from_height = bitmap.height,
            width,
            height,
            "downscaled oversized bitmap"
        );

        let pixmap = premul_bytes_to_pixmap(resized.as_raw(), width, height)?;
        let placement = Placement {
            scale_x: placement.dest.width() / f64::from(width),
            scale_y: placement.dest.height() / f64::from(height),
            dest: placement.dest,
        };
        Ok(Self::from_pixmap(pixmap, width, height, placement))
    }

    fn from_pixmap(
        pixmap: vello_cpu::Pixmap,
        width: u32,
        height: u32,
        placement: Placement,
    ) -> Self {
        Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            width,
            height,
            placement,
        }
    }

    /// Source width after any downscaling.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Source height after any downscaling.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Never upscales, never exceeds `u16`, never collapses to zero.
fn downscaled_side(source: u32, dest: f64) -> u32 {
    let on_canvas = dest.abs().ceil().min(f64::from(u16::MAX)) as u32;
    source.min(on_canvas).clamp(1, u32::from(u16::MAX))
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> StorysheetResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| StorysheetError::encoding("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| StorysheetError::encoding("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(StorysheetError::encoding("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
