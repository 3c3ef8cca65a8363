use std::path::Path;

use crate::{
    core::{Rect, Rgb},
    error::{CumuloError, CumuloResult},
};

/// CPU raster surface backed by a premultiplied RGBA8 pixmap.
///
/// Drawing goes through short-lived `vello_cpu::RenderContext` recordings
/// that composite over the existing pixel content, so fills and glyph runs
/// can be layered incrementally.
pub struct Surface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl Surface {
    /// Allocate a surface cleared to `fill`.
    pub fn new(width: u32, height: u32, fill: Rgb) -> CumuloResult<Self> {
        let (w, h) = surface_dims(width, height)?;
        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        clear_pixmap(&mut pixmap, [fill.r, fill.g, fill.b, 255]);
        Ok(Self {
            width: w,
            height: h,
            pixmap,
        })
    }

    /// Load a previously saved image back into a surface.
    pub fn open(path: &Path) -> CumuloResult<Self> {
        let img = image::open(path)
            .map_err(|e| CumuloError::resource(format!("open {}: {e}", path.display())))?
            .to_rgba8();
        let (w, h) = surface_dims(img.width(), img.height())?;

        let mut may_have_opacities = false;
        let mut pixels = Vec::with_capacity(img.width() as usize * img.height() as usize);
        for px in img.as_raw().chunks_exact(4) {
            let premul = premul_rgba8(px[0], px[1], px[2], px[3]);
            may_have_opacities |= premul[3] != 255;
            pixels.push(vello_cpu::peniko::color::PremulRgba8 {
                r: premul[0],
                g: premul[1],
                b: premul[2],
                a: premul[3],
            });
        }

        Ok(Self {
            width: w,
            height: h,
            pixmap: vello_cpu::Pixmap::from_parts_with_opacity(pixels, w, h, may_have_opacities),
        })
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Fill an axis-aligned rectangle with an opaque color.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.record(|ctx| {
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                color.r, color.g, color.b, 255,
            ));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                rect.x0, rect.y0, rect.x1, rect.y1,
            ));
        });
    }

    /// Record draw ops onto a fresh render context and composite them
    /// over the current pixel content.
    pub(crate) fn record(&mut self, ops: impl FnOnce(&mut vello_cpu::RenderContext)) {
        let mut ctx = vello_cpu::RenderContext::new(self.width, self.height);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ops(&mut ctx);
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
    }

    /// Straight-alpha RGBA8 copy of the surface.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = self.pixmap.data_as_u8_slice().to_vec();
        unpremultiply_in_place(&mut data);
        data
    }

    /// Encode the surface as PNG at `path`.
    pub fn save_png(&self, path: &Path) -> CumuloResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba8(),
            self.width(),
            self.height(),
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|e| CumuloError::resource(format!("save {}: {e}", path.display())))
    }
}

fn surface_dims(width: u32, height: u32) -> CumuloResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CumuloError::configuration("surface width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CumuloError::configuration("surface height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(CumuloError::configuration("surface dimensions must be > 0"));
    }
    Ok((w, h))
}

fn clear_pixmap(pixmap: &mut vello_cpu::Pixmap, rgba: [u8; 4]) {
    let data = pixmap.data_as_u8_slice_mut();
    for px in data.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

fn premul_rgba8(r: u8, g: u8, b: u8, a: u8) -> [u8; 4] {
    let af = (a as u16) + 1;
    let premul = |c: u8| -> u8 { (((c as u16) * af) >> 8) as u8 };
    [premul(r), premul(g), premul(b), a]
}

fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 || a == 255 {
            continue;
        }
        for c in px.iter_mut().take(3) {
            *c = ((*c as u16 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}
