use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{
    core::{Rgb, TextExtent},
    error::{CumuloError, CumuloResult},
    surface::Surface,
};

/// Builtin font selection names, resolved to `<fonts_dir>/<name>.ttf`.
pub const FONT_NAMES: &[&str] = &[
    "arial",
    "arial-bold",
    "arial-black",
    "arial-narrow",
    "courier-new",
    "verdana",
];

/// Resolve a named font selection against the fonts directory.
///
/// `field` names the config field being validated so the error message
/// points at the offending setting.
pub fn resolve_font(fonts_dir: &Path, name: &str, field: &str) -> CumuloResult<PathBuf> {
    if !FONT_NAMES.contains(&name) {
        return Err(CumuloError::configuration(format!(
            "'{name}' is not a valid {field} value"
        )));
    }
    Ok(fonts_dir.join(format!("{name}.ttf")))
}

/// RGBA8 brush color used by Parley text layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Text measurement and drawing seam.
///
/// The generation pipeline only needs two operations from a font stack:
/// measuring a (possibly multi-line) text block at an integer pixel size,
/// and filling glyphs onto a [`Surface`]. Tests substitute a fixed-metrics
/// stub; production uses [`ParleyFontBackend`].
pub trait FontBackend {
    /// Measure `text` laid out at `size` px with the font at `font_path`.
    /// `\n` separates lines; the extent covers the whole block.
    fn measure(&mut self, font_path: &Path, size: u32, text: &str) -> CumuloResult<TextExtent>;

    /// Draw `text` at `origin` (top-left of the text block) in `color`.
    fn draw(
        &mut self,
        surface: &mut Surface,
        font_path: &Path,
        size: u32,
        text: &str,
        origin: (f32, f32),
        color: Rgb,
    ) -> CumuloResult<()>;
}

/// Production font backend: Parley shaping/layout + vello_cpu glyph fills.
pub struct ParleyFontBackend {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<BrushRgba8>,
    families: HashMap<PathBuf, String>,
    bytes: HashMap<PathBuf, Vec<u8>>,
    font_data: HashMap<PathBuf, vello_cpu::peniko::FontData>,
}

impl Default for ParleyFontBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ParleyFontBackend {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
            bytes: HashMap::new(),
            font_data: HashMap::new(),
        }
    }

    fn load_bytes(&mut self, path: &Path) -> CumuloResult<Vec<u8>> {
        if let Some(bytes) = self.bytes.get(path) {
            return Ok(bytes.clone());
        }
        let bytes = std::fs::read(path).map_err(|e| {
            CumuloError::configuration(format!("cannot load font {}: {e}", path.display()))
        })?;
        self.bytes.insert(path.to_path_buf(), bytes.clone());
        Ok(bytes)
    }

    fn family_for(&mut self, path: &Path) -> CumuloResult<String> {
        if let Some(name) = self.families.get(path) {
            return Ok(name.clone());
        }
        let bytes = self.load_bytes(path)?;
        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            CumuloError::configuration(format!(
                "no font families registered from {}",
                path.display()
            ))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CumuloError::configuration("registered font family has no name"))?
            .to_string();
        self.families.insert(path.to_path_buf(), name.clone());
        Ok(name)
    }

    fn font_data_for(&mut self, path: &Path) -> CumuloResult<vello_cpu::peniko::FontData> {
        if let Some(data) = self.font_data.get(path) {
            return Ok(data.clone());
        }
        let bytes = self.load_bytes(path)?;
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0);
        self.font_data.insert(path.to_path_buf(), data.clone());
        Ok(data)
    }

    fn layout_text(
        &mut self,
        font_path: &Path,
        size: u32,
        text: &str,
        brush: BrushRgba8,
    ) -> CumuloResult<parley::Layout<BrushRgba8>> {
        let family = self.family_for(font_path)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size as f32));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<BrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}

impl FontBackend for ParleyFontBackend {
    fn measure(&mut self, font_path: &Path, size: u32, text: &str) -> CumuloResult<TextExtent> {
        let layout = self.layout_text(font_path, size, text, BrushRgba8::default())?;
        let mut extent = TextExtent::default();
        for line in layout.lines() {
            let m = line.metrics();
            extent.width = extent.width.max(m.advance);
            extent.height += m.ascent + m.descent + m.leading;
        }
        Ok(extent)
    }

    fn draw(
        &mut self,
        surface: &mut Surface,
        font_path: &Path,
        size: u32,
        text: &str,
        origin: (f32, f32),
        color: Rgb,
    ) -> CumuloResult<()> {
        let brush = BrushRgba8 {
            r: color.r,
            g: color.g,
            b: color.b,
            a: 255,
        };
        let layout = self.layout_text(font_path, size, text, brush)?;
        let font = self.font_data_for(font_path)?;

        surface.record(|ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(origin.0),
                f64::from(origin.1),
            )));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };

                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));

                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(&font)
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_rejects_unknown_name() {
        let err = resolve_font(Path::new("fonts"), "not-a-font", "cloud_font").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not-a-font"));
        assert!(err.to_string().contains("cloud_font"));
    }

    #[test]
    fn resolve_builds_ttf_path() {
        let path = resolve_font(Path::new("fonts"), "arial-black", "cloud_font").unwrap();
        assert_eq!(path, Path::new("fonts").join("arial-black.ttf"));
    }

    #[test]
    fn missing_font_file_is_a_configuration_error() {
        let mut backend = ParleyFontBackend::new();
        let err = backend
            .measure(Path::new("/nonexistent/nothing.ttf"), 12, "hi")
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
