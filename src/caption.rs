use std::path::PathBuf;

use crate::{
    core::{Canvas, Rgb, TextExtent},
    error::{CumuloError, CumuloResult},
    font::FontBackend,
    surface::Surface,
};

/// Smallest caption font size the fit probe will return.
pub const BASELINE_FONT_SIZE: u32 = 10;

/// Optional caption block overlaid on the generated cloud: up to two text
/// lines (title, location), a font selection and fill color, plus the
/// canvas geometry the lines are centered in.
#[derive(Clone, Debug)]
pub struct Caption {
    lines: Vec<String>,
    font: PathBuf,
    color: Rgb,
    canvas: Canvas,
    padding: u32,
}

/// A single laid-out caption line: text, measured box and top-left origin.
#[derive(Clone, Debug)]
pub struct LinePlacement {
    pub text: String,
    pub size: TextExtent,
    pub origin: (f32, f32),
}

/// Result of the caption fit probe: one font size shared by all lines and
/// a placement per line.
#[derive(Clone, Debug)]
pub struct CaptionLayout {
    pub font_size: u32,
    pub placements: Vec<LinePlacement>,
}

impl Caption {
    /// Build a caption from optional title/location lines. Empty or missing
    /// lines are dropped; returns `None` when nothing remains.
    pub fn new(
        title: Option<&str>,
        location: Option<&str>,
        font: PathBuf,
        color: Rgb,
        canvas: Canvas,
        padding: u32,
    ) -> Option<Self> {
        let lines: Vec<String> = [title, location]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(Self {
            lines,
            font,
            color,
            canvas,
            padding,
        })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    /// Draw the laid-out caption lines onto `surface`.
    pub fn draw(
        &self,
        layout: &CaptionLayout,
        surface: &mut Surface,
        fonts: &mut dyn FontBackend,
    ) -> CumuloResult<()> {
        for placement in &layout.placements {
            fonts.draw(
                surface,
                &self.font,
                layout.font_size,
                &placement.text,
                placement.origin,
                self.color,
            )?;
        }
        Ok(())
    }
}

impl CaptionLayout {
    /// Compute the shared font size and per-line placements for `caption`.
    ///
    /// The size probe measures the joined caption text (lines separated by
    /// `\n`) at increasing integer sizes starting above
    /// [`BASELINE_FONT_SIZE`] and keeps the last size whose width fits in
    /// `canvas.width - 2 * padding`. If the first probe already overflows,
    /// the baseline is returned as-is; an oversized caption is a degenerate
    /// input, not an error.
    pub fn compute(caption: &Caption, fonts: &mut dyn FontBackend) -> CumuloResult<Self> {
        if caption.lines.is_empty() {
            return Err(CumuloError::configuration(
                "caption layout requires at least one non-empty line",
            ));
        }

        let joined = caption.lines.join("\n");
        let max_width = caption.canvas.width as f32 - (caption.padding as f32 * 2.0);

        let mut font_size = BASELINE_FONT_SIZE;
        loop {
            let probe = font_size + 1;
            let extent = fonts.measure(&caption.font, probe, &joined)?;
            if extent.width == 0.0 {
                // Nothing measurable (e.g. whitespace-only lines); the
                // probe would never terminate, so the baseline stands.
                break;
            }
            if extent.width > max_width {
                break;
            }
            font_size = probe;
        }

        let sizes: Vec<TextExtent> = caption
            .lines
            .iter()
            .map(|line| fonts.measure(&caption.font, font_size, line))
            .collect::<CumuloResult<_>>()?;
        let aggregate_height: f32 = sizes.iter().map(|s| s.height).sum();

        let mut placements = Vec::with_capacity(caption.lines.len());
        let mut y = (caption.canvas.height as f32 - aggregate_height) / 2.0;
        for (line, size) in caption.lines.iter().zip(sizes) {
            // The padding terms cancel algebraically; kept as written for
            // pixel parity with existing rendered output.
            let padding = caption.padding as f32;
            let x = (padding + (caption.canvas.width as f32 - size.width) / 2.0) - padding;

            placements.push(LinePlacement {
                text: line.clone(),
                size,
                origin: (x, y),
            });
            y += size.height;
        }

        Ok(Self {
            font_size,
            placements,
        })
    }

    /// Total measured height of all lines.
    pub fn aggregate_height(&self) -> f32 {
        self.placements.iter().map(|p| p.size.height).sum()
    }
}
