use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::{
    caption::CaptionLayout,
    core::{Canvas, Rect, Rgb},
    error::CumuloResult,
    surface::Surface,
};

/// Extra pixels added past the trailing edge of each caption line's box
/// when carving its exclusion rectangle.
pub const PLACEHOLDER_MARGIN_PX: f64 = 5.0;

/// Owned handle to a generated mask file.
///
/// Dropping the handle removes the file on every exit path of the
/// generation call; a failed removal is logged and otherwise ignored.
#[derive(Debug)]
pub struct MaskFile {
    path: PathBuf,
}

impl MaskFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MaskFile {
    fn drop(&mut self) {
        if self.path.exists()
            && let Err(err) = std::fs::remove_file(&self.path)
        {
            tracing::warn!(path = %self.path.display(), %err, "unable to remove mask file");
        }
    }
}

/// Rasterize the exclusion mask for a caption layout.
///
/// `None` layout means no caption was requested, which yields no mask.
/// Otherwise the mask is a black canvas with one white rectangle per
/// caption line, expanded by [`PLACEHOLDER_MARGIN_PX`] on the trailing
/// edge of each axis, persisted as a uniquely named PNG under `tmp_dir`.
pub fn build_mask(
    layout: Option<&CaptionLayout>,
    canvas: Canvas,
    tmp_dir: &Path,
) -> CumuloResult<Option<MaskFile>> {
    let Some(layout) = layout else {
        return Ok(None);
    };

    let mut surface = Surface::new(canvas.width, canvas.height, Rgb::BLACK)?;
    for placement in &layout.placements {
        surface.fill_rect(placeholder_box(placement), Rgb::WHITE);
    }

    let path = tmp_dir.join(unique_mask_name());
    surface.save_png(&path)?;

    Ok(Some(MaskFile { path }))
}

/// Exclusion rectangle for one placed caption line.
pub fn placeholder_box(placement: &crate::caption::LinePlacement) -> Rect {
    let (x, y) = placement.origin;
    Rect::new(
        f64::from(x),
        f64::from(y),
        f64::from(x) + f64::from(placement.size.width) + PLACEHOLDER_MARGIN_PX,
        f64::from(y) + f64::from(placement.size.height) + PLACEHOLDER_MARGIN_PX,
    )
}

fn unique_mask_name() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let suffix: u32 = rand::thread_rng().gen_range(0..=1000);
    format!("{timestamp}.{suffix}.png")
}
