use crate::error::{CumuloError, CumuloResult};

pub use kurbo::Rect;

/// Opaque RGB color used for backgrounds, caption text and palette entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self { r, g, b }
    }
}

/// Target raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> CumuloResult<Self> {
        if width == 0 || height == 0 {
            return Err(CumuloError::configuration(
                "canvas width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }
}

/// Measured width/height of a laid-out text block, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtent {
    pub width: f32,
    pub height: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_zero_dimensions() {
        assert!(Canvas::new(0, 250).is_err());
        assert!(Canvas::new(250, 0).is_err());
        assert!(Canvas::new(250, 250).is_ok());
    }

    #[test]
    fn rgb_from_tuple() {
        assert_eq!(Rgb::from((1, 2, 3)), Rgb::new(1, 2, 3));
    }
}
