//! Cumulo generates word-cloud images with an optional overlaid caption
//! (a title and a location line) that cloud words are guaranteed not to
//! obscure.
//!
//! # Pipeline overview
//!
//! 1. **Caption layout**: probe for the largest font size whose caption
//!    block fits the canvas, then center the lines ([`CaptionLayout`]).
//! 2. **Mask**: rasterize the caption boxes into a black/white exclusion
//!    bitmap the packer must keep free ([`build_mask`]).
//! 3. **Merge**: blend user-weighted phrases with description-derived
//!    frequencies so phrases always dominate ([`merge_frequencies`]).
//! 4. **Pack**: hand canvas, mask, sampler and frequencies to the packing
//!    engine ([`PackingEngine`]), which writes the cloud image.
//! 5. **Overlay**: draw the caption over the packed image.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic-by-default**: color sampling runs off an explicit
//!   seed carried in [`GeneratorConfig`].
//! - **No leftover state**: the temp mask file is removed on every exit
//!   path of a generation call, and a failed call never leaves a partial
//!   output file behind.
//!
//! Everything is synchronous and single-threaded; a [`CloudGenerator`]
//! owns its caption, mask and sampler per call.
#![forbid(unsafe_code)]

pub mod caption;
pub mod core;
pub mod error;
pub mod font;
pub mod freq;
pub mod generator;
pub mod mask;
pub mod packer;
pub mod surface;
pub mod theme;

pub use caption::{BASELINE_FONT_SIZE, Caption, CaptionLayout, LinePlacement};
pub use self::core::{Canvas, Rect, Rgb, TextExtent};
pub use error::{CumuloError, CumuloResult};
pub use font::{BrushRgba8, FONT_NAMES, FontBackend, ParleyFontBackend, resolve_font};
pub use freq::{FrequencyMap, Tokenize, merge_frequencies};
pub use generator::{CloudGenerator, GenerateRequest, GeneratorConfig};
pub use mask::{MaskFile, PLACEHOLDER_MARGIN_PX, build_mask};
pub use packer::{PackRequest, PackingEngine, STOPWORDS, SimplePacker};
pub use surface::Surface;
pub use theme::{ColorSampler, Theme, ThemeRegistry};
