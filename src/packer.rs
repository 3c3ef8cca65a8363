use std::path::Path;

use crate::{
    core::{Canvas, Rect, Rgb},
    error::{CumuloError, CumuloResult},
    font::FontBackend,
    freq::{FrequencyMap, Tokenize},
    surface::Surface,
    theme::ColorSampler,
};

/// Everything the packing engine needs for one generation call besides
/// the frequency map itself.
pub struct PackRequest<'a> {
    pub canvas: Canvas,
    pub background: Rgb,
    pub font_path: &'a Path,
    /// Ratio of words preferred horizontal over vertical. The bundled
    /// packer always places horizontally and only records the value.
    pub prefer_horizontal: f64,
    /// Exclusion bitmap: white pixels must stay free of words.
    pub mask: Option<&'a Path>,
    pub sampler: &'a mut ColorSampler,
}

/// Opaque word-cloud packing engine.
///
/// Consumes a merged frequency map plus canvas parameters and emits the
/// packed image file. The tokenizer half feeds the frequency merger.
pub trait PackingEngine: Tokenize {
    fn pack(
        &mut self,
        request: PackRequest<'_>,
        frequencies: &FrequencyMap,
        out_path: &Path,
        fonts: &mut dyn FontBackend,
    ) -> CumuloResult<()>;
}

/// Words longer clouds don't want. Subset of the classic English list.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "all", "am", "an", "and", "any", "are", "as", "at",
    "be", "because", "been", "before", "being", "below", "between", "both", "but", "by", "can",
    "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from", "further",
    "had", "has", "have", "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "s",
    "same", "she", "should", "so", "some", "such", "t", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under", "until",
    "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "you", "your",
];

const MAX_WORDS: usize = 64;
const MIN_WORD_SIZE: u32 = 8;
const WORD_GAP_PX: f64 = 2.0;
const SCAN_STEP_PX: u32 = 4;

/// Bundled row-scan packer.
///
/// Ranks words by weight, scales font size linearly with relative weight,
/// and walks the canvas top-to-bottom left-to-right for the first box that
/// overlaps neither the exclusion mask nor an earlier word. A word that
/// fits nowhere is retried at smaller sizes and eventually dropped.
#[derive(Default)]
pub struct SimplePacker;

impl SimplePacker {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenize for SimplePacker {
    fn process_text(&self, text: &str) -> FrequencyMap {
        let mut freqs = FrequencyMap::new();
        for token in text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
        {
            let word = token.trim_matches('\'').to_lowercase();
            if word.chars().count() < 2 || word.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if STOPWORDS.contains(&word.as_str()) {
                continue;
            }
            *freqs.entry(word).or_insert(0.0) += 1.0;
        }
        freqs
    }
}

impl PackingEngine for SimplePacker {
    fn pack(
        &mut self,
        request: PackRequest<'_>,
        frequencies: &FrequencyMap,
        out_path: &Path,
        fonts: &mut dyn FontBackend,
    ) -> CumuloResult<()> {
        if frequencies.is_empty() {
            return Err(CumuloError::input("cannot pack an empty frequency map"));
        }

        let canvas = request.canvas;
        let mut surface = Surface::new(canvas.width, canvas.height, request.background)?;
        let mut occupancy = Occupancy::new(canvas, request.mask)?;

        let mut ranked: Vec<(&String, f64)> = frequencies.iter().map(|(k, v)| (k, *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(MAX_WORDS);

        let max_weight = ranked.first().map(|(_, w)| *w).unwrap_or(1.0).max(1e-9);
        let max_size = (canvas.height / 4).max(MIN_WORD_SIZE + 1);

        for (word, weight) in ranked {
            let relative = (weight / max_weight).clamp(0.0, 1.0);
            let mut size =
                MIN_WORD_SIZE + (relative * (max_size - MIN_WORD_SIZE) as f64).round() as u32;

            while size >= MIN_WORD_SIZE {
                let extent = fonts.measure(request.font_path, size, word)?;
                let boxed = (
                    f64::from(extent.width) + WORD_GAP_PX,
                    f64::from(extent.height) + WORD_GAP_PX,
                );
                if let Some((x, y)) = occupancy.find_spot(boxed.0, boxed.1) {
                    occupancy.occupy(Rect::new(
                        f64::from(x),
                        f64::from(y),
                        f64::from(x) + boxed.0,
                        f64::from(y) + boxed.1,
                    ));
                    let color = request.sampler.sample();
                    fonts.draw(
                        &mut surface,
                        request.font_path,
                        size,
                        word,
                        (x as f32, y as f32),
                        color,
                    )?;
                    break;
                }
                size -= 2;
            }
            // Words that fit nowhere even at the minimum size are dropped.
        }

        surface.save_png(out_path)
    }
}

/// Per-pixel free/taken map seeded from the exclusion mask.
struct Occupancy {
    width: u32,
    height: u32,
    taken: Vec<bool>,
}

impl Occupancy {
    fn new(canvas: Canvas, mask: Option<&Path>) -> CumuloResult<Self> {
        let mut taken = vec![false; canvas.width as usize * canvas.height as usize];
        if let Some(path) = mask {
            let img = image::open(path)
                .map_err(|e| CumuloError::resource(format!("open mask {}: {e}", path.display())))?
                .to_luma8();
            if (img.width(), img.height()) != (canvas.width, canvas.height) {
                return Err(CumuloError::resource(
                    "mask dimensions do not match the canvas",
                ));
            }
            for (x, y, px) in img.enumerate_pixels() {
                if px.0[0] > 127 {
                    taken[(y * canvas.width + x) as usize] = true;
                }
            }
        }
        Ok(Self {
            width: canvas.width,
            height: canvas.height,
            taken,
        })
    }

    fn find_spot(&self, w: f64, h: f64) -> Option<(u32, u32)> {
        let w = w.ceil() as u32;
        let h = h.ceil() as u32;
        if w == 0 || h == 0 || w > self.width || h > self.height {
            return None;
        }
        let mut y = 0;
        while y + h <= self.height {
            let mut x = 0;
            while x + w <= self.width {
                if self.box_is_free(x, y, w, h) {
                    return Some((x, y));
                }
                x += SCAN_STEP_PX;
            }
            y += SCAN_STEP_PX;
        }
        None
    }

    fn box_is_free(&self, x0: u32, y0: u32, w: u32, h: u32) -> bool {
        for y in y0..y0 + h {
            let row = (y * self.width) as usize;
            for x in x0..x0 + w {
                if self.taken[row + x as usize] {
                    return false;
                }
            }
        }
        true
    }

    fn occupy(&mut self, rect: Rect) {
        let x0 = rect.x0.max(0.0) as u32;
        let y0 = rect.y0.max(0.0) as u32;
        let x1 = (rect.x1.ceil() as u32).min(self.width);
        let y1 = (rect.y1.ceil() as u32).min(self.height);
        for y in y0..y1 {
            let row = (y * self.width) as usize;
            for x in x0..x1 {
                self.taken[row + x as usize] = true;
            }
        }
    }
}
