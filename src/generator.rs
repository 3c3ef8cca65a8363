use std::path::{Path, PathBuf};

use crate::{
    caption::{Caption, CaptionLayout},
    core::Canvas,
    error::{CumuloError, CumuloResult},
    font::{FontBackend, ParleyFontBackend, resolve_font},
    freq::{FrequencyMap, Tokenize, merge_frequencies},
    mask::{MaskFile, build_mask},
    packer::{PackRequest, PackingEngine, SimplePacker},
    surface::Surface,
    theme::{Theme, ThemeRegistry},
};

/// Constructor configuration for [`CloudGenerator`].
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub theme: String,
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub cloud_font: String,
    pub text_font: String,
    pub prefer_horizontal: f64,
    pub title_text: Option<String>,
    pub location_text: Option<String>,
    pub tmp_storage: PathBuf,
    pub fonts_dir: PathBuf,
    /// Seed for the theme color sampler; fixed so repeated runs over the
    /// same inputs produce identical images.
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            width: 250,
            height: 250,
            padding: 0,
            cloud_font: "arial-black".to_string(),
            text_font: "arial-bold".to_string(),
            prefer_horizontal: 0.9,
            title_text: None,
            location_text: None,
            tmp_storage: PathBuf::from("./"),
            fonts_dir: PathBuf::from("fonts"),
            seed: 0,
        }
    }
}

/// Per-call inputs: weighted phrases and/or a free-text description.
#[derive(Clone, Debug, Default)]
pub struct GenerateRequest {
    pub phrases: FrequencyMap,
    pub description: String,
}

/// Orchestrates one word-cloud generation: theme → caption layout →
/// exclusion mask → frequency merge → packing engine → caption overlay.
pub struct CloudGenerator {
    canvas: Canvas,
    theme: Theme,
    cloud_font: PathBuf,
    prefer_horizontal: f64,
    tmp_storage: PathBuf,
    seed: u64,
    caption: Option<Caption>,
    fonts: Box<dyn FontBackend>,
    packer: Box<dyn PackingEngine>,
}

impl std::fmt::Debug for CloudGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudGenerator")
            .field("canvas", &self.canvas)
            .field("theme", &self.theme.name)
            .field("cloud_font", &self.cloud_font)
            .field("has_caption", &self.caption.is_some())
            .finish()
    }
}

impl CloudGenerator {
    /// Build a generator with the production font backend and the bundled
    /// packer. Theme and font selections are validated here; a bad name
    /// never survives construction.
    pub fn new(config: GeneratorConfig) -> CumuloResult<Self> {
        Self::with_parts(
            config,
            Box::new(ParleyFontBackend::new()),
            Box::new(SimplePacker::new()),
        )
    }

    /// Like [`CloudGenerator::new`] but with injected collaborators.
    pub fn with_parts(
        config: GeneratorConfig,
        fonts: Box<dyn FontBackend>,
        packer: Box<dyn PackingEngine>,
    ) -> CumuloResult<Self> {
        let canvas = Canvas::new(config.width, config.height)?;

        let registry = ThemeRegistry::new();
        let theme = registry.lookup(&config.theme)?.clone();

        let cloud_font = resolve_font(&config.fonts_dir, &config.cloud_font, "cloud_font")?;
        let text_font = resolve_font(&config.fonts_dir, &config.text_font, "text_font")?;

        let caption = Caption::new(
            config.title_text.as_deref(),
            config.location_text.as_deref(),
            text_font,
            theme.text_color,
            canvas,
            config.padding,
        );

        Ok(Self {
            canvas,
            theme,
            cloud_font,
            prefer_horizontal: config.prefer_horizontal,
            tmp_storage: config.tmp_storage,
            seed: config.seed,
            caption,
            fonts,
            packer,
        })
    }

    pub fn has_caption(&self) -> bool {
        self.caption.is_some()
    }

    /// Generate the word-cloud image at `out_path`.
    ///
    /// Either `phrases` or `description` must be non-empty. On failure the
    /// filesystem is left as it was: the temp mask is removed on every
    /// exit path, and `out_path` keeps whatever content it had before the
    /// call. Rendering goes to a staging file that only replaces
    /// `out_path` once the image is complete.
    #[tracing::instrument(skip_all, fields(out = %out_path.display()))]
    pub fn generate(&mut self, out_path: &Path, request: &GenerateRequest) -> CumuloResult<()> {
        if request.phrases.is_empty() && request.description.is_empty() {
            return Err(CumuloError::input("please provide phrases or a description"));
        }

        let layout = self
            .caption
            .as_ref()
            .map(|c| CaptionLayout::compute(c, self.fonts.as_mut()))
            .transpose()?;
        let mask = build_mask(layout.as_ref(), self.canvas, &self.tmp_storage)?;

        let tokenizer: &dyn Tokenize = self.packer.as_ref();
        let merged = merge_frequencies(&request.phrases, &request.description, tokenizer)?;

        // Staged next to the destination so the final rename never
        // crosses a filesystem boundary.
        let staging = staging_path(out_path);
        let result = self.render(&staging, &merged, layout.as_ref(), mask.as_ref());
        match result {
            Ok(()) => std::fs::rename(&staging, out_path).map_err(|e| {
                let _ = std::fs::remove_file(&staging);
                CumuloError::resource(format!("move output into {}: {e}", out_path.display()))
            }),
            Err(err) => {
                // No partial results: drop whatever this call managed to
                // write; the destination was never touched.
                let _ = std::fs::remove_file(&staging);
                Err(err)
            }
        }
        // `mask` drops here, removing the temp file on success and error alike.
    }

    fn render(
        &mut self,
        out_path: &Path,
        frequencies: &FrequencyMap,
        layout: Option<&CaptionLayout>,
        mask: Option<&MaskFile>,
    ) -> CumuloResult<()> {
        let mut sampler = self.theme.sampler(self.seed, self.caption.is_some());

        self.packer.pack(
            PackRequest {
                canvas: self.canvas,
                background: self.theme.background,
                font_path: &self.cloud_font,
                prefer_horizontal: self.prefer_horizontal,
                mask: mask.map(|m| m.path()),
                sampler: &mut sampler,
            },
            frequencies,
            out_path,
            self.fonts.as_mut(),
        )?;

        if let (Some(caption), Some(layout)) = (&self.caption, layout) {
            let mut surface = Surface::open(out_path)?;
            caption.draw(layout, &mut surface, self.fonts.as_mut())?;
            surface.save_png(out_path)?;
        }

        Ok(())
    }
}

/// Sibling of `out` with a randomized `.part` suffix.
fn staging_path(out: &Path) -> PathBuf {
    use rand::Rng as _;

    let name = out
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let tag: u16 = rand::thread_rng().gen_range(0..=1000);
    out.with_file_name(format!("{name}.{tag}.part"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_mirrors_the_classic_settings() {
        let config = GeneratorConfig::default();
        assert_eq!(config.theme, "default");
        assert_eq!((config.width, config.height), (250, 250));
        assert_eq!(config.cloud_font, "arial-black");
        assert_eq!(config.text_font, "arial-bold");
        assert_eq!(config.prefer_horizontal, 0.9);
    }

    #[test]
    fn unknown_theme_fails_at_construction() {
        let config = GeneratorConfig {
            theme: "not-a-theme".to_string(),
            ..GeneratorConfig::default()
        };
        let err = CloudGenerator::new(config).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn unknown_fonts_fail_at_construction() {
        let bad_cloud = GeneratorConfig {
            cloud_font: "not-a-font".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(CloudGenerator::new(bad_cloud).unwrap_err().is_configuration());

        let bad_text = GeneratorConfig {
            text_font: "comic-sans".to_string(),
            ..GeneratorConfig::default()
        };
        assert!(CloudGenerator::new(bad_text).unwrap_err().is_configuration());
    }

    #[test]
    fn caption_exists_only_with_text() {
        let without = CloudGenerator::new(GeneratorConfig::default()).unwrap();
        assert!(!without.has_caption());

        let with = CloudGenerator::new(GeneratorConfig {
            title_text: Some("Engineer".to_string()),
            ..GeneratorConfig::default()
        })
        .unwrap();
        assert!(with.has_caption());
    }

    #[test]
    fn empty_request_is_an_input_error() {
        let mut generator = CloudGenerator::new(GeneratorConfig::default()).unwrap();
        let err = generator
            .generate(Path::new("unused.png"), &GenerateRequest::default())
            .unwrap_err();
        assert!(err.is_input());
    }

    #[test]
    fn config_json_round_trip() {
        let config = GeneratorConfig {
            theme: "neon".to_string(),
            width: 500,
            title_text: Some("Rust Engineer".to_string()),
            ..GeneratorConfig::default()
        };
        let s = serde_json::to_string_pretty(&config).unwrap();
        let de: GeneratorConfig = serde_json::from_str(&s).unwrap();
        assert_eq!(de.theme, "neon");
        assert_eq!(de.width, 500);
        assert_eq!(de.title_text.as_deref(), Some("Rust Engineer"));
        assert_eq!(de.height, 250);
    }

    #[test]
    fn staging_path_stays_in_the_output_directory() {
        let staging = staging_path(Path::new("/renders/cloud.png"));
        assert_eq!(staging.parent(), Some(Path::new("/renders")));
        let name = staging.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("cloud.png."));
        assert!(name.ends_with(".part"));
    }
}
