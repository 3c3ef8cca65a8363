use std::collections::BTreeMap;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    core::Rgb,
    error::{CumuloError, CumuloResult},
};

/// Named color bundle: cloud background, reserved caption text color, and
/// the palette cloud words are sampled from. Palettes keep their duplicate
/// entries; duplication is how the original tables weight common colors.
#[derive(Clone, Debug)]
pub struct Theme {
    pub name: &'static str,
    pub background: Rgb,
    pub text_color: Rgb,
    palette: Vec<Rgb>,
    /// Copies of `text_color` appended to the sampling palette when no
    /// caption is present, so the reserved color still shows up in the
    /// cloud instead of going unused.
    extra_text_copies: usize,
}

impl Theme {
    /// Build the word-color sampler for one generation call.
    pub fn sampler(&self, seed: u64, has_caption: bool) -> ColorSampler {
        let mut colors = self.palette.clone();
        if !has_caption {
            colors.extend(std::iter::repeat_n(self.text_color, self.extra_text_copies));
        }
        ColorSampler {
            colors,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    fn palette_len(&self) -> usize {
        self.palette.len()
    }
}

/// Stateless-looking uniform pick over a fixed candidate list, driven by
/// an explicit seeded PRNG so runs are reproducible.
pub struct ColorSampler {
    colors: Vec<Rgb>,
    rng: StdRng,
}

impl ColorSampler {
    pub fn sample(&mut self) -> Rgb {
        let index = self.rng.gen_range(0..self.colors.len());
        self.colors[index]
    }

    pub fn candidates(&self) -> &[Rgb] {
        &self.colors
    }
}

/// Lookup table of the builtin themes.
pub struct ThemeRegistry {
    themes: BTreeMap<&'static str, Theme>,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeRegistry {
    pub fn new() -> Self {
        let mut themes = BTreeMap::new();
        for theme in builtin_themes() {
            themes.insert(theme.name, theme);
        }
        Self { themes }
    }

    pub fn lookup(&self, name: &str) -> CumuloResult<&Theme> {
        self.themes.get(name).ok_or_else(|| {
            CumuloError::configuration(format!("'{name}' is not a valid theme value"))
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.themes.keys().copied()
    }
}

fn builtin_themes() -> Vec<Theme> {
    let rgb = Rgb::new;
    vec![
        Theme {
            name: "default",
            background: rgb(255, 255, 255),
            text_color: rgb(107, 178, 255),
            palette: vec![
                rgb(255, 0, 60),
                rgb(255, 0, 60),
                rgb(255, 0, 60),
                rgb(136, 193, 0),
                rgb(136, 193, 0),
                rgb(136, 193, 0),
                rgb(253, 138, 0),
                rgb(253, 138, 0),
                rgb(253, 138, 0),
                rgb(250, 190, 40),
                rgb(250, 190, 40),
                rgb(1, 193, 188),
                rgb(1, 193, 188),
                rgb(172, 99, 200),
                rgb(172, 99, 200),
            ],
            extra_text_copies: 3,
        },
        Theme {
            name: "autumn",
            background: rgb(62, 28, 0),
            text_color: rgb(255, 255, 255),
            palette: vec![
                rgb(210, 193, 152),
                rgb(210, 193, 152),
                rgb(210, 193, 152),
                rgb(217, 92, 53),
                rgb(217, 92, 53),
                rgb(217, 92, 53),
                rgb(134, 90, 55),
                rgb(134, 90, 55),
                rgb(134, 90, 55),
                rgb(101, 101, 75),
                rgb(101, 101, 75),
                rgb(134, 137, 138),
                rgb(134, 137, 138),
                rgb(85, 73, 75),
            ],
            extra_text_copies: 0,
        },
        Theme {
            name: "dusk",
            background: rgb(23, 34, 59),
            text_color: rgb(255, 103, 104),
            palette: vec![
                rgb(0, 125, 141),
                rgb(0, 172, 144),
                rgb(103, 88, 126),
                rgb(149, 116, 158),
                rgb(185, 193, 226),
                rgb(130, 215, 126),
                rgb(249, 248, 113),
            ],
            extra_text_copies: 3,
        },
        Theme {
            name: "neon",
            background: rgb(0, 0, 0),
            text_color: rgb(252, 37, 113),
            palette: vec![
                rgb(255, 149, 28),
                rgb(105, 217, 238),
                rgb(166, 226, 39),
                rgb(164, 128, 252),
            ],
            extra_text_copies: 1,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_knows_all_builtin_themes() {
        let registry = ThemeRegistry::new();
        for name in ["default", "autumn", "dusk", "neon"] {
            assert!(registry.lookup(name).is_ok(), "missing theme {name}");
        }
    }

    #[test]
    fn unknown_theme_is_a_configuration_error() {
        let registry = ThemeRegistry::new();
        let err = registry.lookup("not-a-theme").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("not-a-theme"));
    }

    #[test]
    fn sampler_is_deterministic_for_a_seed() {
        let registry = ThemeRegistry::new();
        let theme = registry.lookup("dusk").unwrap();
        let mut a = theme.sampler(42, true);
        let mut b = theme.sampler(42, true);
        for _ in 0..32 {
            assert_eq!(a.sample(), b.sample());
        }
    }

    #[test]
    fn sampler_only_emits_palette_colors() {
        let registry = ThemeRegistry::new();
        let theme = registry.lookup("neon").unwrap();
        let mut sampler = theme.sampler(7, true);
        for _ in 0..64 {
            let c = sampler.sample();
            assert!(sampler_candidates_contain(&sampler, c));
        }
    }

    fn sampler_candidates_contain(sampler: &ColorSampler, c: Rgb) -> bool {
        sampler.candidates().contains(&c)
    }

    #[test]
    fn missing_caption_extends_palette_with_text_color() {
        let registry = ThemeRegistry::new();

        let default = registry.lookup("default").unwrap();
        let with = default.sampler(0, true);
        let without = default.sampler(0, false);
        assert_eq!(with.candidates().len(), default.palette_len());
        assert_eq!(without.candidates().len(), default.palette_len() + 3);
        assert_eq!(
            without.candidates().iter().filter(|c| **c == default.text_color).count(),
            3
        );

        let neon = registry.lookup("neon").unwrap();
        assert_eq!(
            neon.sampler(0, false).candidates().len(),
            neon.palette_len() + 1
        );
    }

    #[test]
    fn autumn_never_extends_its_palette() {
        let registry = ThemeRegistry::new();
        let autumn = registry.lookup("autumn").unwrap();
        assert_eq!(
            autumn.sampler(0, false).candidates().len(),
            autumn.palette_len()
        );
    }
}
