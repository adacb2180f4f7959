use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category → Color32
// ---------------------------------------------------------------------------

/// Maps the values of a category domain to distinct colours.
///
/// Built from the full domain, never from what is currently displayed, so a
/// category keeps its colour across drill levels and filters.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for a domain. `neutral` (e.g. the "none" sentinel)
    /// is drawn grey instead of taking a hue.
    pub fn new(domain: &[String], neutral: Option<&str>) -> Self {
        let coloured: Vec<&String> = domain
            .iter()
            .filter(|v| Some(v.as_str()) != neutral)
            .collect();
        let palette = generate_palette(coloured.len());
        let mut mapping: BTreeMap<String, Color32> = coloured
            .into_iter()
            .zip(palette)
            .map(|(v, c)| (v.clone(), c))
            .collect();
        if let Some(n) = neutral {
            mapping.insert(n.to_string(), Color32::from_gray(150));
        }

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given category.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}
