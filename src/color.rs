use std::collections::{BTreeMap, BTreeSet};

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

/// Sequential scale for the choropleth: `t` in `[0, 1]` maps light → dark
/// blue.  Out-of-range input is clamped.
pub fn sequential_color(t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(215.0, 0.65, 0.88 - 0.58 * t);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Fill used for provinces with no contributing data.
pub const NO_DATA_FILL: Color32 = Color32::from_gray(160);

// ---------------------------------------------------------------------------
// Color mapping: technology → Color32
// ---------------------------------------------------------------------------

/// Maps each technology to a stable, distinct colour for the trend chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map over the dataset's technology values.
    pub fn new(technologies: &BTreeSet<String>) -> Self {
        let palette = generate_palette(technologies.len());
        let mapping: BTreeMap<String, Color32> = technologies
            .iter()
            .zip(palette)
            .map(|(t, c)| (t.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a technology.
    pub fn color_for(&self, technology: &str) -> Color32 {
        self.mapping
            .get(technology)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_entries() {
        let palette = generate_palette(4);
        assert_eq!(palette.len(), 4);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn sequential_scale_darkens_with_t() {
        let low = sequential_color(0.0);
        let high = sequential_color(1.0);
        assert!(low.r() as u16 + low.g() as u16 + low.b() as u16
            > high.r() as u16 + high.g() as u16 + high.b() as u16);
        // Clamped, not wrapped.
        assert_eq!(sequential_color(2.0), sequential_color(1.0));
    }

    #[test]
    fn unknown_technology_falls_back_to_default() {
        let techs: BTreeSet<String> = ["Cloud".to_string()].into_iter().collect();
        let map = ColorMap::new(&techs);
        assert_eq!(map.color_for("Telepathy"), Color32::GRAY);
        assert_ne!(map.color_for("Cloud"), Color32::GRAY);
    }
}
