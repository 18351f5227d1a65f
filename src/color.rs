use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::analysis::SubsetKind;

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
            let hsl = Hsl::new(hue, 0.65, 0.50);
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
// Subset colours: one accent per tab
// ---------------------------------------------------------------------------

/// Accent colour per subset, used for tab counts and the histogram.
#[derive(Debug, Clone)]
pub struct SubsetColors {
    colors: Vec<Color32>,
}

impl Default for SubsetColors {
    fn default() -> Self {
        Self {
            colors: generate_palette(SubsetKind::ALL.len()),
        }
    }
}

impl SubsetColors {
    pub fn color_for(&self, kind: SubsetKind) -> Color32 {
        SubsetKind::ALL
            .iter()
            .position(|k| *k == kind)
            .and_then(|i| self.colors.get(i).copied())
            .unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let palette = generate_palette(5);
        assert_eq!(palette.len(), 5);
        for (i, a) in palette.iter().enumerate() {
            for b in &palette[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn every_subset_has_a_colour() {
        let colors = SubsetColors::default();
        for kind in SubsetKind::ALL {
            assert_ne!(colors.color_for(kind), Color32::GRAY);
        }
    }
}
