use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::PanelId;

// ---------------------------------------------------------------------------
// Chart palette
// ---------------------------------------------------------------------------

/// Fixed overlay trace palette: red, blue, green, orange, purple, pink,
/// teal, olive. The first two are reserved as the comparison slot colors.
pub const CHART_COLORS: [Color32; 8] = [
    Color32::from_rgb(0xcc, 0x00, 0x00),
    Color32::from_rgb(0x00, 0x66, 0xcc),
    Color32::from_rgb(0x00, 0xcc, 0x66),
    Color32::from_rgb(0xcc, 0x66, 0x00),
    Color32::from_rgb(0x66, 0x00, 0xcc),
    Color32::from_rgb(0xcc, 0x00, 0x66),
    Color32::from_rgb(0x00, 0x66, 0x66),
    Color32::from_rgb(0x66, 0x66, 0x00),
];

/// Trace color for the `index_in_panel`-th file of a panel. The first file
/// of each comparison slot gets its fixed color (A red, B blue); further
/// files cycle the rest of the chart palette, then fall back to generated
/// hues so large selections stay distinguishable.
pub fn assign_color(panel: PanelId, index_in_panel: usize) -> Color32 {
    if index_in_panel == 0 {
        return match panel {
            PanelId::DatasetA => CHART_COLORS[0],
            PanelId::DatasetB => CHART_COLORS[1],
        };
    }

    let cycled = 1 + index_in_panel; // skip both reserved slot colors
    if cycled < CHART_COLORS.len() {
        CHART_COLORS[cycled]
    } else {
        generated_hue(cycled - CHART_COLORS.len())
    }
}

/// Golden-angle spaced hue, for overlays past the fixed palette.
fn generated_hue(i: usize) -> Color32 {
    let hue = (i as f32 * 137.508) % 360.0;
    let hsl = Hsl::new(hue, 0.7, 0.45);
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

// ---------------------------------------------------------------------------
// Noisiness severity colors
// ---------------------------------------------------------------------------

/// Severity color for a band-relative noisiness score (1–10):
/// green through orange to red.
pub fn noisiness_color(score: f64) -> Color32 {
    if score <= 2.0 {
        Color32::from_rgb(0x2e, 0xcc, 0x71)
    } else if score <= 4.0 {
        Color32::from_rgb(0x27, 0xae, 0x60)
    } else if score <= 6.0 {
        Color32::from_rgb(0xf3, 0x9c, 0x12)
    } else if score <= 8.0 {
        Color32::from_rgb(0xe6, 0x7e, 0x22)
    } else {
        Color32::from_rgb(0xe7, 0x4c, 0x3c)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
