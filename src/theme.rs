use eframe::egui::Color32;

use crate::util::stable_hash;

const STEP_PALETTE: [Color32; 8] = [
    Color32::from_rgb(99, 153, 255),
    Color32::from_rgb(255, 160, 80),
    Color32::from_rgb(92, 200, 140),
    Color32::from_rgb(235, 100, 110),
    Color32::from_rgb(176, 132, 240),
    Color32::from_rgb(230, 200, 90),
    Color32::from_rgb(80, 200, 210),
    Color32::from_rgb(240, 130, 200),
];

const MODALITY_PALETTE: [(&str, Color32); 6] = [
    ("event-log", Color32::from_rgb(120, 180, 255)),
    ("ocel", Color32::from_rgb(255, 190, 110)),
    ("stream", Color32::from_rgb(130, 220, 160)),
    ("text", Color32::from_rgb(240, 140, 150)),
    ("image", Color32::from_rgb(200, 160, 250)),
    ("sensor", Color32::from_rgb(240, 220, 120)),
];

/// Design tokens for one graph surface. Owned by the surface rather than kept
/// as module state so independent surfaces never share mutable styling.
#[derive(Clone, Debug)]
pub struct Theme {
    pub step_palette: Vec<Color32>,
    pub modality_palette: Vec<(String, Color32)>,
    pub fallback_modality: Color32,
    pub background: Color32,
    pub label: Color32,
    pub selection: Color32,
    pub hover_glow: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            step_palette: STEP_PALETTE.to_vec(),
            modality_palette: MODALITY_PALETTE
                .iter()
                .map(|(name, color)| ((*name).to_owned(), *color))
                .collect(),
            fallback_modality: Color32::from_gray(170),
            background: Color32::from_rgb(19, 23, 29),
            label: Color32::from_gray(236),
            selection: Color32::from_rgb(245, 206, 93),
            hover_glow: Color32::from_rgb(255, 228, 150),
        }
    }
}

impl Theme {
    /// Deterministic color for a pipeline step id.
    pub fn step_color(&self, step_id: &str) -> Color32 {
        if self.step_palette.is_empty() {
            return Color32::GRAY;
        }
        let slot = (stable_hash(step_id) % self.step_palette.len() as u64) as usize;
        self.step_palette[slot]
    }

    pub fn modality_color(&self, modality: &str) -> Color32 {
        self.modality_palette
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(modality))
            .map(|(_, color)| *color)
            .unwrap_or(self.fallback_modality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_colors_are_stable_per_id() {
        let theme = Theme::default();
        assert_eq!(theme.step_color("discovery"), theme.step_color("discovery"));
        assert_eq!(
            Theme::default().step_color("conformance"),
            theme.step_color("conformance")
        );
    }

    #[test]
    fn unknown_modalities_use_fallback() {
        let theme = Theme::default();
        assert_eq!(theme.modality_color("hologram"), theme.fallback_modality);
        assert_ne!(theme.modality_color("OCEL"), theme.fallback_modality);
    }
}
