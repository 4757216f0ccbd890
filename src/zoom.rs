//! Semantic zoom: maps the continuous view scale onto five detail levels and
//! eases the rendered style between them.

use crate::util::format_percent;

pub const DEFAULT_SCALE: f32 = 1.0;

const EASE_RATE_PER_SECOND: f32 = 8.0;
const SETTLE_EPSILON: f32 = 1e-3;
const HINT_FADE_SECONDS: f32 = 0.8;
const ABSTRACT_EDGE_WIDTH: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoomLevel {
    Abstract,
    Minimal,
    Normal,
    Detailed,
    Full,
}

/// What the per-node info card shows. Never interpolated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailCard {
    None,
    /// Name plus year and maturity.
    Compact,
    /// Compact content plus modality badges, step badge and evidence line.
    Full,
}

impl ZoomLevel {
    pub const ALL: [Self; 5] = [
        Self::Abstract,
        Self::Minimal,
        Self::Normal,
        Self::Detailed,
        Self::Full,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Abstract => "Abstract",
            Self::Minimal => "Minimal",
            Self::Normal => "Normal",
            Self::Detailed => "Detailed",
            Self::Full => "Full",
        }
    }

    pub fn detail_card(self) -> DetailCard {
        match self {
            Self::Abstract | Self::Minimal | Self::Normal => DetailCard::None,
            Self::Detailed => DetailCard::Compact,
            Self::Full => DetailCard::Full,
        }
    }

    pub fn style(self) -> LevelStyle {
        match self {
            Self::Abstract => LevelStyle {
                node_radius_scale: 0.6,
                modality_dot_opacity: 0.0,
                modality_dot_radius: 0.0,
                edge_opacity: 0.2,
                edge_width_scale: 1.0,
                edge_flatten: 1.0,
                cluster_opacity: 0.25,
                cluster_label_size: 22.0,
                label_opacity: 0.0,
            },
            Self::Minimal => LevelStyle {
                node_radius_scale: 0.8,
                modality_dot_opacity: 0.0,
                modality_dot_radius: 0.0,
                edge_opacity: 0.4,
                edge_width_scale: 1.0,
                edge_flatten: 0.0,
                cluster_opacity: 0.18,
                cluster_label_size: 18.0,
                label_opacity: 0.5,
            },
            Self::Normal => LevelStyle {
                node_radius_scale: 1.0,
                modality_dot_opacity: 0.8,
                modality_dot_radius: 4.0,
                edge_opacity: 0.6,
                edge_width_scale: 1.0,
                edge_flatten: 0.0,
                cluster_opacity: 0.12,
                cluster_label_size: 15.0,
                label_opacity: 1.0,
            },
            Self::Detailed => LevelStyle {
                node_radius_scale: 1.0,
                modality_dot_opacity: 0.8,
                modality_dot_radius: 5.0,
                edge_opacity: 0.6,
                edge_width_scale: 1.0,
                edge_flatten: 0.0,
                cluster_opacity: 0.08,
                cluster_label_size: 13.0,
                label_opacity: 1.0,
            },
            Self::Full => LevelStyle {
                node_radius_scale: 1.0,
                modality_dot_opacity: 0.8,
                modality_dot_radius: 6.0,
                edge_opacity: 0.6,
                edge_width_scale: 1.0,
                edge_flatten: 0.0,
                cluster_opacity: 0.06,
                cluster_label_size: 11.0,
                label_opacity: 1.0,
            },
        }
    }
}

/// Lower bounds of every level above `Abstract`. The Minimal/Normal cutover is
/// a tuning knob, not a contract.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ZoomThresholds {
    pub minimal: f32,
    pub normal: f32,
    pub detailed: f32,
    pub full: f32,
}

impl Default for ZoomThresholds {
    fn default() -> Self {
        Self {
            minimal: 0.45,
            normal: 0.7,
            detailed: 1.5,
            full: 2.2,
        }
    }
}

impl ZoomThresholds {
    pub fn level_for(&self, scale: f32) -> ZoomLevel {
        if scale >= self.full {
            ZoomLevel::Full
        } else if scale >= self.detailed {
            ZoomLevel::Detailed
        } else if scale >= self.normal {
            ZoomLevel::Normal
        } else if scale >= self.minimal {
            ZoomLevel::Minimal
        } else {
            ZoomLevel::Abstract
        }
    }
}

/// Continuous rendering factors for one zoom level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelStyle {
    pub node_radius_scale: f32,
    pub modality_dot_opacity: f32,
    pub modality_dot_radius: f32,
    pub edge_opacity: f32,
    pub edge_width_scale: f32,
    /// 0 keeps each edge's own width, 1 flattens every edge to one thin width.
    pub edge_flatten: f32,
    pub cluster_opacity: f32,
    pub cluster_label_size: f32,
    pub label_opacity: f32,
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    (from * (1.0 - t)) + (to * t)
}

impl LevelStyle {
    pub fn lerp(&self, target: &Self, t: f32) -> Self {
        Self {
            node_radius_scale: lerp(self.node_radius_scale, target.node_radius_scale, t),
            modality_dot_opacity: lerp(self.modality_dot_opacity, target.modality_dot_opacity, t),
            modality_dot_radius: lerp(self.modality_dot_radius, target.modality_dot_radius, t),
            edge_opacity: lerp(self.edge_opacity, target.edge_opacity, t),
            edge_width_scale: lerp(self.edge_width_scale, target.edge_width_scale, t),
            edge_flatten: lerp(self.edge_flatten, target.edge_flatten, t),
            cluster_opacity: lerp(self.cluster_opacity, target.cluster_opacity, t),
            cluster_label_size: lerp(self.cluster_label_size, target.cluster_label_size, t),
            label_opacity: lerp(self.label_opacity, target.label_opacity, t),
        }
    }

    fn max_difference(&self, other: &Self) -> f32 {
        [
            self.node_radius_scale - other.node_radius_scale,
            self.modality_dot_opacity - other.modality_dot_opacity,
            (self.modality_dot_radius - other.modality_dot_radius) * 0.1,
            self.edge_opacity - other.edge_opacity,
            self.edge_width_scale - other.edge_width_scale,
            self.edge_flatten - other.edge_flatten,
            self.cluster_opacity - other.cluster_opacity,
            (self.cluster_label_size - other.cluster_label_size) * 0.1,
            self.label_opacity - other.label_opacity,
        ]
        .into_iter()
        .map(f32::abs)
        .fold(0.0, f32::max)
    }

    pub fn edge_width(&self, base_width: f32) -> f32 {
        lerp(
            base_width * self.edge_width_scale,
            ABSTRACT_EDGE_WIDTH,
            self.edge_flatten,
        )
    }

    pub fn modality_dots_visible(&self) -> bool {
        self.modality_dot_opacity > 0.01 && self.modality_dot_radius > 0.1
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum HintState {
    Visible,
    Fading { remaining: f32 },
    Gone,
}

#[derive(Clone, Debug)]
pub struct SemanticZoom {
    thresholds: ZoomThresholds,
    scale: f32,
    level: ZoomLevel,
    displayed: LevelStyle,
    hint: HintState,
}

impl Default for SemanticZoom {
    fn default() -> Self {
        Self::new(ZoomThresholds::default())
    }
}

impl SemanticZoom {
    pub fn new(thresholds: ZoomThresholds) -> Self {
        let level = thresholds.level_for(DEFAULT_SCALE);
        Self {
            thresholds,
            scale: DEFAULT_SCALE,
            level,
            displayed: level.style(),
            hint: HintState::Visible,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn level(&self) -> ZoomLevel {
        self.level
    }

    /// Style currently on screen, which trails the level's target style while
    /// a transition is in progress.
    pub fn style(&self) -> &LevelStyle {
        &self.displayed
    }

    pub fn detail_card(&self) -> DetailCard {
        self.level.detail_card()
    }

    /// Records a new view scale. Returns whether the level changed. Any scale
    /// other than the default counts as the first zoom action and starts the
    /// hint fading.
    pub fn set_scale(&mut self, scale: f32) -> bool {
        self.scale = scale;
        if self.hint == HintState::Visible && (scale - DEFAULT_SCALE).abs() > f32::EPSILON {
            self.hint = HintState::Fading {
                remaining: HINT_FADE_SECONDS,
            };
        }

        let level = self.thresholds.level_for(scale);
        let changed = level != self.level;
        self.level = level;
        changed
    }

    /// Eases the displayed style toward the current level. Returns whether
    /// anything is still animating.
    pub fn update(&mut self, dt: f32) -> bool {
        let target = self.level.style();
        let t = 1.0 - (-EASE_RATE_PER_SECOND * dt.max(0.0)).exp();
        self.displayed = self.displayed.lerp(&target, t);
        let settled = self.displayed.max_difference(&target) < SETTLE_EPSILON;
        if settled {
            self.displayed = target;
        }

        if let HintState::Fading { remaining } = self.hint {
            let remaining = remaining - dt.max(0.0);
            self.hint = if remaining <= 0.0 {
                HintState::Gone
            } else {
                HintState::Fading { remaining }
            };
        }

        !settled || matches!(self.hint, HintState::Fading { .. })
    }

    pub fn hint_opacity(&self) -> f32 {
        match self.hint {
            HintState::Visible => 1.0,
            HintState::Fading { remaining } => (remaining / HINT_FADE_SECONDS).clamp(0.0, 1.0),
            HintState::Gone => 0.0,
        }
    }

    pub fn indicator_text(&self) -> String {
        format!("{} · {}", self.level.label(), format_percent(self.scale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_split_scale_into_ordered_bands() {
        let thresholds = ZoomThresholds::default();
        assert_eq!(thresholds.level_for(0.1), ZoomLevel::Abstract);
        assert_eq!(thresholds.level_for(0.45), ZoomLevel::Minimal);
        assert_eq!(thresholds.level_for(0.69), ZoomLevel::Minimal);
        assert_eq!(thresholds.level_for(0.7), ZoomLevel::Normal);
        assert_eq!(thresholds.level_for(1.49), ZoomLevel::Normal);
        assert_eq!(thresholds.level_for(1.5), ZoomLevel::Detailed);
        assert_eq!(thresholds.level_for(2.2), ZoomLevel::Full);
        assert_eq!(thresholds.level_for(4.0), ZoomLevel::Full);
    }

    #[test]
    fn node_radius_never_shrinks_when_zooming_in() {
        let radii = ZoomLevel::ALL.map(|level| level.style().node_radius_scale);
        assert!(radii.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(radii, [0.6, 0.8, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn detail_cards_only_from_detailed_up() {
        for level in ZoomLevel::ALL {
            let card = level.detail_card();
            if level < ZoomLevel::Detailed {
                assert_eq!(card, DetailCard::None);
            } else {
                assert_ne!(card, DetailCard::None);
            }
        }
        assert_eq!(ZoomLevel::Full.detail_card(), DetailCard::Full);
    }

    #[test]
    fn clusters_matter_more_when_zoomed_out() {
        let opacities = ZoomLevel::ALL.map(|level| level.style().cluster_opacity);
        assert!(opacities.windows(2).all(|pair| pair[0] >= pair[1]));
        let sizes = ZoomLevel::ALL.map(|level| level.style().cluster_label_size);
        assert!(sizes.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    fn modality_dots_hidden_below_normal() {
        assert!(!ZoomLevel::Abstract.style().modality_dots_visible());
        assert!(!ZoomLevel::Minimal.style().modality_dots_visible());
        let radii = [ZoomLevel::Normal, ZoomLevel::Detailed, ZoomLevel::Full]
            .map(|level| level.style().modality_dot_radius);
        assert_eq!(radii, [4.0, 5.0, 6.0]);
    }

    #[test]
    fn abstract_flattens_edges() {
        let style = ZoomLevel::Abstract.style();
        assert_eq!(style.edge_width(2.0), style.edge_width(1.0));
        let normal = ZoomLevel::Normal.style();
        assert_eq!(normal.edge_width(2.0), 2.0);
    }

    #[test]
    fn transitions_ease_instead_of_jumping() {
        let mut zoom = SemanticZoom::default();
        assert!(zoom.set_scale(0.3));
        assert_eq!(zoom.level(), ZoomLevel::Abstract);
        assert_eq!(zoom.style().node_radius_scale, 1.0);

        zoom.update(1.0 / 60.0);
        let midway = zoom.style().node_radius_scale;
        assert!(midway < 1.0 && midway > 0.6);

        for _ in 0..240 {
            zoom.update(1.0 / 60.0);
        }
        assert_eq!(*zoom.style(), ZoomLevel::Abstract.style());
    }

    #[test]
    fn hint_fades_once_and_never_returns() {
        let mut zoom = SemanticZoom::default();
        assert_eq!(zoom.hint_opacity(), 1.0);
        zoom.set_scale(1.0);
        assert_eq!(zoom.hint_opacity(), 1.0);

        zoom.set_scale(1.3);
        zoom.update(0.4);
        assert!(zoom.hint_opacity() < 1.0);
        zoom.update(1.0);
        assert_eq!(zoom.hint_opacity(), 0.0);

        zoom.set_scale(1.0);
        zoom.update(0.1);
        assert_eq!(zoom.hint_opacity(), 0.0);
    }

    #[test]
    fn indicator_names_level_and_percent() {
        let mut zoom = SemanticZoom::default();
        assert_eq!(zoom.indicator_text(), "Normal · 100%");
        zoom.set_scale(2.5);
        assert_eq!(zoom.indicator_text(), "Full · 250%");
    }
}
