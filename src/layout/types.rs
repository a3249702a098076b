use serde::Serialize;

use crate::config::LayoutConfig;
use crate::gradient::Gradient;
use crate::ir::{ColorOverride, DisplayMode, Layer, MatchRule, ScoreEntry, SortMode};
use crate::scene::Document;
use crate::theme::Theme;

/// Inputs of one export that are not part of the layer's header data.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub display: DisplayMode,
    pub sort: SortMode,
    pub scores: Vec<ScoreEntry>,
    pub color_overrides: Vec<ColorOverride>,
    pub visible_subtechniques: Vec<MatchRule>,
    pub excluded: Vec<MatchRule>,
}

impl ExportRequest {
    pub fn from_layer(layer: &Layer) -> Self {
        Self {
            display: layer.display_mode(),
            sort: layer.sort_mode,
            scores: layer.scores.clone(),
            color_overrides: layer.color_overrides.clone(),
            visible_subtechniques: layer.visible_subtechniques.clone(),
            excluded: layer.excluded.clone(),
        }
    }
}

/// Read-only state shared by the builders of a single export.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ExportContext<'a> {
    pub gradient: Option<&'a Gradient>,
    pub display: DisplayMode,
    pub color_overrides: &'a [ColorOverride],
    pub visible_subtechniques: &'a [MatchRule],
    pub excluded: &'a [MatchRule],
    pub config: &'a LayoutConfig,
    pub theme: &'a Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderBlockKind {
    About,
    Filters,
    Legend,
}

impl HeaderBlockKind {
    pub fn label(self) -> &'static str {
        match self {
            HeaderBlockKind::About => "about",
            HeaderBlockKind::Filters => "filters",
            HeaderBlockKind::Legend => "legend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderBlock {
    pub kind: HeaderBlockKind,
    pub x: f32,
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderLayout {
    pub available_width: f32,
    pub blocks: Vec<HeaderBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub tactic_id: String,
    pub tactic_name: String,
    pub tactic_key: String,
    pub label: String,
    pub x: f32,
    pub y: f32,
    pub techniques: usize,
    pub excluded: usize,
    pub expanded: usize,
    /// Vertical space used by the technique rows.
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct ExportLayout {
    pub width: f32,
    pub height: f32,
    pub header: HeaderLayout,
    pub columns: Vec<ColumnSummary>,
    pub document: Document,
}
