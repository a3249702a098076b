use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Width of one tactic column.
    pub incre_x: f32,
    /// Height of one technique row.
    pub incre_y: f32,
    pub tactic_spacing: f32,
    pub header_height: f32,
    pub tactic_font: f32,
    pub header_text_size: f32,
    pub margin: f32,
    /// Canvas width not handed to the header blocks.
    pub header_gutter: f32,
    /// Inset of each header box inside its slot.
    pub header_block_padding: f32,
    pub header_label_font: f32,
    pub header_corner_radius: f32,
    pub legend_value_font: f32,
    /// Vertical gap between the header strip and the column labels.
    pub column_label_gap: f32,
    /// Offset of the first column and of the header from the canvas edge.
    pub root_offset: f32,
    pub column_offset_y: f32,
    pub technique_font_size: f32,
    pub min_font_size: f32,
    pub cell_padding: f32,
    pub line_height: f32,
    /// Share of the cell width given to the subtechnique sidebar.
    pub subtechnique_indent_ratio: f32,
    pub fast_text_metrics: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            incre_x: 80.0,
            incre_y: 20.0,
            tactic_spacing: 10.0,
            header_height: 86.0,
            tactic_font: 8.0,
            header_text_size: 28.0,
            margin: 50.0,
            header_gutter: 30.0,
            header_block_padding: 30.0,
            header_label_font: 12.0,
            header_corner_radius: 5.0,
            legend_value_font: 10.0,
            column_label_gap: 30.0,
            root_offset: 5.0,
            column_offset_y: 2.0,
            technique_font_size: 12.0,
            min_font_size: 3.0,
            cell_padding: 2.0,
            line_height: 1.1,
            subtechnique_indent_ratio: 0.2,
            fast_text_metrics: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::navigator(),
            layout: LayoutConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    text_color: Option<String>,
    inverse_text_color: Option<String>,
    background: Option<String>,
    technique_fill: Option<String>,
    technique_border: Option<String>,
    subtechnique_sidebar: Option<String>,
    header_border: Option<String>,
    header_label_color: Option<String>,
    tactic_label_color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LayoutConfigFile {
    incre_x: Option<f32>,
    incre_y: Option<f32>,
    tactic_spacing: Option<f32>,
    header_height: Option<f32>,
    tactic_font: Option<f32>,
    header_text_size: Option<f32>,
    margin: Option<f32>,
    header_gutter: Option<f32>,
    header_block_padding: Option<f32>,
    header_label_font: Option<f32>,
    header_corner_radius: Option<f32>,
    legend_value_font: Option<f32>,
    column_label_gap: Option<f32>,
    root_offset: Option<f32>,
    column_offset_y: Option<f32>,
    technique_font_size: Option<f32>,
    min_font_size: Option<f32>,
    cell_padding: Option<f32>,
    line_height: Option<f32>,
    subtechnique_indent_ratio: Option<f32>,
    fast_text_metrics: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutConfigFile>,
}

/// Loads a JSON (or JSON5) config file over the defaults. `None` yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let parsed = parse_config_file(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

fn parse_config_file(contents: &str) -> anyhow::Result<ConfigFile> {
    match serde_json::from_str::<ConfigFile>(contents) {
        Ok(parsed) => Ok(parsed),
        Err(json_err) => json5::from_str::<ConfigFile>(contents)
            .map_err(|_| anyhow::Error::new(json_err)),
    }
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::by_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.inverse_text_color {
            config.theme.inverse_text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.technique_fill {
            config.theme.technique_fill = v;
        }
        if let Some(v) = vars.technique_border {
            config.theme.technique_border = v;
        }
        if let Some(v) = vars.subtechnique_sidebar {
            config.theme.subtechnique_sidebar = v;
        }
        if let Some(v) = vars.header_border {
            config.theme.header_border = v;
        }
        if let Some(v) = vars.header_label_color {
            config.theme.header_label_color = v;
        }
        if let Some(v) = vars.tactic_label_color {
            config.theme.tactic_label_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        let target = &mut config.layout;
        if let Some(v) = layout.incre_x {
            target.incre_x = v;
        }
        if let Some(v) = layout.incre_y {
            target.incre_y = v;
        }
        if let Some(v) = layout.tactic_spacing {
            target.tactic_spacing = v;
        }
        if let Some(v) = layout.header_height {
            target.header_height = v;
        }
        if let Some(v) = layout.tactic_font {
            target.tactic_font = v;
        }
        if let Some(v) = layout.header_text_size {
            target.header_text_size = v;
        }
        if let Some(v) = layout.margin {
            target.margin = v;
        }
        if let Some(v) = layout.header_gutter {
            target.header_gutter = v;
        }
        if let Some(v) = layout.header_block_padding {
            target.header_block_padding = v;
        }
        if let Some(v) = layout.header_label_font {
            target.header_label_font = v;
        }
        if let Some(v) = layout.header_corner_radius {
            target.header_corner_radius = v;
        }
        if let Some(v) = layout.legend_value_font {
            target.legend_value_font = v;
        }
        if let Some(v) = layout.column_label_gap {
            target.column_label_gap = v;
        }
        if let Some(v) = layout.root_offset {
            target.root_offset = v;
        }
        if let Some(v) = layout.column_offset_y {
            target.column_offset_y = v;
        }
        if let Some(v) = layout.technique_font_size {
            target.technique_font_size = v;
        }
        if let Some(v) = layout.min_font_size {
            target.min_font_size = v;
        }
        if let Some(v) = layout.cell_padding {
            target.cell_padding = v;
        }
        if let Some(v) = layout.line_height {
            target.line_height = v;
        }
        if let Some(v) = layout.subtechnique_indent_ratio {
            target.subtechnique_indent_ratio = v.clamp(0.0, 0.9);
        }
        if let Some(v) = layout.fast_text_metrics {
            target.fast_text_metrics = v;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.layout.incre_x, 80.0);
        assert_eq!(config.layout.header_height, 86.0);
        assert_eq!(config.theme.technique_fill, "#ffffff");
    }

    #[test]
    fn file_overrides_merge_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r##"{{
                // json5 comments are tolerated
                theme: "modern",
                themeVariables: {{ techniqueFill: "#eeeeee" }},
                layout: {{ increY: 24, fastTextMetrics: true }},
            }}"##
        )
        .unwrap();
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.theme.technique_fill, "#eeeeee");
        assert_eq!(config.theme.text_color, Theme::modern().text_color);
        assert_eq!(config.layout.incre_y, 24.0);
        assert!(config.layout.fast_text_metrics);
        assert_eq!(config.layout.incre_x, 80.0);
    }

    #[test]
    fn unknown_theme_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"theme": "neon"}}"#).unwrap();
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("neon"));
    }
}
