use tracing::debug;

use crate::config::LayoutConfig;
use crate::gradient::Gradient;
use crate::ir::Filters;
use crate::scene::{Group, Rect, Text, TextAnchor};
use crate::theme::Theme;

use super::technique::centered_baseline;
use super::text::{fit_text, text_width};
use super::types::{HeaderBlock, HeaderBlockKind, HeaderLayout};

/// Header contents borrowed from the layer.
pub(crate) struct HeaderInput<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub filters: Option<&'a Filters>,
    pub gradient: Option<&'a Gradient>,
}

impl HeaderInput<'_> {
    fn kinds(&self) -> Vec<HeaderBlockKind> {
        let mut kinds = vec![HeaderBlockKind::About];
        if self.filters.is_some() {
            kinds.push(HeaderBlockKind::Filters);
        }
        if self.gradient.is_some() {
            kinds.push(HeaderBlockKind::Legend);
        }
        kinds
    }
}

/// Splits `available_width` evenly between the about, filters and legend
/// blocks that apply and draws them left to right without gaps.
pub(crate) fn build_header(
    input: &HeaderInput<'_>,
    available_width: f32,
    config: &LayoutConfig,
    theme: &Theme,
) -> (Group, HeaderLayout) {
    let kinds = input.kinds();
    let slot = available_width / kinds.len() as f32;
    let mut group = Group::new().with_class("header");
    let mut blocks = Vec::with_capacity(kinds.len());

    for (idx, kind) in kinds.into_iter().enumerate() {
        let x = slot * idx as f32;
        let frame = BlockFrame::new(slot, config);
        let mut block = Group::at(x, 0.0).with_class(kind.label());
        draw_frame(&mut block, kind, &frame, config, theme);
        match kind {
            HeaderBlockKind::About => {
                let lines = [Some(input.name), input.description];
                draw_text_rows(&mut block, &lines, &frame, config, theme);
            }
            HeaderBlockKind::Filters => {
                if let Some(filters) = input.filters {
                    let platforms = filters.platform_line();
                    let lines = [Some(platforms.as_str()), Some(filters.first_stage())];
                    draw_text_rows(&mut block, &lines, &frame, config, theme);
                }
            }
            HeaderBlockKind::Legend => {
                if let Some(gradient) = input.gradient {
                    draw_legend(&mut block, gradient, &frame, config, theme);
                }
            }
        }
        debug!(block = kind.label(), x, width = slot, "placed header block");
        group.append(block);
        blocks.push(HeaderBlock { kind, x, width: slot });
    }

    (
        group,
        HeaderLayout {
            available_width,
            blocks,
        },
    )
}

/// Outline box of a header block and the content area inside it.
struct BlockFrame {
    box_y: f32,
    box_width: f32,
    box_height: f32,
    content_x: f32,
    content_y: f32,
    content_width: f32,
    content_height: f32,
}

impl BlockFrame {
    fn new(slot: f32, config: &LayoutConfig) -> Self {
        let label = config.header_label_font;
        let box_width = (slot - config.header_block_padding).max(1.0);
        let box_height = (config.header_height - label).max(1.0);
        let inset = label * 0.75;
        Self {
            box_y: label / 2.0,
            box_width,
            box_height,
            content_x: inset,
            content_y: label,
            content_width: (box_width - 2.0 * inset).max(1.0),
            content_height: (box_height - label).max(1.0),
        }
    }
}

fn draw_frame(block: &mut Group, kind: HeaderBlockKind, frame: &BlockFrame, config: &LayoutConfig, theme: &Theme) {
    block.append(
        Rect::new(0.0, frame.box_y, frame.box_width, frame.box_height, "none")
            .with_stroke(theme.header_border.clone(), 1.0)
            .with_corner_radius(config.header_corner_radius),
    );
    let font = config.header_label_font;
    let label = kind.label();
    let label_width = text_width(label, font, &theme.font_family, config.fast_text_metrics);
    block.append(Rect::new(frame.content_x - 3.0, 0.0, label_width + 6.0, font, theme.background.clone()));
    block.append(Text::new(frame.content_x, font * 0.85, label, font, theme.header_label_color.clone()));
}

/// Stacks the present rows in equal bands of the content area. The first
/// row may use the full header font, later rows half of it.
fn draw_text_rows(
    block: &mut Group,
    rows: &[Option<&str>],
    frame: &BlockFrame,
    config: &LayoutConfig,
    theme: &Theme,
) {
    let present: Vec<&str> = rows.iter().flatten().copied().filter(|row| !row.trim().is_empty()).collect();
    if present.is_empty() {
        return;
    }
    let band = frame.content_height / present.len() as f32;
    for (idx, row) in present.into_iter().enumerate() {
        let max_font = if idx == 0 {
            config.header_text_size
        } else {
            config.header_text_size / 2.0
        };
        let fitted = fit_text(row, frame.content_width, band, max_font, &theme.font_family, config);
        let top = frame.content_y + band * idx as f32;
        let baseline = top + centered_baseline(&fitted, band);
        let (font_size, line_height) = (fitted.font_size, fitted.line_height);
        block.append(
            Text::new(frame.content_x, baseline, String::new(), font_size, theme.text_color.clone())
                .with_lines(fitted.lines, line_height),
        );
    }
}

fn draw_legend(block: &mut Group, gradient: &Gradient, frame: &BlockFrame, config: &LayoutConfig, theme: &Theme) {
    let samples = gradient.legend_samples();
    let value_font = config.legend_value_font;
    let swatch_width = frame.content_width / samples.len() as f32;
    let swatch_height = (frame.content_height - value_font * 1.5).max(1.0);
    let mut swatches = Group::at(frame.content_x, frame.content_y).with_class("swatches");
    for (idx, color) in samples.into_iter().enumerate() {
        swatches.append(Rect::new(swatch_width * idx as f32, 0.0, swatch_width, swatch_height, color));
    }
    block.append(swatches);

    let baseline = frame.content_y + swatch_height + value_font * 1.1;
    block.append(Text::new(
        frame.content_x,
        baseline,
        gradient.min_value().to_string(),
        value_font,
        theme.text_color.clone(),
    ));
    block.append(
        Text::new(
            frame.content_x + frame.content_width,
            baseline,
            gradient.max_value().to_string(),
            value_font,
            theme.text_color.clone(),
        )
        .anchored(TextAnchor::End),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn build(input: &HeaderInput<'_>, width: f32) -> (Group, HeaderLayout) {
        build_header(input, width, &config(), &Theme::navigator())
    }

    #[test]
    fn bare_layer_gets_only_about_block() {
        let input = HeaderInput {
            name: "layer",
            description: None,
            filters: None,
            gradient: None,
        };
        let (group, layout) = build(&input, 600.0);
        assert_eq!(layout.blocks.len(), 1);
        assert_eq!(layout.blocks[0].kind, HeaderBlockKind::About);
        assert_eq!(layout.blocks[0].width, 600.0);
        let about = group.find_class("about").unwrap();
        let texts: Vec<String> = about.texts().iter().map(|t| t.content()).collect();
        assert_eq!(texts, vec!["about", "layer"]);
    }

    #[test]
    fn all_blocks_split_width_evenly() {
        let filters = Filters {
            platforms: vec!["Windows".into(), "Linux".into(), "macOS".into()],
            stages: vec!["act".into(), "prepare".into()],
        };
        let gradient = Gradient::new(vec!["#ff6666".into(), "#ffe766".into(), "#8ec843".into()], 0, 100).unwrap();
        let input = HeaderInput {
            name: "APT review",
            description: Some("techniques seen in Q3"),
            filters: Some(&filters),
            gradient: Some(&gradient),
        };
        let (group, layout) = build(&input, 700.0);
        let kinds: Vec<HeaderBlockKind> = layout.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![HeaderBlockKind::About, HeaderBlockKind::Filters, HeaderBlockKind::Legend]
        );
        let total: f32 = layout.blocks.iter().map(|b| b.width).sum();
        assert!((total - 700.0).abs() < 1e-3);
        assert!((layout.blocks[2].x - 2.0 * 700.0 / 3.0).abs() < 1e-3);

        let filters_block = group.find_class("filters").unwrap();
        let texts: Vec<String> = filters_block.texts().iter().map(|t| t.content()).collect();
        assert_eq!(texts[1..], ["Windows, Linux, macOS".to_string(), "act".to_string()]);
    }

    #[test]
    fn legend_draws_two_swatches_per_stop() {
        let gradient = Gradient::new(vec!["#ff0000".into(), "#00ff00".into()], 0, 100).unwrap();
        let input = HeaderInput {
            name: "scores",
            description: None,
            filters: None,
            gradient: Some(&gradient),
        };
        let (group, layout) = build(&input, 400.0);
        assert_eq!(layout.blocks.len(), 2);
        let swatches = group.find_class("swatches").unwrap();
        let fills: Vec<&str> = swatches.rects().iter().map(|r| r.fill.as_str()).collect();
        assert_eq!(fills, gradient.legend_samples());
        assert_eq!(fills.len(), 4);
        assert_eq!(fills[0], "#ff0000");
        let legend = group.find_class("legend").unwrap();
        let values: Vec<String> = legend.texts().iter().skip(1).map(|t| t.content()).collect();
        assert_eq!(values, vec!["0", "100"]);
    }

    #[test]
    fn empty_stage_list_leaves_second_line_out() {
        let filters = Filters {
            platforms: vec!["Android".into()],
            stages: Vec::new(),
        };
        let input = HeaderInput {
            name: "mobile",
            description: None,
            filters: Some(&filters),
            gradient: None,
        };
        let (group, _) = build(&input, 300.0);
        let texts = group.find_class("filters").unwrap().texts();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[1].content(), "Android");
    }
}
