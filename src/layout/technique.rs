use crate::color::contrast_text;
use crate::ir::{MatrixEntry, Subtechnique, Technique, find_match};
use crate::scene::{Group, Rect, Text, TextAnchor};

use super::text::{FittedText, fit_text};
use super::types::ExportContext;

/// Builds the block for one technique at vertical `offset` inside its
/// column. Each visible subtechnique adds one row below the technique row.
/// Returns the block and the offset where the next block starts.
pub(crate) fn build_technique(
    offset: f32,
    technique: &Technique,
    visible_subtechniques: &[Subtechnique],
    tactic: &str,
    ctx: &ExportContext<'_>,
) -> (Group, f32) {
    let width = ctx.config.incre_x;
    let row = ctx.config.incre_y;
    let mut block = Group::at(0.0, offset).with_class("technique");

    if visible_subtechniques.is_empty() {
        block.append(build_cell(technique, tactic, 0.0, 0.0, width, row, ctx));
        return (block, offset + row);
    }

    let indent = width * ctx.config.subtechnique_indent_ratio;
    let inner = width - indent;
    let consumed = row * (visible_subtechniques.len() + 1) as f32;

    block.append(
        Rect::new(0.0, 0.0, indent, consumed, ctx.theme.subtechnique_sidebar.clone())
            .with_stroke(ctx.theme.technique_border.clone(), 0.5),
    );
    block.append(build_cell(technique, tactic, indent, 0.0, inner, row, ctx));
    for (idx, subtechnique) in visible_subtechniques.iter().enumerate() {
        let y = row * (idx + 1) as f32;
        block.append(build_cell(subtechnique, tactic, indent, y, inner, row, ctx).with_class("subtechnique"));
    }
    (block, offset + consumed)
}

/// Fill for a technique or subtechnique cell: gradient color for a scored
/// entry, then a matching override, then the entry's own color, then the
/// theme default.
pub(crate) fn resolve_fill<E: MatrixEntry>(entry: &E, tactic: &str, ctx: &ExportContext<'_>) -> String {
    if let (Some(score), Some(gradient)) = (entry.score(), ctx.gradient) {
        return gradient.compute_color(score);
    }
    if let Some(hit) = find_match(ctx.color_overrides, entry.id(), tactic) {
        return hit.color.clone();
    }
    if let Some(color) = entry.color() {
        return color.to_string();
    }
    ctx.theme.technique_fill.clone()
}

fn build_cell<E: MatrixEntry>(
    entry: &E,
    tactic: &str,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    ctx: &ExportContext<'_>,
) -> Group {
    let fill = resolve_fill(entry, tactic, ctx);
    let text_fill = contrast_text(&fill, &ctx.theme.text_color, &ctx.theme.inverse_text_color).to_string();
    let mut cell = Group::at(x, y).with_class("cell");
    cell.append(
        Rect::new(0.0, 0.0, width, height, fill).with_stroke(ctx.theme.technique_border.clone(), 0.5),
    );

    let label = ctx.display.label(entry.id(), entry.name());
    let pad = ctx.config.cell_padding;
    let fitted = fit_text(
        &label,
        (width - 2.0 * pad).max(1.0),
        (height - pad).max(1.0),
        ctx.config.technique_font_size,
        &ctx.theme.font_family,
        ctx.config,
    );
    if !fitted.lines.is_empty() {
        let baseline = centered_baseline(&fitted, height);
        let font_size = fitted.font_size;
        let line_height = fitted.line_height;
        cell.append(
            Text::new(width / 2.0, baseline, String::new(), font_size, text_fill)
                .with_lines(fitted.lines, line_height)
                .anchored(TextAnchor::Middle),
        );
    }
    cell
}

/// First baseline that centers the fitted block vertically in a box of `height`.
pub(crate) fn centered_baseline(fitted: &FittedText, height: f32) -> f32 {
    let top = (height - fitted.height) / 2.0;
    top + fitted.line_height * 0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::gradient::Gradient;
    use crate::ir::{ColorOverride, DisplayMode, MatchRule};
    use crate::theme::Theme;

    fn config() -> LayoutConfig {
        LayoutConfig {
            fast_text_metrics: true,
            ..LayoutConfig::default()
        }
    }

    fn context<'a>(
        config: &'a LayoutConfig,
        theme: &'a Theme,
        gradient: Option<&'a Gradient>,
        overrides: &'a [ColorOverride],
        display: DisplayMode,
    ) -> ExportContext<'a> {
        ExportContext {
            gradient,
            display,
            color_overrides: overrides,
            visible_subtechniques: &[],
            excluded: &[],
            config,
            theme,
        }
    }

    fn cell_fills(block: &Group) -> Vec<String> {
        block
            .groups()
            .filter(|g| g.class.as_deref() == Some("cell") || g.class.as_deref() == Some("subtechnique"))
            .map(|g| g.rects()[0].fill.clone())
            .collect()
    }

    #[test]
    fn plain_technique_consumes_one_row() {
        let (config, theme) = (config(), Theme::navigator());
        let ctx = context(&config, &theme, None, &[], DisplayMode::NameOnly);
        let technique = Technique::new("T1078", "Valid Accounts");
        let (block, next) = build_technique(40.0, &technique, &[], "initial-access", &ctx);
        assert_eq!(next, 60.0);
        assert_eq!(block.offset(), (0.0, 40.0));
        assert_eq!(block.texts()[0].content(), "Valid Accounts");
        assert_eq!(cell_fills(&block), vec!["#ffffff"]);
    }

    #[test]
    fn visible_subtechniques_add_rows() {
        let (config, theme) = (config(), Theme::navigator());
        let ctx = context(&config, &theme, None, &[], DisplayMode::IdOnly);
        let technique = Technique::new("T1078", "Valid Accounts")
            .with_subtechnique("T1078.001", "Default Accounts")
            .with_subtechnique("T1078.002", "Domain Accounts");
        let (block, next) = build_technique(0.0, &technique, &technique.subtechniques, "persistence", &ctx);
        assert_eq!(next, 60.0);
        let texts: Vec<String> = block.texts().iter().map(|t| t.content()).collect();
        assert_eq!(texts, vec!["T1078", "T1078.001", "T1078.002"]);
        let sidebar = &block.rects()[0];
        assert_eq!(sidebar.width, 16.0);
        assert_eq!(sidebar.height, 60.0);
    }

    #[test]
    fn score_beats_override_and_override_prefers_exact_tactic() {
        let (config, theme) = (config(), Theme::navigator());
        let gradient = Gradient::new(vec!["#ff0000".into(), "#00ff00".into()], 0, 100).unwrap();
        let overrides = vec![
            ColorOverride {
                rule: MatchRule::any_tactic("T1003"),
                color: "#0000ff".into(),
            },
            ColorOverride {
                rule: MatchRule::in_tactic("T1003", "credential-access"),
                color: "#123456".into(),
            },
        ];
        let ctx = context(&config, &theme, Some(&gradient), &overrides, DisplayMode::Neither);

        let scored = Technique::new("T1003", "OS Credential Dumping").with_score(100.0);
        assert_eq!(resolve_fill(&scored, "credential-access", &ctx), "#00ff00");

        let unscored = Technique::new("T1003", "OS Credential Dumping");
        assert_eq!(resolve_fill(&unscored, "credential-access", &ctx), "#123456");
        assert_eq!(resolve_fill(&unscored, "discovery", &ctx), "#0000ff");

        let other = Technique::new("T1110", "Brute Force");
        assert_eq!(resolve_fill(&other, "credential-access", &ctx), theme.technique_fill);
    }

    #[test]
    fn neither_mode_renders_no_text() {
        let (config, theme) = (config(), Theme::navigator());
        let ctx = context(&config, &theme, None, &[], DisplayMode::Neither);
        let technique = Technique::new("T1078", "Valid Accounts");
        let (block, _) = build_technique(0.0, &technique, &[], "initial-access", &ctx);
        assert!(block.texts().is_empty());
    }

    #[test]
    fn dark_fill_gets_light_text() {
        let (config, theme) = (config(), Theme::navigator());
        let overrides = vec![ColorOverride {
            rule: MatchRule::any_tactic("T1078"),
            color: "#000000".into(),
        }];
        let ctx = context(&config, &theme, None, &overrides, DisplayMode::Both);
        let technique = Technique::new("T1078", "Valid Accounts");
        let (block, _) = build_technique(0.0, &technique, &[], "initial-access", &ctx);
        assert_eq!(block.texts()[0].fill, theme.inverse_text_color);
    }
}
