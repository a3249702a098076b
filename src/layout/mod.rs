mod column;
mod header;
mod technique;
pub(crate) mod text;
pub(crate) mod types;
pub use types::*;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::Result;
use crate::ir::{Domain, Layer, MatrixEntry, ScoreEntry, TacticColumn, find_match};
use crate::matrix::MatrixProvider;
use crate::scene::{Document, Group, Text, TextAnchor};

use column::build_column;
use header::{HeaderInput, build_header};
use text::fit_text;

/// Renders layers against the matrix of one domain.
///
/// The exporter never changes after construction: ordering, resolved
/// scores and the layer being drawn live in locals of each export, so a
/// shared exporter can serve concurrent exports.
#[derive(Debug)]
pub struct Exporter<P> {
    domain: Domain,
    provider: P,
    matrix: Vec<TacticColumn>,
    config: Config,
}

impl<P: MatrixProvider> Exporter<P> {
    /// Validates `domain` (an optional `mitre-` prefix is accepted) before
    /// asking `provider` for the matrix.
    pub fn new(domain: &str, provider: P, config: Config) -> Result<Self> {
        let domain = Domain::parse(domain)?;
        let matrix = provider.get_matrix(domain)?;
        debug!(%domain, tactics = matrix.len(), "loaded matrix");
        Ok(Self {
            domain,
            provider,
            matrix,
            config,
        })
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Canvas width and height. Height counts one row per technique of the
    /// longest column; subtechnique expansion is not included.
    pub fn canvas_size(&self) -> (f32, f32) {
        let layout = &self.config.layout;
        let tactics = self.matrix.len() as f32;
        let longest = self.matrix.iter().map(|c| c.techniques.len()).max().unwrap_or(0) as f32;
        let width = layout.incre_x * tactics + layout.tactic_spacing * tactics + layout.margin;
        let height = layout.incre_y * longest + layout.header_height;
        (width, height)
    }

    /// Exports with every option taken from the layer itself.
    pub fn export(&self, layer: &Layer) -> Document {
        self.export_with(layer, &ExportRequest::from_layer(layer))
    }

    pub fn export_with(&self, layer: &Layer, request: &ExportRequest) -> Document {
        self.compute_layout(layer, request).document
    }

    pub fn compute_layout(&self, layer: &Layer, request: &ExportRequest) -> ExportLayout {
        let layout = &self.config.layout;
        let theme = &self.config.theme;
        let (width, height) = self.canvas_size();

        let ordered = self
            .provider
            .adjust_ordering(self.matrix.clone(), request.sort, &request.scores);
        let columns = self.resolve_scores(ordered, &request.scores);

        let ctx = ExportContext {
            gradient: layer.gradient.as_ref(),
            display: request.display,
            color_overrides: &request.color_overrides,
            visible_subtechniques: &request.visible_subtechniques,
            excluded: &request.excluded,
            config: layout,
            theme,
        };

        let mut root = Group::new()
            .with_class("layer")
            .with_style(format!("font-family: {}", theme.font_family));

        let input = HeaderInput {
            name: &layer.name,
            description: layer.description.as_deref(),
            filters: layer.filters.as_ref(),
            gradient: layer.gradient.as_ref(),
        };
        let (header_group, header) = build_header(&input, width - layout.header_gutter, layout, theme);
        let mut header_wrap = Group::at(layout.root_offset, layout.root_offset);
        header_wrap.append(header_group);
        root.append(header_wrap);

        let mut tactics = Group::new().with_class("tactics");
        let mut summaries = Vec::with_capacity(columns.len());
        let step = layout.incre_x + layout.tactic_spacing;
        let top = layout.header_height + layout.column_label_gap;
        for (idx, column) in columns.iter().enumerate() {
            let x = layout.root_offset + step * idx as f32;
            let tactic_key = self.provider.normalize_tactic_id(&column.tactic.name);
            let label = ctx.display.label(&column.tactic.id, &column.tactic.name);

            let mut tactic = Group::at(x, top).with_class("tactic");
            if let Some(text) = column_label(&label, &ctx) {
                let mut label_group = Group::at(layout.incre_x / 2.0 + 2.0, 0.0).with_class("tactic-label");
                label_group.append(text);
                tactic.append(label_group);
            }
            let output = build_column(column, &tactic_key, &ctx);
            tactic.append(output.group);
            tactics.append(tactic);

            debug!(
                tactic = %column.tactic.id,
                key = %tactic_key,
                shown = output.shown,
                excluded = output.excluded,
                expanded = output.expanded,
                "placed column"
            );
            summaries.push(ColumnSummary {
                tactic_id: column.tactic.id.clone(),
                tactic_name: column.tactic.name.clone(),
                tactic_key,
                label,
                x,
                y: top + layout.column_offset_y,
                techniques: output.shown,
                excluded: output.excluded,
                expanded: output.expanded,
                height: output.offset,
            });
        }
        root.append(tactics);

        let mut document = Document::new(width, height, (0.0, 0.0));
        document.append(root);
        info!(
            layer = %layer.name,
            domain = %self.domain,
            tactics = summaries.len(),
            width,
            height,
            "exported layer"
        );

        ExportLayout {
            width,
            height,
            header,
            columns: summaries,
            document,
        }
    }

    /// Copies scores from the score list onto entries that carry none.
    fn resolve_scores(&self, mut columns: Vec<TacticColumn>, scores: &[ScoreEntry]) -> Vec<TacticColumn> {
        if scores.is_empty() {
            return columns;
        }
        for column in &mut columns {
            let key = self.provider.normalize_tactic_id(&column.tactic.name);
            for technique in &mut column.techniques {
                if technique.score.is_none() {
                    technique.score = lookup_score(scores, technique.id(), &key);
                }
                for subtechnique in &mut technique.subtechniques {
                    if subtechnique.score.is_none() {
                        subtechnique.score = lookup_score(scores, subtechnique.id(), &key);
                    }
                }
            }
        }
        columns
    }
}

fn lookup_score(scores: &[ScoreEntry], id: &str, tactic: &str) -> Option<f64> {
    find_match(scores, id, tactic).map(|entry| entry.score)
}

/// Column heading centered on its anchor. Wrapped lines grow upward so the
/// last one sits just above the first technique row.
fn column_label(label: &str, ctx: &ExportContext<'_>) -> Option<Text> {
    let layout = ctx.config;
    let fitted = fit_text(
        label,
        layout.incre_x + layout.tactic_spacing,
        layout.column_label_gap,
        layout.tactic_font,
        &ctx.theme.font_family,
        layout,
    );
    if fitted.lines.is_empty() {
        return None;
    }
    let first_baseline = -(fitted.lines.len() as f32 - 1.0) * fitted.line_height - 2.0;
    let (font_size, line_height) = (fitted.font_size, fitted.line_height);
    Some(
        Text::new(0.0, first_baseline, String::new(), font_size, ctx.theme.tactic_label_color.clone())
            .with_lines(fitted.lines, line_height)
            .anchored(TextAnchor::Middle)
            .bold(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::error::{ExportError, MatrixError};
    use crate::gradient::Gradient;
    use crate::ir::{DisplayMode, Filters, MatchRule, SortMode, Technique};
    use crate::matrix::LocalMatrix;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn matrix() -> LocalMatrix {
        LocalMatrix::new().with_domain(
            Domain::Enterprise,
            vec![
                TacticColumn::new("TA0001", "Initial Access")
                    .with_technique(Technique::new("T1078", "Valid Accounts").with_subtechnique("T1078.001", "Default Accounts"))
                    .with_technique(Technique::new("T1566", "Phishing")),
                TacticColumn::new("TA0003", "Persistence")
                    .with_technique(Technique::new("T1078", "Valid Accounts"))
                    .with_technique(Technique::new("T1136", "Create Account"))
                    .with_technique(Technique::new("T1098", "Account Manipulation")),
            ],
        )
    }

    fn config() -> Config {
        Config {
            layout: LayoutConfig {
                fast_text_metrics: true,
                ..LayoutConfig::default()
            },
            ..Config::default()
        }
    }

    fn exporter() -> Exporter<LocalMatrix> {
        Exporter::new("mitre-enterprise", matrix(), config()).unwrap()
    }

    fn labels(layout: &ExportLayout) -> Vec<&str> {
        layout.columns.iter().map(|c| c.label.as_str()).collect()
    }

    #[derive(Debug)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    impl MatrixProvider for CountingProvider {
        fn get_matrix(&self, _domain: Domain) -> std::result::Result<Vec<TacticColumn>, MatrixError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[test]
    fn unknown_domain_fails_before_matrix_lookup() {
        let provider = CountingProvider {
            calls: AtomicUsize::new(0),
        };
        let err = Exporter::new("mitre-ics", &provider, Config::default()).unwrap_err();
        assert!(matches!(err, ExportError::UnknownDomain(ref d) if d == "mitre-ics"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_domain_surfaces_matrix_error() {
        let err = Exporter::new("mobile", matrix(), Config::default()).unwrap_err();
        assert!(matches!(err, ExportError::Matrix(MatrixError::MissingDomain(Domain::Mobile))));
    }

    #[test]
    fn canvas_size_follows_tactic_and_row_counts() {
        let exporter = exporter();
        assert_eq!(exporter.canvas_size(), (80.0 * 2.0 + 10.0 * 2.0 + 50.0, 20.0 * 3.0 + 86.0));
        let layout = exporter.compute_layout(&Layer::new("x"), &ExportRequest::default());
        assert_eq!((layout.width, layout.height), (230.0, 146.0));
        assert_eq!(layout.document.width, 230.0);
        assert_eq!(layout.header.available_width, 200.0);
    }

    #[test]
    fn display_mode_drives_column_labels() {
        let exporter = exporter();
        let layer = Layer::new("labels");
        let mut request = ExportRequest {
            display: DisplayMode::Both,
            ..ExportRequest::default()
        };
        let layout = exporter.compute_layout(&layer, &request);
        assert_eq!(labels(&layout), ["TA0001: Initial Access", "TA0003: Persistence"]);

        request.display = DisplayMode::IdOnly;
        assert_eq!(labels(&exporter.compute_layout(&layer, &request)), ["TA0001", "TA0003"]);

        request.display = DisplayMode::Neither;
        let layout = exporter.compute_layout(&layer, &request);
        assert_eq!(labels(&layout), ["", ""]);
        assert!(layout.document.root.find_class("tactic-label").is_none());
    }

    #[test]
    fn columns_step_right_and_start_below_header() {
        let layout = exporter().compute_layout(&Layer::new("x"), &ExportRequest::default());
        let xs: Vec<f32> = layout.columns.iter().map(|c| c.x).collect();
        assert_eq!(xs, vec![5.0, 95.0]);
        assert!(layout.columns.iter().all(|c| c.y == 86.0 + 30.0 + 2.0));
    }

    #[test]
    fn wildcard_exclusion_hits_every_column() {
        let request = ExportRequest {
            excluded: vec![MatchRule::any_tactic("T1078")],
            ..ExportRequest::default()
        };
        let layout = exporter().compute_layout(&Layer::new("x"), &request);
        let excluded: Vec<usize> = layout.columns.iter().map(|c| c.excluded).collect();
        assert_eq!(excluded, vec![1, 1]);
    }

    #[test]
    fn scoped_exclusion_hits_one_column() {
        let request = ExportRequest {
            excluded: vec![MatchRule::in_tactic("T1078", "persistence")],
            ..ExportRequest::default()
        };
        let layout = exporter().compute_layout(&Layer::new("x"), &request);
        let shown: Vec<usize> = layout.columns.iter().map(|c| c.techniques).collect();
        assert_eq!(shown, vec![2, 2]);
        assert_eq!(layout.columns[1].excluded, 1);
        assert_eq!(layout.columns[0].excluded, 0);
    }

    #[test]
    fn expansion_grows_column_height_not_canvas() {
        let request = ExportRequest {
            visible_subtechniques: vec![MatchRule::in_tactic("T1078", "initial-access")],
            ..ExportRequest::default()
        };
        let layout = exporter().compute_layout(&Layer::new("x"), &request);
        assert_eq!(layout.columns[0].height, 60.0);
        assert_eq!(layout.columns[0].expanded, 1);
        assert_eq!(layout.columns[1].height, 60.0);
        assert_eq!(layout.height, 146.0);
    }

    #[test]
    fn score_list_colors_cells_through_gradient() {
        let mut layer = Layer::new("scored");
        layer.gradient = Some(Gradient::new(vec!["#ff0000".into(), "#00ff00".into()], 0, 100).unwrap());
        layer.scores = vec![
            ScoreEntry {
                rule: MatchRule::any_tactic("T1566"),
                score: 100.0,
            },
            ScoreEntry {
                rule: MatchRule::in_tactic("T1136", "persistence"),
                score: 0.0,
            },
        ];
        let document = exporter().export(&layer);
        let tactics = document.root.find_class("tactics").unwrap();
        let fills: Vec<&str> = tactics.rects().iter().map(|r| r.fill.as_str()).collect();
        assert!(fills.contains(&"#00ff00"));
        assert!(fills.contains(&"#ff0000"));
        assert_eq!(document.root.find_class("legend").map(|g| g.rects().len()), Some(2 + 4));
    }

    #[test]
    fn score_sort_reorders_within_columns() {
        let mut layer = Layer::new("sorted");
        layer.show_id = true;
        layer.show_name = false;
        layer.sort_mode = SortMode::ScoreDescending;
        layer.scores = vec![ScoreEntry {
            rule: MatchRule::any_tactic("T1136"),
            score: 9.0,
        }];
        let document = exporter().export(&layer);
        let persistence = document.root.find_class("tactics").unwrap().groups().nth(1).unwrap();
        let ids: Vec<String> = persistence
            .find_class("techniques")
            .unwrap()
            .texts()
            .iter()
            .map(|t| t.content())
            .collect();
        assert_eq!(ids, vec!["T1136", "T1098", "T1078"]);
    }

    #[test]
    fn header_blocks_follow_layer_fields() {
        let mut layer = Layer::new("full");
        layer.description = Some("described".into());
        layer.filters = Some(Filters {
            platforms: vec!["Windows".into()],
            stages: vec!["act".into()],
        });
        let layout = exporter().compute_layout(&layer, &ExportRequest::from_layer(&layer));
        assert_eq!(layout.header.blocks.len(), 2);
        let sum: f32 = layout.header.blocks.iter().map(|b| b.width).sum();
        assert!((sum - layout.header.available_width).abs() < 1e-3);
    }

    #[test]
    fn concurrent_exports_do_not_interfere() {
        let exporter = exporter();
        let mut by_name = Layer::new("names");
        by_name.sort_mode = SortMode::NameDescending;
        let mut by_id = Layer::new("ids");
        by_id.show_name = false;
        by_id.show_id = true;
        by_id.excluded = vec![MatchRule::any_tactic("T1566")];

        let expected_names = exporter.export(&by_name);
        let expected_ids = exporter.export(&by_id);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let exporter = &exporter;
                    let layer = if i % 2 == 0 { &by_name } else { &by_id };
                    scope.spawn(move || (i, exporter.export(layer)))
                })
                .collect();
            for handle in handles {
                let (i, document) = handle.join().unwrap();
                let expected = if i % 2 == 0 { &expected_names } else { &expected_ids };
                assert_eq!(&document, expected);
            }
        });
    }
}
