#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod gradient;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod matrix;
pub mod render;
pub mod scene;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig};
pub use error::{ExportError, MatrixError};
pub use gradient::Gradient;
pub use ir::{Domain, DisplayMode, Layer, MatchRule, SortMode};
pub use layout::{ExportRequest, Exporter};
pub use matrix::{LocalMatrix, MatrixProvider};
pub use theme::Theme;

use anyhow::Context;

/// Options for the one-call [`render_with_options`] entry point.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub domain: String,
    pub config: Config,
}

impl RenderOptions {
    pub fn navigator() -> Self {
        Self {
            domain: Domain::Enterprise.to_string(),
            config: Config::default(),
        }
    }

    pub fn modern() -> Self {
        let mut options = Self::navigator();
        options.config.theme = Theme::modern();
        options
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::navigator()
    }
}

/// Parses a layer and a matrix file (both JSON) and returns the SVG text.
pub fn render_with_options(layer_json: &str, matrix_json: &str, options: RenderOptions) -> anyhow::Result<String> {
    let layer = Layer::from_json(layer_json).context("invalid layer")?;
    let matrix = LocalMatrix::from_json(matrix_json)?;
    let theme = options.config.theme.clone();
    let exporter = Exporter::new(&options.domain, matrix, options.config)?;
    let document = exporter.export(&layer);
    Ok(render::render_svg(&document, &theme))
}
