use crate::config::load_config;
use crate::ir::{DisplayMode, Layer, MatchRule, SortMode};
use crate::layout::{ExportRequest, Exporter};
use crate::layout_dump::write_layout_dump;
use crate::matrix::LocalMatrix;
use crate::render::{render_svg, write_output_svg};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "nlsvg", version, about = "Render a navigator layer as an SVG matrix")]
pub struct Args {
    /// Layer file (.json) or '-' for stdin
    #[arg(short = 'l', long = "layer")]
    pub layer: PathBuf,

    /// Matrix data file: {"enterprise": [...], "mobile": [...]}
    #[arg(short = 'm', long = "matrix")]
    pub matrix: PathBuf,

    /// Matrix domain, optionally prefixed with 'mitre-'
    #[arg(short = 'd', long = "domain", default_value = "enterprise")]
    pub domain: String,

    /// Output file. Defaults to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file (theme, themeVariables, layout)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Technique order inside each column; defaults to the layer's
    #[arg(long = "sort", value_enum)]
    pub sort: Option<SortArg>,

    #[arg(long = "show-name")]
    pub show_name: Option<bool>,

    #[arg(long = "show-id")]
    pub show_id: Option<bool>,

    /// Hide a technique: T1078 or T1078@initial-access (repeatable)
    #[arg(long = "exclude", value_parser = parse_rule)]
    pub exclude: Vec<MatchRule>,

    /// Show a technique's subtechniques: T1078 or T1078@persistence (repeatable)
    #[arg(long = "expand", value_parser = parse_rule)]
    pub expand: Vec<MatchRule>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    NameAsc,
    NameDesc,
    ScoreAsc,
    ScoreDesc,
}

impl From<SortArg> for SortMode {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::NameAsc => SortMode::NameAscending,
            SortArg::NameDesc => SortMode::NameDescending,
            SortArg::ScoreAsc => SortMode::ScoreAscending,
            SortArg::ScoreDesc => SortMode::ScoreDescending,
        }
    }
}

fn parse_rule(value: &str) -> std::result::Result<MatchRule, String> {
    value.parse::<MatchRule>().map_err(|err| err.to_string())
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = load_config(args.config.as_deref())?;
    let layer = load_layer(&args.layer)?;
    let matrix = LocalMatrix::from_path(&args.matrix)
        .with_context(|| format!("failed to load matrix {}", args.matrix.display()))?;
    let theme = config.theme.clone();
    let exporter = Exporter::new(&args.domain, matrix, config)?;

    let request = build_request(&args, &layer);
    debug!(sort = ?request.sort, display = ?request.display, "export request");
    let layout = exporter.compute_layout(&layer, &request);
    let svg = render_svg(&layout.document, &theme);
    write_output_svg(&svg, args.output.as_deref())?;

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout, exporter.domain())
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }
    Ok(())
}

/// Stderr subscriber; `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("navlayer_svg={level}")));
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .without_time();
    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

pub fn load_layer(path: &Path) -> Result<Layer> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read layer {}", path.display()))?
    };
    Layer::from_json(&contents).with_context(|| format!("failed to parse layer {}", path.display()))
}

/// Layer settings with command-line overrides applied. Rules given on the
/// command line are appended to the layer's own.
fn build_request(args: &Args, layer: &Layer) -> ExportRequest {
    let mut request = ExportRequest::from_layer(layer);
    if let Some(sort) = args.sort {
        request.sort = sort.into();
    }
    if args.show_name.is_some() || args.show_id.is_some() {
        request.display = DisplayMode::from_flags(
            args.show_name.unwrap_or(layer.show_name),
            args.show_id.unwrap_or(layer.show_id),
        );
    }
    request.excluded.extend(args.exclude.iter().cloned());
    request.visible_subtechniques.extend(args.expand.iter().cloned());
    request
}
