use navlayer_svg::{LayoutConfig, RenderOptions, render_with_options};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LayerRenderOptions {
    domain: Option<String>,
    theme: Option<String>,
    font_family: Option<String>,
    fast_text: Option<bool>,
}

fn build_render_options(options: LayerRenderOptions) -> RenderOptions {
    let mut render_options = if options.theme.as_deref() == Some("modern") {
        RenderOptions::modern()
    } else {
        RenderOptions::navigator()
    };

    if let Some(domain) = options.domain {
        render_options = render_options.with_domain(domain);
    }
    if let Some(font_family) = options.font_family {
        render_options.config.theme.font_family = font_family;
    }
    // Browsers have no system font database to measure against.
    render_options.config.layout = LayoutConfig {
        fast_text_metrics: options.fast_text.unwrap_or(true),
        ..render_options.config.layout
    };

    render_options
}

#[wasm_bindgen]
pub fn render_layer_svg(layer_json: &str, matrix_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<LayerRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        LayerRenderOptions::default()
    };

    let render_options = build_render_options(options);
    render_with_options(layer_json, matrix_json, render_options)
        .map_err(|error| JsValue::from_str(&format!("{error:#}")))
}
