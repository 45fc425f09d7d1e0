use outlabels::config::{Config, apply_config_str};
use outlabels::parser::parse_chart;
use outlabels::render::{RenderOutput, render_chart};
use outlabels::theme::Theme;
use outlabels::FastMetrics;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutLabelsRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    /// Extra outlabel options, merged over the theme defaults.
    outlabels: Option<serde_json::Value>,
}

fn build_config(options: OutLabelsRenderOptions) -> anyhow::Result<Config> {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("modern") {
        config.theme = Theme::modern();
        config.render.background = config.theme.background.clone();
    }

    if let Some(font_family) = options.font_family {
        config.outlabels.font.family = Some(font_family.clone());
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.outlabels.font.size = Some(font_size);
        config.theme.font_size = font_size;
    }
    if let Some(width) = options.width {
        config.render.width = width;
    }
    if let Some(height) = options.height {
        config.render.height = height;
    }
    if let Some(outlabels) = options.outlabels {
        let patch = serde_json::json!({ "outlabels": outlabels });
        config = apply_config_str(config, &patch.to_string())?;
    }
    Ok(config)
}

// Browsers have no system font database; widths come from the built-in tables.
fn render(code: &str, options_json: Option<String>) -> Result<RenderOutput, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<OutLabelsRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        OutLabelsRenderOptions::default()
    };
    let config = build_config(options).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let parsed = parse_chart(code).map_err(|error| JsValue::from_str(&error.to_string()))?;
    render_chart(&parsed.spec, &config, FastMetrics).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn render_outlabels_svg(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    render(code, options_json).map(|output| output.svg)
}

/// Final label geometry as JSON, for hosts that draw labels themselves.
#[wasm_bindgen]
pub fn render_outlabels_layout(code: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let output = render(code, options_json)?;
    serde_json::to_string(&output.dump).map_err(|error| JsValue::from_str(&error.to_string()))
}
