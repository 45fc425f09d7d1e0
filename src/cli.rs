use crate::config::{Config, apply_config_str, load_config};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_chart;
use crate::render::{RenderOutput, render_chart, write_output_svg};
use crate::text_metrics::{FastMetrics, FontMetrics};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(
    name = "outlabels",
    version,
    about = "Render pie/donut charts with out-of-chart callout labels"
)]
pub struct Args {
    /// Input file (.json, .json5, .mmd, .md) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON/JSON5 file (theme, themeVariables, outlabels, render)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Measure text with built-in width tables instead of system fonts
    #[arg(long = "fast-text")]
    pub fast_text: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    /// Layout dump of the final label geometry
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
            OutputFormat::Json => "json",
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let mut base_config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        base_config.render.width = width;
    }
    if let Some(height) = args.height {
        base_config.render.height = height;
    }

    let (input, is_markdown) = read_input(args.input.as_deref())?;
    let charts = if is_markdown {
        extract_mermaid_blocks(&input)
    } else {
        vec![input]
    };

    if charts.is_empty() {
        return Err(anyhow::anyhow!("No charts found in input"));
    }

    if charts.len() == 1 {
        let output = render_one(&charts[0], &base_config, args.fast_text)?;
        return write_output(&output, args.output_format, args.output.as_deref(), &base_config);
    }

    // Multiple charts (Markdown input)
    let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, charts.len())?;
    for (chart, path) in charts.iter().zip(&outputs) {
        let output = render_one(chart, &base_config, args.fast_text)?;
        write_output(&output, args.output_format, Some(path), &base_config)?;
        info!(path = %path.display(), "wrote chart");
    }

    Ok(())
}

fn render_one(source: &str, base_config: &Config, fast_text: bool) -> Result<RenderOutput> {
    let parsed = parse_chart(source)?;
    let mut config = base_config.clone();
    if let Some(init_cfg) = parsed.init_config {
        config = merge_init_config(config, &init_cfg)?;
    }
    debug!(
        chart = %parsed.spec.chart_id(),
        sectors = parsed.spec.values.len(),
        fast_text,
        "rendering chart"
    );
    if fast_text {
        render_chart(&parsed.spec, &config, FastMetrics)
    } else {
        render_chart(&parsed.spec, &config, FontMetrics)
    }
}

fn write_output(
    output: &RenderOutput,
    format: OutputFormat,
    path: Option<&Path>,
    config: &Config,
) -> Result<()> {
    match format {
        OutputFormat::Svg => write_output_svg(&output.svg, path),
        OutputFormat::Json => match path {
            Some(path) => write_layout_dump(path, &output.dump),
            None => {
                println!("{}", serde_json::to_string_pretty(&output.dump)?);
                Ok(())
            }
        },
        OutputFormat::Png => {
            let path = ensure_output(path, "png")?;
            write_png(&output.svg, path, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, path: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, path, config)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _path: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<(String, bool)> {
    if let Some(path) = path {
        if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            return Ok((buf, false));
        }
        let content = std::fs::read_to_string(path)?;
        let is_md = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| matches!(ext, "md" | "markdown"))
            .unwrap_or(false);
        return Ok((content, is_md));
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok((buf, false))
}

fn ensure_output<'a>(output: Option<&'a Path>, ext: &str) -> Result<&'a Path> {
    output.ok_or_else(|| anyhow::anyhow!("Output path required for {} output", ext))
}

fn extract_mermaid_blocks(input: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut in_block = false;
    let mut current = Vec::new();
    let mut fence = String::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if !in_block {
            if let Some(start_fence) = detect_mermaid_fence(trimmed) {
                in_block = true;
                fence = start_fence;
                continue;
            }
        } else if is_fence_end(trimmed, &fence) {
            in_block = false;
            blocks.push(current.join("\n"));
            current.clear();
            continue;
        }

        if in_block {
            current.push(line.to_string());
        }
    }

    blocks
}

fn detect_mermaid_fence(line: &str) -> Option<String> {
    for fence in ["```", "~~~", ":::"] {
        if let Some(rest) = line.strip_prefix(fence) {
            let info = rest.trim_start_matches(fence.chars().next()?).trim();
            if info.starts_with("mermaid") || info.starts_with("outlabels") {
                return Some(fence.to_string());
            }
        }
    }
    None
}

fn is_fence_end(line: &str, fence: &str) -> bool {
    if !line.starts_with(fence) {
        return false;
    }
    line[fence.len()..].trim().is_empty()
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = format.extension();
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for markdown input"))?;
    if base.is_dir() {
        return Ok((0..count)
            .map(|idx| base.join(format!("chart-{}.{}", idx + 1, ext)))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("chart");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((0..count)
        .map(|idx| parent.join(format!("{}-{}.{}", stem, idx + 1, ext)))
        .collect())
}

/// Apply an `%%{init: ...}%%` directive. It uses the config file's shape;
/// `outlabels` overrides were already folded into the chart by the parser.
fn merge_init_config(config: Config, init: &serde_json::Value) -> Result<Config> {
    let mut patch = init.clone();
    if let Some(map) = patch.as_object_mut() {
        map.remove("outlabels");
        if map.is_empty() {
            return Ok(config);
        }
    }
    apply_config_str(config, &patch.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_mermaid_blocks() {
        let input = r#"
text
``` mermaid
pie title Pets
  "Dogs" : 3
```
more
~~~mermaid
pie
  "A" : 1
~~~
::: outlabels
{ labels: ["x"], values: [1] }
:::
"#;
        let blocks = extract_mermaid_blocks(input);
        assert_eq!(blocks.len(), 3);
        assert!(blocks[0].contains("Dogs"));
        assert!(blocks[1].starts_with("pie"));
        assert!(blocks[2].contains("labels"));
    }

    #[test]
    fn multi_outputs_are_numbered_next_to_base() {
        let outputs =
            resolve_multi_outputs(Some(Path::new("out/report.svg")), OutputFormat::Json, 2).unwrap();
        assert_eq!(
            outputs,
            vec![
                PathBuf::from("out/report-1.json"),
                PathBuf::from("out/report-2.json")
            ]
        );
        assert!(resolve_multi_outputs(None, OutputFormat::Svg, 2).is_err());
    }

    #[test]
    fn init_directive_applies_theme_variables() {
        let init = serde_json::json!({
            "theme": "modern",
            "themeVariables": { "fontSize": 18 },
            "outlabels": { "length": 10 }
        });
        let config = merge_init_config(Config::default(), &init).unwrap();
        assert_eq!(config.theme.font_size, 18.0);
        assert_eq!(config.outlabels.font.size, Some(18.0));
        assert_eq!(config.outlabels.length, Config::default().outlabels.length);
    }

    #[test]
    fn render_one_uses_init_config() {
        let source = "%%{init: {\"render\": {\"width\": 300, \"height\": 200}}}%%\npie\n\"A\" : 1\n\"B\" : 2";
        let output = render_one(source, &Config::default(), true).unwrap();
        assert!(output.svg.contains("width=\"300\""));
        assert_eq!(output.dump.labels.len(), 2);
    }
}
