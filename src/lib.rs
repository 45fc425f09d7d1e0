#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod ir;
pub mod label;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod plugin;
pub mod registry;
pub mod render;
pub mod text_metrics;
pub mod theme;
pub mod tooltip;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, OutLabelsOptions};
pub use ir::{ArcElement, ChartArea, ChartFrame, ChartId, ChartSpec};
pub use label::OutLabel;
pub use layout::{LabelGeometry, LayoutReport};
pub use plugin::OutLabelsPlugin;
pub use registry::ChartSessions;
pub use text_metrics::{FastMetrics, FontMetrics, TextMeasure};

/// Parse a chart (JSON/JSON5 or `pie` text) and render it to SVG with
/// system-font text measurement.
pub fn render_svg(input: &str, config: &Config) -> anyhow::Result<String> {
    let parsed = parser::parse_chart(input)?;
    render::render_chart_svg(&parsed.spec, config, FontMetrics)
}
