use std::f32::consts::PI;
use std::path::Path;

use anyhow::Result;

use crate::config::{Config, OutLabelsOptions, RenderConfig};
use crate::geometry::{PathCommand, Point, Rect, path_to_svg};
use crate::ir::{ArcElement, ChartFrame, ChartSpec};
use crate::layout::{LayoutReport, chart_area_for, compute_arcs};
use crate::layout_dump::LayoutDump;
use crate::plugin::OutLabelsPlugin;
use crate::text_metrics::{FontSpec, TextMeasure};
use crate::theme::Theme;

/// Spans this close to a full turn are drawn as a closed ring.
const FULL_CIRCLE_EPS: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    fn as_svg(self) -> &'static str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

/// Drawing surface labels paint onto. Text is positioned by the middle of
/// its line box.
pub trait Canvas {
    fn draw_path(&mut self, path: &[PathCommand], fill: Option<&str>, stroke: Option<(&str, f32)>);
    fn fill_text(&mut self, text: &str, at: Point, font: &FontSpec, color: &str, anchor: TextAnchor);
    fn stroke_line(&mut self, from: Point, to: Point, color: &str, width: f32);
    fn fill_rect(&mut self, rect: Rect, color: &str);

    /// Start a group of shapes belonging to one label; `title` is the text
    /// a viewer shows on hover.
    fn begin_group(&mut self, _title: Option<&str>) {}
    fn end_group(&mut self) {}
}

#[derive(Debug, Clone)]
pub struct SvgCanvas {
    width: f32,
    height: f32,
    body: String,
    open_groups: usize,
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
            open_groups: 0,
        }
    }

    pub fn fill_background(&mut self, color: &str) {
        self.body.push_str(&format!(
            "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>",
            escape_xml(color)
        ));
    }

    pub fn push_svg_path(&mut self, d: &str, fill: &str, stroke: Option<(&str, f32)>) {
        let stroke = match stroke {
            Some((color, width)) if width > 0.0 => format!(
                " stroke=\"{}\" stroke-width=\"{width:.2}\"",
                escape_xml(color)
            ),
            _ => String::new(),
        };
        self.body.push_str(&format!(
            "<path d=\"{d}\" fill=\"{}\" fill-rule=\"evenodd\"{stroke}/>",
            escape_xml(fill)
        ));
    }

    pub fn push_title(&mut self, title: &str, at: Point, font: &FontSpec, color: &str) {
        self.fill_text(title, at, font, color, TextAnchor::Middle);
    }

    pub fn finish(mut self) -> String {
        for _ in 0..self.open_groups {
            self.body.push_str("</g>");
        }
        let (width, height) = (self.width, self.height);
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">{}</svg>",
            self.body
        )
    }
}

impl Canvas for SvgCanvas {
    fn draw_path(&mut self, path: &[PathCommand], fill: Option<&str>, stroke: Option<(&str, f32)>) {
        let fill = fill.map(escape_xml).unwrap_or_else(|| "none".to_string());
        let stroke = match stroke {
            Some((color, width)) => format!(
                " stroke=\"{}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"miter\"",
                escape_xml(color)
            ),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "<path d=\"{}\" fill=\"{fill}\"{stroke}/>",
            path_to_svg(path)
        ));
    }

    fn fill_text(&mut self, text: &str, at: Point, font: &FontSpec, color: &str, anchor: TextAnchor) {
        self.body.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"{}\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" font-weight=\"{}\" font-style=\"{}\" fill=\"{}\">{}</text>",
            at.x,
            at.y,
            anchor.as_svg(),
            escape_xml(&font.family),
            font.size,
            font.weight,
            font.style.as_css(),
            escape_xml(color),
            escape_xml(text)
        ));
    }

    fn stroke_line(&mut self, from: Point, to: Point, color: &str, width: f32) {
        self.body.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{width:.2}\" stroke-linejoin=\"miter\"/>",
            from.x,
            from.y,
            to.x,
            to.y,
            escape_xml(color)
        ));
    }

    fn fill_rect(&mut self, rect: Rect, color: &str) {
        self.body.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"/>",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            escape_xml(color)
        ));
    }

    fn begin_group(&mut self, title: Option<&str>) {
        self.body.push_str("<g class=\"outlabel\">");
        if let Some(title) = title {
            self.body
                .push_str(&format!("<title>{}</title>", escape_xml(title)));
        }
        self.open_groups += 1;
    }

    fn end_group(&mut self) {
        if self.open_groups > 0 {
            self.body.push_str("</g>");
            self.open_groups -= 1;
        }
    }
}

fn polar(center: Point, radius: f32, angle: f32) -> Point {
    let (sin, cos) = angle.sin_cos();
    Point::new(center.x + radius * cos, center.y + radius * sin)
}

/// SVG path data for one sector, or `None` for an empty span.
pub fn sector_path(arc: &ArcElement, center: Point) -> Option<String> {
    let span = arc.span();
    let outer = arc.outer_radius;
    let inner = arc.inner_radius.max(0.0);
    if span <= 0.0 || outer <= 0.0 {
        return None;
    }

    if span >= PI * 2.0 - FULL_CIRCLE_EPS {
        let ring = |r: f32| {
            format!(
                "M {:.2} {:.2} A {r:.2} {r:.2} 0 1 1 {:.2} {:.2} A {r:.2} {r:.2} 0 1 1 {:.2} {:.2} Z",
                center.x + r,
                center.y,
                center.x - r,
                center.y,
                center.x + r,
                center.y
            )
        };
        let mut d = ring(outer);
        if inner > 0.0 {
            d.push(' ');
            d.push_str(&ring(inner));
        }
        return Some(d);
    }

    let large = if span > PI { 1 } else { 0 };
    let start = arc.start_angle.min(arc.end_angle);
    let end = arc.start_angle.max(arc.end_angle);
    let outer_start = polar(center, outer, start);
    let outer_end = polar(center, outer, end);
    let mut d = format!(
        "M {:.2} {:.2} A {outer:.2} {outer:.2} 0 {large} 1 {:.2} {:.2}",
        outer_start.x, outer_start.y, outer_end.x, outer_end.y
    );
    if inner > 0.0 {
        let inner_end = polar(center, inner, end);
        let inner_start = polar(center, inner, start);
        d.push_str(&format!(
            " L {:.2} {:.2} A {inner:.2} {inner:.2} 0 {large} 0 {:.2} {:.2} Z",
            inner_end.x, inner_end.y, inner_start.x, inner_start.y
        ));
    } else {
        d.push_str(&format!(" L {:.2} {:.2} Z", center.x, center.y));
    }
    Some(d)
}

fn draw_sectors(canvas: &mut SvgCanvas, frame: &ChartFrame, theme: &Theme) {
    let center = frame.area.center();
    for (idx, arc) in frame.arcs.iter().enumerate() {
        let Some(d) = sector_path(arc, center) else {
            continue;
        };
        canvas.push_svg_path(
            &d,
            theme.sector_color(idx),
            Some((theme.sector_border.as_str(), theme.sector_border_width)),
        );
    }
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub svg: String,
    pub report: Option<LayoutReport>,
    pub dump: LayoutDump,
}

/// Effective label options for one chart: configured options with the
/// chart's own overrides merged on top.
pub fn chart_options(spec: &ChartSpec, config: &Config) -> Result<OutLabelsOptions> {
    match &spec.options {
        Some(patch) => config.outlabels.merged_with(patch),
        None => Ok(config.outlabels.clone()),
    }
}

/// Draw the chart the way a host would (sectors first), then let the
/// label plugin run a full update and draw cycle on top.
pub fn render_chart<M: TextMeasure>(
    spec: &ChartSpec,
    config: &Config,
    measurer: M,
) -> Result<RenderOutput> {
    let options = chart_options(spec, config)?;
    let render = RenderConfig {
        width: spec.width.unwrap_or(config.render.width),
        height: spec.height.unwrap_or(config.render.height),
        cutout: spec.cutout.unwrap_or(config.render.cutout),
        ..config.render.clone()
    };
    let area = chart_area_for(render.width, render.height, render.padding);
    let sectors = spec.sectors();
    let arcs = compute_arcs(&sectors, &area, render.cutout);
    let frame = ChartFrame {
        id: spec.chart_id(),
        area,
        sectors,
        arcs,
    };

    let mut canvas = SvgCanvas::new(render.width, render.height);
    canvas.fill_background(&render.background);
    if let Some(title) = spec.title.as_deref() {
        let font = FontSpec {
            family: config.theme.font_family.clone(),
            size: config.theme.font_size * 1.5,
            weight: 700,
            ..FontSpec::default()
        };
        let at = Point::new(render.width / 2.0, (area.top / 3.0).max(font.size));
        canvas.push_title(title, at, &font, &config.theme.title_color);
    }
    draw_sectors(&mut canvas, &frame, &config.theme);

    let mut plugin = OutLabelsPlugin::new(measurer);
    plugin.before_init(&frame.id);
    plugin.before_dataset_update(&frame.id);
    plugin.after_dataset_update(&frame, &options);
    let report = plugin.after_dataset_draw(&frame, &options, &mut canvas);

    let dump = LayoutDump::from_labels(&frame, plugin.labels(&frame.id), report.as_ref());
    Ok(RenderOutput {
        svg: canvas.finish(),
        report,
        dump,
    })
}

pub fn render_chart_svg<M: TextMeasure>(spec: &ChartSpec, config: &Config, measurer: M) -> Result<String> {
    render_chart(spec, config, measurer).map(|output| output.svg)
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = config.theme.font_family.clone();
    opt.default_size = usvg::Size::from_wh(config.render.width, config.render.height)
        .unwrap_or(usvg::Size::from_wh(640.0, 480.0).unwrap());

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

pub fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
