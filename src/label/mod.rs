pub mod style;
pub mod template;

use thiserror::Error;

use crate::config::{DEFAULT_TEXT, OutLabelsOptions, TextAlign, TooltipConfig};
use crate::geometry::{Point, Rect, Size, rounded_rect_path};
use crate::ir::{ArcElement, ChartId};
use crate::layout::{HorizontalDirection, LabelGeometry};
use crate::render::{Canvas, TextAnchor};
use crate::text_metrics::{FontSpec, TextMeasure};
use crate::tooltip::Tooltip;

pub use style::LabelStyle;
pub use template::{display_lines, format_fixed, resolve_template, shorten_label};

const MARKER_SIZE: f32 = 8.0;

/// What a label knows about its sector when its text is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelContext {
    pub chart_id: ChartId,
    pub data_index: usize,
    pub label: String,
    pub value: f64,
    /// Share of the dataset total, `0.0..=1.0`.
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("label display is disabled for sector {index}")]
    DisplayDisabled { index: usize },
    #[error("no text to show for sector {index}")]
    NoText { index: usize },
}

/// One sector's callout: resolved text, measured block, style snapshot and,
/// once positioned, its geometry.
#[derive(Debug, Clone)]
pub struct OutLabel {
    pub index: usize,
    /// Full sector name.
    pub label: String,
    pub value: f64,
    pub percent: f64,
    /// Text after marker substitution, before line splitting.
    pub text: String,
    pub lines: Vec<String>,
    pub style: LabelStyle,
    pub length: f32,
    pub size: Size,
    geometry: Option<LabelGeometry>,
    tooltip: Option<Tooltip>,
}

impl OutLabel {
    pub fn new(
        index: usize,
        options: &OutLabelsOptions,
        context: &LabelContext,
        measurer: &dyn TextMeasure,
    ) -> Result<Self, LabelError> {
        if !options.display.resolve_or(index, false) {
            return Err(LabelError::DisplayDisabled { index });
        }

        let mut template = match &options.text_callback {
            Some(callback) => (callback.0)(context),
            None => options.text.resolve_or(index, String::new()),
        };
        if template.is_empty() {
            template = DEFAULT_TEXT.to_string();
        }
        let text = resolve_template(
            &template,
            context,
            options.value_precision,
            options.percent_precision,
        );
        let lines = display_lines(&text);
        if lines.is_empty() {
            return Err(LabelError::NoText { index });
        }

        let style = LabelStyle::resolve(options, index);
        let length = options.length.resolve_or(index, style::DEFAULT_LENGTH);
        let size = measure_block(&lines, &style, measurer);

        Ok(Self {
            index,
            label: context.label.clone(),
            value: context.value,
            percent: context.percent,
            text,
            lines,
            style,
            length,
            size,
            geometry: None,
            tooltip: None,
        })
    }

    /// Anchor the label on its sector's bisector. Replaces any geometry left
    /// over from an earlier frame.
    pub fn position_anchor(&mut self, arc: &ArcElement, center: Point) -> LabelGeometry {
        let geometry = LabelGeometry::place(
            self.index,
            arc,
            center,
            self.length,
            self.size,
            self.style.insets(),
        );
        self.geometry = Some(geometry);
        geometry
    }

    pub fn geometry(&self) -> Option<&LabelGeometry> {
        self.geometry.as_ref()
    }

    /// Take over geometry produced by a layout pass. The rectangle is
    /// recomputed from the anchor rather than trusted.
    pub fn set_geometry(&mut self, geometry: LabelGeometry) {
        self.geometry = Some(geometry.with_anchor(geometry.anchor));
    }

    pub fn compute_rect(&self) -> Option<Rect> {
        self.geometry.as_ref().map(LabelGeometry::compute_rect)
    }

    pub fn refresh_rect(&mut self) -> Option<Rect> {
        let geometry = self.geometry.as_mut()?;
        geometry.rect = geometry.compute_rect();
        Some(geometry.rect)
    }

    pub fn rect(&self) -> Option<Rect> {
        self.geometry.as_ref().map(|geometry| geometry.rect)
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        self.tooltip.as_ref()
    }

    pub fn tooltip_mut(&mut self) -> Option<&mut Tooltip> {
        self.tooltip.as_mut()
    }

    fn font_for_line(&self, line: usize) -> &FontSpec {
        if line == 0 && self.lines.len() > 1 {
            &self.style.first_line_font
        } else {
            &self.style.font
        }
    }

    pub fn draw_rect(&self, canvas: &mut dyn Canvas) {
        let Some(rect) = self.rect() else {
            return;
        };
        let path = rounded_rect_path(&rect, self.style.border_radius);
        let stroke = (self.style.border_width > 0.0 && !self.style.border_color.is_empty())
            .then(|| (self.style.border_color.as_str(), self.style.border_width));
        let fill = (!self.style.background_color.is_empty())
            .then_some(self.style.background_color.as_str());
        canvas.draw_path(&path, fill, stroke);
    }

    pub fn draw_text(&self, canvas: &mut dyn Canvas) {
        let Some(geometry) = self.geometry.as_ref() else {
            return;
        };
        if self.style.color.is_empty() {
            return;
        }
        let align = match self.style.text_align {
            TextAlign::Auto => match geometry.direction {
                HorizontalDirection::Left => TextAlign::Right,
                HorizontalDirection::Right => TextAlign::Left,
            },
            other => other,
        };
        let left = geometry.text_left();
        let (x, anchor) = match align {
            TextAlign::Center => (left + self.size.width / 2.0, TextAnchor::Middle),
            TextAlign::Right => (left + self.size.width, TextAnchor::End),
            _ => (left, TextAnchor::Start),
        };

        let mut top = geometry.anchor.y - self.size.height / 2.0;
        for (idx, line) in self.lines.iter().enumerate() {
            let font = self.font_for_line(idx);
            let advance = font.line_size();
            canvas.fill_text(
                line,
                Point::new(x, top + advance / 2.0),
                font,
                &self.style.color,
                anchor,
            );
            top += advance;
        }
    }

    pub fn draw_line(&self, canvas: &mut dyn Canvas) {
        let Some(geometry) = self.geometry.as_ref() else {
            return;
        };
        canvas.stroke_line(
            geometry.outer,
            geometry.anchor,
            &self.style.line_color,
            self.style.line_width,
        );
    }

    /// Small square next to the anchor, on the text side of the box edge.
    pub fn draw_marker(&self, canvas: &mut dyn Canvas) {
        let Some(geometry) = self.geometry.as_ref() else {
            return;
        };
        let x = match geometry.direction {
            HorizontalDirection::Left => geometry.anchor.x + 4.0,
            HorizontalDirection::Right => geometry.anchor.x - 12.0,
        };
        canvas.fill_rect(
            Rect::new(x, geometry.anchor.y - 5.0, MARKER_SIZE, MARKER_SIZE),
            &self.style.line_color,
        );
    }

    /// Box and text, creating the tooltip on first draw for long names and
    /// moving it to the current box afterwards.
    pub fn draw(
        &mut self,
        canvas: &mut dyn Canvas,
        tooltip: &TooltipConfig,
        measurer: &dyn TextMeasure,
    ) {
        let Some(rect) = self.refresh_rect() else {
            return;
        };
        match self.tooltip.as_mut() {
            Some(existing) => existing.update_region(rect),
            None if Tooltip::wanted_for(&self.label, tooltip) => {
                self.tooltip = Some(Tooltip::new(&self.label, rect, tooltip, measurer));
            }
            None => {}
        }

        canvas.begin_group(self.tooltip.as_ref().map(Tooltip::text));
        self.draw_rect(canvas);
        self.draw_text(canvas);
        canvas.end_group();
    }
}

/// Width of the widest line and the summed line advances. The first line
/// uses the first-line font only when there is more than one line.
pub fn measure_block(lines: &[String], style: &LabelStyle, measurer: &dyn TextMeasure) -> Size {
    let mut width = 0.0_f32;
    let mut height = 0.0_f32;
    for (idx, line) in lines.iter().enumerate() {
        let font = if idx == 0 && lines.len() > 1 {
            &style.first_line_font
        } else {
            &style.font
        };
        width = width.max(measurer.text_width(line, font));
        height += font.line_size();
    }
    Size::new(width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FontConfig, Scriptable, TextCallback};
    use crate::render::SvgCanvas;
    use crate::text_metrics::FastMetrics;

    /// Every char is 5px wide regardless of font.
    struct FixedWidth;

    impl TextMeasure for FixedWidth {
        fn text_width(&self, text: &str, _font: &FontSpec) -> f32 {
            text.chars().count() as f32 * 5.0
        }
    }

    fn context(index: usize, label: &str) -> LabelContext {
        LabelContext {
            chart_id: ChartId::new("test"),
            data_index: index,
            label: label.to_string(),
            value: 3.14159,
            percent: 0.256,
        }
    }

    fn arc_right() -> ArcElement {
        ArcElement {
            start_angle: -0.2,
            end_angle: 0.2,
            inner_radius: 50.0,
            outer_radius: 100.0,
        }
    }

    #[test]
    fn builds_lines_from_template() {
        let options = OutLabelsOptions {
            text: Scriptable::Value("%l\n%v.2 (%p.1)".into()),
            ..OutLabelsOptions::default()
        };
        let label = OutLabel::new(0, &options, &context(0, "Apples"), &FixedWidth).unwrap();
        assert_eq!(label.lines, vec!["Apples", "3.14 (25.6%)"]);
        assert_eq!(label.size.width, 12.0 * 5.0);
        assert!((label.size.height - 12.0 * 1.2 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn display_false_is_rejected() {
        let options = OutLabelsOptions {
            display: Scriptable::PerPoint(vec![Some(true), Some(false)]),
            ..OutLabelsOptions::default()
        };
        assert!(OutLabel::new(0, &options, &context(0, "A"), &FixedWidth).is_ok());
        assert_eq!(
            OutLabel::new(1, &options, &context(1, "B"), &FixedWidth).unwrap_err(),
            LabelError::DisplayDisabled { index: 1 }
        );
        assert_eq!(
            OutLabel::new(2, &options, &context(2, "C"), &FixedWidth).unwrap_err(),
            LabelError::DisplayDisabled { index: 2 }
        );
    }

    #[test]
    fn blank_text_is_no_text() {
        let options = OutLabelsOptions {
            text: Scriptable::Value(" \n \n".into()),
            ..OutLabelsOptions::default()
        };
        assert_eq!(
            OutLabel::new(4, &options, &context(4, "A"), &FixedWidth).unwrap_err(),
            LabelError::NoText { index: 4 }
        );
    }

    #[test]
    fn empty_template_falls_back_to_default() {
        let options = OutLabelsOptions {
            text: Scriptable::Value(String::new()),
            ..OutLabelsOptions::default()
        };
        let label = OutLabel::new(0, &options, &context(0, "Apples"), &FixedWidth).unwrap();
        assert_eq!(label.text, "Apples 25.6%");
    }

    #[test]
    fn callback_output_is_still_substituted() {
        let options = OutLabelsOptions {
            text_callback: Some(TextCallback::new(|ctx: &LabelContext| {
                format!("#{} %v.1", ctx.data_index)
            })),
            ..OutLabelsOptions::default()
        };
        let label = OutLabel::new(3, &options, &context(3, "A"), &FixedWidth).unwrap();
        assert_eq!(label.lines, vec!["#3 3.1"]);
    }

    #[test]
    fn first_line_font_sizes_only_multi_line_text() {
        let options = OutLabelsOptions {
            font: FontConfig {
                size: Some(10.0),
                ..FontConfig::default()
            },
            first_line_font: Some(FontConfig {
                size: Some(20.0),
                ..FontConfig::default()
            }),
            text: Scriptable::Value("%l".into()),
            ..OutLabelsOptions::default()
        };
        let single = OutLabel::new(0, &options, &context(0, "A"), &FixedWidth).unwrap();
        assert!((single.size.height - 12.0).abs() < 1e-4);

        let multi_options = OutLabelsOptions {
            text: Scriptable::Value("%l\n%l".into()),
            ..options
        };
        let multi = OutLabel::new(0, &multi_options, &context(0, "A"), &FixedWidth).unwrap();
        assert!((multi.size.height - 36.0).abs() < 1e-4);
    }

    #[test]
    fn rect_follows_anchor_and_insets() {
        let options = OutLabelsOptions {
            border_width: Scriptable::Value(1.0),
            text: Scriptable::Value("%l".into()),
            ..OutLabelsOptions::default()
        };
        let mut label = OutLabel::new(0, &options, &context(0, "Abc"), &FixedWidth).unwrap();
        assert!(label.rect().is_none());
        let geometry = label.position_anchor(&arc_right(), Point::new(0.0, 0.0));
        let rect = label.compute_rect().unwrap();
        assert_eq!(rect, geometry.rect);
        assert_eq!(rect.width, 15.0 + 2.0 * 4.0 + 2.0);
        assert!((rect.x - (geometry.anchor.x - 5.0)).abs() < 1e-4);
        assert_eq!(label.refresh_rect(), Some(rect));
    }

    #[test]
    fn set_geometry_recomputes_stale_rect() {
        let mut label =
            OutLabel::new(0, &OutLabelsOptions::default(), &context(0, "A"), &FixedWidth).unwrap();
        let mut geometry = label.position_anchor(&arc_right(), Point::new(0.0, 0.0));
        geometry.anchor.y += 30.0;
        label.set_geometry(geometry);
        assert_eq!(label.rect(), Some(geometry.compute_rect()));
    }

    #[test]
    fn draw_creates_tooltip_once_for_long_names() {
        let mut label = OutLabel::new(
            0,
            &OutLabelsOptions::default(),
            &context(0, "Strawberries"),
            &FastMetrics,
        )
        .unwrap();
        label.position_anchor(&arc_right(), Point::new(200.0, 200.0));
        let mut canvas = SvgCanvas::new(400.0, 400.0);
        let config = TooltipConfig::default();
        label.draw(&mut canvas, &config, &FastMetrics);
        let first_region = label.tooltip().unwrap().region();

        let mut geometry = *label.geometry().unwrap();
        geometry.anchor.y += 20.0;
        label.set_geometry(geometry);
        label.draw(&mut canvas, &config, &FastMetrics);
        let tooltip = label.tooltip().unwrap();
        assert_eq!(tooltip.text(), "Strawberries");
        assert!((tooltip.region().y - (first_region.y + 20.0)).abs() < 1e-3);

        let svg = canvas.finish();
        assert!(svg.contains("<title>Strawberries</title>"));
        assert!(svg.contains("Strawbe\u{2026} 25.6%"));
    }

    #[test]
    fn short_names_get_no_tooltip() {
        let mut label =
            OutLabel::new(0, &OutLabelsOptions::default(), &context(0, "Fig"), &FastMetrics)
                .unwrap();
        label.position_anchor(&arc_right(), Point::new(200.0, 200.0));
        let mut canvas = SvgCanvas::new(400.0, 400.0);
        label.draw(&mut canvas, &TooltipConfig::default(), &FastMetrics);
        assert!(label.tooltip().is_none());
    }

    #[test]
    fn marker_sits_on_text_side() {
        let options = OutLabelsOptions::default();
        let mut label = OutLabel::new(0, &options, &context(0, "A"), &FixedWidth).unwrap();
        let geometry = label.position_anchor(&arc_right(), Point::new(0.0, 0.0));
        let mut canvas = SvgCanvas::new(400.0, 400.0);
        label.draw_marker(&mut canvas);
        let svg = canvas.finish();
        let expected = format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"8.00\" height=\"8.00\"",
            geometry.anchor.x - 12.0,
            geometry.anchor.y - 5.0
        );
        assert!(svg.contains(&expected), "{svg}");
    }
}
