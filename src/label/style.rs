use crate::config::{OutLabelsOptions, Padding, TextAlign};
use crate::geometry::Insets;
use crate::text_metrics::FontSpec;

pub const DEFAULT_BACKGROUND: &str = "black";
pub const DEFAULT_BORDER_COLOR: &str = "black";
pub const DEFAULT_BORDER_RADIUS: f32 = 0.0;
pub const DEFAULT_BORDER_WIDTH: f32 = 0.0;
pub const DEFAULT_LINE_WIDTH: f32 = 2.0;
pub const DEFAULT_LINE_COLOR: &str = "black";
pub const DEFAULT_COLOR: &str = "white";
pub const DEFAULT_PADDING: f32 = 4.0;
pub const DEFAULT_LENGTH: f32 = 40.0;

/// Style snapshot taken when a label is built. Never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    pub background_color: String,
    pub border_color: String,
    pub border_radius: f32,
    pub border_width: f32,
    pub line_width: f32,
    pub line_color: String,
    pub color: String,
    pub font: FontSpec,
    pub first_line_font: FontSpec,
    pub padding: Insets,
    pub text_align: TextAlign,
}

impl LabelStyle {
    pub fn resolve(options: &OutLabelsOptions, index: usize) -> Self {
        let font = options.font.resolve(&FontSpec::default());
        let first_line_font = options
            .first_line_font
            .as_ref()
            .map(|config| config.resolve(&font))
            .unwrap_or_else(|| font.clone());

        let number = |value: f32| value.max(0.0);

        Self {
            background_color: options
                .background_color
                .resolve_or(index, DEFAULT_BACKGROUND.to_string()),
            border_color: options
                .border_color
                .resolve_or(index, DEFAULT_BORDER_COLOR.to_string()),
            border_radius: number(options.border_radius.resolve_or(index, DEFAULT_BORDER_RADIUS)),
            border_width: number(options.border_width.resolve_or(index, DEFAULT_BORDER_WIDTH)),
            line_width: number(options.line_width.resolve_or(index, DEFAULT_LINE_WIDTH)),
            line_color: options
                .line_color
                .resolve_or(index, DEFAULT_LINE_COLOR.to_string()),
            color: options.color.resolve_or(index, DEFAULT_COLOR.to_string()),
            font,
            first_line_font,
            padding: options
                .padding
                .resolve_or(index, Padding::Uniform(DEFAULT_PADDING))
                .to_insets(),
            text_align: options.text_align.resolve_or(index, TextAlign::Auto),
        }
    }

    /// Padding plus border on every side: the distance from the box edge
    /// to the text block.
    pub fn insets(&self) -> Insets {
        self.padding.grow(self.border_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FontConfig, Scriptable};

    #[test]
    fn per_point_values_override_and_fall_back() {
        let options = OutLabelsOptions {
            background_color: Scriptable::PerPoint(vec![Some("red".into()), None]),
            border_width: Scriptable::Value(2.0),
            ..OutLabelsOptions::default()
        };
        let first = LabelStyle::resolve(&options, 0);
        let second = LabelStyle::resolve(&options, 1);
        assert_eq!(first.background_color, "red");
        assert_eq!(second.background_color, DEFAULT_BACKGROUND);
        assert_eq!(second.border_width, 2.0);
        assert_eq!(second.insets().left, DEFAULT_PADDING + 2.0);
    }

    #[test]
    fn first_line_font_inherits_unset_fields() {
        let options = OutLabelsOptions {
            font: FontConfig {
                family: Some("Inter".into()),
                size: Some(10.0),
                ..FontConfig::default()
            },
            first_line_font: Some(FontConfig {
                size: Some(16.0),
                ..FontConfig::default()
            }),
            ..OutLabelsOptions::default()
        };
        let style = LabelStyle::resolve(&options, 0);
        assert_eq!(style.font.size, 10.0);
        assert_eq!(style.first_line_font.size, 16.0);
        assert_eq!(style.first_line_font.family, "Inter");
    }

    #[test]
    fn missing_first_line_font_reuses_primary() {
        let style = LabelStyle::resolve(&OutLabelsOptions::default(), 3);
        assert_eq!(style.font, style.first_line_font);
        assert_eq!(style.text_align, TextAlign::Auto);
    }
}
