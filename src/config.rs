use crate::geometry::Insets;
use crate::label::LabelContext;
use crate::label::style::{
    DEFAULT_BACKGROUND, DEFAULT_BORDER_COLOR, DEFAULT_BORDER_RADIUS, DEFAULT_BORDER_WIDTH,
    DEFAULT_COLOR, DEFAULT_LENGTH, DEFAULT_LINE_COLOR, DEFAULT_LINE_WIDTH, DEFAULT_PADDING,
};
use crate::text_metrics::{FontSpec, FontStyle};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// An option that is either one value for every sector or a per-sector list.
///
/// List entries that are `null` (or missing because the list is short)
/// resolve to nothing, letting the caller fall back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scriptable<T> {
    PerPoint(Vec<Option<T>>),
    Value(T),
}

impl<T> Scriptable<T> {
    pub fn resolve(&self, index: usize) -> Option<&T> {
        match self {
            Scriptable::Value(value) => Some(value),
            Scriptable::PerPoint(values) => values.get(index).and_then(|value| value.as_ref()),
        }
    }
}

impl<T: Clone> Scriptable<T> {
    /// Value for one sector, or `fallback` when the entry is unset.
    pub fn resolve_or(&self, index: usize, fallback: T) -> T {
        self.resolve(index).cloned().unwrap_or(fallback)
    }
}

impl<T> From<T> for Scriptable<T> {
    fn from(value: T) -> Self {
        Scriptable::Value(value)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Number(u16),
    Keyword(String),
}

impl FontWeight {
    pub fn to_numeric(&self) -> u16 {
        match self {
            FontWeight::Number(value) => (*value).clamp(1, 1000),
            FontWeight::Keyword(keyword) => match keyword.trim().to_ascii_lowercase().as_str() {
                "bold" | "bolder" => 700,
                "lighter" => 300,
                other => other.parse::<u16>().map(|v| v.clamp(1, 1000)).unwrap_or(400),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<FontStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f32>,
}

impl FontConfig {
    /// Fill unset fields from `base`, then from [`FontSpec::default`].
    pub fn resolve(&self, base: &FontSpec) -> FontSpec {
        FontSpec {
            family: self.family.clone().unwrap_or_else(|| base.family.clone()),
            size: self.size.filter(|s| *s > 0.0).unwrap_or(base.size),
            weight: self
                .weight
                .as_ref()
                .map(FontWeight::to_numeric)
                .unwrap_or(base.weight),
            style: self.style.unwrap_or(base.style),
            line_height: self
                .line_height
                .filter(|h| *h > 0.0)
                .unwrap_or(base.line_height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Padding {
    Uniform(f32),
    Sides {
        #[serde(default)]
        top: f32,
        #[serde(default)]
        right: f32,
        #[serde(default)]
        bottom: f32,
        #[serde(default)]
        left: f32,
    },
}

impl Padding {
    pub fn to_insets(&self) -> Insets {
        match *self {
            Padding::Uniform(value) => Insets::uniform(value),
            Padding::Sides {
                top,
                right,
                bottom,
                left,
            } => Insets {
                top,
                right,
                bottom,
                left,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Follow the label's direction: right-aligned when it points left.
    #[default]
    Auto,
    #[serde(alias = "start")]
    Left,
    Center,
    #[serde(alias = "end")]
    Right,
}

/// Computes label text directly from the sector context, bypassing the
/// template. The returned text still goes through marker substitution.
#[derive(Clone)]
pub struct TextCallback(pub Arc<dyn Fn(&LabelContext) -> String + Send + Sync>);

impl TextCallback {
    pub fn new(f: impl Fn(&LabelContext) -> String + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

impl fmt::Debug for TextCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TextCallback(..)")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TooltipConfig {
    pub min_width: f32,
    /// Accepted for compatibility; tooltips never hide on a timer.
    pub timeout_ms: u64,
    /// Tooltips are created for sector names longer than this many chars.
    pub label_length: usize,
    pub font: FontConfig,
    pub color: String,
    pub background_color: String,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            min_width: 150.0,
            timeout_ms: 300,
            label_length: 8,
            font: FontConfig {
                family: Some("Akrobat".to_string()),
                size: Some(14.0),
                ..FontConfig::default()
            },
            color: "#F59D24".to_string(),
            background_color: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutLabelsOptions {
    pub display: Scriptable<bool>,
    pub text: Scriptable<String>,
    #[serde(skip)]
    pub text_callback: Option<TextCallback>,
    pub value_precision: usize,
    pub percent_precision: usize,
    pub font: FontConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_line_font: Option<FontConfig>,
    pub background_color: Scriptable<String>,
    pub border_color: Scriptable<String>,
    pub border_width: Scriptable<f32>,
    pub border_radius: Scriptable<f32>,
    pub line_color: Scriptable<String>,
    pub line_width: Scriptable<f32>,
    pub color: Scriptable<String>,
    pub padding: Scriptable<Padding>,
    pub text_align: Scriptable<TextAlign>,
    pub length: Scriptable<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_prc_to_show: Option<f32>,
    pub avoid_overlap: bool,
    pub fix_label_positions: bool,
    /// Also re-project the top-left quadrant onto the label ellipse.
    pub recalculate_x: bool,
    pub fix_limit: usize,
    pub use_lines: bool,
    pub use_markers: bool,
    pub tooltip: TooltipConfig,
}

pub const DEFAULT_TEXT: &str = "%l %p";

impl Default for OutLabelsOptions {
    fn default() -> Self {
        Self {
            display: Scriptable::Value(true),
            text: Scriptable::Value(DEFAULT_TEXT.to_string()),
            text_callback: None,
            value_precision: 3,
            percent_precision: 1,
            font: FontConfig::default(),
            first_line_font: None,
            background_color: Scriptable::Value(DEFAULT_BACKGROUND.to_string()),
            border_color: Scriptable::Value(DEFAULT_BORDER_COLOR.to_string()),
            border_width: Scriptable::Value(DEFAULT_BORDER_WIDTH),
            border_radius: Scriptable::Value(DEFAULT_BORDER_RADIUS),
            line_color: Scriptable::Value(DEFAULT_LINE_COLOR.to_string()),
            line_width: Scriptable::Value(DEFAULT_LINE_WIDTH),
            color: Scriptable::Value(DEFAULT_COLOR.to_string()),
            padding: Scriptable::Value(Padding::Uniform(DEFAULT_PADDING)),
            text_align: Scriptable::Value(TextAlign::Auto),
            length: Scriptable::Value(DEFAULT_LENGTH),
            max_prc_to_show: None,
            avoid_overlap: true,
            fix_label_positions: true,
            recalculate_x: false,
            fix_limit: 100,
            use_lines: true,
            use_markers: false,
            tooltip: TooltipConfig::default(),
        }
    }
}

impl OutLabelsOptions {
    /// Overlay a JSON patch (camelCase keys) on top of these options.
    /// Objects merge key by key; any other value replaces the old one.
    pub fn merged_with(&self, patch: &serde_json::Value) -> anyhow::Result<Self> {
        let mut base = serde_json::to_value(self)?;
        merge_json(&mut base, patch);
        let mut merged: OutLabelsOptions = serde_json::from_value(base)?;
        merged.text_callback = self.text_callback.clone();
        Ok(merged)
    }
}

fn merge_json(base: &mut serde_json::Value, patch: &serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    /// Inset of the chart area from the canvas edge, leaving room for labels.
    pub padding: f32,
    /// Inner radius as a fraction of the outer radius (0 draws a pie).
    pub cutout: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640.0,
            height: 480.0,
            padding: 90.0,
            cutout: 0.5,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub outlabels: OutLabelsOptions,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        let theme = Theme::chartjs_default();
        let render = RenderConfig {
            background: theme.background.clone(),
            ..Default::default()
        };
        let outlabels = OutLabelsOptions {
            font: FontConfig {
                family: Some(theme.font_family.clone()),
                size: Some(theme.font_size),
                ..FontConfig::default()
            },
            ..OutLabelsOptions::default()
        };
        Self {
            theme,
            outlabels,
            render,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    title_color: Option<String>,
    sector_colors: Option<Vec<String>>,
    sector_border: Option<String>,
    sector_border_width: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    outlabels: Option<serde_json::Value>,
    render: Option<serde_json::Value>,
}

/// Parse JSON first and fall back to JSON5 so hand-written configs may use
/// comments and trailing commas.
pub fn parse_json_or_json5<T: serde::de::DeserializeOwned>(contents: &str) -> anyhow::Result<T> {
    match serde_json::from_str(contents) {
        Ok(value) => Ok(value),
        Err(json_err) => json5::from_str(contents)
            .map_err(|json5_err| anyhow::anyhow!("invalid config: {json_err}; as JSON5: {json5_err}")),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };
    let contents = std::fs::read_to_string(path)?;
    apply_config_str(config, &contents)
}

pub fn apply_config_str(mut config: Config, contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = parse_json_or_json5(contents)?;

    if let Some(theme_name) = parsed.theme.as_deref() {
        let theme = match theme_name {
            "modern" => Some(Theme::modern()),
            "default" | "chartjs" => Some(Theme::chartjs_default()),
            _ => None,
        };
        if let Some(theme) = theme {
            config.outlabels.font.family = Some(theme.font_family.clone());
            config.outlabels.font.size = Some(theme.font_size);
            config.render.background = theme.background.clone();
            config.theme = theme;
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.outlabels.font.family = Some(v.clone());
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.outlabels.font.size = Some(v);
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.render.background = v.clone();
            config.theme.background = v;
        }
        if let Some(v) = vars.title_color {
            config.theme.title_color = v;
        }
        if let Some(v) = vars.sector_colors
            && !v.is_empty()
        {
            config.theme.sector_colors = v;
        }
        if let Some(v) = vars.sector_border {
            config.theme.sector_border = v;
        }
        if let Some(v) = vars.sector_border_width {
            config.theme.sector_border_width = v;
        }
    }

    if let Some(patch) = parsed.outlabels {
        config.outlabels = config.outlabels.merged_with(&patch)?;
    }

    if let Some(patch) = parsed.render {
        let mut base = serde_json::to_value(&config.render)?;
        merge_json(&mut base, &patch);
        config.render = serde_json::from_value(base)?;
    }

    Ok(config)
}
