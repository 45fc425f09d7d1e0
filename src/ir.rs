use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Identity of one chart instance in the session registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChartId(pub String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ChartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding box the host reserves for the chart body (excluding labels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartArea {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl ChartArea {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            left: rect.x,
            top: rect.y,
            right: rect.right(),
            bottom: rect.bottom(),
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }
}

/// Geometry of one drawn sector. Angles are radians, clockwise from +x
/// in canvas space (y down), so `-PI/2` points straight up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcElement {
    pub start_angle: f32,
    pub end_angle: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
}

impl ArcElement {
    pub fn mid_angle(&self) -> f32 {
        (self.start_angle + self.end_angle) / 2.0
    }

    pub fn span(&self) -> f32 {
        (self.end_angle - self.start_angle).abs()
    }
}

/// One sector's data as seen by the label builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Sector {
    pub label: String,
    pub value: f64,
    pub visible: bool,
}

/// What the host hands the label plugin for one frame.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub id: ChartId,
    pub area: ChartArea,
    pub sectors: Vec<Sector>,
    pub arcs: Vec<ArcElement>,
}

impl ChartFrame {
    pub fn total_value(&self) -> f64 {
        self.sectors.iter().map(|sector| sector.value).sum()
    }

    pub fn total_angle(&self) -> f32 {
        self.arcs.iter().map(ArcElement::span).sum()
    }
}

/// Chart description read from disk: data plus optional per-chart options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    /// Indices of sectors hidden by the host (e.g. toggled off in a legend).
    #[serde(default)]
    pub hidden: Vec<usize>,
    /// Per-chart canvas size and ring thickness; unset values use the config.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutout: Option<f32>,
    /// Raw outlabel option overrides, merged over the configured options.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl ChartSpec {
    pub fn sectors(&self) -> Vec<Sector> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, value)| Sector {
                label: self.labels.get(idx).cloned().unwrap_or_default(),
                value: *value,
                visible: !self.hidden.contains(&idx),
            })
            .collect()
    }

    pub fn chart_id(&self) -> ChartId {
        ChartId::new(self.id.clone().unwrap_or_else(|| "chart".to_string()))
    }
}
