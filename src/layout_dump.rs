use crate::geometry::{Point, Rect};
use crate::ir::ChartFrame;
use crate::layout::{HorizontalDirection, LayoutReport, Quadrant};
use crate::registry::LabelSet;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutDump {
    pub chart: String,
    pub center: Point,
    pub outer_radius: f32,
    pub labels: Vec<LabelDump>,
    pub adjusted_quadrants: Vec<Quadrant>,
    pub fix_passes: usize,
    pub residual_overlaps: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelDump {
    pub index: usize,
    pub label: String,
    pub lines: Vec<String>,
    pub outer: Point,
    pub anchor: Point,
    pub direction: HorizontalDirection,
    pub rect: Rect,
    pub tooltip: Option<String>,
}

impl LayoutDump {
    pub fn from_labels(
        frame: &ChartFrame,
        labels: Option<&LabelSet>,
        report: Option<&LayoutReport>,
    ) -> Self {
        let labels = labels
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(|label| {
                let geometry = label.geometry()?;
                Some(LabelDump {
                    index: label.index,
                    label: label.label.clone(),
                    lines: label.lines.clone(),
                    outer: geometry.outer,
                    anchor: geometry.anchor,
                    direction: geometry.direction,
                    rect: geometry.rect,
                    tooltip: label.tooltip().map(|tooltip| tooltip.text().to_string()),
                })
            })
            .collect();

        LayoutDump {
            chart: frame.id.to_string(),
            center: frame.area.center(),
            outer_radius: frame
                .arcs
                .first()
                .map(|arc| arc.outer_radius)
                .unwrap_or(0.0),
            labels,
            adjusted_quadrants: report
                .map(|report| report.adjusted_quadrants.clone())
                .unwrap_or_default(),
            fix_passes: report.map(|report| report.fix_passes).unwrap_or(0),
            residual_overlaps: report.map(|report| report.residual_overlaps).unwrap_or(0),
        }
    }
}

pub fn write_layout_dump(path: &Path, dump: &LayoutDump) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, dump)?;
    Ok(())
}
