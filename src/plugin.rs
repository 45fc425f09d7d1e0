use tracing::{debug, warn};

use crate::config::{OutLabelsOptions, Scriptable};
use crate::geometry::Point;
use crate::ir::{ChartFrame, ChartId};
use crate::label::{LabelContext, OutLabel};
use crate::layout::{LayoutOptions, LayoutReport, resolve_overlaps};
use crate::registry::{ChartSessions, LabelSet};
use crate::render::Canvas;
use crate::text_metrics::TextMeasure;
use crate::tooltip::{PointerEvent, TooltipChange};

#[derive(Debug)]
pub struct OutLabelsPlugin<M: TextMeasure> {
    sessions: ChartSessions,
    measurer: M,
}

impl<M: TextMeasure> OutLabelsPlugin<M> {
    pub fn new(measurer: M) -> Self {
        Self {
            sessions: ChartSessions::new(),
            measurer,
        }
    }

    pub fn sessions(&self) -> &ChartSessions {
        &self.sessions
    }

    pub fn labels(&self, id: &ChartId) -> Option<&LabelSet> {
        self.sessions.get(id)
    }

    pub fn before_init(&mut self, id: &ChartId) {
        self.sessions.begin_session(id);
    }

    pub fn before_dataset_update(&mut self, id: &ChartId) {
        self.sessions.clear(id);
    }

    /// Build labels for the frame's sectors. Returns how many were stored.
    ///
    /// A sector gets a label when display resolves true for it, it is
    /// visible, it has an arc, and its share of the drawn circle does not
    /// exceed `max_prc_to_show`. Sectors whose label cannot be built are
    /// logged and skipped.
    pub fn after_dataset_update(&mut self, frame: &ChartFrame, options: &OutLabelsOptions) -> usize {
        if !self.sessions.contains(&frame.id) {
            debug!(chart = %frame.id, "no label session; skipping update");
            return 0;
        }

        let total_value = frame.total_value();
        let total_angle = frame.total_angle();
        let mut stored = 0;

        for (index, sector) in frame.sectors.iter().enumerate() {
            let Some(arc) = frame.arcs.get(index) else {
                continue;
            };
            if !sector.visible {
                continue;
            }
            let share = if total_angle > 0.0 {
                arc.span() / total_angle * 100.0
            } else {
                0.0
            };
            if let Some(max) = options.max_prc_to_show
                && share > max
            {
                debug!(chart = %frame.id, index, share, max, "sector share above maxPrcToShow");
                continue;
            }

            let context = LabelContext {
                chart_id: frame.id.clone(),
                data_index: index,
                label: sector.label.clone(),
                value: sector.value,
                percent: if total_value != 0.0 {
                    sector.value / total_value
                } else {
                    0.0
                },
            };
            match OutLabel::new(index, options, &context, &self.measurer) {
                Ok(label) => {
                    if self.sessions.put(&frame.id, label) {
                        stored += 1;
                    }
                }
                Err(err) => {
                    warn!(chart = %frame.id, index, "{err}");
                }
            }
        }
        stored
    }

    /// Anchor every stored label on its current arc, resolve overlaps and
    /// paint. Returns `None` when nothing was laid out.
    pub fn after_dataset_draw(
        &mut self,
        frame: &ChartFrame,
        options: &OutLabelsOptions,
        canvas: &mut dyn Canvas,
    ) -> Option<LayoutReport> {
        if matches!(options.display, Scriptable::Value(false)) {
            return None;
        }
        let set = self.sessions.get_mut(&frame.id)?;
        let center = frame.area.center();

        let mut placed = Vec::with_capacity(set.len());
        for label in set.iter_mut() {
            if let Some(arc) = frame.arcs.get(label.index) {
                placed.push(label.position_anchor(arc, center));
            }
        }

        let report = resolve_overlaps(&placed, center, &LayoutOptions::from(options));
        for geometry in &report.labels {
            if let Some(label) = set.get_mut(geometry.index) {
                label.set_geometry(*geometry);
            }
        }
        debug!(
            chart = %frame.id,
            labels = report.labels.len(),
            adjusted = ?report.adjusted_quadrants,
            fix_passes = report.fix_passes,
            residual = report.residual_overlaps,
            "outlabel layout"
        );
        if report.residual_overlaps > 0 {
            debug!(chart = %frame.id, residual = report.residual_overlaps, "labels still overlap");
        }

        for label in set.iter_mut() {
            if frame.arcs.get(label.index).is_none() {
                continue;
            }
            label.draw(canvas, &options.tooltip, &self.measurer);
            if options.use_lines {
                label.draw_line(canvas);
            }
            if options.use_markers {
                label.draw_marker(canvas);
            }
        }
        Some(report)
    }

    /// Forget the chart, its labels and their tooltips.
    pub fn destroy(&mut self, id: &ChartId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Route a pointer event to the tooltips of the chart's current labels.
    pub fn dispatch_pointer(
        &mut self,
        id: &ChartId,
        event: &PointerEvent,
        canvas_origin: Point,
    ) -> Vec<(usize, TooltipChange)> {
        let Some(set) = self.sessions.get_mut(id) else {
            return Vec::new();
        };
        set.iter_mut()
            .filter_map(|label| {
                let index = label.index;
                label
                    .tooltip_mut()?
                    .handle(event, canvas_origin)
                    .map(|change| (index, change))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ChartArea, Sector};
    use crate::layout::{chart_area_for, compute_arcs};
    use crate::render::SvgCanvas;
    use crate::text_metrics::FastMetrics;
    use std::sync::{Arc, Mutex};

    fn frame(names: &[&str], values: &[f64]) -> ChartFrame {
        let area: ChartArea = chart_area_for(600.0, 400.0, 80.0);
        let sectors: Vec<Sector> = names
            .iter()
            .zip(values)
            .map(|(name, value)| Sector {
                label: name.to_string(),
                value: *value,
                visible: true,
            })
            .collect();
        let arcs = compute_arcs(&sectors, &area, 0.5);
        ChartFrame {
            id: ChartId::new("chart-1"),
            area,
            sectors,
            arcs,
        }
    }

    fn plugin_with(frame: &ChartFrame, options: &OutLabelsOptions) -> OutLabelsPlugin<FastMetrics> {
        let mut plugin = OutLabelsPlugin::new(FastMetrics);
        plugin.before_init(&frame.id);
        plugin.before_dataset_update(&frame.id);
        plugin.after_dataset_update(frame, options);
        plugin
    }

    #[test]
    fn update_without_session_stores_nothing() {
        let frame = frame(&["A"], &[1.0]);
        let mut plugin = OutLabelsPlugin::new(FastMetrics);
        assert_eq!(plugin.after_dataset_update(&frame, &OutLabelsOptions::default()), 0);
    }

    #[test]
    fn hidden_and_disabled_sectors_are_skipped() {
        let mut frame = frame(&["A", "B", "C"], &[1.0, 1.0, 1.0]);
        frame.sectors[1].visible = false;
        let options = OutLabelsOptions {
            display: Scriptable::PerPoint(vec![Some(true), Some(true), Some(false)]),
            ..OutLabelsOptions::default()
        };
        let plugin = plugin_with(&frame, &options);
        let set = plugin.labels(&frame.id).unwrap();
        assert_eq!(set.indices().collect::<Vec<_>>(), vec![0]);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if let Ok(mut bytes) = self.0.lock() {
                bytes.extend_from_slice(buf);
            }
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn suppressed_sectors_are_logged_as_warnings() {
        let frame = frame(&["A", "B", "C"], &[1.0, 1.0, 1.0]);
        let options = OutLabelsOptions {
            display: Scriptable::PerPoint(vec![Some(true), Some(true), Some(false)]),
            ..OutLabelsOptions::default()
        };
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();
        let stored = tracing::subscriber::with_default(subscriber, || {
            let plugin = plugin_with(&frame, &options);
            plugin.labels(&frame.id).map(LabelSet::len)
        });
        assert_eq!(stored, Some(2));

        let output = String::from_utf8(log.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("label display is disabled for sector 2"), "{output}");
    }

    #[test]
    fn max_prc_to_show_hides_large_sectors() {
        let frame = frame(&["Big", "Small"], &[80.0, 20.0]);
        let options = OutLabelsOptions {
            max_prc_to_show: Some(50.0),
            ..OutLabelsOptions::default()
        };
        let plugin = plugin_with(&frame, &options);
        let set = plugin.labels(&frame.id).unwrap();
        assert!(set.get(0).is_none());
        assert!(set.get(1).is_some());
    }

    #[test]
    fn percent_is_share_of_value_total() {
        let frame = frame(&["A", "B"], &[1.0, 3.0]);
        let plugin = plugin_with(&frame, &OutLabelsOptions::default());
        let set = plugin.labels(&frame.id).unwrap();
        assert_eq!(set.get(1).unwrap().lines, vec!["B 75.0%"]);
    }

    #[test]
    fn draw_lays_out_and_writes_back_geometry() {
        let frame = frame(&["A", "B", "C", "D"], &[1.0, 1.0, 1.0, 1.0]);
        let options = OutLabelsOptions::default();
        let mut plugin = plugin_with(&frame, &options);
        let mut canvas = SvgCanvas::new(600.0, 400.0);
        let report = plugin.after_dataset_draw(&frame, &options, &mut canvas).unwrap();
        assert_eq!(report.labels.len(), 4);
        for geometry in &report.labels {
            let label = plugin.labels(&frame.id).unwrap().get(geometry.index).unwrap();
            assert_eq!(label.rect(), Some(geometry.compute_rect()));
        }
        let svg = canvas.finish();
        assert_eq!(svg.matches("<line ").count(), 4);
    }

    #[test]
    fn display_off_skips_draw() {
        let frame = frame(&["A"], &[1.0]);
        let options = OutLabelsOptions {
            display: Scriptable::Value(false),
            ..OutLabelsOptions::default()
        };
        let mut plugin = plugin_with(&frame, &options);
        let mut canvas = SvgCanvas::new(600.0, 400.0);
        assert!(plugin.after_dataset_draw(&frame, &options, &mut canvas).is_none());
    }

    #[test]
    fn tooltips_follow_registered_labels_only() {
        let frame = frame(&["Strawberries", "Kiwi"], &[1.0, 1.0]);
        let options = OutLabelsOptions::default();
        let mut plugin = plugin_with(&frame, &options);
        let mut canvas = SvgCanvas::new(600.0, 400.0);
        plugin.after_dataset_draw(&frame, &options, &mut canvas);

        let rect = plugin.labels(&frame.id).unwrap().get(0).unwrap().rect().unwrap();
        let inside = PointerEvent::Move(rect.center());
        let changes = plugin.dispatch_pointer(&frame.id, &inside, Point::default());
        assert_eq!(changes, vec![(0, TooltipChange::Shown(rect.center()))]);

        plugin.before_dataset_update(&frame.id);
        assert!(plugin.dispatch_pointer(&frame.id, &inside, Point::default()).is_empty());

        assert!(plugin.destroy(&frame.id));
        assert!(plugin.dispatch_pointer(&frame.id, &inside, Point::default()).is_empty());
        assert!(!plugin.destroy(&frame.id));
    }
}
