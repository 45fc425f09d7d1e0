// Label layout and overlap resolution.
//
// Every pass takes the current geometry by reference and returns new
// geometry; nothing here touches labels, styles or the canvas. The plugin
// writes the final values back into its labels before drawing.

pub mod arcs;
mod relax;
mod resolve;

use serde::Serialize;

use crate::config::OutLabelsOptions;
use crate::geometry::{Insets, Point, Rect, Size, rects_intersect};
use crate::ir::ArcElement;

pub use arcs::{chart_area_for, compute_arcs};
pub use relax::{AvoidOutcome, Relaxed, avoid_overlap, relax_vertical, reproject_x};
pub use resolve::{FixOutcome, fix_label_positions, topmost_conflict};

/// Horizontal components smaller than this count as pointing straight
/// up or down.
const DIRECTION_EPS: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalDirection {
    Left,
    Right,
}

impl HorizontalDirection {
    /// Sign of the bisector's horizontal component; vertical bisectors
    /// resolve to `Right`.
    pub fn from_component(nx: f32) -> Self {
        if nx < -DIRECTION_EPS {
            HorizontalDirection::Left
        } else {
            HorizontalDirection::Right
        }
    }

    pub fn sign(self) -> f32 {
        match self {
            HorizontalDirection::Left => -1.0,
            HorizontalDirection::Right => 1.0,
        }
    }
}

/// Placement of one label: where its leader line starts, where the box is
/// anchored and the box itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelGeometry {
    pub index: usize,
    /// Point on the sector's outer radius along the bisector.
    pub outer: Point,
    pub anchor: Point,
    pub direction: HorizontalDirection,
    /// Measured text block.
    pub size: Size,
    /// Padding plus border width.
    pub insets: Insets,
    pub length: f32,
    pub outer_radius: f32,
    pub rect: Rect,
}

impl LabelGeometry {
    /// Project the sector bisector outward: first onto the outer radius,
    /// then `length` further.
    pub fn place(
        index: usize,
        arc: &ArcElement,
        center: Point,
        length: f32,
        size: Size,
        insets: Insets,
    ) -> Self {
        let mid = arc.mid_angle();
        let (ny, nx) = mid.sin_cos();
        let r = arc.outer_radius;
        let outer = Point::new(center.x + r * nx, center.y + r * ny);
        let anchor = Point::new(outer.x + nx * length, outer.y + ny * length);
        let mut geometry = Self {
            index,
            outer,
            anchor,
            direction: HorizontalDirection::from_component(nx),
            size,
            insets,
            length,
            outer_radius: r,
            rect: Rect::default(),
        };
        geometry.rect = geometry.compute_rect();
        geometry
    }

    /// Box around the text block. Left-pointing labels grow leftward from
    /// the anchor; the block is centred vertically on it.
    pub fn compute_rect(&self) -> Rect {
        let flip = match self.direction {
            HorizontalDirection::Left => -self.size.width,
            HorizontalDirection::Right => 0.0,
        };
        Rect::new(
            self.anchor.x + flip - self.insets.left,
            self.anchor.y - self.size.height / 2.0 - self.insets.top,
            self.size.width + self.insets.horizontal(),
            self.size.height + self.insets.vertical(),
        )
    }

    /// Same label moved to `anchor`, with its rectangle recomputed.
    pub fn with_anchor(&self, anchor: Point) -> Self {
        let mut moved = Self { anchor, ..*self };
        moved.rect = moved.compute_rect();
        moved
    }

    /// Horizontal radius of the ellipse the anchor started on.
    pub fn semi_major(&self) -> f32 {
        self.outer_radius + self.length
    }

    /// Left edge of the text block inside the box.
    pub fn text_left(&self) -> f32 {
        match self.direction {
            HorizontalDirection::Left => self.anchor.x - self.size.width,
            HorizontalDirection::Right => self.anchor.x,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Points on the vertical centre line belong to the right half, points
    /// on the horizontal one to the bottom half.
    pub fn of(point: Point, center: Point) -> Self {
        match (point.x < center.x, point.y < center.y) {
            (true, true) => Quadrant::TopLeft,
            (true, false) => Quadrant::BottomLeft,
            (false, true) => Quadrant::TopRight,
            (false, false) => Quadrant::BottomRight,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quadrants {
    pub top_left: Vec<LabelGeometry>,
    pub top_right: Vec<LabelGeometry>,
    pub bottom_left: Vec<LabelGeometry>,
    pub bottom_right: Vec<LabelGeometry>,
}

impl Quadrants {
    pub fn get(&self, quadrant: Quadrant) -> &[LabelGeometry] {
        match quadrant {
            Quadrant::TopLeft => &self.top_left,
            Quadrant::TopRight => &self.top_right,
            Quadrant::BottomLeft => &self.bottom_left,
            Quadrant::BottomRight => &self.bottom_right,
        }
    }

    fn get_mut(&mut self, quadrant: Quadrant) -> &mut Vec<LabelGeometry> {
        match quadrant {
            Quadrant::TopLeft => &mut self.top_left,
            Quadrant::TopRight => &mut self.top_right,
            Quadrant::BottomLeft => &mut self.bottom_left,
            Quadrant::BottomRight => &mut self.bottom_right,
        }
    }
}

/// Group labels by the position of their anchor relative to `center`,
/// keeping input order inside each group.
pub fn partition(labels: &[LabelGeometry], center: Point) -> Quadrants {
    let mut quadrants = Quadrants::default();
    for label in labels {
        quadrants
            .get_mut(Quadrant::of(label.anchor, center))
            .push(*label);
    }
    quadrants
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutOptions {
    pub avoid_overlap: bool,
    pub fix_label_positions: bool,
    pub recalculate_x: bool,
    pub fix_limit: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            avoid_overlap: true,
            fix_label_positions: true,
            recalculate_x: false,
            fix_limit: 100,
        }
    }
}

impl From<&OutLabelsOptions> for LayoutOptions {
    fn from(options: &OutLabelsOptions) -> Self {
        Self {
            avoid_overlap: options.avoid_overlap,
            fix_label_positions: options.fix_label_positions,
            recalculate_x: options.recalculate_x,
            fix_limit: options.fix_limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    /// Final geometry, in input order.
    pub labels: Vec<LabelGeometry>,
    pub adjusted_quadrants: Vec<Quadrant>,
    /// Conflict scans run by the pairwise fix; 0 when it is disabled.
    pub fix_passes: usize,
    pub residual_overlaps: usize,
}

/// Run the enabled passes in order: quadrant relaxation, then the bounded
/// pairwise fix. Never fails; leftover overlaps are only counted.
pub fn resolve_overlaps(
    labels: &[LabelGeometry],
    center: Point,
    options: &LayoutOptions,
) -> LayoutReport {
    let mut current = labels.to_vec();
    let mut adjusted_quadrants = Vec::new();

    if options.avoid_overlap {
        let outcome = avoid_overlap(&current, center, options.recalculate_x);
        current = outcome.labels;
        adjusted_quadrants = outcome.adjusted;
    }

    let mut fix_passes = 0;
    if options.fix_label_positions {
        let outcome = fix_label_positions(&current, center, options.fix_limit);
        current = outcome.labels;
        fix_passes = outcome.passes;
    }

    let residual_overlaps = count_overlaps(&current);
    LayoutReport {
        labels: current,
        adjusted_quadrants,
        fix_passes,
        residual_overlaps,
    }
}

/// Number of unordered label pairs whose rectangles intersect.
pub fn count_overlaps(labels: &[LabelGeometry]) -> usize {
    let mut count = 0;
    for (i, a) in labels.iter().enumerate() {
        for b in &labels[i + 1..] {
            if rects_intersect(&a.rect, &b.rect) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Geometry anchored directly at `anchor`, no leader offset.
    pub fn label_at(index: usize, anchor: Point, width: f32, height: f32) -> LabelGeometry {
        let direction = HorizontalDirection::Right;
        let mut geometry = LabelGeometry {
            index,
            outer: anchor,
            anchor,
            direction,
            size: Size::new(width, height),
            insets: Insets::uniform(2.0),
            length: 40.0,
            outer_radius: 100.0,
            rect: Rect::default(),
        };
        geometry.rect = geometry.compute_rect();
        geometry
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::label_at;
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn arc(start: f32, end: f32) -> ArcElement {
        ArcElement {
            start_angle: start,
            end_angle: end,
            inner_radius: 50.0,
            outer_radius: 100.0,
        }
    }

    #[test]
    fn place_projects_along_bisector() {
        let center = Point::new(200.0, 200.0);
        let g = LabelGeometry::place(
            0,
            &arc(-0.25, 0.25),
            center,
            40.0,
            Size::new(30.0, 12.0),
            Insets::uniform(4.0),
        );
        assert!((g.outer.x - 300.0).abs() < 1e-3);
        assert!((g.anchor.x - 340.0).abs() < 1e-3);
        assert!((g.anchor.y - 200.0).abs() < 1e-3);
        assert_eq!(g.direction, HorizontalDirection::Right);
        assert_eq!(g.rect, Rect::new(g.anchor.x - 4.0, g.anchor.y - 10.0, 38.0, 20.0));
    }

    #[test]
    fn left_pointing_rect_grows_leftward() {
        let center = Point::new(0.0, 0.0);
        let g = LabelGeometry::place(
            1,
            &arc(PI - 0.1, PI + 0.1),
            center,
            40.0,
            Size::new(30.0, 12.0),
            Insets::uniform(4.0),
        );
        assert_eq!(g.direction, HorizontalDirection::Left);
        assert!((g.rect.x - (g.anchor.x - 34.0)).abs() < 1e-4);
        assert!((g.rect.right() - (g.anchor.x + 4.0)).abs() < 1e-4);
    }

    #[test]
    fn vertical_bisector_points_right() {
        let g = LabelGeometry::place(
            0,
            &arc(-FRAC_PI_2 - 0.2, -FRAC_PI_2 + 0.2),
            Point::new(0.0, 0.0),
            10.0,
            Size::new(10.0, 10.0),
            Insets::default(),
        );
        assert_eq!(g.direction, HorizontalDirection::Right);
        assert!(g.anchor.y < -100.0);
    }

    #[test]
    fn compute_rect_is_idempotent() {
        let g = label_at(0, Point::new(12.5, 40.25), 33.3, 14.4);
        assert_eq!(g.compute_rect(), g.compute_rect());
        assert_eq!(g.compute_rect(), g.rect);
        let moved = g.with_anchor(Point::new(20.0, 60.0));
        assert_eq!(moved.rect, moved.compute_rect());
        assert_ne!(moved.rect, g.rect);
    }

    #[test]
    fn partition_splits_by_center() {
        let center = Point::new(100.0, 100.0);
        let labels = vec![
            label_at(0, Point::new(50.0, 50.0), 10.0, 10.0),
            label_at(1, Point::new(150.0, 50.0), 10.0, 10.0),
            label_at(2, Point::new(50.0, 150.0), 10.0, 10.0),
            label_at(3, Point::new(150.0, 150.0), 10.0, 10.0),
            label_at(4, Point::new(100.0, 100.0), 10.0, 10.0),
        ];
        let q = partition(&labels, center);
        assert_eq!(q.top_left.len(), 1);
        assert_eq!(q.top_right.len(), 1);
        assert_eq!(q.bottom_left.len(), 1);
        assert_eq!(q.bottom_right.len(), 2);
        assert_eq!(q.get(Quadrant::BottomRight)[1].index, 4);
    }

    #[test]
    fn disabled_passes_leave_geometry_untouched() {
        let labels = vec![
            label_at(0, Point::new(150.0, 50.0), 40.0, 12.0),
            label_at(1, Point::new(150.0, 50.0), 40.0, 12.0),
        ];
        let options = LayoutOptions {
            avoid_overlap: false,
            fix_label_positions: false,
            ..LayoutOptions::default()
        };
        let report = resolve_overlaps(&labels, Point::new(100.0, 100.0), &options);
        assert_eq!(report.labels, labels);
        assert_eq!(report.fix_passes, 0);
        assert_eq!(report.residual_overlaps, 1);
    }
}
