use super::LabelGeometry;
use crate::geometry::{Point, intersecting_rect, rects_intersect};

/// Share of the overlap height removed by one nudge.
const VERTICAL_NUDGE: f32 = 0.9;
/// Share of the overlap width the upper label moves away from the centre.
const HORIZONTAL_NUDGE: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct FixOutcome {
    pub labels: Vec<LabelGeometry>,
    /// Conflict scans run, including the final one that found nothing.
    pub passes: usize,
    pub residual: usize,
}

/// Positions `(upper, lower)` of the intersecting pair whose upper label
/// has the smallest anchor `y`. Ties keep the first pair found.
pub fn topmost_conflict(labels: &[LabelGeometry]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for i in 0..labels.len() {
        for j in i + 1..labels.len() {
            if !rects_intersect(&labels[i].rect, &labels[j].rect) {
                continue;
            }
            let pair = if labels[i].anchor.y <= labels[j].anchor.y {
                (i, j)
            } else {
                (j, i)
            };
            let better = match best {
                None => true,
                Some((upper, _)) => labels[pair.0].anchor.y < labels[upper].anchor.y,
            };
            if better {
                best = Some(pair);
            }
        }
    }
    best
}

fn nudge(labels: &mut [LabelGeometry], upper: usize, lower: usize, center: Point) {
    let Some(overlap) = intersecting_rect(&labels[upper].rect, &labels[lower].rect) else {
        return;
    };
    let dy = overlap.height * VERTICAL_NUDGE;
    let dx = overlap.width * HORIZONTAL_NUDGE;
    let high = labels[upper];
    let in_top_half = high.anchor.y < center.y;
    let outward = if high.anchor.x < center.x { -dx } else { dx };

    if in_top_half {
        labels[upper] = high.with_anchor(Point::new(high.anchor.x + outward, high.anchor.y - dy));
    } else {
        let low = labels[lower];
        labels[lower] = low.with_anchor(Point::new(low.anchor.x, low.anchor.y + dy));
        labels[upper] = high.with_anchor(Point::new(high.anchor.x + outward, high.anchor.y));
    }
}

/// Repeatedly nudge the topmost conflicting pair apart, for at most
/// `limit` passes. Residual overlap after the last pass is accepted.
pub fn fix_label_positions(labels: &[LabelGeometry], center: Point, limit: usize) -> FixOutcome {
    let limit = limit.max(1);
    let mut labels = labels.to_vec();
    let mut passes = 0;

    loop {
        passes += 1;
        let Some((upper, lower)) = topmost_conflict(&labels) else {
            break;
        };
        nudge(&mut labels, upper, lower, center);
        if passes >= limit {
            break;
        }
    }

    let residual = super::count_overlaps(&labels);
    FixOutcome {
        labels,
        passes,
        residual,
    }
}
