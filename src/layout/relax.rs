use std::cmp::Ordering;
use std::collections::HashMap;

use super::{LabelGeometry, Quadrant, partition};
use crate::geometry::Point;

#[derive(Debug, Clone, PartialEq)]
pub struct Relaxed {
    /// Labels of the quadrant sorted by their original top edge.
    pub labels: Vec<LabelGeometry>,
    pub adjusted: bool,
}

/// Sweep the quadrant top to bottom, pushing each label below the previous
/// one, then shift the whole group back up by the mean push.
///
/// Quadrants with fewer than two labels are returned unchanged.
pub fn relax_vertical(labels: Vec<LabelGeometry>) -> Relaxed {
    if labels.len() < 2 {
        return Relaxed {
            labels,
            adjusted: false,
        };
    }

    let mut sorted = labels;
    sorted.sort_by(|a, b| a.rect.y.partial_cmp(&b.rect.y).unwrap_or(Ordering::Equal));

    // The band above y = 0 counts as taken, so a label poking out of the
    // canvas top is pushed down like any other.
    let mut last_bottom = 0.0_f32;
    let mut total_shift = 0.0_f32;
    let mut adjusted = false;
    for label in sorted.iter_mut() {
        let delta = label.rect.y - last_bottom;
        if delta < 0.0 {
            *label = label.with_anchor(Point::new(label.anchor.x, label.anchor.y - delta));
            total_shift -= delta;
            adjusted = true;
        }
        last_bottom = label.rect.bottom();
    }

    if total_shift > 0.0 {
        let back = total_shift / sorted.len() as f32;
        for label in sorted.iter_mut() {
            *label = label.with_anchor(Point::new(label.anchor.x, label.anchor.y - back));
        }
    }

    Relaxed {
        labels: sorted,
        adjusted,
    }
}

/// Move each anchor horizontally onto the ellipse through the label
/// farthest from the centre line, keeping `y` and the side of the chart.
///
/// The horizontal radius of a label is `outer_radius + length`; the
/// vertical one is fitted to the farthest label. Degenerate fits (all
/// labels on the centre line) leave the quadrant unchanged.
pub fn reproject_x(labels: &[LabelGeometry], center: Point) -> Vec<LabelGeometry> {
    let mut max_dy = 0.0_f32;
    let mut semi_minor = 0.0_f32;
    for label in labels {
        let dy = (label.anchor.y - center.y).abs();
        if dy > max_dy {
            let dx = label.anchor.x - center.x;
            let semi_major = label.semi_major();
            semi_minor = if dx.abs() < semi_major {
                (dy * dy / (1.0 - dx * dx / (semi_major * semi_major))).sqrt()
            } else {
                semi_major
            };
            max_dy = dy;
        }
    }

    if !semi_minor.is_finite() || semi_minor <= 0.0 {
        return labels.to_vec();
    }

    let semi_minor_sq = semi_minor * semi_minor;
    labels
        .iter()
        .map(|label| {
            let dy = (label.anchor.y - center.y).abs();
            let semi_major = label.semi_major();
            let dx = ((1.0 - dy * dy / semi_minor_sq) * semi_major * semi_major)
                .abs()
                .sqrt();
            label.with_anchor(Point::new(
                center.x + label.direction.sign() * dx,
                label.anchor.y,
            ))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct AvoidOutcome {
    /// Same labels as the input, in input order.
    pub labels: Vec<LabelGeometry>,
    pub adjusted: Vec<Quadrant>,
}

/// Relax every quadrant independently. A quadrant that moved is also
/// re-projected onto its ellipse; the top-left one only when
/// `recalculate_x` is set.
pub fn avoid_overlap(labels: &[LabelGeometry], center: Point, recalculate_x: bool) -> AvoidOutcome {
    let quadrants = partition(labels, center);
    let mut moved: HashMap<usize, LabelGeometry> = HashMap::new();
    let mut adjusted = Vec::new();

    for quadrant in Quadrant::ALL {
        let relaxed = relax_vertical(quadrants.get(quadrant).to_vec());
        let mut group = relaxed.labels;
        if relaxed.adjusted {
            adjusted.push(quadrant);
            if quadrant != Quadrant::TopLeft || recalculate_x {
                group = reproject_x(&group, center);
            }
        }
        moved.extend(group.into_iter().map(|label| (label.index, label)));
    }

    let labels = labels
        .iter()
        .map(|label| moved.get(&label.index).copied().unwrap_or(*label))
        .collect();
    AvoidOutcome { labels, adjusted }
}
