use std::f32::consts::{FRAC_PI_2, PI};

use crate::geometry::Rect;
use crate::ir::{ArcElement, ChartArea, Sector};

/// Chart body inside a `width` x `height` canvas, inset by `padding` on
/// every side (never smaller than one pixel).
pub fn chart_area_for(width: f32, height: f32, padding: f32) -> ChartArea {
    let padding = padding.max(0.0);
    let w = (width - padding * 2.0).max(1.0);
    let h = (height - padding * 2.0).max(1.0);
    ChartArea::from_rect(Rect::new(
        (width - w) / 2.0,
        (height - h) / 2.0,
        w,
        h,
    ))
}

/// Sector geometry as a doughnut chart draws it: starting at the top and
/// running clockwise, each visible sector's span proportional to its value.
/// Hidden sectors get a zero span at their position.
pub fn compute_arcs(sectors: &[Sector], area: &ChartArea, cutout: f32) -> Vec<ArcElement> {
    let outer_radius = (area.width().min(area.height()) / 2.0).max(0.0);
    let inner_radius = outer_radius * cutout.clamp(0.0, 1.0);

    let weight = |sector: &Sector| -> f32 {
        if sector.visible {
            (sector.value as f32).max(0.0)
        } else {
            0.0
        }
    };
    let total: f32 = sectors.iter().map(weight).sum();
    let visible = sectors.iter().filter(|sector| sector.visible).count().max(1) as f32;

    let mut angle = -FRAC_PI_2;
    let mut arcs = Vec::with_capacity(sectors.len());
    for sector in sectors {
        let span = if !sector.visible {
            0.0
        } else if total > 0.0 {
            weight(sector) / total * PI * 2.0
        } else {
            PI * 2.0 / visible
        };
        arcs.push(ArcElement {
            start_angle: angle,
            end_angle: angle + span,
            inner_radius,
            outer_radius,
        });
        angle += span;
    }
    arcs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sector(value: f64, visible: bool) -> Sector {
        Sector {
            label: String::new(),
            value,
            visible,
        }
    }

    #[test]
    fn spans_follow_values_clockwise_from_top() {
        let area = chart_area_for(400.0, 300.0, 50.0);
        assert_eq!(area.width(), 300.0);
        assert_eq!(area.height(), 200.0);
        let arcs = compute_arcs(&[sector(1.0, true), sector(3.0, true)], &area, 0.5);
        assert_eq!(arcs[0].start_angle, -FRAC_PI_2);
        assert!((arcs[0].span() - PI / 2.0).abs() < 1e-5);
        assert!((arcs[1].end_angle - (PI * 1.5)).abs() < 1e-5);
        assert_eq!(arcs[0].outer_radius, 100.0);
        assert_eq!(arcs[0].inner_radius, 50.0);
    }

    #[test]
    fn hidden_sectors_have_zero_span() {
        let area = chart_area_for(200.0, 200.0, 0.0);
        let arcs = compute_arcs(
            &[sector(1.0, true), sector(5.0, false), sector(1.0, true)],
            &area,
            0.0,
        );
        assert_eq!(arcs[1].span(), 0.0);
        assert!((arcs[0].span() - PI).abs() < 1e-5);
        assert_eq!(arcs[1].start_angle, arcs[1].end_angle);
    }

    #[test]
    fn all_zero_values_split_evenly() {
        let area = chart_area_for(200.0, 200.0, 10.0);
        let arcs = compute_arcs(&[sector(0.0, true), sector(0.0, true)], &area, 0.5);
        assert!((arcs[0].span() - PI).abs() < 1e-5);
        assert!((arcs[1].span() - PI).abs() < 1e-5);
    }
}
