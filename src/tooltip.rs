use std::time::Duration;

use crate::config::TooltipConfig;
use crate::geometry::{Point, Rect};
use crate::text_metrics::{FontSpec, TextMeasure};

/// Horizontal room around the measured text.
const TEXT_ALLOWANCE: f32 = 30.0;
const OVERLAY_PADDING: f32 = 7.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    /// Pointer moved; page (client) coordinates.
    Move(Point),
    Click(Point),
    /// The page scrolled; carries no position.
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TooltipChange {
    Shown(Point),
    Moved(Point),
    Hidden,
}

#[derive(Debug, Clone)]
pub struct Tooltip {
    text: String,
    region: Rect,
    width: f32,
    timeout: Duration,
    font: FontSpec,
    color: String,
    background: String,
    visible: bool,
    position: Point,
}

impl Tooltip {
    /// Tooltips exist only for names longer than the configured length.
    pub fn wanted_for(label: &str, config: &TooltipConfig) -> bool {
        label.chars().count() > config.label_length
    }

    pub fn new(
        text: &str,
        region: Rect,
        config: &TooltipConfig,
        measurer: &dyn TextMeasure,
    ) -> Self {
        let font = config.font.resolve(&FontSpec::default());
        let width = (measurer.text_width(text, &font) + TEXT_ALLOWANCE).max(config.min_width);
        Self {
            text: text.to_string(),
            region,
            width,
            timeout: Duration::from_millis(config.timeout_ms),
            font,
            color: config.color.clone(),
            background: config.background_color.clone(),
            visible: false,
            position: Point::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Stored for hosts that want it; visibility never changes on a timer.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn position(&self) -> Point {
        self.position
    }

    /// Track the label box after a new layout pass. Visibility is kept.
    pub fn update_region(&mut self, region: Rect) {
        self.region = region;
    }

    /// Feed one pointer event. `canvas_origin` is the canvas's top-left
    /// corner in page coordinates; hit-testing happens in canvas space,
    /// while the overlay is positioned in page space.
    pub fn handle(&mut self, event: &PointerEvent, canvas_origin: Point) -> Option<TooltipChange> {
        let pointer = match *event {
            PointerEvent::Move(point) | PointerEvent::Click(point) => Some(point),
            PointerEvent::Scroll => None,
        };
        let inside = pointer.is_some_and(|page| {
            self.region
                .contains(Point::new(page.x - canvas_origin.x, page.y - canvas_origin.y))
        });

        match (self.visible, inside, pointer) {
            (false, true, Some(page)) => {
                self.visible = true;
                self.position = clamp_to_page(page);
                Some(TooltipChange::Shown(self.position))
            }
            (true, true, Some(page)) => {
                self.position = clamp_to_page(page);
                Some(TooltipChange::Moved(self.position))
            }
            (true, false, _) => {
                self.visible = false;
                Some(TooltipChange::Hidden)
            }
            _ => None,
        }
    }

    /// Inline CSS for an HTML overlay element.
    pub fn overlay_style(&self) -> String {
        let mut style = format!(
            "position: fixed; padding: {OVERLAY_PADDING}px; font-size: {}px; font-family: '{}'; color: {}; border-radius: 60px; background-color: {}; box-shadow: 0px 4px 4px 0px #00000040; pointer-events: none; width: {}px",
            self.font.size, self.font.family, self.color, self.background, self.width
        );
        if self.visible {
            style.push_str(&format!(
                "; left: {}px; top: {}px",
                self.position.x, self.position.y
            ));
        }
        style
    }
}

fn clamp_to_page(point: Point) -> Point {
    Point::new(point.x.max(0.0), point.y.max(0.0))
}
