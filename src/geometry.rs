use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in canvas space (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Half-open containment: `[x, x + w) x [y, y + h)`.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// Space between the text block and the outer edge of a label box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Insets {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Insets {
    pub fn uniform(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }

    /// Grow every side by `amount` (used to fold a border into padding).
    pub fn grow(&self, amount: f32) -> Self {
        Self {
            top: self.top + amount,
            right: self.right + amount,
            bottom: self.bottom + amount,
            left: self.left + amount,
        }
    }
}

/// Two rectangles intersect unless one lies entirely to one side of the
/// other. Rectangles that only share an edge do not intersect; identical
/// ones always do, even with zero area.
pub fn rects_intersect(a: &Rect, b: &Rect) -> bool {
    a == b || !(a.right() <= b.x || b.right() <= a.x || a.bottom() <= b.y || b.bottom() <= a.y)
}

/// Overlap region of two rectangles, or `None` when they do not intersect.
pub fn intersecting_rect(a: &Rect, b: &Rect) -> Option<Rect> {
    if !rects_intersect(a, b) {
        return None;
    }
    let x = a.x.max(b.x);
    let y = a.y.max(b.y);
    let right = a.right().min(b.right());
    let bottom = a.bottom().min(b.bottom());
    Some(Rect::new(x, y, right - x, bottom - y))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Point),
    LineTo(Point),
    QuadTo { control: Point, to: Point },
    Close,
}

/// Outline of a rectangle with quadratic rounded corners. The radius is
/// clamped to half the shorter side; a zero radius yields a plain rectangle.
pub fn rounded_rect_path(rect: &Rect, radius: f32) -> Vec<PathCommand> {
    let Rect {
        x,
        y,
        width,
        height,
    } = *rect;
    let r = radius.max(0.0).min(width.abs() / 2.0).min(height.abs() / 2.0);
    if r <= 0.0 {
        return vec![
            PathCommand::MoveTo(Point::new(x, y)),
            PathCommand::LineTo(Point::new(x + width, y)),
            PathCommand::LineTo(Point::new(x + width, y + height)),
            PathCommand::LineTo(Point::new(x, y + height)),
            PathCommand::Close,
        ];
    }
    vec![
        PathCommand::MoveTo(Point::new(x + r, y)),
        PathCommand::LineTo(Point::new(x + width - r, y)),
        PathCommand::QuadTo {
            control: Point::new(x + width, y),
            to: Point::new(x + width, y + r),
        },
        PathCommand::LineTo(Point::new(x + width, y + height - r)),
        PathCommand::QuadTo {
            control: Point::new(x + width, y + height),
            to: Point::new(x + width - r, y + height),
        },
        PathCommand::LineTo(Point::new(x + r, y + height)),
        PathCommand::QuadTo {
            control: Point::new(x, y + height),
            to: Point::new(x, y + height - r),
        },
        PathCommand::LineTo(Point::new(x, y + r)),
        PathCommand::QuadTo {
            control: Point::new(x, y),
            to: Point::new(x + r, y),
        },
        PathCommand::Close,
    ]
}

pub fn path_to_svg(commands: &[PathCommand]) -> String {
    let mut d = String::new();
    for command in commands {
        if !d.is_empty() {
            d.push(' ');
        }
        match command {
            PathCommand::MoveTo(p) => d.push_str(&format!("M {:.2} {:.2}", p.x, p.y)),
            PathCommand::LineTo(p) => d.push_str(&format!("L {:.2} {:.2}", p.x, p.y)),
            PathCommand::QuadTo { control, to } => d.push_str(&format!(
                "Q {:.2} {:.2} {:.2} {:.2}",
                control.x, control.y, to.x, to.y
            )),
            PathCommand::Close => d.push('Z'),
        }
    }
    d
}
