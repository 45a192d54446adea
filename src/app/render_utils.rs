use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, pos2};

/// Fits the fixed-size canvas into the panel rect, letterboxed and centered.
#[derive(Clone, Copy, Debug)]
pub(super) struct CanvasFit {
    origin: Pos2,
    scale: f32,
}

impl CanvasFit {
    pub(super) fn new(rect: Rect, canvas_size: Vec2) -> Self {
        let width = canvas_size.x.max(1.0);
        let height = canvas_size.y.max(1.0);
        let scale = (rect.width() / width).min(rect.height() / height).max(0.01);
        let used = Vec2::new(width, height) * scale;
        Self {
            origin: rect.min + (rect.size() - used) * 0.5,
            scale,
        }
    }

    pub(super) fn scale(self) -> f32 {
        self.scale
    }

    pub(super) fn view_to_screen(self, view: Vec2) -> Pos2 {
        self.origin + view * self.scale
    }

    pub(super) fn screen_to_view(self, screen: Pos2) -> Vec2 {
        (screen - self.origin) / self.scale
    }

    pub(super) fn screen_delta_to_view(self, delta: Vec2) -> Vec2 {
        delta / self.scale
    }
}

pub(super) fn parse_hex_color(value: &str) -> Option<Color32> {
    let digits = value.trim().strip_prefix('#')?;
    let channel = |text: &str| u8::from_str_radix(text, 16).ok();
    match digits.len() {
        3 => {
            let mut channels = digits.chars().map(|ch| ch.to_digit(16).map(|v| (v * 17) as u8));
            Some(Color32::from_rgb(
                channels.next()??,
                channels.next()??,
                channels.next()??,
            ))
        }
        6 => Some(Color32::from_rgb(
            channel(digits.get(0..2)?)?,
            channel(digits.get(2..4)?)?,
            channel(digits.get(4..6)?)?,
        )),
        _ => None,
    }
}

pub(super) fn color_to_hex(color: Color32) -> String {
    format!("#{:02X}{:02X}{:02X}", color.r(), color.g(), color.b())
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.35 + factor * 0.65)) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, panel: Rect, canvas: Rect, grid_step: f32) {
    painter.rect_filled(panel, 0.0, Color32::from_rgb(19, 23, 29));
    painter.rect_filled(canvas, 4.0, Color32::from_rgb(24, 29, 36));

    let step = grid_step.max(12.0);
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 60));

    let mut x = canvas.left() + step;
    while x < canvas.right() {
        painter.line_segment([pos2(x, canvas.top()), pos2(x, canvas.bottom())], stroke);
        x += step;
    }

    let mut y = canvas.top() + step;
    while y < canvas.bottom() {
        painter.line_segment([pos2(canvas.left(), y), pos2(canvas.right(), y)], stroke);
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    rect.intersects(bounds)
}

/// Filled triangular arrowhead whose tip sits at `tip`, pointing along
/// `direction`.
pub(super) fn draw_arrowhead(
    painter: &Painter,
    tip: Pos2,
    direction: Vec2,
    size: f32,
    color: Color32,
) {
    if direction.length_sq() <= f32::EPSILON {
        return;
    }
    let direction = direction.normalized();
    let back = tip - direction * size;
    let normal = direction.rot90() * (size * 0.5);
    painter.add(eframe::egui::Shape::convex_polygon(
        vec![tip, back + normal, back - normal],
        color,
        Stroke::NONE,
    ));
}
