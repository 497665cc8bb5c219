use crate::models::PlottedPoint;
use crate::services::chart_service::ChartLayout;

/// Max distance, in native pixels, between the pointer and a point it can pick
pub const HOVER_THRESHOLD_PX: f64 = 14.0;

/// Minimum gap between the tooltip and the container edges
pub const TOOLTIP_MARGIN_PX: f64 = 6.0;

/// Tooltip offset from the pointer, right and down
pub const TOOLTIP_OFFSET_PX: f64 = 12.0;

const CHAR_WIDTH_PX: f64 = 7.0;
const LINE_HEIGHT_PX: f64 = 16.0;
const HORIZONTAL_PADDING_PX: f64 = 16.0;
const VERTICAL_PADDING_PX: f64 = 10.0;

/// Size at which the chart is displayed, in CSS pixels.
///
/// The container that holds the tooltip has the same size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayBox {
    pub css_width: f64,
    pub css_height: f64,
}

impl DisplayBox {
    pub fn new(css_width: f64, css_height: f64) -> Self {
        Self {
            css_width,
            css_height,
        }
    }

    /// CSS coordinates to the surface's native pixel space
    pub fn to_native(&self, x: f64, y: f64, layout: &ChartLayout) -> (f64, f64) {
        (
            x * ratio(layout.width as f64, self.css_width),
            y * ratio(layout.height as f64, self.css_height),
        )
    }
}

fn ratio(native: f64, css: f64) -> f64 {
    if css > 0.0 {
        native / css
    } else {
        1.0
    }
}

/// Index of the point closest to `(x, y)`, if any lies within `threshold`
pub fn nearest_point(points: &[PlottedPoint], x: f64, y: f64, threshold: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let d2 = (p.x - x).powi(2) + (p.y - y).powi(2);
        if best.map_or(true, |(_, b)| d2 < b) {
            best = Some((i, d2));
        }
    }
    best.filter(|&(_, d2)| d2 <= threshold * threshold)
        .map(|(i, _)| i)
}

/// Tooltip placement inside the chart container, in CSS pixels
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
}

impl Tooltip {
    /// Place a tooltip for `point` next to the pointer at `(x, y)`
    pub fn place(point: &PlottedPoint, x: f64, y: f64, container: &DisplayBox) -> Self {
        let text = format!("{}\n{:.6}", point.date.format("%Y-%m-%d"), point.value);
        let (width, height) = estimate_size(&text);
        Self {
            left: clamp_axis(x + TOOLTIP_OFFSET_PX, width, container.css_width),
            top: clamp_axis(y + TOOLTIP_OFFSET_PX, height, container.css_height),
            width,
            height,
            text,
        }
    }
}

fn estimate_size(text: &str) -> (f64, f64) {
    let lines = text.lines().count().max(1);
    let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    (
        longest as f64 * CHAR_WIDTH_PX + HORIZONTAL_PADDING_PX,
        lines as f64 * LINE_HEIGHT_PX + VERTICAL_PADDING_PX,
    )
}

/// Keep `[pos, pos + size]` inside `[margin, extent - margin]`; the leading
/// edge wins when the box cannot fit.
fn clamp_axis(pos: f64, size: f64, extent: f64) -> f64 {
    pos.min(extent - size - TOOLTIP_MARGIN_PX).max(TOOLTIP_MARGIN_PX)
}

/// What the chart shows after a pointer event
#[derive(Debug, Clone, PartialEq)]
pub enum HoverOutcome {
    /// No highlight, tooltip hidden
    Hidden,
    Point { index: usize, tooltip: Tooltip },
}

impl HoverOutcome {
    pub fn index(&self) -> Option<usize> {
        match self {
            HoverOutcome::Hidden => None,
            HoverOutcome::Point { index, .. } => Some(*index),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HoverController {
    threshold: f64,
}

impl Default for HoverController {
    fn default() -> Self {
        Self {
            threshold: HOVER_THRESHOLD_PX,
        }
    }
}

impl HoverController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_move(
        &self,
        x: f64,
        y: f64,
        layout: &ChartLayout,
        display: &DisplayBox,
        points: &[PlottedPoint],
    ) -> HoverOutcome {
        let (nx, ny) = display.to_native(x, y, layout);
        match nearest_point(points, nx, ny, self.threshold) {
            Some(index) => HoverOutcome::Point {
                index,
                tooltip: Tooltip::place(&points[index], x, y, display),
            },
            None => HoverOutcome::Hidden,
        }
    }

    pub fn pointer_leave(&self) -> HoverOutcome {
        HoverOutcome::Hidden
    }
}
