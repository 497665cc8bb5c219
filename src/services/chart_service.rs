use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{HistoryPoint, PlottedPoint};
use crate::services::hover_service::{HoverController, HoverOutcome, DisplayBox};
use crate::utils::errors::AppError;
use crate::utils::format::format_axis_value;
use crate::utils::theme::ChartPalette;

/// Gridlines per axis, labelled min..max in equal steps
pub const GRID_LINES: usize = 6;

/// Days covered by the default history range, today included
pub const DEFAULT_RANGE_DAYS: i64 = 30;

/// Trailing 30-day window ending today: (today - 29 days, today)
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(DEFAULT_RANGE_DAYS - 1), today)
}

/// Parse a `YYYY-MM-DD` form value
pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Bad date '{}' (use YYYY-MM-DD)", value.trim())))
}

/// A validated `/cg/history` request
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRequest {
    pub coin_id: String,
    pub vs: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl HistoryRequest {
    /// Reversed ranges are swapped, as the proxy does
    pub fn new(coin_id: &str, vs: &str, from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        let coin_id = coin_id.trim().to_lowercase();
        if coin_id.is_empty() {
            return Err(AppError::Validation("Enter a coin id (e.g. bitcoin)".to_string()));
        }
        let vs = vs.trim().to_lowercase();
        if vs.is_empty() {
            return Err(AppError::Validation("Enter a target currency (e.g. usd)".to_string()));
        }
        let (from, to) = if to < from { (to, from) } else { (from, to) };
        Ok(Self { coin_id, vs, from, to })
    }

    pub fn caption(&self) -> String {
        format!("{}/{} {} → {}", self.coin_id, self.vs, self.from, self.to)
    }
}

/// Native size of the chart surface and the padding around the plot area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartLayout {
    pub width: u32,
    pub height: u32,
    pub pad_left: f64,
    pub pad_right: f64,
    pub pad_top: f64,
    pub pad_bottom: f64,
}

impl ChartLayout {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pad_left: 72.0,
            pad_right: 20.0,
            pad_top: 32.0,
            pad_bottom: 76.0,
        }
    }

    pub fn plot_left(&self) -> f64 {
        self.pad_left
    }

    pub fn plot_right(&self) -> f64 {
        self.width as f64 - self.pad_right
    }

    pub fn plot_top(&self) -> f64 {
        self.pad_top
    }

    pub fn plot_bottom(&self) -> f64 {
        self.height as f64 - self.pad_bottom
    }
}

/// Linear map from a data range onto a pixel range
#[derive(Debug, Clone, Copy)]
struct LinearScale {
    min: f64,
    span: f64,
    start: f64,
    end: f64,
}

impl LinearScale {
    /// A zero-width domain maps everything to `start`
    fn new(min: f64, max: f64, start: f64, end: f64) -> Self {
        let span = if max - min == 0.0 { 1.0 } else { max - min };
        Self { min, span, start, end }
    }

    fn map(&self, value: f64) -> f64 {
        self.start + (value - self.min) / self.span * (self.end - self.start)
    }
}

fn date_seconds(date: NaiveDate) -> f64 {
    DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(NaiveTime::default()), Utc).timestamp() as f64
}

fn day_label(seconds: f64) -> String {
    DateTime::<Utc>::from_timestamp(seconds.floor() as i64, 0)
        .map(|dt| dt.date_naive().format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// A gridline at a pixel position with its label
#[derive(Debug, Clone, PartialEq)]
pub struct Gridline {
    pub pos: f64,
    pub label: String,
}

/// Everything the painter needs, in native pixel space
#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub layout: ChartLayout,
    pub caption: String,
    /// y positions, price labels
    pub horizontal: Vec<Gridline>,
    /// x positions, date labels
    pub vertical: Vec<Gridline>,
    pub points: Vec<PlottedPoint>,
}

impl ChartScene {
    pub fn empty(layout: ChartLayout) -> Self {
        Self {
            layout,
            caption: String::new(),
            horizontal: Vec::new(),
            vertical: Vec::new(),
            points: Vec::new(),
        }
    }
}

/// Project a series into pixel space.
///
/// Output points are 1:1 with the input and keep its order.
pub fn build_scene(series: &[HistoryPoint], caption: &str, layout: ChartLayout) -> ChartScene {
    if series.is_empty() {
        return ChartScene::empty(layout);
    }

    let times: Vec<f64> = series.iter().map(|p| date_seconds(p.date)).collect();
    let (t_min, t_max) = min_max(times.iter().copied());
    let (v_min, v_max) = min_max(series.iter().map(|p| p.price));

    let x_scale = LinearScale::new(t_min, t_max, layout.plot_left(), layout.plot_right());
    // Inverted: larger prices sit higher on screen
    let y_scale = LinearScale::new(v_min, v_max, layout.plot_bottom(), layout.plot_top());

    let steps = (GRID_LINES - 1) as f64;
    let horizontal = (0..GRID_LINES)
        .map(|i| {
            let value = v_min + (v_max - v_min) * i as f64 / steps;
            Gridline {
                pos: y_scale.map(value),
                label: format_axis_value(value),
            }
        })
        .collect();
    let vertical = (0..GRID_LINES)
        .map(|i| {
            let t = t_min + (t_max - t_min) * i as f64 / steps;
            Gridline {
                pos: x_scale.map(t),
                label: day_label(t),
            }
        })
        .collect();

    let points = series
        .iter()
        .zip(times)
        .map(|(p, t)| PlottedPoint {
            date: p.date,
            value: p.price,
            x: x_scale.map(t),
            y: y_scale.map(p.price),
        })
        .collect();

    ChartScene {
        layout,
        caption: caption.to_string(),
        horizontal,
        vertical,
        points,
    }
}

fn px(v: f64) -> i32 {
    v.round() as i32
}

/// Labels are best effort: a missing system font must not cost the chart
fn draw_label<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    text: &str,
    at: (i32, i32),
    style: &TextStyle,
) {
    if let Err(e) = root.draw(&Text::new(text.to_string(), at, style.clone())) {
        debug!("Skipping chart label '{}': {}", text, e);
    }
}

/// Paint a scene, optionally highlighting one point.
///
/// A pure function of its inputs: the same scene, highlight and palette
/// always produce the same pixels.
pub fn paint<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    scene: &ChartScene,
    highlight: Option<usize>,
    palette: &ChartPalette,
) -> Result<(), AppError> {
    root.fill(&palette.background)
        .map_err(|e| AppError::Render(format!("Failed to fill canvas: {}", e)))?;

    if scene.points.is_empty() {
        return Ok(());
    }

    let layout = &scene.layout;
    let (left, right) = (px(layout.plot_left()), px(layout.plot_right()));
    let (top, bottom) = (px(layout.plot_top()), px(layout.plot_bottom()));

    let value_style = ("sans-serif", 12)
        .into_font()
        .color(&palette.text)
        .pos(Pos::new(HPos::Right, VPos::Center));
    for line in &scene.horizontal {
        let y = px(line.pos);
        root.draw(&PathElement::new(vec![(left, y), (right, y)], palette.grid.stroke_width(1)))
            .map_err(|e| AppError::Render(format!("Failed to draw gridline: {}", e)))?;
        draw_label(root, &line.label, (left - 6, y), &value_style);
    }

    let date_style = ("sans-serif", 11)
        .into_font()
        .transform(FontTransform::Rotate270)
        .color(&palette.text);
    for line in &scene.vertical {
        let x = px(line.pos);
        root.draw(&PathElement::new(vec![(x, top), (x, bottom)], palette.grid.stroke_width(1)))
            .map_err(|e| AppError::Render(format!("Failed to draw gridline: {}", e)))?;
        draw_label(root, &line.label, (x - 6, layout.height as i32 - 6), &date_style);
    }

    root.draw(&PathElement::new(
        vec![(left, top), (left, bottom), (right, bottom)],
        palette.axis.stroke_width(1),
    ))
    .map_err(|e| AppError::Render(format!("Failed to draw axes: {}", e)))?;

    let path: Vec<(i32, i32)> = scene.points.iter().map(|p| (px(p.x), px(p.y))).collect();
    root.draw(&PathElement::new(path, palette.line.stroke_width(2)))
        .map_err(|e| AppError::Render(format!("Failed to draw line: {}", e)))?;

    let caption_style = ("sans-serif", 14)
        .into_font()
        .color(&palette.text)
        .pos(Pos::new(HPos::Left, VPos::Top));
    draw_label(root, &scene.caption, (left, 8), &caption_style);

    if let Some(point) = highlight.and_then(|i| scene.points.get(i)) {
        let (x, y) = (px(point.x), px(point.y));
        root.draw(&PathElement::new(vec![(x, top), (x, bottom)], palette.guide.stroke_width(1)))
            .map_err(|e| AppError::Render(format!("Failed to draw guide: {}", e)))?;
        root.draw(&Circle::new((x, y), 5, palette.marker.filled()))
            .map_err(|e| AppError::Render(format!("Failed to draw marker: {}", e)))?;
        root.draw(&Circle::new((x, y), 5, palette.marker_outline.stroke_width(2)))
            .map_err(|e| AppError::Render(format!("Failed to draw marker: {}", e)))?;
    }

    Ok(())
}

/// The chart's raster surface: last series, its projection and the pixels.
///
/// Hover handling is attached at most once per surface.
pub struct ChartSurface {
    layout: ChartLayout,
    palette: ChartPalette,
    scene: ChartScene,
    highlight: Option<usize>,
    pixels: Vec<u8>,
    hover: Option<HoverController>,
}

impl ChartSurface {
    pub fn new(layout: ChartLayout, palette: ChartPalette) -> Self {
        let pixels = vec![0u8; layout.width as usize * layout.height as usize * 3];
        Self {
            layout,
            palette,
            scene: ChartScene::empty(layout),
            highlight: None,
            pixels,
            hover: None,
        }
    }

    /// Pixel-space points of the current series
    #[cfg(test)]
    pub fn points(&self) -> &[PlottedPoint] {
        &self.scene.points
    }

    #[cfg(test)]
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    /// RGB bytes, row-major, `width * height * 3`
    #[cfg(test)]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Replace the series and draw it from scratch
    pub fn draw(&mut self, series: &[HistoryPoint], caption: &str) -> Result<&[PlottedPoint], AppError> {
        self.scene = build_scene(series, caption, self.layout);
        self.redraw(None)?;
        info!("Chart drawn: {} points ({})", self.scene.points.len(), caption);
        Ok(&self.scene.points)
    }

    /// Repaint the current scene with or without a highlighted point
    pub fn redraw(&mut self, highlight: Option<usize>) -> Result<(), AppError> {
        self.highlight = highlight;
        let size = (self.layout.width, self.layout.height);
        {
            let root = BitMapBackend::with_buffer(&mut self.pixels, size).into_drawing_area();
            paint(&root, &self.scene, highlight, &self.palette)?;
            root.present()
                .map_err(|e| AppError::Render(format!("Failed to render chart: {}", e)))?;
        }
        Ok(())
    }

    pub fn set_palette(&mut self, palette: ChartPalette) -> Result<(), AppError> {
        self.palette = palette;
        self.redraw(self.highlight)
    }

    /// Write the current frame as PNG
    pub fn export_png(&self, path: &Path) -> Result<(), AppError> {
        let size = (self.layout.width, self.layout.height);
        let root = BitMapBackend::new(path, size).into_drawing_area();
        paint(&root, &self.scene, self.highlight, &self.palette)?;
        root.present()
            .map_err(|e| AppError::Render(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    /// Wire pointer handling; returns false when already wired
    pub fn attach_hover(&mut self) -> bool {
        if self.hover.is_some() {
            return false;
        }
        debug!("Attaching hover handling to chart surface");
        self.hover = Some(HoverController::new());
        true
    }

    #[cfg(test)]
    pub fn is_hover_attached(&self) -> bool {
        self.hover.is_some()
    }

    /// Pointer moved to CSS coordinates `(x, y)` over the displayed canvas
    pub fn pointer_move(&mut self, x: f64, y: f64, display: &DisplayBox) -> Result<HoverOutcome, AppError> {
        let outcome = match &self.hover {
            Some(hover) => hover.pointer_move(x, y, &self.layout, display, &self.scene.points),
            None => return Ok(HoverOutcome::Hidden),
        };
        self.redraw(outcome.index())?;
        Ok(outcome)
    }

    pub fn pointer_leave(&mut self) -> Result<HoverOutcome, AppError> {
        let outcome = match &self.hover {
            Some(hover) => hover.pointer_leave(),
            None => return Ok(HoverOutcome::Hidden),
        };
        self.redraw(None)?;
        Ok(outcome)
    }
}
