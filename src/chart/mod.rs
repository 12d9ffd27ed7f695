//! # Audiogram Rasterizer
//!
//! Draws one ear's hearing thresholds with `plotters` into an RGB buffer and
//! encodes it as PNG: gridlines every 10 dB from -10 at the top to 120 at
//! the bottom, the six standard frequencies evenly spaced across, a line
//! through the readings and a bordered marker on each point.
//!
//! The raster carries no text. Tick and title positions are returned with
//! the image so the report can set the labels as PDF text over it.

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, RgbImage};
use plotters::prelude::*;
use tracing::debug;

use crate::error::ReportError;
use crate::model::audiometry::{frequency_label, EarReadings, STANDARD_FREQUENCIES};

pub const DB_MIN: i32 = -10;
pub const DB_MAX: i32 = 120;
const GRID_STEP: usize = 10;

/// Room past the outer gridlines so edge markers are not clipped.
const DB_OVERSCAN: f64 = 5.0;
const X_OVERSCAN: f64 = 0.1;

const GRID: RGBColor = RGBColor(215, 215, 215);
const AXIS: RGBColor = RGBColor(120, 120, 120);
const MARKER_BORDER: RGBColor = RGBColor(40, 40, 40);

const PAD_LEFT: u32 = 56;
const PAD_RIGHT: u32 = 24;
const PAD_TOP: u32 = 34;
const PAD_BOTTOM: u32 = 30;

const LINE_WIDTH: u32 = 3;
const MARKER_RADIUS: u32 = 6;
const MARKER_BORDER_WIDTH: u32 = 2;

/// Pixel size and series color of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSpec {
    pub width: u32,
    pub height: u32,
    pub color: [u8; 3],
}

impl ChartSpec {
    pub const MIN_WIDTH: u32 = 240;
    pub const MIN_HEIGHT: u32 = 120;

    pub fn new(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            width,
            height,
            color,
        }
    }
}

/// A label anchored at one pixel coordinate of the raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub label: String,
    pub px: i32,
}

/// Pixel bounds of the gridded area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotFrame {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// An encoded audiogram and where its labels belong.
#[derive(Debug, Clone)]
pub struct Audiogram {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub frame: PlotFrame,
    /// dB gridlines, top to bottom; `px` is the y pixel.
    pub db_ticks: Vec<Tick>,
    /// Frequency columns, left to right; `px` is the x pixel.
    pub frequency_ticks: Vec<Tick>,
    /// Marker centers in frequency order.
    pub markers: Vec<(i32, i32)>,
}

/// Values outside the chart domain are pinned to its edge.
pub fn clamp_db(db: i32) -> i32 {
    db.clamp(DB_MIN, DB_MAX)
}

/// Chart y for a hearing level. dB grows downwards, so it is negated.
fn plot_y(db: i32) -> f64 {
    -(clamp_db(db) as f64)
}

fn chart_error<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Geometry read back from the drawn chart.
struct Placement {
    frame: PlotFrame,
    db_ticks: Vec<Tick>,
    frequency_ticks: Vec<Tick>,
    markers: Vec<(i32, i32)>,
}

/// Rasterize and PNG-encode one ear's audiogram.
pub fn render_audiogram(
    readings: &EarReadings,
    title: &str,
    spec: ChartSpec,
) -> Result<Audiogram, ReportError> {
    if spec.width < ChartSpec::MIN_WIDTH || spec.height < ChartSpec::MIN_HEIGHT {
        return Err(ReportError::Chart(format!(
            "chart size {}x{} is below the {}x{} minimum",
            spec.width,
            spec.height,
            ChartSpec::MIN_WIDTH,
            ChartSpec::MIN_HEIGHT
        )));
    }

    let mut buffer = vec![0u8; spec.width as usize * spec.height as usize * 3];
    let placement = draw(&mut buffer, readings, spec)?;
    let img = RgbImage::from_raw(spec.width, spec.height, buffer)
        .ok_or_else(|| ReportError::Chart("chart buffer does not match its size".to_string()))?;
    let png = encode_png(&img)?;
    debug!(title, width = spec.width, height = spec.height, bytes = png.len(), "audiogram rendered");

    Ok(Audiogram {
        png,
        width: spec.width,
        height: spec.height,
        title: format!("{} (dB HL)", title),
        frame: placement.frame,
        db_ticks: placement.db_ticks,
        frequency_ticks: placement.frequency_ticks,
        markers: placement.markers,
    })
}

fn draw(buffer: &mut [u8], readings: &EarReadings, spec: ChartSpec) -> Result<Placement, ReportError> {
    let series = RGBColor(spec.color[0], spec.color[1], spec.color[2]);
    let last = (STANDARD_FREQUENCIES.len() - 1) as f64;
    let (x_left, x_right) = (-0.5, last + 0.5);

    let root = BitMapBackend::with_buffer(buffer, (spec.width, spec.height)).into_drawing_area();
    root.fill(&WHITE).map_err(chart_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin_left(PAD_LEFT)
        .margin_right(PAD_RIGHT)
        .margin_top(PAD_TOP)
        .margin_bottom(PAD_BOTTOM)
        .build_cartesian_2d(
            (x_left - X_OVERSCAN)..(x_right + X_OVERSCAN),
            (plot_y(DB_MAX) - DB_OVERSCAN)..(plot_y(DB_MIN) + DB_OVERSCAN),
        )
        .map_err(chart_error)?;

    // Horizontal gridlines, darker at the domain edges
    chart
        .draw_series((DB_MIN..=DB_MAX).step_by(GRID_STEP).map(|db| {
            let color = if db == DB_MIN || db == DB_MAX { AXIS } else { GRID };
            PathElement::new(vec![(x_left, plot_y(db)), (x_right, plot_y(db))], color.stroke_width(1))
        }))
        .map_err(chart_error)?;

    // One vertical gridline per frequency, plus the frame sides
    chart
        .draw_series((0..STANDARD_FREQUENCIES.len()).map(|i| {
            let x = i as f64;
            PathElement::new(vec![(x, plot_y(DB_MIN)), (x, plot_y(DB_MAX))], GRID.stroke_width(1))
        }))
        .map_err(chart_error)?;
    chart
        .draw_series([x_left, x_right].into_iter().map(|x| {
            PathElement::new(vec![(x, plot_y(DB_MIN)), (x, plot_y(DB_MAX))], AXIS.stroke_width(1))
        }))
        .map_err(chart_error)?;

    // Missing readings plot at 0 dB
    let points: Vec<(f64, f64)> = STANDARD_FREQUENCIES
        .iter()
        .enumerate()
        .map(|(i, &f)| (i as f64, plot_y(readings.level(f))))
        .collect();

    // Line first so the markers sit on top of it
    chart
        .draw_series(LineSeries::new(points.clone(), series.stroke_width(LINE_WIDTH)))
        .map_err(chart_error)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, MARKER_RADIUS + MARKER_BORDER_WIDTH, MARKER_BORDER.filled())),
        )
        .map_err(chart_error)?;
    chart
        .draw_series(points.iter().map(|&p| Circle::new(p, MARKER_RADIUS, series.filled())))
        .map_err(chart_error)?;

    let (left, top) = chart.backend_coord(&(x_left, plot_y(DB_MIN)));
    let (right, bottom) = chart.backend_coord(&(x_right, plot_y(DB_MAX)));
    let placement = Placement {
        frame: PlotFrame {
            left,
            top,
            right,
            bottom,
        },
        db_ticks: (DB_MIN..=DB_MAX)
            .step_by(GRID_STEP)
            .map(|db| Tick {
                label: db.to_string(),
                px: chart.backend_coord(&(0.0, plot_y(db))).1,
            })
            .collect(),
        frequency_ticks: STANDARD_FREQUENCIES
            .iter()
            .enumerate()
            .map(|(i, &f)| Tick {
                label: frequency_label(f).trim_end_matches(" Hz").to_string(),
                px: chart.backend_coord(&(i as f64, 0.0)).0,
            })
            .collect(),
        markers: points.iter().map(|p| chart.backend_coord(p)).collect(),
    };

    root.present().map_err(chart_error)?;
    Ok(placement)
}

fn encode_png(img: &RgbImage) -> Result<Vec<u8>, ReportError> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgb8)
        .map_err(|e| ReportError::Chart(format!("PNG encoding failed: {}", e)))?;
    Ok(buf)
}
