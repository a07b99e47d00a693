//! Pie-chart layout and SVG output for a [`Snapshot`].
//!
//! Slices are sized by `price`, keep the snapshot's order, and run clockwise
//! from twelve o'clock. Colours cycle through a fixed six-entry palette by
//! slice index.

use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;

use serde::Serialize;

use crate::{Snapshot, ValidationError};

pub const PALETTE: [&str; 6] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f",
];

const SLICE_STROKE: &str = "white";
const SLICE_STROKE_WIDTH: &str = "6px";
const LABEL_FONT_SIZE: u32 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartDimensions {
    width: u32,
    height: u32,
}

impl Default for ChartDimensions {
    fn default() -> Self {
        Self {
            width: 540,
            height: 540,
        }
    }
}

impl ChartDimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, ValidationError> {
        if width == 0 || height == 0 {
            return Err(ValidationError::InvalidChartDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub fn radius(&self) -> f64 {
        f64::from(self.width.min(self.height)) / 2.0
    }
}

/// One wedge of the pie.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub index: usize,
    pub label: String,
    pub tooltip: String,
    pub value: f64,
    /// Fraction of the total, in `0.0..=1.0`.
    pub share: f64,
    /// Radians, clockwise from twelve o'clock.
    pub start_angle: f64,
    pub end_angle: f64,
    pub fill: &'static str,
    /// Label anchor relative to the pie centre.
    pub centroid: (f64, f64),
}

impl PieSlice {
    pub fn span(&self) -> f64 {
        self.end_angle - self.start_angle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieLayout {
    pub dimensions: ChartDimensions,
    pub radius: f64,
    pub total: f64,
    pub slices: Vec<PieSlice>,
}

impl PieLayout {
    /// A snapshot whose prices sum to zero produces no slices.
    pub fn from_snapshot(snapshot: &Snapshot, dimensions: ChartDimensions) -> Self {
        let radius = dimensions.radius();
        let total = snapshot.total_price();
        let mut slices = Vec::with_capacity(snapshot.len());

        if total > 0.0 {
            let mut angle = 0.0;
            for (index, record) in snapshot.iter().enumerate() {
                let share = record.price / total;
                let start_angle = angle;
                let end_angle = if index + 1 == snapshot.len() {
                    TAU
                } else {
                    angle + share * TAU
                };
                angle = end_angle;

                slices.push(PieSlice {
                    index,
                    label: record.symbol.to_string(),
                    tooltip: record.price_label(),
                    value: record.price,
                    share,
                    start_angle,
                    end_angle,
                    fill: PALETTE[index % PALETTE.len()],
                    centroid: polar(radius / 2.0, (start_angle + end_angle) / 2.0),
                });
            }
        }

        Self {
            dimensions,
            radius,
            total,
            slices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

/// Standalone SVG document for a layout. Labels and tooltips are XML-escaped.
pub fn render_svg(layout: &PieLayout) -> String {
    let width = layout.dimensions.width();
    let height = layout.dimensions.height();
    let mut svg = String::new();

    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = writeln!(
        svg,
        r#"  <g transform="translate({}, {})">"#,
        f64::from(width) / 2.0,
        f64::from(height) / 2.0
    );

    for slice in &layout.slices {
        let _ = writeln!(
            svg,
            r#"    <path fill="{}" d="{}" stroke="{SLICE_STROKE}" stroke-width="{SLICE_STROKE_WIDTH}"><title>{}</title></path>"#,
            slice.fill,
            arc_path(layout.radius, slice.start_angle, slice.end_angle),
            escape_xml(&slice.tooltip)
        );
    }

    for slice in &layout.slices {
        let (x, y) = slice.centroid;
        let _ = writeln!(
            svg,
            r#"    <text transform="translate({}, {})" text-anchor="middle" font-size="{LABEL_FONT_SIZE}">{}</text>"#,
            fmt_coord(x),
            fmt_coord(y),
            escape_xml(&slice.label)
        );
    }

    svg.push_str("  </g>\n</svg>\n");
    svg
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (radius * angle.sin(), -radius * angle.cos())
}

fn arc_path(radius: f64, start_angle: f64, end_angle: f64) -> String {
    let span = end_angle - start_angle;
    let r = fmt_coord(radius);

    // A single arc cannot close on itself; draw a full disc as two halves.
    if span >= TAU - 1e-9 {
        return format!("M0,-{r}A{r},{r},0,1,1,0,{r}A{r},{r},0,1,1,0,-{r}Z");
    }

    let (x0, y0) = polar(radius, start_angle);
    let (x1, y1) = polar(radius, end_angle);
    let large_arc = u8::from(span > PI);
    format!(
        "M{},{}A{r},{r},0,{large_arc},1,{},{}L0,0Z",
        fmt_coord(x0),
        fmt_coord(y0),
        fmt_coord(x1),
        fmt_coord(y1)
    )
}

fn fmt_coord(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        String::from("0")
    } else {
        format!("{rounded}")
    }
}
