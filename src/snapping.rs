//! Grid quantization: pixel pointer deltas to whole cells, clamped to the grid

use crate::types::GridRect;

/// Pixel rectangle (freeform space)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }
}

/// Pixel geometry of a grid laid out in a container of known width
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub columns: u32,
    pub column_width: f64,
    pub row_height: f64,
    pub margin: [f64; 2],
    pub padding: [f64; 2],
}

impl GridMetrics {
    pub fn new(container_width: u32, columns: u32, row_height: u32, margin: [u32; 2], padding: [u32; 2]) -> Self {
        let columns = columns.max(1);
        let margin = [f64::from(margin[0]), f64::from(margin[1])];
        let padding = [f64::from(padding[0]), f64::from(padding[1])];
        let usable = f64::from(container_width) - padding[0] * 2.0 - margin[0] * f64::from(columns - 1);
        Self {
            columns,
            column_width: (usable / f64::from(columns)).max(1.0),
            row_height: f64::from(row_height.max(1)),
            margin,
            padding,
        }
    }

    /// Horizontal distance between the origins of adjacent columns
    pub fn column_pitch(&self) -> f64 {
        self.column_width + self.margin[0]
    }

    /// Vertical distance between the origins of adjacent rows
    pub fn row_pitch(&self) -> f64 {
        self.row_height + self.margin[1]
    }

    /// Whole columns covered by a horizontal pixel delta
    pub fn columns_for(&self, dx: i32) -> i64 {
        (f64::from(dx) / self.column_pitch()).round() as i64
    }

    /// Whole rows covered by a vertical pixel delta
    pub fn rows_for(&self, dy: i32) -> i64 {
        (f64::from(dy) / self.row_pitch()).round() as i64
    }

    /// Pixel rectangle a renderer would draw for `rect`
    pub fn to_pixels(&self, rect: GridRect) -> Rect {
        let span = |cells: u32, size: f64, margin: f64| {
            let cells = f64::from(cells);
            (cells * size + (cells - 1.0).max(0.0) * margin).round() as u32
        };
        Rect {
            x: (self.padding[0] + f64::from(rect.x) * self.column_pitch()).round() as i32,
            y: (self.padding[1] + f64::from(rect.y) * self.row_pitch()).round() as i32,
            width: span(rect.w, self.column_width, self.margin[0]),
            height: span(rect.h, self.row_height, self.margin[1]),
        }
    }
}

fn offset(value: u32, delta: i64) -> i64 {
    i64::from(value) + delta
}

/// Move `origin` by whole cells, keeping it inside `[0, columns)` and below row 0
pub fn snap_move(origin: GridRect, dx_cells: i64, dy_cells: i64, columns: u32) -> GridRect {
    let max_x = i64::from(columns.saturating_sub(origin.w));
    GridRect {
        x: offset(origin.x, dx_cells).clamp(0, max_x) as u32,
        y: offset(origin.y, dy_cells).max(0) as u32,
        ..origin
    }
}

/// Resize `origin` by whole cells
///
/// An axis whose candidate span would drop under its minimum keeps the span of
/// `last` (the previous accepted candidate). Widths are capped at the last column
/// unless the cap itself would fall under the minimum width.
pub fn snap_resize(
    origin: GridRect,
    last: GridRect,
    dw_cells: i64,
    dh_cells: i64,
    min_span: (u32, u32),
    columns: u32,
) -> GridRect {
    let max_w = i64::from(columns.saturating_sub(origin.x).max(1));
    let w = offset(origin.w, dw_cells);
    let h = offset(origin.h, dh_cells);

    let min_w = i64::from(min_span.0);
    let w = if w < min_w {
        last.w
    } else if w.min(max_w) < min_w {
        // Too close to the right edge to cap without breaking the minimum
        last.w.min(w as u32).max(min_span.0)
    } else {
        w.min(max_w) as u32
    };
    let h = if h < i64::from(min_span.1) { last.h } else { h.min(i64::from(u32::MAX)) as u32 };

    GridRect { w, h, ..origin }
}
