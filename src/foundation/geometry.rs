pub use kurbo::Rect;

/// Fixed grid geometry shared by the compositors.
///
/// Cells are `cell_width x cell_height`, separated from each other and from the canvas edges by
/// `padding`, and each cell row is followed by a `label_band` strip for burned-in text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    /// Upper bound on columns; fewer items than this produce fewer columns.
    pub max_cols: u32,
    /// Cell width in pixels.
    pub cell_width: u32,
    /// Cell height in pixels.
    pub cell_height: u32,
    /// Gap between cells and around the outer edge.
    pub padding: u32,
    /// Height of the text band under each cell row.
    pub label_band: u32,
}

/// Column/row count for a concrete number of items.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    /// Number of columns.
    pub cols: u32,
    /// Number of rows.
    pub rows: u32,
}

/// Canvas dimensions in pixels.
///
/// Kept wide so oversized grids are reported by the surface instead of overflowing here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanvasSize {
    /// Width in pixels.
    pub width: u64,
    /// Height in pixels.
    pub height: u64,
}

impl GridSpec {
    /// Grid shape for `count` items: `cols = min(count, max_cols)`, `rows = ceil(count / cols)`.
    ///
    /// Returns `None` for zero items; empty input never produces a canvas.
    pub fn shape(&self, count: usize) -> Option<GridShape> {
        if count == 0 || self.max_cols == 0 {
            return None;
        }
        let count = count as u64;
        let cols = count.min(u64::from(self.max_cols));
        let rows = count.div_ceil(cols);
        Some(GridShape {
            cols: cols as u32,
            rows: u32::try_from(rows).unwrap_or(u32::MAX),
        })
    }

    /// Full canvas size for `shape`.
    pub fn canvas_size(&self, shape: GridShape) -> CanvasSize {
        let cols = u64::from(shape.cols);
        let rows = u64::from(shape.rows);
        let pad = u64::from(self.padding);
        CanvasSize {
            width: cols * u64::from(self.cell_width) + (cols + 1) * pad,
            height: rows * u64::from(self.cell_height)
                + rows * u64::from(self.label_band)
                + (rows + 1) * pad,
        }
    }

    /// Top-left corner of the cell at `index` in row-major order.
    pub fn cell_origin(&self, shape: GridShape, index: usize) -> (f64, f64) {
        let cols = shape.cols.max(1) as usize;
        let col = (index % cols) as f64;
        let row = (index / cols) as f64;
        let pad = f64::from(self.padding);
        let x = pad + col * (f64::from(self.cell_width) + pad);
        let y = pad + row * (f64::from(self.cell_height) + f64::from(self.label_band) + pad);
        (x, y)
    }

    /// Cell rectangle at `index`.
    pub fn cell_rect(&self, shape: GridShape, index: usize) -> Rect {
        let (x, y) = self.cell_origin(shape, index);
        Rect::new(
            x,
            y,
            x + f64::from(self.cell_width),
            y + f64::from(self.cell_height),
        )
    }

    /// Label band rectangle directly under the cell at `index`.
    pub fn label_rect(&self, shape: GridShape, index: usize) -> Rect {
        let cell = self.cell_rect(shape, index);
        Rect::new(
            cell.x0,
            cell.y1,
            cell.x1,
            cell.y1 + f64::from(self.label_band),
        )
    }
}

/// Where a source bitmap lands on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Horizontal scale from source pixels to canvas pixels.
    pub scale_x: f64,
    /// Vertical scale from source pixels to canvas pixels.
    pub scale_y: f64,
    /// Destination of the whole scaled bitmap. May extend past the cell for [`cover`].
    pub dest: Rect,
}

/// Stretch the source to exactly fill `cell`, ignoring aspect ratio.
pub fn stretch(src_width: u32, src_height: u32, cell: Rect) -> Placement {
    Placement {
        scale_x: cell.width() / f64::from(src_width.max(1)),
        scale_y: cell.height() / f64::from(src_height.max(1)),
        dest: cell,
    }
}

/// Scale uniformly so the source fits inside `cell`, centered with equal letterbox margins.
pub fn fit_inside(src_width: u32, src_height: u32, cell: Rect) -> Placement {
    let (w, h) = (f64::from(src_width.max(1)), f64::from(src_height.max(1)));
    let scale = (cell.width() / w).min(cell.height() / h);
    centered(w, h, scale, cell)
}

/// Scale uniformly so the source covers `cell`, centered; overflow is meant to be clipped.
pub fn cover(src_width: u32, src_height: u32, cell: Rect) -> Placement {
    let (w, h) = (f64::from(src_width.max(1)), f64::from(src_height.max(1)));
    let scale = (cell.width() / w).max(cell.height() / h);
    centered(w, h, scale, cell)
}

fn centered(w: f64, h: f64, scale: f64, cell: Rect) -> Placement {
    let dw = w * scale;
    let dh = h * scale;
    let x = cell.x0 + (cell.width() - dw) / 2.0;
    let y = cell.y0 + (cell.height() - dh) / 2.0;
    Placement {
        scale_x: scale,
        scale_y: scale,
        dest: Rect::new(x, y, x + dw, y + dh),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/geometry.rs"]
mod tests;
