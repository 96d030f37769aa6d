use crate::{
    compose::{ComposeContext, finish_sheet},
    encode::png::{Composite, EncodedImage},
    foundation::{
        error::StorysheetResult,
        geometry::{CanvasSize, GridSpec, Rect, stretch},
    },
    model::items::{Role, StoryboardFrame},
    render::{
        surface::{Rgba8, Surface},
        text::{Baseline, Label},
    },
};

/// 16:9 panels, up to three per row, with a caption band under each row.
pub const LAYOUT_GRID: GridSpec = GridSpec {
    max_cols: 3,
    cell_width: 640,
    cell_height: 360,
    padding: 40,
    label_band: 40,
};

const LABEL_BASELINE: f64 = 30.0;

/// Lay storyboard frames out as a numbered panel sheet.
///
/// Frames are stable-sorted by `order`, stretched to fill their 640x360 cell, and captioned
/// "Frame N" with their 1-based position in that sequence.
///
/// Unlike [`compose_props`](super::props::compose_props) and
/// [`compose_style`](super::style::compose_style), the first frame that fails to load aborts the
/// whole sheet: no partial layout is ever returned.
///
/// The canvas is capped at 65535px per side: 148 rows, so at most 444 frames. Beyond that the
/// sheet fails with an encoding error.
#[tracing::instrument(skip_all, fields(frames = frames.len()))]
pub fn compose_layout(
    frames: &[StoryboardFrame],
    ctx: &ComposeContext,
) -> StorysheetResult<Option<Composite>> {
    let mut sequenced: Vec<&StoryboardFrame> = frames.iter().collect();
    sequenced.sort_by_key(|f| f.order);

    let Some(shape) = LAYOUT_GRID.shape(sequenced.len()) else {
        tracing::debug!("no frames; layout sheet absent");
        return Ok(None);
    };

    let mut surface = Surface::new(LAYOUT_GRID.canvas_size(shape))?;
    surface.fill(Rgba8::WHITE);

    let mut labels = Vec::with_capacity(sequenced.len());
    for (index, frame) in sequenced.iter().enumerate() {
        let bitmap = ctx.loader.load(&frame.image.source)?;
        let cell = LAYOUT_GRID.cell_rect(shape, index);
        surface.draw_bitmap(&bitmap, &stretch(bitmap.width, bitmap.height, cell))?;
        labels.push(frame_label(index, cell));
        tracing::debug!(
            index,
            order = frame.order,
            source = %frame.image.source,
            "drew frame"
        );
    }

    finish_sheet(ctx, Role::Layout, surface, &labels).map(Some)
}

fn frame_label(index: usize, cell: Rect) -> Label {
    Label {
        text: format!("Frame {}", index + 1),
        center_x: cell.center().x,
        y: cell.y1 + LABEL_BASELINE,
        baseline: Baseline::Alphabetic,
        family: "Arial, sans-serif",
        size_px: 24.0,
        bold: true,
        color: Rgba8::BLACK,
        max_width: None,
    }
}

/// An opaque white 640x360 PNG, the starting canvas for a new storyboard frame.
pub fn blank_frame() -> StorysheetResult<EncodedImage> {
    let mut surface = Surface::new(CanvasSize {
        width: u64::from(LAYOUT_GRID.cell_width),
        height: u64::from(LAYOUT_GRID.cell_height),
    })?;
    surface.fill(Rgba8::WHITE);
    EncodedImage::png_from_raster(&surface.finish())
}

#[cfg(test)]
#[path = "../../tests/unit/compose/layout.rs"]
mod tests;
