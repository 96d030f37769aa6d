use crate::{
    compose::{ComposeContext, finish_sheet},
    encode::png::Composite,
    foundation::{
        error::StorysheetResult,
        geometry::{GridSpec, Rect, fit_inside},
    },
    model::items::{PropItem, Role},
    render::{
        surface::{PlacedBitmap, Rgba8, Surface},
        text::{Baseline, Label},
    },
};

/// Square 500px boxes, two per row, with a tall description band under each row.
pub const PROPS_GRID: GridSpec = GridSpec {
    max_cols: 2,
    cell_width: 500,
    cell_height: 500,
    padding: 20,
    label_band: 100,
};

const LABEL_TOP: f64 = 10.0;

/// Lay prop references out on a light gray sheet, each letterboxed in a white box and captioned
/// "Prop N: description".
///
/// An item that fails to load or draw is logged and skipped; its slot keeps the sheet background
/// (no white box) and later items stay in their own slots.
///
/// The canvas is capped at 65535px per side: 105 rows, so at most 210 props. A longer sheet fails
/// as a whole with an encoding error. Contrast with
/// [`compose_layout`](super::layout::compose_layout), which fails on the first bad frame.
#[tracing::instrument(skip_all, fields(props = props.len()))]
pub fn compose_props(
    props: &[PropItem],
    ctx: &ComposeContext,
) -> StorysheetResult<Option<Composite>> {
    let Some(shape) = PROPS_GRID.shape(props.len()) else {
        tracing::debug!("no props; props sheet absent");
        return Ok(None);
    };

    let mut surface = Surface::new(PROPS_GRID.canvas_size(shape))?;
    surface.fill(Rgba8::LIGHT_GRAY);

    let mut labels = Vec::with_capacity(props.len());
    let mut skipped = 0usize;
    for (index, prop) in props.iter().enumerate() {
        let cell = PROPS_GRID.cell_rect(shape, index);
        let drawn = ctx
            .loader
            .load(&prop.image.source)
            .map_err(Into::into)
            .and_then(|bitmap| {
                PlacedBitmap::new(&bitmap, &fit_inside(bitmap.width, bitmap.height, cell))
            })
            .map(|placed| {
                surface.fill_rect(cell, Rgba8::WHITE);
                surface.draw_placed(&placed);
            });
        match drawn {
            Ok(()) => {
                labels.push(prop_label(index, &prop.description, cell));
                tracing::debug!(index, source = %prop.image.source, "drew prop");
            }
            Err(error) => {
                skipped += 1;
                tracing::warn!(
                    index,
                    source = %prop.image.source,
                    %error,
                    "skipping prop"
                );
            }
        }
    }
    if skipped > 0 {
        tracing::warn!(skipped, total = props.len(), "props sheet is missing items");
    }

    finish_sheet(ctx, Role::Props, surface, &labels).map(Some)
}

fn prop_label(index: usize, description: &str, cell: Rect) -> Label {
    Label {
        text: format!("Prop {}: {}", index + 1, description),
        center_x: cell.center().x,
        y: cell.y1 + LABEL_TOP,
        baseline: Baseline::Top,
        family: "sans-serif",
        size_px: 20.0,
        bold: false,
        color: Rgba8::BLACK,
        max_width: Some(cell.width()),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/props.rs"]
mod tests;
