use crate::{
    compose::{ComposeContext, finish_sheet},
    encode::png::Composite,
    foundation::{
        error::StorysheetResult,
        geometry::{GridSpec, cover},
    },
    model::items::{Role, StyleItem},
    render::surface::Surface,
};

/// Seamless 400px squares, three per row, no captions.
pub const STYLE_GRID: GridSpec = GridSpec {
    max_cols: 3,
    cell_width: 400,
    cell_height: 400,
    padding: 0,
    label_band: 0,
};

/// Collage style references edge to edge, each scaled to cover its square and center-cropped.
///
/// The canvas starts transparent and stays that way under items that fail; like
/// [`compose_props`](super::props::compose_props), failures are logged and skipped without
/// shifting later items.
///
/// The canvas is capped at 65535px per side: 163 rows, so at most 489 styles. Beyond that the
/// sheet fails with an encoding error.
#[tracing::instrument(skip_all, fields(styles = styles.len()))]
pub fn compose_style(
    styles: &[StyleItem],
    ctx: &ComposeContext,
) -> StorysheetResult<Option<Composite>> {
    let Some(shape) = STYLE_GRID.shape(styles.len()) else {
        tracing::debug!("no styles; style sheet absent");
        return Ok(None);
    };

    let mut surface = Surface::new(STYLE_GRID.canvas_size(shape))?;

    for (index, item) in styles.iter().enumerate() {
        let cell = STYLE_GRID.cell_rect(shape, index);
        let drawn = ctx
            .loader
            .load(&item.image.source)
            .map_err(Into::into)
            .and_then(|bitmap| {
                let placement = cover(bitmap.width, bitmap.height, cell);
                surface.draw_bitmap_clipped(&bitmap, &placement, cell)
            });
        match drawn {
            Ok(()) => tracing::debug!(index, source = %item.image.source, "drew style"),
            Err(error) => tracing::warn!(
                index,
                source = %item.image.source,
                %error,
                "skipping style image"
            ),
        }
    }

    finish_sheet(ctx, Role::Style, surface, &[]).map(Some)
}

#[cfg(test)]
#[path = "../../tests/unit/compose/style.rs"]
mod tests;
