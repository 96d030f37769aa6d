//! The three reference compositors.
//!
//! Each compositor owns one [`Surface`] for the duration of a run, processes its items strictly
//! in sequence, and returns `None` for empty input. Failure policy differs by role:
//! [`layout`] fails fast on the first unloadable frame, while [`props`] and [`style`] skip the
//! item, log it, and leave its grid slot blank.

use std::sync::Arc;

use crate::{
    assets::loader::{DefaultLoader, ImageLoader},
    encode::png::Composite,
    foundation::{config::Config, error::StorysheetResult},
    model::items::Role,
    render::{
        blend::over_in_place,
        surface::Surface,
        text::{Label, LabelRenderer},
    },
};

pub mod layout;
pub mod props;
pub mod style;

/// Shared, read-only collaborators for compositor runs.
#[derive(Clone)]
pub struct ComposeContext {
    /// Resolves source references into bitmaps.
    pub loader: Arc<dyn ImageLoader>,
    /// Burns labels into finished sheets.
    pub labels: LabelRenderer,
}

impl std::fmt::Debug for ComposeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposeContext")
            .field("labels", &self.labels)
            .finish_non_exhaustive()
    }
}

impl ComposeContext {
    /// Build with explicit collaborators.
    pub fn new(loader: Arc<dyn ImageLoader>, labels: LabelRenderer) -> Self {
        Self { loader, labels }
    }

    /// Default loader and label fonts from `cfg`.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            Arc::new(DefaultLoader::new(cfg)),
            LabelRenderer::new(&cfg.font_dirs),
        )
    }
}

/// Rasterize `surface`, composite `labels` over it, and encode for `role`.
fn finish_sheet(
    ctx: &ComposeContext,
    role: Role,
    surface: Surface,
    labels: &[Label],
) -> StorysheetResult<Composite> {
    let mut raster = surface.finish();
    if let Some(layer) = ctx
        .labels
        .render_layer(raster.width, raster.height, labels)?
    {
        over_in_place(&mut raster.data, &layer)?;
    }
    let composite = Composite::from_raster(role, &raster)?;
    tracing::info!(
        role = %role,
        width = composite.width,
        height = composite.height,
        bytes = composite.image.bytes.len(),
        "composite ready"
    );
    Ok(composite)
}
