//! Storysheet turns storyboard sketches, prop photos and style images into the three reference
//! sheets an image model needs, then asks that model for a finished storyboard sheet.
//!
//! # Pipeline overview
//!
//! 1. **Collect**: [`Storyboard`], [`PropSheet`] and [`StyleBoard`] hold [`SourceRef`]s
//!    (URLs, files, inline bytes), usually loaded from a [`ProjectFile`].
//! 2. **Compose**: [`compose_layout`], [`compose_props`] and [`compose_style`] each draw one
//!    fixed grid on an exclusively-owned CPU surface and encode it as a PNG [`Composite`].
//! 3. **Coordinate**: [`Coordinator`] runs all three concurrently and keeps only the result of
//!    the most recently triggered run.
//! 4. **Generate** (optional): [`GenerationSession`] enhances the prompt and renders the final
//!    sheet, re-authenticating at most once.
//!
//! Failure policy is deliberately asymmetric: a storyboard frame that cannot be loaded fails the
//! layout sheet and the whole run, while unloadable props and styles are skipped and leave an
//! empty slot.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod encode;
mod foundation;
mod generate;
mod model;
mod pipeline;
mod render;

pub use assets::decode::{Bitmap, decode_image};
pub use assets::loader::{DefaultLoader, ImageLoader};
pub use compose::ComposeContext;
pub use compose::layout::{LAYOUT_GRID, blank_frame, compose_layout};
pub use compose::props::{PROPS_GRID, compose_props};
pub use compose::style::{STYLE_GRID, compose_style};
pub use encode::data_uri::{DataUri, is_data_uri, parse_data_uri, to_data_uri};
pub use encode::png::{Composite, EncodedImage, PNG_MEDIA_TYPE};
pub use foundation::config::Config;
pub use foundation::error::{LoadError, StorysheetError, StorysheetResult};
pub use foundation::geometry::{
    CanvasSize, GridShape, GridSpec, Placement, Rect, cover, fit_inside, stretch,
};
pub use generate::gemini::{
    EnvCredentials, GeminiClient, classify_failure, client_from_config, enhance_request,
    parse_image_response, parse_text_response, render_request, wire,
};
pub use generate::service::{
    GenerationError, GenerationRequest, PromptEnhancer, Reauthenticate, SheetRenderer,
    enhancement_instruction,
};
pub use generate::session::{GenerationSession, GenerationStep};
pub use model::collections::{Collections, PropSheet, StyleBoard, Storyboard};
pub use model::items::{PropItem, Role, SourceId, SourceImage, SourceRef, StoryboardFrame, StyleItem};
pub use model::project::{FrameEntry, ProjectFile, PropEntry, StyleEntry, load_project};
pub use pipeline::coordinator::{
    Coordinator, PipelineState, ReferenceSet, RunTicket, compose_references,
};
pub use render::blend::{over, over_in_place, unpremultiply_in_place};
pub use render::surface::{PlacedBitmap, Raster, Rgba8, Surface};
pub use render::text::{Baseline, Label, LabelRenderer};
