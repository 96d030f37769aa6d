use std::{fmt::Write as _, path::Path, sync::Arc};

use anyhow::Context;

use crate::{
    foundation::error::{StorysheetError, StorysheetResult},
    render::surface::Rgba8,
};

/// Vertical anchoring of a label's `y` coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Baseline {
    /// `y` is the alphabetic baseline.
    Alphabetic,
    /// `y` is the top of the text box.
    Top,
}

/// A single line of text burned into a composite, horizontally centered on `center_x`.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Text content.
    pub text: String,
    /// Horizontal center in canvas pixels.
    pub center_x: f64,
    /// Vertical anchor in canvas pixels, see [`Baseline`].
    pub y: f64,
    /// How `y` is interpreted.
    pub baseline: Baseline,
    /// CSS font-family list.
    pub family: &'static str,
    /// Font size in pixels.
    pub size_px: f32,
    /// Bold weight.
    pub bold: bool,
    /// Fill color.
    pub color: Rgba8,
    /// Wider text is condensed horizontally to this width.
    pub max_width: Option<f64>,
}

/// Rasterizes labels through `usvg`/`resvg` against a shared font database.
///
/// Cloning is cheap; the font database is built once. When no fonts are available labels are
/// skipped rather than failing the composite.
#[derive(Clone)]
pub struct LabelRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for LabelRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelRenderer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl LabelRenderer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files in `font_dirs`.
    pub fn new(font_dirs: &[impl AsRef<Path>]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir.as_ref());
        }
        if db.is_empty() {
            tracing::warn!("no fonts available; composite labels will not be drawn");
        } else {
            tracing::debug!(faces = db.len(), "label font database ready");
        }
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Renderer backed by an explicit database.
    pub fn with_database(db: usvg::fontdb::Database) -> Self {
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Number of loaded font faces.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Render `labels` into a transparent premultiplied RGBA8 layer of `width x height`.
    ///
    /// Returns `None` when nothing visible was produced.
    pub fn render_layer(
        &self,
        width: u32,
        height: u32,
        labels: &[Label],
    ) -> StorysheetResult<Option<Vec<u8>>> {
        if labels.is_empty() || self.fontdb.is_empty() {
            return Ok(None);
        }

        let mut body = String::new();
        for label in labels {
            let fit = match label.max_width {
                Some(max) => self.measure(label)?.filter(|&w| w > max).map(|_| max),
                None => None,
            };
            write_text_element(&mut body, label, fit);
        }

        let tree = self.parse(width, height, &body)?;
        if !tree.root().has_children() {
            return Ok(None);
        }

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| StorysheetError::encoding("failed to allocate label pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::default(),
            &mut pixmap.as_mut(),
        );
        Ok(Some(pixmap.take()))
    }

    /// Natural ink width of `label`, or `None` if it produced no glyphs.
    pub fn measure(&self, label: &Label) -> StorysheetResult<Option<f64>> {
        let probe = Label {
            center_x: 0.0,
            y: 0.0,
            max_width: None,
            ..label.clone()
        };
        let mut body = String::new();
        write_text_element(&mut body, &probe, None);
        let tree = self.parse(1, 1, &body)?;
        if !tree.root().has_children() {
            return Ok(None);
        }
        let width = f64::from(tree.root().abs_bounding_box().width());
        Ok((width > 0.0).then_some(width))
    }

    fn parse(&self, width: u32, height: u32, body: &str) -> StorysheetResult<usvg::Tree> {
        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">{body}</svg>"#
        );
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse label svg")?;
        Ok(tree)
    }
}

fn write_text_element(out: &mut String, label: &Label, fit_width: Option<f64>) {
    let baseline = match label.baseline {
        Baseline::Alphabetic => "alphabetic",
        Baseline::Top => "text-before-edge",
    };
    let weight = if label.bold { "bold" } else { "normal" };
    let _ = write!(
        out,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{weight}" text-anchor="middle" dominant-baseline="{baseline}" fill="{}""#,
        label.center_x,
        label.y,
        label.family,
        label.size_px,
        label.color.to_hex(),
    );
    if let Some(w) = fit_width {
        let _ = write!(out, r#" textLength="{w}" lengthAdjust="spacingAndGlyphs""#);
    }
    let _ = write!(out, ">{}</text>", escape_xml(&label.text));
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(e) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable font");
        }
    }
}

fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            // Fall back to any face when the requested families are missing.
            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
