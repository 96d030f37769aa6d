use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    foundation::error::{StorysheetError, StorysheetResult},
    model::collections::{Collections, PropSheet, StyleBoard, Storyboard},
    model::items::SourceRef,
};

/// On-disk description of the three source collections.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    /// Storyboard panels.
    #[serde(default)]
    pub frames: Vec<FrameEntry>,
    /// Prop references.
    #[serde(default)]
    pub props: Vec<PropEntry>,
    /// Style references.
    #[serde(default)]
    pub styles: Vec<StyleEntry>,
}

/// One storyboard panel entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameEntry {
    /// URL, `data:` URI, or file path.
    pub source: String,
    /// Sort key; defaults to the entry's index.
    #[serde(default)]
    pub order: Option<i64>,
}

/// One prop entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropEntry {
    /// URL, `data:` URI, or file path.
    pub source: String,
    /// Label text.
    #[serde(default)]
    pub description: String,
}

/// One style entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleEntry {
    /// URL, `data:` URI, or file path.
    pub source: String,
}

impl ProjectFile {
    /// Read and parse a project JSON file.
    pub fn read(path: &Path) -> StorysheetResult<Self> {
        let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
        serde_json::from_reader(BufReader::new(f))
            .map_err(|e| StorysheetError::validation(format!("parse project JSON: {e}")))
    }

    /// Build collections, resolving relative file paths against `base_dir`.
    pub fn into_collections(self, base_dir: &Path) -> StorysheetResult<Collections> {
        let mut storyboard = Storyboard::new();
        for (i, entry) in self.frames.into_iter().enumerate() {
            let source = resolve(&entry.source, base_dir)?;
            let order = entry.order.unwrap_or(i as i64);
            storyboard.insert_frame_with_order(source, order);
        }

        let mut props = PropSheet::new();
        for entry in self.props {
            props.add(resolve(&entry.source, base_dir)?, entry.description);
        }

        let mut styles = StyleBoard::new();
        for entry in self.styles {
            styles.add(resolve(&entry.source, base_dir)?);
        }

        Ok(Collections {
            storyboard,
            props,
            styles,
        })
    }
}

/// Read `path` and build collections relative to its directory.
pub fn load_project(path: &Path) -> StorysheetResult<Collections> {
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    ProjectFile::read(path)?.into_collections(base)
}

fn resolve(source: &str, base_dir: &Path) -> StorysheetResult<SourceRef> {
    Ok(match SourceRef::parse(source)? {
        SourceRef::File(p) if p.is_relative() => SourceRef::File(join(base_dir, &p)),
        other => other,
    })
}

fn join(base: &Path, rel: &Path) -> PathBuf {
    if base.as_os_str().is_empty() {
        rel.to_path_buf()
    } else {
        base.join(rel)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/project.rs"]
mod tests;
