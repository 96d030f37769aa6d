use std::{
    fmt,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    encode::data_uri,
    foundation::error::{StorysheetError, StorysheetResult},
};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier assigned when a source item is created. Never reused within a process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(u64);

impl SourceId {
    /// Allocate a fresh identifier.
    pub fn next() -> Self {
        Self(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Access raw 64-bit identifier.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Where the pixels of a source image come from.
#[derive(Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// Absolute `http(s)` URL fetched at load time.
    Remote(String),
    /// File on the local filesystem.
    File(PathBuf),
    /// Bytes already held in memory (uploads, pasted data URIs, painted frames).
    Inline(Arc<Vec<u8>>),
}

impl SourceRef {
    /// Classify a user-supplied string.
    ///
    /// `http://` and `https://` become [`SourceRef::Remote`], base64 `data:` URIs are decoded into
    /// [`SourceRef::Inline`], and anything else is treated as a file path.
    pub fn parse(s: &str) -> StorysheetResult<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StorysheetError::validation("image source must be non-empty"));
        }
        let lower = s.get(..8).unwrap_or(s).to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Ok(Self::Remote(s.to_string()));
        }
        if data_uri::is_data_uri(s) {
            let parsed = data_uri::parse_data_uri(s)?;
            return Ok(Self::inline(parsed.bytes));
        }
        Ok(Self::File(PathBuf::from(s)))
    }

    /// Wrap in-memory encoded image bytes.
    pub fn inline(bytes: Vec<u8>) -> Self {
        Self::Inline(Arc::new(bytes))
    }

    /// `true` for locally-held sources, `false` for remote URLs.
    pub fn is_upload(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(bytes) => write!(f, "inline:{} bytes", bytes.len()),
        }
    }
}

impl fmt::Debug for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.debug_tuple("Remote").field(url).finish(),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Inline(bytes) => f
                .debug_struct("Inline")
                .field("len", &bytes.len())
                .finish(),
        }
    }
}

/// A single user-supplied bitmap reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    /// Identity assigned at creation.
    pub id: SourceId,
    /// Pixel source.
    pub source: SourceRef,
}

impl SourceImage {
    /// Create with a freshly allocated [`SourceId`].
    pub fn new(source: SourceRef) -> Self {
        Self {
            id: SourceId::next(),
            source,
        }
    }

    /// Origin flag: uploaded/local versus remote.
    pub fn is_upload(&self) -> bool {
        self.source.is_upload()
    }
}

/// One storyboard panel. `order` sequences panels independently of insertion order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoryboardFrame {
    /// Panel bitmap.
    pub image: SourceImage,
    /// Sort key; need not be contiguous or unique.
    pub order: i64,
}

/// A prop reference with a label burned in under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropItem {
    /// Prop bitmap.
    pub image: SourceImage,
    /// Label text; may be empty but is always rendered.
    pub description: String,
}

/// A style reference. No textual metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StyleItem {
    /// Style bitmap.
    pub image: SourceImage,
}

/// The three fixed reference roles fed to the generation service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Panel layout sheet.
    Layout,
    /// Prop sheet.
    Props,
    /// Style collage.
    Style,
}

impl Role {
    /// All roles in the order they are sent downstream.
    pub const ALL: [Role; 3] = [Role::Layout, Role::Props, Role::Style];

    /// Human-facing caption.
    pub fn caption(self) -> &'static str {
        match self {
            Role::Layout => "Ref 1: Layout",
            Role::Props => "Ref 2: Props",
            Role::Style => "Ref 3: Style",
        }
    }

    /// Lowercase name, used for file stems and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Role::Layout => "layout",
            Role::Props => "props",
            Role::Style => "style",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/items.rs"]
mod tests;
