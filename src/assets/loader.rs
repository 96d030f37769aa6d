use std::io::Read as _;

use crate::{
    assets::decode::{Bitmap, decode_image},
    foundation::{config::Config, error::LoadError},
    model::items::SourceRef,
};

/// Resolves a [`SourceRef`] into decoded pixels.
///
/// Implementations must hand back bitmaps whose pixels are fully readable; anything that cannot
/// be turned into pixels is a [`LoadError`] naming the reference, never a blank bitmap.
pub trait ImageLoader: Send + Sync {
    /// Load and decode one source.
    fn load(&self, source: &SourceRef) -> Result<Bitmap, LoadError>;
}

/// Loader for remote URLs (`ureq`), local files, and inline bytes.
///
/// One attempt per call; there is no retry and no fallback to a less strict fetch mode.
pub struct DefaultLoader {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl std::fmt::Debug for DefaultLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultLoader")
            .field("max_bytes", &self.max_bytes)
            .finish_non_exhaustive()
    }
}

impl DefaultLoader {
    /// Build from fetch settings in `cfg`.
    pub fn new(cfg: &Config) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(cfg.fetch_timeout())
            .build()
            .into();
        Self {
            agent,
            max_bytes: cfg.max_fetch_bytes,
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        let mut resp = self
            .agent
            .get(url)
            .header("Accept", "image/*")
            .call()
            .map_err(|e| e.to_string())?;
        resp.body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(|e| e.to_string())
    }

    fn read_file(&self, path: &std::path::Path) -> Result<Vec<u8>, String> {
        let file = std::fs::File::open(path).map_err(|e| e.to_string())?;
        let mut bytes = Vec::new();
        file.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|e| e.to_string())?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(format!("file exceeds {} bytes", self.max_bytes));
        }
        Ok(bytes)
    }
}

impl Default for DefaultLoader {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl ImageLoader for DefaultLoader {
    fn load(&self, source: &SourceRef) -> Result<Bitmap, LoadError> {
        let reference = source.to_string();
        let decoded = match source {
            SourceRef::Remote(url) => {
                let bytes = self
                    .fetch(url)
                    .map_err(|e| LoadError::new(&reference, format!("fetch failed: {e}")))?;
                decode_image(&bytes)
            }
            SourceRef::File(path) => {
                let bytes = self
                    .read_file(path)
                    .map_err(|e| LoadError::new(&reference, format!("read failed: {e}")))?;
                decode_image(&bytes)
            }
            SourceRef::Inline(bytes) => decode_image(bytes),
        };
        let bitmap = decoded.map_err(|e| LoadError::new(&reference, format!("{e:#}")))?;
        tracing::debug!(
            source = %reference,
            width = bitmap.width,
            height = bitmap.height,
            "loaded image"
        );
        Ok(bitmap)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/loader.rs"]
mod tests;
