use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::foundation::error::{StorysheetError, StorysheetResult};

/// Runtime configuration.
///
/// Every field has a default, so an empty JSON object (or no file at all) is valid. Environment
/// variables prefixed with `STORYSHEET_` override file values.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Remote fetch timeout in seconds; `0` disables the timeout.
    pub fetch_timeout_secs: u64,
    /// Upper bound on a single remote response body.
    pub max_fetch_bytes: u64,
    /// Extra font directories for label rendering. System fonts are always loaded.
    pub font_dirs: Vec<PathBuf>,
    /// Base URL of the generation API.
    pub api_base: String,
    /// Model used to rewrite the scene prompt.
    pub enhance_model: String,
    /// Model used to render the final sheet.
    pub image_model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Aspect ratio requested for the final sheet.
    pub aspect_ratio: String,
    /// Resolution tier requested for the final sheet.
    pub image_size: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            max_fetch_bytes: 32 * 1024 * 1024,
            font_dirs: Vec::new(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            enhance_model: "gemini-3-flash-preview".to_string(),
            image_model: "gemini-3-pro-image-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            aspect_ratio: "16:9".to_string(),
            image_size: "2K".to_string(),
        }
    }
}

impl Config {
    /// Load from an optional JSON file, then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> StorysheetResult<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON config file without applying overrides.
    pub fn from_json_file(path: &Path) -> StorysheetResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        serde_json::from_str(&text)
            .map_err(|e| StorysheetError::config(format!("parse '{}': {e}", path.display())))
    }

    /// Apply `STORYSHEET_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> StorysheetResult<()> {
        if let Some(v) = lookup("STORYSHEET_FETCH_TIMEOUT_SECS") {
            self.fetch_timeout_secs = parse_u64("STORYSHEET_FETCH_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("STORYSHEET_MAX_FETCH_BYTES") {
            self.max_fetch_bytes = parse_u64("STORYSHEET_MAX_FETCH_BYTES", &v)?;
        }
        if let Some(v) = lookup("STORYSHEET_FONT_DIRS") {
            self.font_dirs = std::env::split_paths(&v).collect();
        }
        if let Some(v) = lookup("STORYSHEET_API_BASE") {
            self.api_base = v;
        }
        if let Some(v) = lookup("STORYSHEET_ENHANCE_MODEL") {
            self.enhance_model = v;
        }
        if let Some(v) = lookup("STORYSHEET_IMAGE_MODEL") {
            self.image_model = v;
        }
        Ok(())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> StorysheetResult<()> {
        if self.max_fetch_bytes == 0 {
            return Err(StorysheetError::config("max_fetch_bytes must be > 0"));
        }
        for (name, value) in [
            ("api_base", &self.api_base),
            ("enhance_model", &self.enhance_model),
            ("image_model", &self.image_model),
            ("api_key_env", &self.api_key_env),
            ("aspect_ratio", &self.aspect_ratio),
            ("image_size", &self.image_size),
        ] {
            if value.trim().is_empty() {
                return Err(StorysheetError::config(format!("{name} must be non-empty")));
            }
        }
        Ok(())
    }

    /// Fetch timeout, or `None` when disabled.
    pub fn fetch_timeout(&self) -> Option<std::time::Duration> {
        (self.fetch_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.fetch_timeout_secs))
    }
}

fn parse_u64(name: &str, value: &str) -> StorysheetResult<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| StorysheetError::config(format!("{name} must be an unsigned integer")))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
