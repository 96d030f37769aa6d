use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{StorysheetError, StorysheetResult};

/// Format `bytes` as `data:<media_type>;base64,<payload>`.
pub fn to_data_uri(media_type: &str, bytes: &[u8]) -> String {
    format!("data:{media_type};base64,{}", STANDARD.encode(bytes))
}

/// A decoded `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataUri {
    /// Media type, e.g. `image/png`. Empty when the URI omits it.
    pub media_type: String,
    /// Decoded payload.
    pub bytes: Vec<u8>,
}

/// Whether `s` looks like a `data:` URI. Does not validate the payload.
pub fn is_data_uri(s: &str) -> bool {
    s.get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
}

/// Parse a base64 `data:` URI. Only the base64 form is accepted.
pub fn parse_data_uri(s: &str) -> StorysheetResult<DataUri> {
    if !is_data_uri(s) {
        return Err(StorysheetError::validation("not a data: URI"));
    }
    let rest = &s[5..];
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| StorysheetError::validation("data: URI is missing ','"))?;

    let mut params = header.split(';');
    let media_type = params.next().unwrap_or_default().trim().to_string();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(StorysheetError::validation(
            "only base64 data: URIs are supported",
        ));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| StorysheetError::validation(format!("invalid base64 payload: {e}")))?;
    Ok(DataUri { media_type, bytes })
}

#[cfg(test)]
#[path = "../../tests/unit/encode/data_uri.rs"]
mod tests;
