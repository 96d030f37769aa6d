use std::sync::{Arc, PoisonError, RwLock};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::{
    encode::png::{EncodedImage, PNG_MEDIA_TYPE},
    foundation::{config::Config, error::StorysheetResult},
    generate::service::{
        GenerationError, GenerationRequest, PromptEnhancer, Reauthenticate, SheetRenderer,
        enhancement_instruction,
    },
};

const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;
const NOT_FOUND_MARKER: &str = "Requested entity was not found";

/// API key read from an environment variable, re-read on [`Reauthenticate::reauthenticate`].
#[derive(Debug)]
pub struct EnvCredentials {
    var: String,
    key: RwLock<Option<String>>,
}

impl EnvCredentials {
    /// Read `var` now; a missing variable is reported on first use, not here.
    pub fn new(var: impl Into<String>) -> Self {
        let var = var.into();
        let key = read_key(&var);
        Self {
            var,
            key: RwLock::new(key),
        }
    }

    /// Credentials with a fixed key, for callers that manage keys themselves.
    pub fn with_key(var: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            key: RwLock::new(Some(key.into())),
        }
    }

    fn current(&self) -> Result<String, GenerationError> {
        self.key
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| GenerationError::Credential(format!("{} is not set", self.var)))
    }
}

impl Reauthenticate for EnvCredentials {
    fn reauthenticate(&self) -> Result<(), GenerationError> {
        let fresh = read_key(&self.var)
            .ok_or_else(|| GenerationError::Credential(format!("{} is not set", self.var)))?;
        *self.key.write().unwrap_or_else(PoisonError::into_inner) = Some(fresh);
        tracing::info!(var = %self.var, "reloaded API key");
        Ok(())
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// `generateContent` client for prompt enhancement and sheet rendering.
pub struct GeminiClient {
    agent: ureq::Agent,
    api_base: String,
    enhance_model: String,
    image_model: String,
    credentials: Arc<EnvCredentials>,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("enhance_model", &self.enhance_model)
            .field("image_model", &self.image_model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Client configured from `cfg`, sharing `credentials` with the retry session.
    pub fn new(cfg: &Config, credentials: Arc<EnvCredentials>) -> StorysheetResult<Self> {
        cfg.validate()?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(None)
            .build()
            .into();
        Ok(Self {
            agent,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            enhance_model: cfg.enhance_model.clone(),
            image_model: cfg.image_model.clone(),
            credentials,
        })
    }

    /// The shared credentials.
    pub fn credentials(&self) -> Arc<EnvCredentials> {
        self.credentials.clone()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.api_base)
    }

    fn post(&self, model: &str, body: &wire::Request) -> Result<Vec<u8>, GenerationError> {
        let key = self.credentials.current()?;
        let payload = serde_json::to_vec(body)
            .map_err(|e| GenerationError::Validation(format!("serialize request: {e}")))?;
        let url = self.endpoint(model);
        tracing::debug!(%url, bytes = payload.len(), "posting generateContent");

        let mut resp = self
            .agent
            .post(&url)
            .header("x-goog-api-key", &key)
            .header("Content-Type", "application/json")
            .send(payload.as_slice())
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let bytes = resp
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_vec()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;
        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &bytes));
        }
        Ok(bytes)
    }
}

impl PromptEnhancer for GeminiClient {
    fn enhance(&self, prompt: &str, prop_descriptions: &[String]) -> Result<String, GenerationError> {
        let body = enhance_request(prompt, prop_descriptions);
        let bytes = self.post(&self.enhance_model, &body)?;
        let text = parse_text_response(&bytes)?;
        Ok(if text.is_empty() {
            prompt.to_string()
        } else {
            text
        })
    }
}

impl SheetRenderer for GeminiClient {
    fn render(&self, request: &GenerationRequest) -> Result<EncodedImage, GenerationError> {
        let body = render_request(request);
        let bytes = self.post(&self.image_model, &body)?;
        parse_image_response(&bytes)
    }
}

/// Request body asking the enhancement model for a rewritten prompt.
pub fn enhance_request(prompt: &str, prop_descriptions: &[String]) -> wire::Request {
    wire::Request {
        contents: vec![wire::Content {
            parts: vec![wire::Part::text(enhancement_instruction(
                prompt,
                prop_descriptions,
            ))],
        }],
        generation_config: None,
    }
}

/// Request body for the final sheet: instructions first, then one inline PNG per present role.
pub fn render_request(request: &GenerationRequest) -> wire::Request {
    let mut parts = vec![wire::Part::text(request.instruction_text())];
    parts.extend(request.images().map(|c| wire::Part {
        text: None,
        inline_data: Some(wire::InlineData {
            mime_type: c.image.media_type.clone(),
            data: c.image.base64_payload(),
        }),
    }));
    wire::Request {
        contents: vec![wire::Content { parts }],
        generation_config: Some(wire::GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
            image_config: wire::ImageConfig {
                aspect_ratio: request.aspect_ratio.clone(),
                image_size: request.image_size.clone(),
            },
        }),
    }
}

/// Concatenated text of the first candidate, trimmed.
pub fn parse_text_response(bytes: &[u8]) -> Result<String, GenerationError> {
    let resp = parse_response(bytes)?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    Ok(text.trim().to_string())
}

/// First inline image of the first candidate.
///
/// A response without one is a refusal; block and finish reasons are carried in the message.
pub fn parse_image_response(bytes: &[u8]) -> Result<EncodedImage, GenerationError> {
    let resp = parse_response(bytes)?;
    let block_reason = resp.prompt_feedback.and_then(|f| f.block_reason);
    let mut finish_reason = None;
    for candidate in resp.candidates {
        finish_reason = finish_reason.or(candidate.finish_reason);
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts {
            if let Some(inline) = part.inline_data {
                let bytes = STANDARD.decode(inline.data.trim()).map_err(|e| {
                    GenerationError::Service {
                        status: 200,
                        message: format!("invalid base64 image payload: {e}"),
                    }
                })?;
                let media_type = if inline.mime_type.is_empty() {
                    PNG_MEDIA_TYPE.to_string()
                } else {
                    inline.mime_type
                };
                return Ok(EncodedImage {
                    media_type,
                    bytes: Arc::new(bytes),
                });
            }
        }
    }

    let reason = block_reason
        .or(finish_reason)
        .unwrap_or_else(|| "the model may have refused the request".to_string());
    Err(GenerationError::Refused(reason))
}

/// Map a non-success response to a [`GenerationError`].
pub fn classify_failure(status: u16, body: &[u8]) -> GenerationError {
    let message = serde_json::from_slice::<wire::ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).trim().to_string());
    if status == 401 || status == 403 || message.contains(NOT_FOUND_MARKER) {
        return GenerationError::Credential(message);
    }
    GenerationError::Service { status, message }
}

fn parse_response(bytes: &[u8]) -> Result<wire::Response, GenerationError> {
    serde_json::from_slice(bytes).map_err(|e| GenerationError::Service {
        status: 200,
        message: format!("malformed response: {e}"),
    })
}

/// Build a client with environment credentials from `cfg`.
pub fn client_from_config(cfg: &Config) -> StorysheetResult<GeminiClient> {
    GeminiClient::new(cfg, Arc::new(EnvCredentials::new(&cfg.api_key_env)))
}

/// JSON shapes of the `generateContent` endpoint.
pub mod wire {
    use serde::{Deserialize, Serialize};

    /// Request body.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Request {
        /// Conversation turns; always one.
        pub contents: Vec<Content>,
        /// Output settings for image models.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub generation_config: Option<GenerationConfig>,
    }

    /// One turn.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Content {
        /// Text and image parts.
        pub parts: Vec<Part>,
    }

    /// Text or inline bytes.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Part {
        /// Text content.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub text: Option<String>,
        /// Inline media.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub inline_data: Option<InlineData>,
    }

    impl Part {
        /// Text-only part.
        pub fn text(text: impl Into<String>) -> Self {
            Self {
                text: Some(text.into()),
                inline_data: None,
            }
        }
    }

    /// Base64 media payload.
    #[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct InlineData {
        /// Media type.
        pub mime_type: String,
        /// Base64 bytes.
        pub data: String,
    }

    /// Output settings.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GenerationConfig {
        /// Requested output kinds.
        pub response_modalities: Vec<String>,
        /// Image sizing.
        pub image_config: ImageConfig,
    }

    /// Image sizing.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ImageConfig {
        /// e.g. `16:9`.
        pub aspect_ratio: String,
        /// e.g. `2K`.
        pub image_size: String,
    }

    /// Response body; unknown fields are ignored.
    #[derive(Clone, Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Response {
        /// Generated candidates.
        pub candidates: Vec<Candidate>,
        /// Set when the prompt itself was blocked.
        pub prompt_feedback: Option<PromptFeedback>,
    }

    /// One generated answer.
    #[derive(Clone, Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct Candidate {
        /// Parts of the answer.
        pub content: Option<Content>,
        /// Why generation stopped.
        pub finish_reason: Option<String>,
    }

    /// Prompt-level safety feedback.
    #[derive(Clone, Debug, Default, Deserialize)]
    #[serde(rename_all = "camelCase", default)]
    pub struct PromptFeedback {
        /// Block reason, if blocked.
        pub block_reason: Option<String>,
    }

    /// Error envelope of non-success responses.
    #[derive(Clone, Debug, Deserialize)]
    pub struct ErrorBody {
        /// Error details.
        pub error: ErrorDetail,
    }

    /// Error details.
    #[derive(Clone, Debug, Default, Deserialize)]
    #[serde(default)]
    pub struct ErrorDetail {
        /// HTTP-like code.
        pub code: u16,
        /// Human-readable message.
        pub message: String,
        /// Canonical status name.
        pub status: String,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/gemini.rs"]
mod tests;
