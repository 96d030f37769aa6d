use crate::{
    encode::png::{Composite, EncodedImage},
    foundation::config::Config,
    model::items::Role,
    pipeline::coordinator::ReferenceSet,
};

/// Failure reported by the external generation service.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// The API key is missing, invalid, or expired.
    #[error("API key invalid or expired: {0}")]
    Credential(String),

    /// The service answered without an image, e.g. a safety refusal.
    #[error("no image was generated: {0}")]
    Refused(String),

    /// Non-success HTTP status with the service's message.
    #[error("service returned {status}: {message}")]
    Service {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request was rejected before being sent.
    #[error("invalid request: {0}")]
    Validation(String),
}

impl GenerationError {
    /// Whether re-authenticating and replaying could help.
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential(_))
    }
}

/// Rewrites a short scene description into a detailed image prompt.
pub trait PromptEnhancer: Send + Sync {
    /// `prop_descriptions` holds only non-empty descriptions.
    fn enhance(&self, prompt: &str, prop_descriptions: &[String]) -> Result<String, GenerationError>;
}

/// Renders the final storyboard sheet from a prompt and reference composites.
pub trait SheetRenderer: Send + Sync {
    /// Returns the rendered sheet or a structured failure.
    fn render(&self, request: &GenerationRequest) -> Result<EncodedImage, GenerationError>;
}

/// Refreshes credentials after a [`GenerationError::Credential`] failure.
pub trait Reauthenticate: Send + Sync {
    /// Obtain fresh credentials for the replayed attempt.
    fn reauthenticate(&self) -> Result<(), GenerationError>;
}

/// Everything the renderer needs for one sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Scene description, possibly enhanced.
    pub prompt: String,
    /// Panel layout reference.
    pub layout: Option<Composite>,
    /// Prop reference.
    pub props: Option<Composite>,
    /// Style reference.
    pub style: Option<Composite>,
    /// Requested aspect ratio, e.g. `16:9`.
    pub aspect_ratio: String,
    /// Requested resolution tier, e.g. `2K`.
    pub image_size: String,
}

const INSTRUCTIONS: &str = "\
Generate a high-fidelity, production-ready storyboard sheet based on the provided reference images.

STRICTLY FOLLOW THESE REFERENCE ROLES:
1. LAYOUT REFERENCE (The image with panels labeled \"Frame X\"): Use this strictly for composition, camera angles, and sequence. Preserve the number of panels and their arrangement.
2. PROP REFERENCE (The image with items labeled \"Prop X\"): Use these specific character/object designs within the scene.
3. STYLE REFERENCE (The collage/artistic image): Apply this visual art style (rendering, lighting, textures) to the final output.";

impl GenerationRequest {
    /// Request for `prompt` over a published reference set, sized per `cfg`.
    pub fn new(prompt: impl Into<String>, refs: &ReferenceSet, cfg: &Config) -> Self {
        Self {
            prompt: prompt.into(),
            layout: refs.layout.clone(),
            props: refs.props.clone(),
            style: refs.style.clone(),
            aspect_ratio: cfg.aspect_ratio.clone(),
            image_size: cfg.image_size.clone(),
        }
    }

    /// Same request with a different prompt.
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }

    /// Role instructions followed by the scene description.
    pub fn instruction_text(&self) -> String {
        format!("{INSTRUCTIONS}\n\nSCENE DESCRIPTION: {}", self.prompt)
    }

    /// Present composites in role order; absent roles are skipped entirely.
    pub fn images(&self) -> impl Iterator<Item = &Composite> {
        Role::ALL.into_iter().filter_map(|role| match role {
            Role::Layout => self.layout.as_ref(),
            Role::Props => self.props.as_ref(),
            Role::Style => self.style.as_ref(),
        })
    }
}

/// Instruction sent to the enhancement model.
pub fn enhancement_instruction(prompt: &str, prop_descriptions: &[String]) -> String {
    let props = if prop_descriptions.is_empty() {
        String::new()
    } else {
        format!(
            "The scene involves these specific props which have been provided as reference images: {}.",
            prop_descriptions.join(", ")
        )
    };
    format!(
        "You are an expert storyboard artist assistant.\n\n\
         Task: Rewrite the user's scene description into a highly detailed, visually rich prompt \
         suitable for a high-end image generation model.\n\
         Focus on composition, lighting, camera angle, and action.\n\
         {props}\n\n\
         Original Description: \"{prompt}\"\n\n\
         Output ONLY the enhanced description text. Do not include explanations."
    )
}

#[cfg(test)]
#[path = "../../tests/unit/generate/service.rs"]
mod tests;
