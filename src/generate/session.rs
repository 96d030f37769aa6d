use crate::{
    encode::png::EncodedImage,
    generate::service::{
        GenerationError, GenerationRequest, PromptEnhancer, Reauthenticate, SheetRenderer,
    },
};

/// States of one generation attempt.
///
/// `Idle -> Enhancing -> Rendering -> Done`, or after a credential failure
/// `Rendering -> AuthRetry -> Enhancing -> Rendering -> Done | Failed`. `AuthRetry` is entered at
/// most once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationStep {
    /// Not started.
    Idle,
    /// Rewriting the prompt.
    Enhancing,
    /// Rendering the sheet.
    Rendering,
    /// Refreshing credentials before the single replay.
    AuthRetry,
    /// Sheet produced.
    Done,
    /// Gave up.
    Failed,
}

/// Drives enhancement and rendering with a single credential retry.
pub struct GenerationSession<'a> {
    enhancer: &'a dyn PromptEnhancer,
    renderer: &'a dyn SheetRenderer,
    auth: &'a dyn Reauthenticate,
    trail: Vec<GenerationStep>,
    used_prompt: Option<String>,
}

impl std::fmt::Debug for GenerationSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSession")
            .field("trail", &self.trail)
            .field("used_prompt", &self.used_prompt)
            .finish_non_exhaustive()
    }
}

impl<'a> GenerationSession<'a> {
    /// Session over the given collaborators.
    pub fn new(
        enhancer: &'a dyn PromptEnhancer,
        renderer: &'a dyn SheetRenderer,
        auth: &'a dyn Reauthenticate,
    ) -> Self {
        Self {
            enhancer,
            renderer,
            auth,
            trail: vec![GenerationStep::Idle],
            used_prompt: None,
        }
    }

    /// Current step.
    pub fn step(&self) -> GenerationStep {
        self.trail
            .last()
            .copied()
            .unwrap_or(GenerationStep::Idle)
    }

    /// Every step visited by the latest run, starting with `Idle`.
    pub fn trail(&self) -> &[GenerationStep] {
        &self.trail
    }

    /// Prompt sent to the renderer on the latest attempt.
    pub fn used_prompt(&self) -> Option<&str> {
        self.used_prompt.as_deref()
    }

    /// Enhance `request.prompt`, then render.
    ///
    /// Enhancement failures of any kind fall back to the original prompt. A credential failure
    /// while rendering triggers one re-authentication and a replay of both steps.
    #[tracing::instrument(skip_all, fields(images = request.images().count()))]
    pub fn run(
        &mut self,
        request: &GenerationRequest,
        prop_descriptions: &[String],
    ) -> Result<EncodedImage, GenerationError> {
        self.trail.clear();
        self.trail.push(GenerationStep::Idle);
        self.used_prompt = None;

        if request.prompt.trim().is_empty() {
            self.enter(GenerationStep::Failed);
            return Err(GenerationError::Validation(
                "prompt must not be empty".to_string(),
            ));
        }

        let mut retried = false;
        loop {
            self.enter(GenerationStep::Enhancing);
            let prompt = self.enhanced_prompt(&request.prompt, prop_descriptions);

            self.enter(GenerationStep::Rendering);
            let attempt = request.with_prompt(prompt.clone());
            self.used_prompt = Some(prompt);
            match self.renderer.render(&attempt) {
                Ok(image) => {
                    self.enter(GenerationStep::Done);
                    tracing::info!(bytes = image.bytes.len(), retried, "sheet generated");
                    return Ok(image);
                }
                Err(error) if error.is_credential() && !retried => {
                    retried = true;
                    self.enter(GenerationStep::AuthRetry);
                    tracing::warn!(%error, "credential rejected; re-authenticating once");
                    if let Err(auth_error) = self.auth.reauthenticate() {
                        self.enter(GenerationStep::Failed);
                        return Err(auth_error);
                    }
                }
                Err(error) => {
                    self.enter(GenerationStep::Failed);
                    tracing::warn!(%error, "sheet generation failed");
                    return Err(error);
                }
            }
        }
    }

    fn enhanced_prompt(&self, prompt: &str, prop_descriptions: &[String]) -> String {
        match self.enhancer.enhance(prompt, prop_descriptions) {
            Ok(enhanced) if !enhanced.trim().is_empty() => enhanced.trim().to_string(),
            Ok(_) => prompt.to_string(),
            Err(error) => {
                tracing::warn!(%error, "prompt enhancement failed; using original prompt");
                prompt.to_string()
            }
        }
    }

    fn enter(&mut self, step: GenerationStep) {
        tracing::debug!(?step, "generation step");
        self.trail.push(step);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generate/session.rs"]
mod tests;
