use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    compose::{ComposeContext, layout::compose_layout, props::compose_props, style::compose_style},
    encode::png::Composite,
    foundation::error::StorysheetResult,
    model::{collections::Collections, items::Role},
};

/// The three composites of one successful run. Absent roles had no input items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    /// Panel layout sheet.
    pub layout: Option<Composite>,
    /// Prop sheet.
    pub props: Option<Composite>,
    /// Style collage.
    pub style: Option<Composite>,
}

impl ReferenceSet {
    /// Composite for `role`, if present.
    pub fn get(&self, role: Role) -> Option<&Composite> {
        match role {
            Role::Layout => self.layout.as_ref(),
            Role::Props => self.props.as_ref(),
            Role::Style => self.style.as_ref(),
        }
    }

    /// Present composites in role order.
    pub fn present(&self) -> impl Iterator<Item = &Composite> {
        Role::ALL.into_iter().filter_map(|role| self.get(role))
    }

    /// `true` when no role produced a composite.
    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }
}

/// Run all three compositors concurrently and gather their results.
///
/// A layout failure or any encoding failure fails the whole set; prop and style item failures
/// have already been absorbed inside their compositors.
#[tracing::instrument(skip_all, fields(
    frames = collections.storyboard.len(),
    props = collections.props.len(),
    styles = collections.styles.len(),
))]
pub fn compose_references(
    collections: &Collections,
    ctx: &ComposeContext,
) -> StorysheetResult<ReferenceSet> {
    let (layout, (props, style)) = rayon::join(
        || compose_layout(collections.storyboard.frames(), ctx),
        || {
            rayon::join(
                || compose_props(collections.props.items(), ctx),
                || compose_style(collections.styles.items(), ctx),
            )
        },
    );
    Ok(ReferenceSet {
        layout: layout?,
        props: props?,
        style: style?,
    })
}

/// Identifies one triggered run. Later tickets always win over earlier ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunTicket {
    generation: u64,
}

impl RunTicket {
    /// Trigger sequence number, starting at 1.
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// What the coordinator currently exposes downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PipelineState {
    /// Nothing has been published yet.
    Idle,
    /// The latest published run succeeded.
    Ready {
        /// Generation of the run that produced `refs`.
        generation: u64,
        /// Its composites.
        refs: Arc<ReferenceSet>,
    },
    /// The latest published run failed; earlier composites are no longer exposed.
    Failed {
        /// Generation of the failed run.
        generation: u64,
        /// User-facing message.
        message: String,
    },
}

impl PipelineState {
    /// Generation of the published run, `0` when idle.
    pub fn generation(&self) -> u64 {
        match self {
            Self::Idle => 0,
            Self::Ready { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }

    /// Composites of a successful run.
    pub fn references(&self) -> Option<&Arc<ReferenceSet>> {
        match self {
            Self::Ready { refs, .. } => Some(refs),
            _ => None,
        }
    }
}

/// Issues run tickets and keeps the newest-triggered result.
///
/// Runs are never cancelled. A run that finishes after a later-triggered run has published is
/// discarded, whichever order they complete in.
#[derive(Debug)]
pub struct Coordinator {
    ctx: ComposeContext,
    issued: AtomicU64,
    published: Mutex<PipelineState>,
}

impl Coordinator {
    /// Coordinator over the given compositor collaborators.
    pub fn new(ctx: ComposeContext) -> Self {
        Self {
            ctx,
            issued: AtomicU64::new(0),
            published: Mutex::new(PipelineState::Idle),
        }
    }

    /// Collaborators used for runs.
    pub fn context(&self) -> &ComposeContext {
        &self.ctx
    }

    /// Start a run; call whenever the source collections change.
    pub fn begin(&self) -> RunTicket {
        RunTicket {
            generation: self.issued.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    /// Compose `collections` for `ticket` without publishing.
    #[tracing::instrument(skip(self, collections), fields(generation = ticket.generation))]
    pub fn compose_all(
        &self,
        ticket: RunTicket,
        collections: &Collections,
    ) -> StorysheetResult<ReferenceSet> {
        compose_references(collections, &self.ctx)
    }

    /// Publish the outcome of `ticket`'s run. Returns `false` when a later run already published.
    pub fn publish(&self, ticket: RunTicket, result: StorysheetResult<ReferenceSet>) -> bool {
        let mut published = self
            .published
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if ticket.generation <= published.generation() {
            tracing::debug!(
                generation = ticket.generation,
                current = published.generation(),
                "discarding stale pipeline result"
            );
            return false;
        }

        *published = match result {
            Ok(refs) => {
                tracing::info!(
                    generation = ticket.generation,
                    present = refs.present().count(),
                    "published references"
                );
                PipelineState::Ready {
                    generation: ticket.generation,
                    refs: Arc::new(refs),
                }
            }
            Err(error) => {
                tracing::warn!(generation = ticket.generation, %error, "pipeline run failed");
                PipelineState::Failed {
                    generation: ticket.generation,
                    message: error.to_string(),
                }
            }
        };
        true
    }

    /// Begin, compose and publish in one call. Returns the state after publishing.
    pub fn refresh(&self, collections: &Collections) -> PipelineState {
        let ticket = self.begin();
        let result = self.compose_all(ticket, collections);
        self.publish(ticket, result);
        self.state()
    }

    /// Snapshot of the published state.
    pub fn state(&self) -> PipelineState {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/coordinator.rs"]
mod tests;
