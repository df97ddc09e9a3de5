//! Turns user actions into outbound calls and decides which completion may
//! touch the session.
//!
//! Every call is handed back to the caller as a [`PendingCall`], a local future
//! that resolves to a [`Completion`]. The event loop owning the orchestrator
//! polls pending calls and feeds each completion to [`Orchestrator::complete`],
//! which applies it only when it belongs to the most recently issued call.

use std::{fmt, rc::Rc, time::Duration};

use futures::future::LocalBoxFuture;

use crate::{
    app::{RefineRequest, SearchBackend, ServiceError},
    config::Config,
};

use super::{
    boundary::{ErrorBoundary, LogOnly},
    history::{original_query, History},
    request::{LatestOnly, RequestToken},
    state::{Phase, Session},
    types::{ImageUpload, SearchResponse, LABEL_SEPARATOR},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    TextSearch,
    ImageSearch,
    Refine,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::TextSearch => "text search",
            Operation::ImageSearch => "image search",
            Operation::Refine => "refine",
        })
    }
}

/// A finished call, waiting to be applied or discarded.
#[derive(Debug)]
pub struct Completion {
    token: RequestToken,
    operation: Operation,
    /// Label the session takes on if this completion is applied.
    label: String,
    history_entry: Option<String>,
    /// The results this completion carries descend from an image search.
    image_origin: bool,
    outcome: Result<SearchResponse, ServiceError>,
}

pub type PendingCall = LocalBoxFuture<'static, Completion>;

/// What [`Orchestrator::complete`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    Failed,
    /// A newer call was issued in the meantime; nothing changed.
    Stale,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub refine_alpha: f32,
    pub fade_delay: Duration,
    pub history_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            refine_alpha: config.refine_alpha,
            fade_delay: config.fade_delay(),
            history_limit: config.history_limit,
        }
    }
}

pub struct Orchestrator<B, E = LogOnly> {
    backend: Rc<B>,
    boundary: E,
    session: Session,
    history: History,
    requests: LatestOnly,
    options: SessionOptions,
}

impl<B: SearchBackend + 'static, E: ErrorBoundary> Orchestrator<B, E> {
    pub fn new(backend: B, boundary: E, options: SessionOptions) -> Self {
        Self {
            backend: Rc::new(backend),
            boundary,
            session: Session::new(),
            history: History::new(options.history_limit),
            requests: LatestOnly::default(),
            options,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn boundary_mut(&mut self) -> &mut E {
        &mut self.boundary
    }

    /// True while the latest issued call has not completed.
    pub fn is_loading(&self) -> bool {
        self.requests.has_active()
    }

    /// Start a text search. Blank queries are ignored.
    pub fn text_search(&mut self, query: &str) -> Option<PendingCall> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        self.session.begin(Phase::Searching);
        let token = self.requests.begin();
        tracing::debug!(%token, "text search: {query:?}");

        let backend = Rc::clone(&self.backend);
        let query = query.to_string();
        Some(Box::pin(async move {
            let outcome = backend.search_text(&query).await;
            Completion {
                token,
                operation: Operation::TextSearch,
                label: query.clone(),
                history_entry: Some(query),
                image_origin: false,
                outcome,
            }
        }))
    }

    /// Start a search by example image. Empty uploads are ignored.
    pub fn image_search(&mut self, upload: ImageUpload) -> Option<PendingCall> {
        if upload.bytes.is_empty() {
            return None;
        }
        if !upload.is_image() {
            tracing::warn!("{} does not look like an image, sending anyway", upload.file_name);
        }

        let label = upload.label();
        self.session.set_query_label(label.clone());
        self.session.begin(Phase::Searching);
        let token = self.requests.begin();
        tracing::debug!(%token, "image search: {}", upload.file_name);

        let backend = Rc::clone(&self.backend);
        Some(Box::pin(async move {
            let outcome = backend.search_image(&upload).await;
            Completion {
                token,
                operation: Operation::ImageSearch,
                label,
                history_entry: None,
                image_origin: true,
                outcome,
            }
        }))
    }

    /// Refine the current results. Needs an embedding from an earlier search
    /// and non-blank text.
    ///
    /// The label extends the one the current results were applied with. A
    /// refinement of image results is not recorded in history, since it
    /// cannot be searched again as text.
    ///
    /// Current entries are marked fading right away. The completion is held
    /// back until the fade delay has passed since issue, while the network
    /// call itself goes out immediately.
    pub fn refine(&mut self, text: &str) -> Option<PendingCall> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let base_embedding = self.session.continuity_embedding()?.clone();

        self.session.begin(Phase::Refining);
        self.session.mark_fading();
        let token = self.requests.begin();
        tracing::debug!(%token, "refine: {text:?}");

        let label = format!("{}{LABEL_SEPARATOR}{text}", self.session.applied_label());
        let image_origin = self.session.is_image_origin();
        let request = RefineRequest {
            base_embedding,
            refinement: text.to_string(),
            alpha: self.options.refine_alpha,
        };
        let delay = self.options.fade_delay;

        let backend = Rc::clone(&self.backend);
        Some(Box::pin(async move {
            let (outcome, ()) = tokio::join!(backend.refine(&request), tokio::time::sleep(delay));
            Completion {
                token,
                operation: Operation::Refine,
                history_entry: (!image_origin).then(|| label.clone()),
                label,
                image_origin,
                outcome,
            }
        }))
    }

    pub fn set_refine_draft(&mut self, draft: &str) {
        self.session.set_refine_draft(draft);
    }

    /// Refine with whatever is in the refinement input field.
    pub fn submit_refine_draft(&mut self) -> Option<PendingCall> {
        let draft = self.session.refine_draft().to_string();
        self.refine(&draft)
    }

    /// Search again for the original query of a history entry.
    pub fn reissue(&mut self, entry: &str) -> Option<PendingCall> {
        let original = original_query(entry).to_string();
        self.text_search(&original)
    }

    pub fn reissue_at(&mut self, index: usize) -> Option<PendingCall> {
        let entry = self.history.get(index)?.to_string();
        self.reissue(&entry)
    }

    /// Clear the session. Calls still in flight will be discarded on arrival.
    pub fn reset(&mut self) {
        self.requests.cancel();
        self.session.reset();
    }

    pub fn select_image_at(&mut self, index: usize) -> bool {
        self.session.select_image_at(index)
    }

    pub fn clear_selection(&mut self) {
        self.session.select_image(None);
    }

    /// Apply a completion if it is still the latest issued call.
    pub fn complete(&mut self, completion: Completion) -> Outcome {
        let Completion {
            token,
            operation,
            label,
            history_entry,
            image_origin,
            outcome,
        } = completion;

        if !self.requests.finish_if_active(token) {
            tracing::debug!(%token, %operation, "discarding stale response");
            return Outcome::Stale;
        }

        let response = outcome.and_then(|response| {
            if response.embedding.is_empty() {
                Err(ServiceError::Malformed("response carries no embedding".into()))
            } else {
                Ok(response)
            }
        });

        match response {
            Ok(SearchResponse { results, embedding }) => {
                tracing::info!(
                    %token,
                    %operation,
                    "{} text / {} image results for {label:?}",
                    results.text_results.len(),
                    results.image_results.len()
                );
                self.session.apply_search_result(results, embedding, label);
                self.session.set_image_origin(image_origin);
                if let Some(entry) = history_entry {
                    self.history.push(&entry);
                }
                if operation == Operation::Refine {
                    self.session.clear_refine_draft();
                }
                Outcome::Applied
            }
            Err(err) => {
                self.session.settle();
                self.boundary.report(operation, &err);
                Outcome::Failed
            }
        }
    }
}
