use serde::Serialize;

use super::types::{Embedding, ImageResult, Results};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No query issued yet, or the session was cleared.
    #[default]
    Idle,
    Searching,
    Refining,
    /// Results present, nothing in flight.
    Showing,
}

impl Phase {
    pub fn is_loading(self) -> bool {
        matches!(self, Phase::Searching | Phase::Refining)
    }
}

/// Everything the front-end displays. Mutated only through the methods below,
/// which the orchestrator calls.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Session {
    phase: Phase,
    query_label: String,
    continuity_embedding: Option<Embedding>,
    results: Results,
    selected_result: Option<ImageResult>,
    #[serde(skip)]
    refine_draft: String,
    /// Label of the results on screen; `query_label` may run ahead of it
    /// while an image search is in flight.
    #[serde(skip)]
    applied_label: String,
    /// The results on screen descend from an image search.
    #[serde(skip)]
    image_origin: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn query_label(&self) -> &str {
        &self.query_label
    }

    pub fn continuity_embedding(&self) -> Option<&Embedding> {
        self.continuity_embedding.as_ref()
    }

    pub fn results(&self) -> &Results {
        &self.results
    }

    pub fn selected_result(&self) -> Option<&ImageResult> {
        self.selected_result.as_ref()
    }

    pub fn refine_draft(&self) -> &str {
        &self.refine_draft
    }

    pub fn applied_label(&self) -> &str {
        &self.applied_label
    }

    /// True when the results on screen came from an image search or a
    /// refinement of one.
    pub fn is_image_origin(&self) -> bool {
        self.image_origin
    }

    /// Replace results and embedding from a completed call.
    pub fn apply_search_result(&mut self, results: Results, embedding: Embedding, query_label: String) {
        self.results = results;
        self.continuity_embedding = Some(embedding);
        self.applied_label.clone_from(&query_label);
        self.query_label = query_label;
        self.phase = Phase::Showing;
    }

    /// Back to idle. History lives elsewhere and is untouched.
    pub fn reset(&mut self) {
        self.results = Results::default();
        self.continuity_embedding = None;
        self.query_label.clear();
        self.applied_label.clear();
        self.image_origin = false;
        self.selected_result = None;
        self.refine_draft.clear();
        self.phase = Phase::Idle;
    }

    pub fn select_image(&mut self, result: Option<ImageResult>) {
        self.selected_result = result;
    }

    /// Select the n-th image result. Returns false when out of range.
    pub fn select_image_at(&mut self, index: usize) -> bool {
        match self.results.image_results.get(index) {
            Some(image) => {
                self.selected_result = Some(image.clone());
                true
            }
            None => false,
        }
    }

    pub fn set_refine_draft(&mut self, draft: impl Into<String>) {
        self.refine_draft = draft.into();
    }

    pub(super) fn clear_refine_draft(&mut self) {
        self.refine_draft.clear();
    }

    pub(super) fn begin(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(super) fn set_query_label(&mut self, label: String) {
        self.query_label = label;
    }

    pub(super) fn set_image_origin(&mut self, image_origin: bool) {
        self.image_origin = image_origin;
    }

    pub(super) fn mark_fading(&mut self) {
        self.set_fading(true);
    }

    /// Leave a transient phase without touching results. The label goes back
    /// to the one the results were applied with.
    pub(super) fn settle(&mut self) {
        self.set_fading(false);
        self.query_label.clone_from(&self.applied_label);
        self.phase = if self.results.is_empty() && self.continuity_embedding.is_none() {
            Phase::Idle
        } else {
            Phase::Showing
        };
    }

    fn set_fading(&mut self, fading: bool) {
        for text in &mut self.results.text_results {
            text.fading = fading;
        }
        for image in &mut self.results.image_results {
            image.fading = fading;
        }
    }
}
