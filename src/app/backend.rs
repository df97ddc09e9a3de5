use serde::{Deserialize, Serialize};

use crate::session::types::{Embedding, ImageUpload, SearchResponse};

use super::errors::ServiceError;

/// The three operations of the remote search service. Each one answers with a
/// fresh result set and a new continuity embedding.
#[allow(async_fn_in_trait)]
pub trait SearchBackend {
    async fn search_text(&self, query: &str) -> Result<SearchResponse, ServiceError>;

    async fn search_image(&self, upload: &ImageUpload) -> Result<SearchResponse, ServiceError>;

    async fn refine(&self, request: &RefineRequest) -> Result<SearchResponse, ServiceError>;
}

/// JSON body of a refine call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefineRequest {
    pub base_embedding: Embedding,
    pub refinement: String,
    pub alpha: f32,
}
