mod remote;

use std::{cell::RefCell, collections::HashMap, rc::Rc, time::Duration};

use crate::{
    app::{RefineRequest, SearchBackend, ServiceError},
    session::{
        types::{Embedding, ImageResult, ImageUpload, Results, SearchResponse, TextResult},
        ErrorBoundary, Orchestrator, SessionOptions,
    },
};

/// What the mock answers for a given query, refinement or file name.
#[derive(Clone, Debug)]
pub enum Reply {
    Ok(SearchResponse),
    Status(u16, &'static str),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Text(String),
    Image(String, usize),
    Refine(RefineRequest),
}

#[derive(Default)]
struct MockState {
    replies: HashMap<String, Reply>,
    calls: Vec<Call>,
}

/// Scripted search service. Clones share state, so a test can keep one handle
/// while the orchestrator owns another.
#[derive(Clone, Default)]
pub struct MockBackend {
    state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub fn reply(&self, key: &str, reply: Reply) -> &Self {
        self.state.borrow_mut().replies.insert(key.to_string(), reply);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    fn answer(&self, key: &str, call: Call) -> Result<SearchResponse, ServiceError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(call);

        match state.replies.get(key) {
            Some(Reply::Ok(response)) => Ok(response.clone()),
            Some(Reply::Status(status, detail)) => Err(ServiceError::Status {
                status: *status,
                detail: detail.to_string(),
            }),
            None => Ok(response(&[key], &[], &[1.0])),
        }
    }
}

impl SearchBackend for MockBackend {
    async fn search_text(&self, query: &str) -> Result<SearchResponse, ServiceError> {
        self.answer(query, Call::Text(query.to_string()))
    }

    async fn search_image(&self, upload: &ImageUpload) -> Result<SearchResponse, ServiceError> {
        self.answer(
            &upload.file_name,
            Call::Image(upload.file_name.clone(), upload.bytes.len()),
        )
    }

    async fn refine(&self, request: &RefineRequest) -> Result<SearchResponse, ServiceError> {
        self.answer(&request.refinement, Call::Refine(request.clone()))
    }
}

pub fn response(titles: &[&str], images: &[&str], embedding: &[f32]) -> SearchResponse {
    SearchResponse {
        results: Results {
            text_results: titles
                .iter()
                .map(|title| TextResult {
                    title: title.to_string(),
                    text: format!("About {title}."),
                    ..Default::default()
                })
                .collect(),
            image_results: images
                .iter()
                .map(|filename| ImageResult {
                    filename: filename.to_string(),
                    ..Default::default()
                })
                .collect(),
        },
        embedding: Embedding::new(embedding.to_vec()),
    }
}

pub fn options() -> SessionOptions {
    SessionOptions {
        refine_alpha: 0.6,
        fade_delay: Duration::ZERO,
        history_limit: 5,
    }
}

pub fn orchestrator<E: ErrorBoundary>(
    boundary: E,
) -> (Orchestrator<MockBackend, E>, MockBackend) {
    let backend = MockBackend::default();
    (
        Orchestrator::new(backend.clone(), boundary, options()),
        backend,
    )
}

/// A PNG signature followed by padding, enough for type sniffing.
pub fn png_bytes() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.extend_from_slice(&[0; 24]);
    bytes
}
