use std::time::Duration;

use serde::Deserialize;

use crate::session::types::{ImageUpload, SearchResponse};

use super::{
    backend::{RefineRequest, SearchBackend},
    errors::ServiceError,
};

#[derive(Debug, Clone, Default)]
pub enum RemoteAuth {
    #[default]
    None,
    Basic(String, Option<String>),
    Bearer(String),
}

/// HTTP client for the search service.
pub struct AppRemote {
    client: reqwest::Client,
    remote_addr: String,
    top_k: u16,
    auth: RemoteAuth,
}

impl AppRemote {
    pub fn new(
        addr: &str,
        top_k: u16,
        auth: RemoteAuth,
        timeout: Option<Duration>,
    ) -> Result<AppRemote, ServiceError> {
        let remote_addr = addr.strip_suffix('/').unwrap_or(addr).to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(AppRemote {
            client: builder.build()?,
            remote_addr,
            top_k,
            auth,
        })
    }

    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        tracing::info!("GET {}{}", self.remote_addr, url);
        self.with_auth(self.client.get(format!("{}{}", self.remote_addr, url)))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        tracing::info!("POST {}{}", self.remote_addr, url);
        self.with_auth(self.client.post(format!("{}{}", self.remote_addr, url)))
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            RemoteAuth::None => request,
            RemoteAuth::Basic(username, password) => request.basic_auth(username, password.as_ref()),
            RemoteAuth::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// Error body as produced by the service framework. `detail` is either a
/// message or a list of validation errors.
#[derive(Deserialize, Debug)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn error_detail(status: reqwest::StatusCode, text: &str) -> String {
    match serde_json::from_str::<ErrorBody>(text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(message),
        }) => message,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if !text.trim().is_empty() => text.trim().to_string(),
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    }
}

async fn handle_response(response: reqwest::Response) -> Result<SearchResponse, ServiceError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ServiceError::Status {
            status: status.as_u16(),
            detail: error_detail(status, &text),
        });
    }

    serde_json::from_str::<SearchResponse>(&text).map_err(|err| {
        tracing::error!("{err}. tried to parse: {text:?}");
        ServiceError::Malformed(err.to_string())
    })
}

impl SearchBackend for AppRemote {
    async fn search_text(&self, query: &str) -> Result<SearchResponse, ServiceError> {
        tracing::debug!("search: {query:?}");
        let resp = self
            .get("/search")
            .query(&[("q", query.to_string()), ("k", self.top_k.to_string())])
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn search_image(&self, upload: &ImageUpload) -> Result<SearchResponse, ServiceError> {
        tracing::debug!(
            "image search: {} ({} bytes, {})",
            upload.file_name,
            upload.bytes.len(),
            upload.mime_type()
        );
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime_type())?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .post("/search/image/unified")
            .query(&[("k", self.top_k.to_string())])
            .multipart(form)
            .send()
            .await?;

        handle_response(resp).await
    }

    async fn refine(&self, request: &RefineRequest) -> Result<SearchResponse, ServiceError> {
        tracing::debug!(
            "refine: {:?} (alpha {}, {} dims)",
            request.refinement,
            request.alpha,
            request.base_embedding.len()
        );
        let resp = self.post("/search/refine").json(request).send().await?;

        handle_response(resp).await
    }
}
