/// Failure of a call to the search service. The session treats every variant
/// the same way: keep the previous results and leave the loading phase.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("service responded {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}
