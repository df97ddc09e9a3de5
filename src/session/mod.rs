//! Search session controller.
//!
//! - `state`: the session store the front-end renders from
//! - `orchestrator`: issues calls and gates their completions
//! - `history`: bounded list of past queries
//! - `request`: latest-only request tokens
//! - `boundary`: where failures are reported

pub mod boundary;
pub mod history;
pub mod orchestrator;
pub mod request;
pub mod state;
pub mod types;

pub use boundary::{ErrorBoundary, LogOnly, Surface};
pub use history::History;
pub use orchestrator::{Orchestrator, Outcome, PendingCall, SessionOptions};
pub use state::{Phase, Session};
