//! Where failed calls end up. The session core never surfaces errors itself;
//! it hands them to an [`ErrorBoundary`] chosen by the front-end.

use crate::app::ServiceError;

use super::orchestrator::Operation;

pub trait ErrorBoundary {
    fn report(&mut self, operation: Operation, error: &ServiceError);
}

/// Log and move on. The previous result set stays on screen.
#[derive(Debug, Default)]
pub struct LogOnly;

impl ErrorBoundary for LogOnly {
    fn report(&mut self, operation: Operation, error: &ServiceError) {
        tracing::error!(%operation, "search call failed: {error}");
    }
}

/// Logs like [`LogOnly`] and keeps the last failure so it can be shown.
#[derive(Debug, Default)]
pub struct Surface {
    last: Option<String>,
}

impl Surface {
    /// Take the pending failure message, if any.
    pub fn take(&mut self) -> Option<String> {
        self.last.take()
    }
}

impl ErrorBoundary for Surface {
    fn report(&mut self, operation: Operation, error: &ServiceError) {
        LogOnly.report(operation, error);
        self.last = Some(format!("{operation} failed: {error}"));
    }
}
