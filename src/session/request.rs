//! Request tokens for latest-only async results.

/// Stamped on every outbound call. Only the most recently issued token may
/// apply its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tracks the latest issued request and rejects stale completions.
#[derive(Debug, Default)]
pub struct LatestOnly {
    next: u64,
    active: Option<RequestToken>,
}

impl LatestOnly {
    /// Issue a new token, invalidating any earlier one.
    pub fn begin(&mut self) -> RequestToken {
        let token = RequestToken(self.next);
        self.next += 1;
        self.active = Some(token);
        token
    }

    /// Invalidate the active token without issuing a new one.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self, token: RequestToken) -> bool {
        self.active == Some(token)
    }

    pub fn has_active(&self) -> bool {
        self.active.is_some()
    }

    /// Consume the token if it is still the latest. Returns false for stale ones.
    pub fn finish_if_active(&mut self, token: RequestToken) -> bool {
        if self.is_active(token) {
            self.active = None;
            true
        } else {
            false
        }
    }
}
