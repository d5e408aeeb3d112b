//! Coalescing of recompute requests.

use tracing::debug;

/// A pending request to recompute derived data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputeRequest {
    /// What triggered the latest request.
    pub reason: String,
    /// How many requests were folded into this one.
    pub coalesced: usize,
}

/// A single pending-recompute flag.
///
/// Semantics:
/// - `request` marks a recompute as pending. A request arriving while one is
///   already pending supersedes it: there is never more than one queued run.
/// - The host decides *when* to run by calling [`take`](Self::take), e.g.
///   once per frame or after a burst of edits.
#[derive(Debug, Default)]
pub struct RecomputeScheduler {
    pending: Option<RecomputeRequest>,
}

impl RecomputeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Marks a recompute as pending.
    pub fn request(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        match &mut self.pending {
            Some(pending) => {
                pending.coalesced += 1;
                debug!(%reason, superseded = %pending.reason, "recompute request superseded");
                pending.reason = reason;
            }
            None => {
                debug!(%reason, "recompute requested");
                self.pending = Some(RecomputeRequest {
                    reason,
                    coalesced: 1,
                });
            }
        }
    }

    /// Clears and returns the pending request, if any.
    pub fn take(&mut self) -> Option<RecomputeRequest> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_coalesces() {
        let mut s = RecomputeScheduler::new();
        assert!(!s.is_pending());
        s.request("edge added");
        s.request("estimate edited");
        s.request("task removed");
        assert!(s.is_pending());
        let req = s.take().unwrap();
        assert_eq!(req.reason, "task removed");
        assert_eq!(req.coalesced, 3);
        assert!(s.take().is_none());
    }

    #[test]
    fn test_request_after_take_starts_fresh() {
        let mut s = RecomputeScheduler::new();
        s.request("a");
        s.take();
        s.request("b");
        assert_eq!(
            s.take(),
            Some(RecomputeRequest {
                reason: "b".into(),
                coalesced: 1
            })
        );
    }
}
