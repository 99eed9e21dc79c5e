use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::RewriteError;
use crate::rewrite::{NotesRewriter, RewriteRequest};

/// A rewriter that always returns the same text.
#[derive(Debug)]
pub struct StaticRewriter {
    text: String,
    calls: AtomicUsize,
}

impl StaticRewriter {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times `rewrite` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotesRewriter for StaticRewriter {
    async fn rewrite(&self, _request: &RewriteRequest) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// A rewriter that always fails with the given error.
#[derive(Debug)]
pub struct FailingRewriter {
    error: RewriteError,
    calls: AtomicUsize,
}

impl FailingRewriter {
    pub fn new(error: RewriteError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotesRewriter for FailingRewriter {
    async fn rewrite(&self, _request: &RewriteRequest) -> Result<String, RewriteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_rewriter_counts_calls() {
        let rw = StaticRewriter::new("fluffy");
        let req = RewriteRequest::new("Mochi", "x");
        assert_eq!(rw.rewrite(&req).await.unwrap(), "fluffy");
        assert_eq!(rw.rewrite(&req).await.unwrap(), "fluffy");
        assert_eq!(rw.calls(), 2);
    }

    #[tokio::test]
    async fn failing_rewriter_returns_its_error() {
        let rw = FailingRewriter::new(RewriteError::Timeout(5));
        let err = rw.rewrite(&RewriteRequest::new("Mochi", "x")).await.unwrap_err();
        assert_eq!(err, RewriteError::Timeout(5));
    }
}
