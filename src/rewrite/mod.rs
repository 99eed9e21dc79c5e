//! Note rewriting through a hosted text-generation service
//!
//! The service is an opaque collaborator: it receives the pet name and the
//! groomer's raw notes and either returns a friendlier rewrite or fails. A
//! failure never touches the draft; the raw notes stay as they were.

pub mod config;
#[cfg(feature = "rewrite")]
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use log::{info, warn};

use crate::draft::ReportDraft;
use crate::error::RewriteError;
use crate::Result;

pub use config::RewriteConfig;
#[cfg(feature = "rewrite")]
pub use gemini::GeminiRewriter;
pub use mock::{FailingRewriter, StaticRewriter};

/// Input to the rewriting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub pet_name: String,
    pub raw_notes: String,
}

impl RewriteRequest {
    pub fn new(pet_name: impl Into<String>, raw_notes: impl Into<String>) -> Self {
        Self {
            pet_name: pet_name.into(),
            raw_notes: raw_notes.into(),
        }
    }

    /// Build a request from a draft, using the displayed pet name
    pub fn from_draft(draft: &ReportDraft) -> Self {
        Self::new(draft.display_name(), draft.notes().trim())
    }

    /// The prompt sent to the service
    pub fn prompt(&self) -> String {
        format!(
            "You are a professional pet groomer. Turn the following rough grooming notes \
into a warm, professional summary that is friendly to the pet's owner.\n\
\n\
Pet name: {name}\n\
Raw notes: {notes}\n\
\n\
Requirements:\n\
1. Keep the tone kind and professional.\n\
2. Compliment the pet's behavior unless the notes say something negative.\n\
3. Give one or two grooming or care tips.\n\
4. Stay under 150 words.\n\
Return only the rewritten text.",
            name = self.pet_name,
            notes = self.raw_notes
        )
    }
}

/// A service that rewrites grooming notes
#[async_trait]
pub trait NotesRewriter: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> std::result::Result<String, RewriteError>;
}

/// Rewrite the draft's notes in place.
///
/// Returns `Ok(false)` without calling anything when there are no notes.
/// Passing `None` means no credential is configured, which is reported as
/// [`RewriteError::MissingCredential`]. On any failure the draft is left
/// exactly as it was.
pub async fn enhance_notes(
    draft: &mut ReportDraft,
    rewriter: Option<&dyn NotesRewriter>,
) -> Result<bool> {
    if draft.notes().trim().is_empty() {
        return Ok(false);
    }
    let rewriter = rewriter.ok_or(RewriteError::MissingCredential)?;

    let request = RewriteRequest::from_draft(draft);
    match rewriter.rewrite(&request).await {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                warn!("rewrite for {} came back empty; keeping original notes", request.pet_name);
                return Err(RewriteError::EmptyResponse.into());
            }
            info!("rewrote notes for {} ({} chars)", request.pet_name, text.len());
            draft.set_enhanced_notes(text);
            Ok(true)
        }
        Err(e) => {
            warn!("rewrite for {} failed: {}", request.pet_name, e);
            Err(e.into())
        }
    }
}

/// Rewrite notes ahead of an export that goes ahead either way.
///
/// `rewriter` is the outcome of setting up the service; a setup error counts
/// as a rewrite failure. Failures are logged and the draft keeps its
/// original notes. Returns whether the notes were rewritten.
pub async fn enhance_notes_or_keep(
    draft: &mut ReportDraft,
    rewriter: Result<Option<&dyn NotesRewriter>>,
) -> bool {
    let outcome = match rewriter {
        Ok(rewriter) => enhance_notes(draft, rewriter).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(rewritten) => rewritten,
        Err(e) => {
            warn!("{}; exporting with the original notes. {}", e, e.hint());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn draft_with_notes(notes: &str) -> ReportDraft {
        let mut d = ReportDraft::new();
        d.pet.name = "Mochi".into();
        d.set_notes(notes);
        d
    }

    #[test]
    fn prompt_contains_name_and_notes() {
        let p = RewriteRequest::new("Mochi", "did great").prompt();
        assert!(p.contains("Pet name: Mochi"));
        assert!(p.contains("Raw notes: did great"));
        assert!(p.contains("150 words"));
    }

    #[test]
    fn request_uses_fallback_name() {
        let mut d = ReportDraft::new();
        d.set_notes("  sleepy  ");
        let r = RewriteRequest::from_draft(&d);
        assert_eq!(r.pet_name, crate::draft::FALLBACK_PET_NAME);
        assert_eq!(r.raw_notes, "sleepy");
    }

    #[tokio::test]
    async fn success_sets_enhanced_notes_only() {
        let mut d = draft_with_notes("did great");
        let rw = StaticRewriter::new("  Mochi was a star today!  ");
        assert!(enhance_notes(&mut d, Some(&rw)).await.unwrap());
        assert_eq!(d.notes(), "did great");
        assert_eq!(d.enhanced_notes(), Some("Mochi was a star today!"));
    }

    #[tokio::test]
    async fn missing_credential_leaves_draft_untouched() {
        let mut d = draft_with_notes("did great");
        let before = d.clone();
        let err = enhance_notes(&mut d, None).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RewriteUnavailable(RewriteError::MissingCredential)
        ));
        assert_eq!(d, before);
    }

    #[tokio::test]
    async fn failure_leaves_draft_untouched() {
        let mut d = draft_with_notes("did great");
        let before = d.clone();
        let rw = FailingRewriter::new(RewriteError::RateLimited);
        assert!(enhance_notes(&mut d, Some(&rw)).await.is_err());
        assert_eq!(d, before);
        assert!(d.enhanced_notes().is_none());
    }

    #[tokio::test]
    async fn blank_rewrite_is_an_error() {
        let mut d = draft_with_notes("did great");
        let rw = StaticRewriter::new("   ");
        let err = enhance_notes(&mut d, Some(&rw)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::RewriteUnavailable(RewriteError::EmptyResponse)
        ));
        assert!(d.enhanced_notes().is_none());
    }

    #[tokio::test]
    async fn setup_failure_keeps_notes_without_failing() {
        let mut d = draft_with_notes("did great");
        let before = d.clone();
        let setup = Err(Error::ConfigError("invalid settings file".into()));
        assert!(!enhance_notes_or_keep(&mut d, setup).await);
        assert_eq!(d, before);

        let rw = FailingRewriter::new(RewriteError::Timeout(20));
        assert!(!enhance_notes_or_keep(&mut d, Ok(Some(&rw))).await);
        assert!(!enhance_notes_or_keep(&mut d, Ok(None)).await);
        assert_eq!(d, before);

        let rw = StaticRewriter::new("Lovely visit.");
        assert!(enhance_notes_or_keep(&mut d, Ok(Some(&rw))).await);
        assert_eq!(d.enhanced_notes(), Some("Lovely visit."));
    }

    #[tokio::test]
    async fn empty_notes_skip_the_service() {
        let mut d = draft_with_notes("   ");
        let rw = FailingRewriter::new(RewriteError::Http("unreachable".into()));
        assert!(!enhance_notes(&mut d, Some(&rw)).await.unwrap());
        assert_eq!(rw.calls(), 0);
    }
}
