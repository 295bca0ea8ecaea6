//! Trading journal views.

use thiserror::Error;
use tracing::info;

use super::session::Session;
use super::view_cache::Fetched;
use crate::domain::{JournalEntry, Mood, NewJournalEntry, OrderAck};
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    #[error("Journal title is required.")]
    EmptyTitle,
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl Session {
    /// Journal entries. A failed fetch pins the view empty until refresh.
    pub async fn journals(&mut self) -> ApiResult<Fetched<Vec<JournalEntry>>> {
        let token = self.require_token()?;
        let backend = self.backend();
        let fetched = self
            .views
            .journals
            .resolve(move || async move { backend.fetch_journals(&token).await })
            .await?;
        if fetched.fresh {
            self.mark_updated();
        }
        Ok(fetched)
    }

    /// Save a journal entry; the journal list is fetched again next view.
    pub async fn add_journal(
        &mut self,
        title: &str,
        content: &str,
        mood: Mood,
        tags: &str,
    ) -> Result<OrderAck, JournalError> {
        let token = self.require_token()?;
        let title = title.trim();
        if title.is_empty() {
            return Err(JournalError::EmptyTitle);
        }
        let entry = NewJournalEntry {
            title: title.to_string(),
            content: content.to_string(),
            mood,
            tags: tags.trim().to_string(),
        };
        let ack = self.backend.log_journal(&token, &entry).await?;
        info!(mood = %mood, "Journal entry saved");
        self.views.journals.invalidate();
        self.mark_updated();
        Ok(ack)
    }
}
