//! Wraps a real [`RemoteClient`] so `--dry-run` (§6) performs every read
//! but no mutation, logging what each skipped write would have done.

use async_trait::async_trait;
use mnmd::error::LibraryError;
use mnmd::remote::{CardTemplate, NoteFields, RemoteClient};

pub struct DryRunClient<'a> {
    inner: &'a dyn RemoteClient,
}

impl<'a> DryRunClient<'a> {
    #[must_use]
    pub fn new(inner: &'a dyn RemoteClient) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RemoteClient for DryRunClient<'_> {
    async fn model_names(&self) -> Result<Vec<String>, LibraryError> {
        self.inner.model_names().await
    }

    async fn create_model(
        &self,
        model_name: &str,
        _fields: &[String],
        _template: &CardTemplate,
        _css: &str,
    ) -> Result<(), LibraryError> {
        log::info!("dry-run: would create note type `{model_name}`");
        Ok(())
    }

    async fn update_model_styling(&self, model_name: &str, _css: &str) -> Result<(), LibraryError> {
        log::info!("dry-run: would update styling for `{model_name}`");
        Ok(())
    }

    async fn model_template_names(&self, model_name: &str) -> Result<Vec<String>, LibraryError> {
        self.inner.model_template_names(model_name).await
    }

    async fn update_model_templates(
        &self,
        model_name: &str,
        template_name: &str,
        _template: &CardTemplate,
    ) -> Result<(), LibraryError> {
        log::info!("dry-run: would update template `{template_name}` on `{model_name}`");
        Ok(())
    }

    async fn deck_names(&self) -> Result<Vec<String>, LibraryError> {
        self.inner.deck_names().await
    }

    async fn create_deck(&self, deck_name: &str) -> Result<(), LibraryError> {
        log::info!("dry-run: would create deck `{deck_name}`");
        Ok(())
    }

    async fn add_note(
        &self,
        deck: &str,
        _model: &str,
        _fields: &NoteFields,
        _tags: &[String],
    ) -> Result<u64, LibraryError> {
        log::info!("dry-run: would create a note in `{deck}`");
        Ok(0)
    }

    async fn update_note_fields(&self, note_id: u64, _fields: &NoteFields) -> Result<(), LibraryError> {
        log::info!("dry-run: would update note {note_id}");
        Ok(())
    }

    async fn notes_exist(&self, note_ids: &[u64]) -> Result<Vec<bool>, LibraryError> {
        self.inner.notes_exist(note_ids).await
    }

    async fn find_notes(&self, query: &str) -> Result<Vec<u64>, LibraryError> {
        self.inner.find_notes(query).await
    }

    async fn add_tags(&self, note_ids: &[u64], tags: &str) -> Result<(), LibraryError> {
        log::info!("dry-run: would add tags `{tags}` to {note_ids:?}");
        Ok(())
    }

    async fn delete_notes(&self, note_ids: &[u64]) -> Result<(), LibraryError> {
        log::info!("dry-run: would delete notes {note_ids:?}");
        Ok(())
    }
}
