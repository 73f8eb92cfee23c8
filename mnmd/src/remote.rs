//! Remote study-application adapter contract (C10, §6).
//!
//! The sync driver (C8) is generic over this trait so it can be tested
//! against an in-memory fake instead of a live AnkiConnect server (§10);
//! `mnmd_cli` supplies the concrete `reqwest`-backed implementation (C14).

use crate::error::LibraryError;
use async_trait::async_trait;
use std::collections::HashMap;

/// One remote note's field values, keyed by field name (`Text`, `Extra`,
/// `Source`).
pub type NoteFields = HashMap<String, String>;

/// One card template, keyed `Front`/`Back`.
pub type CardTemplate = HashMap<String, String>;

/// The remote operations the sync driver needs (§6). Illustrative names;
/// `mnmd_cli`'s implementation binds them to AnkiConnect's concrete action
/// set (`modelNames`, `createModel`, …).
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Names of every note type (model) the remote knows about.
    async fn model_names(&self) -> Result<Vec<String>, LibraryError>;

    /// Creates a note type with the given fields and a single card
    /// template, styled with `css`.
    async fn create_model(
        &self,
        model_name: &str,
        fields: &[String],
        template: &CardTemplate,
        css: &str,
    ) -> Result<(), LibraryError>;

    /// Replaces `model_name`'s styling.
    async fn update_model_styling(&self, model_name: &str, css: &str) -> Result<(), LibraryError>;

    /// The names of every card template currently on `model_name`.
    async fn model_template_names(&self, model_name: &str) -> Result<Vec<String>, LibraryError>;

    /// Overwrites the named template's `Front`/`Back`.
    async fn update_model_templates(
        &self,
        model_name: &str,
        template_name: &str,
        template: &CardTemplate,
    ) -> Result<(), LibraryError>;

    /// Names of every deck the remote knows about.
    async fn deck_names(&self) -> Result<Vec<String>, LibraryError>;

    /// Creates a deck, idempotently.
    async fn create_deck(&self, deck_name: &str) -> Result<(), LibraryError>;

    /// Creates a note, returning its new integer ID.
    async fn add_note(
        &self,
        deck: &str,
        model: &str,
        fields: &NoteFields,
        tags: &[String],
    ) -> Result<u64, LibraryError>;

    /// Overwrites an existing note's fields.
    async fn update_note_fields(&self, note_id: u64, fields: &NoteFields) -> Result<(), LibraryError>;

    /// Which of the given IDs currently exist on the remote.
    async fn notes_exist(&self, note_ids: &[u64]) -> Result<Vec<bool>, LibraryError>;

    /// IDs of every note matching an Anki-style search query.
    async fn find_notes(&self, query: &str) -> Result<Vec<u64>, LibraryError>;

    /// Adds `tags` (already space-joined) to every ID.
    async fn add_tags(&self, note_ids: &[u64], tags: &str) -> Result<(), LibraryError>;

    /// Deletes the given notes.
    async fn delete_notes(&self, note_ids: &[u64]) -> Result<(), LibraryError>;
}
