//! Parser, rewriter, and sync driver for mnemonic markdown flashcards.
//!
//! `mnmd_cli` is the thin binary over this library; everything that can be
//! unit-tested without a live study application lives here.

pub mod codec;
pub mod config;
pub mod error;
pub mod fileid;
pub mod helpers;
pub mod id_writer;
pub mod model;
pub mod note_body;
pub mod note_type;
pub mod parsers;
pub mod remote;
pub mod sync;

pub use error::{Error, LibraryError};
pub use model::{CardContext, Cloze, ClozeGroup, ClozeVariant, FileId, GroupKey, Prompt, Scope};
pub use remote::RemoteClient;
pub use sync::{sync_document, SyncOutcome};
