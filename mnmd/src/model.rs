//! Core data model (§3): the record types that flow through the
//! parser/rewriter pipeline. Invariants are enforced by constructors rather
//! than validated after the fact.

use serde::{Deserialize, Serialize};

/// A half-open byte range in the source file.
pub type ByteRange = std::ops::Range<usize>;

/// A `(before, after)` paragraph-window pair. `before` is non-positive,
/// `after` is non-negative.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Scope {
    pub before: i32,
    pub after: i32,
}

impl Scope {
    pub const DEFAULT: Scope = Scope {
        before: 0,
        after: 0,
    };

    #[must_use]
    pub fn is_default(self) -> bool {
        self == Self::DEFAULT
    }
}

/// How a cloze participates in grouping, derived from `group_id` and
/// `sequence_order`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
pub enum ClozeVariant {
    Basic,
    Grouped,
    Sequence,
}

/// One occurrence of `{{…}}` in the source (§3).
#[derive(Clone, Debug, PartialEq)]
pub struct Cloze {
    pub full_text: String,
    pub byte_range: ByteRange,
    pub line_number: usize,
    pub group_id: Option<String>,
    pub sequence_order: Option<u32>,
    pub note_id_code: Option<String>,
    pub answer: String,
    pub hint: Option<String>,
    pub extra: Option<String>,
    pub scope: Scope,
}

impl Cloze {
    /// Constructs a cloze, enforcing the invariants of §3. Panics if an
    /// invariant does not hold; callers (the tokenizer) are responsible for
    /// never reaching this constructor with a malformed answer, since empty
    /// answers are dropped before construction, not rejected here.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        full_text: String,
        byte_range: ByteRange,
        line_number: usize,
        group_id: Option<String>,
        sequence_order: Option<u32>,
        note_id_code: Option<String>,
        answer: String,
        hint: Option<String>,
        extra: Option<String>,
        scope: Scope,
    ) -> Self {
        assert!(byte_range.start < byte_range.end, "byte_start < byte_end");
        assert!(!answer.trim().is_empty(), "answer must be non-empty");
        if let Some(code) = &note_id_code {
            assert!(
                crate::codec::is_valid_alphabet(code),
                "note_id_code must be letters only"
            );
        }
        assert!(scope.before <= 0 && scope.after >= 0, "scope is bounded");
        Self {
            full_text,
            byte_range,
            line_number,
            group_id,
            sequence_order,
            note_id_code,
            answer,
            hint,
            extra,
            scope,
        }
    }

    #[must_use]
    pub fn variant(&self) -> ClozeVariant {
        if self.sequence_order.is_some() {
            ClozeVariant::Sequence
        } else if self.group_id.is_some() {
            ClozeVariant::Grouped
        } else {
            ClozeVariant::Basic
        }
    }
}

/// A contiguous region of source forming one logical card backdrop (§3).
#[derive(Clone, Debug)]
pub struct CardContext {
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub clozes: Vec<Cloze>,
    /// True for an explicit `> ?` block, false for an implicit paragraph.
    /// Only implicit-paragraph contexts permit cross-paragraph scope
    /// expansion against the full document (§4.3, §4.4).
    pub from_explicit_block: bool,
}

/// The key a [`Cloze`] groups under. A `Named` group is shared by every
/// cloze writing the same `group_id`; a `Singleton` group exists only for
/// one BASIC cloze, keyed by that cloze's position so singletons never
/// collide with each other or with a `Named` group (§9: prefer a sum type
/// over stringly-typed synthetic keys like `_individual_3`).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum GroupKey {
    Named(String),
    Singleton(u64),
}

/// A set of clozes that share identity and become one prompt (or, for
/// sequences, one prompt per member) (§3).
#[derive(Clone, Debug)]
pub struct ClozeGroup {
    pub key: GroupKey,
    pub is_sequence: bool,
    pub members: Vec<Cloze>,
}

/// What gets synced to one remote note (§3).
#[derive(Clone, Debug)]
pub struct Prompt {
    pub primary: Cloze,
    pub body_template: String,
    pub file_path: std::path::PathBuf,
    pub line_number: usize,
    pub group_members: Option<Vec<Cloze>>,
}

/// The 8-character token persisted in front-matter as `mnmd_file_id`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl std::fmt::Display for FileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FileId {
    /// The Anki tag derived from this file ID, used for the orphan sweep.
    #[must_use]
    pub fn tag(&self) -> String {
        format!("mnmd-file-{}", self.0)
    }
}
