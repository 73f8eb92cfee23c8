use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Top-level error returned by this crate's fallible entry points.
#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("Io Error: {description}, {source}")]
    Io {
        description: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    ApiRequest(#[from] reqwest::Error),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Library(#[from] LibraryError),
}

/// The five error kinds of the sync driver's error taxonomy.
///
/// Unlike [`Error`], this is `Clone` so a single failure can be recorded
/// against a prompt (counted as skipped) while sync continues.
#[derive(Clone, Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum LibraryError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Connection(#[from] ConnectionErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    RemoteApi(#[from] RemoteApiErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseErrorKind),
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationErrorKind),
    #[error("{0}")]
    Config(String),
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum ConnectionErrorKind {
    #[error("could not reach remote at {url}: {message}")]
    Unreachable { url: String, message: String },
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum RemoteApiErrorKind {
    #[error("`{action}` returned an error: {message}")]
    Custom { action: String, message: String },
    #[error("response had an unexpected shape for `{action}`")]
    MalformedResponse { action: String },
}

/// Parse failures never surface: every variant here documents a construct
/// the tokenizer or context extractor degrades instead of raising. The type
/// exists so the taxonomy of §7 is representable, not because any caller
/// constructs one in practice.
#[derive(Clone, Debug, Diagnostic, Error)]
pub enum ParseErrorKind {
    #[error("unbalanced braces")]
    UnbalancedBraces {
        #[source_code]
        src: String,
        #[label("opening brace here")]
        at: SourceSpan,
    },
    #[error("cloze has no answer after whitespace normalization")]
    EmptyAnswer {
        #[source_code]
        src: String,
        #[label("here")]
        at: SourceSpan,
    },
}

#[derive(Clone, Debug, Diagnostic, Error)]
pub enum ValidationErrorKind {
    #[error("`{code}` is not a valid identity code")]
    InvalidCode {
        code: String,
        #[label("contains a character outside the codec alphabet")]
        at: Option<SourceSpan>,
    },
    #[error("malformed front-matter: {description}")]
    MalformedFrontMatter {
        description: String,
        #[source_code]
        src: String,
        #[label("here")]
        at: SourceSpan,
    },
}
