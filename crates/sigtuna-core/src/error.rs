#![forbid(unsafe_code)]

/// Errors produced by the Sigtuna canonicalization library.
///
/// All errors are local to the `write` call that raised them; there is no
/// retry or partial-success mode.  Errors raised before traversal starts
/// (detached nodes, cross-document selections, unsupported algorithms)
/// guarantee zero bytes were emitted.  `InvalidNamespaceUri` is detected
/// mid-traversal, so bytes written for earlier nodes remain in the sink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported canonicalization algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("node is not attached to a document: {0}")]
    DetachedNode(String),

    #[error("node subset spans more than one document")]
    CrossDocumentSelection,

    #[error("namespace URI is not absolute: {0}")]
    InvalidNamespaceUri(String),

    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
