//! Error types for the collection engine.
//!
//! Every variant signals a programming error in the caller or in the
//! composite's own bookkeeping. None of them is transient, so nothing is ever
//! retried.

/// Result type alias for composite operations.
pub type Result<T> = std::result::Result<T, CompositeError>;

/// Errors reported by [`CompositeCollection`](super::CompositeCollection).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositeError {
    /// The child is already registered with this composite.
    #[error("child is already registered with this composite")]
    DuplicateChild,

    /// The insertion position is outside `[0, count]`.
    #[error("insert index {index} is out of bounds for {count} children")]
    IndexOutOfBounds { index: usize, count: usize },

    /// The collection is not registered with this composite.
    #[error("collection is not a child of this composite")]
    NotAChild,

    /// The collection already reports to another update sink, such as a
    /// different composite.
    #[error("collection already reports to another update sink")]
    AlreadyObserved,

    /// A composite was asked to contain itself, directly or through one of
    /// the collections nested below the new child.
    #[error("a composite cannot contain itself")]
    SelfInsertion,

    /// The section lookup cache disagrees with the child layout.
    #[error("mapping corruption at global section {section}: {reason}")]
    MappingCorruption { section: usize, reason: String },
}

impl CompositeError {
    /// Create a mapping corruption error.
    pub fn corruption(section: usize, reason: impl Into<String>) -> Self {
        Self::MappingCorruption {
            section,
            reason: reason.into(),
        }
    }
}
