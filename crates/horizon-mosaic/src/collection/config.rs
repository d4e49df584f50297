//! Configuration for composite collections.

/// Construction options for a [`CompositeCollection`](super::CompositeCollection).
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::{CompositeCollection, CompositeConfig};
///
/// let composite = CompositeCollection::<String>::with_config(
///     CompositeConfig::new()
///         .with_name("inbox")
///         .with_verify_invariants(true),
/// );
/// assert_eq!(composite.config().name.as_deref(), Some("inbox"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeConfig {
    /// Name recorded on this composite's tracing events.
    pub name: Option<String>,
    /// Re-check the offset table after every revalidation and panic on
    /// corruption.
    pub verify_invariants: bool,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            name: None,
            verify_invariants: cfg!(debug_assertions),
        }
    }
}

impl CompositeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the name used in log output.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Enables or disables invariant verification.
    pub fn with_verify_invariants(mut self, verify: bool) -> Self {
        self.verify_invariants = verify;
        self
    }
}
