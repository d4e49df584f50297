//! Identity keys for registered children.

use std::fmt;
use std::sync::Arc;

/// A lookup key derived from the referential identity of a shared child.
///
/// Two keys are equal exactly when they were taken from handles to the same
/// allocation, whatever the child type's own notion of equality (if it has
/// one). Keys taken through different handle types agree, so the key of an
/// `Arc<SectionedList<T>>` equals the key of the same list coerced to
/// `Arc<dyn Collection<T>>`.
///
/// A key stays unique for as long as some `Arc` keeps the allocation alive.
/// Composites hold their children's `Arc`s for the whole registration, so a
/// key can never be reused while it is registered.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChildKey(usize);

impl ChildKey {
    /// Returns the key of the allocation behind `child`.
    pub fn of<C: ?Sized>(child: &Arc<C>) -> Self {
        Self(Arc::as_ptr(child).cast::<()>() as usize)
    }

    /// Returns the key of a value living inside an `Arc` allocation, given
    /// only a reference to it.
    pub(crate) fn of_ref<C: ?Sized>(value: &C) -> Self {
        Self((value as *const C).cast::<()>() as usize)
    }
}

impl fmt::Debug for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildKey({:#x})", self.0)
    }
}
