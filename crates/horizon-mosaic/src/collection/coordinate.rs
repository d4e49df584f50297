//! Coordinates for addressing sections and elements.

use std::fmt;

/// A position within a sectioned collection.
///
/// A coordinate either names a whole section (`index` is `None`) or a single
/// element inside a section. The same type is used for a child's local space
/// and for a composite's global space; which space a value belongs to is
/// determined by where it came from.
///
/// Coordinates order by section first, then by index, with the whole-section
/// coordinate sorting before every element of that section.
///
/// # Example
///
/// ```
/// use horizon_mosaic::collection::Coordinate;
///
/// let element = Coordinate::element(2, 0);
/// assert_eq!(element.section, 2);
/// assert_eq!(element.index, Some(0));
///
/// let shifted = element.map_section(|s| s + 3);
/// assert_eq!(shifted, Coordinate::element(5, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    /// The section index.
    pub section: usize,
    /// The element index within the section, or `None` for the section itself.
    pub index: Option<usize>,
}

impl Coordinate {
    /// Creates a coordinate referring to a whole section.
    pub const fn section(section: usize) -> Self {
        Self {
            section,
            index: None,
        }
    }

    /// Creates a coordinate referring to one element of a section.
    pub const fn element(section: usize, index: usize) -> Self {
        Self {
            section,
            index: Some(index),
        }
    }

    /// Returns `true` if this coordinate names a whole section.
    pub const fn is_section(&self) -> bool {
        self.index.is_none()
    }

    /// Returns a copy with the section replaced.
    pub const fn with_section(self, section: usize) -> Self {
        Self {
            section,
            index: self.index,
        }
    }

    /// Returns a copy with the section component passed through `f`.
    ///
    /// The element index is carried over unchanged.
    pub fn map_section(self, f: impl FnOnce(usize) -> usize) -> Self {
        self.with_section(f(self.section))
    }
}

impl From<(usize, usize)> for Coordinate {
    fn from((section, index): (usize, usize)) -> Self {
        Self::element(section, index)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "[{}, {}]", self.section, index),
            None => write!(f, "[{}]", self.section),
        }
    }
}
