//! Horizon Mosaic - composite sectioned collections.
//!
//! This is the main crate. It re-exports the core signal and logging
//! facilities and provides the collection engine in [`collection`].
//!
//! # Example
//!
//! ```
//! use horizon_mosaic::prelude::*;
//! use std::sync::Arc;
//!
//! let drafts = Arc::new(SectionedList::new(vec![vec!["todo"]]));
//! let archive = Arc::new(SectionedList::new(vec![vec!["2023"], vec!["2024"]]));
//!
//! let mailbox = CompositeCollection::<&str>::with_children([
//!     drafts.clone() as Arc<dyn Collection<&str>>,
//!     archive.clone() as Arc<dyn Collection<&str>>,
//! ])?;
//! assert_eq!(mailbox.number_of_sections(), 3);
//! assert_eq!(mailbox.find(&|item| *item == "2024"), Some(Coordinate::element(2, 0)));
//! # Ok::<(), CompositeError>(())
//! ```

pub use horizon_mosaic_core::*;

pub mod collection;
pub mod prelude;
