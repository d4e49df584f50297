//! Composite collection engine.
//!
//! This module lets several independent sectioned data sources be presented
//! as one. Each source keeps its own local coordinates; a composite maps them
//! into a single global section space and forwards every change a source
//! reports, translated, to whoever displays the composite.
//!
//! # Core Types
//!
//! - `Collection`: The capability every data source implements
//! - `Coordinate`: A section, or an element within a section
//! - `ChangeSet`: Structural changes (insert, remove, update, move)
//! - `InvalidationContext`: Presentational refresh requests
//! - `UpdateSink`: The receiver of change sets and invalidations
//!
//! # Implementations
//!
//! - `CompositeCollection`: Concatenates the sections of its children
//! - `SectionedList`: A mutable in-memory leaf
//! - `CollectionSignals`: An update sink re-emitting on signals
//!
//! # Example
//!
//! ```
//! use horizon_mosaic::collection::{
//!     Collection, CollectionSignals, CompositeCollection, SectionedList,
//! };
//! use std::sync::Arc;
//!
//! let pinned = Arc::new(SectionedList::new(vec![vec!["release notes"]]));
//! let feed = Arc::new(SectionedList::new(vec![vec!["a", "b"], vec!["c"]]));
//!
//! let composite = CompositeCollection::<&str>::new();
//! composite.append(pinned.clone())?;
//! composite.append(feed.clone())?;
//!
//! let signals = CollectionSignals::attach(&*composite);
//! signals.changes.connect(|changes| {
//!     println!("sections inserted: {:?}", changes.inserted_sections);
//! });
//!
//! // Lands at global section 1: the pinned list occupies section 0.
//! feed.insert_section(0, vec!["new"]);
//! assert_eq!(composite.number_of_sections(), 4);
//! assert_eq!(composite.number_of_elements(1), 1);
//! # Ok::<(), horizon_mosaic::collection::CompositeError>(())
//! ```
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐  ChangeSet   ┌─────────────────────┐  ChangeSet   ┌───────────────────┐
//! │ child (leaf  │─────────────>│ CompositeCollection │─────────────>│ UpdateSink        │
//! │ or composite)│  local       │  Mapping per child  │  global      │ (CollectionSignals│
//! └──────────────┘              └─────────────────────┘              │  or a view)       │
//!                                                                    └───────────────────┘
//! ```

mod change_set;
mod composite;
mod config;
mod coordinate;
mod error;
mod identity;
mod mapping;
mod sectioned_list;
mod signals;
mod traits;

pub use change_set::{ChangeSet, InvalidationContext};
pub use composite::CompositeCollection;
pub use config::CompositeConfig;
pub use coordinate::Coordinate;
pub use error::{CompositeError, Result};
pub use identity::ChildKey;
pub use mapping::Mapping;
pub use sectioned_list::{KeyExtractor, SectionedList};
pub use signals::CollectionSignals;
pub use traits::{Collection, KeyedCollection, UpdateSink};
