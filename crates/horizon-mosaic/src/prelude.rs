//! Prelude module for Horizon Mosaic.
//!
//! This module re-exports the most commonly used types for convenient importing:
//!
//! ```ignore
//! use horizon_mosaic::prelude::*;
//! ```

// ============================================================================
// Collection Engine
// ============================================================================

pub use crate::collection::{
    ChangeSet, Collection, CollectionSignals, CompositeCollection, CompositeConfig,
    CompositeError, Coordinate, InvalidationContext, KeyedCollection, SectionedList, UpdateSink,
};

// ============================================================================
// Signal/Slot System
// ============================================================================

pub use crate::signal::{ConnectionId, Signal};
