//! # Reel Core
//!
//! Rebuilds the frame-by-frame display list of a Flash-style symbol from its
//! flat stream of tags.
//!
//! A symbol's tags are a list of edits (place, update, remove) separated by
//! `ShowFrame` boundaries. [`SpriteTimeline::build`] folds them once, front
//! to back, into an immutable sequence of [`Frame`]s. Each frame holds the
//! complete display list at that point; successive frames share every
//! placement and table node they have in common through [`SparseTable`].
//!
//! ```text
//!   TagCursor ──► FrameBuilder ──► SpriteTimeline
//!                     │                 ▲
//!                     └─► SceneIndexer ─┘   (top-level timelines only)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use reel_core::{Library, SpriteHeader, SpriteTimeline, TimelineOptions};
//! use reel_data::model::{PlaceObject, Tag};
//!
//! let tags = vec![
//!     Tag::Place(PlaceObject::new(1, 7)),
//!     Tag::ShowFrame,
//!     Tag::Remove { depth: 1 },
//!     Tag::ShowFrame,
//!     Tag::End,
//! ];
//! let library = Library::new();
//! let timeline = SpriteTimeline::from_tags(
//!     SpriteHeader::sprite(3),
//!     tags,
//!     &library,
//!     &TimelineOptions::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(timeline.frame_count(), 2);
//! assert_eq!(timeline.frame_at_index1(2).unwrap().placed_object_count(), 0);
//! ```

/// Parallel construction of independent sprites.
pub mod batch;

/// The tag fold that produces frames.
pub mod builder;

pub mod error;

/// Committed frames.
pub mod frame;

/// Character lookup through the owning movie.
pub mod library;

pub mod options;

/// Placed objects and the per-frame display list.
pub mod placement;

pub mod scene;

/// The persistent depth-keyed table.
pub mod sparse;

/// The finished timeline and its lookups.
pub mod timeline;

pub use builder::{BuilderState, FrameBuilder};
pub use error::{LookupError, SemanticError, TimelineError};
pub use frame::Frame;
pub use library::{Character, CharacterLibrary, Library};
pub use options::{DuplicateLabelPolicy, MissingDepthPolicy, TimelineOptions};
pub use placement::{PlacedObject, PlacementTable};
pub use scene::{Scene, SceneIndexer};
pub use sparse::SparseTable;
pub use timeline::{SpriteHeader, SpriteTimeline, TimelineRole, TimelineSummary};
