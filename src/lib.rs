//! # Reel
//!
//! `reel` rebuilds the timelines of Flash-style movies and sprites.
//!
//! Tag records come from [`data`] (decoded by an external reader, or from
//! the JSON-lines form used for fixtures and tooling). [`SpriteTimeline`]
//! folds one symbol's tags into immutable frames with label, scene and
//! bounds lookups.

pub use reel_data as data;

pub use reel_core::{
    batch, Character, CharacterLibrary, DuplicateLabelPolicy, Frame, Library, LookupError,
    MissingDepthPolicy, PlacedObject, Scene, SemanticError, SpriteHeader, SpriteTimeline,
    TimelineError, TimelineOptions, TimelineRole,
};
pub use reel_data::{DecodeError, JsonLinesCursor, TagCursor};
