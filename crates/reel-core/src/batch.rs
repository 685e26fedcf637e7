//! Concurrent construction of independent sprite timelines.
//!
//! Each sprite's fold is sequential, but sprites do not depend on each
//! other while they are being built, so a movie's sprites can be folded on
//! the rayon pool against one shared, read-only library.

use crate::error::TimelineError;
use crate::library::CharacterLibrary;
use crate::options::TimelineOptions;
use crate::timeline::{SpriteHeader, SpriteTimeline};
use rayon::prelude::*;
use reel_data::TagCursor;

/// A symbol header and the cursor over its tag range.
pub struct SpriteJob<C> {
    pub header: SpriteHeader,
    pub cursor: C,
}

impl<C> SpriteJob<C> {
    pub fn new(header: SpriteHeader, cursor: C) -> Self {
        Self { header, cursor }
    }
}

/// Builds every job, in parallel. Results are returned in job order; a
/// failing job does not affect the others.
pub fn build_all<C, L>(
    jobs: Vec<SpriteJob<C>>,
    library: &L,
    options: &TimelineOptions,
) -> Vec<Result<SpriteTimeline, TimelineError>>
where
    C: TagCursor + Send,
    L: CharacterLibrary + Sync,
{
    jobs.into_par_iter()
        .map(|mut job| SpriteTimeline::build(job.header, &mut job.cursor, library, options))
        .collect()
}
