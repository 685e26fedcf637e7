//! # Frame Builder
//!
//! A single-pass fold over one symbol's tags.
//!
//! ## Responsibilities
//! - **Display list**: `Place`, `PlaceUpdate` and `Remove` edit a working
//!   [`PlacementTable`]. The table is never reset between frames.
//! - **Commit**: `ShowFrame` snapshots the working table into a [`Frame`]
//!   together with the pending label and sounds.
//! - **Render bounds**: only the depths written since the previous commit
//!   are measured, so the cost follows the number of changes.
//! - **Scenes**: scene metadata is held until the fold ends, then handed to
//!   the [`SceneIndexer`] once the frame count is known.

use crate::error::SemanticError;
use crate::frame::Frame;
use crate::library::CharacterLibrary;
use crate::options::{DuplicateLabelPolicy, MissingDepthPolicy, TimelineOptions};
use crate::placement::{PlacedObject, PlacementTable};
use crate::scene::{SceneIndex, SceneIndexer};
use crate::timeline::{SpriteHeader, SpriteTimeline, TimelineRole};
use kurbo::Rect;
use reel_data::model::{SceneLabelData, SoundEvent, StreamBlockRef, Tag};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    Accumulating,
    /// An `End` tag was consumed.
    Done,
    /// A tag was rejected; the builder accepts nothing further.
    Failed,
}

pub struct FrameBuilder<'a> {
    role: TimelineRole,
    options: &'a TimelineOptions,
    library: &'a dyn CharacterLibrary,
    state: BuilderState,

    working: PlacementTable,
    frames: Vec<Frame>,
    labels: HashMap<String, usize>,

    pending_label: Option<String>,
    pending_stream_block: Option<StreamBlockRef>,
    pending_sounds: Vec<SoundEvent>,
    scene_data: Option<SceneLabelData>,

    touched: Vec<i32>,
    render_bounds: Option<Rect>,
    unresolved: HashSet<u16>,
}

fn union_into(acc: &mut Option<Rect>, rect: Rect) {
    *acc = Some(match acc {
        Some(current) => current.union(rect),
        None => rect,
    });
}

impl<'a> FrameBuilder<'a> {
    pub fn new(
        role: TimelineRole,
        library: &'a dyn CharacterLibrary,
        options: &'a TimelineOptions,
    ) -> Self {
        Self {
            role,
            options,
            library,
            state: BuilderState::Accumulating,
            working: PlacementTable::new(),
            frames: Vec::new(),
            labels: HashMap::new(),
            pending_label: None,
            pending_stream_block: None,
            pending_sounds: Vec::new(),
            scene_data: None,
            touched: Vec::new(),
            render_bounds: None,
            unresolved: HashSet::new(),
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Number of frames committed so far.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// The display list being accumulated for the next frame.
    pub fn working_table(&self) -> &PlacementTable {
        &self.working
    }

    /// Feeds one tag. Returns the state after the tag was applied.
    pub fn push(&mut self, tag: Tag) -> Result<BuilderState, SemanticError> {
        match self.state {
            BuilderState::Accumulating => {}
            BuilderState::Done => return Err(SemanticError::TagAfterEnd),
            BuilderState::Failed => return Err(SemanticError::Aborted),
        }
        trace!(tag = tag.name(), frame = self.next_index1(), "tag");
        match self.apply(tag) {
            Ok(()) => Ok(self.state),
            Err(e) => {
                self.state = BuilderState::Failed;
                Err(e)
            }
        }
    }

    fn next_index1(&self) -> usize {
        self.frames.len() + 1
    }

    fn apply(&mut self, tag: Tag) -> Result<(), SemanticError> {
        match tag {
            Tag::Place(place) => {
                let depth = place.depth;
                let placed = PlacedObject::from_place(place, self.next_index1());
                self.working.insert(depth, Arc::new(placed));
                self.touched.push(depth);
            }
            Tag::PlaceUpdate(update) => {
                let depth = update.depth;
                let updated = self.working.get(depth).map(|current| current.updated(update));
                match (updated, self.options.missing_depth) {
                    (Some(placed), _) => {
                        self.working.insert(depth, Arc::new(placed));
                        self.touched.push(depth);
                    }
                    (None, MissingDepthPolicy::Error) => {
                        return Err(SemanticError::MissingDepth {
                            depth,
                            frame: self.next_index1(),
                        });
                    }
                    (None, MissingDepthPolicy::Ignore) => {
                        warn!(depth, frame = self.next_index1(), "update of empty depth ignored");
                    }
                }
            }
            Tag::Remove { depth } => {
                if self.working.remove(depth).is_none() {
                    debug!(depth, frame = self.next_index1(), "removal of empty depth ignored");
                }
            }
            Tag::FrameLabel { name, .. } => {
                if let Some(previous) = self.pending_label.replace(name) {
                    let frame = self.next_index1();
                    debug!(%previous, frame, "frame label replaced before commit");
                }
            }
            Tag::ShowFrame => self.commit()?,
            Tag::SoundStreamBlock(block) => self.pending_stream_block = Some(block),
            Tag::StartSound(event) => self.pending_sounds.push(event),
            Tag::SceneAndFrameLabelData(data) => {
                if !self.role.is_top_level() {
                    return Err(SemanticError::SceneDataInNestedTimeline);
                }
                if self.scene_data.is_some() {
                    return Err(SemanticError::DuplicateSceneData);
                }
                self.scene_data = Some(data);
            }
            Tag::End => self.state = BuilderState::Done,
            Tag::Unknown { code } => trace!(code, "uninterpreted tag skipped"),
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), SemanticError> {
        let index = self.frames.len();
        let label = self.pending_label.take();
        if let Some(name) = &label {
            self.index_label(name.clone(), index)?;
        }
        self.measure_touched();

        self.frames.push(Frame {
            index,
            placements: self.working.snapshot(),
            label,
            stream_block: self.pending_stream_block.take(),
            sound_events: std::mem::take(&mut self.pending_sounds),
        });
        Ok(())
    }

    fn index_label(&mut self, name: String, index: usize) -> Result<(), SemanticError> {
        match self.labels.entry(name) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(mut slot) => match self.options.duplicate_labels {
                DuplicateLabelPolicy::LastWins => {
                    let previous = *slot.get() + 1;
                    debug!(
                        label = %slot.key(),
                        previous,
                        frame = index + 1,
                        "duplicate label, keeping last"
                    );
                    slot.insert(index);
                }
                DuplicateLabelPolicy::FirstWins => {
                    let kept = *slot.get() + 1;
                    debug!(
                        label = %slot.key(),
                        kept,
                        frame = index + 1,
                        "duplicate label, keeping first"
                    );
                }
                DuplicateLabelPolicy::Reject => {
                    return Err(SemanticError::DuplicateLabel(slot.key().clone()));
                }
            },
        }
        Ok(())
    }

    /// Unions the bounds of every object written since the last commit and
    /// still on the display list.
    fn measure_touched(&mut self) {
        for depth in self.touched.drain(..) {
            let Some(placed) = self.working.get(depth) else {
                continue;
            };
            match self.library.character_bounds(placed.character_id) {
                Some(local) => union_into(&mut self.render_bounds, placed.bounds_in_parent(local)),
                None => {
                    if self.unresolved.insert(placed.character_id) {
                        warn!(character_id = placed.character_id, "character has no known bounds");
                    }
                }
            }
        }
    }

    /// Ends the fold and freezes the result.
    ///
    /// Called when the cursor is exhausted or after `End`. Placements made
    /// after the last `ShowFrame` are not committed as a frame but remain in
    /// the final display list and count towards render bounds.
    pub fn finish(mut self, header: SpriteHeader) -> Result<SpriteTimeline, SemanticError> {
        if self.state == BuilderState::Failed {
            return Err(SemanticError::Aborted);
        }
        debug_assert_eq!(header.role, self.role, "header role differs from the builder's role");
        if header.role != self.role {
            warn!(library_id = header.library_id, role = ?self.role, "header role ignored");
        }
        if self.state == BuilderState::Accumulating {
            debug!(library_id = header.library_id, "tag stream ended without End tag");
        }
        self.measure_touched();

        let frame_count = self.frames.len();
        let scenes = self.index_scenes(frame_count)?;

        let render_bounds = match (header.bounds, self.render_bounds) {
            (Some(own), Some(children)) => Some(own.union(children)),
            (own, children) => own.or(children),
        };

        debug!(
            library_id = header.library_id,
            frames = frame_count,
            labels = self.labels.len(),
            scenes = scenes.scenes.len(),
            "timeline built"
        );

        Ok(SpriteTimeline {
            library_id: header.library_id,
            role: self.role,
            frames: self.frames,
            labels: self.labels,
            scenes,
            final_placements: self.working,
            bounds: header.bounds,
            render_bounds,
        })
    }

    fn index_scenes(&mut self, frame_count: usize) -> Result<SceneIndex, SemanticError> {
        if !self.role.is_top_level() {
            return Ok(SceneIndex::default());
        }
        let data = self.scene_data.take().unwrap_or_default();
        SceneIndexer::check_names(&data)?;
        if frame_count == 0 {
            if !data.scenes.is_empty() {
                warn!("scene metadata ignored on a timeline without frames");
            }
            return Ok(SceneIndex::default());
        }

        let scenes = if data.scenes.is_empty() {
            SceneIndexer::single(&self.options.implicit_scene_name, frame_count)
        } else {
            SceneIndexer::index(&data, frame_count)?
        };

        // Labels from FrameLabel tags take precedence over the metadata.
        let tagged: HashSet<String> = self.labels.keys().cloned().collect();
        for entry in data.frame_labels {
            let index = entry.frame as usize;
            if index >= self.frames.len() {
                warn!(
                    label = %entry.label,
                    frame = index + 1,
                    "frame label beyond the last frame ignored"
                );
                continue;
            }
            if tagged.contains(&entry.label) {
                continue;
            }
            self.index_label(entry.label.clone(), index)?;
            let frame = &mut self.frames[index];
            if frame.label.is_none() {
                frame.label = Some(entry.label);
            }
        }

        Ok(scenes)
    }
}
