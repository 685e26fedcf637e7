use crate::placement::{PlacedObject, PlacementTable};
use reel_data::model::{SoundEvent, StreamBlockRef};
use std::sync::Arc;

/// One committed frame of a timeline.
///
/// A frame owns a snapshot of the display list as it stood at its
/// `ShowFrame` tag. Frames are created only while the timeline is built and
/// are never modified afterwards; frames are compared by identity, which is
/// why `Frame` is not `Clone`.
#[derive(Debug)]
pub struct Frame {
    pub(crate) index: usize,
    pub(crate) placements: PlacementTable,
    pub(crate) label: Option<String>,
    pub(crate) stream_block: Option<StreamBlockRef>,
    pub(crate) sound_events: Vec<SoundEvent>,
}

impl Frame {
    /// 0-based position in the timeline.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based frame number, as used by the format.
    pub fn index1(&self) -> usize {
        self.index + 1
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn stream_block(&self) -> Option<StreamBlockRef> {
        self.stream_block
    }

    /// Event sounds started on this frame, in tag order.
    pub fn sound_events(&self) -> &[SoundEvent] {
        &self.sound_events
    }

    pub fn placements(&self) -> &PlacementTable {
        &self.placements
    }

    /// Placed objects in ascending depth (back to front).
    pub fn placed_objects(&self) -> impl Iterator<Item = &Arc<PlacedObject>> + '_ {
        self.placements.values()
    }

    pub fn placed_object_at_depth(&self, depth: i32) -> Option<&Arc<PlacedObject>> {
        self.placements.get(depth)
    }

    /// The lowest-depth object with the given instance name.
    pub fn placed_object_with_name(&self, name: &str) -> Option<&Arc<PlacedObject>> {
        self.placed_objects()
            .find(|placed| placed.name.as_deref() == Some(name))
    }

    pub fn placed_object_count(&self) -> usize {
        self.placements.len()
    }
}
