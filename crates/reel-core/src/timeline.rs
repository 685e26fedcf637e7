use crate::builder::{BuilderState, FrameBuilder};
use crate::error::{LookupError, TimelineError};
use crate::frame::Frame;
use crate::library::CharacterLibrary;
use crate::options::TimelineOptions;
use crate::placement::{PlacedObject, PlacementTable};
use crate::scene::{Scene, SceneIndex};
use kurbo::Rect;
use reel_data::model::Tag;
use reel_data::{DecodeError, TagCursor};
use serde::Serialize;
use std::collections::HashMap;
use tracing::instrument;

/// Whether a timeline is the movie's own (top-level) timeline.
///
/// Only the top-level timeline may carry scene metadata. The role is passed
/// in explicitly because a nested sprite and a movie without scenes look the
/// same from their tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineRole {
    Movie,
    Sprite,
}

impl TimelineRole {
    pub fn is_top_level(self) -> bool {
        self == TimelineRole::Movie
    }
}

/// What is known about a symbol before its tags are read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteHeader {
    pub library_id: u16,
    pub role: TimelineRole,
    /// Declared bounds of the symbol itself (the stage rect for a movie).
    pub bounds: Option<Rect>,
}

impl SpriteHeader {
    /// The movie's top-level timeline. It is registered under library id 0.
    pub fn movie() -> Self {
        Self {
            library_id: 0,
            role: TimelineRole::Movie,
            bounds: None,
        }
    }

    pub fn sprite(library_id: u16) -> Self {
        Self {
            library_id,
            role: TimelineRole::Sprite,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }
}

/// The frozen frame sequence of one symbol.
///
/// Built in one pass by [`SpriteTimeline::build`]; read-only afterwards and
/// safe to share between threads.
#[derive(Debug)]
pub struct SpriteTimeline {
    pub(crate) library_id: u16,
    pub(crate) role: TimelineRole,
    pub(crate) frames: Vec<Frame>,
    /// Label -> 0-based frame position.
    pub(crate) labels: HashMap<String, usize>,
    pub(crate) scenes: SceneIndex,
    pub(crate) final_placements: PlacementTable,
    pub(crate) bounds: Option<Rect>,
    pub(crate) render_bounds: Option<Rect>,
}

impl SpriteTimeline {
    /// Reads tags from `cursor` until `End` or exhaustion and freezes the
    /// resulting frames.
    ///
    /// Decode and semantic errors abort construction of this timeline only.
    #[instrument(level = "debug", skip_all, fields(library_id = header.library_id))]
    pub fn build<C>(
        header: SpriteHeader,
        cursor: &mut C,
        library: &dyn CharacterLibrary,
        options: &TimelineOptions,
    ) -> Result<Self, TimelineError>
    where
        C: TagCursor + ?Sized,
    {
        let mut builder = FrameBuilder::new(header.role, library, options);
        while let Some(tag) = cursor.next_tag()? {
            if builder.push(tag)? == BuilderState::Done {
                break;
            }
        }
        Ok(builder.finish(header)?)
    }

    /// Builds from already-decoded tags.
    pub fn from_tags<I>(
        header: SpriteHeader,
        tags: I,
        library: &dyn CharacterLibrary,
        options: &TimelineOptions,
    ) -> Result<Self, TimelineError>
    where
        I: IntoIterator<Item = Tag>,
    {
        let mut cursor = tags.into_iter().map(Ok::<Tag, DecodeError>);
        Self::build(header, &mut cursor, library, options)
    }

    pub fn library_id(&self) -> u16 {
        self.library_id
    }

    pub fn role(&self) -> TimelineRole {
        self.role
    }

    pub fn is_top_level(&self) -> bool {
        self.role.is_top_level()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn scenes(&self) -> &[Scene] {
        self.scenes.scenes()
    }

    /// 0-based frame access.
    pub fn frame_at_index(&self, index: usize) -> Result<&Frame, LookupError> {
        self.frames.get(index).ok_or(LookupError::OutOfRange {
            index1: index.saturating_add(1),
            frame_count: self.frames.len(),
        })
    }

    /// 1-based frame access; valid numbers are `1..=frame_count`.
    pub fn frame_at_index1(&self, index1: usize) -> Result<&Frame, LookupError> {
        match index1.checked_sub(1) {
            Some(index) => self.frame_at_index(index),
            None => Err(LookupError::OutOfRange {
                index1,
                frame_count: self.frames.len(),
            }),
        }
    }

    /// 0-based position of `frame`, which must be one of this timeline's own
    /// frames (checked by identity).
    pub fn index_of_frame(&self, frame: &Frame) -> Result<usize, LookupError> {
        match self.frames.get(frame.index) {
            Some(own) if std::ptr::eq(own, frame) => Ok(frame.index),
            _ => Err(LookupError::FrameNotInTimeline),
        }
    }

    pub fn index1_of_frame(&self, frame: &Frame) -> Result<usize, LookupError> {
        self.index_of_frame(frame).map(|index| index + 1)
    }

    pub fn frame_with_label(&self, label: &str) -> Result<&Frame, LookupError> {
        self.labels
            .get(label)
            .map(|&index| &self.frames[index])
            .ok_or_else(|| LookupError::LabelNotFound(label.to_string()))
    }

    /// Always `SceneNotFound` on a nested sprite, which has no scenes.
    pub fn scene_with_name(&self, name: &str) -> Result<&Scene, LookupError> {
        self.scenes
            .get(name)
            .ok_or_else(|| LookupError::SceneNotFound(name.to_string()))
    }

    /// The frames of `scene`; empty if the scene is not from this timeline.
    pub fn frames_in_scene(&self, scene: &Scene) -> &[Frame] {
        self.frames.get(scene.range()).unwrap_or(&[])
    }

    pub fn scene_for_frame(&self, frame: &Frame) -> Option<&Scene> {
        let index = self.index_of_frame(frame).ok()?;
        self.scenes.scene_at(index)
    }

    /// Every indexed label with its frame, in frame order.
    pub fn labels(&self) -> Vec<(&str, &Frame)> {
        let mut labels: Vec<(&str, &Frame)> = self
            .labels
            .iter()
            .map(|(label, &index)| (label.as_str(), &self.frames[index]))
            .collect();
        labels.sort_by(|a, b| a.1.index.cmp(&b.1.index).then(a.0.cmp(b.0)));
        labels
    }

    /// The display list after the last tag, including placements made after
    /// the final `ShowFrame`.
    pub fn final_placements(&self) -> &PlacementTable {
        &self.final_placements
    }

    /// Declared bounds of the symbol itself; `None` when it declares none.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Union of the declared bounds and every placement on every frame, in
    /// this symbol's space. `None` when nothing has an extent.
    pub fn render_bounds(&self) -> Option<Rect> {
        self.render_bounds
    }

    /// Resolves a placement's bounds through the owning movie's library.
    pub fn resolve_bounds(
        &self,
        placed: &PlacedObject,
        library: &dyn CharacterLibrary,
    ) -> Option<Rect> {
        library
            .character_bounds(placed.character_id)
            .map(|local| placed.bounds_in_parent(local))
    }

    pub fn summary(&self) -> TimelineSummary {
        TimelineSummary {
            library_id: self.library_id,
            role: self.role,
            frame_count: self.frames.len(),
            labels: self
                .labels()
                .into_iter()
                .map(|(label, frame)| LabelSummary {
                    label: label.to_string(),
                    frame: frame.index1(),
                })
                .collect(),
            scenes: self
                .scenes()
                .iter()
                .map(|scene| SceneSummary {
                    name: scene.name().to_string(),
                    start_frame: scene.start_index1(),
                    frame_count: scene.frame_count(),
                })
                .collect(),
            bounds: self.bounds.map(BoundsSummary::from),
            render_bounds: self.render_bounds.map(BoundsSummary::from),
        }
    }
}

/// A serializable overview of a timeline, for tooling and debugging dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineSummary {
    pub library_id: u16,
    pub role: TimelineRole,
    pub frame_count: usize,
    pub labels: Vec<LabelSummary>,
    pub scenes: Vec<SceneSummary>,
    pub bounds: Option<BoundsSummary>,
    pub render_bounds: Option<BoundsSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    pub label: String,
    /// 1-based.
    pub frame: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SceneSummary {
    pub name: String,
    /// 1-based.
    pub start_frame: usize,
    pub frame_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundsSummary {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl From<Rect> for BoundsSummary {
    fn from(rect: Rect) -> Self {
        Self {
            x0: rect.x0,
            y0: rect.y0,
            x1: rect.x1,
            y1: rect.y1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Library;
    use reel_data::model::{PlaceObject, SceneLabelData, SceneOffset};

    fn build(header: SpriteHeader, tags: Vec<Tag>) -> SpriteTimeline {
        SpriteTimeline::from_tags(header, tags, &Library::new(), &TimelineOptions::default())
            .unwrap()
    }

    fn show_frames(count: usize) -> Vec<Tag> {
        let mut tags = vec![Tag::Place(PlaceObject::new(1, 1))];
        tags.extend(std::iter::repeat(Tag::ShowFrame).take(count));
        tags.push(Tag::End);
        tags
    }

    #[test]
    fn test_index_adapters_agree() {
        let timeline = build(SpriteHeader::sprite(5), show_frames(4));
        assert_eq!(timeline.frame_count(), 4);
        for i in 0..timeline.frame_count() {
            let zero = timeline.frame_at_index(i).unwrap();
            let one = timeline.frame_at_index1(i + 1).unwrap();
            assert!(std::ptr::eq(zero, one));
            assert_eq!(timeline.index_of_frame(zero).unwrap(), i);
            assert_eq!(timeline.index1_of_frame(zero).unwrap(), i + 1);
        }
        assert_eq!(
            timeline.frame_at_index(4).unwrap_err(),
            LookupError::OutOfRange {
                index1: 5,
                frame_count: 4
            }
        );
    }

    #[test]
    fn test_foreign_frame_not_found() {
        let a = build(SpriteHeader::sprite(5), show_frames(2));
        let b = build(SpriteHeader::sprite(6), show_frames(2));
        let foreign = b.frame_at_index(0).unwrap();
        assert_eq!(
            a.index_of_frame(foreign).unwrap_err(),
            LookupError::FrameNotInTimeline
        );
        assert!(a.scene_for_frame(foreign).is_none());
    }

    #[test]
    fn test_empty_timeline_lookups() {
        let timeline = build(SpriteHeader::sprite(5), vec![Tag::End]);
        assert_eq!(timeline.frame_count(), 0);
        assert!(timeline.last_frame().is_none());
        assert!(timeline.frame_at_index1(1).is_err());
        assert!(timeline.frame_with_label("x").is_err());
        assert!(timeline.scene_with_name("Scene 1").is_err());
        assert!(timeline.scenes().is_empty());
    }

    #[test]
    fn test_movie_without_metadata_gets_implicit_scene() {
        let timeline = build(SpriteHeader::movie(), show_frames(3));
        assert_eq!(timeline.scenes().len(), 1);
        let scene = timeline.scene_with_name("Scene 1").unwrap();
        assert_eq!(scene.start_index1(), 1);
        assert_eq!(scene.frame_count(), 3);
        assert_eq!(timeline.frames_in_scene(scene).len(), 3);
    }

    #[test]
    fn test_nested_sprite_has_no_scenes() {
        let timeline = build(SpriteHeader::sprite(9), show_frames(3));
        assert!(timeline.scenes().is_empty());
        assert_eq!(
            timeline.scene_with_name("Scene 1").unwrap_err(),
            LookupError::SceneNotFound("Scene 1".to_string())
        );
    }

    #[test]
    fn test_summary_serializes() {
        let mut tags = vec![Tag::SceneAndFrameLabelData(SceneLabelData {
            scenes: vec![
                SceneOffset {
                    offset: 0,
                    name: "Intro".to_string(),
                },
                SceneOffset {
                    offset: 1,
                    name: "Main".to_string(),
                },
            ],
            frame_labels: vec![],
        })];
        tags.extend(show_frames(2));
        let timeline = build(
            SpriteHeader::movie().with_bounds(Rect::new(0.0, 0.0, 550.0, 400.0)),
            tags,
        );

        let json = serde_json::to_value(timeline.summary()).unwrap();
        assert_eq!(json["role"], "movie");
        assert_eq!(json["frame_count"], 2);
        assert_eq!(json["scenes"][1]["name"], "Main");
        assert_eq!(json["scenes"][1]["start_frame"], 2);
        assert_eq!(json["bounds"]["x1"], 550.0);
    }

    #[test]
    fn test_timeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpriteTimeline>();
    }
}
