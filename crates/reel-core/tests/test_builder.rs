//! Frame Builder Tests
//!
//! Drives the builder tag by tag, the way a decoder feeding it
//! incrementally would.

use kurbo::Rect;
use reel_core::{
    BuilderState, DuplicateLabelPolicy, FrameBuilder, Library, LookupError, SemanticError,
    SpriteHeader, SpriteTimeline, TimelineOptions, TimelineRole,
};
use reel_data::model::{
    FrameLabelOffset, PlaceObject, SceneLabelData, SceneOffset, StreamBlockRef, Tag,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Validates:
/// - `End` stops the builder and further tags are refused
/// - The finished timeline keeps everything committed before `End`
#[test]
fn test_push_until_end() {
    init_tracing();
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Sprite, &library, &options);

    assert_eq!(
        builder.push(Tag::Place(PlaceObject::new(1, 1))),
        Ok(BuilderState::Accumulating)
    );
    assert_eq!(builder.push(Tag::ShowFrame), Ok(BuilderState::Accumulating));
    assert_eq!(builder.push(Tag::End), Ok(BuilderState::Done));
    assert_eq!(builder.push(Tag::ShowFrame), Err(SemanticError::TagAfterEnd));
    assert_eq!(builder.frame_count(), 1);

    let timeline = builder.finish(SpriteHeader::sprite(8)).unwrap();
    assert_eq!(timeline.frame_count(), 1);
    assert_eq!(timeline.library_id(), 8);
}

/// Validates: placements after the last `ShowFrame` reach the final display
/// list and the render bounds, but not a frame.
#[test]
fn test_trailing_placements() {
    let mut library = Library::new();
    library.insert_shape(1, Rect::new(0.0, 0.0, 1.0, 1.0));
    library.insert_shape(2, Rect::new(0.0, 0.0, 50.0, 50.0));
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Sprite, &library, &options);

    for tag in [
        Tag::Place(PlaceObject::new(1, 1)),
        Tag::ShowFrame,
        Tag::Place(PlaceObject::new(2, 2)),
        Tag::End,
    ] {
        builder.push(tag).unwrap();
    }
    let timeline = builder.finish(SpriteHeader::sprite(3)).unwrap();

    assert_eq!(timeline.frame_count(), 1);
    assert_eq!(timeline.last_frame().unwrap().placed_object_count(), 1);
    assert_eq!(timeline.final_placements().len(), 2);
    assert_eq!(timeline.render_bounds(), Some(Rect::new(0.0, 0.0, 50.0, 50.0)));
}

/// Validates: label metadata fills frames without a `FrameLabel` tag and
/// never overrides one.
#[test]
fn test_metadata_labels_merge() {
    init_tracing();
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Movie, &library, &options);

    let tags = vec![
        Tag::SceneAndFrameLabelData(SceneLabelData {
            scenes: vec![SceneOffset {
                offset: 0,
                name: "Only".to_string(),
            }],
            frame_labels: vec![
                FrameLabelOffset {
                    frame: 0,
                    label: "from_tag".to_string(),
                },
                FrameLabelOffset {
                    frame: 1,
                    label: "loop".to_string(),
                },
                FrameLabelOffset {
                    frame: 9,
                    label: "lost".to_string(),
                },
            ],
        }),
        Tag::FrameLabel {
            name: "from_tag".to_string(),
            anchor: true,
        },
        Tag::ShowFrame,
        Tag::ShowFrame,
        Tag::End,
    ];
    for tag in tags {
        builder.push(tag).unwrap();
    }
    let movie = builder.finish(SpriteHeader::movie()).unwrap();

    assert_eq!(movie.frame_with_label("from_tag").unwrap().index1(), 1);
    assert_eq!(movie.frame_with_label("loop").unwrap().index1(), 2);
    assert_eq!(movie.frame_at_index1(2).unwrap().label(), Some("loop"));
    assert!(movie.frame_with_label("lost").is_err());

    let labels: Vec<&str> = movie.labels().into_iter().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["from_tag", "loop"]);
}

#[test]
fn test_second_scene_data_rejected() {
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Movie, &library, &options);

    builder
        .push(Tag::SceneAndFrameLabelData(SceneLabelData::default()))
        .unwrap();
    assert_eq!(
        builder.push(Tag::SceneAndFrameLabelData(SceneLabelData::default())),
        Err(SemanticError::DuplicateSceneData)
    );
    assert_eq!(builder.state(), BuilderState::Failed);
    assert!(matches!(
        builder.finish(SpriteHeader::movie()),
        Err(SemanticError::Aborted)
    ));
}

#[test]
fn test_stream_block_attaches_to_its_frame() {
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Sprite, &library, &options);
    let block = StreamBlockRef {
        stream_id: 4,
        block_index: 0,
    };

    for tag in [Tag::SoundStreamBlock(block), Tag::ShowFrame, Tag::ShowFrame] {
        builder.push(tag).unwrap();
    }
    let timeline = builder.finish(SpriteHeader::sprite(1)).unwrap();

    assert_eq!(timeline.frame_at_index(0).unwrap().stream_block(), Some(block));
    assert_eq!(timeline.frame_at_index(1).unwrap().stream_block(), None);
}

/// Validates: unchanged frames share the whole table, not only its leaves.
#[test]
fn test_idle_frames_share_tables() {
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Sprite, &library, &options);

    for tag in [
        Tag::Place(PlaceObject::new(-5, 1)),
        Tag::Place(PlaceObject::new(40_000, 1)),
        Tag::ShowFrame,
        Tag::Remove { depth: 12 },
        Tag::ShowFrame,
    ] {
        builder.push(tag).unwrap();
    }
    let timeline = builder.finish(SpriteHeader::sprite(1)).unwrap();
    let first = timeline.frame_at_index(0).unwrap();
    let second = timeline.frame_at_index(1).unwrap();

    assert!(first.placements().ptr_eq(second.placements()));
    let depths: Vec<i32> = second.placements().depths().collect();
    assert_eq!(depths, vec![-5, 40_000]);
    assert!(Arc::ptr_eq(
        first.placed_object_at_depth(-5).unwrap(),
        second.placed_object_at_depth(-5).unwrap(),
    ));
}

fn label(name: &str) -> Tag {
    Tag::FrameLabel {
        name: name.to_string(),
        anchor: false,
    }
}

/// Validates: a second `FrameLabel` before the commit replaces the pending
/// one and is not an error.
#[test]
fn test_pending_label_replaced_within_frame() {
    let library = Library::new();
    let options = TimelineOptions::default();
    let mut builder = FrameBuilder::new(TimelineRole::Sprite, &library, &options);

    for tag in [label("a"), label("b"), Tag::ShowFrame, Tag::End] {
        builder.push(tag).unwrap();
    }
    let timeline = builder.finish(SpriteHeader::sprite(2)).unwrap();

    assert_eq!(timeline.frame_with_label("b").unwrap().index1(), 1);
    assert_eq!(
        timeline.frame_with_label("a").unwrap_err(),
        LookupError::LabelNotFound("a".to_string())
    );
    assert_eq!(timeline.frames()[0].label(), Some("b"));
}

fn movie_with_metadata_labels(labels: &[(u32, &str)], frames: usize) -> Vec<Tag> {
    let mut tags = vec![Tag::SceneAndFrameLabelData(SceneLabelData {
        scenes: vec![],
        frame_labels: labels
            .iter()
            .map(|&(frame, label)| FrameLabelOffset {
                frame,
                label: label.to_string(),
            })
            .collect(),
    })];
    tags.extend(std::iter::repeat(Tag::ShowFrame).take(frames));
    tags.push(Tag::End);
    tags
}

fn build_movie(
    tags: Vec<Tag>,
    policy: DuplicateLabelPolicy,
) -> Result<SpriteTimeline, reel_core::TimelineError> {
    let options = TimelineOptions {
        duplicate_labels: policy,
        ..TimelineOptions::default()
    };
    SpriteTimeline::from_tags(SpriteHeader::movie(), tags, &Library::new(), &options)
}

/// Validates: labels repeated in the scene metadata follow the
/// duplicate-label policy, like repeated `FrameLabel` tags.
#[test]
fn test_metadata_label_duplicates_follow_policy() {
    let tags = movie_with_metadata_labels(&[(0, "a"), (1, "a")], 2);

    let last = build_movie(tags.clone(), DuplicateLabelPolicy::LastWins).unwrap();
    assert_eq!(last.frame_with_label("a").unwrap().index1(), 2);
    assert_eq!(last.frames()[0].label(), Some("a"));
    assert_eq!(last.frames()[1].label(), Some("a"));

    let first = build_movie(tags.clone(), DuplicateLabelPolicy::FirstWins).unwrap();
    assert_eq!(first.frame_with_label("a").unwrap().index1(), 1);

    let err = build_movie(tags, DuplicateLabelPolicy::Reject).unwrap_err();
    assert!(matches!(
        err,
        reel_core::TimelineError::Semantic(SemanticError::DuplicateLabel(ref name)) if name == "a"
    ));
}

/// Validates: a label defined by a `FrameLabel` tag is not moved by the
/// metadata, whatever the policy.
#[test]
fn test_tag_labels_override_metadata_under_every_policy() {
    for policy in [
        DuplicateLabelPolicy::LastWins,
        DuplicateLabelPolicy::FirstWins,
        DuplicateLabelPolicy::Reject,
    ] {
        let mut tags = movie_with_metadata_labels(&[(1, "a")], 0);
        tags.pop();
        tags.extend([label("a"), Tag::ShowFrame, Tag::ShowFrame, Tag::End]);

        let movie = build_movie(tags, policy).unwrap();
        assert_eq!(movie.frame_with_label("a").unwrap().index1(), 1);
        assert_eq!(movie.frames()[1].label(), None);
    }
}

/// Validates: duplicate scene names are rejected even when the movie has
/// no frames to partition.
#[test]
fn test_duplicate_scene_names_rejected_without_frames() {
    let tags = vec![
        Tag::SceneAndFrameLabelData(SceneLabelData {
            scenes: vec![
                SceneOffset {
                    offset: 0,
                    name: "A".to_string(),
                },
                SceneOffset {
                    offset: 0,
                    name: "A".to_string(),
                },
            ],
            frame_labels: vec![],
        }),
        Tag::End,
    ];
    let err = SpriteTimeline::from_tags(
        SpriteHeader::movie(),
        tags,
        &Library::new(),
        &TimelineOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        reel_core::TimelineError::Semantic(SemanticError::DuplicateScene(ref name)) if name == "A"
    ));
}
