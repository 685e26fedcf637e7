use reel_data::DecodeError;
use thiserror::Error;

/// A well-formed tag that is invalid where it occurs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("update of depth {depth} in frame {frame}, but nothing is placed there")]
    MissingDepth { depth: i32, frame: usize },
    #[error("scene metadata found in a nested sprite timeline")]
    SceneDataInNestedTimeline,
    #[error("scene metadata appears more than once")]
    DuplicateSceneData,
    #[error("duplicate scene name `{0}`")]
    DuplicateScene(String),
    #[error("duplicate frame label `{0}`")]
    DuplicateLabel(String),
    #[error("scene `{name}` starts at offset {offset}, which does not tile {frame_count} frames")]
    SceneOffset {
        name: String,
        offset: u32,
        frame_count: usize,
    },
    #[error("tag received after the timeline ended")]
    TagAfterEnd,
    #[error("timeline construction was aborted by an earlier error")]
    Aborted,
}

/// Failure to construct a timeline. The timeline is discarded in both cases.
#[derive(Error, Debug)]
pub enum TimelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Semantic(#[from] SemanticError),
}

/// A miss on one of the read-only timeline lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("frame {index1} is out of range (timeline has {frame_count} frames)")]
    OutOfRange { index1: usize, frame_count: usize },
    #[error("no frame labelled `{0}`")]
    LabelNotFound(String),
    #[error("no scene named `{0}`")]
    SceneNotFound(String),
    #[error("frame does not belong to this timeline")]
    FrameNotInTimeline,
}
